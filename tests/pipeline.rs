mod common;

use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use attest::agents::registry::{definition, pipeline_order, AgentId};
use attest::data::ComplianceData;
use attest::data::DataSourceKind;
use attest::pipeline::state::{AgentResult, AgentStatus, ExecutionState, RunStatus, TokenUsage};
use attest::pipeline::{PipelineEvent, ReadinessStatus};
use common::{memory_handle, populated_data, runner, ScriptedProvider};

fn order() -> Vec<AgentId> {
    pipeline_order().iter().map(|d| d.id).collect()
}

/// Execution states with timestamps removed.
fn normalized(states: &BTreeMap<AgentId, ExecutionState>) -> BTreeMap<AgentId, ExecutionState> {
    states
        .iter()
        .map(|(id, s)| (*id, ExecutionState { updated_at: None, ..s.clone() }))
        .collect()
}

#[tokio::test]
async fn test_full_run_leaves_no_agent_running() {
    let provider = Arc::new(ScriptedProvider::new());
    let runner = runner(provider.clone(), populated_data(), memory_handle().await);

    let summary = runner.run_full().await.unwrap();
    let snap = runner.snapshot().await;

    assert_eq!(summary.status, RunStatus::Completed);
    assert_eq!(summary.completed, 12);
    assert_eq!(snap.run.executed, order());
    for (id, state) in &snap.agents {
        assert!(state.status.is_terminal(), "{} left {}", id, state.status);
        assert_eq!(state.provider.as_deref(), Some("scripted/stub-1"));
    }
}

#[tokio::test]
async fn test_srm_validator_red_but_still_runs() {
    let provider = Arc::new(ScriptedProvider::new());
    let runner = runner(provider.clone(), ComplianceData::default(), memory_handle().await);

    let report = runner.readiness(AgentId::SrmValidator).await.unwrap();
    assert_eq!(report.status, ReadinessStatus::Red);
    assert_eq!(report.sources.len(), 2);
    for source in &report.sources {
        assert!(source.required);
        assert!(!source.available);
        assert_eq!(source.count, 0);
    }
    let kinds: Vec<DataSourceKind> = report.sources.iter().map(|s| s.source).collect();
    assert!(kinds.contains(&DataSourceKind::Inheritance));
    assert!(kinds.contains(&DataSourceKind::Inventory));

    let state = runner.run_single(AgentId::SrmValidator).await.unwrap();
    assert_eq!(state.status, AgentStatus::Completed);
    assert!(matches!(state.result, Some(AgentResult::Whole(_))));
    assert_eq!(provider.call_count(), 1);
    let calls = provider.calls.lock().unwrap();
    let (_, body) = &calls[0];
    assert!(body.contains("(no data provided)"));
}

#[tokio::test]
async fn test_third_agent_failure_does_not_stop_run() {
    let third = order()[2];
    let provider = Arc::new(ScriptedProvider::failing_for(third));
    let runner = runner(provider, populated_data(), memory_handle().await);

    let summary = runner.run_full().await.unwrap();
    let snap = runner.snapshot().await;

    assert_eq!(summary.status, RunStatus::Completed);
    assert_eq!(snap.run.status, RunStatus::Completed);
    for (i, id) in order().into_iter().enumerate() {
        let state = snap.agent(id).unwrap();
        if i == 2 {
            assert_eq!(state.status, AgentStatus::Error);
            assert!(state.error.as_deref().unwrap().contains("scripted failure"));
            assert!(state.result.is_none());
            assert_eq!(state.usage, TokenUsage::default());
        } else {
            assert_eq!(state.status, AgentStatus::Completed, "{}", id);
        }
    }
    assert_eq!(summary.errored, 1);
    assert_eq!(summary.completed, 11);
}

#[tokio::test]
async fn test_any_single_failure_is_isolated() {
    for failing in order() {
        let provider = Arc::new(ScriptedProvider::failing_for(failing));
        let runner = runner(provider, populated_data(), memory_handle().await);
        runner.run_full().await.unwrap();
        let snap = runner.snapshot().await;

        for id in order() {
            let expected = if id == failing { AgentStatus::Error } else { AgentStatus::Completed };
            assert_eq!(snap.status_of(id), expected, "failing {} checking {}", failing, id);
        }
    }
}

#[tokio::test]
async fn test_fan_out_omits_partition_without_content() {
    let mut data = ComplianceData { catalog: common::catalog(), ..Default::default() };
    // Assessments only for AC and AU; AT has nothing for the gap analyzer
    data.assessments.statuses.insert("3.1.1[a]".into(), attest::data::ObjectiveStatus::NotMet);
    data.assessments.statuses.insert("3.3.1[b]".into(), attest::data::ObjectiveStatus::Partial);

    let provider = Arc::new(ScriptedProvider::new());
    let runner = runner(provider.clone(), data, memory_handle().await);
    let state = runner.run_single(AgentId::GapAnalyzer).await.unwrap();

    match state.result {
        Some(AgentResult::Partitioned(map)) => {
            assert_eq!(map.keys().map(String::as_str).collect::<Vec<_>>(), vec!["AC", "AU"]);
        }
        other => panic!("expected partitioned result, got {:?}", other),
    }
    assert_eq!(provider.call_count(), 2);
    assert_eq!(state.usage, TokenUsage::new(200, 40));
}

#[tokio::test]
async fn test_cancel_during_fifth_agent() {
    let token = CancellationToken::new();
    let fifth = order()[4];
    let provider = Arc::new(ScriptedProvider::cancelling_during(fifth, token.clone()));
    let runner = runner(provider.clone(), populated_data(), memory_handle().await)
        .with_cancel_token(token);

    let summary = runner.run_full().await.unwrap();
    let snap = runner.snapshot().await;

    assert_eq!(summary.status, RunStatus::Cancelled);
    assert_eq!(snap.run.status, RunStatus::Cancelled);
    assert!(snap.run.completed_at.is_some());
    for (i, id) in order().into_iter().enumerate() {
        let expected = if i < 5 { AgentStatus::Completed } else { AgentStatus::Pending };
        assert_eq!(snap.status_of(id), expected, "{}", id);
    }
    assert_eq!(snap.run.executed, order()[..5].to_vec());
    assert_eq!(provider.calls_for(order()[5]), 0);
    assert_eq!(summary.pending, 7);
}

#[tokio::test]
async fn test_aggregator_runs_with_no_upstream() {
    let provider = Arc::new(ScriptedProvider::new());
    let runner = runner(provider.clone(), ComplianceData::default(), memory_handle().await);

    let state = runner.run_single(AgentId::ReadinessReport).await.unwrap();
    assert_eq!(state.status, AgentStatus::Completed);
    assert!(state.result.is_some());

    let report = runner.readiness(AgentId::ReadinessReport).await.unwrap();
    assert_ne!(report.status, ReadinessStatus::Green);
    assert_eq!(report.incomplete_dependencies().count(), 11);
    assert_eq!(definition(AgentId::ReadinessReport).upstream.len(), 11);

    let calls = provider.calls.lock().unwrap();
    let (_, body) = &calls[0];
    assert!(body.contains("(unavailable)"));
}

#[tokio::test]
async fn test_aggregator_quotes_upstream_results() {
    let provider = Arc::new(ScriptedProvider::new());
    let runner = runner(provider.clone(), populated_data(), memory_handle().await);
    runner.run_full().await.unwrap();

    let calls = provider.calls.lock().unwrap();
    let (_, body) = calls.last().unwrap();
    assert!(body.contains("## Metrics"));
    assert!(body.contains("### Executive brief\nanalysis of"));
    assert!(!body.contains("(unavailable)"));
}

#[tokio::test]
async fn test_readiness_is_pure() {
    let provider = Arc::new(ScriptedProvider::new());
    let runner = runner(provider.clone(), populated_data(), memory_handle().await);
    runner.run_single(AgentId::ScopeAnalyzer).await.unwrap();

    let before = runner.snapshot().await;
    let first = runner.readiness_all().await.unwrap();
    let second = runner.readiness_all().await.unwrap();
    assert_eq!(first, second);
    assert_eq!(runner.snapshot().await, before);
    assert_eq!(provider.call_count(), 1);

    let srm = first.iter().find(|r| r.agent == AgentId::SrmValidator).unwrap();
    assert_eq!(srm.status, ReadinessStatus::Green);
}

#[tokio::test]
async fn test_runs_are_deterministic() {
    let first = {
        let runner = runner(Arc::new(ScriptedProvider::new()), populated_data(), memory_handle().await);
        runner.run_full().await.unwrap();
        runner.snapshot().await
    };
    let second = {
        let runner = runner(Arc::new(ScriptedProvider::new()), populated_data(), memory_handle().await);
        runner.run_full().await.unwrap();
        runner.snapshot().await
    };
    assert_eq!(normalized(&first.agents), normalized(&second.agents));
    assert_eq!(first.run.executed, second.run.executed);
    assert_ne!(first.run.run_id, second.run.run_id);
}

#[tokio::test]
async fn test_events_follow_every_transition() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let runner = runner(Arc::new(ScriptedProvider::new()), populated_data(), memory_handle().await)
        .with_event_channel(tx);
    runner.run_full().await.unwrap();
    drop(runner);

    let mut transitions = Vec::new();
    let mut phases = Vec::new();
    let mut finished = None;
    while let Some(event) = rx.recv().await {
        match event {
            PipelineEvent::AgentTransition { agent, state } => transitions.push((agent, state.status)),
            PipelineEvent::PhaseStarted { phase, .. } => phases.push(phase),
            PipelineEvent::RunFinished { status, .. } => finished = Some(status),
            _ => {}
        }
    }

    let expected: Vec<(AgentId, AgentStatus)> = order()
        .into_iter()
        .flat_map(|id| [(id, AgentStatus::Running), (id, AgentStatus::Completed)])
        .collect();
    assert_eq!(transitions, expected);
    assert_eq!(phases.len(), 5);
    assert!(phases.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(finished, Some(RunStatus::Completed));
}

#[tokio::test]
async fn test_rerun_resets_previous_states() {
    let handle = memory_handle().await;
    let failing = runner(
        Arc::new(ScriptedProvider::failing_for(AgentId::RiskScorer)),
        populated_data(),
        handle.clone(),
    );
    failing.run_full().await.unwrap();
    assert_eq!(handle.current().await.status_of(AgentId::RiskScorer), AgentStatus::Error);

    let healthy = runner(Arc::new(ScriptedProvider::new()), populated_data(), handle.clone());
    healthy.run_full().await.unwrap();
    let snap = handle.current().await;
    assert_eq!(snap.status_of(AgentId::RiskScorer), AgentStatus::Completed);
    assert!(snap.agent(AgentId::RiskScorer).unwrap().error.is_none());
}
