use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use chrono::Utc;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;
use crate::agents::executor::{AgentExecutor, ExecutorOptions};
use crate::agents::registry::{pipeline_order, AgentId};
use crate::errors::AttestError;
use crate::store::SnapshotHandle;
use super::events::PipelineEvent;
use super::metrics::total_usage;
use super::phase::{phase_definition, PhaseName};
use super::readiness::{compute_all, compute_readiness, ReadinessReport};
use super::state::*;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct RunnerOptions {
    /// Marked `skipped` in a full run without a provider call.
    pub skip_agents: Vec<AgentId>,
    pub excerpt_chars: usize,
    pub temperature: f32,
    pub max_output_tokens: Option<u32>,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        let exec = ExecutorOptions::default();
        Self {
            skip_agents: Vec::new(),
            excerpt_chars: exec.excerpt_chars,
            temperature: exec.temperature,
            max_output_tokens: exec.max_output_tokens,
        }
    }
}

impl RunnerOptions {
    fn executor_options(&self) -> ExecutorOptions {
        ExecutorOptions {
            excerpt_chars: self.excerpt_chars,
            temperature: self.temperature,
            max_output_tokens: self.max_output_tokens,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub run_id: Option<Uuid>,
    pub status: RunStatus,
    pub completed: usize,
    pub errored: usize,
    pub skipped: usize,
    pub pending: usize,
    pub usage: TokenUsage,
    pub duration_ms: u64,
}

impl RunSummary {
    pub fn from_snapshot(snapshot: &ResultSnapshot, duration_ms: u64) -> Self {
        Self {
            run_id: snapshot.run.run_id,
            status: snapshot.run.status,
            completed: snapshot.count_status(AgentStatus::Completed),
            errored: snapshot.count_status(AgentStatus::Error),
            skipped: snapshot.count_status(AgentStatus::Skipped),
            pending: snapshot.count_status(AgentStatus::Pending),
            usage: total_usage(snapshot),
            duration_ms,
        }
    }
}

/// Drives agents through the fixed phase order, persisting after every
/// transition. Agent failures are recorded and never stop the run.
pub struct PipelineRunner {
    executor: AgentExecutor,
    handle: Arc<SnapshotHandle>,
    options: RunnerOptions,
    cancel_token: CancellationToken,
    /// Child of `cancel_token` for the full run in flight, if any.
    active_run: Mutex<Option<CancellationToken>>,
    event_tx: Option<mpsc::UnboundedSender<PipelineEvent>>,
}

impl PipelineRunner {
    pub fn new(executor: AgentExecutor, handle: Arc<SnapshotHandle>, options: RunnerOptions) -> Self {
        Self {
            executor,
            handle,
            options,
            cancel_token: CancellationToken::new(),
            active_run: Mutex::new(None),
            event_tx: None,
        }
    }

    /// Share a token with the caller. Cancelling it stops the run in flight
    /// and refuses every later `run_full`.
    pub fn with_cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel_token = token;
        self
    }

    /// Attach an event channel; partition progress from the executor goes to it too.
    pub fn with_event_channel(mut self, tx: mpsc::UnboundedSender<PipelineEvent>) -> Self {
        self.executor = self.executor.with_event_channel(tx.clone());
        self.event_tx = Some(tx);
        self
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    /// Request a stop before the next agent starts. An in-flight call is not aborted.
    /// Without a full run in flight this does nothing.
    pub fn cancel(&self) {
        match self.active_run_slot().as_ref() {
            Some(token) => {
                info!("Cancellation requested");
                token.cancel();
            }
            None => info!("Cancellation requested with no run in flight; ignored"),
        }
    }

    fn active_run_slot(&self) -> std::sync::MutexGuard<'_, Option<CancellationToken>> {
        self.active_run.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Hands out a fresh token per run so a cancel never outlives the run it stopped.
    fn begin_run(&self) -> Result<CancellationToken, AttestError> {
        if self.cancel_token.is_cancelled() {
            warn!("Shared cancellation token already cancelled; not starting");
            return Err(AttestError::Cancelled(
                "cancelled before the run started".to_string(),
            ));
        }
        let token = self.cancel_token.child_token();
        *self.active_run_slot() = Some(token.clone());
        Ok(token)
    }

    fn end_run(&self) {
        *self.active_run_slot() = None;
    }

    pub async fn snapshot(&self) -> ResultSnapshot {
        self.handle.current().await
    }

    fn emit(&self, event: PipelineEvent) {
        if let Some(ref tx) = self.event_tx {
            let _ = tx.send(event);
        }
    }

    fn emit_phase_started(&self, phase: PhaseName) {
        self.emit(PipelineEvent::PhaseStarted {
            phase,
            display_name: phase_definition(phase).display_name.to_string(),
        });
    }

    fn ensure_configured(&self) -> Result<(), AttestError> {
        let provider = self.executor.provider();
        if provider.is_configured() {
            Ok(())
        } else {
            Err(AttestError::Config(format!(
                "provider {} is not configured (missing API key?)",
                provider.provider_name()
            )))
        }
    }

    pub async fn run_full(&self) -> Result<RunSummary, AttestError> {
        self.ensure_configured()?;
        let run_token = self.begin_run()?;
        let started = Instant::now();
        let run_id = Uuid::new_v4();
        let provider = self.executor.provider().identity();
        let order = pipeline_order();

        self.handle
            .update(|s| {
                let now = Utc::now();
                for state in s.agents.values_mut() {
                    *state = ExecutionState::default();
                }
                s.last_run = Some(now);
                s.run = PipelineRun {
                    run_id: Some(run_id),
                    status: RunStatus::Running,
                    started_at: Some(now),
                    completed_at: None,
                    executed: Vec::new(),
                    provider: Some(provider.clone()),
                };
            })
            .await;
        info!(run_id = %run_id, provider = %provider, agents = order.len(), "Pipeline started");
        self.emit(PipelineEvent::RunStarted {
            run_id,
            provider,
            agent_count: order.len(),
        });

        let mut current_phase = None;
        let mut cancelled = false;
        for def in order {
            if run_token.is_cancelled() {
                info!(next_agent = %def.id, "Pipeline cancelled by user");
                cancelled = true;
                break;
            }

            if current_phase != Some(def.phase) {
                current_phase = Some(def.phase);
                info!(phase = %def.phase, "Phase started");
                self.emit_phase_started(def.phase);
            }

            if self.options.skip_agents.contains(&def.id) {
                info!(agent = %def.id, "Agent skipped by configuration");
                let state = self
                    .handle
                    .update(|s| {
                        let state = s.agent_mut(def.id);
                        state.transition(AgentStatus::Skipped);
                        state.clone()
                    })
                    .await;
                self.emit(PipelineEvent::AgentTransition { agent: def.id, state });
                continue;
            }

            self.execute_agent(def.id, true).await;
        }

        let status = if cancelled { RunStatus::Cancelled } else { RunStatus::Completed };
        let snapshot = self
            .handle
            .update(|s| {
                s.run.status = status;
                s.run.completed_at = Some(Utc::now());
                s.clone()
            })
            .await;
        self.end_run();

        let summary = RunSummary::from_snapshot(&snapshot, started.elapsed().as_millis() as u64);
        info!(
            run_id = %run_id,
            status = %status,
            completed = summary.completed,
            errored = summary.errored,
            input_tokens = summary.usage.input_tokens,
            output_tokens = summary.usage.output_tokens,
            "Pipeline finished"
        );
        self.emit(PipelineEvent::RunFinished { status, summary: summary.clone() });
        Ok(summary)
    }

    /// Run one agent outside phase order against whatever upstream results exist.
    pub async fn run_single(&self, id: AgentId) -> Result<ExecutionState, AttestError> {
        self.ensure_configured()?;

        // A `running` state can only be left over from an interrupted session
        let stale: Vec<AgentId> = self
            .handle
            .mutate(|s| {
                let stale: Vec<AgentId> = s
                    .agents
                    .iter()
                    .filter(|(_, st)| st.status == AgentStatus::Running)
                    .map(|(id, _)| *id)
                    .collect();
                for agent in &stale {
                    s.agent_mut(*agent).transition(AgentStatus::Skipped);
                }
                stale
            })
            .await;
        if !stale.is_empty() {
            warn!(agents = ?stale, "Resolved stale running agents to skipped");
        }

        let state = self.execute_agent(id, false).await;
        self.handle.update(|s| s.last_run = Some(Utc::now())).await;
        Ok(state)
    }

    /// running → persist → execute → completed/error → persist.
    async fn execute_agent(&self, id: AgentId, record_in_run: bool) -> ExecutionState {
        let (snapshot, running) = self
            .handle
            .update(|s| {
                let state = s.agent_mut(id);
                state.error = None;
                state.transition(AgentStatus::Running);
                let running = state.clone();
                (s.clone(), running)
            })
            .await;
        self.emit(PipelineEvent::AgentTransition { agent: id, state: running });

        let delta = self
            .executor
            .execute(id, &snapshot, &self.options.executor_options())
            .await;

        let state = self
            .handle
            .update(|s| {
                if record_in_run {
                    s.run.executed.push(id);
                }
                let state = s.agent_mut(id);
                delta.apply(state);
                state.clone()
            })
            .await;
        self.emit(PipelineEvent::AgentTransition { agent: id, state: state.clone() });
        state
    }

    pub async fn readiness(&self, id: AgentId) -> Result<ReadinessReport, AttestError> {
        let data = self.executor.data_source().snapshot().await?;
        let snapshot = self.handle.current().await;
        Ok(compute_readiness(id, &data, &snapshot))
    }

    pub async fn readiness_all(&self) -> Result<Vec<ReadinessReport>, AttestError> {
        let data = self.executor.data_source().snapshot().await?;
        let snapshot = self.handle.current().await;
        Ok(compute_all(&data, &snapshot))
    }
}
