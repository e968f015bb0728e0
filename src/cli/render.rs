use console::{style, StyledObject};
use crate::agents::registry::definition;
use crate::pipeline::readiness::{ReadinessReport, ReadinessStatus};
use crate::pipeline::state::{AgentStatus, ExecutionState, RunStatus};
use crate::pipeline::PipelineEvent;
use crate::utils::formatting::{format_duration, format_tokens};

pub fn status_badge(status: AgentStatus) -> StyledObject<&'static str> {
    match status {
        AgentStatus::Pending => style("pending").dim(),
        AgentStatus::Running => style("running").yellow(),
        AgentStatus::Completed => style("completed").green(),
        AgentStatus::Error => style("error").red().bold(),
        AgentStatus::Skipped => style("skipped").cyan(),
    }
}

pub fn run_badge(status: RunStatus) -> StyledObject<&'static str> {
    match status {
        RunStatus::Pending => style("pending").dim(),
        RunStatus::Running => style("running").yellow(),
        RunStatus::Completed => style("completed").green().bold(),
        RunStatus::Cancelled => style("cancelled").yellow().bold(),
    }
}

pub fn readiness_badge(status: ReadinessStatus) -> StyledObject<&'static str> {
    match status {
        ReadinessStatus::Green => style("green").green().bold(),
        ReadinessStatus::Yellow => style("yellow").yellow().bold(),
        ReadinessStatus::Red => style("red").red().bold(),
    }
}

/// One line per agent state, used by both `status` and the live run.
pub fn render_agent_line(name: &str, state: &ExecutionState) -> String {
    let mut line = format!("  {:<24} {}", name, status_badge(state.status));
    if state.usage.total() > 0 {
        line.push_str(&format!(
            " {}",
            style(format!(
                "({} in / {} out)",
                format_tokens(state.usage.input_tokens),
                format_tokens(state.usage.output_tokens)
            ))
            .dim()
        ));
    }
    if let Some(err) = &state.error {
        line.push_str(&format!("\n    {}", style(err).red().dim()));
    }
    line
}

pub fn render_readiness(report: &ReadinessReport) -> String {
    let mut lines = vec![format!(
        "{:<24} {}",
        definition(report.agent).display_name,
        readiness_badge(report.status)
    )];
    for s in &report.sources {
        let mark = if s.available { style("✓").green() } else if s.required { style("✗").red() } else { style("○").yellow() };
        lines.push(format!(
            "    {} {} ({}, {} records)",
            mark,
            s.source.display_name(),
            if s.required { "required" } else { "optional" },
            s.count
        ));
    }
    for d in report.incomplete_dependencies() {
        lines.push(format!(
            "    {} upstream {} is {}",
            style("○").yellow(),
            d.agent,
            status_badge(d.status)
        ));
    }
    lines.join("\n")
}

/// Plain text for events the progress bars do not already show.
pub fn render_event(event: &PipelineEvent) -> Option<String> {
    match event {
        PipelineEvent::RunStarted { run_id, provider, agent_count } => Some(format!(
            "\n{} Run {} with {} ({} agents)",
            style("▶").green().bold(),
            style(run_id).cyan(),
            style(provider).white().bold(),
            agent_count
        )),
        PipelineEvent::PhaseStarted { display_name, .. } => Some(format!(
            "\n{} {} {}",
            style("---").cyan().bold(),
            style(display_name).cyan().bold(),
            style("---").cyan().bold(),
        )),
        PipelineEvent::AgentTransition { agent, state } if state.status != AgentStatus::Running => {
            Some(render_agent_line(definition(*agent).display_name, state))
        }
        PipelineEvent::RunFinished { status, summary } => Some(format!(
            "\n{} Run {}: {} completed, {} errored, {} skipped, {} pending | {} tokens | {}",
            style("■").bold(),
            run_badge(*status),
            summary.completed,
            summary.errored,
            summary.skipped,
            summary.pending,
            format_tokens(summary.usage.total()),
            format_duration(summary.duration_ms),
        )),
        _ => None,
    }
}
