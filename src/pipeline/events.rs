use crate::agents::registry::AgentId;
use crate::data::PartitionKey;
use crate::pipeline::phase::PhaseName;
use crate::pipeline::state::{ExecutionState, RunStatus, TokenUsage};
use super::orchestrator::RunSummary;

/// Notifications streamed to a presentation layer while a run progresses.
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    /// A full run started
    RunStarted {
        run_id: uuid::Uuid,
        provider: String,
        agent_count: usize,
    },
    /// The first agent of a phase is about to run
    PhaseStarted {
        phase: PhaseName,
        display_name: String,
    },
    /// Emitted after every agent state change, already persisted
    AgentTransition {
        agent: AgentId,
        state: ExecutionState,
    },
    /// One partition call of a fan-out agent returned
    PartitionCompleted {
        agent: AgentId,
        partition: PartitionKey,
        usage: TokenUsage,
    },
    /// The partition had nothing relevant and was not sent
    PartitionSkipped {
        agent: AgentId,
        partition: PartitionKey,
    },
    /// Final status of a full run
    RunFinished {
        status: RunStatus,
        summary: RunSummary,
    },
}
