pub mod events;
pub mod metrics;
pub mod orchestrator;
pub mod phase;
pub mod readiness;
pub mod state;

pub use events::PipelineEvent;
pub use orchestrator::{PipelineRunner, RunSummary, RunnerOptions};
pub use readiness::{compute_all, compute_readiness, ReadinessReport, ReadinessStatus};
