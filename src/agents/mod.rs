pub mod executor;
pub mod registry;

pub use executor::{AgentExecutor, ExecutionDelta, ExecutorOptions};
pub use registry::{definition, pipeline_order, AgentDefinition, AgentId, AgentMode};
