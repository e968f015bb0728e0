pub mod commands;
pub mod progress;
pub mod readiness;
pub mod render;
pub mod run;
pub mod status;
pub mod validate;

use std::path::Path;
use std::sync::Arc;
use crate::agents::AgentExecutor;
use crate::config::{load_config, AttestConfig};
use crate::data::JsonDirSource;
use crate::errors::AttestError;
use crate::llm::create_provider;
use crate::pipeline::{PipelineRunner, RunnerOptions};
use crate::store::{ResultStore, SnapshotHandle};
use tracing::debug;

pub use commands::{Cli, Commands};

pub async fn load(config_path: Option<&Path>) -> Result<AttestConfig, AttestError> {
    let config = load_config(config_path).await?;
    debug!(
        provider = %config.llm.provider,
        api_key = %config.llm.api_key.as_deref().map(crate::config::credentials::redact_secret).unwrap_or_default(),
        storage = ?config.storage.backend,
        data_dir = %config.data.dir.display(),
        "Configuration loaded"
    );
    Ok(config)
}

pub async fn open_handle(config: &AttestConfig) -> Result<Arc<SnapshotHandle>, AttestError> {
    let store = ResultStore::from_config(&config.storage)?;
    debug!(store = %store.describe(), "Opening result store");
    Ok(Arc::new(SnapshotHandle::open(store).await))
}

/// Wire provider, data directory and result store into a runner.
pub async fn build_runner(config: &AttestConfig) -> Result<PipelineRunner, AttestError> {
    let provider = Arc::from(create_provider(&config.llm)?);
    let data = Arc::new(JsonDirSource::new(&config.data.dir));
    let handle = open_handle(config).await?;

    let options = RunnerOptions {
        skip_agents: config.pipeline.skipped_agents()?,
        excerpt_chars: config.pipeline.excerpt_chars,
        temperature: config.llm.temperature,
        max_output_tokens: config.llm.max_output_tokens,
    };
    Ok(PipelineRunner::new(AgentExecutor::new(provider, data), handle, options))
}
