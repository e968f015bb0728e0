use crate::agents::registry::AgentId;
use crate::cli::commands::ReadinessArgs;
use crate::config::AttestConfig;
use crate::data::{DataSource, JsonDirSource};
use crate::errors::AttestError;
use crate::pipeline::{compute_all, compute_readiness};
use super::render::render_readiness;

/// Readiness never needs a provider, so only data and store are opened.
pub async fn handle_readiness(args: ReadinessArgs, config: AttestConfig) -> Result<(), AttestError> {
    let agent: Option<AgentId> = args.agent.as_deref().map(str::parse).transpose()?;
    let data = JsonDirSource::new(&config.data.dir).snapshot().await?;
    let handle = super::open_handle(&config).await?;
    let snapshot = handle.current().await;

    let reports = match agent {
        Some(id) => vec![compute_readiness(id, &data, &snapshot)],
        None => compute_all(&data, &snapshot),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for report in &reports {
            println!("{}", render_readiness(report));
        }
    }
    Ok(())
}
