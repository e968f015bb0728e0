use crate::cli::commands::ValidateArgs;
use crate::config::credentials::redact_secret;
use crate::config::parse_config;
use crate::errors::AttestError;
use crate::llm::create_provider;

pub async fn handle_validate(args: ValidateArgs) -> Result<(), AttestError> {
    let config = parse_config(&args.config).await?;
    let provider = create_provider(&config.llm)?;

    println!("Configuration is valid: {}", args.config.display());
    println!("  provider: {}", provider.identity());
    println!(
        "  api key:  {}",
        config.llm.api_key.as_deref().map(redact_secret).unwrap_or_else(|| "(none)".into())
    );
    println!("  storage:  {:?} at {} [{}]", config.storage.backend, config.storage.path.display(), config.storage.key);
    println!("  data:     {}", config.data.dir.display());
    let skipped = config.pipeline.skipped_agents()?;
    if !skipped.is_empty() {
        let ids: Vec<&str> = skipped.iter().map(|id| id.as_str()).collect();
        println!("  skipped:  {}", ids.join(", "));
    }
    if !provider.is_configured() {
        println!("  warning:  provider has no credentials; runs will be refused");
    }
    Ok(())
}
