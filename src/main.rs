use clap::Parser;
use tracing_subscriber::EnvFilter;
use attest::cli::{self, Cli, Commands};
use attest::errors::{AttestError, ErrorCategory};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level));

    if cli.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_ansi(!cli.no_color)
            .with_writer(std::io::stderr)
            .init();
    }
    if cli.no_color {
        console::set_colors_enabled(false);
    }

    let result = dispatch(cli).await;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        let exit_code = match (&e, e.category()) {
            (AttestError::Authentication(_), _) => 3,
            (_, ErrorCategory::Configuration) => 2,
            _ => 1,
        };
        std::process::exit(exit_code);
    }
}

async fn dispatch(parsed: Cli) -> Result<(), AttestError> {
    let config_path = parsed.config;
    match parsed.command {
        Commands::Validate(args) => cli::validate::handle_validate(args).await,
        Commands::Run(args) => {
            cli::run::handle_run(args, cli::load(config_path.as_deref()).await?).await
        }
        Commands::Readiness(args) => {
            cli::readiness::handle_readiness(args, cli::load(config_path.as_deref()).await?).await
        }
        Commands::Status(args) => {
            cli::status::handle_status(args, cli::load(config_path.as_deref()).await?).await
        }
    }
}
