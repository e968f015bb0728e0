use console::style;
use crate::agents::registry::pipeline_order;
use crate::cli::commands::StatusArgs;
use crate::config::AttestConfig;
use crate::errors::AttestError;
use crate::pipeline::metrics::total_usage;
use crate::utils::formatting::format_tokens;
use super::render::{render_agent_line, run_badge};

pub async fn handle_status(args: StatusArgs, config: AttestConfig) -> Result<(), AttestError> {
    let handle = super::open_handle(&config).await?;
    let snapshot = handle.current().await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    let run = &snapshot.run;
    println!("Store:    {}", handle.store().describe());
    println!("Run:      {} {}", run.run_id.map(|id| id.to_string()).unwrap_or_else(|| "-".into()), run_badge(run.status));
    if let Some(provider) = &run.provider {
        println!("Provider: {}", provider);
    }
    if let Some(started) = run.started_at {
        println!("Started:  {}", started.to_rfc3339());
    }
    if let Some(completed) = run.completed_at {
        println!("Finished: {}", completed.to_rfc3339());
    }
    println!("Tokens:   {}", format_tokens(total_usage(&snapshot).total()));
    println!();

    for def in pipeline_order() {
        let Some(state) = snapshot.agent(def.id) else { continue };
        println!("{}", render_agent_line(def.display_name, state));
        if args.results {
            if let Some(result) = snapshot.completed_result(def.id) {
                println!("{}\n", style(result.as_text()).dim());
            }
        }
    }
    Ok(())
}
