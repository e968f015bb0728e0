use tokio::sync::mpsc;
use crate::agents::registry::{definition, AgentId};
use crate::cli::commands::RunArgs;
use crate::config::AttestConfig;
use crate::errors::AttestError;
use crate::pipeline::PipelineEvent;
use super::progress::RunProgress;
use super::render::render_agent_line;
use tracing::{info, warn};

pub async fn handle_run(args: RunArgs, config: AttestConfig) -> Result<(), AttestError> {
    let single: Option<AgentId> = args.agent.as_deref().map(str::parse).transpose()?;

    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<PipelineEvent>();
    let runner = super::build_runner(&config).await?.with_event_channel(event_tx);
    let token = runner.cancel_token();

    let render_task = tokio::spawn(async move {
        let mut progress = RunProgress::new();
        while let Some(event) = event_rx.recv().await {
            progress.handle_event(&event);
        }
    });

    // Second Ctrl-C falls through to the default handler by exiting
    let signal_task = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received; stopping after the current agent");
            token.cancel();
            if tokio::signal::ctrl_c().await.is_ok() {
                std::process::exit(130);
            }
        }
    });

    let outcome = match single {
        Some(id) => runner.run_single(id).await.map(|state| {
            info!(agent = %id, status = %state.status, "Single agent run finished");
            Some((id, state))
        }),
        None => runner.run_full().await.map(|_| None),
    };

    // Closing the channel ends the render task
    drop(runner);
    signal_task.abort();
    let _ = render_task.await;

    if let Some((id, state)) = outcome? {
        println!("{}", render_agent_line(definition(id).display_name, &state));
        if let Some(result) = &state.result {
            println!("\n{}", result.as_text());
        }
    }
    Ok(())
}
