use std::collections::HashMap;
use std::time::{Duration, Instant};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use crate::agents::registry::{definition, AgentId};
use crate::pipeline::state::{AgentStatus, TokenUsage};
use crate::pipeline::PipelineEvent;
use crate::utils::formatting::{format_duration, format_tokens};
use super::render::render_event;

/// Indicatif bars for a live run: overall agent progress, one spinner per
/// running agent, and a status line with elapsed time and tokens.
pub struct RunProgress {
    multi: MultiProgress,
    run_bar: Option<ProgressBar>,
    agent_bars: HashMap<AgentId, ProgressBar>,
    status_bar: ProgressBar,
    usage: TokenUsage,
    start_time: Instant,
}

impl RunProgress {
    pub fn new() -> Self {
        let multi = MultiProgress::new();

        let status_bar = multi.add(ProgressBar::new_spinner());
        status_bar.set_style(spinner_style("  {spinner:.cyan} {msg}"));
        status_bar.set_message("Starting...");
        status_bar.enable_steady_tick(Duration::from_millis(120));

        Self {
            multi,
            run_bar: None,
            agent_bars: HashMap::new(),
            status_bar,
            usage: TokenUsage::default(),
            start_time: Instant::now(),
        }
    }

    pub fn handle_event(&mut self, event: &PipelineEvent) {
        if let Some(line) = render_event(event) {
            let _ = self.multi.println(line);
        }

        match event {
            PipelineEvent::RunStarted { agent_count, .. } => {
                let bar = self.multi.insert_before(&self.status_bar, ProgressBar::new(*agent_count as u64));
                let style = ProgressStyle::default_bar()
                    .template("  {bar:30.cyan/dark_gray} {pos}/{len} agents | {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("█▓░");
                bar.set_style(style);
                self.run_bar = Some(bar);
            }
            PipelineEvent::PhaseStarted { display_name, .. } => {
                if let Some(bar) = &self.run_bar {
                    bar.set_message(display_name.clone());
                }
            }
            PipelineEvent::AgentTransition { agent, state } => match state.status {
                AgentStatus::Running => {
                    let bar = self.multi.insert_before(&self.status_bar, ProgressBar::new_spinner());
                    bar.set_style(spinner_style("    {spinner:.yellow} {msg}"));
                    bar.set_message(definition(*agent).display_name);
                    bar.enable_steady_tick(Duration::from_millis(100));
                    self.agent_bars.insert(*agent, bar);
                }
                _ => {
                    if let Some(bar) = self.agent_bars.remove(agent) {
                        bar.finish_and_clear();
                    }
                    if let Some(bar) = &self.run_bar {
                        bar.inc(1);
                    }
                    self.usage = self.usage + state.usage;
                }
            },
            PipelineEvent::PartitionCompleted { agent, partition, .. } => {
                if let Some(bar) = self.agent_bars.get(agent) {
                    bar.set_message(format!("{} [{}]", definition(*agent).display_name, partition));
                }
            }
            PipelineEvent::RunFinished { .. } => {
                for (_, bar) in self.agent_bars.drain() {
                    bar.finish_and_clear();
                }
                if let Some(bar) = self.run_bar.take() {
                    bar.finish_and_clear();
                }
                self.status_bar.finish_and_clear();
                return;
            }
            PipelineEvent::PartitionSkipped { .. } => {}
        }
        self.update_status();
    }

    fn update_status(&self) {
        self.status_bar.set_message(format!(
            "{} | {} tokens",
            format_duration(self.start_time.elapsed().as_millis() as u64),
            format_tokens(self.usage.total()),
        ));
    }

    pub fn println(&self, msg: &str) {
        let _ = self.multi.println(msg);
    }
}

impl Default for RunProgress {
    fn default() -> Self {
        Self::new()
    }
}

fn spinner_style(template: &str) -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template(template)
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}
