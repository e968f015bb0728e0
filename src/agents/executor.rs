use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use crate::data::{ComplianceData, DataSource};
use crate::errors::AttestError;
use crate::llm::provider::LLMProvider;
use crate::pipeline::events::PipelineEvent;
use crate::pipeline::state::{AgentResult, AgentStatus, ExecutionState, ResultSnapshot, TokenUsage};
use crate::prompts::{build_request, PromptContext, PromptPayload};
use super::registry::{definition, AgentId};
use tracing::{debug, info, warn};

/// Knobs applied to every payload the executor builds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExecutorOptions {
    pub excerpt_chars: usize,
    pub temperature: f32,
    pub max_output_tokens: Option<u32>,
}

impl Default for ExecutorOptions {
    fn default() -> Self {
        Self { excerpt_chars: 1500, temperature: 0.2, max_output_tokens: None }
    }
}

/// Outcome of one agent invocation, applied to its state by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionDelta {
    pub status: AgentStatus,
    pub result: Option<AgentResult>,
    pub usage: TokenUsage,
    pub error: Option<String>,
    pub provider: String,
}

impl ExecutionDelta {
    pub fn apply(self, state: &mut ExecutionState) {
        state.result = self.result;
        state.usage = self.usage;
        state.error = self.error;
        state.provider = Some(self.provider);
        state.transition(self.status);
    }

    pub fn is_success(&self) -> bool {
        self.status == AgentStatus::Completed
    }
}

pub struct AgentExecutor {
    llm: Arc<dyn LLMProvider>,
    data: Arc<dyn DataSource>,
    event_tx: Option<mpsc::UnboundedSender<PipelineEvent>>,
}

impl AgentExecutor {
    pub fn new(llm: Arc<dyn LLMProvider>, data: Arc<dyn DataSource>) -> Self {
        Self { llm, data, event_tx: None }
    }

    pub fn with_event_channel(mut self, tx: mpsc::UnboundedSender<PipelineEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }

    pub fn provider(&self) -> &dyn LLMProvider {
        self.llm.as_ref()
    }

    pub fn data_source(&self) -> &dyn DataSource {
        self.data.as_ref()
    }

    fn emit(&self, event: PipelineEvent) {
        if let Some(ref tx) = self.event_tx {
            let _ = tx.send(event);
        }
    }

    /// Run one agent against the current data and upstream results.
    ///
    /// Never fails: a provider or data error becomes an `error` delta with
    /// the message unmodified, no result and zero usage.
    pub async fn execute(
        &self,
        id: AgentId,
        snapshot: &ResultSnapshot,
        options: &ExecutorOptions,
    ) -> ExecutionDelta {
        let start = Instant::now();
        let provider = self.llm.identity();
        info!(agent = %id, provider = %provider, "Starting agent execution");

        match self.try_execute(id, snapshot, options).await {
            Ok((result, usage)) => {
                info!(
                    agent = %id,
                    duration_ms = start.elapsed().as_millis() as u64,
                    input_tokens = usage.input_tokens,
                    output_tokens = usage.output_tokens,
                    "Agent completed successfully"
                );
                ExecutionDelta {
                    status: AgentStatus::Completed,
                    result: Some(result),
                    usage,
                    error: None,
                    provider,
                }
            }
            Err(e) => {
                warn!(agent = %id, category = %e.category(), error = %e, "Agent failed");
                ExecutionDelta {
                    status: AgentStatus::Error,
                    result: None,
                    usage: TokenUsage::default(),
                    error: Some(e.to_string()),
                    provider,
                }
            }
        }
    }

    async fn try_execute(
        &self,
        id: AgentId,
        snapshot: &ResultSnapshot,
        options: &ExecutorOptions,
    ) -> Result<(AgentResult, TokenUsage), AttestError> {
        let data = self.data.snapshot().await?;
        let ctx = PromptContext {
            data: &data,
            snapshot,
            excerpt_chars: options.excerpt_chars,
            temperature: options.temperature,
            max_output_tokens_cap: options.max_output_tokens,
        };

        if definition(id).is_fan_out() {
            return self.fan_out(id, &data, &ctx).await;
        }
        let payload = build_request(id, None, &ctx).ok_or_else(|| {
            AttestError::Prompt(format!("no payload for whole-mode agent {}", id))
        })?;
        let (text, usage) = self.call(id, None, &payload).await?;
        Ok((AgentResult::Whole(text), usage))
    }

    /// One call per family with relevant content, strictly in catalog order.
    async fn fan_out(
        &self,
        id: AgentId,
        data: &ComplianceData,
        ctx: &PromptContext<'_>,
    ) -> Result<(AgentResult, TokenUsage), AttestError> {
        let mut outputs = BTreeMap::new();
        let mut usage = TokenUsage::default();

        for family in data.catalog.partitions() {
            let Some(payload) = build_request(id, Some(family), ctx) else {
                debug!(agent = %id, partition = %family.id, "No relevant content, skipping partition");
                self.emit(PipelineEvent::PartitionSkipped {
                    agent: id,
                    partition: family.id.clone(),
                });
                continue;
            };

            let (text, call_usage) = self.call(id, Some(&family.id), &payload).await?;
            usage = usage + call_usage;
            outputs.insert(family.id.clone(), text);
            self.emit(PipelineEvent::PartitionCompleted {
                agent: id,
                partition: family.id.clone(),
                usage: call_usage,
            });
        }

        Ok((AgentResult::Partitioned(outputs), usage))
    }

    async fn call(
        &self,
        id: AgentId,
        partition: Option<&str>,
        payload: &PromptPayload,
    ) -> Result<(String, TokenUsage), AttestError> {
        debug!(
            agent = %id,
            partition = partition.unwrap_or("-"),
            max_output_tokens = payload.options.max_output_tokens,
            "Sending provider request"
        );
        let response = self
            .llm
            .send_message(&payload.system, &payload.messages, &payload.options)
            .await?;
        Ok((response.text, response.usage))
    }
}
