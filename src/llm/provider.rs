use async_trait::async_trait;
use crate::errors::AttestError;
use super::types::{LLMResponse, Message, RequestOptions};

#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// One request/response exchange. Errors are returned unmodified to the caller.
    async fn send_message(
        &self,
        system: &str,
        messages: &[Message],
        options: &RequestOptions,
    ) -> Result<LLMResponse, AttestError>;

    /// Whether credentials are present so a run may start.
    fn is_configured(&self) -> bool;

    /// Provider name for logging
    fn provider_name(&self) -> &str;

    /// Model identifier
    fn model_name(&self) -> &str;

    /// Human-readable active identity, recorded on every execution state.
    fn identity(&self) -> String {
        format!("{}/{}", self.provider_name(), self.model_name())
    }
}
