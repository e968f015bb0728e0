use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use crate::errors::AttestError;
use crate::pipeline::state::TokenUsage;
use super::provider::LLMProvider;
use super::types::{LLMResponse, Message, RequestOptions};
use tracing::debug;

pub const DEFAULT_MODEL: &str = "claude-sonnet-4-5-20250929";

pub struct AnthropicProvider {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl AnthropicProvider {
    pub fn new(api_key: &str, model: Option<&str>) -> Self {
        Self::with_base_url(api_key, model, "https://api.anthropic.com")
    }

    pub fn with_base_url(api_key: &str, model: Option<&str>, base_url: &str) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            model: model.unwrap_or(DEFAULT_MODEL).to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl LLMProvider for AnthropicProvider {
    async fn send_message(
        &self,
        system: &str,
        messages: &[Message],
        options: &RequestOptions,
    ) -> Result<LLMResponse, AttestError> {
        let body = json!({
            "model": self.model,
            "max_tokens": options.max_output_tokens,
            "temperature": options.temperature,
            "system": system,
            "messages": messages,
        });

        let resp = self.client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| AttestError::Network(format!("Anthropic API request failed: {}", e)))?;

        let status = resp.status();
        if status == 429 {
            return Err(AttestError::RateLimit("Anthropic rate limit exceeded".into()));
        }
        if status == 401 {
            return Err(AttestError::Authentication("Invalid Anthropic API key".into()));
        }

        let data: Value = resp.json().await
            .map_err(|e| AttestError::Provider(format!("Failed to parse Anthropic response: {}", e)))?;

        if let Some(error) = data.get("error") {
            let msg = error["message"].as_str().unwrap_or("Unknown error");
            return Err(AttestError::Provider(msg.to_string()));
        }

        // Concatenate every text block; tool or thinking blocks are ignored.
        let text = data["content"]
            .as_array()
            .map(|blocks| {
                blocks
                    .iter()
                    .filter_map(|b| b["text"].as_str())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AttestError::Provider("No content in Anthropic response".into()))?;

        let usage = TokenUsage::new(
            data["usage"]["input_tokens"].as_u64().unwrap_or(0),
            data["usage"]["output_tokens"].as_u64().unwrap_or(0),
        );

        debug!(model = %self.model, input_tokens = usage.input_tokens, output_tokens = usage.output_tokens, "Anthropic completion");

        Ok(LLMResponse { text, usage })
    }

    fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    fn provider_name(&self) -> &str { "anthropic" }
    fn model_name(&self) -> &str { &self.model }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_and_configuration() {
        let p = AnthropicProvider::new("sk-ant-test", None);
        assert!(p.is_configured());
        assert_eq!(p.identity(), format!("anthropic/{}", DEFAULT_MODEL));

        let empty = AnthropicProvider::new("  ", Some("claude-haiku"));
        assert!(!empty.is_configured());
        assert_eq!(empty.model_name(), "claude-haiku");
    }
}
