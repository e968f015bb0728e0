use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use crate::errors::AttestError;
use crate::pipeline::state::TokenUsage;
use super::provider::LLMProvider;
use super::types::{LLMResponse, Message, RequestOptions};
use tracing::debug;

pub struct OpenAIProvider {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    name: &'static str,
    /// Local servers accept requests without a key.
    key_required: bool,
}

impl OpenAIProvider {
    pub fn new(api_key: &str, model: Option<&str>) -> Self {
        Self::with_base_url(api_key, model, "https://api.openai.com/v1")
    }

    pub fn with_base_url(api_key: &str, model: Option<&str>, base_url: &str) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            model: model.unwrap_or("gpt-4o").to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            name: "openai",
            key_required: true,
        }
    }

    /// OpenAI-compatible local endpoint (ollama, vLLM, llama.cpp server).
    pub fn local(base_url: &str, model: Option<&str>, api_key: &str) -> Self {
        Self {
            name: "local",
            key_required: false,
            ..Self::with_base_url(api_key, Some(model.unwrap_or("llama3.1")), base_url)
        }
    }
}

#[async_trait]
impl LLMProvider for OpenAIProvider {
    async fn send_message(
        &self,
        system: &str,
        messages: &[Message],
        options: &RequestOptions,
    ) -> Result<LLMResponse, AttestError> {
        let mut wire = Vec::with_capacity(messages.len() + 1);
        wire.push(json!({"role": "system", "content": system}));
        for m in messages {
            wire.push(json!({"role": m.role, "content": m.content}));
        }

        let body = json!({
            "model": self.model,
            "messages": wire,
            "max_tokens": options.max_output_tokens,
            "temperature": options.temperature,
        });

        let mut req = self.client
            .post(format!("{}/chat/completions", self.base_url))
            .json(&body);
        if !self.api_key.is_empty() {
            req = req.header("Authorization", format!("Bearer {}", self.api_key));
        }
        let resp = req
            .send()
            .await
            .map_err(|e| AttestError::Network(format!("{} request failed: {}", self.name, e)))?;

        let status = resp.status();
        if status.as_u16() == 429 {
            return Err(AttestError::RateLimit(format!("{} rate limit", self.name)));
        }
        if status.as_u16() == 401 {
            return Err(AttestError::Authentication(format!("Invalid {} API key", self.name)));
        }

        let data: Value = resp.json().await
            .map_err(|e| AttestError::Provider(format!("Failed to parse {} response: {}", self.name, e)))?;

        if let Some(error) = data.get("error") {
            return Err(AttestError::Provider(error["message"].as_str().unwrap_or("Unknown").to_string()));
        }

        let text = data["choices"][0]["message"]["content"].as_str()
            .ok_or_else(|| AttestError::Provider(format!("No content in {} response", self.name)))?
            .to_string();
        let usage = TokenUsage::new(
            data["usage"]["prompt_tokens"].as_u64().unwrap_or(0),
            data["usage"]["completion_tokens"].as_u64().unwrap_or(0),
        );

        debug!(provider = self.name, model = %self.model, input_tokens = usage.input_tokens, "Chat completion");

        Ok(LLMResponse { text, usage })
    }

    fn is_configured(&self) -> bool {
        !self.key_required || !self.api_key.trim().is_empty()
    }

    fn provider_name(&self) -> &str { self.name }
    fn model_name(&self) -> &str { &self.model }
}
