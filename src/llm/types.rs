use serde::{Deserialize, Serialize};
use crate::pipeline::state::TokenUsage;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".to_string(), content: content.into() }
    }
    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: "assistant".to_string(), content: content.into() }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RequestOptions {
    pub max_output_tokens: u32,
    pub temperature: f32,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self { max_output_tokens: 2048, temperature: 0.2 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LLMResponse {
    pub text: String,
    pub usage: TokenUsage,
}
