use crate::config::LLMConfig;
use crate::errors::AttestError;
use super::provider::LLMProvider;
use super::anthropic::AnthropicProvider;
use super::openai::OpenAIProvider;

pub fn create_provider(config: &LLMConfig) -> Result<Box<dyn LLMProvider>, AttestError> {
    let api_key = config.api_key.as_deref().unwrap_or("");
    let model = config.model.as_deref();

    match config.provider.as_str() {
        "anthropic" => Ok(Box::new(match config.base_url.as_deref() {
            Some(url) => AnthropicProvider::with_base_url(api_key, model, url),
            None => AnthropicProvider::new(api_key, model),
        })),
        "openai" => Ok(Box::new(match config.base_url.as_deref() {
            Some(url) => OpenAIProvider::with_base_url(api_key, model, url),
            None => OpenAIProvider::new(api_key, model),
        })),
        "local" => {
            let url = config.base_url.as_deref().unwrap_or("http://localhost:11434/v1");
            Ok(Box::new(OpenAIProvider::local(url, model, api_key)))
        }
        other => Err(AttestError::Config(format!("Unknown LLM provider: {}", other))),
    }
}
