pub mod provider;
pub mod anthropic;
pub mod openai;
pub mod router;
pub mod types;

pub use provider::LLMProvider;
pub use router::create_provider;
pub use types::{LLMResponse, Message, RequestOptions};
