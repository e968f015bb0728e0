pub mod agents;
pub mod cli;
pub mod config;
pub mod data;
pub mod errors;
pub mod llm;
pub mod pipeline;
pub mod prompts;
pub mod store;
pub mod utils;
