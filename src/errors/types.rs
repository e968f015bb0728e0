use thiserror::Error;

#[derive(Debug, Error)]
pub enum AttestError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Rate limited: {0}")]
    RateLimit(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Data source error: {0}")]
    Data(String),

    #[error("Prompt error: {0}")]
    Prompt(String),

    #[error("Cancelled: {0}")]
    Cancelled(String),

    #[error("Unknown agent: {0}")]
    UnknownAgent(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}
