use std::path::PathBuf;
use serde::{Deserialize, Serialize};
use crate::agents::registry::AgentId;
use crate::errors::AttestError;

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct AttestConfig {
    #[serde(default)]
    pub llm: LLMConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LLMConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Caps every agent's own output limit when set.
    pub max_output_tokens: Option<u32>,
}

fn default_provider() -> String {
    "anthropic".to_string()
}

fn default_temperature() -> f32 {
    0.2
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            api_key: None,
            base_url: None,
            temperature: default_temperature(),
            max_output_tokens: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackendKind {
    #[default]
    File,
    Sqlite,
    Memory,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackendKind,
    /// Directory for the file backend, database file for sqlite.
    #[serde(default = "default_storage_path")]
    pub path: PathBuf,
    #[serde(default = "default_storage_key")]
    pub key: String,
}

fn default_storage_path() -> PathBuf {
    PathBuf::from("./.attest")
}

fn default_storage_key() -> String {
    "attest-results".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackendKind::default(),
            path: default_storage_path(),
            key: default_storage_key(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub dir: PathBuf,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

impl Default for DataConfig {
    fn default() -> Self {
        Self { dir: default_data_dir() }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub skip_agents: Vec<String>,
    /// Maximum characters of each upstream result quoted into a prompt.
    #[serde(default = "default_excerpt_chars")]
    pub excerpt_chars: usize,
}

fn default_excerpt_chars() -> usize {
    1500
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            skip_agents: Vec::new(),
            excerpt_chars: default_excerpt_chars(),
        }
    }
}

impl PipelineConfig {
    pub fn skipped_agents(&self) -> Result<Vec<AgentId>, AttestError> {
        self.skip_agents.iter().map(|s| s.parse()).collect()
    }
}
