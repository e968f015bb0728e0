use std::collections::BTreeMap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::agents::registry::{AgentId, AGENT_REGISTRY};
use crate::data::PartitionKey;

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    #[default]
    Pending,
    Running,
    Completed,
    Error,
    Skipped,
}

impl AgentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Error => "error",
            Self::Skipped => "skipped",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Error | Self::Skipped)
    }
}

impl std::fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    #[default]
    Pending,
    Running,
    Completed,
    Cancelled,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl TokenUsage {
    pub fn new(input_tokens: u64, output_tokens: u64) -> Self {
        Self { input_tokens, output_tokens }
    }

    pub fn add(&mut self, other: TokenUsage) {
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
    }

    pub fn total(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }
}

impl std::ops::Add for TokenUsage {
    type Output = TokenUsage;

    fn add(mut self, rhs: TokenUsage) -> TokenUsage {
        TokenUsage::add(&mut self, rhs);
        self
    }
}

/// Opaque agent output. The engine stores it and never interprets it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum AgentResult {
    Whole(String),
    Partitioned(BTreeMap<PartitionKey, String>),
}

impl AgentResult {
    /// Text for one partition. Whole results apply to every partition.
    pub fn for_partition(&self, key: &str) -> Option<&str> {
        match self {
            Self::Whole(text) => Some(text),
            Self::Partitioned(map) => map.get(key).map(String::as_str),
        }
    }

    /// Flatten into a single text block, partitions in key order.
    pub fn as_text(&self) -> String {
        match self {
            Self::Whole(text) => text.clone(),
            Self::Partitioned(map) => map
                .iter()
                .map(|(k, v)| format!("[{}]\n{}", k, v))
                .collect::<Vec<_>>()
                .join("\n\n"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ExecutionState {
    pub status: AgentStatus,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub usage: TokenUsage,
    #[serde(default)]
    pub result: Option<AgentResult>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ExecutionState {
    pub fn transition(&mut self, status: AgentStatus) {
        self.status = status;
        self.updated_at = Some(Utc::now());
    }

    pub fn is_completed(&self) -> bool {
        self.status == AgentStatus::Completed
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PipelineRun {
    #[serde(default)]
    pub run_id: Option<Uuid>,
    pub status: RunStatus,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    /// Agents actually executed in this run, in execution order.
    #[serde(default)]
    pub executed: Vec<AgentId>,
    #[serde(default)]
    pub provider: Option<String>,
}

/// The entire persisted unit: run metadata plus every agent's state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResultSnapshot {
    pub version: u32,
    #[serde(default)]
    pub last_run: Option<DateTime<Utc>>,
    #[serde(default)]
    pub run: PipelineRun,
    #[serde(default)]
    pub agents: BTreeMap<AgentId, ExecutionState>,
}

impl ResultSnapshot {
    /// Fresh snapshot with every registered agent pending.
    pub fn empty() -> Self {
        let agents = AGENT_REGISTRY
            .iter()
            .map(|def| (def.id, ExecutionState::default()))
            .collect();
        Self {
            version: SNAPSHOT_VERSION,
            last_run: None,
            run: PipelineRun::default(),
            agents,
        }
    }

    pub fn agent(&self, id: AgentId) -> Option<&ExecutionState> {
        self.agents.get(&id)
    }

    pub fn agent_mut(&mut self, id: AgentId) -> &mut ExecutionState {
        self.agents.entry(id).or_default()
    }

    pub fn status_of(&self, id: AgentId) -> AgentStatus {
        self.agent(id).map(|s| s.status).unwrap_or_default()
    }

    /// Result of an agent, only when it completed.
    pub fn completed_result(&self, id: AgentId) -> Option<&AgentResult> {
        self.agent(id)
            .filter(|s| s.is_completed())
            .and_then(|s| s.result.as_ref())
    }

    pub fn count_status(&self, status: AgentStatus) -> usize {
        self.agents.values().filter(|s| s.status == status).count()
    }
}

impl Default for ResultSnapshot {
    fn default() -> Self {
        Self::empty()
    }
}
