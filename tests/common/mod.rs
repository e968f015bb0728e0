#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use attest::agents::registry::AgentId;
use attest::agents::AgentExecutor;
use attest::data::*;
use attest::errors::AttestError;
use attest::llm::{LLMProvider, LLMResponse, Message, RequestOptions};
use attest::pipeline::state::TokenUsage;
use attest::pipeline::{PipelineRunner, RunnerOptions};
use attest::prompts::templates::system_prompt;
use attest::store::{MemoryBackend, ResultStore, SnapshotHandle, StorageBackend};

/// Deterministic provider: replies are derived from the request, and it can
/// be told to fail or to trip a cancel token when it sees a given agent.
pub struct ScriptedProvider {
    pub calls: Mutex<Vec<(String, String)>>,
    fail_for: Option<String>,
    cancel_on: Option<(String, CancellationToken)>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self { calls: Mutex::new(Vec::new()), fail_for: None, cancel_on: None }
    }

    pub fn failing_for(id: AgentId) -> Self {
        Self { fail_for: Some(system_prompt(id)), ..Self::new() }
    }

    pub fn cancelling_during(id: AgentId, token: CancellationToken) -> Self {
        Self { cancel_on: Some((system_prompt(id), token)), ..Self::new() }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls_for(&self, id: AgentId) -> usize {
        let system = system_prompt(id);
        self.calls.lock().unwrap().iter().filter(|(s, _)| *s == system).count()
    }
}

#[async_trait]
impl LLMProvider for ScriptedProvider {
    async fn send_message(
        &self,
        system: &str,
        messages: &[Message],
        _options: &RequestOptions,
    ) -> Result<LLMResponse, AttestError> {
        let content = messages.iter().map(|m| m.content.as_str()).collect::<Vec<_>>().join("\n");
        self.calls.lock().unwrap().push((system.to_string(), content.clone()));

        if let Some((trigger, token)) = &self.cancel_on {
            if trigger == system {
                token.cancel();
            }
        }
        if self.fail_for.as_deref() == Some(system) {
            return Err(AttestError::Provider("scripted failure".into()));
        }

        let first_line = content.lines().next().unwrap_or_default().to_string();
        Ok(LLMResponse {
            text: format!("analysis of {} ({} chars)", first_line, content.len()),
            usage: TokenUsage::new(100, 20),
        })
    }

    fn is_configured(&self) -> bool {
        true
    }

    fn provider_name(&self) -> &str {
        "scripted"
    }

    fn model_name(&self) -> &str {
        "stub-1"
    }
}

fn objective(id: &str, text: &str) -> Objective {
    Objective { id: id.into(), text: text.into() }
}

fn control(id: &str, title: &str, weight: u32, objectives: Vec<Objective>) -> Control {
    Control { id: id.into(), title: title.into(), weight, objectives }
}

pub fn catalog() -> Catalog {
    Catalog {
        families: vec![
            Family {
                id: "AC".into(),
                name: "Access Control".into(),
                controls: vec![
                    control("3.1.1", "Authorized access", 5, vec![
                        objective("3.1.1[a]", "authorized users are identified"),
                        objective("3.1.1[b]", "processes acting for users are identified"),
                    ]),
                    control("3.1.2", "Transaction control", 5, vec![
                        objective("3.1.2[a]", "permitted transactions are defined"),
                    ]),
                ],
            },
            Family {
                id: "AT".into(),
                name: "Awareness and Training".into(),
                controls: vec![control("3.2.1", "Role-based risk awareness", 3, vec![
                    objective("3.2.1[a]", "security risks are identified"),
                ])],
            },
            Family {
                id: "AU".into(),
                name: "Audit and Accountability".into(),
                controls: vec![control("3.3.1", "System auditing", 5, vec![
                    objective("3.3.1[a]", "audit logs are created"),
                    objective("3.3.1[b]", "audit records are retained"),
                ])],
            },
        ],
    }
}

/// Every collaborator populated, every family relevant to every fan-out agent.
pub fn populated_data() -> ComplianceData {
    let mut data = ComplianceData { catalog: catalog(), ..Default::default() };
    let statuses = [
        ("3.1.1[a]", ObjectiveStatus::Met),
        ("3.1.1[b]", ObjectiveStatus::NotMet),
        ("3.1.2[a]", ObjectiveStatus::Partial),
        ("3.2.1[a]", ObjectiveStatus::NotMet),
        ("3.3.1[a]", ObjectiveStatus::Met),
        ("3.3.1[b]", ObjectiveStatus::Met),
    ];
    for (id, status) in statuses {
        data.assessments.statuses.insert(id.into(), status);
        data.implementations.notes.insert(id.into(), format!("Procedure for {} documented in SOP-7", id));
    }
    data.poam.entries.insert("POAM-1".into(), PoamEntry {
        objective_id: "3.1.1[b]".into(),
        weakness: "Service accounts not inventoried".into(),
        status: PoamStatus::Open,
        milestone: Some("Inventory complete".into()),
        scheduled_completion: None,
    });
    data.poam.entries.insert("POAM-2".into(), PoamEntry {
        objective_id: "3.2.1[a]".into(),
        weakness: "No training program".into(),
        status: PoamStatus::Open,
        milestone: None,
        scheduled_completion: None,
    });
    data.inventory.categories.insert("assets".into(), vec![InventoryItem {
        name: "File server".into(),
        description: Some("Stores CUI".into()),
    }]);
    data.inventory.categories.insert("policies".into(), vec![InventoryItem {
        name: "Access control policy".into(),
        description: None,
    }]);
    for control in ["3.1.1", "3.1.2", "3.2.1", "3.3.1"] {
        data.inheritance.assignments.insert(control.into(), Assignment {
            responsibility: Responsibility::Shared,
            provider: Some("CloudCo".into()),
        });
    }
    data
}

pub async fn memory_handle() -> Arc<SnapshotHandle> {
    handle_on(Arc::new(MemoryBackend::new())).await
}

pub async fn handle_on(backend: Arc<dyn StorageBackend>) -> Arc<SnapshotHandle> {
    Arc::new(SnapshotHandle::open(ResultStore::new(backend, "attest-results")).await)
}

pub fn runner(
    provider: Arc<ScriptedProvider>,
    data: ComplianceData,
    handle: Arc<SnapshotHandle>,
) -> PipelineRunner {
    let executor = AgentExecutor::new(provider, Arc::new(StaticDataSource::new(data)));
    PipelineRunner::new(executor, handle, RunnerOptions::default())
}
