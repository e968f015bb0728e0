//! Advisory data-sufficiency classification.
//!
//! Readiness never gates execution: an agent reported red still runs when
//! asked to, it just receives less context.

use serde::{Deserialize, Serialize};
use crate::agents::registry::{definition, pipeline_order, AgentId};
use crate::data::{ComplianceData, DataSourceKind};
use super::state::{AgentStatus, ResultSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadinessStatus {
    Green,
    Yellow,
    Red,
}

impl ReadinessStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Green => "green",
            Self::Yellow => "yellow",
            Self::Red => "red",
        }
    }
}

impl std::fmt::Display for ReadinessStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceCheck {
    pub source: DataSourceKind,
    pub required: bool,
    pub available: bool,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyCheck {
    pub agent: AgentId,
    pub status: AgentStatus,
    pub completed: bool,
}

/// Derived on demand, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadinessReport {
    pub agent: AgentId,
    pub status: ReadinessStatus,
    pub sources: Vec<SourceCheck>,
    pub dependencies: Vec<DependencyCheck>,
}

impl ReadinessReport {
    pub fn missing_required(&self) -> impl Iterator<Item = &SourceCheck> {
        self.sources.iter().filter(|s| s.required && !s.available)
    }

    pub fn incomplete_dependencies(&self) -> impl Iterator<Item = &DependencyCheck> {
        self.dependencies.iter().filter(|d| !d.completed)
    }
}

/// Red if a required source is absent; yellow if an optional source is absent
/// or an upstream agent has not completed; green otherwise.
pub fn compute_readiness(
    id: AgentId,
    data: &ComplianceData,
    snapshot: &ResultSnapshot,
) -> ReadinessReport {
    let def = definition(id);

    let sources: Vec<SourceCheck> = def
        .sources
        .iter()
        .map(|req| {
            let count = data.count(req.source);
            SourceCheck {
                source: req.source,
                required: req.required,
                available: count > 0,
                count,
            }
        })
        .collect();

    let dependencies: Vec<DependencyCheck> = def
        .upstream
        .iter()
        .map(|up| {
            let status = snapshot.status_of(*up);
            DependencyCheck {
                agent: *up,
                status,
                completed: status == AgentStatus::Completed,
            }
        })
        .collect();

    let status = if sources.iter().any(|s| s.required && !s.available) {
        ReadinessStatus::Red
    } else if sources.iter().any(|s| !s.available) || dependencies.iter().any(|d| !d.completed) {
        ReadinessStatus::Yellow
    } else {
        ReadinessStatus::Green
    };

    ReadinessReport { agent: id, status, sources, dependencies }
}

/// Reports for every agent in pipeline order.
pub fn compute_all(data: &ComplianceData, snapshot: &ResultSnapshot) -> Vec<ReadinessReport> {
    pipeline_order()
        .into_iter()
        .map(|def| compute_readiness(def.id, data, snapshot))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Assignment, InventoryItem, ObjectiveStatus, Responsibility};

    fn with_srm_sources() -> ComplianceData {
        let mut data = ComplianceData::default();
        data.inheritance.assignments.insert("3.1.1".into(), Assignment {
            responsibility: Responsibility::Shared,
            provider: None,
        });
        data.inventory.categories.insert("assets".into(), vec![
            InventoryItem { name: "laptop".into(), description: None },
            InventoryItem { name: "vpn".into(), description: None },
        ]);
        data
    }

    #[test]
    fn test_no_data_required_sources_red() {
        let report = compute_readiness(AgentId::SrmValidator, &ComplianceData::default(), &ResultSnapshot::empty());
        assert_eq!(report.status, ReadinessStatus::Red);
        assert_eq!(report.sources.len(), 2);
        for check in &report.sources {
            assert!(check.required);
            assert!(!check.available);
            assert_eq!(check.count, 0);
        }
        assert_eq!(report.missing_required().count(), 2);
    }

    #[test]
    fn test_sources_present_but_upstream_pending_is_yellow() {
        let report = compute_readiness(AgentId::SrmValidator, &with_srm_sources(), &ResultSnapshot::empty());
        assert_eq!(report.status, ReadinessStatus::Yellow);
        assert_eq!(report.sources[1].count, 2);
        assert_eq!(report.incomplete_dependencies().count(), 1);
    }

    #[test]
    fn test_all_satisfied_is_green() {
        let mut snap = ResultSnapshot::empty();
        snap.agent_mut(AgentId::ScopeAnalyzer).transition(AgentStatus::Completed);
        let report = compute_readiness(AgentId::SrmValidator, &with_srm_sources(), &snap);
        assert_eq!(report.status, ReadinessStatus::Green);
    }

    #[test]
    fn test_errored_upstream_is_not_completed() {
        let mut snap = ResultSnapshot::empty();
        snap.agent_mut(AgentId::ScopeAnalyzer).transition(AgentStatus::Error);
        let report = compute_readiness(AgentId::SrmValidator, &with_srm_sources(), &snap);
        assert_eq!(report.status, ReadinessStatus::Yellow);
        assert_eq!(report.dependencies[0].status, AgentStatus::Error);
    }

    #[test]
    fn test_missing_optional_source_is_yellow() {
        let mut data = ComplianceData::default();
        data.assessments.statuses.insert("3.1.1[a]".into(), ObjectiveStatus::Met);
        // poam-reviewer requires poam, so use risk-scorer: assessments required, poam/inheritance optional
        let mut snap = ResultSnapshot::empty();
        for up in definition(AgentId::RiskScorer).upstream {
            snap.agent_mut(*up).transition(AgentStatus::Completed);
        }
        let report = compute_readiness(AgentId::RiskScorer, &data, &snap);
        assert_eq!(report.status, ReadinessStatus::Yellow);
        assert_eq!(report.missing_required().count(), 0);
    }

    #[test]
    fn test_aggregator_with_no_upstream_is_not_green() {
        let report = compute_readiness(AgentId::ReadinessReport, &ComplianceData::default(), &ResultSnapshot::empty());
        assert_ne!(report.status, ReadinessStatus::Green);
        assert_eq!(report.dependencies.len(), 11);
    }

    #[test]
    fn test_readiness_is_idempotent() {
        let data = with_srm_sources();
        let snap = ResultSnapshot::empty();
        let before = snap.clone();
        assert_eq!(compute_all(&data, &snap), compute_all(&data, &snap));
        assert_eq!(snap, before);
    }
}
