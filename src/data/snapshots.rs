use std::collections::BTreeMap;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ObjectiveStatus {
    Met,
    NotMet,
    Partial,
    NotApplicable,
    NotAssessed,
}

impl ObjectiveStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Met => "met",
            Self::NotMet => "not-met",
            Self::Partial => "partial",
            Self::NotApplicable => "not-applicable",
            Self::NotAssessed => "not-assessed",
        }
    }

    /// Whether the objective still needs work.
    pub fn is_deficient(&self) -> bool {
        matches!(self, Self::NotMet | Self::Partial)
    }
}

/// Objective id → assessment status.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct AssessmentSnapshot {
    pub statuses: BTreeMap<String, ObjectiveStatus>,
}

impl AssessmentSnapshot {
    pub fn status(&self, objective_id: &str) -> Option<ObjectiveStatus> {
        self.statuses.get(objective_id).copied()
    }

    pub fn len(&self) -> usize {
        self.statuses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
    }
}

/// Objective id → free-text implementation note.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct ImplementationSnapshot {
    pub notes: BTreeMap<String, String>,
}

impl ImplementationSnapshot {
    pub fn note(&self, objective_id: &str) -> Option<&str> {
        self.notes
            .get(objective_id)
            .map(String::as_str)
            .filter(|n| !n.trim().is_empty())
    }

    pub fn len(&self) -> usize {
        self.notes.values().filter(|n| !n.trim().is_empty()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PoamStatus {
    #[default]
    Open,
    Closed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PoamEntry {
    pub objective_id: String,
    pub weakness: String,
    #[serde(default)]
    pub status: PoamStatus,
    #[serde(default)]
    pub milestone: Option<String>,
    #[serde(default)]
    pub scheduled_completion: Option<NaiveDate>,
}

/// POA&M id → entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct PoamSnapshot {
    pub entries: BTreeMap<String, PoamEntry>,
}

impl PoamSnapshot {
    pub fn open_entries(&self) -> impl Iterator<Item = (&String, &PoamEntry)> {
        self.entries.iter().filter(|(_, e)| e.status == PoamStatus::Open)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InventoryItem {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Organizational artifacts, assets and policies grouped by category.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct InventorySnapshot {
    pub categories: BTreeMap<String, Vec<InventoryItem>>,
}

impl InventorySnapshot {
    pub fn len(&self) -> usize {
        self.categories.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Responsibility {
    Inherited,
    Shared,
    Customer,
}

impl Responsibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inherited => "inherited",
            Self::Shared => "shared",
            Self::Customer => "customer",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Assignment {
    pub responsibility: Responsibility,
    #[serde(default)]
    pub provider: Option<String>,
}

/// Control id → shared-responsibility assignment.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct InheritanceSnapshot {
    pub assignments: BTreeMap<String, Assignment>,
}

impl InheritanceSnapshot {
    pub fn get(&self, control_id: &str) -> Option<&Assignment> {
        self.assignments.get(control_id)
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assessment_parses_flat_map() {
        let json = r#"{"3.1.1[a]": "met", "3.1.1[b]": "not-met"}"#;
        let snap: AssessmentSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snap.len(), 2);
        assert_eq!(snap.status("3.1.1[b]"), Some(ObjectiveStatus::NotMet));
        assert!(snap.status("3.1.1[b]").unwrap().is_deficient());
    }

    #[test]
    fn test_blank_implementation_notes_do_not_count() {
        let mut snap = ImplementationSnapshot::default();
        snap.notes.insert("3.1.1[a]".into(), "MFA enforced via IdP".into());
        snap.notes.insert("3.1.1[b]".into(), "   ".into());
        assert_eq!(snap.len(), 1);
        assert!(snap.note("3.1.1[b]").is_none());
    }

    #[test]
    fn test_poam_open_entries() {
        let json = r#"{
            "P-1": {"objective_id": "3.1.1[b]", "weakness": "No MFA"},
            "P-2": {"objective_id": "3.3.1[a]", "weakness": "Logs", "status": "closed"}
        }"#;
        let snap: PoamSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snap.len(), 2);
        assert_eq!(snap.open_entries().count(), 1);
    }

    #[test]
    fn test_inventory_counts_items_across_categories() {
        let json = r#"{
            "assets": [{"name": "laptop"}, {"name": "file server"}],
            "policies": [{"name": "Access policy", "description": "v2"}]
        }"#;
        let snap: InventorySnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snap.len(), 3);
    }
}
