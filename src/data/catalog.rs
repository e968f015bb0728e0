use serde::{Deserialize, Serialize};

/// Identifier of a control family. Fan-out agents use it as their partition key.
pub type PartitionKey = String;

/// Static family → control → objective reference catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Catalog {
    #[serde(default)]
    pub families: Vec<Family>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Family {
    pub id: PartitionKey,
    pub name: String,
    #[serde(default)]
    pub controls: Vec<Control>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Control {
    pub id: String,
    pub title: String,
    /// Points deducted from the maximum score when the control is not fully met.
    #[serde(default = "default_weight")]
    pub weight: u32,
    #[serde(default)]
    pub objectives: Vec<Objective>,
}

fn default_weight() -> u32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Objective {
    pub id: String,
    pub text: String,
}

impl Catalog {
    /// Partitions in catalog enumeration order.
    pub fn partitions(&self) -> impl Iterator<Item = &Family> {
        self.families.iter()
    }

    pub fn family(&self, id: &str) -> Option<&Family> {
        self.families.iter().find(|f| f.id == id)
    }

    pub fn controls(&self) -> impl Iterator<Item = &Control> {
        self.families.iter().flat_map(|f| f.controls.iter())
    }

    pub fn objective_count(&self) -> usize {
        self.controls().map(|c| c.objectives.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }
}

impl Family {
    pub fn objectives(&self) -> impl Iterator<Item = (&Control, &Objective)> {
        self.controls
            .iter()
            .flat_map(|c| c.objectives.iter().map(move |o| (c, o)))
    }

    pub fn contains_control(&self, control_id: &str) -> bool {
        self.controls.iter().any(|c| c.id == control_id)
    }

    pub fn contains_objective(&self, objective_id: &str) -> bool {
        self.objectives().any(|(_, o)| o.id == objective_id)
    }
}

#[cfg(test)]
pub(crate) fn sample_catalog() -> Catalog {
    fn control(id: &str, weight: u32, objectives: &[&str]) -> Control {
        Control {
            id: id.to_string(),
            title: format!("Control {}", id),
            weight,
            objectives: objectives
                .iter()
                .map(|o| Objective { id: o.to_string(), text: format!("Objective {}", o) })
                .collect(),
        }
    }

    Catalog {
        families: vec![
            Family {
                id: "AC".to_string(),
                name: "Access Control".to_string(),
                controls: vec![
                    control("3.1.1", 5, &["3.1.1[a]", "3.1.1[b]"]),
                    control("3.1.2", 5, &["3.1.2[a]"]),
                ],
            },
            Family {
                id: "AT".to_string(),
                name: "Awareness and Training".to_string(),
                controls: vec![control("3.2.1", 3, &["3.2.1[a]"])],
            },
            Family {
                id: "AU".to_string(),
                name: "Audit and Accountability".to_string(),
                controls: vec![control("3.3.1", 5, &["3.3.1[a]", "3.3.1[b]"])],
            },
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partitions_keep_catalog_order() {
        let catalog = sample_catalog();
        let ids: Vec<&str> = catalog.partitions().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["AC", "AT", "AU"]);
    }

    #[test]
    fn test_objective_lookup() {
        let catalog = sample_catalog();
        let ac = catalog.family("AC").unwrap();
        assert!(ac.contains_objective("3.1.2[a]"));
        assert!(!ac.contains_objective("3.2.1[a]"));
        assert!(ac.contains_control("3.1.1"));
        assert_eq!(catalog.objective_count(), 6);
    }

    #[test]
    fn test_weight_defaults_to_one() {
        let json = r#"{"id": "3.4.1", "title": "Baselines"}"#;
        let control: Control = serde_json::from_str(json).unwrap();
        assert_eq!(control.weight, 1);
        assert!(control.objectives.is_empty());
    }
}
