use serde::{Deserialize, Serialize};

/// Pipeline stages. Declaration order is execution order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
pub enum PhaseName {
    Baseline,
    Validation,
    Remediation,
    Documentation,
    Synthesis,
}

impl PhaseName {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Baseline => "baseline",
            Self::Validation => "validation",
            Self::Remediation => "remediation",
            Self::Documentation => "documentation",
            Self::Synthesis => "synthesis",
        }
    }
}

impl std::fmt::Display for PhaseName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub struct PhaseDefinition {
    pub name: PhaseName,
    pub display_name: &'static str,
    pub description: &'static str,
}

pub static PHASES: &[PhaseDefinition] = &[
    PhaseDefinition {
        name: PhaseName::Baseline,
        display_name: "Baseline",
        description: "Scope, gap and implementation review of the current assessment",
    },
    PhaseDefinition {
        name: PhaseName::Validation,
        display_name: "Validation",
        description: "Shared responsibility, evidence and consistency checks",
    },
    PhaseDefinition {
        name: PhaseName::Remediation,
        display_name: "Remediation",
        description: "POA&M review, remediation planning and risk scoring",
    },
    PhaseDefinition {
        name: PhaseName::Documentation,
        display_name: "Documentation",
        description: "System security plan narratives and executive briefing",
    },
    PhaseDefinition {
        name: PhaseName::Synthesis,
        display_name: "Synthesis",
        description: "Aggregate readiness report across every agent",
    },
];

pub fn phase_definition(name: PhaseName) -> &'static PhaseDefinition {
    PHASES
        .iter()
        .find(|p| p.name == name)
        .unwrap_or(&PHASES[0])
}
