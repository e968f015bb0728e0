use std::sync::LazyLock;
use serde::{Deserialize, Serialize};
use crate::data::DataSourceKind;
use crate::errors::AttestError;
use crate::pipeline::phase::{PhaseName, PHASES};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AgentId {
    ScopeAnalyzer,
    GapAnalyzer,
    ImplementationReviewer,
    SrmValidator,
    EvidenceMapper,
    ConsistencyChecker,
    PoamReviewer,
    RemediationPlanner,
    RiskScorer,
    SspDrafter,
    ExecutiveBrief,
    ReadinessReport,
}

impl AgentId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ScopeAnalyzer => "scope-analyzer",
            Self::GapAnalyzer => "gap-analyzer",
            Self::ImplementationReviewer => "implementation-reviewer",
            Self::SrmValidator => "srm-validator",
            Self::EvidenceMapper => "evidence-mapper",
            Self::ConsistencyChecker => "consistency-checker",
            Self::PoamReviewer => "poam-reviewer",
            Self::RemediationPlanner => "remediation-planner",
            Self::RiskScorer => "risk-scorer",
            Self::SspDrafter => "ssp-drafter",
            Self::ExecutiveBrief => "executive-brief",
            Self::ReadinessReport => "readiness-report",
        }
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AgentId {
    type Err = AttestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AGENT_REGISTRY
            .iter()
            .map(|d| d.id)
            .find(|id| id.as_str() == s)
            .ok_or_else(|| AttestError::UnknownAgent(s.to_string()))
    }
}

/// Whether an agent runs once or once per control family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AgentMode {
    Whole,
    PerPartition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceRequirement {
    pub source: DataSourceKind,
    pub required: bool,
}

const fn required(source: DataSourceKind) -> SourceRequirement {
    SourceRequirement { source, required: true }
}

const fn optional(source: DataSourceKind) -> SourceRequirement {
    SourceRequirement { source, required: false }
}

pub struct AgentDefinition {
    pub id: AgentId,
    pub display_name: &'static str,
    pub description: &'static str,
    pub phase: PhaseName,
    pub mode: AgentMode,
    pub upstream: &'static [AgentId],
    pub downstream: &'static [AgentId],
    pub sources: &'static [SourceRequirement],
    pub max_output_tokens: u32,
}

impl AgentDefinition {
    pub fn is_fan_out(&self) -> bool {
        self.mode == AgentMode::PerPartition
    }
}

use AgentId::*;
use DataSourceKind::*;

const SCOPE_ANALYZER_SOURCES: &[SourceRequirement] = &[required(Inventory), optional(Inheritance)];
const GAP_ANALYZER_SOURCES: &[SourceRequirement] = &[required(Assessments)];
const IMPLEMENTATION_REVIEWER_SOURCES: &[SourceRequirement] = &[required(Implementations), optional(Assessments)];
const SRM_VALIDATOR_SOURCES: &[SourceRequirement] = &[required(Inheritance), required(Inventory)];
const EVIDENCE_MAPPER_SOURCES: &[SourceRequirement] = &[required(Inventory), optional(Implementations)];
const CONSISTENCY_CHECKER_SOURCES: &[SourceRequirement] = &[required(Assessments), required(Implementations)];
const POAM_REVIEWER_SOURCES: &[SourceRequirement] = &[required(Poam), optional(Assessments)];
const REMEDIATION_PLANNER_SOURCES: &[SourceRequirement] = &[required(Assessments), optional(Poam)];
const RISK_SCORER_SOURCES: &[SourceRequirement] = &[required(Assessments), optional(Poam), optional(Inheritance)];
const SSP_DRAFTER_SOURCES: &[SourceRequirement] = &[required(Implementations), optional(Inheritance)];
const EXECUTIVE_BRIEF_SOURCES: &[SourceRequirement] = &[required(Assessments), optional(Poam)];
const READINESS_REPORT_SOURCES: &[SourceRequirement] = &[optional(Assessments), optional(Implementations), optional(Poam)];

pub static AGENT_REGISTRY: LazyLock<Vec<AgentDefinition>> = LazyLock::new(|| vec![
    AgentDefinition {
        id: ScopeAnalyzer,
        display_name: "Scope analyzer",
        description: "Characterizes the assessment boundary from the asset and policy inventory",
        phase: PhaseName::Baseline,
        mode: AgentMode::Whole,
        upstream: &[],
        downstream: &[SrmValidator, EvidenceMapper, ReadinessReport],
        sources: SCOPE_ANALYZER_SOURCES,
        max_output_tokens: 2048,
    },
    AgentDefinition {
        id: GapAnalyzer,
        display_name: "Gap analyzer",
        description: "Summarizes unmet and partially met objectives per family",
        phase: PhaseName::Baseline,
        mode: AgentMode::PerPartition,
        upstream: &[],
        downstream: &[ConsistencyChecker, PoamReviewer, RemediationPlanner, RiskScorer, ReadinessReport],
        sources: GAP_ANALYZER_SOURCES,
        max_output_tokens: 1024,
    },
    AgentDefinition {
        id: ImplementationReviewer,
        display_name: "Implementation reviewer",
        description: "Reviews implementation statements for completeness per family",
        phase: PhaseName::Baseline,
        mode: AgentMode::PerPartition,
        upstream: &[],
        downstream: &[EvidenceMapper, ConsistencyChecker, SspDrafter, ReadinessReport],
        sources: IMPLEMENTATION_REVIEWER_SOURCES,
        max_output_tokens: 1024,
    },
    AgentDefinition {
        id: SrmValidator,
        display_name: "SRM validator",
        description: "Validates shared responsibility assignments against the inventory",
        phase: PhaseName::Validation,
        mode: AgentMode::Whole,
        upstream: &[ScopeAnalyzer],
        downstream: &[RiskScorer, SspDrafter, ReadinessReport],
        sources: SRM_VALIDATOR_SOURCES,
        max_output_tokens: 2048,
    },
    AgentDefinition {
        id: EvidenceMapper,
        display_name: "Evidence mapper",
        description: "Maps inventory artifacts to the objectives they evidence",
        phase: PhaseName::Validation,
        mode: AgentMode::Whole,
        upstream: &[ScopeAnalyzer, ImplementationReviewer],
        downstream: &[SspDrafter, ReadinessReport],
        sources: EVIDENCE_MAPPER_SOURCES,
        max_output_tokens: 2048,
    },
    AgentDefinition {
        id: ConsistencyChecker,
        display_name: "Consistency checker",
        description: "Flags objectives whose status contradicts the implementation notes",
        phase: PhaseName::Validation,
        mode: AgentMode::PerPartition,
        upstream: &[GapAnalyzer, ImplementationReviewer],
        downstream: &[ReadinessReport],
        sources: CONSISTENCY_CHECKER_SOURCES,
        max_output_tokens: 1024,
    },
    AgentDefinition {
        id: PoamReviewer,
        display_name: "POA&M reviewer",
        description: "Checks POA&M coverage and milestone quality for open weaknesses",
        phase: PhaseName::Remediation,
        mode: AgentMode::Whole,
        upstream: &[GapAnalyzer],
        downstream: &[RemediationPlanner, ExecutiveBrief, ReadinessReport],
        sources: POAM_REVIEWER_SOURCES,
        max_output_tokens: 2048,
    },
    AgentDefinition {
        id: RemediationPlanner,
        display_name: "Remediation planner",
        description: "Drafts prioritized remediation steps per family",
        phase: PhaseName::Remediation,
        mode: AgentMode::PerPartition,
        upstream: &[GapAnalyzer, PoamReviewer],
        downstream: &[RiskScorer, ReadinessReport],
        sources: REMEDIATION_PLANNER_SOURCES,
        max_output_tokens: 1024,
    },
    AgentDefinition {
        id: RiskScorer,
        display_name: "Risk scorer",
        description: "Ranks residual risk from open gaps and inherited controls",
        phase: PhaseName::Remediation,
        mode: AgentMode::Whole,
        upstream: &[GapAnalyzer, RemediationPlanner, SrmValidator],
        downstream: &[ExecutiveBrief, ReadinessReport],
        sources: RISK_SCORER_SOURCES,
        max_output_tokens: 2048,
    },
    AgentDefinition {
        id: SspDrafter,
        display_name: "SSP drafter",
        description: "Drafts system security plan narratives per family",
        phase: PhaseName::Documentation,
        mode: AgentMode::PerPartition,
        upstream: &[ImplementationReviewer, SrmValidator, EvidenceMapper],
        downstream: &[ReadinessReport],
        sources: SSP_DRAFTER_SOURCES,
        max_output_tokens: 1024,
    },
    AgentDefinition {
        id: ExecutiveBrief,
        display_name: "Executive brief",
        description: "Summarizes posture and top risks for leadership",
        phase: PhaseName::Documentation,
        mode: AgentMode::Whole,
        upstream: &[RiskScorer, PoamReviewer],
        downstream: &[ReadinessReport],
        sources: EXECUTIVE_BRIEF_SOURCES,
        max_output_tokens: 2048,
    },
    AgentDefinition {
        id: ReadinessReport,
        display_name: "Readiness report",
        description: "Aggregates every agent's findings into an overall readiness verdict",
        phase: PhaseName::Synthesis,
        mode: AgentMode::Whole,
        upstream: &[
            ScopeAnalyzer, GapAnalyzer, ImplementationReviewer,
            SrmValidator, EvidenceMapper, ConsistencyChecker,
            PoamReviewer, RemediationPlanner, RiskScorer,
            SspDrafter, ExecutiveBrief,
        ],
        downstream: &[],
        sources: READINESS_REPORT_SOURCES,
        max_output_tokens: 4096,
    },
]);

pub fn definition(id: AgentId) -> &'static AgentDefinition {
    AGENT_REGISTRY
        .iter()
        .find(|d| d.id == id)
        .expect("every AgentId has a registry entry")
}

/// Every agent in execution order: phases in declared order, registry order within a phase.
pub fn pipeline_order() -> Vec<&'static AgentDefinition> {
    PHASES
        .iter()
        .flat_map(|phase| AGENT_REGISTRY.iter().filter(move |d| d.phase == phase.name))
        .collect()
}
