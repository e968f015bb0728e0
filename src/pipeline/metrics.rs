use serde::Serialize;
use crate::data::{ComplianceData, ObjectiveStatus};
use super::state::{ResultSnapshot, TokenUsage};

/// Headline numbers derived from the current assessment data.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ComplianceMetrics {
    pub objectives_total: usize,
    pub met: usize,
    pub not_met: usize,
    pub partial: usize,
    pub not_applicable: usize,
    pub not_assessed: usize,
    /// Met objectives as a share of applicable ones, 0..=100.
    pub percent_met: f64,
    pub max_score: u32,
    /// `max_score` minus the weight of every control with a deficient objective.
    pub weighted_score: i64,
    pub open_poam: usize,
    pub inherited_controls: usize,
}

impl ComplianceMetrics {
    pub fn from_data(data: &ComplianceData) -> Self {
        let mut m = ComplianceMetrics::default();

        if data.catalog.is_empty() {
            // No reference catalog: count what the assessment map holds
            for status in data.assessments.statuses.values() {
                m.tally(Some(*status));
            }
        } else {
            for control in data.catalog.controls() {
                m.max_score += control.weight;
                let mut deficient = false;
                for objective in &control.objectives {
                    let status = data.assessments.status(&objective.id);
                    deficient |= status.map(|s| s.is_deficient()).unwrap_or(false);
                    m.tally(status);
                }
                if deficient {
                    m.weighted_score -= i64::from(control.weight);
                }
            }
            m.weighted_score += i64::from(m.max_score);
        }

        let applicable = m.objectives_total - m.not_applicable;
        m.percent_met = if applicable == 0 {
            0.0
        } else {
            (m.met as f64 / applicable as f64) * 100.0
        };
        m.open_poam = data.poam.open_entries().count();
        m.inherited_controls = data
            .inheritance
            .assignments
            .values()
            .filter(|a| a.responsibility == crate::data::Responsibility::Inherited)
            .count();
        m
    }

    fn tally(&mut self, status: Option<ObjectiveStatus>) {
        self.objectives_total += 1;
        match status {
            Some(ObjectiveStatus::Met) => self.met += 1,
            Some(ObjectiveStatus::NotMet) => self.not_met += 1,
            Some(ObjectiveStatus::Partial) => self.partial += 1,
            Some(ObjectiveStatus::NotApplicable) => self.not_applicable += 1,
            Some(ObjectiveStatus::NotAssessed) | None => self.not_assessed += 1,
        }
    }

    /// Plain-text block quoted into prompts and printed by the CLI.
    pub fn render(&self) -> String {
        format!(
            "Objectives: {} total | {} met | {} not met | {} partial | {} N/A | {} not assessed\n\
             Percent met (applicable): {:.1}%\n\
             Weighted score: {} of {}\n\
             Open POA&M entries: {}\n\
             Fully inherited controls: {}",
            self.objectives_total, self.met, self.not_met, self.partial,
            self.not_applicable, self.not_assessed,
            self.percent_met,
            self.weighted_score, self.max_score,
            self.open_poam,
            self.inherited_controls,
        )
    }
}

/// Token usage summed over every agent state in the snapshot.
pub fn total_usage(snapshot: &ResultSnapshot) -> TokenUsage {
    snapshot
        .agents
        .values()
        .fold(TokenUsage::default(), |acc, s| acc + s.usage)
}
