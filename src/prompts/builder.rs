use serde::{Deserialize, Serialize};
use crate::agents::registry::{definition, AgentId};
use crate::data::{ComplianceData, Family, PoamStatus};
use crate::llm::{Message, RequestOptions};
use crate::pipeline::metrics::ComplianceMetrics;
use crate::pipeline::state::ResultSnapshot;
use crate::utils::truncate_excerpt;
use super::templates::system_prompt;

const NO_DATA: &str = "(no data provided)";

/// Everything a payload builder may read. Borrowed, never mutated.
pub struct PromptContext<'a> {
    pub data: &'a ComplianceData,
    pub snapshot: &'a ResultSnapshot,
    pub excerpt_chars: usize,
    pub temperature: f32,
    pub max_output_tokens_cap: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptPayload {
    pub system: String,
    pub messages: Vec<Message>,
    pub options: RequestOptions,
}

/// Build the provider request for one agent invocation.
///
/// Whole-mode agents ignore `partition` and always get a payload, degraded
/// when data is missing. Per-partition agents return `None` when the family
/// holds nothing relevant to them; the executor then skips that family.
pub fn build_request(
    id: AgentId,
    partition: Option<&Family>,
    ctx: &PromptContext<'_>,
) -> Option<PromptPayload> {
    let body = match (id, partition) {
        (AgentId::GapAnalyzer, Some(f)) => gap_analysis(f, ctx)?,
        (AgentId::ImplementationReviewer, Some(f)) => implementation_review(f, ctx)?,
        (AgentId::ConsistencyChecker, Some(f)) => consistency_check(f, ctx)?,
        (AgentId::RemediationPlanner, Some(f)) => remediation_plan(f, ctx)?,
        (AgentId::SspDrafter, Some(f)) => ssp_draft(f, ctx)?,
        // A fan-out agent needs a family
        (AgentId::GapAnalyzer, None)
        | (AgentId::ImplementationReviewer, None)
        | (AgentId::ConsistencyChecker, None)
        | (AgentId::RemediationPlanner, None)
        | (AgentId::SspDrafter, None) => return None,

        (AgentId::ScopeAnalyzer, _) => scope_analysis(ctx),
        (AgentId::SrmValidator, _) => srm_validation(ctx),
        (AgentId::EvidenceMapper, _) => evidence_mapping(ctx),
        (AgentId::PoamReviewer, _) => poam_review(ctx),
        (AgentId::RiskScorer, _) => risk_scoring(ctx),
        (AgentId::ExecutiveBrief, _) => executive_brief(ctx),
        (AgentId::ReadinessReport, _) => readiness_report(ctx),
    };

    let mut sections = body;
    sections.push_upstream(id, partition, ctx);

    let max = definition(id).max_output_tokens;
    let max_output_tokens = ctx.max_output_tokens_cap.map_or(max, |cap| cap.min(max));

    Some(PromptPayload {
        system: system_prompt(id),
        messages: vec![Message::user(sections.finish())],
        options: RequestOptions { max_output_tokens, temperature: ctx.temperature },
    })
}

#[derive(Default)]
struct Sections {
    parts: Vec<String>,
}

impl Sections {
    fn new(title: &str, body: String) -> Self {
        let mut s = Self::default();
        s.push(title, body);
        s
    }

    fn push(&mut self, title: &str, body: String) {
        let body = if body.trim().is_empty() { NO_DATA.to_string() } else { body };
        self.parts.push(format!("## {}\n{}", title, body));
    }

    /// Completed upstream results, scoped to the partition when there is one.
    fn push_upstream(&mut self, id: AgentId, partition: Option<&Family>, ctx: &PromptContext<'_>) {
        let upstream = definition(id).upstream;
        if upstream.is_empty() {
            return;
        }
        let mut lines = Vec::new();
        for up in upstream {
            let text = ctx.snapshot.completed_result(*up).and_then(|r| match partition {
                Some(f) => r.for_partition(&f.id).map(str::to_string),
                None => Some(r.as_text()),
            });
            match text {
                Some(t) => lines.push(format!(
                    "### {}\n{}",
                    definition(*up).display_name,
                    truncate_excerpt(&t, ctx.excerpt_chars)
                )),
                None => lines.push(format!("### {}\n(unavailable)", definition(*up).display_name)),
            }
        }
        self.parts.push(format!("## Prior analyses\n{}", lines.join("\n\n")));
    }

    fn finish(self) -> String {
        self.parts.join("\n\n")
    }
}

fn family_header(f: &Family) -> String {
    format!("{} ({}), {} controls", f.name, f.id, f.controls.len())
}

fn gap_analysis(f: &Family, ctx: &PromptContext<'_>) -> Option<Sections> {
    let lines: Vec<String> = f
        .objectives()
        .filter_map(|(c, o)| {
            ctx.data.assessments.status(&o.id).map(|s| {
                format!("- {} [{}] {}: {}", o.id, s.as_str(), c.title, o.text)
            })
        })
        .collect();
    if lines.is_empty() {
        return None;
    }
    Some(Sections::new(&format!("Assessment results: {}", family_header(f)), lines.join("\n")))
}

fn implementation_review(f: &Family, ctx: &PromptContext<'_>) -> Option<Sections> {
    let lines: Vec<String> = f
        .objectives()
        .filter_map(|(_, o)| {
            ctx.data.implementations.note(&o.id).map(|note| {
                let status = ctx.data.assessments.status(&o.id).map_or("unassessed", |s| s.as_str());
                format!("- {} ({}): {}\n  Note: {}", o.id, status, o.text, truncate_excerpt(note, ctx.excerpt_chars))
            })
        })
        .collect();
    if lines.is_empty() {
        return None;
    }
    Some(Sections::new(&format!("Implementation statements: {}", family_header(f)), lines.join("\n")))
}

fn consistency_check(f: &Family, ctx: &PromptContext<'_>) -> Option<Sections> {
    let lines: Vec<String> = f
        .objectives()
        .filter_map(|(_, o)| {
            let status = ctx.data.assessments.status(&o.id);
            let note = ctx.data.implementations.note(&o.id);
            if status.is_none() && note.is_none() {
                return None;
            }
            Some(format!(
                "- {} | status: {} | note: {}",
                o.id,
                status.map_or("unassessed", |s| s.as_str()),
                note.map_or_else(|| "none".to_string(), |n| truncate_excerpt(n, ctx.excerpt_chars)),
            ))
        })
        .collect();
    if lines.is_empty() {
        return None;
    }
    Some(Sections::new(&format!("Status versus notes: {}", family_header(f)), lines.join("\n")))
}

fn remediation_plan(f: &Family, ctx: &PromptContext<'_>) -> Option<Sections> {
    let deficient: Vec<String> = f
        .objectives()
        .filter_map(|(c, o)| {
            ctx.data.assessments.status(&o.id)
                .filter(|s| s.is_deficient())
                .map(|s| format!("- {} [{}] weight {}: {}", o.id, s.as_str(), c.weight, o.text))
        })
        .collect();
    let poam: Vec<String> = ctx.data.poam
        .open_entries()
        .filter(|(_, e)| f.contains_objective(&e.objective_id))
        .map(|(id, e)| format_poam(id, e))
        .collect();
    if deficient.is_empty() && poam.is_empty() {
        return None;
    }
    let mut s = Sections::new(&format!("Deficient objectives: {}", family_header(f)), deficient.join("\n"));
    s.push("Open POA&M entries", poam.join("\n"));
    Some(s)
}

fn ssp_draft(f: &Family, ctx: &PromptContext<'_>) -> Option<Sections> {
    let mut relevant = false;
    let mut blocks = Vec::new();
    for control in &f.controls {
        let mut lines = vec![format!("### {} {}", control.id, control.title)];
        if let Some(a) = ctx.data.inheritance.get(&control.id) {
            relevant = true;
            lines.push(format!(
                "Responsibility: {}{}",
                a.responsibility.as_str(),
                a.provider.as_ref().map(|p| format!(" ({})", p)).unwrap_or_default()
            ));
        }
        for o in &control.objectives {
            if let Some(note) = ctx.data.implementations.note(&o.id) {
                relevant = true;
                lines.push(format!("- {}: {}", o.id, truncate_excerpt(note, ctx.excerpt_chars)));
            }
        }
        blocks.push(lines.join("\n"));
    }
    if !relevant {
        return None;
    }
    Some(Sections::new(&format!("Controls: {}", family_header(f)), blocks.join("\n\n")))
}

fn inventory_listing(data: &ComplianceData) -> String {
    data.inventory
        .categories
        .iter()
        .filter(|(_, items)| !items.is_empty())
        .map(|(category, items)| {
            let names: Vec<String> = items
                .iter()
                .map(|i| match &i.description {
                    Some(d) => format!("  - {}: {}", i.name, d),
                    None => format!("  - {}", i.name),
                })
                .collect();
            format!("- {} ({})\n{}", category, items.len(), names.join("\n"))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn inheritance_listing(data: &ComplianceData) -> String {
    data.inheritance
        .assignments
        .iter()
        .map(|(control, a)| {
            format!(
                "- {}: {} (provider: {})",
                control,
                a.responsibility.as_str(),
                a.provider.as_deref().unwrap_or("unspecified")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_poam(id: &str, e: &crate::data::PoamEntry) -> String {
    format!(
        "- {} [{}] {}: {} | milestone: {} | due: {}",
        id,
        match e.status {
            PoamStatus::Open => "open",
            PoamStatus::Closed => "closed",
        },
        e.objective_id,
        e.weakness,
        e.milestone.as_deref().unwrap_or("none"),
        e.scheduled_completion.map_or_else(|| "unscheduled".to_string(), |d| d.to_string()),
    )
}

fn deficient_listing(data: &ComplianceData) -> String {
    data.assessments
        .statuses
        .iter()
        .filter(|(_, s)| s.is_deficient())
        .map(|(id, s)| format!("- {} [{}]", id, s.as_str()))
        .collect::<Vec<_>>()
        .join("\n")
}

fn scope_analysis(ctx: &PromptContext<'_>) -> Sections {
    let mut s = Sections::new("Inventory", inventory_listing(ctx.data));
    s.push("Shared responsibility", inheritance_listing(ctx.data));
    s
}

fn srm_validation(ctx: &PromptContext<'_>) -> Sections {
    let mut s = Sections::new("Responsibility assignments", inheritance_listing(ctx.data));
    s.push("Inventory", inventory_listing(ctx.data));
    s
}

fn evidence_mapping(ctx: &PromptContext<'_>) -> Sections {
    let notes = ctx.data.implementations
        .notes
        .iter()
        .filter(|(_, n)| !n.trim().is_empty())
        .map(|(id, n)| format!("- {}: {}", id, truncate_excerpt(n, ctx.excerpt_chars)))
        .collect::<Vec<_>>()
        .join("\n");
    let mut s = Sections::new("Inventory", inventory_listing(ctx.data));
    s.push("Implementation notes", notes);
    s
}

fn poam_review(ctx: &PromptContext<'_>) -> Sections {
    let entries = ctx.data.poam
        .entries
        .iter()
        .map(|(id, e)| format_poam(id, e))
        .collect::<Vec<_>>()
        .join("\n");
    let uncovered = ctx.data.assessments
        .statuses
        .iter()
        .filter(|(id, s)| {
            s.is_deficient() && !ctx.data.poam.entries.values().any(|e| &e.objective_id == *id)
        })
        .map(|(id, s)| format!("- {} [{}]", id, s.as_str()))
        .collect::<Vec<_>>()
        .join("\n");
    let mut s = Sections::new("POA&M entries", entries);
    s.push("Deficient objectives without a POA&M entry", uncovered);
    s
}

fn risk_scoring(ctx: &PromptContext<'_>) -> Sections {
    let mut s = Sections::new("Metrics", ComplianceMetrics::from_data(ctx.data).render());
    s.push("Deficient objectives", deficient_listing(ctx.data));
    s.push("Shared responsibility", inheritance_listing(ctx.data));
    s
}

fn executive_brief(ctx: &PromptContext<'_>) -> Sections {
    Sections::new("Metrics", ComplianceMetrics::from_data(ctx.data).render())
}

fn readiness_report(ctx: &PromptContext<'_>) -> Sections {
    Sections::new("Metrics", ComplianceMetrics::from_data(ctx.data).render())
}
