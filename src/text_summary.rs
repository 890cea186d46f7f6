//! Text summary builder for CLI output.
//!
//! Formats the list page and a detail snapshot as human-readable lines.

use crate::model::Leadset;
use crate::orchestrator::{DetailBody, DetailState};

/// Pre-formatted lines for text output.
pub(crate) struct TextSummary {
    pub lines: Vec<String>,
}

fn segment_chips(leadset: &Leadset) -> String {
    let seg = &leadset.segment;
    [
        seg.segment_archetype.as_str(),
        seg.geo_region.as_str(),
        seg.firmographic_company_size.as_str(),
    ]
    .iter()
    .filter(|s| !s.is_empty())
    .map(|s| format!("[{s}]"))
    .collect::<Vec<_>>()
    .join(" ")
}

pub(crate) fn build_list_summary(leadsets: &[Leadset]) -> TextSummary {
    if leadsets.is_empty() {
        return TextSummary {
            lines: vec!["No leadsets available".into()],
        };
    }

    let mut lines = Vec::new();
    for ls in leadsets {
        lines.push(format!("{}  ({})", ls.name, ls.id));
        if !ls.description.is_empty() {
            lines.push(format!("  {}", ls.description));
        }
        let chips = segment_chips(ls);
        if !chips.is_empty() {
            lines.push(format!("  {chips}"));
        }
        let signals = ls.display_signals();
        if !signals.is_empty() {
            lines.push(format!("  Signals: {}", signals.join(", ")));
        }
        lines.push(format!("  ~{} buyers", ls.est_count));
    }
    TextSummary { lines }
}

pub(crate) fn build_detail_summary(state: &DetailState) -> TextSummary {
    let mut lines = Vec::new();

    match state.body() {
        DetailBody::Error(msg) => {
            lines.push(format!("Error: {msg}"));
            return TextSummary { lines };
        }
        DetailBody::Loading => {
            lines.push("Loading...".into());
            return TextSummary { lines };
        }
        _ => {}
    }

    if let Some(ls) = state.leadset.as_ref() {
        lines.push(ls.name.clone());
        if !ls.description.is_empty() {
            lines.push(ls.description.clone());
        }
    }

    if let Some(run) = state.run.as_ref() {
        lines.push(format!(
            "Run {}: found {} / enriched {} / selected {} / status {}",
            run.id,
            run.counters.found,
            run.counters.enriched,
            state.selection().len(),
            run.status.as_str()
        ));
    }

    match state.body() {
        DetailBody::StartingRun => lines.push("Starting search for buyers...".into()),
        DetailBody::Searching => lines.push("Searching for buyers...".into()),
        _ if state.items.is_empty() => lines.push("No items found".into()),
        _ => {
            lines.push(format!(
                "{:<24} {:<20} {:<10} {:<12} {:<24} {:<16} {}",
                "Company", "Domain", "Platform", "Recency", "Email", "Phone", "Status"
            ));
            for item in &state.items {
                lines.push(format!(
                    "{:<24} {:<20} {:<10} {:<12} {:<24} {:<16} {}",
                    item.company(),
                    item.domain(),
                    item.platform(),
                    item.recency_label(),
                    item.email(),
                    item.phone(),
                    item.enrichment.status.as_str()
                ));
            }
        }
    }

    lines.push(state.summary_line());
    TextSummary { lines }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Counters, Entity, Intent, Item, Run, RunStatus, Segment};

    fn leadset() -> Leadset {
        Leadset {
            id: "ls-1".into(),
            name: "Fintech CFOs".into(),
            description: "Finance leaders".into(),
            segment: Segment {
                segment_archetype: "cfo".into(),
                geo_region: "US".into(),
                firmographic_company_size: String::new(),
            },
            intent: Intent {
                signals: vec!["hiring_finance".into(), "new_funding".into()],
            },
            est_count: 120,
            ..Default::default()
        }
    }

    #[test]
    fn list_summary_shows_cards() {
        let s = build_list_summary(&[leadset()]);
        assert_eq!(s.lines[0], "Fintech CFOs  (ls-1)");
        assert!(s.lines.contains(&"  [cfo] [US]".to_string()));
        assert!(s.lines.contains(&"  Signals: hiring finance, new funding".to_string()));
        assert_eq!(s.lines.last().unwrap(), "  ~120 buyers");
    }

    #[test]
    fn empty_list_message() {
        assert_eq!(build_list_summary(&[]).lines, vec!["No leadsets available"]);
    }

    #[test]
    fn detail_summary_lists_items() {
        let mut state = DetailState::new("ls-1");
        state.loading = false;
        state.leadset = Some(leadset());
        state.run = Some(Run {
            id: "run_1".into(),
            status: RunStatus::Idle,
            counters: Counters {
                found: 1,
                ..Default::default()
            },
            ..Default::default()
        });
        state.replace_items(vec![Item {
            item_id: "a".into(),
            entity: Entity {
                company: Some("Acme".into()),
                domain: Some("acme.io".into()),
            },
            ..Default::default()
        }]);
        let s = build_detail_summary(&state);
        assert!(s.lines.iter().any(|l| l.starts_with("Run run_1: found 1")));
        assert!(s.lines.iter().any(|l| l.starts_with("Acme") && l.ends_with("none")));
        assert_eq!(s.lines.last().unwrap(), "1 buyer found");
    }

    #[test]
    fn detail_error_is_a_single_line() {
        let mut state = DetailState::new("ls-1");
        state.loading = false;
        state.error = Some("Leadset not found".into());
        assert_eq!(build_detail_summary(&state).lines, vec!["Error: Leadset not found"]);
    }
}
