//! Detail-page state.
//!
//! Pure state transitions for one leadset: the displayed run, its items, the
//! local selection set and the modal flags. The async controller drives these;
//! nothing here performs I/O.

use crate::error::{ScoutError, ScoutResult};
use crate::model::{Item, Leadset, Run, RunStatus, COST_PER_CONTACT};
use serde::Serialize;

/// What the body of the detail page shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailBody {
    Loading,
    Error(String),
    StartingRun,
    Searching,
    Table,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DetailState {
    pub leadset_id: String,
    pub leadset: Option<Leadset>,
    pub run: Option<Run>,
    pub items: Vec<Item>,
    /// Insertion-ordered set of selected item ids.
    selection: Vec<String>,
    pub loading: bool,
    pub run_starting: bool,
    pub enriching: bool,
    pub show_unlock: bool,
    pub show_restart: bool,
    pub error: Option<String>,
}

/// Pick the most recently started run. Runs without a parsable start time
/// sort as the oldest; ties keep the first one seen.
pub fn latest_run(runs: Vec<Run>) -> Option<Run> {
    runs.into_iter().reduce(|best, candidate| {
        if candidate.started_at_utc() > best.started_at_utc() {
            candidate
        } else {
            best
        }
    })
}

impl DetailState {
    pub fn new(leadset_id: impl Into<String>) -> Self {
        Self {
            leadset_id: leadset_id.into(),
            loading: true,
            ..Default::default()
        }
    }

    pub fn selection(&self) -> &[String] {
        &self.selection
    }

    pub fn is_selected(&self, item_id: &str) -> bool {
        self.selection.iter().any(|id| id == item_id)
    }

    fn item(&self, item_id: &str) -> Option<&Item> {
        self.items.iter().find(|i| i.item_id == item_id)
    }

    /// Flip membership of one item. Locked or unknown items are left alone.
    /// Returns whether the selection changed.
    pub fn toggle(&mut self, item_id: &str) -> bool {
        if let Some(pos) = self.selection.iter().position(|id| id == item_id) {
            self.selection.remove(pos);
            return true;
        }
        match self.item(item_id) {
            Some(item) if !item.is_locked() => {
                self.selection.push(item_id.to_string());
                true
            }
            _ => false,
        }
    }

    /// Select every loaded, selectable item, or clear the selection.
    pub fn select_all(&mut self, select: bool) {
        self.selection = if select {
            self.items
                .iter()
                .filter(|i| !i.is_locked())
                .map(|i| i.item_id.clone())
                .collect()
        } else {
            Vec::new()
        };
    }

    /// Header checkbox state: every selectable item is selected.
    pub fn all_selected(&self) -> bool {
        let mut selectable = self.items.iter().filter(|i| !i.is_locked()).peekable();
        selectable.peek().is_some() && selectable.all(|i| self.is_selected(&i.item_id))
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Replace the loaded items, pruning selected ids that vanished or locked.
    pub fn replace_items(&mut self, items: Vec<Item>) {
        self.items = items;
        let items = &self.items;
        self.selection.retain(|id| {
            items
                .iter()
                .any(|i| &i.item_id == id && !i.is_locked())
        });
    }

    /// Adopt a run snapshot. Returns the item ids to re-fetch when the run
    /// lists any.
    pub fn apply_run_snapshot(&mut self, run: Run) -> Option<Vec<String>> {
        let refetch = run.listed_item_ids().map(<[String]>::to_vec);
        self.run = Some(run);
        refetch
    }

    /// Point the page at a freshly started run, dropping the old run's data.
    pub fn adopt_new_run(&mut self, run: Run) {
        self.run = Some(run);
        self.items.clear();
        self.selection.clear();
    }

    pub fn run_id(&self) -> Option<&str> {
        self.run
            .as_ref()
            .map(|r| r.id.as_str())
            .filter(|id| !id.is_empty())
    }

    /// Open the unlock modal; requires a non-empty selection.
    pub fn begin_unlock(&mut self) -> ScoutResult<()> {
        if self.selection.is_empty() {
            return Err(ScoutError::EmptyInput("Please select at least one buyer"));
        }
        self.show_unlock = true;
        Ok(())
    }

    /// Run id to export, provided there is a run and at least one item.
    pub fn export_target(&self) -> ScoutResult<String> {
        let run_id = self
            .run_id()
            .ok_or(ScoutError::EmptyInput("No run data available"))?;
        if self.items.is_empty() {
            return Err(ScoutError::EmptyInput("No items to export"));
        }
        Ok(run_id.to_string())
    }

    pub fn estimated_cost(&self) -> f64 {
        self.selection.len() as f64 * COST_PER_CONTACT
    }

    pub fn status(&self) -> RunStatus {
        self.run
            .as_ref()
            .map(|r| r.status.clone())
            .unwrap_or_default()
    }

    pub fn body(&self) -> DetailBody {
        if self.loading {
            return DetailBody::Loading;
        }
        if let Some(err) = &self.error {
            return DetailBody::Error(err.clone());
        }
        if self.leadset.is_none() {
            return DetailBody::Error("Leadset not found".into());
        }
        if self.run_starting {
            return DetailBody::StartingRun;
        }
        if self.items.is_empty() && self.status() == RunStatus::Running {
            return DetailBody::Searching;
        }
        DetailBody::Table
    }

    /// Toolbar summary, e.g. "2 buyers selected" or "1 buyer found".
    pub fn summary_line(&self) -> String {
        fn plural(n: usize) -> &'static str {
            if n == 1 {
                ""
            } else {
                "s"
            }
        }
        let selected = self.selection.len();
        if selected > 0 {
            format!("{selected} buyer{} selected", plural(selected))
        } else {
            let found = self.items.len();
            format!("{found} buyer{} found", plural(found))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Enrichment, EnrichmentStatus};

    fn item(id: &str, status: EnrichmentStatus) -> Item {
        Item {
            item_id: id.into(),
            enrichment: Enrichment {
                status,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn loaded(items: Vec<Item>) -> DetailState {
        let mut s = DetailState::new("ls-1");
        s.loading = false;
        s.leadset = Some(Leadset::default());
        s.replace_items(items);
        s
    }

    fn run_started(id: &str, started_at: Option<&str>) -> Run {
        Run {
            id: id.into(),
            started_at: started_at.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn toggle_twice_restores_selection() {
        let mut s = loaded(vec![
            item("a", EnrichmentStatus::None),
            item("b", EnrichmentStatus::None),
        ]);
        s.toggle("b");
        let before = s.selection().to_vec();
        assert!(s.toggle("a"));
        assert!(s.toggle("a"));
        assert_eq!(s.selection(), before.as_slice());
    }

    #[test]
    fn select_all_then_none_is_empty() {
        let mut s = loaded((0..7).map(|i| item(&i.to_string(), EnrichmentStatus::None)).collect());
        s.select_all(true);
        assert_eq!(s.selection().len(), 7);
        assert!(s.all_selected());
        s.select_all(false);
        assert!(s.selection().is_empty());
        assert!(!s.all_selected());
    }

    #[test]
    fn done_items_never_enter_the_selection() {
        let mut s = loaded(vec![
            item("done", EnrichmentStatus::Done),
            item("queued", EnrichmentStatus::Queued),
            item("open", EnrichmentStatus::None),
            item("failed", EnrichmentStatus::Failed),
        ]);
        assert!(!s.toggle("done"));
        assert!(!s.toggle("queued"));
        s.select_all(true);
        assert_eq!(s.selection(), ["open".to_string(), "failed".to_string()]);
        assert!(s.all_selected());
    }

    #[test]
    fn unknown_ids_cannot_be_selected() {
        let mut s = loaded(vec![item("a", EnrichmentStatus::None)]);
        assert!(!s.toggle("ghost"));
        assert!(s.selection().is_empty());
    }

    #[test]
    fn replacing_items_prunes_selection() {
        let mut s = loaded(vec![
            item("a", EnrichmentStatus::None),
            item("b", EnrichmentStatus::None),
            item("c", EnrichmentStatus::None),
        ]);
        s.select_all(true);
        s.replace_items(vec![
            item("a", EnrichmentStatus::None),
            item("b", EnrichmentStatus::Queued),
        ]);
        assert_eq!(s.selection(), ["a".to_string()]);
    }

    #[test]
    fn latest_run_uses_start_time() {
        let runs = vec![
            run_started("old", Some("2024-01-01T00:00:00Z")),
            run_started("undated", None),
            run_started("new", Some("2024-06-01T09:30:00.5")),
            run_started("mid", Some("2024-03-01T00:00:00+00:00")),
        ];
        assert_eq!(latest_run(runs).unwrap().id, "new");
        assert!(latest_run(Vec::new()).is_none());
    }

    #[test]
    fn undated_runs_sort_oldest() {
        let runs = vec![
            run_started("undated", None),
            run_started("dated", Some("2020-01-01T00:00:00Z")),
        ];
        assert_eq!(latest_run(runs).unwrap().id, "dated");
    }

    #[test]
    fn run_snapshot_with_item_ids_requests_refetch() {
        let mut s = loaded(Vec::new());
        let mut run = run_started("r", None);
        assert!(s.apply_run_snapshot(run.clone()).is_none());
        run.item_ids = Some(vec!["a".into(), "b".into()]);
        assert_eq!(
            s.apply_run_snapshot(run),
            Some(vec!["a".to_string(), "b".to_string()])
        );
    }

    #[test]
    fn unlock_requires_selection() {
        let mut s = loaded(vec![item("a", EnrichmentStatus::None)]);
        assert!(matches!(s.begin_unlock(), Err(ScoutError::EmptyInput(_))));
        assert!(!s.show_unlock);
        s.toggle("a");
        s.begin_unlock().unwrap();
        assert!(s.show_unlock);
        assert!((s.estimated_cost() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn export_requires_run_and_items() {
        let mut s = loaded(Vec::new());
        assert!(s.export_target().is_err());
        s.run = Some(run_started("r", None));
        match s.export_target() {
            Err(ScoutError::EmptyInput(msg)) => assert_eq!(msg, "No items to export"),
            other => panic!("unexpected {other:?}"),
        }
        s.replace_items(vec![item("a", EnrichmentStatus::None)]);
        assert_eq!(s.export_target().unwrap(), "r");
    }

    #[test]
    fn body_reflects_lifecycle() {
        let mut s = DetailState::new("ls-1");
        assert_eq!(s.body(), DetailBody::Loading);
        s.loading = false;
        assert_eq!(s.body(), DetailBody::Error("Leadset not found".into()));
        s.leadset = Some(Leadset::default());
        s.run_starting = true;
        assert_eq!(s.body(), DetailBody::StartingRun);
        s.run_starting = false;
        s.run = Some(Run {
            status: RunStatus::Running,
            ..Default::default()
        });
        assert_eq!(s.body(), DetailBody::Searching);
        s.replace_items(vec![item("a", EnrichmentStatus::None)]);
        assert_eq!(s.body(), DetailBody::Table);
    }

    #[test]
    fn summary_pluralizes() {
        let mut s = loaded(vec![item("a", EnrichmentStatus::None)]);
        assert_eq!(s.summary_line(), "1 buyer found");
        s.toggle("a");
        assert_eq!(s.summary_line(), "1 buyer selected");
        s.replace_items(Vec::new());
        assert_eq!(s.summary_line(), "0 buyers found");
    }
}
