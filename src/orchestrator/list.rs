//! List-page controller: one search for leadsets on mount.

use crate::model::Leadset;
use crate::store::{self, decode_all, DocumentStore, Filter};
use serde::Serialize;
use tracing::{info, warn};

/// Leadsets fetched per list load. No pagination.
pub const PAGE_SIZE: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "data", rename_all = "snake_case")]
pub enum ListState {
    Loading,
    Failed(String),
    Loaded(Vec<Leadset>),
}

impl ListState {
    pub fn leadsets(&self) -> &[Leadset] {
        match self {
            ListState::Loaded(l) => l,
            _ => &[],
        }
    }

    /// Placeholder text for states without cards.
    pub fn message(&self) -> Option<&str> {
        match self {
            ListState::Loading => Some("Loading leadsets..."),
            ListState::Failed(msg) => Some(msg),
            ListState::Loaded(l) if l.is_empty() => Some("No leadsets available"),
            ListState::Loaded(_) => None,
        }
    }
}

/// Fetch the leadset list in store-default order.
pub async fn load_leadsets(store: &dyn DocumentStore, page_size: usize) -> ListState {
    match store.search(&Filter::new(store::LEADSETS), page_size).await {
        Ok(docs) => {
            let leadsets: Vec<Leadset> = decode_all("leadset", docs);
            info!(count = leadsets.len(), "loaded leadsets");
            ListState::Loaded(leadsets)
        }
        Err(e) => {
            warn!(error = %e, "error loading leadsets");
            ListState::Failed("Failed to load leadsets. Please try again.".into())
        }
    }
}
