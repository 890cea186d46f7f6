//! Application-level orchestration.
//!
//! Page controllers own state, call the document store and backend client, and
//! publish snapshots. UI/CLI layers only send commands and render what they
//! receive, which keeps responsibilities separated.

mod app;
mod controller;
mod detail;
mod list;

use crate::backend::LeadsetBackend;
use crate::store::DocumentStore;
use std::sync::Arc;

pub use app::{run_app, AppCommand, AppEvent};
pub use controller::{DetailCommand, DetailEvent};
pub(crate) use controller::{load_run_items, run_detail_controller};
pub use detail::{latest_run, DetailBody, DetailState};
pub use list::{load_leadsets, ListState, PAGE_SIZE};

/// Shared handles every controller works against.
#[derive(Clone)]
pub struct Services {
    pub store: Arc<dyn DocumentStore>,
    pub backend: Arc<dyn LeadsetBackend>,
    pub page_size: usize,
}
