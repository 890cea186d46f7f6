//! Document store shim.
//!
//! Point reads, filtered searches and snapshot feeds over a remote document
//! store. Feeds always deliver full replacement snapshots, never deltas, and
//! stop as soon as their [`Feed`] handle is dropped.

mod memory;
mod rest;

pub use memory::MemoryStore;
pub use rest::RestStore;

use crate::error::{ScoutError, ScoutResult};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::warn;

pub type Document = Value;

pub const LEADSETS: &str = "leadsets";
pub const RUNS: &str = "leadsetRuns";

/// Collection path holding the items of one run.
pub fn items_path(run_id: &str) -> String {
    format!("{RUNS}/{run_id}/items")
}

/// Equality filter over one collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Filter {
    pub doc_type: String,
    #[serde(rename = "filter")]
    pub fields: Map<String, Value>,
}

impl Filter {
    pub fn new(doc_type: impl Into<String>) -> Self {
        Self {
            doc_type: doc_type.into(),
            fields: Map::new(),
        }
    }

    pub fn eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(field.to_string(), value.into());
        self
    }

    pub fn matches(&self, doc: &Document) -> bool {
        self.fields
            .iter()
            .all(|(k, v)| doc.get(k).is_some_and(|found| found == v))
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch one document; `Ok(None)` when it does not exist.
    async fn get(&self, collection: &str, id: &str) -> ScoutResult<Option<Document>>;

    /// Documents matching `filter`, in store-default order. No ordering
    /// guarantee beyond that; callers sort client-side.
    async fn search(&self, filter: &Filter, limit: usize) -> ScoutResult<Vec<Document>>;

    /// Snapshot feed of a single document. Must be called inside a Tokio runtime.
    fn watch_document(&self, collection: &str, id: &str) -> Feed<Option<Document>>;

    /// Snapshot feed of up to `limit` documents matching `filter`. Must be
    /// called inside a Tokio runtime.
    fn watch_collection(&self, filter: &Filter, limit: usize) -> Feed<Vec<Document>>;
}

/// Receiving end of a snapshot feed. Dropping it cancels the producer task.
pub struct Feed<T> {
    rx: mpsc::UnboundedReceiver<T>,
    task: Option<JoinHandle<()>>,
}

impl<T> Feed<T> {
    pub fn new(rx: mpsc::UnboundedReceiver<T>, task: JoinHandle<()>) -> Self {
        Self {
            rx,
            task: Some(task),
        }
    }

    /// A feed that has already ended.
    pub fn closed() -> Self {
        let (_, rx) = mpsc::unbounded_channel();
        Self { rx, task: None }
    }

    /// Next snapshot, or `None` once the producer is gone.
    pub async fn next(&mut self) -> Option<T> {
        self.rx.recv().await
    }
}

impl<T> Drop for Feed<T> {
    fn drop(&mut self) {
        // Dropping a JoinHandle does not stop the task; abort it explicitly.
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Spawn a feed that re-reads its source every `interval` and emits a snapshot
/// whenever the result differs from the last one delivered.
pub(crate) fn spawn_polling_feed<T, F, Fut>(label: String, interval: Duration, mut fetch: F) -> Feed<T>
where
    T: PartialEq + Clone + Send + 'static,
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ScoutResult<T>> + Send,
{
    let (tx, rx) = mpsc::unbounded_channel();
    let task = tokio::spawn(async move {
        let mut last: Option<T> = None;
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match fetch().await {
                Ok(snapshot) => {
                    if last.as_ref() == Some(&snapshot) {
                        continue;
                    }
                    last = Some(snapshot.clone());
                    if tx.send(snapshot).is_err() {
                        break;
                    }
                }
                Err(e) => warn!(feed = %label, error = %e, "feed poll failed"),
            }
        }
    });
    Feed::new(rx, task)
}

/// Decode a document into a typed entity.
pub fn decode<T: DeserializeOwned>(what: &'static str, doc: Document) -> ScoutResult<T> {
    serde_json::from_value(doc).map_err(ScoutError::decode(what))
}

/// Decode a batch of documents, skipping (and logging) malformed ones.
pub fn decode_all<T: DeserializeOwned>(what: &'static str, docs: Vec<Document>) -> Vec<T> {
    docs.into_iter()
        .filter_map(|doc| match decode(what, doc) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!(error = %e, "skipping malformed document");
                None
            }
        })
        .collect()
}
