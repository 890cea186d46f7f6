//! In-process document store.
//!
//! Backs `--seed` offline sessions and the controller tests. Every write bumps a
//! change counter; feeds recompute their snapshot on each bump and only emit
//! when the snapshot actually changed.

use super::{Document, DocumentStore, Feed, Filter};
use crate::error::{ScoutError, ScoutResult};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{mpsc, watch};

type Collections = BTreeMap<String, BTreeMap<String, Document>>;

struct Inner {
    collections: Mutex<Collections>,
    get_calls: Mutex<BTreeMap<String, usize>>,
    changes: watch::Sender<u64>,
}

#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        let (changes, _) = watch::channel(0);
        Self {
            inner: Arc::new(Inner {
                collections: Mutex::new(BTreeMap::new()),
                get_calls: Mutex::new(BTreeMap::new()),
                changes,
            }),
        }
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a seed file: a JSON object mapping collection paths to arrays of
    /// documents. Each document is keyed by its `id` (or `itemId`) field.
    pub fn from_seed(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read seed file {}", path.display()))?;
        let seed: Map<String, Value> =
            serde_json::from_str(&raw).context("seed file must be a JSON object")?;
        let store = Self::new();
        for (collection, docs) in seed {
            let docs = docs
                .as_array()
                .with_context(|| format!("seed collection {collection} must be an array"))?;
            for doc in docs {
                let id = doc
                    .get("id")
                    .or_else(|| doc.get("itemId"))
                    .and_then(Value::as_str)
                    .with_context(|| format!("document in {collection} has no id"))?;
                store.insert(&collection, id, doc.clone());
            }
        }
        tracing::info!(path = %path.display(), "loaded seed data");
        Ok(store)
    }

    /// Create or replace a document.
    pub fn insert(&self, collection: &str, id: &str, doc: Document) {
        lock(&self.inner.collections)
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), doc);
        self.bump();
    }

    /// Merge top-level fields into an existing document (or create it).
    pub fn update(&self, collection: &str, id: &str, patch: Document) {
        {
            let mut cols = lock(&self.inner.collections);
            let doc = cols
                .entry(collection.to_string())
                .or_default()
                .entry(id.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if let (Some(target), Value::Object(fields)) = (doc.as_object_mut(), patch) {
                target.extend(fields);
            }
        }
        self.bump();
    }

    pub fn document(&self, collection: &str, id: &str) -> Option<Document> {
        lock(&self.inner.collections)
            .get(collection)
            .and_then(|c| c.get(id))
            .cloned()
    }

    /// Number of point reads issued against `collection` through the store API.
    pub fn get_calls(&self, collection: &str) -> usize {
        lock(&self.inner.get_calls)
            .get(collection)
            .copied()
            .unwrap_or(0)
    }

    fn bump(&self) {
        self.inner.changes.send_modify(|v| *v += 1);
    }

    fn query(&self, filter: &Filter, limit: usize) -> Vec<Document> {
        lock(&self.inner.collections)
            .get(&filter.doc_type)
            .map(|c| {
                c.values()
                    .filter(|doc| filter.matches(doc))
                    .take(limit)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    fn spawn_feed<T, F>(&self, snapshot: F) -> Feed<T>
    where
        T: PartialEq + Clone + Send + 'static,
        F: Fn(&MemoryStore) -> T + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut changes = self.inner.changes.subscribe();
        let store = self.clone();
        let task = tokio::spawn(async move {
            let mut last: Option<T> = None;
            loop {
                let current = snapshot(&store);
                if last.as_ref() != Some(&current) {
                    last = Some(current.clone());
                    if tx.send(current).is_err() {
                        break;
                    }
                }
                if changes.changed().await.is_err() {
                    break;
                }
            }
        });
        Feed::new(rx, task)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, collection: &str, id: &str) -> ScoutResult<Option<Document>> {
        *lock(&self.inner.get_calls)
            .entry(collection.to_string())
            .or_default() += 1;
        Ok(self.document(collection, id))
    }

    async fn search(&self, filter: &Filter, limit: usize) -> ScoutResult<Vec<Document>> {
        if filter.doc_type.is_empty() {
            return Err(ScoutError::EmptyInput("search requires a collection"));
        }
        Ok(self.query(filter, limit))
    }

    fn watch_document(&self, collection: &str, id: &str) -> Feed<Option<Document>> {
        let (collection, id) = (collection.to_string(), id.to_string());
        self.spawn_feed(move |store| store.document(&collection, &id))
    }

    fn watch_collection(&self, filter: &Filter, limit: usize) -> Feed<Vec<Document>> {
        let filter = filter.clone();
        self.spawn_feed(move |store| store.query(&filter, limit))
    }
}
