//! Test doubles shared by controller and CLI tests.

use crate::backend::LeadsetBackend;
use crate::error::{ScoutError, ScoutResult};
use crate::model::{ExportResponse, HealthResponse, Notice, Run, StartRunResponse};
use crate::orchestrator::{DetailEvent, DetailState};
use crate::store::{Document, DocumentStore, Feed, Filter, MemoryStore, RUNS};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;

const WAIT: Duration = Duration::from_secs(2);

/// Backend double that records calls. When given a store, started runs are
/// written into it the way the real backend writes them.
#[derive(Default)]
pub struct FakeBackend {
    pub store: Option<MemoryStore>,
    pub fail_start: bool,
    pub fail_enrich: bool,
    pub fail_export: bool,
    /// Export succeeds but carries no download URL.
    pub empty_export_url: bool,
    pub starts: AtomicUsize,
    pub exports: AtomicUsize,
    pub enrich_log: Mutex<Vec<(String, Vec<String>)>>,
}

impl FakeBackend {
    pub fn writing_to(store: MemoryStore) -> Self {
        Self {
            store: Some(store),
            ..Default::default()
        }
    }

    pub fn start_calls(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn export_calls(&self) -> usize {
        self.exports.load(Ordering::SeqCst)
    }

    pub fn enrich_calls(&self) -> Vec<(String, Vec<String>)> {
        self.enrich_log.lock().unwrap().clone()
    }
}

fn unavailable(operation: &'static str) -> ScoutError {
    ScoutError::Backend {
        operation,
        status: StatusCode::SERVICE_UNAVAILABLE,
    }
}

#[async_trait]
impl LeadsetBackend for FakeBackend {
    async fn start_run(&self, leadset_id: &str) -> ScoutResult<StartRunResponse> {
        let n = self.starts.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_start {
            return Err(unavailable("start run"));
        }
        let run_id = format!("run_fake{n}");
        if let Some(store) = &self.store {
            store.insert(
                RUNS,
                &run_id,
                json!({
                    "id": run_id,
                    "leadsetId": leadset_id,
                    "status": "running",
                    "counters": {"found": 0, "enriched": 0, "selected": 0},
                    "startedAt": format!("2030-01-01T00:00:{n:02}Z")
                }),
            );
        }
        Ok(StartRunResponse {
            run_id,
            webset_id: Some(format!("ws_fake{n}")),
            status: Some("running".into()),
        })
    }

    async fn run_details(&self, _leadset_id: &str, run_id: &str) -> ScoutResult<Run> {
        let doc = self
            .store
            .as_ref()
            .and_then(|s| s.document(RUNS, run_id))
            .ok_or_else(|| ScoutError::NotFound {
                entity: "run",
                id: run_id.to_string(),
            })?;
        serde_json::from_value(doc).map_err(ScoutError::decode("run"))
    }

    async fn enrich_contacts(
        &self,
        _leadset_id: &str,
        run_id: &str,
        item_ids: &[String],
        _enrichment_types: &[&str],
    ) -> ScoutResult<Value> {
        self.enrich_log
            .lock()
            .unwrap()
            .push((run_id.to_string(), item_ids.to_vec()));
        if self.fail_enrich {
            return Err(unavailable("enrich contacts"));
        }
        Ok(json!({"status": "queued", "count": item_ids.len()}))
    }

    async fn export_csv(&self, _leadset_id: &str, run_id: &str) -> ScoutResult<ExportResponse> {
        self.exports.fetch_add(1, Ordering::SeqCst);
        if self.fail_export {
            return Err(unavailable("export CSV"));
        }
        if self.empty_export_url {
            return Ok(ExportResponse { url: None });
        }
        Ok(ExportResponse {
            url: Some(format!("https://files.example.com/exports/{run_id}.csv")),
        })
    }

    async fn health(&self) -> ScoutResult<HealthResponse> {
        Ok(HealthResponse {
            status: "ok".into(),
            sdk_initialized: Some(true),
        })
    }
}

/// Store double whose reads and searches always fail.
pub struct FailingStore;

#[async_trait]
impl DocumentStore for FailingStore {
    async fn get(&self, _collection: &str, _id: &str) -> ScoutResult<Option<Document>> {
        Err(unavailable("store get"))
    }

    async fn search(&self, _filter: &Filter, _limit: usize) -> ScoutResult<Vec<Document>> {
        Err(unavailable("store search"))
    }

    fn watch_document(&self, _collection: &str, _id: &str) -> Feed<Option<Document>> {
        Feed::closed()
    }

    fn watch_collection(&self, _filter: &Filter, _limit: usize) -> Feed<Vec<Document>> {
        Feed::closed()
    }
}

/// Consumes controller events in order, remembering notices and the last state.
pub struct Observer {
    rx: UnboundedReceiver<DetailEvent>,
    latest: Option<DetailState>,
    notices: Vec<Notice>,
    urls: usize,
}

impl Observer {
    pub fn new(rx: UnboundedReceiver<DetailEvent>) -> Self {
        Self {
            rx,
            latest: None,
            notices: Vec::new(),
            urls: 0,
        }
    }

    async fn next_event(&mut self) -> DetailEvent {
        let event = tokio::time::timeout(WAIT, self.rx.recv())
            .await
            .expect("timed out waiting for controller event")
            .expect("controller event channel closed");
        match &event {
            DetailEvent::Updated(state) => self.latest = Some((**state).clone()),
            DetailEvent::Notice(notice) => self.notices.push(notice.clone()),
            DetailEvent::OpenUrl(_) => self.urls += 1,
        }
        event
    }

    /// Wait for the next published state matching `pred`.
    pub async fn wait_state(&mut self, pred: impl Fn(&DetailState) -> bool) -> DetailState {
        loop {
            if let DetailEvent::Updated(state) = self.next_event().await {
                if pred(&state) {
                    return *state;
                }
            }
        }
    }

    /// Wait for the next alert whose message matches `pred`.
    pub async fn wait_alert(&mut self, pred: impl Fn(&str) -> bool) -> String {
        loop {
            if let DetailEvent::Notice(Notice::Alert(msg)) = self.next_event().await {
                if pred(&msg) {
                    return msg;
                }
            }
        }
    }

    /// Wait for the next info notice whose message matches `pred`.
    pub async fn wait_info(&mut self, pred: impl Fn(&str) -> bool) -> String {
        loop {
            if let DetailEvent::Notice(Notice::Info(msg)) = self.next_event().await {
                if pred(&msg) {
                    return msg;
                }
            }
        }
    }

    pub async fn wait_url(&mut self) -> String {
        loop {
            if let DetailEvent::OpenUrl(url) = self.next_event().await {
                return url;
            }
        }
    }

    pub fn latest(&self) -> Option<&DetailState> {
        self.latest.as_ref()
    }

    pub fn saw_url(&self) -> bool {
        self.urls > 0
    }

    pub fn saw_alert_containing(&self, needle: &str) -> bool {
        self.notices
            .iter()
            .any(|n| n.is_alert() && n.to_message().contains(needle))
    }
}
