//! Backend REST client.
//!
//! Four leadset operations (start run, run details, enrich, export) plus a
//! health probe, issued against the configured backend base URL.

use crate::error::{ScoutError, ScoutResult};
use crate::model::{EnrichRequest, ExportResponse, HealthResponse, Run, StartRunResponse};
use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

#[async_trait]
pub trait LeadsetBackend: Send + Sync {
    async fn start_run(&self, leadset_id: &str) -> ScoutResult<StartRunResponse>;

    async fn run_details(&self, leadset_id: &str, run_id: &str) -> ScoutResult<Run>;

    /// Request enrichment for `item_ids`. The ack is implementation-defined.
    async fn enrich_contacts(
        &self,
        leadset_id: &str,
        run_id: &str,
        item_ids: &[String],
        enrichment_types: &[&str],
    ) -> ScoutResult<Value>;

    async fn export_csv(&self, leadset_id: &str, run_id: &str) -> ScoutResult<ExportResponse>;

    async fn health(&self) -> ScoutResult<HealthResponse>;
}

#[derive(Debug, Clone)]
pub struct HttpBackend {
    base_url: Url,
    http: Client,
}

impl HttpBackend {
    pub fn new(base_url: &str, request_timeout: Duration) -> ScoutResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ScoutError::Config(format!("invalid backend URL '{base_url}': {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ScoutError::Config(format!(
                "backend URL '{base_url}' cannot be used as a base"
            )));
        }
        let http = Client::builder()
            .timeout(request_timeout)
            .user_agent(format!("scout-leadsets/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ScoutError::network("build backend client"))?;
        Ok(Self { base_url, http })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty();
            path.extend(segments);
        }
        url
    }

    fn leadset_endpoint(&self, leadset_id: &str, tail: &[&str]) -> Url {
        let mut segments = vec!["leadsets", leadset_id];
        segments.extend_from_slice(tail);
        self.endpoint(&segments)
    }
}

/// Reject non-2xx responses, keeping the status for the caller.
fn ensure_success(resp: Response, operation: &'static str) -> ScoutResult<Response> {
    let status = resp.status();
    if status.is_success() {
        Ok(resp)
    } else {
        Err(ScoutError::Backend { operation, status })
    }
}

async fn read_json<T: DeserializeOwned>(
    resp: Response,
    operation: &'static str,
) -> ScoutResult<T> {
    let text = resp.text().await.map_err(ScoutError::network(operation))?;
    serde_json::from_str(&text).map_err(ScoutError::decode(operation))
}

#[async_trait]
impl LeadsetBackend for HttpBackend {
    async fn start_run(&self, leadset_id: &str) -> ScoutResult<StartRunResponse> {
        const OP: &str = "start run";
        let url = self.leadset_endpoint(leadset_id, &["run"]);
        debug!(%url, "starting run");
        let resp = self
            .http
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(ScoutError::network(OP))?;
        let started: StartRunResponse = read_json(ensure_success(resp, OP)?, OP).await?;
        if started.run_id.is_empty() {
            return Err(ScoutError::InvalidResponse {
                operation: OP,
                message: "response carried no runId".into(),
            });
        }
        info!(leadset_id, run_id = %started.run_id, "run started");
        Ok(started)
    }

    async fn run_details(&self, leadset_id: &str, run_id: &str) -> ScoutResult<Run> {
        const OP: &str = "fetch run details";
        let url = self.leadset_endpoint(leadset_id, &["runs", run_id]);
        debug!(%url, "fetching run details");
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(ScoutError::network(OP))?;
        read_json(ensure_success(resp, OP)?, OP).await
    }

    async fn enrich_contacts(
        &self,
        leadset_id: &str,
        run_id: &str,
        item_ids: &[String],
        enrichment_types: &[&str],
    ) -> ScoutResult<Value> {
        const OP: &str = "enrich contacts";
        let url = self.leadset_endpoint(leadset_id, &["runs", run_id, "enrich"]);
        debug!(%url, items = item_ids.len(), "requesting enrichment");
        let resp = self
            .http
            .post(url)
            .json(&EnrichRequest {
                item_ids,
                enrichment_types,
            })
            .send()
            .await
            .map_err(ScoutError::network(OP))?;
        read_json(ensure_success(resp, OP)?, OP).await
    }

    async fn export_csv(&self, leadset_id: &str, run_id: &str) -> ScoutResult<ExportResponse> {
        const OP: &str = "export CSV";
        let url = self.leadset_endpoint(leadset_id, &["runs", run_id, "export"]);
        debug!(%url, "requesting export");
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(ScoutError::network(OP))?;
        read_json(ensure_success(resp, OP)?, OP).await
    }

    async fn health(&self) -> ScoutResult<HealthResponse> {
        const OP: &str = "health check";
        let resp = self
            .http
            .get(self.endpoint(&["health"]))
            .send()
            .await
            .map_err(ScoutError::network(OP))?;
        read_json(ensure_success(resp, OP)?, OP).await
    }
}
