//! HTTP document store client.
//!
//! Point reads are `GET {base}/docs/{collection path}/{id}`; searches are
//! `POST {base}/search` with `{doc_type, filter, limit}`. Feeds poll.

use super::{spawn_polling_feed, Document, DocumentStore, Feed, Filter};
use crate::config::StoreSettings;
use crate::error::{ScoutError, ScoutResult};
use async_trait::async_trait;
use reqwest::{header, Client, StatusCode, Url};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct RestStore {
    base_url: Url,
    http: Client,
    poll_interval: Duration,
}

#[derive(Serialize)]
struct SearchBody<'a> {
    #[serde(flatten)]
    filter: &'a Filter,
    limit: usize,
}

impl RestStore {
    pub fn new(
        settings: &StoreSettings,
        id_token: Option<&str>,
        request_timeout: Duration,
        poll_interval: Duration,
    ) -> ScoutResult<Self> {
        let raw = settings.base_url.as_deref().ok_or_else(|| {
            ScoutError::Config(
                "no document store configured; set SCOUT_STORE_URL or pass --seed".into(),
            )
        })?;
        let base_url = Url::parse(raw)
            .map_err(|e| ScoutError::Config(format!("invalid store URL '{raw}': {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ScoutError::Config(format!(
                "store URL '{raw}' cannot be used as a base"
            )));
        }

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );
        if let Some(token) = id_token {
            let value = header::HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| ScoutError::Config(format!("invalid id token: {e}")))?;
            headers.insert(header::AUTHORIZATION, value);
        }
        if let Some(project) = settings.project_id.as_deref() {
            let value = header::HeaderValue::from_str(project)
                .map_err(|e| ScoutError::Config(format!("invalid project id: {e}")))?;
            headers.insert("x-project-id", value);
        }
        if let Some(key) = settings.api_key.as_deref() {
            let value = header::HeaderValue::from_str(key)
                .map_err(|e| ScoutError::Config(format!("invalid api key: {e}")))?;
            headers.insert("x-api-key", value);
        }

        let http = Client::builder()
            .default_headers(headers)
            .timeout(request_timeout)
            .user_agent(format!("scout-leadsets/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ScoutError::network("build store client"))?;

        Ok(Self {
            base_url,
            http,
            poll_interval,
        })
    }

    /// Build `{base}/{segments...}`, escaping each segment. Collection paths
    /// such as `leadsetRuns/run_1/items` are split on `/`.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty();
            for seg in segments.iter().flat_map(|s| s.split('/')) {
                if !seg.is_empty() {
                    path.push(seg);
                }
            }
        }
        url
    }

    fn doc_url(&self, collection: &str, id: &str) -> Url {
        self.url(&["docs", collection, id])
    }
}

/// Accept either a bare array or an object wrapping the array.
fn unwrap_documents(payload: Value) -> Vec<Document> {
    match payload {
        Value::Array(docs) => docs,
        Value::Object(mut map) => ["documents", "data", "items"]
            .iter()
            .find_map(|key| match map.remove(*key) {
                Some(Value::Array(docs)) => Some(docs),
                _ => None,
            })
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

#[async_trait]
impl DocumentStore for RestStore {
    async fn get(&self, collection: &str, id: &str) -> ScoutResult<Option<Document>> {
        let url = self.doc_url(collection, id);
        debug!(%url, "store get");
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(ScoutError::network("store get"))?;
        match resp.status() {
            StatusCode::NOT_FOUND => return Ok(None),
            s if !s.is_success() => {
                return Err(ScoutError::Backend {
                    operation: "store get",
                    status: s,
                })
            }
            _ => {}
        }
        let text = resp.text().await.map_err(ScoutError::network("store get"))?;
        let doc: Value = serde_json::from_str(&text).map_err(ScoutError::decode("document"))?;
        Ok((!doc.is_null()).then_some(doc))
    }

    async fn search(&self, filter: &Filter, limit: usize) -> ScoutResult<Vec<Document>> {
        let url = self.url(&["search"]);
        debug!(%url, doc_type = %filter.doc_type, limit, "store search");
        let resp = self
            .http
            .post(url)
            .json(&SearchBody { filter, limit })
            .send()
            .await
            .map_err(ScoutError::network("store search"))?;
        if !resp.status().is_success() {
            return Err(ScoutError::Backend {
                operation: "store search",
                status: resp.status(),
            });
        }
        let text = resp
            .text()
            .await
            .map_err(ScoutError::network("store search"))?;
        let payload: Value =
            serde_json::from_str(&text).map_err(ScoutError::decode("search result"))?;
        Ok(unwrap_documents(payload))
    }

    fn watch_document(&self, collection: &str, id: &str) -> Feed<Option<Document>> {
        let store = self.clone();
        let (collection, id) = (collection.to_string(), id.to_string());
        let label = format!("{collection}/{id}");
        spawn_polling_feed(label, self.poll_interval, move || {
            let store = store.clone();
            let (collection, id) = (collection.clone(), id.clone());
            async move { store.get(&collection, &id).await }
        })
    }

    fn watch_collection(&self, filter: &Filter, limit: usize) -> Feed<Vec<Document>> {
        let store = self.clone();
        let filter = filter.clone();
        let label = filter.doc_type.clone();
        spawn_polling_feed(label, self.poll_interval, move || {
            let store = store.clone();
            let filter = filter.clone();
            async move { store.search(&filter, limit).await }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store(base: &str) -> RestStore {
        let settings = StoreSettings {
            base_url: Some(base.into()),
            ..Default::default()
        };
        RestStore::new(
            &settings,
            Some("local-dev-token"),
            Duration::from_secs(5),
            Duration::from_secs(2),
        )
        .unwrap()
    }

    #[test]
    fn doc_url_splits_nested_collections() {
        let s = store("http://localhost:9099/v1/");
        assert_eq!(
            s.doc_url("leadsetRuns/run_1/items", "a b").as_str(),
            "http://localhost:9099/v1/docs/leadsetRuns/run_1/items/a%20b"
        );
    }

    #[test]
    fn search_body_flattens_filter() {
        let f = Filter::new("leadsetRuns").eq("leadsetId", "ls-1");
        let body = serde_json::to_value(SearchBody {
            filter: &f,
            limit: 100,
        })
        .unwrap();
        assert_eq!(
            body,
            json!({"doc_type": "leadsetRuns", "filter": {"leadsetId": "ls-1"}, "limit": 100})
        );
    }

    #[test]
    fn missing_base_url_is_a_config_error() {
        let err = RestStore::new(
            &StoreSettings::default(),
            None,
            Duration::from_secs(1),
            Duration::from_secs(1),
        )
        .unwrap_err();
        assert!(matches!(err, ScoutError::Config(_)));
    }

    #[test]
    fn search_payload_shapes() {
        assert_eq!(unwrap_documents(json!([{"id": "a"}])).len(), 1);
        assert_eq!(unwrap_documents(json!({"documents": [{"id": "a"}, {"id": "b"}]})).len(), 2);
        assert!(unwrap_documents(json!({"unexpected": true})).is_empty());
        assert!(unwrap_documents(Value::Null).is_empty());
    }
}
