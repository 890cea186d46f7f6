//! Runtime configuration.
//!
//! Resolves the backend URL, document-store settings and auth mode from CLI
//! flags and the environment. Without an API base URL the client runs in
//! local mode: a fixed identity record is written to the local data directory
//! and its token stands in for authentication.

use crate::cli::Cli;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

pub const APP_DIR: &str = "scout-leadsets";
pub const LOCAL_ID_TOKEN: &str = "local-dev-token";

/// Document-store connection settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSettings {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AppConfig {
    pub backend_url: String,
    pub api_base_url: Option<String>,
    pub store: StoreSettings,
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    pub page_size: usize,
    #[serde(skip_serializing)]
    pub id_token: Option<String>,
}

impl AppConfig {
    pub fn is_local_mode(&self) -> bool {
        self.api_base_url.is_none()
    }
}

/// Parse store settings from `SCOUT_STORE_CONFIG` (a JSON object), falling
/// back to the individual `SCOUT_STORE_*` variables when it is missing or
/// malformed.
pub fn store_settings_from_env(lookup: &dyn Fn(&str) -> Option<String>) -> StoreSettings {
    if let Some(raw) = lookup("SCOUT_STORE_CONFIG") {
        match serde_json::from_str::<StoreSettings>(&raw) {
            Ok(settings) => return settings,
            Err(e) => warn!(error = %e, "error parsing SCOUT_STORE_CONFIG; using individual variables"),
        }
    }
    StoreSettings {
        base_url: lookup("SCOUT_STORE_URL"),
        project_id: lookup("SCOUT_STORE_PROJECT_ID"),
        api_key: lookup("SCOUT_STORE_API_KEY"),
    }
}

/// Build the effective configuration. Explicit flags win over the environment.
pub fn resolve(args: &Cli, lookup: &dyn Fn(&str) -> Option<String>) -> AppConfig {
    let mut store = store_settings_from_env(lookup);
    if let Some(url) = args.store_url.clone() {
        store.base_url = Some(url);
    }

    let api_base_url = args
        .api_base_url
        .clone()
        .filter(|s| !s.trim().is_empty());
    let id_token = if api_base_url.is_none() {
        Some(LOCAL_ID_TOKEN.to_string())
    } else {
        lookup("SCOUT_ID_TOKEN")
    };

    AppConfig {
        backend_url: args.backend_url.trim_end_matches('/').to_string(),
        api_base_url,
        store,
        poll_interval: Duration::from(args.poll_interval),
        request_timeout: Duration::from(args.request_timeout),
        page_size: args.page_size.max(1),
        id_token,
    }
}

pub fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Directory for local state (identity record, log file).
pub fn state_dir() -> Result<PathBuf> {
    let base = dirs::data_local_dir()
        .or_else(dirs::home_dir)
        .context("could not determine a local data directory")?;
    Ok(base.join(APP_DIR))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserContext {
    pub user_id: String,
    pub org_hkey: String,
    pub user_role: String,
    pub org_role: String,
    pub application_id: String,
    pub id_token: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppContext {
    pub doc_id: String,
    pub org_hkey: String,
    pub application_url_prefix: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityContext {
    pub user_context: UserContext,
    pub app_context: AppContext,
}

impl IdentityContext {
    /// Fixed identity used in local mode; matches the backend's defaults.
    pub fn local_default() -> Self {
        Self {
            user_context: UserContext {
                user_id: "0513467084".into(),
                org_hkey: "7000000001.0742402695".into(),
                user_role: "admin".into(),
                org_role: "owner".into(),
                application_id: "1000000001".into(),
                id_token: LOCAL_ID_TOKEN.into(),
            },
            app_context: AppContext {
                doc_id: "1000000001".into(),
                org_hkey: "7000000001.0742402695".into(),
                application_url_prefix: "atlas".into(),
            },
        }
    }
}

/// Write the local identity record into `dir`, overwriting any stale copy.
pub fn write_local_identity(dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    let path = dir.join("context.json");
    let body = serde_json::to_string_pretty(&IdentityContext::local_default())?;
    std::fs::write(&path, body).with_context(|| format!("write {}", path.display()))?;
    Ok(path)
}
