use crate::backend::{HttpBackend, LeadsetBackend};
use crate::config::{self, AppConfig};
use crate::model::Notice;
use crate::orchestrator::{
    load_leadsets, run_detail_controller, DetailCommand, DetailEvent, DetailState, ListState,
    Services,
};
use crate::store::{DocumentStore, MemoryStore, RestStore};
use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Output line routing for stdout/stderr writer.
enum OutputLine {
    Stdout(String),
    Stderr(String),
}

/// Spawn a blocking writer for stdout/stderr to avoid blocking async tasks.
fn spawn_output_writer() -> (
    mpsc::UnboundedSender<OutputLine>,
    tokio::task::JoinHandle<()>,
) {
    let (tx, mut rx) = mpsc::unbounded_channel::<OutputLine>();
    let handle = tokio::task::spawn_blocking(move || {
        let stdout = std::io::stdout();
        let stderr = std::io::stderr();
        let mut out = std::io::LineWriter::new(stdout.lock());
        let mut err = std::io::LineWriter::new(stderr.lock());

        while let Some(line) = rx.blocking_recv() {
            match line {
                OutputLine::Stdout(msg) => {
                    let _ = writeln!(out, "{}", msg);
                }
                OutputLine::Stderr(msg) => {
                    let _ = writeln!(err, "{}", msg);
                }
            }
        }

        let _ = out.flush();
        let _ = err.flush();
    });
    (tx, handle)
}

#[derive(Debug, Parser, Clone)]
#[command(
    name = "scout",
    version,
    about = "Browse leadsets, run buyer searches and unlock contacts"
)]
pub struct Cli {
    /// Base URL of the leadset backend
    #[arg(long, env = "SCOUT_BACKEND_URL", default_value = "http://localhost:8000")]
    pub backend_url: String,

    /// API base URL; when unset the client runs in local mode with a fixed identity
    #[arg(long, env = "SCOUT_API_BASE_URL")]
    pub api_base_url: Option<String>,

    /// Document store base URL (overrides SCOUT_STORE_CONFIG / SCOUT_STORE_URL)
    #[arg(long)]
    pub store_url: Option<String>,

    /// Serve documents from a local JSON seed file instead of a remote store
    #[arg(long)]
    pub seed: Option<PathBuf>,

    /// Open this leadset directly
    #[arg(long)]
    pub leadset: Option<String>,

    /// Print JSON and exit (no TUI)
    #[arg(long)]
    pub json: bool,

    /// Print a text summary and exit (no TUI)
    #[arg(long)]
    pub text: bool,

    /// Request a CSV export for --leadset and print the download URL
    #[arg(long)]
    pub export: bool,

    /// Check backend health and exit
    #[arg(long)]
    pub check: bool,

    /// How often remote feeds poll the document store
    #[arg(long, default_value = "2s")]
    pub poll_interval: humantime::Duration,

    /// HTTP request timeout
    #[arg(long, default_value = "30s")]
    pub request_timeout: humantime::Duration,

    /// Maximum documents fetched per search
    #[arg(long, default_value_t = 100)]
    pub page_size: usize,
}

impl Cli {
    /// Whether the process prints and exits instead of starting the TUI.
    pub fn is_non_tui(&self) -> bool {
        self.json || self.text || self.export || self.check
    }
}

pub async fn run(args: Cli) -> Result<()> {
    if args.export && args.leadset.is_none() {
        return Err(anyhow!("--export requires --leadset"));
    }

    let cfg = config::resolve(&args, &config::env_lookup);
    if cfg.is_local_mode() {
        match config::state_dir().and_then(|dir| config::write_local_identity(&dir)) {
            Ok(path) => info!(path = %path.display(), "wrote local identity"),
            Err(e) => warn!(error = %e, "could not write local identity"),
        }
    }

    let services = build_services(&args, &cfg)?;

    if args.check {
        return run_check(services.backend.as_ref(), args.json).await;
    }
    if args.export {
        return run_export(services, args.leadset.unwrap_or_default(), args.json).await;
    }

    if !args.json && !args.text {
        #[cfg(feature = "tui")]
        {
            return crate::tui::run(services, args.leadset).await;
        }
        #[cfg(not(feature = "tui"))]
        {
            // Fallback when built without TUI support.
            return run_report(services, args.leadset, false).await;
        }
    }

    run_report(services, args.leadset, args.json).await
}

fn build_services(args: &Cli, cfg: &AppConfig) -> Result<Services> {
    let store: Arc<dyn DocumentStore> = match args.seed.as_deref() {
        Some(path) => Arc::new(MemoryStore::from_seed(path)?),
        None => Arc::new(
            RestStore::new(
                &cfg.store,
                cfg.id_token.as_deref(),
                cfg.request_timeout,
                cfg.poll_interval,
            )
            .context("configure document store")?,
        ),
    };
    let backend = HttpBackend::new(&cfg.backend_url, cfg.request_timeout)
        .context("configure backend client")?;
    Ok(Services {
        store,
        backend: Arc::new(backend),
        page_size: cfg.page_size,
    })
}

/// Handle on a detail controller driven without a UI.
struct Headless {
    cmd_tx: mpsc::UnboundedSender<DetailCommand>,
    event_rx: mpsc::UnboundedReceiver<DetailEvent>,
    handle: tokio::task::JoinHandle<Result<()>>,
}

impl Headless {
    fn spawn(services: Services, leadset_id: String) -> Self {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(run_detail_controller(services, leadset_id, event_tx, cmd_rx));
        Self {
            cmd_tx,
            event_rx,
            handle,
        }
    }

    /// First fully-loaded snapshot.
    async fn loaded(&mut self) -> Result<DetailState> {
        while let Some(ev) = self.event_rx.recv().await {
            if let DetailEvent::Updated(state) = ev {
                if !state.loading {
                    return Ok(*state);
                }
            }
        }
        bail!("detail controller stopped before loading")
    }

    async fn close(self) -> Result<()> {
        let _ = self.cmd_tx.send(DetailCommand::Close);
        self.handle.await.context("detail controller task failed")?
    }
}

/// Print the list page, or one detail snapshot when a leadset is given.
async fn run_report(services: Services, leadset: Option<String>, json: bool) -> Result<()> {
    let (out_tx, out_handle) = spawn_output_writer();

    match leadset {
        None => {
            let state = load_leadsets(services.store.as_ref(), services.page_size).await;
            if json {
                let _ = out_tx.send(OutputLine::Stdout(serde_json::to_string_pretty(&state)?));
            } else if let ListState::Failed(msg) = &state {
                let _ = out_tx.send(OutputLine::Stderr(msg.clone()));
            } else {
                let summary = crate::text_summary::build_list_summary(state.leadsets());
                for line in summary.lines {
                    let _ = out_tx.send(OutputLine::Stdout(line));
                }
            }
        }
        Some(id) => {
            let mut detail = Headless::spawn(services, id);
            let state = detail.loaded().await?;
            detail.close().await?;
            if json {
                let _ = out_tx.send(OutputLine::Stdout(serde_json::to_string_pretty(&state)?));
            } else {
                let summary = crate::text_summary::build_detail_summary(&state);
                for line in summary.lines {
                    let _ = out_tx.send(OutputLine::Stdout(line));
                }
            }
        }
    }

    drop(out_tx);
    let _ = out_handle.await;
    Ok(())
}

async fn run_export(services: Services, leadset_id: String, json: bool) -> Result<()> {
    let mut detail = Headless::spawn(services, leadset_id);
    let state = detail.loaded().await?;
    if let Some(err) = state.error.as_deref() {
        detail.close().await?;
        bail!("{err}");
    }

    let _ = detail.cmd_tx.send(DetailCommand::ExportCsv);
    let outcome = loop {
        match detail.event_rx.recv().await {
            Some(DetailEvent::OpenUrl(url)) => break Ok(url),
            Some(DetailEvent::Notice(Notice::Alert(msg))) => break Err(anyhow!(msg)),
            Some(_) => continue,
            None => break Err(anyhow!("detail controller stopped during export")),
        }
    };
    detail.close().await?;
    let url = outcome?;

    if json {
        println!("{}", serde_json::json!({ "url": url }));
    } else {
        println!("{url}");
    }
    Ok(())
}

async fn run_check(backend: &dyn LeadsetBackend, json: bool) -> Result<()> {
    let health = backend.health().await.context("backend health check failed")?;
    if json {
        println!("{}", serde_json::to_string_pretty(&health)?);
    } else {
        let sdk = match health.sdk_initialized {
            Some(true) => "initialized",
            Some(false) => "not initialized",
            None => "unknown",
        };
        println!("Backend: {} (sdk {sdk})", health.status);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{items_path, LEADSETS, RUNS};
    use crate::testing::FakeBackend;
    use serde_json::json;

    #[test]
    fn non_tui_modes() {
        assert!(!Cli::parse_from(["scout"]).is_non_tui());
        assert!(Cli::parse_from(["scout", "--text"]).is_non_tui());
        assert!(Cli::parse_from(["scout", "--check"]).is_non_tui());
        let args = Cli::parse_from(["scout", "--export", "--leadset", "ls-1"]);
        assert!(args.is_non_tui());
        assert_eq!(args.leadset.as_deref(), Some("ls-1"));
    }

    #[tokio::test]
    async fn export_requires_leadset() {
        let err = run(Cli::parse_from(["scout", "--export"])).await.unwrap_err();
        assert!(err.to_string().contains("--leadset"));
    }

    #[tokio::test]
    async fn headless_snapshot_of_existing_run() {
        let store = MemoryStore::new();
        store.insert(LEADSETS, "ls-1", json!({"id": "ls-1", "name": "A"}));
        store.insert(
            RUNS,
            "r1",
            json!({"id": "r1", "leadsetId": "ls-1", "status": "idle", "startedAt": "2024-01-01T00:00:00Z"}),
        );
        store.insert(&items_path("r1"), "a", json!({"itemId": "a"}));
        let services = Services {
            store: Arc::new(store),
            backend: Arc::new(FakeBackend::default()),
            page_size: 100,
        };

        let mut detail = Headless::spawn(services, "ls-1".into());
        let state = detail.loaded().await.unwrap();
        detail.close().await.unwrap();
        assert_eq!(state.run_id(), Some("r1"));
        assert_eq!(state.items.len(), 1);
    }
}
