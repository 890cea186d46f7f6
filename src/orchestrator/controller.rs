//! Detail-page controller.
//!
//! Owns the run/items/selection lifecycle for one leadset. Multiplexes UI
//! commands, the run feed, the item feed and item re-fetch completions, and
//! publishes a fresh [`DetailState`] after every transition.

use super::detail::{latest_run, DetailState};
use super::Services;
use crate::error::{ScoutError, ScoutResult};
use crate::model::{Item, Leadset, Notice, Run, ENRICHMENT_TYPES};
use crate::store::{self, decode, decode_all, items_path, Document, DocumentStore, Feed, Filter};
use anyhow::Result;
use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

/// Commands emitted by UI layers for the detail page.
#[derive(Debug, Clone, PartialEq)]
pub enum DetailCommand {
    Toggle(String),
    SelectAll(bool),
    OpenUnlock,
    CloseUnlock,
    ConfirmEnrich,
    RequestRestart,
    CancelRestart,
    ConfirmRestart,
    ExportCsv,
    RefreshRun,
    Reload,
    Close,
}

/// Events published to presentation layers.
#[derive(Debug, Clone)]
pub enum DetailEvent {
    Updated(Box<DetailState>),
    Notice(Notice),
    /// A download URL the front end should open.
    OpenUrl(String),
}

/// Items fetched in the background for a run-feed update.
struct Refetched {
    run_id: String,
    items: ScoutResult<Vec<Item>>,
}

/// Load the items of a run: point reads when the run lists item ids,
/// otherwise a search over the run's item collection.
pub(crate) async fn load_run_items(
    store: &dyn DocumentStore,
    run: &Run,
    page_size: usize,
) -> ScoutResult<Vec<Item>> {
    let path = items_path(&run.id);
    match run.listed_item_ids() {
        Some(ids) => {
            let reads = ids.iter().map(|id| store.get(&path, id));
            let mut docs = Vec::with_capacity(ids.len());
            for res in join_all(reads).await {
                if let Some(doc) = res? {
                    docs.push(doc);
                }
            }
            Ok(decode_all("item", docs))
        }
        None => {
            let docs = store.search(&Filter::new(path), page_size).await?;
            Ok(decode_all("item", docs))
        }
    }
}

async fn next_snapshot<T>(feed: &mut Option<Feed<T>>) -> Option<T> {
    match feed {
        Some(f) => f.next().await,
        None => futures::future::pending().await,
    }
}

struct DetailController {
    services: Services,
    state: DetailState,
    event_tx: UnboundedSender<DetailEvent>,
    run_feed: Option<Feed<Option<Document>>>,
    items_feed: Option<Feed<Vec<Document>>>,
    refetch_tx: UnboundedSender<Refetched>,
}

impl DetailController {
    fn publish(&self) {
        let _ = self
            .event_tx
            .send(DetailEvent::Updated(Box::new(self.state.clone())));
    }

    fn notify(&self, notice: Notice) {
        let _ = self.event_tx.send(DetailEvent::Notice(notice));
    }

    fn alert(&self, message: impl Into<String>) {
        self.notify(Notice::Alert(message.into()));
    }

    fn store(&self) -> &dyn DocumentStore {
        self.services.store.as_ref()
    }

    /// Initial load. Any failure ends in a single inline error.
    async fn activate(&mut self) {
        self.state.loading = true;
        self.state.error = None;
        self.publish();

        if let Err(message) = self.load().await {
            self.state.error = Some(message);
        }

        self.state.loading = false;
        self.publish();
    }

    async fn load(&mut self) -> Result<(), String> {
        let leadset_id = self.state.leadset_id.clone();

        let doc = self
            .store()
            .get(store::LEADSETS, &leadset_id)
            .await
            .and_then(|doc| {
                doc.ok_or_else(|| ScoutError::NotFound {
                    entity: "leadset",
                    id: leadset_id.clone(),
                })
            })
            .map_err(|e| {
                match &e {
                    ScoutError::NotFound { .. } => info!(%leadset_id, "leadset not found"),
                    _ => warn!(%leadset_id, error = %e, "error loading leadset"),
                }
                load_failure_message(&e)
            })?;
        let mut leadset: Leadset = decode("leadset", doc).map_err(|e| {
            warn!(%leadset_id, error = %e, "malformed leadset");
            "Failed to load leadset details".to_string()
        })?;
        if leadset.id.is_empty() {
            leadset.id = leadset_id.clone();
        }
        self.state.leadset = Some(leadset);

        let filter = Filter::new(store::RUNS).eq("leadsetId", leadset_id.as_str());
        let runs = self
            .store()
            .search(&filter, self.services.page_size)
            .await
            .map_err(|e| {
                warn!(%leadset_id, error = %e, "error loading runs");
                "Failed to load leadset details".to_string()
            })?;

        match latest_run(decode_all("run", runs)) {
            Some(run) => {
                info!(%leadset_id, run_id = %run.id, status = run.status.as_str(), "using existing run");
                match load_run_items(self.store(), &run, self.services.page_size).await {
                    Ok(items) => self.state.replace_items(items),
                    Err(e) => warn!(run_id = %run.id, error = %e, "error loading items"),
                }
                let run_id = run.id.clone();
                self.state.run = Some(run);
                self.subscribe(&run_id);
                Ok(())
            }
            None => {
                info!(%leadset_id, "no existing runs, starting new one");
                self.start_new_run()
                    .await
                    .map_err(|_| "Failed to start search. Please try again.".to_string())
            }
        }
    }

    /// Start a run through the backend and point the page at it. On failure
    /// the previous run, items and selection are left untouched.
    async fn start_new_run(&mut self) -> ScoutResult<()> {
        self.state.run_starting = true;
        self.publish();

        let res = self
            .services
            .backend
            .start_run(&self.state.leadset_id)
            .await;
        self.state.run_starting = false;

        let started = res.map_err(|e| {
            warn!(leadset_id = %self.state.leadset_id, error = %e, "error starting run");
            e
        })?;
        let run = Run::provisional(&self.state.leadset_id, &started);
        let run_id = run.id.clone();
        self.state.adopt_new_run(run);
        self.subscribe(&run_id);
        Ok(())
    }

    /// Replace both feeds with feeds for `run_id`. The old feeds are dropped,
    /// which stops them.
    fn subscribe(&mut self, run_id: &str) {
        debug!(run_id, "subscribing to run and item feeds");
        let store = self.store();
        let run_feed = store.watch_document(store::RUNS, run_id);
        let items_feed =
            store.watch_collection(&Filter::new(items_path(run_id)), self.services.page_size);
        self.run_feed = Some(run_feed);
        self.items_feed = Some(items_feed);
    }

    fn unsubscribe(&mut self) {
        self.run_feed = None;
        self.items_feed = None;
    }

    fn on_run_snapshot(&mut self, doc: Option<Document>) {
        let Some(doc) = doc else {
            return;
        };
        let mut run: Run = match decode("run", doc) {
            Ok(run) => run,
            Err(e) => {
                warn!(error = %e, "ignoring malformed run snapshot");
                return;
            }
        };
        if run.id.is_empty() {
            if let Some(current) = self.state.run_id() {
                run.id = current.to_string();
            }
        }
        debug!(run_id = %run.id, status = run.status.as_str(), "run updated");
        let snapshot = run.clone();
        if self.state.apply_run_snapshot(run).is_some() {
            self.spawn_refetch(snapshot);
        }
        self.publish();
    }

    fn on_items_snapshot(&mut self, docs: Vec<Document>) {
        let items: Vec<Item> = decode_all("item", docs);
        debug!(count = items.len(), "items updated");
        self.state.replace_items(items);
        self.publish();
    }

    /// Re-fetch the items a run update lists, off the controller task.
    fn spawn_refetch(&self, run: Run) {
        let store = Arc::clone(&self.services.store);
        let page_size = self.services.page_size;
        let tx = self.refetch_tx.clone();
        tokio::spawn(async move {
            let items = load_run_items(store.as_ref(), &run, page_size).await;
            let _ = tx.send(Refetched {
                run_id: run.id,
                items,
            });
        });
    }

    fn on_refetched(&mut self, done: Refetched) {
        if self.state.run_id() != Some(done.run_id.as_str()) {
            debug!(run_id = %done.run_id, "dropping items for superseded run");
            return;
        }
        match done.items {
            Ok(items) => {
                self.state.replace_items(items);
                self.publish();
            }
            Err(e) => warn!(run_id = %done.run_id, error = %e, "error re-fetching items"),
        }
    }

    async fn handle_command(&mut self, cmd: DetailCommand) {
        match cmd {
            DetailCommand::Toggle(id) => {
                if self.state.toggle(&id) {
                    self.publish();
                }
            }
            DetailCommand::SelectAll(select) => {
                self.state.select_all(select);
                self.publish();
            }
            DetailCommand::OpenUnlock => match self.state.begin_unlock() {
                Ok(()) => self.publish(),
                Err(e) => self.alert(e.to_string()),
            },
            DetailCommand::CloseUnlock => {
                self.state.show_unlock = false;
                self.publish();
            }
            DetailCommand::ConfirmEnrich => self.confirm_enrich().await,
            DetailCommand::RequestRestart => {
                if !self.state.run_starting {
                    self.state.show_restart = true;
                    self.publish();
                }
            }
            DetailCommand::CancelRestart => {
                self.state.show_restart = false;
                self.publish();
            }
            DetailCommand::ConfirmRestart => {
                if !self.state.show_restart {
                    debug!("restart requested without confirmation; ignoring");
                    return;
                }
                self.state.show_restart = false;
                if self.start_new_run().await.is_err() {
                    self.alert("Failed to start search. Please try again.");
                }
                self.publish();
            }
            DetailCommand::ExportCsv => self.export_csv().await,
            DetailCommand::RefreshRun => self.refresh_run().await,
            DetailCommand::Reload => {
                self.unsubscribe();
                self.state = DetailState::new(self.state.leadset_id.clone());
                self.activate().await;
            }
            DetailCommand::Close => {}
        }
    }

    async fn confirm_enrich(&mut self) {
        let Some(run_id) = self.state.run_id().map(str::to_string) else {
            self.alert("No active run found");
            return;
        };
        if self.state.selection().is_empty() {
            self.alert("Please select at least one buyer");
            return;
        }

        self.state.enriching = true;
        self.publish();

        let selected = self.state.selection().to_vec();
        let res = self
            .services
            .backend
            .enrich_contacts(&self.state.leadset_id, &run_id, &selected, &ENRICHMENT_TYPES)
            .await;
        self.state.enriching = false;

        match res {
            Ok(ack) => {
                info!(%run_id, count = selected.len(), ?ack, "enrichment started");
                self.alert(format!(
                    "Enrichment started for {} buyers! Contact details will appear shortly.",
                    selected.len()
                ));
                self.state.show_unlock = false;
                self.state.clear_selection();
            }
            Err(e) => {
                warn!(%run_id, error = %e, "enrichment request failed");
                self.alert("Failed to start enrichment. Please try again.");
            }
        }
        self.publish();
    }

    async fn export_csv(&mut self) {
        let run_id = match self.state.export_target() {
            Ok(id) => id,
            Err(e) => {
                self.alert(e.to_string());
                return;
            }
        };
        match self
            .services
            .backend
            .export_csv(&self.state.leadset_id, &run_id)
            .await
        {
            Ok(resp) => match resp.url {
                Some(url) if !url.is_empty() => {
                    info!(%run_id, "export ready");
                    let _ = self.event_tx.send(DetailEvent::OpenUrl(url));
                }
                _ => self.alert("CSV export failed. Please try again."),
            },
            Err(e) => {
                warn!(%run_id, error = %e, "export failed");
                self.alert("Failed to export CSV. Please try again.");
            }
        }
    }

    async fn refresh_run(&mut self) {
        let Some(run_id) = self.state.run_id().map(str::to_string) else {
            self.alert("No active run found");
            return;
        };
        match self
            .services
            .backend
            .run_details(&self.state.leadset_id, &run_id)
            .await
        {
            Ok(mut run) => {
                if run.id.is_empty() {
                    run.id = run_id;
                }
                let snapshot = run.clone();
                if self.state.apply_run_snapshot(run).is_some() {
                    self.spawn_refetch(snapshot);
                }
                self.notify(Notice::Info("Run refreshed".into()));
                self.publish();
            }
            Err(e) => {
                warn!(%run_id, error = %e, "error refreshing run");
                self.alert("Failed to refresh run details");
            }
        }
    }
}

/// Inline message for a failed leadset load.
fn load_failure_message(err: &ScoutError) -> String {
    match err {
        ScoutError::NotFound {
            entity: "leadset", ..
        } => "Leadset not found".into(),
        _ => "Failed to load leadset details".into(),
    }
}

/// Drive the detail page for `leadset_id` until the UI closes it.
pub(crate) async fn run_detail_controller(
    services: Services,
    leadset_id: String,
    event_tx: UnboundedSender<DetailEvent>,
    mut cmd_rx: UnboundedReceiver<DetailCommand>,
) -> Result<()> {
    let (refetch_tx, mut refetch_rx) = mpsc::unbounded_channel::<Refetched>();
    let mut ctl = DetailController {
        services,
        state: DetailState::new(leadset_id),
        event_tx,
        run_feed: None,
        items_feed: None,
        refetch_tx,
    };

    ctl.activate().await;

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    None | Some(DetailCommand::Close) => break,
                    Some(cmd) => ctl.handle_command(cmd).await,
                }
            }
            snapshot = next_snapshot(&mut ctl.run_feed) => {
                match snapshot {
                    Some(doc) => ctl.on_run_snapshot(doc),
                    None => {
                        warn!("run feed ended");
                        ctl.run_feed = None;
                    }
                }
            }
            snapshot = next_snapshot(&mut ctl.items_feed) => {
                match snapshot {
                    Some(docs) => ctl.on_items_snapshot(docs),
                    None => {
                        warn!("item feed ended");
                        ctl.items_feed = None;
                    }
                }
            }
            Some(done) = refetch_rx.recv() => ctl.on_refetched(done),
        }
    }

    ctl.unsubscribe();
    debug!(leadset_id = %ctl.state.leadset_id, "detail controller stopped");
    Ok(())
}
