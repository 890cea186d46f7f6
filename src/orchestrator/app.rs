//! Page router shared by the interactive front end.
//!
//! Keeps at most one detail controller alive. Opening a leadset starts a new
//! session; leaving the page closes the controller, which drops its feeds.

use super::controller::{run_detail_controller, DetailCommand, DetailEvent};
use super::list::{load_leadsets, ListState};
use super::Services;
use anyhow::Result;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    ReloadList,
    Open(String),
    Detail(DetailCommand),
    Back,
    Quit,
}

#[derive(Debug, Clone)]
pub enum AppEvent {
    List(ListState),
    DetailOpened { session: u64, leadset_id: String },
    Detail { session: u64, event: DetailEvent },
}

struct Session {
    id: u64,
    cmd_tx: UnboundedSender<DetailCommand>,
    forwarder: JoinHandle<()>,
}

impl Session {
    fn close(self) {
        let _ = self.cmd_tx.send(DetailCommand::Close);
        self.forwarder.abort();
    }
}

fn spawn_list_load(services: &Services, event_tx: &UnboundedSender<AppEvent>) {
    let store = services.store.clone();
    let page_size = services.page_size;
    let tx = event_tx.clone();
    let _ = tx.send(AppEvent::List(ListState::Loading));
    tokio::spawn(async move {
        let state = load_leadsets(store.as_ref(), page_size).await;
        let _ = tx.send(AppEvent::List(state));
    });
}

fn open_session(
    services: &Services,
    id: u64,
    leadset_id: String,
    event_tx: &UnboundedSender<AppEvent>,
) -> Session {
    let (detail_tx, mut detail_rx) = mpsc::unbounded_channel::<DetailEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<DetailCommand>();

    let _ = event_tx.send(AppEvent::DetailOpened {
        session: id,
        leadset_id: leadset_id.clone(),
    });

    let services = services.clone();
    tokio::spawn(async move {
        if let Err(e) = run_detail_controller(services, leadset_id, detail_tx, cmd_rx).await {
            warn!(session = id, error = %e, "detail controller failed");
        }
    });

    let tx = event_tx.clone();
    let forwarder = tokio::spawn(async move {
        while let Some(event) = detail_rx.recv().await {
            if tx.send(AppEvent::Detail { session: id, event }).is_err() {
                break;
            }
        }
    });

    Session {
        id,
        cmd_tx,
        forwarder,
    }
}

/// Route front-end commands until `Quit` or the command channel closes.
/// With `initial_leadset`, the detail page is opened immediately instead of
/// loading the list.
pub async fn run_app(
    services: Services,
    initial_leadset: Option<String>,
    event_tx: UnboundedSender<AppEvent>,
    mut cmd_rx: UnboundedReceiver<AppCommand>,
) -> Result<()> {
    let mut next_session = 0u64;
    let mut current: Option<Session> = None;

    match initial_leadset {
        Some(id) => {
            next_session += 1;
            current = Some(open_session(&services, next_session, id, &event_tx));
        }
        None => spawn_list_load(&services, &event_tx),
    }

    while let Some(cmd) = cmd_rx.recv().await {
        match cmd {
            AppCommand::Quit => break,
            AppCommand::ReloadList => spawn_list_load(&services, &event_tx),
            AppCommand::Open(leadset_id) => {
                if let Some(session) = current.take() {
                    session.close();
                }
                next_session += 1;
                info!(%leadset_id, session = next_session, "opening leadset");
                current = Some(open_session(&services, next_session, leadset_id, &event_tx));
            }
            AppCommand::Back => {
                if let Some(session) = current.take() {
                    debug!(session = session.id, "leaving detail page");
                    session.close();
                }
                spawn_list_load(&services, &event_tx);
            }
            AppCommand::Detail(cmd) => match &current {
                Some(session) => {
                    if session.cmd_tx.send(cmd).is_err() {
                        warn!(session = session.id, "detail controller is gone");
                    }
                }
                None => debug!(?cmd, "detail command without an open leadset"),
            },
        }
    }

    if let Some(session) = current.take() {
        session.close();
    }
    Ok(())
}
