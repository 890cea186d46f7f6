mod cards;
mod export;
mod help;
mod modal;
mod state;
mod table;
mod theme;

use crate::orchestrator::{self, AppCommand, AppEvent, DetailBody, DetailState, ListState, Services};
use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame, Terminal,
};
use state::{Page, UiAction, UiState};
use std::{io, time::Duration, time::Instant};
use tokio::sync::mpsc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

const RESTART_MESSAGE: &str = "Are you sure you want to restart the search? This will start a new run and may take a few moments.";

pub async fn run(services: Services, leadset: Option<String>) -> Result<()> {
    let (event_tx, event_rx) = mpsc::unbounded_channel::<AppEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<AppCommand>();

    // TUI runs in a dedicated thread so terminal I/O stays out of the Tokio runtime.
    let ui_handle = std::thread::spawn(move || run_threaded(event_rx, cmd_tx));

    let res = orchestrator::run_app(services, leadset, event_tx, cmd_rx).await;

    let join_res = tokio::task::spawn_blocking(move || ui_handle.join()).await;
    if let Ok(joined) = join_res {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(anyhow::anyhow!("TUI thread panicked")),
        }
    }

    res
}

fn run_threaded(
    mut event_rx: UnboundedReceiver<AppEvent>,
    cmd_tx: UnboundedSender<AppCommand>,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).ok();

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;
    terminal.clear().ok();

    // Owned by the UI thread only.
    let mut state = UiState::default();

    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();

    let res = loop {
        // Drain controller events without blocking.
        while let Ok(ev) = event_rx.try_recv() {
            if let Some(url) = state.apply_event(ev) {
                state.info = match export::open_url(&url) {
                    Ok(()) => format!(
                        "Opened download: {} (press 'y' to copy)",
                        export::display_url(&url)
                    ),
                    Err(e) => format!("Download ready: {url} ({e:#})"),
                };
            }
        }

        if last_tick.elapsed() >= tick_rate {
            terminal.draw(|f| draw(f.area(), f, &state)).ok();
            last_tick = Instant::now();
        }

        if !event::poll(Duration::from_millis(10)).unwrap_or(false) {
            continue;
        }
        let Ok(Event::Key(k)) = event::read() else {
            continue;
        };
        if k.kind != KeyEventKind::Press {
            continue;
        }
        match state.on_key(k.modifiers, k.code) {
            UiAction::None => {}
            UiAction::Send(cmd) => {
                if cmd_tx.send(cmd).is_err() {
                    break Err(anyhow::anyhow!("controller stopped"));
                }
            }
            UiAction::Copy(url) => {
                state.info = match export::copy_to_clipboard(&url) {
                    Ok(()) => format!("Copied to clipboard: {}", export::display_url(&url)),
                    Err(e) => format!("Clipboard copy failed: {e:#}"),
                };
            }
            UiAction::Quit => {
                let _ = cmd_tx.send(AppCommand::Quit);
                break Ok(());
            }
        }
        terminal.draw(|f| draw(f.area(), f, &state)).ok();
    };

    disable_raw_mode().ok();
    let mut stdout = io::stdout();
    execute!(stdout, LeaveAlternateScreen).ok();
    res
}

fn draw(area: Rect, f: &mut Frame, state: &UiState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(area);

    let leadset_name = state
        .detail
        .as_ref()
        .and_then(|d| d.leadset.as_ref())
        .map(|ls| ls.name.as_str());
    let crumb = match (state.page, leadset_name) {
        (Page::List, _) => "Leadsets".to_string(),
        (Page::Detail, Some(name)) => format!("Leadsets › {name}"),
        (Page::Detail, None) => "Leadsets › ...".to_string(),
    };
    let header = Paragraph::new(Line::from(Span::styled(crumb, theme::title()))).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(theme::border())
            .title("Scout Leadsets"),
    );
    f.render_widget(header, chunks[0]);

    match state.page {
        Page::List => draw_list(chunks[1], f, state),
        Page::Detail => draw_detail(chunks[1], f, state),
    }
    draw_status(chunks[2], f, state);

    if let (Page::Detail, Some(detail)) = (state.page, state.detail.as_ref()) {
        if detail.show_unlock {
            modal::draw_unlock(
                f,
                area,
                detail.selection().len(),
                detail.estimated_cost(),
                detail.enriching,
            );
        } else if detail.show_restart {
            modal::draw_confirm(
                f,
                area,
                "Restart Search",
                RESTART_MESSAGE,
                "Restart Run",
                detail.run_starting,
            );
        }
    }
    if state.show_help {
        help::draw_help(modal::centered_rect(60, 30, area), f);
    }
    if let Some(alert) = state.alerts.front() {
        modal::draw_alert(f, area, alert);
    }
}

fn placeholder(area: Rect, f: &mut Frame, text: &str, style: Style) {
    let p = Paragraph::new(Span::styled(text.to_string(), style))
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme::border()),
        );
    f.render_widget(p, area);
}

fn draw_list(area: Rect, f: &mut Frame, state: &UiState) {
    match state.list.message() {
        Some(msg) => {
            let style = match state.list {
                ListState::Failed(_) => theme::error(),
                _ => theme::label(),
            };
            placeholder(area, f, msg, style);
        }
        None => cards::draw_leadset_list(f, area, state.list.leadsets(), state.list_cursor),
    }
}

fn draw_detail(area: Rect, f: &mut Frame, state: &UiState) {
    let Some(detail) = state.detail.as_ref() else {
        placeholder(area, f, "Loading...", theme::label());
        return;
    };
    match detail.body() {
        DetailBody::Loading => placeholder(area, f, "Loading...", theme::label()),
        DetailBody::Error(msg) => placeholder(area, f, &msg, theme::error()),
        body => draw_detail_page(area, f, detail, body, state.detail_cursor),
    }
}

fn draw_detail_page(
    area: Rect,
    f: &mut Frame,
    detail: &DetailState,
    body: DetailBody,
    cursor: usize,
) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6),
            Constraint::Length(3),
            Constraint::Min(0),
        ])
        .split(area);

    if let Some(ls) = detail.leadset.as_ref() {
        cards::draw_leadset_card(f, rows[0], ls, false);
    }
    cards::draw_stats(f, rows[1], detail.run.as_ref(), detail.selection().len());

    match body {
        DetailBody::StartingRun => placeholder(
            rows[2],
            f,
            "Starting search for buyers...",
            theme::highlight(),
        ),
        DetailBody::Searching => {
            placeholder(rows[2], f, "Searching for buyers...", theme::highlight())
        }
        _ => table::draw_items(f, rows[2], detail, cursor),
    }
}

fn draw_status(area: Rect, f: &mut Frame, state: &UiState) {
    let keys = match state.page {
        Page::List => "enter open | l reload | ? help | q quit",
        Page::Detail => "space select | a all | u unlock | d csv | r restart | esc back | ? help",
    };
    let mut spans = vec![Span::styled(keys, theme::label())];
    if !state.info.is_empty() {
        spans.push(Span::raw("   "));
        spans.push(Span::raw(state.info.clone()));
    }
    let p = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(theme::border())
            .title("Status"),
    );
    f.render_widget(p, area);
}
