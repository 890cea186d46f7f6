use crate::model::Notice;
use crate::orchestrator::{AppCommand, AppEvent, DetailCommand, DetailEvent, DetailState, ListState};
use crossterm::event::{KeyCode, KeyModifiers};
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    List,
    Detail,
}

/// What the event loop should do after a key press.
#[derive(Debug, Clone, PartialEq)]
pub enum UiAction {
    None,
    Send(AppCommand),
    Copy(String),
    Quit,
}

pub struct UiState {
    pub page: Page,
    pub show_help: bool,
    pub info: String,

    pub list: ListState,
    pub list_cursor: usize,

    /// Session of the detail page on screen; events from older sessions are dropped.
    pub session: u64,
    pub detail: Option<DetailState>,
    pub detail_cursor: usize,

    pub alerts: VecDeque<String>,
    pub last_url: Option<String>,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            page: Page::List,
            show_help: false,
            info: String::new(),
            list: ListState::Loading,
            list_cursor: 0,
            session: 0,
            detail: None,
            detail_cursor: 0,
            alerts: VecDeque::new(),
            last_url: None,
        }
    }
}

impl UiState {
    /// Apply a controller event. Returns a URL the front end should open.
    pub fn apply_event(&mut self, ev: AppEvent) -> Option<String> {
        match ev {
            AppEvent::List(list) => {
                self.list = list;
                let len = self.list.leadsets().len();
                self.list_cursor = self.list_cursor.min(len.saturating_sub(1));
            }
            AppEvent::DetailOpened {
                session,
                leadset_id,
            } => {
                self.session = session;
                self.page = Page::Detail;
                self.detail = None;
                self.detail_cursor = 0;
                self.info = format!("Opened {leadset_id}");
            }
            AppEvent::Detail { session, event } => {
                if session != self.session {
                    return None;
                }
                match event {
                    DetailEvent::Updated(state) => {
                        let len = state.items.len();
                        self.detail = Some(*state);
                        self.detail_cursor = self.detail_cursor.min(len.saturating_sub(1));
                    }
                    DetailEvent::Notice(Notice::Alert(msg)) => self.alerts.push_back(msg),
                    DetailEvent::Notice(Notice::Info(msg)) => self.info = msg,
                    DetailEvent::OpenUrl(url) => {
                        self.last_url = Some(url.clone());
                        return Some(url);
                    }
                }
            }
        }
        None
    }

    fn leave_detail(&mut self) -> UiAction {
        self.page = Page::List;
        self.session = 0;
        self.detail = None;
        self.detail_cursor = 0;
        UiAction::Send(AppCommand::Back)
    }

    pub fn on_key(&mut self, modifiers: KeyModifiers, code: KeyCode) -> UiAction {
        if modifiers == KeyModifiers::CONTROL && code == KeyCode::Char('c') {
            return UiAction::Quit;
        }
        // An alert swallows the next key.
        if self.alerts.pop_front().is_some() {
            return UiAction::None;
        }
        if self.show_help {
            match code {
                KeyCode::Char('?') | KeyCode::Esc => self.show_help = false,
                KeyCode::Char('q') => return UiAction::Quit,
                _ => {}
            }
            return UiAction::None;
        }

        match self.page {
            Page::List => self.on_list_key(code),
            Page::Detail => self.on_detail_key(code),
        }
    }

    fn on_list_key(&mut self, code: KeyCode) -> UiAction {
        let len = self.list.leadsets().len();
        match code {
            KeyCode::Char('q') => UiAction::Quit,
            KeyCode::Char('?') => {
                self.show_help = true;
                UiAction::None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.list_cursor + 1 < len {
                    self.list_cursor += 1;
                }
                UiAction::None
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.list_cursor = self.list_cursor.saturating_sub(1);
                UiAction::None
            }
            KeyCode::Enter | KeyCode::Char('o') => match self.list.leadsets().get(self.list_cursor) {
                Some(ls) => UiAction::Send(AppCommand::Open(ls.id.clone())),
                None => UiAction::None,
            },
            KeyCode::Char('l') => UiAction::Send(AppCommand::ReloadList),
            _ => UiAction::None,
        }
    }

    fn on_detail_key(&mut self, code: KeyCode) -> UiAction {
        let send = |cmd: DetailCommand| UiAction::Send(AppCommand::Detail(cmd));
        let Some(detail) = self.detail.as_ref() else {
            return match code {
                KeyCode::Char('q') => UiAction::Quit,
                KeyCode::Esc | KeyCode::Char('b') => self.leave_detail(),
                _ => UiAction::None,
            };
        };

        if detail.show_unlock {
            return match code {
                KeyCode::Enter | KeyCode::Char('y') if !detail.enriching => {
                    send(DetailCommand::ConfirmEnrich)
                }
                KeyCode::Esc | KeyCode::Char('n') if !detail.enriching => {
                    send(DetailCommand::CloseUnlock)
                }
                _ => UiAction::None,
            };
        }
        if detail.show_restart {
            return match code {
                KeyCode::Enter | KeyCode::Char('y') => send(DetailCommand::ConfirmRestart),
                KeyCode::Esc | KeyCode::Char('n') => send(DetailCommand::CancelRestart),
                _ => UiAction::None,
            };
        }

        let len = detail.items.len();
        match code {
            KeyCode::Char('q') => UiAction::Quit,
            KeyCode::Char('?') => {
                self.show_help = true;
                UiAction::None
            }
            KeyCode::Esc | KeyCode::Char('b') => self.leave_detail(),
            KeyCode::Down | KeyCode::Char('j') => {
                if self.detail_cursor + 1 < len {
                    self.detail_cursor += 1;
                }
                UiAction::None
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.detail_cursor = self.detail_cursor.saturating_sub(1);
                UiAction::None
            }
            KeyCode::Char(' ') => match detail.items.get(self.detail_cursor) {
                Some(item) => send(DetailCommand::Toggle(item.item_id.clone())),
                None => UiAction::None,
            },
            KeyCode::Char('a') => send(DetailCommand::SelectAll(!detail.all_selected())),
            KeyCode::Char('u') => send(DetailCommand::OpenUnlock),
            KeyCode::Char('d') => send(DetailCommand::ExportCsv),
            KeyCode::Char('r') if !detail.run_starting => send(DetailCommand::RequestRestart),
            KeyCode::Char('f') => send(DetailCommand::RefreshRun),
            KeyCode::Char('l') => send(DetailCommand::Reload),
            KeyCode::Char('y') => match self.last_url.clone() {
                Some(url) => UiAction::Copy(url),
                None => {
                    self.info = "No download URL to copy. Download a CSV first (d)".into();
                    UiAction::None
                }
            },
            _ => UiAction::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Enrichment, EnrichmentStatus, Item, Leadset};

    const NONE: KeyModifiers = KeyModifiers::NONE;

    fn detail_with_items(ids: &[&str]) -> DetailState {
        let mut s = DetailState::new("ls-1");
        s.loading = false;
        s.leadset = Some(Leadset::default());
        s.replace_items(
            ids.iter()
                .map(|id| Item {
                    item_id: id.to_string(),
                    enrichment: Enrichment {
                        status: EnrichmentStatus::None,
                        ..Default::default()
                    },
                    ..Default::default()
                })
                .collect(),
        );
        s
    }

    fn on_detail(ui: &mut UiState, state: DetailState) {
        ui.apply_event(AppEvent::DetailOpened {
            session: 3,
            leadset_id: "ls-1".into(),
        });
        ui.apply_event(AppEvent::Detail {
            session: 3,
            event: DetailEvent::Updated(Box::new(state)),
        });
    }

    #[test]
    fn enter_opens_the_leadset_under_the_cursor() {
        let mut ui = UiState::default();
        ui.apply_event(AppEvent::List(ListState::Loaded(vec![
            Leadset {
                id: "a".into(),
                ..Default::default()
            },
            Leadset {
                id: "b".into(),
                ..Default::default()
            },
        ])));
        ui.on_key(NONE, KeyCode::Char('j'));
        ui.on_key(NONE, KeyCode::Char('j'));
        assert_eq!(
            ui.on_key(NONE, KeyCode::Enter),
            UiAction::Send(AppCommand::Open("b".into()))
        );
    }

    #[test]
    fn stale_session_events_are_ignored() {
        let mut ui = UiState::default();
        on_detail(&mut ui, detail_with_items(&["a"]));
        let url = ui.apply_event(AppEvent::Detail {
            session: 2,
            event: DetailEvent::OpenUrl("https://old".into()),
        });
        assert!(url.is_none());
        assert!(ui.last_url.is_none());
        let url = ui.apply_event(AppEvent::Detail {
            session: 3,
            event: DetailEvent::OpenUrl("https://new".into()),
        });
        assert_eq!(url.as_deref(), Some("https://new"));
    }

    #[test]
    fn space_toggles_row_under_cursor() {
        let mut ui = UiState::default();
        on_detail(&mut ui, detail_with_items(&["a", "b"]));
        ui.on_key(NONE, KeyCode::Down);
        assert_eq!(
            ui.on_key(NONE, KeyCode::Char(' ')),
            UiAction::Send(AppCommand::Detail(DetailCommand::Toggle("b".into())))
        );
        assert_eq!(
            ui.on_key(NONE, KeyCode::Char('a')),
            UiAction::Send(AppCommand::Detail(DetailCommand::SelectAll(true)))
        );
    }

    #[test]
    fn modals_capture_keys() {
        let mut ui = UiState::default();
        let mut state = detail_with_items(&["a"]);
        state.show_restart = true;
        on_detail(&mut ui, state);
        assert_eq!(ui.on_key(NONE, KeyCode::Char('d')), UiAction::None);
        assert_eq!(
            ui.on_key(NONE, KeyCode::Enter),
            UiAction::Send(AppCommand::Detail(DetailCommand::ConfirmRestart))
        );

        let mut state = detail_with_items(&["a"]);
        state.show_unlock = true;
        state.enriching = true;
        on_detail(&mut ui, state);
        assert_eq!(ui.on_key(NONE, KeyCode::Enter), UiAction::None);
    }

    #[test]
    fn alert_is_dismissed_by_any_key() {
        let mut ui = UiState::default();
        on_detail(&mut ui, detail_with_items(&["a"]));
        ui.apply_event(AppEvent::Detail {
            session: 3,
            event: DetailEvent::Notice(Notice::Alert("No items to export".into())),
        });
        assert_eq!(ui.on_key(NONE, KeyCode::Char('q')), UiAction::None);
        assert!(ui.alerts.is_empty());
        assert_eq!(ui.on_key(NONE, KeyCode::Char('q')), UiAction::Quit);
    }

    #[test]
    fn back_leaves_detail_and_drops_session() {
        let mut ui = UiState::default();
        on_detail(&mut ui, detail_with_items(&["a"]));
        assert_eq!(ui.on_key(NONE, KeyCode::Esc), UiAction::Send(AppCommand::Back));
        assert_eq!(ui.page, Page::List);
        assert_eq!(ui.session, 0);
        assert!(ui.detail.is_none());
    }
}
