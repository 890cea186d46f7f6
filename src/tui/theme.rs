//! Colours and styles shared by every view.

use crate::model::{EnrichmentStatus, RunStatus};
use ratatui::style::{Color, Modifier, Style};

pub const PRIMARY: Color = Color::White;
pub const SECONDARY: Color = Color::Gray;
pub const BORDER: Color = Color::DarkGray;
pub const ACCENT: Color = Color::Rgb(0x2a, 0x60, 0xff);
pub const ERROR: Color = Color::Rgb(0xff, 0x55, 0x33);
pub const SUCCESS: Color = Color::Rgb(0x00, 0xc8, 0x53);
pub const WARNING: Color = Color::Rgb(0xe6, 0x51, 0x00);
pub const KEY: Color = Color::Magenta;

pub fn title() -> Style {
    Style::default().fg(PRIMARY).add_modifier(Modifier::BOLD)
}

pub fn label() -> Style {
    Style::default().fg(SECONDARY)
}

pub fn border() -> Style {
    Style::default().fg(BORDER)
}

pub fn highlight() -> Style {
    Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
}

pub fn chip() -> Style {
    Style::default().fg(ACCENT)
}

pub fn disabled() -> Style {
    Style::default().fg(Color::DarkGray)
}

pub fn error() -> Style {
    Style::default().fg(ERROR)
}

pub fn key() -> Style {
    Style::default().fg(KEY)
}

pub fn run_status(status: &RunStatus) -> Style {
    match status {
        RunStatus::Done => Style::default().fg(SUCCESS),
        RunStatus::Running | RunStatus::Enriching => Style::default().fg(ACCENT),
        RunStatus::Queued => Style::default().fg(WARNING),
        RunStatus::Failed => Style::default().fg(ERROR),
        RunStatus::Idle | RunStatus::Other(_) => Style::default().fg(SECONDARY),
    }
}

pub fn enrichment_status(status: &EnrichmentStatus) -> Style {
    match status {
        EnrichmentStatus::Done => Style::default().fg(SUCCESS),
        EnrichmentStatus::Queued | EnrichmentStatus::Enriching => Style::default().fg(WARNING),
        EnrichmentStatus::Failed => Style::default().fg(ERROR),
        EnrichmentStatus::None | EnrichmentStatus::Other(_) => Style::default().fg(SECONDARY),
    }
}
