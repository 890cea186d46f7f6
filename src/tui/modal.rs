//! Unlock, confirmation and alert dialogs.

use super::theme;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

/// A `width` x `height` rectangle centred in `area`, clamped to fit.
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(area.height.saturating_sub(height) / 2),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(area);
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(area.width.saturating_sub(width) / 2),
            Constraint::Length(width),
            Constraint::Min(0),
        ])
        .split(vertical[1]);
    horizontal[1]
}

pub fn format_cost(dollars: f64) -> String {
    format!("${dollars:.2}")
}

fn actions(confirm: &str, busy: bool) -> Line<'static> {
    if busy {
        return Line::from(Span::styled("Processing...", theme::label()));
    }
    Line::from(vec![
        Span::styled("enter", theme::key()),
        Span::raw(format!(" {confirm}    ")),
        Span::styled("esc", theme::key()),
        Span::raw(" Cancel"),
    ])
}

fn draw_dialog(f: &mut Frame, area: Rect, title: &str, lines: Vec<Line<'static>>) {
    let height = lines.len() as u16 + 5;
    let rect = centered_rect(60, height, area);
    let p = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .alignment(Alignment::Left)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme::highlight())
                .title(Span::styled(title.to_string(), theme::title())),
        );
    f.render_widget(Clear, rect);
    f.render_widget(p, rect);
}

pub fn draw_unlock(f: &mut Frame, area: Rect, selected: usize, cost: f64, enriching: bool) {
    let lines = vec![
        Line::from(format!(
            "Unlock email, phone and LinkedIn for {selected} selected buyer{}.",
            if selected == 1 { "" } else { "s" }
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("Estimated cost: ", theme::label()),
            Span::styled(format_cost(cost), theme::highlight()),
        ]),
        Line::from(Span::styled(
            "This action will charge your account. Contact details will be available immediately after processing.",
            theme::label(),
        )),
        Line::from(""),
        actions(&format!("Confirm & Pay {}", format_cost(cost)), enriching),
    ];
    draw_dialog(f, area, "Unlock contacts", lines);
}

pub fn draw_confirm(
    f: &mut Frame,
    area: Rect,
    title: &str,
    message: &str,
    confirm_text: &str,
    busy: bool,
) {
    let lines = vec![
        Line::from(message.to_string()),
        Line::from(""),
        actions(confirm_text, busy),
    ];
    draw_dialog(f, area, title, lines);
}

pub fn draw_alert(f: &mut Frame, area: Rect, message: &str) {
    let lines = vec![
        Line::from(message.to_string()),
        Line::from(""),
        Line::from(Span::styled("press any key", theme::label())),
    ];
    draw_dialog(f, area, "Notice", lines);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cost_has_two_decimals() {
        assert_eq!(format_cost(1.5), "$1.50");
        assert_eq!(format_cost(0.0), "$0.00");
    }

    #[test]
    fn centered_rect_fits_inside_area() {
        let area = Rect::new(0, 0, 100, 40);
        let r = centered_rect(60, 10, area);
        assert_eq!((r.x, r.y, r.width, r.height), (20, 15, 60, 10));
        let small = centered_rect(60, 10, Rect::new(0, 0, 30, 5));
        assert_eq!((small.width, small.height), (30, 5));
    }
}
