//! Items table for the detail page.

use super::theme;
use crate::orchestrator::DetailState;
use ratatui::{
    layout::{Constraint, Rect},
    text::Span,
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

pub fn checkbox(selected: bool, locked: bool) -> &'static str {
    match (locked, selected) {
        (true, _) => "[-]",
        (false, true) => "[x]",
        (false, false) => "[ ]",
    }
}

pub fn draw_items(f: &mut Frame, area: Rect, state: &DetailState, cursor: usize) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme::border())
        .title(state.summary_line());

    if state.items.is_empty() {
        let p = Paragraph::new(Span::styled("No items found", theme::label())).block(block);
        f.render_widget(p, area);
        return;
    }

    let header = Row::new(vec![
        Cell::from(checkbox(state.all_selected(), false)),
        Cell::from("Company"),
        Cell::from("Domain"),
        Cell::from("Platform"),
        Cell::from("Recency"),
        Cell::from("Email"),
        Cell::from("Phone"),
        Cell::from("Status"),
    ])
    .style(theme::title());

    let rows = state.items.iter().map(|item| {
        let locked = item.is_locked();
        let row = Row::new(vec![
            Cell::from(checkbox(state.is_selected(&item.item_id), locked)),
            Cell::from(item.company().to_string()),
            Cell::from(item.domain().to_string()),
            Cell::from(item.platform().to_string()),
            Cell::from(item.recency_label()),
            Cell::from(item.email().to_string()),
            Cell::from(item.phone().to_string()),
            Cell::from(Span::styled(
                item.enrichment.status.as_str().to_string(),
                theme::enrichment_status(&item.enrichment.status),
            )),
        ]);
        if locked {
            row.style(theme::disabled())
        } else {
            row
        }
    });

    let widths = [
        Constraint::Length(3),
        Constraint::Percentage(20),
        Constraint::Percentage(16),
        Constraint::Length(10),
        Constraint::Length(13),
        Constraint::Percentage(22),
        Constraint::Length(16),
        Constraint::Length(10),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .row_highlight_style(theme::highlight())
        .highlight_symbol("> ");

    let mut table_state = TableState::default();
    table_state.select(Some(cursor.min(state.items.len() - 1)));
    f.render_stateful_widget(table, area, &mut table_state);
}
