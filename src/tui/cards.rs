//! Leadset cards and the run stats row.

use super::theme;
use crate::model::{Leadset, Run};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

/// Rows one card occupies, borders included.
pub const CARD_HEIGHT: u16 = 7;

fn chips(leadset: &Leadset) -> Vec<Span<'static>> {
    let seg = &leadset.segment;
    let mut spans = Vec::new();
    for value in [
        &seg.segment_archetype,
        &seg.geo_region,
        &seg.firmographic_company_size,
    ] {
        if value.is_empty() {
            continue;
        }
        spans.push(Span::styled(format!("[{value}]"), theme::chip()));
        spans.push(Span::raw(" "));
    }
    spans
}

pub fn leadset_lines(leadset: &Leadset) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from(Span::styled(
        leadset.description.clone(),
        theme::label(),
    ))];
    let chips = chips(leadset);
    if !chips.is_empty() {
        lines.push(Line::from(chips));
    }
    let signals = leadset.display_signals();
    if !signals.is_empty() {
        lines.push(Line::from(vec![
            Span::styled("Signals: ", theme::label()),
            Span::raw(signals.join(" · ")),
        ]));
    }
    lines.push(Line::from(Span::styled(
        format!("~{} buyers", leadset.est_count),
        theme::highlight(),
    )));
    lines
}

pub fn draw_leadset_card(f: &mut Frame, area: Rect, leadset: &Leadset, selected: bool) {
    let border = if selected {
        theme::highlight()
    } else {
        theme::border()
    };
    let card = Paragraph::new(leadset_lines(leadset))
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border)
                .title(Span::styled(leadset.name.clone(), theme::title())),
        );
    f.render_widget(card, area);
}

/// Cards stacked vertically, scrolled so `cursor` stays visible.
pub fn draw_leadset_list(f: &mut Frame, area: Rect, leadsets: &[Leadset], cursor: usize) {
    let visible = (area.height / CARD_HEIGHT).max(1) as usize;
    let first = cursor.saturating_sub(visible - 1);
    let shown: Vec<&Leadset> = leadsets.iter().skip(first).take(visible).collect();

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            shown
                .iter()
                .map(|_| Constraint::Length(CARD_HEIGHT))
                .chain(std::iter::once(Constraint::Min(0)))
                .collect::<Vec<_>>(),
        )
        .split(area);

    for (i, ls) in shown.into_iter().enumerate() {
        draw_leadset_card(f, rows[i], ls, first + i == cursor);
    }
}

pub fn draw_stats(f: &mut Frame, area: Rect, run: Option<&Run>, selected: usize) {
    let (found, enriched, status) = match run {
        Some(r) => (r.counters.found, r.counters.enriched, r.status.clone()),
        None => (0, 0, Default::default()),
    };
    let stat = |label: &'static str, value: String| {
        vec![
            Span::styled(label, theme::label()),
            Span::styled(value, theme::title()),
            Span::raw("    "),
        ]
    };
    let mut spans = stat("Found: ", found.to_string());
    spans.extend(stat("Enriched: ", enriched.to_string()));
    spans.extend(stat("Selected: ", selected.to_string()));
    spans.push(Span::styled("Status: ", theme::label()));
    spans.push(Span::styled(
        status.as_str().to_string(),
        theme::run_status(&status),
    ));

    let p = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(theme::border()),
    );
    f.render_widget(p, area);
}
