use super::theme;
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

fn bind(keys: &'static str, pad: usize, action: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::raw("  "),
        Span::styled(keys, theme::key()),
        Span::raw(" ".repeat(pad)),
        Span::raw(action),
    ])
}

pub fn draw_help(area: Rect, f: &mut Frame) {
    let p = Paragraph::new(vec![
        Line::from("Leadsets:"),
        bind("↑/↓ j/k", 5, "Move"),
        bind("enter", 7, "Open leadset"),
        bind("l", 11, "Reload list"),
        Line::from(""),
        Line::from("Leadset detail:"),
        bind("↑/↓ j/k", 5, "Move"),
        bind("space", 7, "Select / deselect buyer"),
        bind("a", 11, "Select all / none"),
        bind("u", 11, "Unlock contacts for selection"),
        bind("d", 11, "Download CSV"),
        bind("y", 11, "Copy last download URL"),
        bind("r", 11, "Start a new search"),
        bind("f", 11, "Refresh run details"),
        bind("l", 11, "Reload page"),
        bind("esc/b", 7, "Back to leadsets"),
        Line::from(""),
        Line::from("Dialogs:"),
        bind("enter/y", 5, "Confirm"),
        bind("esc/n", 7, "Cancel"),
        Line::from(""),
        bind("?", 11, "Toggle this help"),
        Line::from(vec![
            Span::raw("  "),
            Span::styled("q", theme::key()),
            Span::raw(" / "),
            Span::styled("Ctrl-C", theme::key()),
            Span::raw("  Quit"),
        ]),
    ])
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(theme::border())
            .title("Help"),
    );
    f.render_widget(Clear, area);
    f.render_widget(p, area);
}
