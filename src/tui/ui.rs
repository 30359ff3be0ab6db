//! Main UI rendering coordinator.

use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

use super::app::{App, Mode};
use super::components::{notification, query_form, status_bar, trade_table};

/// Renders the entire application UI.
pub fn render(frame: &mut Frame, app: &App) {
    let [status, form, tables, help] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(3),
        Constraint::Min(5),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    status_bar::render(frame, status, app);
    query_form::render(frame, form, app);
    trade_table::render(frame, tables, app);
    render_help(frame, help, app);

    if let Some(message) = app.controller.notification() {
        notification::render(frame, frame.area(), message);
    }
}

fn render_help(frame: &mut Frame, area: Rect, app: &App) {
    let keys: &[(&str, &str)] = match app.mode {
        Mode::Insert => &[("Enter", "apply"), ("Esc", "cancel")],
        Mode::Normal => &[
            ("Tab", "field"),
            ("Enter", "edit"),
            ("Space", "cycle"),
            ("l", "live"),
            ("f", "fetch"),
            ("r", "latest"),
            ("e", "export"),
            ("q", "quit"),
        ],
    };

    let spans: Vec<Span> = keys
        .iter()
        .flat_map(|(key, what)| {
            [
                Span::styled(format!(" {key} "), Style::default().fg(Color::Cyan)),
                Span::styled(format!("{what} "), Style::default().fg(Color::DarkGray)),
            ]
        })
        .collect();

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
