//! Status bar component.

use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

use crate::controller::LiveState;
use crate::tui::app::App;

/// Renders the status bar.
pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let controller = &app.controller;

    let mode_span = if controller.is_live() {
        Span::styled(" LIVE ", Style::default().fg(Color::Black).bg(Color::Green))
    } else {
        Span::styled(" HIST ", Style::default().fg(Color::Black).bg(Color::Blue))
    };

    let live_state = controller.live_state();
    let state_color = match live_state {
        LiveState::Streaming(_) => Color::Green,
        LiveState::Connecting(_) => Color::Yellow,
        LiveState::Disconnected(_) => Color::Red,
        LiveState::Idle => Color::Gray,
    };

    let loading_span = if controller.loading() {
        Span::styled(" Loading... ", Style::default().fg(Color::Yellow))
    } else {
        Span::raw("")
    };

    let export_span = if controller.exporting() {
        Span::styled(" Exporting... ", Style::default().fg(Color::Yellow))
    } else if let Some(path) = controller.last_export() {
        Span::styled(
            format!(" Saved {} ", path.display()),
            Style::default().fg(Color::Cyan),
        )
    } else {
        Span::raw("")
    };

    let error_span = if let Some(ref error) = app.error_message {
        Span::styled(
            format!(" {} ", error.message),
            Style::default().fg(Color::Red),
        )
    } else {
        Span::raw("")
    };

    let line = Line::from(vec![
        mode_span,
        Span::styled(
            format!(" {} ", live_state.label()),
            Style::default().fg(state_color),
        ),
        Span::raw("│"),
        Span::styled(
            format!(" {} records ", controller.buffer().len()),
            Style::default().fg(Color::White),
        ),
        Span::raw("│"),
        loading_span,
        export_span,
        error_span,
    ]);

    let para = Paragraph::new(line).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(para, area);
}
