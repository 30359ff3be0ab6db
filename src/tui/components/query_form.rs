//! Query form row: time range, selectors and the live toggle.

use ratatui::{
    Frame,
    layout::{Constraint, Layout, Position, Rect},
    style::{Color, Modifier, Style},
    text::Span,
    widgets::{Block, Borders, Paragraph},
};

use crate::tui::app::{App, Field, Mode};

/// Renders one bordered cell per [`Field`].
pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let cells = Layout::horizontal([
        Constraint::Length(20),
        Constraint::Length(20),
        Constraint::Min(14),
        Constraint::Min(8),
        Constraint::Min(11),
        Constraint::Length(8),
    ])
    .split(area);

    for (field, cell) in Field::ALL.iter().zip(cells.iter()) {
        render_field(frame, *cell, app, *field);
    }
}

fn render_field(frame: &mut Frame, area: Rect, app: &App, field: Field) {
    let is_focused = app.focus == field;
    let editing = is_focused && app.mode == Mode::Insert;
    let border_style = if editing {
        Style::default().fg(Color::Yellow)
    } else if is_focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let block = Block::default()
        .title(format!(" {} ", field.title()))
        .borders(Borders::ALL)
        .border_style(border_style);
    let inner = block.inner(area);

    let params = app.controller.params();
    let value = match field {
        Field::StartTime => placeholder(app.start_input.as_str()),
        Field::EndTime => placeholder(app.end_input.as_str()),
        Field::Symbol => Span::raw(params.symbol.label()),
        Field::Market => Span::raw(params.market.label()),
        Field::DataKind => Span::raw(params.data_kind.label()),
        Field::Live => {
            if app.controller.is_live() {
                Span::styled("ON", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD))
            } else {
                Span::styled("OFF", Style::default().fg(Color::DarkGray))
            }
        }
    };

    frame.render_widget(Paragraph::new(value).block(block), area);

    if editing && let Some(input) = app.focused_input() {
        let x = inner.x + (input.cursor() as u16).min(inner.width.saturating_sub(1));
        frame.set_cursor_position(Position::new(x, inner.y));
    }
}

fn placeholder(value: &str) -> Span<'_> {
    if value.is_empty() {
        Span::styled("YYYY-MM-DDTHH:MM", Style::default().fg(Color::DarkGray))
    } else {
        Span::raw(value)
    }
}
