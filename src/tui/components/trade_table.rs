//! Buy and sell columns built from the feed buffer.

use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::feed::is_large;
use crate::models::{OrderSide, TradeRecord};
use crate::tui::app::App;

/// Renders the trades panel.
pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let controller = &app.controller;
    let title = format!(
        " {} {} {} ",
        controller.params().symbol.label(),
        controller.params().market.label(),
        controller.params().data_kind.label()
    );
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let columns = Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(inner);

    let buffer = controller.buffer();
    let buys: Vec<&TradeRecord> = buffer.buys().collect();
    let sells: Vec<&TradeRecord> = buffer.sells().collect();

    render_column(frame, columns[0], OrderSide::Buy, Color::Green, &buys);
    render_column(frame, columns[1], OrderSide::Sell, Color::Red, &sells);
}

/// Renders a single column (buy or sell), newest first.
fn render_column(
    frame: &mut Frame,
    area: Rect,
    side: OrderSide,
    color: Color,
    records: &[&TradeRecord],
) {
    let mut lines: Vec<Line> = Vec::new();

    lines.push(Line::from(vec![Span::styled(
        format!(
            " {:^width$}",
            side.label().to_uppercase(),
            width = area.width.saturating_sub(2) as usize
        ),
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    )]));

    lines.push(Line::from(vec![Span::styled(
        format!(
            " {:<16}  {:<12}  {:>10}  {:>10}  {:<8}  {:<4}",
            "Time", "Symbol", "Price", "Quantity", "Side", "Mkt"
        ),
        Style::default().fg(Color::DarkGray),
    )]));

    let max_rows = area.height.saturating_sub(2) as usize;
    for (index, record) in records.iter().take(max_rows).enumerate() {
        lines.push(row(record, index, color));
    }

    if records.is_empty() {
        lines.push(Line::from(Span::styled(
            " No records",
            Style::default().fg(Color::DarkGray),
        )));
    }

    frame.render_widget(Paragraph::new(lines), area);
}

fn row<'a>(record: &TradeRecord, index: usize, color: Color) -> Line<'a> {
    let time = record
        .time()
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| record.timestamp.to_string());
    let side = record
        .side
        .map(|s| format!("{}-{}", s.label(), index + 1))
        .unwrap_or_default();
    let marker = if is_large(record) {
        Span::styled("●", Style::default().fg(Color::Green))
    } else {
        Span::raw(" ")
    };

    Line::from(vec![
        Span::raw(format!(
            " {:<16}  {:<12}  {:>10}  ",
            time, record.symbol, record.price
        )),
        marker,
        Span::raw(format!("{:>9}  ", record.quantity)),
        Span::styled(format!("{:<8}", side), Style::default().fg(color)),
        Span::raw(format!("  {:<4}", record.market.label())),
    ])
}
