//! Per-date table view.
//!
//! Renders a bordered [`ratatui::widgets::Table`] with one row per recording
//! date plus a highlighted totals row at the bottom.

use ratatui::{
    layout::{Constraint, Rect},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use episode_core::formatting;
use episode_data::report::Report;

use crate::themes::Theme;

/// One date on the report's date axis.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyRow {
    pub date: String,
    pub count: usize,
    pub hours: f64,
    pub cumulative_count: usize,
    pub cumulative_hours: f64,
}

/// Zip the report's per-date maps and cumulative series into rows.
pub fn rows_from_report(report: &Report) -> Vec<DailyRow> {
    report
        .dates
        .iter()
        .enumerate()
        .map(|(i, date)| DailyRow {
            date: date.clone(),
            count: report.date_counts.get(date).copied().unwrap_or(0),
            hours: report.date_hours.get(date).copied().unwrap_or(0.0),
            cumulative_count: report.cumulative_counts.get(i).copied().unwrap_or(0),
            cumulative_hours: report.cumulative_hours.get(i).copied().unwrap_or(0.0),
        })
        .collect()
}

/// Render the per-date table into `area`.
pub fn render_table_view(
    frame: &mut Frame,
    area: Rect,
    rows: &[DailyRow],
    report: &Report,
    theme: &Theme,
) {
    let header = Row::new(
        ["Date", "Episodes", "Hours", "Cum. Episodes", "Cum. Hours"]
            .iter()
            .map(|h| Cell::from(*h).style(theme.table_header)),
    )
    .height(1);

    let mut all_rows: Vec<Row> = rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            Row::new(vec![
                Cell::from(row.date.clone()),
                Cell::from(formatting::format_number(row.count as f64, 0)),
                Cell::from(formatting::format_number(row.hours, 2)),
                Cell::from(formatting::format_number(row.cumulative_count as f64, 0)),
                Cell::from(formatting::format_number(row.cumulative_hours, 2)),
            ])
            .style(theme.row_style(i))
        })
        .collect();

    if report.undated_episodes > 0 {
        all_rows.push(
            Row::new(vec![
                Cell::from("(undated)"),
                Cell::from(formatting::format_number(report.undated_episodes as f64, 0)),
                Cell::from(""),
                Cell::from(""),
                Cell::from(""),
            ])
            .style(theme.dim),
        );
    }

    all_rows.push(
        Row::new(vec![
            Cell::from("TOTAL"),
            Cell::from(formatting::format_number(report.total_episodes as f64, 0)),
            Cell::from(formatting::format_number(report.total_duration_hours, 2)),
            Cell::from(format!("{} days", rows.len())),
            Cell::from(formatting::format_duration(report.total_duration_sec)),
        ])
        .style(theme.table_total),
    );

    let widths = [
        Constraint::Length(12),
        Constraint::Length(10),
        Constraint::Length(10),
        Constraint::Length(15),
        Constraint::Length(18),
    ];

    let table = Table::new(all_rows, widths)
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.border)
                .title(Span::styled(" Episodes per Day ", theme.title)),
        )
        .style(theme.text);

    frame.render_widget(table, area);
}

/// Render a placeholder when the report has no episodes.
pub fn render_no_data(frame: &mut Frame, area: Rect, report: &Report, theme: &Theme) {
    let text = vec![
        Line::from(""),
        Line::from(Span::styled("No episodes matched", theme.warning)),
        Line::from(""),
        Line::from(Span::styled(
            format!("Data directory: {}", report.data_dir),
            theme.dim,
        )),
        Line::from(Span::styled("Press 'q' or Ctrl+C to exit", theme.dim)),
    ];
    frame.render_widget(
        Paragraph::new(Text::from(text)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.border)
                .title(Span::styled(" Episode Stats ", theme.title)),
        ),
        area,
    );
}

// ── Tests ─────────────────────────────────────────────────────────────────────
