//! Daily episode chart: a bar per recording date with the cumulative count
//! drawn as a line underneath on the same date axis.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    symbols,
    text::{Line, Span},
    widgets::{Axis, BarChart, Block, Borders, Chart, Dataset, GraphType, Paragraph},
    Frame,
};

use episode_core::formatting;
use episode_data::report::Report;

use crate::table_view::DailyRow;
use crate::themes::Theme;

const BAR_GAP: u16 = 1;
const MIN_BAR_WIDTH: u16 = 3;
const MAX_BAR_WIDTH: u16 = 10;

/// Short `MM-DD` label for a `YYYY-MM-DD` date.
pub fn short_date(date: &str) -> &str {
    date.get(5..).filter(|s| !s.is_empty()).unwrap_or(date)
}

/// Widest bar that fits `bars` bars into `width` columns.
pub fn bar_width(width: u16, bars: usize) -> u16 {
    if bars == 0 {
        return MAX_BAR_WIDTH;
    }
    let bars = u16::try_from(bars).unwrap_or(u16::MAX);
    let per_bar = width.saturating_sub(2) / bars;
    per_bar
        .saturating_sub(BAR_GAP)
        .clamp(MIN_BAR_WIDTH, MAX_BAR_WIDTH)
}

/// Render the summary line, the daily bars and the cumulative line.
pub fn render_chart_view(
    frame: &mut Frame,
    area: Rect,
    rows: &[DailyRow],
    report: &Report,
    theme: &Theme,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Percentage(55),
            Constraint::Min(6),
        ])
        .split(area);

    render_summary(frame, chunks[0], report, theme);
    render_daily_bars(frame, chunks[1], rows, theme);
    render_cumulative_line(frame, chunks[2], rows, theme);
}

fn render_summary(frame: &mut Frame, area: Rect, report: &Report, theme: &Theme) {
    let line = Line::from(vec![
        Span::styled("Total: ", theme.label),
        Span::styled(
            format!("{} h", formatting::format_number(report.total_duration_hours, 2)),
            theme.value,
        ),
        Span::styled("   Episodes: ", theme.label),
        Span::styled(report.total_episodes.to_string(), theme.value),
        Span::styled("   Segments: ", theme.label),
        Span::styled(
            format!(
                "{} ({} suboptimal)",
                report.total_segments, report.total_suboptimal_segments
            ),
            theme.value,
        ),
        Span::styled("   [Tab] table  [q] quit", theme.dim),
    ]);
    frame.render_widget(
        Paragraph::new(line).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.border)
                .title(Span::styled(" Episode Stats ", theme.title)),
        ),
        area,
    );
}

fn render_daily_bars(frame: &mut Frame, area: Rect, rows: &[DailyRow], theme: &Theme) {
    let data: Vec<(&str, u64)> = rows
        .iter()
        .map(|row| (short_date(&row.date), row.count as u64))
        .collect();

    let chart = BarChart::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.border)
                .title(Span::styled(" Episodes per Day ", theme.title)),
        )
        .data(data.as_slice())
        .bar_width(bar_width(area.width, rows.len()))
        .bar_gap(BAR_GAP)
        .bar_style(theme.bar)
        .value_style(theme.bar_value)
        .label_style(theme.axis);

    frame.render_widget(chart, area);
}

fn render_cumulative_line(frame: &mut Frame, area: Rect, rows: &[DailyRow], theme: &Theme) {
    let points: Vec<(f64, f64)> = rows
        .iter()
        .enumerate()
        .map(|(i, row)| (i as f64, row.cumulative_count as f64))
        .collect();

    let x_max = rows.len().saturating_sub(1).max(1) as f64;
    let y_max = rows
        .last()
        .map(|row| row.cumulative_count as f64)
        .unwrap_or(0.0)
        .max(1.0);

    let x_labels: Vec<Span> = match (rows.first(), rows.last()) {
        (Some(first), Some(last)) => vec![
            Span::raw(short_date(&first.date).to_string()),
            Span::raw(short_date(&last.date).to_string()),
        ],
        _ => Vec::new(),
    };

    let dataset = Dataset::default()
        .name("cumulative")
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(theme.cumulative)
        .data(&points);

    let chart = Chart::new(vec![dataset])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.border)
                .title(Span::styled(" Cumulative Episodes ", theme.title)),
        )
        .x_axis(
            Axis::default()
                .style(theme.axis)
                .bounds([0.0, x_max])
                .labels(x_labels),
        )
        .y_axis(
            Axis::default()
                .style(theme.axis)
                .bounds([0.0, y_max])
                .labels(vec![
                    Span::raw("0"),
                    Span::raw(formatting::format_number(y_max, 0)),
                ]),
        );

    frame.render_widget(chart, area);
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table_view::rows_from_report;
    use crate::table_view::tests::{empty_report, make_report};
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    #[test]
    fn test_short_date() {
        assert_eq!(short_date("2024-06-01"), "06-01");
        assert_eq!(short_date("bad"), "bad");
        assert_eq!(short_date("2024-"), "2024-");
    }

    #[test]
    fn test_bar_width_bounds() {
        assert_eq!(bar_width(80, 0), MAX_BAR_WIDTH);
        assert_eq!(bar_width(200, 2), MAX_BAR_WIDTH);
        assert_eq!(bar_width(40, 100), MIN_BAR_WIDTH);
        // 62 usable columns over 10 bars: 6 per bar, minus the gap.
        assert_eq!(bar_width(64, 10), 5);
    }

    #[test]
    fn test_render_chart_view_shows_titles() {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        let theme = Theme::dark();
        let report = make_report();
        let rows = rows_from_report(&report);

        terminal
            .draw(|frame| {
                let area = frame.area();
                render_chart_view(frame, area, &rows, &report, &theme);
            })
            .unwrap();

        let text: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect();
        assert!(text.contains("Episodes per Day"));
        assert!(text.contains("Cumulative Episodes"));
        assert!(text.contains("06-01"));
    }

    #[test]
    fn test_render_chart_view_empty_does_not_panic() {
        let mut terminal = Terminal::new(TestBackend::new(40, 12)).unwrap();
        let theme = Theme::light();
        let report = empty_report();

        terminal
            .draw(|frame| {
                let area = frame.area();
                render_chart_view(frame, area, &[], &report, &theme);
            })
            .unwrap();
    }
}
