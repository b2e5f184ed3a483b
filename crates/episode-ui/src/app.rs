//! Application state and event loop for the interactive report screen.

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Frame, Terminal};

use episode_data::report::Report;

use crate::chart_view;
use crate::table_view::{self, DailyRow};
use crate::themes::Theme;

// ── ViewMode ──────────────────────────────────────────────────────────────────

/// Which screen the TUI is currently rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    /// Daily bars plus the cumulative line.
    Chart,
    /// Per-date table with totals.
    Table,
}

impl ViewMode {
    /// Map a `--view` value to an interactive mode. `"summary"` and unknown
    /// values have none.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "chart" => Some(Self::Chart),
            "table" => Some(Self::Table),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Chart => Self::Table,
            Self::Table => Self::Chart,
        }
    }
}

// ── App ───────────────────────────────────────────────────────────────────────

/// Root state of the report screen.
pub struct App {
    pub theme: Theme,
    pub view_mode: ViewMode,
    /// Set to `true` to break out of the event loop on the next iteration.
    pub should_quit: bool,
}

impl App {
    pub fn new(theme_name: &str, view_mode: ViewMode) -> Self {
        Self {
            theme: Theme::from_name(theme_name),
            view_mode,
            should_quit: false,
        }
    }

    /// Show `report` until the user presses `q` or `Ctrl+C`.
    ///
    /// Polls crossterm with a 250 ms timeout on the current thread. `Tab`
    /// switches between the chart and the table.
    pub fn run(mut self, report: &Report) -> io::Result<()> {
        let rows = table_view::rows_from_report(report);

        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let tick_rate = Duration::from_millis(250);

        let result = loop {
            if let Err(e) = terminal.draw(|frame| self.render(frame, &rows, report)) {
                break Err(e);
            }

            match event::poll(tick_rate) {
                Ok(true) => match event::read() {
                    Ok(Event::Key(key)) => self.handle_key(key),
                    Ok(_) => {}
                    Err(e) => break Err(e),
                },
                Ok(false) => {}
                Err(e) => break Err(e),
            }

            if self.should_quit {
                break Ok(());
            }
        };

        // Restore the terminal even when drawing failed.
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    /// Apply one key press to the state.
    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind == KeyEventKind::Release {
            return;
        }
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
            }
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Tab => self.view_mode = self.view_mode.toggled(),
            _ => {}
        }
    }

    /// Render the current screen into `frame`.
    pub fn render(&self, frame: &mut Frame, rows: &[DailyRow], report: &Report) {
        let area = frame.area();

        if report.is_empty() {
            table_view::render_no_data(frame, area, report, &self.theme);
            return;
        }

        match self.view_mode {
            ViewMode::Chart => {
                chart_view::render_chart_view(frame, area, rows, report, &self.theme)
            }
            ViewMode::Table => {
                table_view::render_table_view(frame, area, rows, report, &self.theme)
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
