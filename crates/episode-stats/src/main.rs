mod bootstrap;

use std::io::Write;

use anyhow::{Context, Result};
use episode_core::settings::Settings;
use episode_data::analysis::{analyze_episodes, AnalysisOptions};
use episode_data::report::write_report;
use episode_ui::app::{App, ViewMode};
use episode_ui::console::{self, ConsoleOptions};

fn main() -> Result<()> {
    let settings = Settings::load_with_last_used();

    bootstrap::ensure_directories()?;
    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_ref())?;

    tracing::info!("episode-stats v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Data dir: {}, View: {}, Theme: {}",
        settings.data_dir.display(),
        settings.view,
        settings.theme
    );

    let options = AnalysisOptions {
        data_dir: settings.data_dir.clone(),
        meta_filter: settings.meta_filter(),
        date_from: settings.date_bound()?,
        timezone: settings.timezone.clone(),
    };

    let result = analyze_episodes(&options);
    tracing::debug!(
        "Load {:.3}s, transform {:.3}s",
        result.metadata.load_time_seconds,
        result.metadata.transform_time_seconds
    );

    write_report(&result.report, &settings.output)
        .with_context(|| format!("writing report to {}", settings.output.display()))?;

    {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        console::print_analysis(
            &mut out,
            &result,
            ConsoleOptions {
                verbose: settings.verbose,
            },
        )?;
        writeln!(out)?;
        writeln!(out, "Report written to {}", settings.output.display())?;
    }

    if let Some(view_mode) = ViewMode::from_name(&settings.view) {
        tracing::info!("Opening {} view", settings.view);
        App::new(&settings.theme, view_mode).run(&result.report)?;
    }

    Ok(())
}
