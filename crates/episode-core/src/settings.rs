use clap::{CommandFactory, Parser};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::date_utils::parse_date_bound;
use crate::error::Result;
use crate::filter::MetaFilter;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Duration and count statistics for recorded robot episodes
#[derive(Parser, Debug, Clone)]
#[command(
    name = "episode-stats",
    about = "Duration and count statistics for recorded robot episodes",
    version
)]
pub struct Settings {
    /// Directory containing one sub-directory per episode
    #[arg(long, default_value = "./data")]
    pub data_dir: PathBuf,

    /// Metadata filter as KEY=VALUE (repeatable, all must match)
    #[arg(long = "filter", value_name = "KEY=VALUE", num_args = 1..)]
    pub filters: Vec<String>,

    /// Only aggregate episodes recorded on or after this date (YYYY-MM-DD)
    #[arg(long)]
    pub date_from: Option<String>,

    /// Where to write the JSON report
    #[arg(long, default_value = "analysis_result.json")]
    pub output: PathBuf,

    /// Presentation after the report is written
    #[arg(long, default_value = "summary", value_parser = ["summary", "chart", "table"])]
    pub view: String,

    /// Display theme for the chart and table views
    #[arg(long, default_value = "auto", value_parser = ["light", "dark", "classic", "auto"])]
    pub theme: String,

    /// Timezone for the report timestamp (auto-detected if not specified)
    #[arg(long, default_value = "auto")]
    pub timezone: String,

    /// Print per-episode details (meta, instructions, segment statistics)
    #[arg(long, short = 'v')]
    pub verbose: bool,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Clear saved configuration
    #[arg(long)]
    pub clear: bool,
}

// ── LastUsedParams ─────────────────────────────────────────────────────────────

/// Presentation parameters persisted to `~/.episode-stats/last_used.json`.
///
/// Analysis inputs (data directory, filters, date bound) are never
/// persisted, so a run only depends on what is passed to it.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct LastUsedParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

impl LastUsedParams {
    /// Return the default path to the persisted config file.
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// Return the config path rooted at `base_dir` (used for testing).
    pub fn config_path_in(base_dir: &std::path::Path) -> PathBuf {
        base_dir.join(".episode-stats").join("last_used.json")
    }

    /// Load persisted params from an explicit path.
    ///
    /// Returns `Default` when the file is absent or cannot be parsed.
    pub fn load_from(path: &std::path::Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&content).unwrap_or_default()
    }

    /// Atomically write params to an explicit path.
    pub fn save_to(&self, path: &std::path::Path) -> std::result::Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, path)?;

        Ok(())
    }

    /// Delete the config file at an explicit path if it exists.
    pub fn clear_at(path: &std::path::Path) -> std::result::Result<(), std::io::Error> {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse CLI arguments, merge with last-used params where no explicit CLI
    /// value was provided, and persist the result.
    pub fn load_with_last_used() -> Self {
        Self::load_with_last_used_impl(
            std::env::args_os().collect(),
            &LastUsedParams::config_path(),
        )
    }

    /// Full implementation – accepts args and an explicit config path so that
    /// tests can redirect to a temporary directory.
    pub fn load_with_last_used_impl(
        args: Vec<std::ffi::OsString>,
        config_path: &std::path::Path,
    ) -> Self {
        // Raw matches are needed to query ValueSource.
        let matches = Settings::command().get_matches_from(args.clone());
        let mut settings = Settings::parse_from(args);

        if settings.clear {
            let _ = LastUsedParams::clear_at(config_path);
            return Self::apply_debug_flag(settings);
        }

        let last = LastUsedParams::load_from(config_path);

        // CLI always wins over persisted values.
        for (name, slot, persisted) in [
            ("view", &mut settings.view, last.view),
            ("theme", &mut settings.theme, last.theme),
            ("timezone", &mut settings.timezone, last.timezone),
        ] {
            if let Some(value) = persisted.filter(|_| !is_arg_explicitly_set(&matches, name)) {
                *slot = value;
            }
        }

        settings = Self::apply_debug_flag(settings);

        let params = LastUsedParams::from(&settings);
        if let Err(e) = params.save_to(config_path) {
            tracing::debug!("Could not persist last-used params: {}", e);
        }

        settings
    }

    /// The metadata filter described by the `--filter` tokens.
    pub fn meta_filter(&self) -> MetaFilter {
        MetaFilter::from_tokens(&self.filters)
    }

    /// The validated, zero-padded `--date-from` bound.
    pub fn date_bound(&self) -> Result<Option<String>> {
        self.date_from.as_deref().map(parse_date_bound).transpose()
    }

    /// `--debug` overrides the log level.
    fn apply_debug_flag(mut settings: Settings) -> Settings {
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }
}

// ── Conversion ─────────────────────────────────────────────────────────────────

impl From<&Settings> for LastUsedParams {
    fn from(s: &Settings) -> Self {
        LastUsedParams {
            view: Some(s.view.clone()),
            theme: Some(s.theme.clone()),
            timezone: Some(s.timezone.clone()),
        }
    }
}

/// Returns `true` when `name` was supplied explicitly on the command line
/// (not via default value or environment variable).
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(clap::parser::ValueSource::CommandLine)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
