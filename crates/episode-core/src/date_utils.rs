use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use tracing::warn;

use crate::error::{Result, StatsError};

/// Canonical, zero-padded date format used for every date key.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// ── System timezone detection ─────────────────────────────────────────────────

/// Detect the IANA timezone name of the running system.
///
/// Falls back to `"UTC"` if detection fails.
pub fn get_system_timezone() -> String {
    iana_time_zone::get_timezone().unwrap_or_else(|_| "UTC".to_string())
}

// ── DateExtractor ─────────────────────────────────────────────────────────────

/// Derives the recording date from an episode folder name.
///
/// Folder names are hyphen-delimited with the date spread over the third to
/// fifth tokens as `yy-mm-dd`, e.g. `run-abc-24-06-01-x` → `2024-06-01`.
pub struct DateExtractor;

impl DateExtractor {
    /// Minimum number of hyphen-delimited tokens a dated folder name has.
    const MIN_TOKENS: usize = 6;

    /// Extract `YYYY-MM-DD` from `folder_name`, or `None` when the name does
    /// not follow the convention or encodes an impossible date.
    pub fn from_folder_name(folder_name: &str) -> Option<String> {
        let tokens: Vec<&str> = folder_name.split('-').collect();
        if tokens.len() < Self::MIN_TOKENS {
            return None;
        }

        // Single-digit parts are zero-padded, so `24-6-1` reads as 2024-06-01.
        let mut compact = String::with_capacity(6);
        for part in &tokens[2..5] {
            if part.is_empty() {
                return None;
            }
            compact.push_str(&format!("{part:0>2}"));
        }
        NaiveDate::parse_from_str(&compact, "%y%m%d")
            .ok()
            .map(|date| date.format(DATE_FORMAT).to_string())
    }

    /// Extract the date from the folder that contains `path`.
    ///
    /// The file name itself is never consulted.
    pub fn from_source_path(path: &Path) -> Option<String> {
        path.parent()
            .and_then(Path::file_name)
            .and_then(|name| name.to_str())
            .and_then(Self::from_folder_name)
    }
}

// ── Date bound ────────────────────────────────────────────────────────────────

/// Validate a `--date-from` value and return it in canonical zero-padded form.
///
/// Lexicographic comparison against episode dates is only sound for the
/// canonical form, so `2024-6-1` is normalised to `2024-06-01`.
pub fn parse_date_bound(value: &str) -> Result<String> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map(|date| date.format(DATE_FORMAT).to_string())
        .map_err(|_| StatsError::InvalidDateBound(value.to_string()))
}

// ── TimezoneHandler ───────────────────────────────────────────────────────────

/// Renders report timestamps in a configured timezone.
pub struct TimezoneHandler {
    tz: Tz,
}

impl TimezoneHandler {
    /// Create a handler for the given IANA timezone name.
    ///
    /// `"auto"` resolves to the system timezone. Unrecognised names fall
    /// back to UTC and log a warning.
    pub fn new(tz_name: &str) -> Self {
        let resolved = if tz_name == "auto" {
            get_system_timezone()
        } else {
            tz_name.to_string()
        };
        let tz = resolved.parse::<Tz>().unwrap_or_else(|_| {
            warn!(
                "TimezoneHandler: unrecognised timezone \"{}\", falling back to UTC",
                resolved
            );
            Tz::UTC
        });
        Self { tz }
    }

    /// RFC 3339 rendering of `dt` in the handler's timezone.
    pub fn format_rfc3339(&self, dt: DateTime<Utc>) -> String {
        dt.with_timezone(&self.tz).to_rfc3339()
    }

    /// RFC 3339 rendering of the current instant.
    pub fn now_rfc3339(&self) -> String {
        self.format_rfc3339(Utc::now())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
