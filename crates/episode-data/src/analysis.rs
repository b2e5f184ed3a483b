//! End-to-end analysis pipeline.
//!
//! Loads every episode under a data directory, applies the metadata filter
//! and the date lower bound, groups the survivors by date and assembles the
//! [`Report`].

use std::path::PathBuf;

use episode_core::date_utils::TimezoneHandler;
use episode_core::filter::MetaFilter;
use episode_core::models::Episode;
use tracing::info;

use crate::aggregator::DailyAggregator;
use crate::loader::EpisodeRecord;
use crate::reader::load_episodes;
use crate::report::{Report, ReportBuilder};

// ── Public types ──────────────────────────────────────────────────────────────

/// Inputs of one analysis run.
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    pub data_dir: PathBuf,
    pub meta_filter: MetaFilter,
    /// Canonical `YYYY-MM-DD`; episodes dated earlier are dropped.
    pub date_from: Option<String>,
    /// IANA name or `"auto"`, used for the report timestamp.
    pub timezone: String,
}

impl AnalysisOptions {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            meta_filter: MetaFilter::default(),
            date_from: None,
            timezone: "auto".to_string(),
        }
    }
}

/// Metadata produced alongside the analysis result.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AnalysisMetadata {
    /// RFC 3339 timestamp when this result was generated.
    pub generated_at: String,
    pub files_scanned: usize,
    pub episodes_loaded: usize,
    /// Episodes that passed both the filter and the date bound.
    pub episodes_matched: usize,
    pub files_failed: usize,
    /// Wall-clock seconds spent reading and parsing metadata files.
    pub load_time_seconds: f64,
    /// Wall-clock seconds spent filtering, grouping and building the report.
    pub transform_time_seconds: f64,
}

/// The complete output of [`analyze_episodes`].
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    pub report: Report,
    /// Surviving episodes in ingestion order.
    pub records: Vec<EpisodeRecord>,
    pub metadata: AnalysisMetadata,
}

// ── Public function ───────────────────────────────────────────────────────────

/// Run the full analysis pipeline.
///
/// 1. Load every metadata file under `options.data_dir`.
/// 2. Keep episodes matching `options.meta_filter`.
/// 3. Drop episodes dated before `options.date_from`.
/// 4. Group by date and build the report.
///
/// Per-file failures end up in the report; the run itself never fails.
pub fn analyze_episodes(options: &AnalysisOptions) -> AnalysisResult {
    let tz = TimezoneHandler::new(&options.timezone);
    let generated_at = tz.now_rfc3339();

    // ── Step 1: Load ──────────────────────────────────────────────────────────
    let load_start = std::time::Instant::now();
    let outcome = load_episodes(&options.data_dir);
    let load_time = load_start.elapsed().as_secs_f64();
    let episodes_loaded = outcome.records.len();

    // ── Step 2-3: Filter and date bound ───────────────────────────────────────
    let transform_start = std::time::Instant::now();
    let date_from = options.date_from.as_deref();
    let records: Vec<EpisodeRecord> = outcome
        .records
        .into_iter()
        .filter(|r| options.meta_filter.matches(&r.episode))
        .filter(|r| DailyAggregator::within_bound(&r.episode, date_from))
        .collect();

    // ── Step 4: Aggregate and build ───────────────────────────────────────────
    let episodes: Vec<&Episode> = records.iter().map(|r| &r.episode).collect();
    let aggregate = DailyAggregator::aggregate(episodes.iter().copied(), date_from);

    let files_failed = outcome.failures.len();
    let report = ReportBuilder::new(&options.data_dir, generated_at.clone())
        .filter(options.meta_filter.clone())
        .date_from(options.date_from.clone())
        .subtask_types(outcome.subtask_types)
        .failures(outcome.failures)
        .build(&episodes, &aggregate);
    let transform_time = transform_start.elapsed().as_secs_f64();

    info!(
        "Analysed {} of {} episodes ({} files skipped)",
        records.len(),
        episodes_loaded,
        files_failed
    );

    let metadata = AnalysisMetadata {
        generated_at,
        files_scanned: outcome.files_scanned,
        episodes_loaded,
        episodes_matched: records.len(),
        files_failed,
        load_time_seconds: load_time,
        transform_time_seconds: transform_time,
    };

    AnalysisResult {
        report,
        records,
        metadata,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
