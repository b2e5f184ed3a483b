//! Report assembly and persistence.

use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;
use std::path::{Path, PathBuf};

use episode_core::calculations::seconds_to_hours;
use episode_core::error::Result;
use episode_core::filter::MetaFilter;
use episode_core::models::Episode;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::aggregator::DailyAggregate;
use crate::reader::LoadFailure;

// ── Report ────────────────────────────────────────────────────────────────────

/// The summary of one analysis run, as persisted to JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub total_duration_sec: f64,
    pub total_duration_hours: f64,
    pub total_segments: usize,
    pub total_suboptimal_segments: usize,
    pub unique_hsr_ids: Vec<String>,
    pub unique_locations: Vec<String>,
    pub date_counts: BTreeMap<String, usize>,
    /// Aligned with [`Report::dates`].
    pub cumulative_counts: Vec<usize>,
    pub source_files: Vec<String>,
    pub filter_conditions: MetaFilter,
    pub date_from: Option<String>,
    pub analyzed_at: String,
    pub data_dir: String,
    pub subtask_types: Vec<String>,
    /// Sorted date axis.
    pub dates: Vec<String>,
    pub date_hours: BTreeMap<String, f64>,
    pub cumulative_hours: Vec<f64>,
    pub total_episodes: usize,
    /// Episodes counted in the totals but absent from the date axis.
    pub undated_episodes: usize,
    pub failed_files: Vec<LoadFailure>,
}

impl Report {
    pub fn is_empty(&self) -> bool {
        self.total_episodes == 0
    }
}

// ── ReportBuilder ─────────────────────────────────────────────────────────────

/// Assembles a [`Report`] from surviving episodes and run provenance.
#[derive(Debug, Clone)]
pub struct ReportBuilder {
    data_dir: PathBuf,
    filter: MetaFilter,
    date_from: Option<String>,
    analyzed_at: String,
    subtask_types: BTreeSet<String>,
    failures: Vec<LoadFailure>,
}

impl ReportBuilder {
    pub fn new(data_dir: impl Into<PathBuf>, analyzed_at: impl Into<String>) -> Self {
        Self {
            data_dir: data_dir.into(),
            filter: MetaFilter::default(),
            date_from: None,
            analyzed_at: analyzed_at.into(),
            subtask_types: BTreeSet::new(),
            failures: Vec::new(),
        }
    }

    pub fn filter(mut self, filter: MetaFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn date_from(mut self, date_from: Option<String>) -> Self {
        self.date_from = date_from;
        self
    }

    /// Subtask labels seen across all ingested documents.
    pub fn subtask_types(mut self, subtask_types: BTreeSet<String>) -> Self {
        self.subtask_types = subtask_types;
        self
    }

    pub fn failures(mut self, failures: Vec<LoadFailure>) -> Self {
        self.failures = failures;
        self
    }

    /// Build the report for `episodes`, which must be the same set that
    /// produced `aggregate`.
    pub fn build(&self, episodes: &[&Episode], aggregate: &DailyAggregate) -> Report {
        let total_duration_sec: f64 = episodes.iter().map(|e| e.total_time).sum();

        let unique_hsr_ids: BTreeSet<&str> = episodes.iter().map(|e| e.hsr_id.as_str()).collect();
        let unique_locations: BTreeSet<Cow<'_, str>> =
            episodes.iter().map(|e| e.location_name.text()).collect();

        Report {
            total_duration_sec,
            total_duration_hours: seconds_to_hours(total_duration_sec),
            total_segments: episodes.iter().map(|e| e.total_segments).sum(),
            total_suboptimal_segments: episodes.iter().map(|e| e.suboptimal_segments).sum(),
            unique_hsr_ids: unique_hsr_ids.into_iter().map(str::to_string).collect(),
            unique_locations: unique_locations.into_iter().map(Cow::into_owned).collect(),
            date_counts: aggregate.date_counts(),
            cumulative_counts: aggregate.cumulative_counts(),
            source_files: episodes
                .iter()
                .map(|e| {
                    self.data_dir
                        .join(e.bag_path.text().as_ref())
                        .to_string_lossy()
                        .into_owned()
                })
                .collect(),
            filter_conditions: self.filter.clone(),
            date_from: self.date_from.clone(),
            analyzed_at: self.analyzed_at.clone(),
            data_dir: self.data_dir.to_string_lossy().into_owned(),
            subtask_types: self.subtask_types.iter().cloned().collect(),
            dates: aggregate.sorted_dates(),
            date_hours: aggregate.date_hours(),
            cumulative_hours: aggregate.cumulative_hours(),
            total_episodes: episodes.len(),
            undated_episodes: aggregate.undated.count,
            failed_files: self.failures.clone(),
        }
    }
}

// ── Persistence ───────────────────────────────────────────────────────────────

/// Write `report` to `path` as pretty-printed JSON.
///
/// Parent directories are created. The file is written to a sibling temp
/// file first and renamed into place.
pub fn write_report(report: &Report, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(report)?;
    let tmp = path.with_extension("json.tmp");
    {
        let mut file = std::fs::File::create(&tmp)?;
        file.write_all(json.as_bytes())?;
        file.write_all(b"\n")?;
        file.flush()?;
    }
    std::fs::rename(&tmp, path)?;

    debug!("Report written to {}", path.display());
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::DailyAggregator;
    use episode_core::models::MetaValue;
    use serde_json::json;
    use tempfile::TempDir;

    fn read_back(path: &Path) -> Report {
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
    }

    fn make_episode(date: Option<&str>, location: &str, hsr_id: &str, total_time: f64) -> Episode {
        Episode {
            date: date.map(str::to_string),
            total_time,
            mean_duration: total_time / 2.0,
            max_duration: total_time / 2.0,
            min_duration: total_time / 2.0,
            total_segments: 2,
            suboptimal_segments: 1,
            bag_path: format!("{location}/{hsr_id}.bag").into(),
            hsr_id: hsr_id.to_string(),
            version: "1".into(),
            location_name: location.into(),
            interface: MetaValue::default(),
            git_branch: MetaValue::default(),
            git_hash: MetaValue::default(),
        }
    }

    fn build(episodes: &[Episode], builder: &ReportBuilder) -> Report {
        let refs: Vec<&Episode> = episodes.iter().collect();
        let aggregate = DailyAggregator::aggregate(refs.iter().copied(), None);
        builder.build(&refs, &aggregate)
    }

    // ── build ─────────────────────────────────────────────────────────────────

    #[test]
    fn test_build_totals() {
        let episodes = vec![
            make_episode(Some("2024-06-01"), "siteB", "2", 3600.0),
            make_episode(Some("2024-06-01"), "siteA", "1", 3600.0),
            make_episode(Some("2024-06-02"), "siteA", "1", 3600.0),
        ];
        let report = build(&episodes, &ReportBuilder::new("/data", "2024-06-03T00:00:00+00:00"));

        assert_eq!(report.total_duration_sec, 10_800.0);
        assert_eq!(report.total_duration_hours, 3.0);
        assert_eq!(report.total_segments, 6);
        assert_eq!(report.total_suboptimal_segments, 3);
        assert_eq!(report.unique_hsr_ids, vec!["1", "2"]);
        assert_eq!(report.unique_locations, vec!["siteA", "siteB"]);
        assert_eq!(report.cumulative_counts, vec![2, 3]);
        assert_eq!(report.dates, vec!["2024-06-01", "2024-06-02"]);
        assert_eq!(report.total_episodes, 3);
    }

    #[test]
    fn test_build_source_files_in_input_order() {
        let episodes = vec![
            make_episode(Some("2024-06-02"), "siteB", "2", 10.0),
            make_episode(Some("2024-06-01"), "siteA", "1", 10.0),
        ];
        let report = build(&episodes, &ReportBuilder::new("/data", "now"));
        assert_eq!(
            report.source_files,
            vec!["/data/siteB/2.bag".to_string(), "/data/siteA/1.bag".to_string()]
        );
        assert_eq!(report.data_dir, "/data");
    }

    #[test]
    fn test_build_empty_strings_kept_in_unique_sets() {
        let episodes = vec![
            make_episode(None, "", "", 10.0),
            make_episode(None, "siteA", "1", 10.0),
        ];
        let report = build(&episodes, &ReportBuilder::new("/data", "now"));
        assert_eq!(report.unique_hsr_ids, vec!["", "1"]);
        assert_eq!(report.unique_locations, vec!["", "siteA"]);
        assert_eq!(report.undated_episodes, 2);
        assert!(report.date_counts.is_empty());
    }

    #[test]
    fn test_build_zero_episodes() {
        let report = build(&[], &ReportBuilder::new("/data", "now"));

        assert!(report.is_empty());
        assert_eq!(report.total_duration_sec, 0.0);
        assert_eq!(report.total_duration_hours, 0.0);
        assert_eq!(report.total_segments, 0);
        assert!(report.date_counts.is_empty());
        assert!(report.cumulative_counts.is_empty());
        assert!(report.source_files.is_empty());
        assert!(report.unique_hsr_ids.is_empty());
    }

    #[test]
    fn test_build_provenance() {
        let builder = ReportBuilder::new("/data", "2024-06-03T09:00:00+09:00")
            .filter(MetaFilter::from_tokens(["location_name=siteA"]))
            .date_from(Some("2024-06-01".to_string()))
            .subtask_types(["navigate".to_string(), "grasp".to_string()].into_iter().collect())
            .failures(vec![LoadFailure {
                path: "/data/x/meta.json".to_string(),
                reason: "episode has no segments".to_string(),
            }]);
        let report = build(&[], &builder);

        assert_eq!(report.date_from.as_deref(), Some("2024-06-01"));
        assert_eq!(report.analyzed_at, "2024-06-03T09:00:00+09:00");
        assert_eq!(report.subtask_types, vec!["grasp", "navigate"]);
        assert_eq!(report.failed_files.len(), 1);
        assert_eq!(report.filter_conditions.len(), 1);
    }

    // ── Serialisation ─────────────────────────────────────────────────────────

    #[test]
    fn test_report_json_shape() {
        let episodes = vec![make_episode(Some("2024-06-01"), "siteA", "1", 7200.0)];
        let report = build(&episodes, &ReportBuilder::new("/data", "now"));
        let value = serde_json::to_value(&report).unwrap();

        assert_eq!(value["date_counts"], json!({"2024-06-01": 1}));
        assert_eq!(value["filter_conditions"], json!({}));
        assert_eq!(value["date_from"], json!(null));
        assert_eq!(value["total_duration_hours"], json!(2.0));
        assert_eq!(value["failed_files"], json!([]));
    }

    // ── write_report ──────────────────────────────────────────────────────────

    #[test]
    fn test_write_report_creates_parents_and_reads_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out").join("analysis_result.json");
        let episodes = vec![make_episode(Some("2024-06-01"), "siteA", "1", 3600.0)];
        let report = build(&episodes, &ReportBuilder::new("/data", "now"));

        write_report(&report, &path).unwrap();

        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());
        assert_eq!(read_back(&path), report);
    }

    #[test]
    fn test_write_report_is_pretty_printed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("analysis_result.json");
        let report = build(&[], &ReportBuilder::new("/data", "now"));

        write_report(&report, &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("{\n  \""));
    }

    #[test]
    fn test_write_report_overwrites() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("analysis_result.json");
        std::fs::write(&path, "stale").unwrap();

        let report = build(&[], &ReportBuilder::new("/data", "now"));
        write_report(&report, &path).unwrap();

        assert_eq!(read_back(&path).total_episodes, 0);
    }
}
