//! Metadata file discovery and loading.
//!
//! Episodes live one folder each under a data directory
//! (`<data_dir>/<episode-folder>/<metadata>.json`). Every file is read and
//! parsed on its own; a bad file is reported and skipped without stopping the
//! run.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use episode_core::error::{Result, StatsError};
use episode_core::models::subtask_labels;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::loader::{EpisodeRecord, RecordLoader};

// ── Public types ──────────────────────────────────────────────────────────────

/// One metadata file that could not be turned into an episode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadFailure {
    pub path: String,
    pub reason: String,
}

impl LoadFailure {
    fn from_error(path: &Path, error: &StatsError) -> Self {
        let reason = match error {
            StatsError::MalformedDocument { reason, .. } => reason.clone(),
            StatsError::EmptyEpisode { .. } => "episode has no segments".to_string(),
            StatsError::FileRead { source, .. } => source.to_string(),
            other => other.to_string(),
        };
        Self {
            path: path.to_string_lossy().into_owned(),
            reason,
        }
    }
}

/// Everything ingested from one data directory.
#[derive(Debug, Clone, Default)]
pub struct LoadOutcome {
    /// Successfully derived episodes, in file path order.
    pub records: Vec<EpisodeRecord>,
    /// Files that were skipped, in file path order.
    pub failures: Vec<LoadFailure>,
    /// Subtask labels from every document that parsed as JSON, including
    /// documents whose episode could not be derived.
    pub subtask_types: BTreeSet<String>,
    pub files_scanned: usize,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Find every `*.json` file exactly one folder below `data_dir`, sorted by
/// path. Hidden folders and files are skipped.
pub fn find_metadata_files(data_dir: &Path) -> Vec<PathBuf> {
    if !data_dir.exists() {
        warn!("Data directory does not exist: {}", data_dir.display());
        return Vec::new();
    }

    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(data_dir)
        .follow_links(true)
        .max_depth(2)
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry.file_name()))
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.depth() == 2
                && entry.file_type().is_file()
                && entry
                    .path()
                    .extension()
                    .map(|ext| ext == "json")
                    .unwrap_or(false)
        })
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    files
}

/// Read and parse one metadata file as untyped JSON.
pub fn read_document(path: &Path) -> Result<serde_json::Value> {
    let content = std::fs::read_to_string(path).map_err(|source| StatsError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|e| StatsError::malformed(path, e.to_string()))
}

/// Load every episode under `data_dir`.
///
/// Per-file failures are logged and collected in
/// [`LoadOutcome::failures`]; they never abort the load.
pub fn load_episodes(data_dir: &Path) -> LoadOutcome {
    let files = find_metadata_files(data_dir);
    if files.is_empty() {
        warn!("No metadata files found in {}", data_dir.display());
    }

    let mut outcome = LoadOutcome {
        files_scanned: files.len(),
        ..Default::default()
    };

    for path in &files {
        let document = match read_document(path) {
            Ok(doc) => doc,
            Err(e) => {
                warn!("Skipping {}", e);
                outcome.failures.push(LoadFailure::from_error(path, &e));
                continue;
            }
        };

        outcome.subtask_types.extend(subtask_labels(&document));

        match RecordLoader::from_value(path, document) {
            Ok(record) => {
                if record.episode.date.is_none() {
                    debug!(
                        "No date in folder name for {}; excluded from the date axis",
                        path.display()
                    );
                }
                outcome.records.push(record);
            }
            Err(e) => {
                warn!("Skipping {}", e);
                outcome.failures.push(LoadFailure::from_error(path, &e));
            }
        }
    }

    debug!(
        "Loaded {} episodes from {} files ({} skipped)",
        outcome.records.len(),
        outcome.files_scanned,
        outcome.failures.len()
    );

    outcome
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_str().map(|s| s.starts_with('.')).unwrap_or(false)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
