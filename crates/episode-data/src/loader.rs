//! Conversion of raw metadata documents into [`Episode`] records.

use std::path::{Path, PathBuf};

use episode_core::calculations::DurationStats;
use episode_core::date_utils::DateExtractor;
use episode_core::error::{Result, StatsError};
use episode_core::models::{Episode, Instruction, RawEpisodeDocument};
use serde_json::Value;

// ── EpisodeRecord ─────────────────────────────────────────────────────────────

/// A segment flagged as suboptimal, kept for detailed console output.
#[derive(Debug, Clone, PartialEq)]
pub struct SuboptimalSegment {
    pub instructions_index: Option<i64>,
    /// Instruction label, when the index resolves.
    pub instruction: Option<String>,
    pub duration: f64,
}

/// An [`Episode`] together with where it came from and the details that
/// only matter for narration.
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeRecord {
    pub episode: Episode,
    /// The metadata JSON file the episode was read from.
    pub source_path: PathBuf,
    pub instructions: Vec<String>,
    pub suboptimal: Vec<SuboptimalSegment>,
}

// ── RecordLoader ──────────────────────────────────────────────────────────────

/// Stateless converter from metadata documents to [`EpisodeRecord`]s.
pub struct RecordLoader;

impl RecordLoader {
    /// Type-check a parsed JSON document and derive its episode.
    ///
    /// Missing or wrong-typed required keys yield
    /// [`StatsError::MalformedDocument`]; a document without segments yields
    /// [`StatsError::EmptyEpisode`].
    pub fn from_value(path: &Path, value: Value) -> Result<EpisodeRecord> {
        let document: RawEpisodeDocument =
            serde_json::from_value(value).map_err(|e| StatsError::malformed(path, e.to_string()))?;
        Self::from_document(path, &document)
    }

    /// Derive the episode statistics for `document` read from `path`.
    pub fn from_document(path: &Path, document: &RawEpisodeDocument) -> Result<EpisodeRecord> {
        let stats = DurationStats::from_durations(&document.durations()).ok_or_else(|| {
            StatsError::EmptyEpisode {
                path: path.to_path_buf(),
            }
        })?;

        let suboptimal: Vec<SuboptimalSegment> = document
            .segments
            .iter()
            .filter(|segment| segment.has_suboptimal)
            .map(|segment| SuboptimalSegment {
                instructions_index: segment.instructions_index,
                instruction: segment
                    .instructions_index
                    .and_then(|idx| document.instruction(idx))
                    .map(str::to_string),
                duration: segment.duration(),
            })
            .collect();

        let episode = Episode {
            date: DateExtractor::from_source_path(path),
            total_time: stats.total,
            mean_duration: stats.mean,
            max_duration: stats.max,
            min_duration: stats.min,
            total_segments: stats.count,
            suboptimal_segments: suboptimal.len(),
            bag_path: document.bag_path.clone(),
            hsr_id: document.hsr_id.clone(),
            version: document.version.clone(),
            location_name: document.location_name.clone(),
            interface: document.interface.clone(),
            git_branch: document.git_branch.clone(),
            git_hash: document.git_hash.clone(),
        };

        Ok(EpisodeRecord {
            episode,
            source_path: path.to_path_buf(),
            instructions: document
                .instructions
                .iter()
                .map(Instruction::label)
                .map(str::to_string)
                .collect(),
            suboptimal,
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
