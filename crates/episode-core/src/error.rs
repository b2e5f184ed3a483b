use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the episode statistics tool.
#[derive(Error, Debug)]
pub enum StatsError {
    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A metadata document is not valid JSON, or a required key is missing
    /// or has the wrong type.
    #[error("Malformed document {path}: {reason}")]
    MalformedDocument { path: PathBuf, reason: String },

    /// A metadata document has no segments, so its duration statistics are
    /// undefined.
    #[error("Episode has no segments: {path}")]
    EmptyEpisode { path: PathBuf },

    /// A `key=value` filter token without a separator or key.
    #[error("Invalid filter syntax: {0}")]
    InvalidFilterSyntax(String),

    /// The `--date-from` value is not a `YYYY-MM-DD` calendar date.
    #[error("Invalid date bound: {0}")]
    InvalidDateBound(String),

    /// A JSON document could not be parsed or serialised.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl StatsError {
    /// Build a [`StatsError::MalformedDocument`] for `path`.
    pub fn malformed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        StatsError::MalformedDocument {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Convenience alias used throughout the episode crates.
pub type Result<T> = std::result::Result<T, StatsError>;
