//! Data layer for episode statistics.
//!
//! Discovers and parses per-episode metadata files, groups the surviving
//! episodes by date, assembles the report and runs the top-level analysis
//! pipeline.

pub mod aggregator;
pub mod analysis;
pub mod loader;
pub mod reader;
pub mod report;

pub use episode_core as core;
