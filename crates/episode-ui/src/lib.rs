//! Presentation layer for episode statistics.
//!
//! Console narration of an analysis run, plus the interactive chart and
//! table screens built on [`ratatui`].

pub mod app;
pub mod chart_view;
pub mod console;
pub mod table_view;
pub mod themes;

pub use episode_core as core;
