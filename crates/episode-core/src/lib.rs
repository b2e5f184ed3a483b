//! Core types for episode statistics.
//!
//! Episode models and errors, folder-name date extraction, metadata
//! filtering, duration statistics, formatting helpers and CLI settings.

pub mod calculations;
pub mod date_utils;
pub mod error;
pub mod filter;
pub mod formatting;
pub mod models;
pub mod settings;

pub use error::{Result, StatsError};
