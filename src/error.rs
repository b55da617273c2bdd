//! Error types for studypulse-core

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Main error type for the studypulse-core library.
///
/// Absence of data is never an error in this crate: queries for unknown
/// metrics, sessions, or users return empty collections. Errors are
/// reserved for malformed call arguments and I/O at the edges.
#[derive(Error, Debug)]
pub enum Error {
    /// Range query with start after end
    #[error("invalid time range: start {start} is after end {end}")]
    InvalidTimeRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Unknown or unsupported export format
    #[error("export error: {0}")]
    Export(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for studypulse-core
pub type Result<T> = std::result::Result<T, Error>;
