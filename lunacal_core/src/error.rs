//! Error types for the lunacal_core library.

use chrono::NaiveDate;
use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for lunacal_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An interval ends before it starts
    #[error("Invalid date range: end {end} precedes start {start}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    /// Not enough cycle records to establish a baseline
    #[error("Insufficient data: need at least {required} cycles, found {found}")]
    InsufficientData { required: usize, found: usize },

    /// Symptom intensity outside 1..=5
    #[error("Invalid intensity {0}: expected a value from 1 to 5")]
    InvalidIntensity(u8),

    /// Unparseable calendar date or month
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}
