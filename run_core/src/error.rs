//! Error types for the run_core library.

use crate::types::LiveState;
use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for run_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A workout failed validation (missing date, non-positive distance or duration)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// An index did not address an existing workout
    #[error("Index {index} out of range (have {len} workouts)")]
    OutOfRange { index: usize, len: usize },

    /// A live session call that is not legal in the current state
    #[error("Cannot {action} while live session is {state}")]
    InvalidTransition {
        action: &'static str,
        state: LiveState,
    },

    /// The key-value backend could not read or write a value
    #[error("Persistence error: {0}")]
    Persistence(String),

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
}

/// Why a persisted value could not be decoded.
///
/// Kept apart from [`Error`] so loaders can pick their own fallback
/// instead of propagating.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseFailure {
    #[error("malformed JSON: {0}")]
    Malformed(String),

    #[error("expected a JSON array")]
    NotAnArray,

    #[error("expected a JSON object")]
    NotAnObject,
}
