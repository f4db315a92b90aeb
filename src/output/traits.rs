//! Output error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during export operations
///
/// Every variant is fatal to the run: the state is only persisted after the
/// exports have been written.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to serialize JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The previous export exists but cannot be read back
    #[error("Article archive at {path} is corrupt: {message}")]
    ArchiveCorrupt { path: PathBuf, message: String },
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;
