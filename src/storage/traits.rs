//! Storage traits and error types
//!
//! This module defines the trait interface for crawl state backends and
//! associated error types.

use crate::state::CrawlState;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during state storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    /// The state document exists but cannot be trusted
    ///
    /// Always fatal: treating history as empty would re-emit every old
    /// article as new.
    #[error("Crawl state at {path} is corrupt: {message}")]
    Corrupt { path: PathBuf, message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for crawl state backends
///
/// No locking is performed; callers guarantee a single writer per medium.
pub trait StateStore {
    /// Loads the persisted state
    ///
    /// Returns the empty seed state when nothing has been persisted yet.
    fn load(&self) -> StorageResult<CrawlState>;

    /// Replaces the persisted state
    ///
    /// Implementations must be atomic: a reader sees either the old or the
    /// new state, never a partial write.
    fn save(&self, state: &CrawlState) -> StorageResult<()>;
}
