//! Storage module for persisting crawl state
//!
//! This module handles:
//! - Loading the state left by the previous run (or a seed state)
//! - Atomically replacing it after a successful run
//! - The temp-file-and-rename helper shared with the export writer

mod atomic;
mod json_store;
mod traits;

pub use atomic::{stage_file, write_atomic};
pub use json_store::JsonStateStore;
pub use traits::{StateStore, StorageError, StorageResult};

use crate::HarvestError;
use std::path::Path;

/// Opens the state store at `path`
///
/// # Arguments
///
/// * `path` - Path to the JSON state file (need not exist yet)
///
/// # Returns
///
/// * `Ok(JsonStateStore)` - Store ready for `load`/`save`
/// * `Err(HarvestError)` - The parent directory does not exist
pub fn open_state_store(path: &Path) -> Result<JsonStateStore, HarvestError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.is_dir() {
            return Err(HarvestError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("state directory {} does not exist", parent.display()),
            )));
        }
    }
    Ok(JsonStateStore::new(path))
}
