//! JSON file backend for the crawl state
//!
//! The state lives in a single JSON document:
//!
//! ```json
//! {
//!   "seen_urls": ["https://..."],
//!   "last_crawl_timestamp": "2025-09-15T08:00:00Z",
//!   "total_articles_crawled": 1
//! }
//! ```

use crate::state::CrawlState;
use crate::storage::atomic::write_atomic;
use crate::storage::traits::{StateStore, StorageError, StorageResult};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// File-backed state store with atomic replacement on save
#[derive(Debug, Clone)]
pub struct JsonStateStore {
    path: PathBuf,
}

impl JsonStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn corrupt(&self, message: impl Into<String>) -> StorageError {
        StorageError::Corrupt {
            path: self.path.clone(),
            message: message.into(),
        }
    }
}

impl StateStore for JsonStateStore {
    fn load(&self) -> StorageResult<CrawlState> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!(
                    "No crawl state at {}, starting from an empty history",
                    self.path.display()
                );
                return Ok(CrawlState::new());
            }
            Err(e) => return Err(self.corrupt(format!("unreadable: {}", e))),
        };

        let mut state: CrawlState = serde_json::from_str(&content)
            .map_err(|e| self.corrupt(format!("malformed JSON: {}", e)))?;

        if state.total_articles_crawled != state.seen_urls.len() as u64 {
            tracing::warn!(
                "State counter {} disagrees with {} recorded URLs; using the URL count",
                state.total_articles_crawled,
                state.seen_urls.len()
            );
        }
        state.recount();

        tracing::info!(
            "Loaded crawl state: {} known articles, last crawl {}",
            state.len(),
            state
                .last_crawl_timestamp
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| "never".to_string())
        );

        Ok(state)
    }

    fn save(&self, state: &CrawlState) -> StorageResult<()> {
        let json = serde_json::to_vec_pretty(state)?;
        write_atomic(&self.path, &json)?;
        tracing::info!(
            "Saved crawl state to {} ({} known articles)",
            self.path.display(),
            state.len()
        );
        Ok(())
    }
}
