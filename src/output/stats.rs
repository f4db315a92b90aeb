//! Statistics over the persisted state and the article archive
//!
//! Backs the `--stats` command and doubles as a consistency check: after a
//! successful full-export run, the archive and the state hold exactly the same
//! identities.

use crate::article::Article;
use crate::output::json::load_archive;
use crate::state::CrawlState;
use crate::storage::{JsonStateStore, StateStore};
use crate::HarvestError;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashSet;
use std::path::Path;

/// Archive statistics summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveStatistics {
    /// Counter from the state file
    pub known_articles: u64,

    /// Time of the last successful run
    pub last_crawl: Option<DateTime<Utc>>,

    /// Items in the JSON archive
    pub archived_articles: usize,

    /// Archived items whose date could not be parsed
    pub undated_articles: usize,

    pub newest_date: Option<NaiveDate>,
    pub oldest_date: Option<NaiveDate>,

    /// Identities in the state but absent from the archive
    pub missing_from_archive: usize,

    /// Archived identities the state does not know
    pub unknown_to_state: usize,
}

impl ArchiveStatistics {
    /// True when state and archive describe the same identity set
    pub fn is_consistent(&self) -> bool {
        self.missing_from_archive == 0 && self.unknown_to_state == 0
    }
}

/// Computes statistics from an in-memory state and archive
pub fn compute_statistics(state: &CrawlState, archive: &[Article]) -> ArchiveStatistics {
    let archived: HashSet<&str> = archive.iter().map(|a| a.url.as_str()).collect();
    let dates: Vec<NaiveDate> = archive.iter().filter_map(|a| a.date).collect();

    ArchiveStatistics {
        known_articles: state.total_articles_crawled,
        last_crawl: state.last_crawl_timestamp,
        archived_articles: archive.len(),
        undated_articles: archive.len() - dates.len(),
        newest_date: dates.iter().max().copied(),
        oldest_date: dates.iter().min().copied(),
        missing_from_archive: state
            .seen_urls
            .iter()
            .filter(|url| !archived.contains(url.as_str()))
            .count(),
        unknown_to_state: archived.iter().filter(|url| !state.contains(url)).count(),
    }
}

/// Loads statistics from the state file and the JSON archive
///
/// # Arguments
///
/// * `state_path` - Path to the crawl state file
/// * `archive_path` - Path to the JSON export
///
/// # Returns
///
/// * `Ok(ArchiveStatistics)` - Successfully computed statistics
/// * `Err(HarvestError)` - Either file is corrupt
pub fn load_statistics(
    state_path: &Path,
    archive_path: &Path,
) -> Result<ArchiveStatistics, HarvestError> {
    let state = JsonStateStore::new(state_path).load()?;
    let archive = load_archive(archive_path)?;
    Ok(compute_statistics(&state, &archive))
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &ArchiveStatistics) {
    println!("=== Archive Statistics ===\n");

    println!("State:");
    println!("  Known articles: {}", stats.known_articles);
    match stats.last_crawl {
        Some(at) => println!("  Last crawl: {}", at.to_rfc3339()),
        None => println!("  Last crawl: never"),
    }
    println!();

    println!("Archive:");
    println!("  Archived articles: {}", stats.archived_articles);
    println!("  Undated articles: {}", stats.undated_articles);
    if let (Some(oldest), Some(newest)) = (stats.oldest_date, stats.newest_date) {
        println!("  Date range: {} .. {}", oldest, newest);
    }
    println!();

    if stats.is_consistent() {
        println!("✓ Archive and state are consistent");
    } else {
        println!("Inconsistencies:");
        println!("  In state but not archived: {}", stats.missing_from_archive);
        println!("  Archived but not in state: {}", stats.unknown_to_state);
    }
}
