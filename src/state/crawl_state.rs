use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashSet;

/// Durable record of what previous runs have captured
///
/// The value is loaded at the start of a run, handed to the crawler which
/// returns an updated copy, and written back only when the run succeeds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlState {
    /// Identity keys (article URLs) of every captured item
    #[serde(serialize_with = "serialize_sorted")]
    pub seen_urls: HashSet<String>,

    /// Time of the most recent successful run; reporting only
    #[serde(default)]
    pub last_crawl_timestamp: Option<DateTime<Utc>>,

    /// Always equal to `seen_urls.len()` once finalized
    #[serde(default)]
    pub total_articles_crawled: u64,

    /// Known identities the archive lacks that a repair crawl could not
    /// find on the listing any more
    #[serde(
        default,
        skip_serializing_if = "HashSet::is_empty",
        serialize_with = "serialize_sorted"
    )]
    pub unrecoverable_urls: HashSet<String>,
}

impl CrawlState {
    /// Creates the seed state of a first-ever run
    pub fn new() -> Self {
        Self::default()
    }

    /// True when nothing has ever been captured
    pub fn is_bootstrap(&self) -> bool {
        self.seen_urls.is_empty()
    }

    pub fn contains(&self, url: &str) -> bool {
        self.seen_urls.contains(url)
    }

    /// Records an identity; returns false if it was already known
    ///
    /// Identities are never removed.
    pub fn record(&mut self, url: &str) -> bool {
        if self.seen_urls.contains(url) {
            return false;
        }
        self.seen_urls.insert(url.to_string());
        self.total_articles_crawled = self.seen_urls.len() as u64;
        true
    }

    pub fn len(&self) -> usize {
        self.seen_urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen_urls.is_empty()
    }

    /// Counts known identities that are neither archived nor given up on
    pub fn missing_from(&self, archived: &HashSet<&str>) -> usize {
        self.seen_urls
            .iter()
            .filter(|url| !archived.contains(url.as_str()))
            .filter(|url| !self.unrecoverable_urls.contains(*url))
            .count()
    }

    /// Re-derives the counter from the identity set
    pub fn recount(&mut self) {
        self.total_articles_crawled = self.seen_urls.len() as u64;
    }

    /// Stamps a successful run
    pub fn finish_run(&mut self, at: DateTime<Utc>) {
        self.recount();
        self.last_crawl_timestamp = Some(at);
    }
}

/// Writes the set in sorted order so the file diffs cleanly between runs
fn serialize_sorted<S>(set: &HashSet<String>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let mut urls: Vec<&String> = set.iter().collect();
    urls.sort();
    serializer.collect_seq(urls)
}
