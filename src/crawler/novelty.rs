//! Novelty filtering against the persisted identity set
//!
//! The filter owns the working copy of the crawl state and the growing item
//! collection for one run. An item is new exactly when its URL is not yet in
//! the state; admitting a new item records its URL so a later duplicate in
//! the same run is already known.

use crate::article::Article;
use crate::state::CrawlState;
use std::collections::HashSet;

/// Classification of one parsed item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Novelty {
    /// Never seen before; recorded and collected
    New,
    /// Already known and already in the collection
    Known,
    /// Known to the state but missing from the archive; put back in the
    /// collection without counting as new
    Restored,
}

/// Per-page counts, used for the boundary decision and for logging
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageTally {
    pub new: usize,
    pub known: usize,
    pub restored: usize,
}

impl PageTally {
    pub fn total(&self) -> usize {
        self.new + self.known + self.restored
    }

    /// A page where every item was already known
    pub fn is_boundary(&self) -> bool {
        self.total() > 0 && self.new == 0
    }
}

/// Working set for one crawl
#[derive(Debug)]
pub struct NoveltyFilter {
    state: CrawlState,
    collection: Vec<Article>,
    collected_urls: HashSet<String>,
    new_items: Vec<Article>,
    restore: bool,
}

impl NoveltyFilter {
    /// Starts a run from the persisted state and the archive
    ///
    /// Archive items seed the collection (duplicates dropped, first kept).
    /// Archived URLs the state does not know were exported by a run whose
    /// state was never saved, so they were never reported either: they are
    /// recorded in the state and counted as new items of this run.
    ///
    /// # Arguments
    ///
    /// * `state` - The persisted crawl state
    /// * `archive` - Items carried over from the previous export
    /// * `restore` - Put known-but-unarchived items back into the collection
    pub fn new(state: CrawlState, archive: Vec<Article>, restore: bool) -> Self {
        let mut filter = Self {
            state,
            collection: Vec::with_capacity(archive.len()),
            collected_urls: HashSet::with_capacity(archive.len()),
            new_items: Vec::new(),
            restore,
        };

        let mut folded = 0;
        for article in archive {
            if !filter.collected_urls.insert(article.url.clone()) {
                tracing::debug!("Dropping duplicate archive entry {}", article.url);
                continue;
            }
            if filter.state.record(&article.url) {
                folded += 1;
                filter.new_items.push(article.clone());
            }
            filter.collection.push(article);
        }

        if folded > 0 {
            tracing::warn!(
                "{} archived articles were missing from the crawl state; reporting them as new",
                folded
            );
        }

        filter
    }

    /// Classifies a URL without changing anything
    pub fn classify(&self, url: &str) -> Novelty {
        if !self.state.contains(url) {
            Novelty::New
        } else if self.restore && !self.collected_urls.contains(url) {
            Novelty::Restored
        } else {
            Novelty::Known
        }
    }

    /// Classifies an item and applies the result
    pub fn admit(&mut self, article: Article) -> Novelty {
        let novelty = self.classify(&article.url);
        match novelty {
            Novelty::New => {
                self.state.record(&article.url);
                self.collected_urls.insert(article.url.clone());
                self.new_items.push(article.clone());
                self.collection.push(article);
            }
            Novelty::Restored => {
                self.collected_urls.insert(article.url.clone());
                self.collection.push(article);
            }
            Novelty::Known => {}
        }
        novelty
    }

    /// Admits every item of one page, in order
    pub fn admit_page(&mut self, items: Vec<Article>) -> PageTally {
        let mut tally = PageTally::default();
        for article in items {
            match self.admit(article) {
                Novelty::New => tally.new += 1,
                Novelty::Known => tally.known += 1,
                Novelty::Restored => tally.restored += 1,
            }
        }
        tally
    }

    pub fn state(&self) -> &CrawlState {
        &self.state
    }

    pub fn collection(&self) -> &[Article] {
        &self.collection
    }

    pub fn new_items(&self) -> &[Article] {
        &self.new_items
    }

    /// Records every known URL still absent from the collection as
    /// unrecoverable, replacing the previous set
    ///
    /// Returns how many there are.
    pub fn mark_unrecoverable(&mut self) -> usize {
        let lost: HashSet<String> = self
            .state
            .seen_urls
            .iter()
            .filter(|url| !self.collected_urls.contains(*url))
            .cloned()
            .collect();
        let count = lost.len();
        self.state.unrecoverable_urls = lost;
        count
    }

    /// Consumes the filter, returning (state, collection, new items)
    pub fn into_parts(self) -> (CrawlState, Vec<Article>, Vec<Article>) {
        (self.state, self.collection, self.new_items)
    }
}
