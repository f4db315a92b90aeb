//! Crawler module for walking the listing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with retry logic
//! - Listing parsing and pagination detection
//! - Novelty filtering against the crawl state
//! - Request pacing
//! - The pagination driver and run commit

mod coordinator;
mod fetcher;
mod novelty;
mod parser;
mod scheduler;

pub use coordinator::{
    commit, harvest, harvest_with, CrawlMode, CrawlReport, Harvester, PageError,
};
pub use fetcher::{
    build_http_client, detect_block, FetchError, FetchErrorKind, HttpFetcher, PageSource,
    RetryPolicy,
};
pub use novelty::{Novelty, NoveltyFilter, PageTally};
pub use parser::{ListingParser, NextPage, ParsedListing};
pub use scheduler::Throttle;
