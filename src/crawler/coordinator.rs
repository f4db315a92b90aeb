//! Crawl driver - pagination state machine and run orchestration
//!
//! This module contains the main crawl loop that coordinates one run:
//! - Choosing the crawl mode (incremental, bootstrap, forced, repair)
//! - Walking listing pages under the throttle
//! - Filtering items for novelty and applying the stop rules
//! - Committing a successful run: exports first, then the state

use crate::article::{sort_newest_first, Article};
use crate::config::{
    Config, CrawlerConfig, ErrorPolicy, ExportMode, OutputConfig, SiteConfig,
};
use crate::crawler::fetcher::{FetchError, HttpFetcher, PageSource};
use crate::crawler::novelty::NoveltyFilter;
use crate::crawler::parser::{ListingParser, NextPage};
use crate::crawler::scheduler::Throttle;
use crate::output::{load_archive, write_exports};
use crate::state::{CrawlPhase, CrawlState};
use crate::storage::{open_state_store, StateStore};
use crate::url::page_url;
use crate::{ConfigError, HarvestError};
use chrono::{NaiveDate, Utc};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// How a run treats the boundary rule and which page limit applies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlMode {
    /// Normal run: stop at the first page with nothing new
    Incremental,
    /// First-ever run: nothing is known yet
    Bootstrap,
    /// Operator asked for a full re-walk
    Forced,
    /// The archive lost items the state still knows about
    Repair,
}

impl CrawlMode {
    /// Returns true if a page without new items ends the run
    pub fn uses_boundary(&self) -> bool {
        matches!(self, Self::Incremental)
    }

    pub fn page_limit(&self, config: &CrawlerConfig) -> u32 {
        match self {
            Self::Incremental => config.max_pages,
            Self::Bootstrap | Self::Forced | Self::Repair => config.bootstrap_max_pages,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Incremental => "incremental",
            Self::Bootstrap => "bootstrap",
            Self::Forced => "forced",
            Self::Repair => "repair",
        }
    }
}

impl fmt::Display for CrawlMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A listing page that could not be fetched in resilient mode
#[derive(Debug, Clone)]
pub struct PageError {
    pub page: u32,
    pub error: FetchError,
}

/// Outcome of one crawl
///
/// `failure` is set exactly when `phase` is `Failed`; a failed report must
/// never be exported or persisted.
#[derive(Debug)]
pub struct CrawlReport {
    pub phase: CrawlPhase,
    pub mode: CrawlMode,

    /// Pages fetched and parsed successfully
    pub pages_fetched: u32,

    /// Items first seen in this run, in discovery order
    pub new_items: Vec<Article>,

    /// Known items put back into a damaged archive
    pub restored: usize,

    /// What the exports will contain, newest first
    pub collection: Vec<Article>,

    /// Updated state to persist
    pub state: CrawlState,

    pub page_errors: Vec<PageError>,

    pub failure: Option<HarvestError>,
}

impl CrawlReport {
    pub fn is_success(&self) -> bool {
        self.phase.is_success() && self.failure.is_none()
    }

    /// Most recent date among the new items
    pub fn latest_new_date(&self) -> Option<NaiveDate> {
        self.new_items.iter().filter_map(|a| a.date).max()
    }
}

/// Pagination driver over any page source
pub struct Harvester<S> {
    source: S,
    site: SiteConfig,
    crawler: CrawlerConfig,
    export_mode: ExportMode,
    parser: ListingParser,
    throttle: Throttle,
}

impl<S: PageSource> Harvester<S> {
    /// Creates a driver
    ///
    /// # Arguments
    ///
    /// * `source` - Where listing pages come from
    /// * `config` - The validated configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Harvester)` - Ready to crawl
    /// * `Err(ConfigError)` - A configured selector does not compile
    pub fn new(source: S, config: &Config) -> Result<Self, ConfigError> {
        Ok(Self {
            source,
            site: config.site.clone(),
            crawler: config.crawler.clone(),
            export_mode: config.output.export_mode,
            parser: ListingParser::from_site(&config.site)?,
            throttle: Throttle::new(Duration::from_millis(config.crawler.page_delay_ms)),
        })
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Decides how this run treats the boundary rule
    pub fn select_mode(&self, state: &CrawlState, archive: &[Article]) -> CrawlMode {
        if self.crawler.force_full_crawl {
            return CrawlMode::Forced;
        }
        if state.is_bootstrap() {
            return CrawlMode::Bootstrap;
        }
        if self.export_mode == ExportMode::Full {
            let archived: HashSet<&str> = archive.iter().map(|a| a.url.as_str()).collect();
            let missing = state.missing_from(&archived);
            if missing > 0 {
                tracing::warn!(
                    "Archive is missing {} known articles; running a repair crawl",
                    missing
                );
                return CrawlMode::Repair;
            }
        }
        CrawlMode::Incremental
    }

    /// Runs the pagination state machine
    ///
    /// # State Machine
    ///
    /// Starting at page 1 in `Paging`, each page is fetched and parsed, then:
    ///
    /// | Condition | Next phase |
    /// |-----------|------------|
    /// | Fetch failed, abort policy | `Failed` |
    /// | Fetch failed, skip policy | continue (or page limit) |
    /// | Page parsed to zero items | `StoppedByEmptyPage` |
    /// | No new items, incremental mode | `StoppedByBoundary` |
    /// | Page limit reached | `StoppedByPageLimit` |
    /// | Paging block has no next page | `StoppedByLastPage` |
    /// | Otherwise | next page |
    ///
    /// # Arguments
    ///
    /// * `state` - The persisted crawl state
    /// * `archive` - The previous JSON export (ignored in new-only mode)
    pub async fn crawl(&mut self, state: CrawlState, archive: Vec<Article>) -> CrawlReport {
        let mode = self.select_mode(&state, &archive);
        let page_limit = mode.page_limit(&self.crawler);

        let (seed, restore) = match self.export_mode {
            ExportMode::Full => (archive, mode != CrawlMode::Incremental),
            ExportMode::NewOnly => (Vec::new(), false),
        };
        let mut filter = NoveltyFilter::new(state, seed, restore);

        tracing::info!(
            "Starting {} crawl of {} (page limit {}, {} known articles)",
            mode,
            self.site.base_url,
            page_limit,
            filter.state().len()
        );

        let mut phase = CrawlPhase::Paging;
        let mut failure = None;
        let mut page: u32 = 1;
        let mut next_url = None;
        let mut pages_fetched = 0;
        let mut restored = 0;
        let mut page_errors = Vec::new();

        while !phase.is_terminal() {
            let url = match next_url.take() {
                Some(url) => url,
                None => match page_url(&self.site, page) {
                    Ok(url) => url,
                    Err(e) => {
                        phase = CrawlPhase::Failed;
                        failure = Some(HarvestError::from(e));
                        break;
                    }
                },
            };

            self.throttle.wait_turn().await;
            tracing::info!("Fetching page {}: {}", page, url);

            match self.source.fetch_page(&url).await {
                Err(error) => match self.crawler.on_page_error {
                    ErrorPolicy::Abort => {
                        tracing::error!("Page {} failed: {}", page, error);
                        phase = CrawlPhase::Failed;
                        failure = Some(HarvestError::PageFailed {
                            page,
                            source: error,
                        });
                    }
                    ErrorPolicy::Skip => {
                        tracing::warn!("Skipping page {}: {}", page, error);
                        page_errors.push(PageError { page, error });
                        if page >= page_limit {
                            phase = CrawlPhase::StoppedByPageLimit;
                        }
                    }
                },
                Ok(html) => {
                    pages_fetched += 1;
                    let parsed = self.parser.parse(&html, &url);

                    if parsed.items.is_empty() {
                        tracing::info!("Page {} has no items", page);
                        phase = CrawlPhase::StoppedByEmptyPage;
                    } else {
                        let tally = filter.admit_page(parsed.items);
                        restored += tally.restored;
                        tracing::info!(
                            "Page {}: {} items, {} new, {} known, {} restored",
                            page,
                            tally.total(),
                            tally.new,
                            tally.known,
                            tally.restored
                        );

                        if mode.uses_boundary() && tally.is_boundary() {
                            phase = CrawlPhase::StoppedByBoundary;
                        } else if page >= page_limit {
                            phase = CrawlPhase::StoppedByPageLimit;
                        } else {
                            match parsed.next_page {
                                NextPage::End => phase = CrawlPhase::StoppedByLastPage,
                                NextPage::Link(link) => next_url = Some(link),
                                NextPage::Unknown => {}
                            }
                        }
                    }
                }
            }

            page += 1;
        }

        if phase.is_success() {
            if pages_fetched == 0 {
                phase = CrawlPhase::Failed;
                failure = Some(HarvestError::NoPageFetched {
                    failures: page_errors.len(),
                });
            } else if mode == CrawlMode::Bootstrap && filter.collection().is_empty() {
                phase = CrawlPhase::Failed;
                failure = Some(HarvestError::EmptyBootstrap);
            } else if restore {
                let lost = filter.mark_unrecoverable();
                if lost > 0 {
                    tracing::warn!(
                        "{} known articles are no longer on the listing and stay out of the archive",
                        lost
                    );
                }
            }
        }

        let (state, mut collection, new_items) = filter.into_parts();
        sort_newest_first(&mut collection);

        tracing::info!(
            "Crawl ended in {} after {} pages: {} new, {} in collection",
            phase,
            pages_fetched,
            new_items.len(),
            collection.len()
        );

        CrawlReport {
            phase,
            mode,
            pages_fetched,
            new_items,
            restored,
            collection,
            state,
            page_errors,
            failure,
        }
    }
}

/// Commits a finished crawl
///
/// A failed report is turned into its error with nothing written. Otherwise
/// the exports are written first and the state last, so a failing export
/// leaves the previous state file untouched.
///
/// # Arguments
///
/// * `report` - The crawl outcome
/// * `store` - Where the state is persisted
/// * `output` - Export destinations
pub fn commit<St: StateStore>(
    mut report: CrawlReport,
    store: &St,
    output: &OutputConfig,
) -> Result<CrawlReport, HarvestError> {
    if let Some(failure) = report.failure.take() {
        tracing::error!("Crawl failed, nothing was saved: {}", failure);
        return Err(failure);
    }

    report.state.finish_run(Utc::now());

    write_exports(
        &report.collection,
        Path::new(&output.json_path),
        Path::new(&output.csv_path),
    )?;
    store.save(&report.state)?;

    tracing::info!(
        "Run committed: {} known articles",
        report.state.total_articles_crawled
    );
    Ok(report)
}

/// Runs one complete crawl against an arbitrary page source
///
/// Loads the state and archive, crawls, then commits.
pub async fn harvest_with<S: PageSource>(
    source: S,
    config: &Config,
) -> Result<CrawlReport, HarvestError> {
    let store = open_state_store(Path::new(&config.output.state_path))?;
    let state = store.load()?;

    let archive = match config.output.export_mode {
        ExportMode::Full => load_archive(Path::new(&config.output.json_path))?,
        ExportMode::NewOnly => Vec::new(),
    };

    let mut harvester = Harvester::new(source, config)?;
    let report = harvester.crawl(state, archive).await;
    commit(report, &store, &config.output)
}

/// Runs one complete crawl against the live site
///
/// This is the main entry point used by the binary.
///
/// # Example
///
/// ```no_run
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// use listing_harvest::{harvest, Config};
///
/// let report = harvest(Config::default()).await?;
/// println!("{} new articles", report.new_items.len());
/// # Ok(())
/// # }
/// ```
pub async fn harvest(config: Config) -> Result<CrawlReport, HarvestError> {
    let fetcher = HttpFetcher::new(&config.crawler)?;
    harvest_with(fetcher, &config).await
}
