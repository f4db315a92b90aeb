use serde::Deserialize;

/// Listing endpoint of the hydrogen-energy news column
pub const DEFAULT_BASE_URL: &str = "https://qn.bjx.com.cn/zq";

/// Main configuration structure for Listing-Harvest
///
/// Every section is optional in the TOML file; missing values take the
/// defaults below and can be overridden from the environment afterwards.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Where the listing lives and how its markup is shaped
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// URL of the first listing page
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// URL of page N >= 2; `{base}` and `{page}` are substituted
    #[serde(rename = "page-url-template")]
    pub page_url_template: String,

    /// CSS selector matching one repeated item block
    #[serde(rename = "item-selector")]
    pub item_selector: String,

    /// CSS selector for the date text inside an item block
    #[serde(rename = "date-selector")]
    pub date_selector: String,

    /// CSS selector for the paging block
    #[serde(rename = "pagination-selector")]
    pub pagination_selector: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            page_url_template: "{base}/{page}/".to_string(),
            item_selector: "div.cc-list-content ul li".to_string(),
            date_selector: "span".to_string(),
            pagination_selector: "div.cc-paging".to_string(),
        }
    }
}

/// What to do when a single listing page cannot be fetched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Strict: the whole run fails
    Abort,
    /// Resilient: log the failure and move on to the next page
    Skip,
}

/// Which items the export files contain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExportMode {
    /// The complete archive, old and new
    Full,
    /// Only the items first seen in this run
    NewOnly,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Page limit for incremental runs
    #[serde(rename = "max-pages")]
    pub max_pages: u32,

    /// Page limit for bootstrap, forced and repair crawls
    #[serde(rename = "bootstrap-max-pages")]
    pub bootstrap_max_pages: u32,

    /// Re-walk from page 1 ignoring the boundary rule
    #[serde(rename = "force-full-crawl")]
    pub force_full_crawl: bool,

    /// Timeout of a single request attempt (seconds)
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    /// Total attempts per page, including the first one
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Base retry delay; attempt N waits N times this (milliseconds)
    #[serde(rename = "retry-backoff-ms")]
    pub retry_backoff_ms: u64,

    /// Minimum time between two page requests (milliseconds)
    #[serde(rename = "page-delay-ms")]
    pub page_delay_ms: u64,

    #[serde(rename = "on-page-error")]
    pub on_page_error: ErrorPolicy,

    /// Bodies shorter than this are treated as a block page and retried
    #[serde(rename = "min-body-bytes")]
    pub min_body_bytes: usize,

    /// User-Agent strings rotated across attempts
    #[serde(rename = "user-agents")]
    pub user_agents: Vec<String>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_pages: 3,
            bootstrap_max_pages: 5,
            force_full_crawl: false,
            request_timeout_secs: 10,
            max_retries: 3,
            retry_backoff_ms: 2000,
            page_delay_ms: 1000,
            on_page_error: ErrorPolicy::Abort,
            min_body_bytes: 100,
            user_agents: default_user_agents(),
        }
    }
}

fn default_user_agents() -> Vec<String> {
    [
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
        "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:109.0) Gecko/20100101 Firefox/121.0",
    ]
    .iter()
    .map(|ua| ua.to_string())
    .collect()
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path of the JSON export (also the archive read back next run)
    #[serde(rename = "json-path")]
    pub json_path: String,

    /// Path of the CSV export
    #[serde(rename = "csv-path")]
    pub csv_path: String,

    /// Path of the persisted crawl state
    #[serde(rename = "state-path")]
    pub state_path: String,

    #[serde(rename = "export-mode")]
    pub export_mode: ExportMode,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            json_path: "articles.json".to_string(),
            csv_path: "articles.csv".to_string(),
            state_path: "crawl_state.json".to_string(),
            export_mode: ExportMode::Full,
        }
    }
}
