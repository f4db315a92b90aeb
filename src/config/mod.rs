//! Configuration module for Listing-Harvest
//!
//! Settings come from three layers, later ones winning: built-in defaults, an
//! optional TOML file, and environment variables (`MAX_PAGES`,
//! `FORCE_FULL_CRAWL`, `OUTPUT_JSON`, ...).
//!
//! # Example
//!
//! ```no_run
//! use listing_harvest::config::resolve_config;
//! use std::path::Path;
//!
//! let config = resolve_config(Some(Path::new("harvest.toml")), |k| std::env::var(k).ok()).unwrap();
//! println!("Crawler will fetch at most {} pages", config.crawler.max_pages);
//! ```

mod env;
mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, ErrorPolicy, ExportMode, OutputConfig, SiteConfig, DEFAULT_BASE_URL,
};

// Re-export parser functions
pub use env::apply_env_overrides;
pub use parser::{compute_config_hash, load_config, resolve_config};
pub use validation::validate;
