//! Environment variable overrides
//!
//! The scheduling collaborator drives the crawler through environment
//! variables; they win over anything in the TOML file.

use crate::config::types::{Config, ErrorPolicy, ExportMode};
use crate::ConfigError;
use std::str::FromStr;

/// Applies recognized environment variables to `config`
///
/// `lookup` abstracts the environment so tests can supply a fixed map.
/// Empty values are ignored.
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(value) = get("BASE_URL") {
        config.site.base_url = value.trim().to_string();
    }

    // MAX_PAGES bounds every mode
    if let Some(value) = get("MAX_PAGES") {
        let pages: u32 = parse_number("MAX_PAGES", &value)?;
        config.crawler.max_pages = pages;
        config.crawler.bootstrap_max_pages = pages;
    }

    if let Some(value) = get("FORCE_FULL_CRAWL") {
        config.crawler.force_full_crawl = parse_bool("FORCE_FULL_CRAWL", &value)?;
    }

    if let Some(value) = get("REQUEST_TIMEOUT_SECS") {
        config.crawler.request_timeout_secs = parse_number("REQUEST_TIMEOUT_SECS", &value)?;
    }

    if let Some(value) = get("MAX_RETRIES") {
        config.crawler.max_retries = parse_number("MAX_RETRIES", &value)?;
    }

    if let Some(value) = get("PAGE_DELAY_MS") {
        config.crawler.page_delay_ms = parse_number("PAGE_DELAY_MS", &value)?;
    }

    if let Some(value) = get("ON_PAGE_ERROR") {
        config.crawler.on_page_error = match value.trim().to_lowercase().as_str() {
            "abort" | "strict" => ErrorPolicy::Abort,
            "skip" | "resilient" => ErrorPolicy::Skip,
            _ => return Err(invalid("ON_PAGE_ERROR", &value)),
        };
    }

    if let Some(value) = get("EXPORT_MODE") {
        config.output.export_mode = match value.trim().to_lowercase().as_str() {
            "full" => ExportMode::Full,
            "new-only" | "new_only" => ExportMode::NewOnly,
            _ => return Err(invalid("EXPORT_MODE", &value)),
        };
    }

    if let Some(value) = get("OUTPUT_JSON") {
        config.output.json_path = value;
    }

    if let Some(value) = get("OUTPUT_CSV") {
        config.output.csv_path = value;
    }

    if let Some(value) = get("STATE_FILE") {
        config.output.state_path = value;
    }

    Ok(())
}

fn parse_number<T: FromStr>(name: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| invalid(name, value))
}

fn parse_bool(name: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(invalid(name, value)),
    }
}

fn invalid(name: &str, value: &str) -> ConfigError {
    ConfigError::InvalidEnv {
        name: name.to_string(),
        value: value.to_string(),
    }
}
