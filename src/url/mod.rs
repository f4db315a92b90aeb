//! URL handling module for Listing-Harvest
//!
//! Builds listing page URLs, resolves links found in listing markup, and
//! normalizes article URLs into the identity key used for deduplication.

mod normalize;

use crate::config::SiteConfig;
use crate::{UrlError, UrlResult};
use url::Url;

pub use normalize::normalize_url;

/// Builds the URL of listing page `page` (1-based)
///
/// Page 1 is the configured base URL itself; later pages come from the page
/// template with `{base}` and `{page}` substituted. A trailing slash on the
/// base is dropped before substitution so templates can add their own.
///
/// # Example
///
/// ```
/// use listing_harvest::config::SiteConfig;
/// use listing_harvest::url::page_url;
///
/// let site = SiteConfig::default();
/// assert_eq!(page_url(&site, 1).unwrap().as_str(), "https://qn.bjx.com.cn/zq");
/// assert_eq!(page_url(&site, 3).unwrap().as_str(), "https://qn.bjx.com.cn/zq/3/");
/// ```
pub fn page_url(site: &SiteConfig, page: u32) -> UrlResult<Url> {
    let raw = if page <= 1 {
        site.base_url.clone()
    } else {
        if !site.page_url_template.contains("{page}") {
            return Err(UrlError::BadTemplate(site.page_url_template.clone()));
        }
        site.page_url_template
            .replace("{base}", site.base_url.trim_end_matches('/'))
            .replace("{page}", &page.to_string())
    };

    Url::parse(&raw).map_err(|e| UrlError::Parse(format!("{}: {}", raw, e)))
}

/// Resolves a link href against the page it was found on
///
/// Returns None if the link cannot identify an article:
/// - empty or fragment-only hrefs
/// - `javascript:`, `mailto:`, `tel:` and `data:` schemes
/// - URLs that do not resolve to http(s)
pub fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("data:")
    {
        return None;
    }

    let absolute = base_url.join(href).ok()?;
    normalize_url(absolute.as_str()).ok()
}
