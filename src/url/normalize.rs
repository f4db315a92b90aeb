use crate::UrlError;
use url::Url;

/// Query parameters that never change which article a URL points to
const TRACKING_PARAMS: &[&str] = &["fbclid", "gclid", "mc_eid", "spm", "from"];

/// Normalizes an article URL into its identity form
///
/// Article URLs are stable on the source site, so only noise is removed:
///
/// 1. Parse the URL; reject if malformed
/// 2. Require an http or https scheme
/// 3. Lowercase the host (done by the parser)
/// 4. Remove the fragment
/// 5. Remove tracking query parameters, keeping the others in order
/// 6. Remove an empty query string
///
/// Paths are left untouched: `/a/` and `/a` may be different articles.
///
/// # Examples
///
/// ```
/// use listing_harvest::url::normalize_url;
///
/// let url = normalize_url("https://NEWS.Example.com/html/1.shtml?utm_source=x#top").unwrap();
/// assert_eq!(url.as_str(), "https://news.example.com/html/1.shtml");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingHost);
    }

    url.set_fragment(None);

    if let Some(kept) = url.query().map(strip_tracking_params) {
        url.set_query(if kept.is_empty() { None } else { Some(&kept) });
    }

    Ok(url)
}

/// Drops tracking parameters from a raw query, preserving the order and the
/// original encoding of the rest
fn strip_tracking_params(query: &str) -> String {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter(|pair| !is_tracking_param(pair.split_once('=').map_or(*pair, |(key, _)| key)))
        .collect::<Vec<_>>()
        .join("&")
}

fn is_tracking_param(key: &str) -> bool {
    TRACKING_PARAMS.contains(&key) || key.starts_with("utm_")
}
