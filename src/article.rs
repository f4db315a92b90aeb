//! Article item model
//!
//! An [`Article`] is one entry of the listing: a title, an optional
//! publication date and the absolute URL that identifies it across runs.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::cmp::Ordering;

/// Date formats seen on listing pages, tried in order
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d", "%Y年%m月%d日"];

/// Datetime formats whose date part is kept
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y/%m/%d %H:%M:%S"];

/// A single captured listing entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    /// Article headline, trimmed and non-empty
    pub title: String,

    /// Publication date, `None` when the listing text could not be parsed
    #[serde(default, deserialize_with = "deserialize_lenient_date")]
    pub date: Option<NaiveDate>,

    /// Absolute article URL, the identity key
    pub url: String,
}

impl Article {
    pub fn new(title: impl Into<String>, date: Option<NaiveDate>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            date,
            url: url.into(),
        }
    }

    /// Returns the date as an ISO 8601 string, or an empty string if unknown
    pub fn date_string(&self) -> String {
        self.date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default()
    }
}

/// Parses the free-form date text found next to a listing entry
///
/// Returns `None` instead of failing; a missing date never drops an item.
///
/// # Example
///
/// ```
/// use listing_harvest::article::parse_listing_date;
///
/// assert!(parse_listing_date("2025-09-15").is_some());
/// assert!(parse_listing_date("yesterday").is_none());
/// ```
pub fn parse_listing_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return Some(date);
        }
    }

    for format in DATETIME_FORMATS {
        if let Ok(datetime) = chrono::NaiveDateTime::parse_from_str(text, format) {
            return Some(datetime.date());
        }
    }

    None
}

/// Reads a date written by any earlier export, tolerating blanks and raw text
fn deserialize_lenient_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_listing_date))
}

/// Orders articles newest first
///
/// Undated articles sort after every dated one. The sort is stable, so items
/// sharing a date keep their discovery order.
pub fn sort_newest_first(articles: &mut [Article]) {
    articles.sort_by(|a, b| match (a.date, b.date) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}
