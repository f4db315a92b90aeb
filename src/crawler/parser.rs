//! HTML parser for listing pages
//!
//! This module handles parsing one listing page to extract:
//! - The article items (title, date, absolute URL)
//! - The pagination signal (next page link, last page, or unknown)

use crate::article::{parse_listing_date, Article};
use crate::config::SiteConfig;
use crate::url::resolve_link;
use crate::ConfigError;
use chrono::NaiveDate;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Anchor texts that label a "next page" link
const NEXT_LABELS: &[&str] = &["下一页", "下页", "next", "next page", "next »", "»"];

/// What the paging block says about the following page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextPage {
    /// A usable link to the next page
    Link(Url),
    /// The paging block is present but offers no next page
    End,
    /// No paging block on the page
    Unknown,
}

/// Everything extracted from a listing page
#[derive(Debug, Clone)]
pub struct ParsedListing {
    /// Items in document order
    pub items: Vec<Article>,

    pub next_page: NextPage,
}

/// Compiled selectors for one listing layout
#[derive(Debug, Clone)]
pub struct ListingParser {
    item: Selector,
    date: Selector,
    pagination: Selector,
    anchor: Selector,
    paging_link: Selector,
}

impl ListingParser {
    /// Compiles the selectors from the site configuration
    ///
    /// # Returns
    ///
    /// * `Ok(ListingParser)` - All selectors compiled
    /// * `Err(ConfigError::Validation)` - A selector is not valid CSS
    pub fn from_site(site: &SiteConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            item: compile("item_selector", &site.item_selector)?,
            date: compile("date_selector", &site.date_selector)?,
            pagination: compile("pagination_selector", &site.pagination_selector)?,
            anchor: compile("anchor", "a[href]")?,
            paging_link: compile("paging link", "a")?,
        })
    }

    /// Parses a listing page
    ///
    /// # Extraction Rules
    ///
    /// - Each element matching the item selector is one candidate item
    /// - The URL is the first `<a href>` inside the item, resolved against
    ///   `page_url` and normalized
    /// - The title is the anchor's `title` attribute, falling back to its text
    /// - The date is the text of the date element; when that is missing or
    ///   unparseable, any date-shaped token in the item text is used
    /// - Items without a usable URL or title are skipped with a warning
    ///
    /// # Arguments
    ///
    /// * `html` - The page markup
    /// * `page_url` - The URL the markup was fetched from
    pub fn parse(&self, html: &str, page_url: &Url) -> ParsedListing {
        let document = Html::parse_document(html);

        let items = document
            .select(&self.item)
            .filter_map(|element| self.extract_item(element, page_url))
            .collect();

        ParsedListing {
            items,
            next_page: self.extract_next_page(&document, page_url),
        }
    }

    fn extract_item(&self, element: ElementRef<'_>, page_url: &Url) -> Option<Article> {
        let Some(anchor) = element.select(&self.anchor).next() else {
            tracing::warn!("Skipping listing item without a link on {}", page_url);
            return None;
        };

        let href = anchor.value().attr("href").unwrap_or_default();
        let Some(url) = resolve_link(href, page_url) else {
            tracing::warn!("Skipping listing item with unusable href {:?}", href);
            return None;
        };

        let title = anchor
            .value()
            .attr("title")
            .map(collapse_whitespace)
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| collapse_whitespace(&anchor.text().collect::<String>()));
        if title.is_empty() {
            tracing::warn!("Skipping listing item without a title: {}", url);
            return None;
        }

        let date = self.extract_date(element);
        if date.is_none() {
            tracing::debug!("No parseable date for {}", url);
        }

        Some(Article::new(title, date, url.to_string()))
    }

    fn extract_date(&self, element: ElementRef<'_>) -> Option<NaiveDate> {
        let from_selector = element
            .select(&self.date)
            .map(|date| date.text().collect::<String>())
            .find_map(|text| parse_listing_date(&text));

        from_selector.or_else(|| {
            element
                .text()
                .flat_map(str::split_whitespace)
                .find_map(parse_listing_date)
        })
    }

    fn extract_next_page(&self, document: &Html, page_url: &Url) -> NextPage {
        let Some(paging) = document.select(&self.pagination).next() else {
            return NextPage::Unknown;
        };

        let next = paging.select(&self.paging_link).find(|anchor| {
            let label = collapse_whitespace(&anchor.text().collect::<String>()).to_lowercase();
            NEXT_LABELS.contains(&label.as_str())
        });

        let Some(next) = next else {
            return NextPage::End;
        };

        let disabled = next
            .value()
            .attr("class")
            .is_some_and(|class| class.contains("disable"));
        if disabled {
            return NextPage::End;
        }

        match next.value().attr("href").and_then(|href| resolve_link(href, page_url)) {
            Some(url) if url != *page_url => NextPage::Link(url),
            _ => NextPage::End,
        }
    }
}

fn compile(name: &str, selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector).map_err(|e| {
        ConfigError::Validation(format!(
            "{} is not a valid CSS selector: '{}' ({:?})",
            name, selector, e
        ))
    })
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
