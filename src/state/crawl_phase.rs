/// Phase definitions for the pagination state machine
///
/// A run starts in `Paging` and ends in exactly one terminal phase.
use std::fmt;

/// Represents where a crawl run currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlPhase {
    // ===== Active State =====
    /// Still walking listing pages
    Paging,

    // ===== Terminal Success States =====
    /// A page yielded no new items; older pages are assumed known
    StoppedByBoundary,

    /// The configured page limit was reached
    StoppedByPageLimit,

    /// A page parsed to zero items
    StoppedByEmptyPage,

    /// The paging block reported no next page
    StoppedByLastPage,

    // ===== Terminal Error State =====
    /// A fatal error ended the run; nothing is exported or persisted
    Failed,
}

impl CrawlPhase {
    /// Returns true if no more pages will be fetched
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Paging)
    }

    /// Returns true if the run ended in a documented stop
    ///
    /// Success means export and state persistence go ahead.
    pub fn is_success(&self) -> bool {
        self.is_terminal() && !matches!(self, Self::Failed)
    }

    /// Short machine-readable name, used in logs and the run summary
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Paging => "paging",
            Self::StoppedByBoundary => "stopped_by_boundary",
            Self::StoppedByPageLimit => "stopped_by_page_limit",
            Self::StoppedByEmptyPage => "stopped_by_empty_page",
            Self::StoppedByLastPage => "stopped_by_last_page",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
