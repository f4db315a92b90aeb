//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlPhase`: where a single run stands in the pagination state machine
//! - `CrawlState`: what all previous runs have captured, persisted between runs

mod crawl_phase;
mod crawl_state;

// Re-export main types
pub use crawl_phase::CrawlPhase;
pub use crawl_state::CrawlState;
