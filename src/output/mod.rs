//! Output module for crawl statistics
//!
//! Workers record what happened to every request in a shared
//! [`StatsCollector`]; the final [`CrawlStats`] snapshot is printed as a
//! terminal summary when the crawl ends.

pub mod stats;

pub use stats::{print_statistics, CrawlStats, StatsCollector};
