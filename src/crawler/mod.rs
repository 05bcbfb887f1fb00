//! Crawler module: the frontier/router state machine and its worker pool
//!
//! This module contains the core crawling logic, including:
//! - Labeled crawl requests and the deduplicating frontier
//! - The job budget and the record emitter built on it
//! - HTTP fetching with retry logic
//! - Label dispatch to the listing and posting extractors
//! - Overall crawl coordination

mod budget;
mod coordinator;
mod emitter;
mod fetcher;
mod frontier;
mod request;
mod router;

pub use budget::{BudgetSlot, JobBudget};
pub use coordinator::Coordinator;
pub use emitter::{Emission, RecordEmitter};
pub use fetcher::{build_http_client, FetchError, Fetcher, HttpFetcher};
pub use frontier::Frontier;
pub use request::{CrawlRequest, Label};
pub use router::{RouteOutcome, Router};

use crate::config::Config;
use crate::output::CrawlStats;
use crate::storage::open_sink;
use crate::JobsiftError;

/// Runs a complete crawl with the sink and fetcher named by the config
///
/// # Example
///
/// ```no_run
/// use jobsift::config::Config;
/// use jobsift::crawler::crawl;
///
/// # async fn example() -> Result<(), jobsift::JobsiftError> {
/// let stats = crawl(&Config::default()).await?;
/// println!("{} records", stats.records_emitted);
/// # Ok(())
/// # }
/// ```
pub async fn crawl(config: &Config) -> Result<CrawlStats, JobsiftError> {
    let sink = open_sink(&config.output)?;
    Coordinator::from_config(config, sink)?.run().await
}
