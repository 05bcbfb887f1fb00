//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the main crawl loop, including:
//! - Fetching the seed listing page (the only fatal request)
//! - Queuing extra configured seeds
//! - Dispatching frontier requests to a bounded pool of workers
//! - Stopping dispatch once the job budget is spent

use crate::config::{Config, CrawlerConfig, SeedEntry};
use crate::crawler::budget::JobBudget;
use crate::crawler::fetcher::{Fetcher, HttpFetcher};
use crate::crawler::frontier::Frontier;
use crate::crawler::request::CrawlRequest;
use crate::crawler::router::Router;
use crate::output::{CrawlStats, StatsCollector};
use crate::storage::RecordSink;
use crate::url::is_on_site;
use crate::JobsiftError;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use url::Url;

/// Main crawler coordinator structure
pub struct Coordinator {
    seed: Url,
    site_domain: String,
    extra_seeds: Vec<SeedEntry>,
    max_concurrency: usize,
    fetcher: Arc<dyn Fetcher>,
    router: Arc<Router>,
    frontier: Arc<Frontier>,
    budget: Arc<JobBudget>,
    stats: Arc<StatsCollector>,
}

impl Coordinator {
    /// Creates a coordinator around any fetcher and sink
    ///
    /// # Arguments
    ///
    /// * `crawler` - Seed URL, budget, concurrency and site pattern
    /// * `extra_seeds` - Raw `(url, label)` requests queued after the seed
    /// * `fetcher` - Source of page bodies
    /// * `sink` - Destination of emitted records
    pub fn new(
        crawler: &CrawlerConfig,
        extra_seeds: Vec<SeedEntry>,
        fetcher: Arc<dyn Fetcher>,
        sink: Arc<dyn RecordSink>,
    ) -> Result<Self, JobsiftError> {
        let seed = Url::parse(&crawler.search_url)?;
        let frontier = Arc::new(Frontier::new());
        let budget = Arc::new(JobBudget::new(crawler.max_jobs));
        let stats = Arc::new(StatsCollector::new());
        let router = Arc::new(Router::new(
            crawler.site_domain.clone(),
            Arc::clone(&frontier),
            Arc::clone(&budget),
            sink,
            Arc::clone(&stats),
        ));

        Ok(Self {
            seed,
            site_domain: crawler.site_domain.clone(),
            extra_seeds,
            max_concurrency: crawler.max_concurrency.max(1),
            fetcher,
            router,
            frontier,
            budget,
            stats,
        })
    }

    /// Creates a coordinator that fetches over HTTP
    pub fn from_config(config: &Config, sink: Arc<dyn RecordSink>) -> Result<Self, JobsiftError> {
        let fetcher = HttpFetcher::new(&config.fetch, &config.user_agent)?;
        Self::new(
            &config.crawler,
            config.seed.clone(),
            Arc::new(fetcher),
            sink,
        )
    }

    /// Runs the crawl until the frontier is empty or the budget is spent
    ///
    /// Per-request failures are logged and counted. The only error returned
    /// after startup is [`JobsiftError::SeedUnreachable`].
    pub async fn run(self) -> Result<CrawlStats, JobsiftError> {
        tracing::info!(
            "Starting crawl at {} (budget {}, concurrency {})",
            self.seed,
            self.budget.target(),
            self.max_concurrency
        );

        self.crawl_seed().await?;
        self.enqueue_extra_seeds();

        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut workers = JoinSet::new();

        loop {
            reap_finished(&mut workers);

            if !self.budget.is_exhausted() {
                if let Some(request) = self.frontier.pop() {
                    let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
                        break;
                    };

                    let fetcher = Arc::clone(&self.fetcher);
                    let router = Arc::clone(&self.router);
                    let stats = Arc::clone(&self.stats);
                    workers.spawn(async move {
                        let _permit = permit;
                        process_request(fetcher.as_ref(), &router, &stats, request).await;
                    });
                    continue;
                }
            }

            // Nothing to dispatch right now; wait for a worker to finish
            match workers.join_next().await {
                Some(joined) => log_worker_exit(joined),
                None => break,
            }
        }

        let abandoned = self.frontier.drain();
        if self.budget.is_exhausted() {
            tracing::info!(
                "Job budget exhausted, {} queued requests left unvisited",
                abandoned
            );
        } else {
            tracing::info!("Frontier is empty, crawl complete");
        }

        let stats = self.stats.snapshot();
        tracing::info!(
            "Crawl completed: {} records from {} postings in {:.1}s",
            stats.records_emitted,
            stats.detail_pages,
            stats.duration_seconds
        );
        Ok(stats)
    }

    /// Fetches and routes the seed listing inline
    async fn crawl_seed(&self) -> Result<(), JobsiftError> {
        let seed = CrawlRequest::listing(self.seed.clone());

        if !is_on_site(seed.url(), &self.site_domain) {
            self.stats.misrouted();
            return Err(JobsiftError::Misrouted {
                url: seed.url().to_string(),
                reason: format!("seed host is outside {}", self.site_domain),
            });
        }
        self.frontier.mark_seen(seed.url());

        match self.fetcher.fetch(seed.url()).await {
            Ok(html) => {
                self.router.route(&seed, &html);
                Ok(())
            }
            Err(e) => {
                tracing::error!("Seed listing unreachable: {}", e);
                self.stats.fetch_failure();
                Err(JobsiftError::SeedUnreachable {
                    url: seed.url().to_string(),
                    reason: e.to_string(),
                })
            }
        }
    }

    fn enqueue_extra_seeds(&self) {
        for entry in &self.extra_seeds {
            match CrawlRequest::from_raw(&entry.url, entry.label.as_deref(), &self.site_domain) {
                Ok(request) => {
                    tracing::debug!("Queuing extra seed {} [{}]", request.url(), request.label());
                    self.router.enqueue(request);
                }
                Err(JobsiftError::Misrouted { .. }) => self.stats.misrouted(),
                Err(e) => {
                    tracing::warn!("Ignoring extra seed {}: {}", entry.url, e);
                    self.stats.misrouted();
                }
            }
        }
    }
}

/// One worker step: fetch, then parse and route without awaiting
/// Collects every worker that already finished, returning how many
fn reap_finished(workers: &mut JoinSet<()>) -> usize {
    let mut reaped = 0;
    while let Some(joined) = workers.try_join_next() {
        log_worker_exit(joined);
        reaped += 1;
    }
    reaped
}

fn log_worker_exit(joined: Result<(), JoinError>) {
    if let Err(e) = joined {
        tracing::error!("Worker task failed: {}", e);
    }
}

async fn process_request(
    fetcher: &dyn Fetcher,
    router: &Router,
    stats: &StatsCollector,
    request: CrawlRequest,
) {
    tracing::debug!("Fetching {} [{}]", request.url(), request.label());

    match fetcher.fetch(request.url()).await {
        Ok(html) => {
            router.route(&request, &html);
        }
        Err(e) => {
            tracing::warn!("Dropping {} request: {}", request.label(), e);
            stats.fetch_failure();
        }
    }
}
