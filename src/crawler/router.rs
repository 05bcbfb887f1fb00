//! Label dispatch: listing pages feed the frontier, posting pages feed the sink

use crate::crawler::budget::JobBudget;
use crate::crawler::emitter::{Emission, RecordEmitter};
use crate::crawler::frontier::Frontier;
use crate::crawler::request::{CrawlRequest, Label};
use crate::extract::{extract_job, ListingExtractor};
use crate::output::StatsCollector;
use crate::storage::RecordSink;
use crate::url::is_on_site;
use crate::ExtractionError;
use scraper::Html;
use std::sync::Arc;
use url::Url;

/// Result of routing one fetched page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    /// Listing page: how many requests of each kind were queued
    Listing { details: usize, pages: usize },
    /// Posting page: what the emitter did with the record
    Detail(Emission),
    /// Posting page without the required fields
    ExtractionFailed(ExtractionError),
    /// Host outside the target site
    Misrouted,
}

/// The crawl state machine
///
/// Pages are dispatched by their request label. Parsing happens entirely
/// inside [`Router::route`], so no parsed document outlives the call.
pub struct Router {
    site_domain: String,
    listing: ListingExtractor,
    frontier: Arc<Frontier>,
    budget: Arc<JobBudget>,
    emitter: RecordEmitter,
    stats: Arc<StatsCollector>,
}

impl Router {
    pub fn new(
        site_domain: impl Into<String>,
        frontier: Arc<Frontier>,
        budget: Arc<JobBudget>,
        sink: Arc<dyn RecordSink>,
        stats: Arc<StatsCollector>,
    ) -> Self {
        Self {
            site_domain: site_domain.into(),
            listing: ListingExtractor::new(),
            emitter: RecordEmitter::new(Arc::clone(&budget), sink, Arc::clone(&stats)),
            frontier,
            budget,
            stats,
        }
    }

    /// Queues a request unless it is off-site or its URL was seen before
    pub fn enqueue(&self, request: CrawlRequest) -> bool {
        if !is_on_site(request.url(), &self.site_domain) {
            tracing::warn!(
                "Rejecting {} request for foreign host: {}",
                request.label(),
                request.url()
            );
            self.stats.misrouted();
            return false;
        }

        if !self.frontier.push(request) {
            self.stats.duplicate();
            return false;
        }
        true
    }

    /// Runs the handler selected by the request label
    pub fn route(&self, request: &CrawlRequest, html: &str) -> RouteOutcome {
        if !is_on_site(request.url(), &self.site_domain) {
            tracing::warn!("Refusing to route foreign page {}", request.url());
            self.stats.misrouted();
            return RouteOutcome::Misrouted;
        }

        match request.label() {
            Label::Listing => self.route_listing(request.url(), html),
            Label::Detail => self.route_detail(request.url(), html),
        }
    }

    fn route_listing(&self, url: &Url, html: &str) -> RouteOutcome {
        self.stats.listing_page();
        let page = {
            let document = Html::parse_document(html);
            self.listing.extract(&document, url)
        };

        let remaining = self.budget.remaining();
        let found = page.job_links.len();

        let mut details = 0;
        for link in page.job_links {
            if details >= remaining {
                break;
            }
            if self.enqueue(CrawlRequest::detail(link)) {
                details += 1;
            }
        }

        // More pages are only worth visiting if this one cannot fill the budget
        let mut pages = 0;
        if remaining > found {
            for link in page.pagination_links {
                if self.enqueue(CrawlRequest::listing(link)) {
                    pages += 1;
                }
            }
        }

        tracing::debug!(
            "Listing {}: {} links found, {} postings and {} pages queued (remaining budget {})",
            url,
            found,
            details,
            pages,
            remaining
        );

        RouteOutcome::Listing { details, pages }
    }

    fn route_detail(&self, url: &Url, html: &str) -> RouteOutcome {
        self.stats.detail_page();
        match extract_job(html, url) {
            Ok(record) => RouteOutcome::Detail(self.emitter.emit(record)),
            Err(e) => {
                tracing::warn!("Skipping posting {}: {}", url, e);
                self.stats.extraction_failure();
                RouteOutcome::ExtractionFailed(e)
            }
        }
    }
}
