//! Crawl statistics
//!
//! Workers bump counters on a shared [`StatsCollector`]; the coordinator
//! takes a [`CrawlStats`] snapshot when the crawl ends.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters shared by all workers of one crawl
#[derive(Debug)]
pub struct StatsCollector {
    started_at: DateTime<Utc>,
    listing_pages: AtomicU64,
    detail_pages: AtomicU64,
    records_emitted: AtomicU64,
    fetch_failures: AtomicU64,
    extraction_failures: AtomicU64,
    misrouted: AtomicU64,
    duplicates: AtomicU64,
    budget_rejections: AtomicU64,
    sink_failures: AtomicU64,
}

impl Default for StatsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl StatsCollector {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            listing_pages: AtomicU64::new(0),
            detail_pages: AtomicU64::new(0),
            records_emitted: AtomicU64::new(0),
            fetch_failures: AtomicU64::new(0),
            extraction_failures: AtomicU64::new(0),
            misrouted: AtomicU64::new(0),
            duplicates: AtomicU64::new(0),
            budget_rejections: AtomicU64::new(0),
            sink_failures: AtomicU64::new(0),
        }
    }

    pub fn listing_page(&self) {
        self.listing_pages.fetch_add(1, Ordering::Relaxed);
    }

    pub fn detail_page(&self) {
        self.detail_pages.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_emitted(&self) {
        self.records_emitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn fetch_failure(&self) {
        self.fetch_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn extraction_failure(&self) {
        self.extraction_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn misrouted(&self) {
        self.misrouted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn duplicate(&self) {
        self.duplicates.fetch_add(1, Ordering::Relaxed);
    }

    pub fn budget_rejection(&self) {
        self.budget_rejections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn sink_failure(&self) {
        self.sink_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of every counter
    pub fn snapshot(&self) -> CrawlStats {
        let finished_at = Utc::now();
        CrawlStats {
            started_at: self.started_at,
            finished_at,
            duration_seconds: (finished_at - self.started_at).num_milliseconds().max(0) as f64
                / 1000.0,
            listing_pages: self.listing_pages.load(Ordering::Relaxed),
            detail_pages: self.detail_pages.load(Ordering::Relaxed),
            records_emitted: self.records_emitted.load(Ordering::Relaxed),
            fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
            extraction_failures: self.extraction_failures.load(Ordering::Relaxed),
            misrouted: self.misrouted.load(Ordering::Relaxed),
            duplicates: self.duplicates.load(Ordering::Relaxed),
            budget_rejections: self.budget_rejections.load(Ordering::Relaxed),
            sink_failures: self.sink_failures.load(Ordering::Relaxed),
        }
    }
}

/// Crawl statistics summary
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlStats {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_seconds: f64,

    /// Listing pages fetched and routed
    pub listing_pages: u64,

    /// Posting pages fetched and routed
    pub detail_pages: u64,

    /// Records handed to the sink
    pub records_emitted: u64,

    /// Requests dropped because the fetch failed
    pub fetch_failures: u64,

    /// Postings dropped because no title was found
    pub extraction_failures: u64,

    /// Requests rejected for a bad label or a foreign host
    pub misrouted: u64,

    /// URLs or records seen twice
    pub duplicates: u64,

    /// Postings parsed after the budget was spent
    pub budget_rejections: u64,

    /// Records the sink refused for reasons other than a duplicate URL
    pub sink_failures: u64,
}

impl CrawlStats {
    /// Share of fetched postings that became records, in percent
    pub fn success_rate(&self) -> f64 {
        if self.detail_pages == 0 {
            0.0
        } else {
            (self.records_emitted as f64 / self.detail_pages as f64) * 100.0
        }
    }
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CrawlStats) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Started: {}", stats.started_at.to_rfc3339());
    println!("  Duration: {:.1}s", stats.duration_seconds);
    println!("  Records emitted: {}", stats.records_emitted);
    println!();

    println!("Pages:");
    println!("  Listing pages: {}", stats.listing_pages);
    println!("  Posting pages: {}", stats.detail_pages);
    println!();

    let problems = [
        ("Fetch failures", stats.fetch_failures),
        ("Extraction failures", stats.extraction_failures),
        ("Misrouted requests", stats.misrouted),
        ("Duplicates", stats.duplicates),
        ("Over budget", stats.budget_rejections),
        ("Sink failures", stats.sink_failures),
    ];
    if problems.iter().any(|(_, count)| *count > 0) {
        println!("Dropped:");
        for (label, count) in problems.iter().filter(|(_, count)| *count > 0) {
            println!("  {}: {}", label, count);
        }
        println!();
    }

    println!(
        "Success Rate: {:.1}% ({} / {} postings extracted)",
        stats.success_rate(),
        stats.records_emitted,
        stats.detail_pages
    );
}
