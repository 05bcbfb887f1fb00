//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use jobsift::config::{Config, CrawlerConfig, FetchConfig, OutputConfig, OutputFormat};
use jobsift::crawler::{crawl, Coordinator, HttpFetcher};
use jobsift::storage::{MemorySink, SqliteSink};
use jobsift::{JobRecord, JobsiftError};
use std::sync::Arc;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SEARCH_PATH: &str = "/job/fulltime/search.html";
const AD_PATH: &str = "/job/fulltime/ad.html";

/// Creates a test configuration crawling the mock server
fn create_test_config(server: &MockServer, max_jobs: usize, output: OutputConfig) -> Config {
    let host = url::Url::parse(&server.uri())
        .expect("Failed to parse base URL")
        .host_str()
        .expect("Failed to extract host")
        .to_string();

    Config {
        crawler: CrawlerConfig {
            search_url: format!("{}{}", server.uri(), SEARCH_PATH),
            max_jobs,
            max_concurrency: 4,
            site_domain: host,
        },
        fetch: FetchConfig {
            timeout_secs: 5,
            max_retries: 0,
            retry_delay_ms: 1,
        },
        output,
        ..Config::default()
    }
}

fn listing_page(ids: std::ops::RangeInclusive<usize>, next_page: Option<u32>) -> String {
    let mut html = String::from("<html><head><title>Ledige stillinger</title></head><body>");
    for id in ids {
        html.push_str(&format!(
            r#"<article class="sf-search-ad"><h2><a class="sf-search-ad-link" href="{}?finnkode={}">Stilling {}</a></h2></article>"#,
            AD_PATH, id, id
        ));
    }
    if let Some(page) = next_page {
        html.push_str(&format!(
            r#"<nav aria-label="Pagination"><a href="{}?page={}">{}</a></nav>"#,
            SEARCH_PATH, page, page
        ));
    }
    html.push_str("</body></html>");
    html
}

fn simple_posting(id: usize) -> String {
    format!(
        "<html><body><h1>Stilling {}</h1><p>Firma {} AS</p></body></html>",
        id, id
    )
}

const RICH_POSTING: &str = r#"<html><body>
    <h1>Backend-utvikler</h1>
    <p>Acme Teknologi AS</p>
    <dl>
      <dt>Sted</dt><dd>Bergen</dd>
      <dt>Frist</dt><dd>15.03.2025</dd>
    </dl>
    <section class="contact">
      <div class="contact-person">
        <h3>Kari Nordmann</h3>
        <p>Telefon: 900 00 001</p>
        <p>E-post: kari@acme.no</p>
      </div>
      <div class="contact-person">
        <h3>Ola Hansen</h3>
        <p>Mobil: 900 00 002</p>
        <p>E-post: ola [at] acme [dot] no</p>
      </div>
    </section>
</body></html>"#;

/// Page-specific listings must be mounted before the bare one, which
/// matches any query string
async fn mount_listing(server: &MockServer, page: Option<u32>, body: String, expected: u64) {
    let mock = Mock::given(method("GET")).and(path(SEARCH_PATH));
    let mock = match page {
        Some(page) => mock.and(query_param("page", page.to_string())),
        None => mock,
    };
    mock.respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(expected)
        .mount(server)
        .await;
}

async fn mount_posting(server: &MockServer, id: usize, body: String) {
    Mock::given(method("GET"))
        .and(path(AD_PATH))
        .and(query_param("finnkode", id.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

fn read_jsonl(path: &std::path::Path) -> Vec<JobRecord> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[tokio::test]
async fn test_full_crawl_writes_jsonl_records() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let records_path = dir.path().join("jobs.jsonl");

    mount_listing(&server, None, listing_page(1..=2, None), 1).await;
    mount_posting(&server, 1, RICH_POSTING.to_string()).await;
    mount_posting(&server, 2, simple_posting(2)).await;

    let config = create_test_config(
        &server,
        10,
        OutputConfig {
            records_path: records_path.display().to_string(),
            format: OutputFormat::Jsonl,
        },
    );

    let stats = crawl(&config).await.unwrap();
    assert_eq!(stats.listing_pages, 1);
    assert_eq!(stats.detail_pages, 2);
    assert_eq!(stats.records_emitted, 2);

    let mut records = read_jsonl(&records_path);
    records.sort_by(|a, b| a.title.cmp(&b.title));
    assert_eq!(records.len(), 2);

    let rich = &records[0];
    assert_eq!(rich.title, "Backend-utvikler");
    assert_eq!(rich.company, "Acme Teknologi AS");
    assert_eq!(rich.location.as_deref(), Some("Bergen"));
    assert_eq!(rich.expiration_date.as_deref(), Some("2025-03-15"));
    assert_eq!(rich.external_id.as_deref(), Some("1"));
    assert_eq!(rich.email.as_deref(), Some("kari@acme.no"));
    assert_eq!(rich.contact_persons.len(), 2);
    assert_eq!(rich.contact_persons[0].name, "Kari Nordmann");
    assert_eq!(rich.contact_persons[1].name, "Ola Hansen");
    assert_eq!(rich.contact_persons[1].email.as_deref(), Some("ola@acme.no"));
    assert_eq!(
        rich.contact_persons[1].phone_number.as_deref(),
        Some("900 00 002")
    );

    let simple = &records[1];
    assert_eq!(simple.title, "Stilling 2");
    assert!(simple.contact_persons.is_empty());
}

#[tokio::test]
async fn test_budget_caps_records_under_concurrency() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("jobs.db");

    // Remaining budget never exceeds the ten links on page one
    mount_listing(&server, Some(2), listing_page(11..=20, None), 0).await;
    mount_listing(&server, None, listing_page(1..=10, Some(2)), 1).await;
    for id in 1..=20 {
        mount_posting(&server, id, simple_posting(id)).await;
    }

    let config = create_test_config(
        &server,
        4,
        OutputConfig {
            records_path: db_path.display().to_string(),
            format: OutputFormat::Sqlite,
        },
    );

    let stats = crawl(&config).await.unwrap();
    assert_eq!(stats.records_emitted, 4);

    let sink = SqliteSink::new(&db_path).unwrap();
    let records = sink.records().unwrap();
    assert_eq!(records.len(), 4);

    let mut urls: Vec<&str> = records.iter().map(|r| r.url.as_str()).collect();
    urls.sort();
    urls.dedup();
    assert_eq!(urls.len(), 4, "record URLs must be unique");
}

#[tokio::test]
async fn test_pagination_followed_while_budget_remains() {
    let server = MockServer::start().await;

    mount_listing(&server, Some(2), listing_page(3..=4, None), 1).await;
    mount_listing(&server, None, listing_page(1..=2, Some(2)), 1).await;
    for id in 1..=4 {
        mount_posting(&server, id, simple_posting(id)).await;
    }

    let config = create_test_config(&server, 10, OutputConfig::default());
    let fetcher = HttpFetcher::new(&config.fetch, &config.user_agent).unwrap();
    let sink = Arc::new(MemorySink::new());

    let stats = Coordinator::new(&config.crawler, Vec::new(), Arc::new(fetcher), sink.clone())
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(stats.listing_pages, 2);
    assert_eq!(sink.len(), 4);
}

#[tokio::test]
async fn test_unreachable_seed_reports_single_failure() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let config = create_test_config(&server, 10, OutputConfig::default());
    let fetcher = HttpFetcher::new(&config.fetch, &config.user_agent).unwrap();
    let sink = Arc::new(MemorySink::new());

    let result = Coordinator::new(&config.crawler, Vec::new(), Arc::new(fetcher), sink.clone())
        .unwrap()
        .run()
        .await;

    match result {
        Err(JobsiftError::SeedUnreachable { reason, .. }) => assert!(reason.contains("500")),
        other => panic!("expected SeedUnreachable, got {:?}", other.map(|s| s.records_emitted)),
    }
    assert!(sink.is_empty());
}

#[tokio::test]
async fn test_broken_postings_do_not_stop_crawl() {
    let server = MockServer::start().await;

    mount_listing(&server, None, listing_page(1..=3, None), 1).await;
    mount_posting(&server, 1, simple_posting(1)).await;
    mount_posting(&server, 2, "<html><body><p>Fjernet</p></body></html>".to_string()).await;
    Mock::given(method("GET"))
        .and(path(AD_PATH))
        .and(query_param("finnkode", "3"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let config = create_test_config(&server, 10, OutputConfig::default());
    let fetcher = HttpFetcher::new(&config.fetch, &config.user_agent).unwrap();
    let sink = Arc::new(MemorySink::new());

    let stats = Coordinator::new(&config.crawler, Vec::new(), Arc::new(fetcher), sink.clone())
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(sink.len(), 1);
    assert_eq!(stats.extraction_failures, 1);
    assert_eq!(stats.fetch_failures, 1);
}
