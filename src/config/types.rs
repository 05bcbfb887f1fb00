use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Default listing page the crawl starts from
pub const DEFAULT_SEARCH_URL: &str = "https://www.finn.no/job/fulltime/search.html";

/// Default wildcard pattern for hosts that belong to the target site
pub const DEFAULT_SITE_DOMAIN: &str = "*.finn.no";

/// Main configuration structure for Jobsift
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default, rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub output: OutputConfig,
    /// Extra raw requests queued next to the search URL
    #[serde(default)]
    pub seed: Vec<SeedEntry>,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Listing page the crawl is seeded with
    #[serde(rename = "search-url")]
    pub search_url: String,

    /// Maximum number of records to emit
    #[serde(rename = "max-jobs")]
    pub max_jobs: usize,

    /// Maximum number of concurrent page fetches
    #[serde(rename = "max-concurrency")]
    pub max_concurrency: usize,

    /// Hosts accepted by the router (e.g. "*.finn.no")
    #[serde(rename = "site-domain")]
    pub site_domain: String,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            search_url: DEFAULT_SEARCH_URL.to_string(),
            max_jobs: 100,
            max_concurrency: 10,
            site_domain: DEFAULT_SITE_DOMAIN.to_string(),
        }
    }
}

/// HTTP fetch behavior
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Whole-request timeout in seconds
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// Retries for 5xx, 429 and timeouts
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Base delay between retries (multiplied by the attempt number)
    #[serde(rename = "retry-delay-ms")]
    pub retry_delay_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_retries: 3,
            retry_delay_ms: 500,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "jobsift".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: "https://github.com/jobsift/jobsift".to_string(),
            contact_email: "crawler@jobsift.dev".to_string(),
        }
    }
}

impl UserAgentConfig {
    /// Formats the header value: `Name/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path of the JSON Lines file or SQLite database
    #[serde(rename = "records-path")]
    pub records_path: String,

    /// Which sink the records go to
    pub format: OutputFormat,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            records_path: "./jobs.jsonl".to_string(),
            format: OutputFormat::Jsonl,
        }
    }
}

/// Persistence format for emitted records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Jsonl,
    Sqlite,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "jsonl" | "json" => Ok(Self::Jsonl),
            "sqlite" | "db" => Ok(Self::Sqlite),
            other => Err(format!("unknown output format '{}'", other)),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Jsonl => write!(f, "jsonl"),
            Self::Sqlite => write!(f, "sqlite"),
        }
    }
}

/// A raw request supplied from outside the crawl
#[derive(Debug, Clone, Deserialize)]
pub struct SeedEntry {
    pub url: String,

    /// "LIST" or "DETAIL"; anything else is treated as unlabeled
    #[serde(default)]
    pub label: Option<String>,
}
