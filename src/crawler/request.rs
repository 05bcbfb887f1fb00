//! Crawl requests and their routing labels

use crate::url::{classify_url, UrlKind};
use crate::JobsiftError;
use std::fmt;
use std::str::FromStr;
use url::Url;

/// Which handler processes a fetched page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Label {
    /// A search result page: yields detail links and pagination
    Listing,
    /// A single posting: yields one record
    Detail,
}

impl Label {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Listing => "LIST",
            Self::Detail => "DETAIL",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Label {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LIST" | "LISTING" => Ok(Self::Listing),
            "DETAIL" => Ok(Self::Detail),
            other => Err(format!("unrecognized label '{}'", other)),
        }
    }
}

/// A unit of crawl work. Immutable once enqueued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlRequest {
    url: Url,
    label: Label,
}

impl CrawlRequest {
    pub fn new(url: Url, label: Label) -> Self {
        Self { url, label }
    }

    pub fn listing(url: Url) -> Self {
        Self::new(url, Label::Listing)
    }

    pub fn detail(url: Url) -> Self {
        Self::new(url, Label::Detail)
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn label(&self) -> Label {
        self.label
    }

    /// Builds a request from externally supplied strings
    ///
    /// Missing or unrecognized labels are rejected as misrouted. The URL is
    /// classified by shape so the warning says what the request looked like;
    /// such requests are never queued.
    pub fn from_raw(
        url: &str,
        label: Option<&str>,
        site_domain: &str,
    ) -> Result<Self, JobsiftError> {
        let parsed = Url::parse(url)?;

        let Some(raw_label) = label else {
            return Err(misrouted(&parsed, "missing label", site_domain));
        };

        match raw_label.parse::<Label>() {
            Ok(label) => Ok(Self::new(parsed, label)),
            Err(reason) => Err(misrouted(&parsed, &reason, site_domain)),
        }
    }
}

fn misrouted(url: &Url, reason: &str, site_domain: &str) -> JobsiftError {
    let shape = match classify_url(url, site_domain) {
        UrlKind::Listing => "listing-like",
        UrlKind::Detail => "detail-like",
        UrlKind::Other => "unrecognized on-site",
        UrlKind::Foreign => "foreign",
    };
    tracing::warn!("Unlabeled request {} ({}): {}", url, shape, reason);
    JobsiftError::Misrouted {
        url: url.to_string(),
        reason: format!("{} ({} URL)", reason, shape),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_parsing() {
        assert_eq!("LIST".parse::<Label>(), Ok(Label::Listing));
        assert_eq!("detail".parse::<Label>(), Ok(Label::Detail));
        assert!("DEFAULT".parse::<Label>().is_err());
    }

    #[test]
    fn test_from_raw_labeled() {
        let request = CrawlRequest::from_raw(
            "https://www.finn.no/job/fulltime/ad.html?finnkode=1",
            Some("DETAIL"),
            "*.finn.no",
        )
        .unwrap();
        assert_eq!(request.label(), Label::Detail);
    }

    #[test]
    fn test_from_raw_missing_label_is_misrouted() {
        let result = CrawlRequest::from_raw(
            "https://www.finn.no/job/fulltime/ad.html?finnkode=1",
            None,
            "*.finn.no",
        );
        match result {
            Err(JobsiftError::Misrouted { reason, .. }) => {
                assert!(reason.contains("detail-like"), "reason was {}", reason)
            }
            other => panic!("expected misrouted, got {:?}", other),
        }
    }

    #[test]
    fn test_from_raw_unknown_label_is_misrouted() {
        let result = CrawlRequest::from_raw(
            "https://www.finn.no/job/fulltime/search.html",
            Some("SITEMAP"),
            "*.finn.no",
        );
        assert!(matches!(result, Err(JobsiftError::Misrouted { .. })));
    }
}
