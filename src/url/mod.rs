//! URL handling module for Jobsift
//!
//! This module provides frontier-key normalization, host extraction, wildcard
//! matching against the target site, and URL-shape classification.

mod normalize;

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

pub use normalize::{frontier_key, normalize_url};

static DETAIL_PATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)/ad(?:\.html|/\d+)/?$").expect("valid detail path regex"));

static LISTING_PATH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:/search(?:\.html)?|/stillinger|/jobs?)/?$").expect("valid listing regex")
});

/// What a URL looks like, judged by its shape alone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UrlKind {
    /// Search result / pagination page
    Listing,
    /// A single posting
    Detail,
    /// On the target site, but neither of the above
    Other,
    /// Host outside the target site
    Foreign,
}

/// Extracts the lowercase host of a URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use jobsift::url::extract_domain;
///
/// let url = Url::parse("https://WWW.Finn.no/job").unwrap();
/// assert_eq!(extract_domain(&url), Some("www.finn.no".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Checks if a host matches a site pattern
///
/// `"finn.no"` matches only itself; `"*.finn.no"` matches the bare domain and
/// any subdomain of it. Hosts are expected lowercase.
pub fn matches_wildcard(pattern: &str, candidate: &str) -> bool {
    match pattern.strip_prefix("*.") {
        Some(base) => candidate == base || candidate.ends_with(&format!(".{}", base)),
        None => candidate == pattern,
    }
}

/// True when the URL is http(s) and its host belongs to the target site
pub fn is_on_site(url: &Url, site_domain: &str) -> bool {
    if url.scheme() != "http" && url.scheme() != "https" {
        return false;
    }
    extract_domain(url).is_some_and(|host| matches_wildcard(site_domain, &host))
}

/// Classifies a URL by shape for routing diagnostics
pub fn classify_url(url: &Url, site_domain: &str) -> UrlKind {
    if !is_on_site(url, site_domain) {
        return UrlKind::Foreign;
    }

    if is_detail_shape(url) {
        UrlKind::Detail
    } else if is_listing_shape(url) {
        UrlKind::Listing
    } else {
        UrlKind::Other
    }
}

/// Posting pages: `ad.html?finnkode=N` or `/ad/N`
pub fn is_detail_shape(url: &Url) -> bool {
    url.query_pairs().any(|(k, _)| k == "finnkode") || DETAIL_PATH.is_match(url.path())
}

/// Listing pages: a search path or any `page=` query
pub fn is_listing_shape(url: &Url) -> bool {
    url.query_pairs().any(|(k, _)| k == "page") || LISTING_PATH.is_match(url.path())
}
