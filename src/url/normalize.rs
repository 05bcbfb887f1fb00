use crate::UrlError;
use url::Url;

/// Query parameters that never change which posting or listing page is served
const TRACKING_PARAMS: &[&str] = &[
    "fbclid", "gclid", "mc_eid", "ref", "source", "origin", "searchid", "sort_id",
];

/// Normalizes a URL into the key the frontier deduplicates on
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed or not http(s)
/// 2. Lowercase the host and drop a `www.` prefix
/// 3. Collapse empty and dot segments, drop the trailing slash (except root)
/// 4. Remove the fragment
/// 5. Remove tracking query parameters, sort the rest by key
///
/// The scheme is kept so that plain-http test servers still resolve.
///
/// # Examples
///
/// ```
/// use jobsift::url::normalize_url;
///
/// let url = normalize_url("https://WWW.FINN.NO/job/ad.html?origin=x&finnkode=42#top").unwrap();
/// assert_eq!(url.as_str(), "https://finn.no/job/ad.html?finnkode=42");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    let host = url
        .host_str()
        .map(|h| h.to_lowercase())
        .ok_or(UrlError::MissingDomain)?;
    let host = host.strip_prefix("www.").unwrap_or(&host).to_string();
    url.set_host(Some(&host))
        .map_err(|e| UrlError::Malformed(format!("Failed to set host: {}", e)))?;

    let path = normalize_path(url.path());
    url.set_path(&path);
    url.set_fragment(None);

    if url.query().is_some() {
        let params = filter_and_sort_query_params(&url);
        if params.is_empty() {
            url.set_query(None);
        } else {
            let mut serializer = url::form_urlencoded::Serializer::new(String::new());
            for (key, value) in &params {
                serializer.append_pair(key, value);
            }
            url.set_query(Some(&serializer.finish()));
        }
    }

    Ok(url)
}

/// Dedup key for an already-parsed URL; falls back to the raw string
pub fn frontier_key(url: &Url) -> String {
    normalize_url(url.as_str())
        .map(|u| u.to_string())
        .unwrap_or_else(|_| url.to_string())
}

fn normalize_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }

    format!("/{}", segments.join("/"))
}

fn filter_and_sort_query_params(url: &Url) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !is_tracking_param(key))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    params.sort();
    params
}

fn is_tracking_param(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    key.starts_with("utm_") || TRACKING_PARAMS.contains(&key.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheme_is_preserved() {
        let result = normalize_url("http://127.0.0.1:8080/search").unwrap();
        assert_eq!(result.as_str(), "http://127.0.0.1:8080/search");
    }

    #[test]
    fn test_remove_www_and_lowercase_host() {
        let result = normalize_url("https://WWW.Finn.NO/Job").unwrap();
        assert_eq!(result.as_str(), "https://finn.no/Job");
    }

    #[test]
    fn test_remove_trailing_slash_keep_root() {
        assert_eq!(
            normalize_url("https://finn.no/job/").unwrap().as_str(),
            "https://finn.no/job"
        );
        assert_eq!(
            normalize_url("https://finn.no/").unwrap().as_str(),
            "https://finn.no/"
        );
    }

    #[test]
    fn test_remove_fragment() {
        let result = normalize_url("https://finn.no/ad.html?finnkode=1#contact").unwrap();
        assert_eq!(result.as_str(), "https://finn.no/ad.html?finnkode=1");
    }

    #[test]
    fn test_tracking_params_removed_and_sorted() {
        let result = normalize_url(
            "https://finn.no/search.html?q=rust&utm_source=mail&page=2&searchId=abc",
        )
        .unwrap();
        assert_eq!(result.as_str(), "https://finn.no/search.html?page=2&q=rust");
    }

    #[test]
    fn test_only_tracking_params_drops_query() {
        let result = normalize_url("https://finn.no/ad.html?origin=frontpage&fbclid=1").unwrap();
        assert_eq!(result.as_str(), "https://finn.no/ad.html");
    }

    #[test]
    fn test_dot_segments() {
        let result = normalize_url("https://finn.no/a/../b/./c//d").unwrap();
        assert_eq!(result.as_str(), "https://finn.no/b/c/d");
    }

    #[test]
    fn test_invalid_scheme() {
        let result = normalize_url("mailto:ola@firma.no");
        assert!(matches!(result, Err(UrlError::InvalidScheme(_))));
    }

    #[test]
    fn test_malformed_url() {
        assert!(matches!(
            normalize_url("not a url"),
            Err(UrlError::Parse(_))
        ));
    }

    #[test]
    fn test_frontier_key_equivalence() {
        let a = Url::parse("https://www.finn.no/ad.html?finnkode=7&utm_medium=x").unwrap();
        let b = Url::parse("https://finn.no/ad.html?finnkode=7#top").unwrap();
        assert_eq!(frontier_key(&a), frontier_key(&b));
    }
}
