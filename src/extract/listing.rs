//! Listing pages: detail links and pagination links

use crate::extract::dom::{compile_chain, origin_base, resolve_link, selector};
use crate::url::{frontier_key, is_detail_shape};
use crate::ExtractionError;
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Job-link selectors, most specific first
pub const DEFAULT_JOB_LINK_CHAIN: &[&str] = &[
    "article.sf-search-ad h2 a.sf-search-ad-link",
    "a.sf-search-ad-link",
    "article[data-testid='job-ad'] a[href]",
    ".ads__unit__link",
    "a[href*='/job/fulltime/ad.html']",
];

/// Pagination selectors, most specific first
pub const DEFAULT_PAGINATION_CHAIN: &[&str] = &[
    "nav[aria-label='Pagination'] a[href]",
    ".pagination a[href]",
    "a[rel='next']",
];

/// Links found on one listing page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingPage {
    /// Absolute detail URLs in page order, deduplicated
    pub job_links: Vec<Url>,
    /// Absolute pagination URLs in page order, deduplicated
    pub pagination_links: Vec<Url>,
}

/// Finds links on a listing page with ordered selector-fallback chains
///
/// Each chain is tried selector by selector; the first selector that yields
/// at least one usable link wins. When the whole chain comes up empty a
/// broad pattern match over every anchor on the page is used instead.
#[derive(Debug, Clone)]
pub struct ListingExtractor {
    job_links: Vec<Selector>,
    pagination: Vec<Selector>,
    any_link: Option<Selector>,
}

impl Default for ListingExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl ListingExtractor {
    pub fn new() -> Self {
        Self {
            job_links: compile_chain(DEFAULT_JOB_LINK_CHAIN),
            pagination: compile_chain(DEFAULT_PAGINATION_CHAIN),
            any_link: selector("a[href]"),
        }
    }

    /// Builds an extractor with custom chains, rejecting invalid CSS
    pub fn with_selectors(job_links: &[&str], pagination: &[&str]) -> Result<Self, ExtractionError> {
        Ok(Self {
            job_links: parse_chain(job_links)?,
            pagination: parse_chain(pagination)?,
            any_link: selector("a[href]"),
        })
    }

    pub fn extract(&self, document: &Html, page_url: &Url) -> ListingPage {
        let base = origin_base(page_url);

        let job_links = self
            .run_chain(document, &self.job_links, &base)
            .unwrap_or_else(|| self.broad_match(document, &base, is_detail_shape));

        let own_key = frontier_key(page_url);
        let pagination_links: Vec<Url> = self
            .run_chain(document, &self.pagination, &base)
            .unwrap_or_else(|| self.broad_match(document, &base, has_page_param))
            .into_iter()
            .filter(|url| frontier_key(url) != own_key)
            .collect();

        tracing::debug!(
            "Listing {}: {} job links, {} pagination links",
            page_url,
            job_links.len(),
            pagination_links.len()
        );

        ListingPage {
            job_links,
            pagination_links,
        }
    }

    fn run_chain(&self, document: &Html, chain: &[Selector], base: &Url) -> Option<Vec<Url>> {
        chain.iter().enumerate().find_map(|(position, sel)| {
            let links = dedup(
                document
                    .select(sel)
                    .filter_map(|a| a.value().attr("href"))
                    .filter_map(|href| resolve_link(href, base)),
            );
            if links.is_empty() {
                None
            } else {
                tracing::trace!("Selector #{} matched {} links", position, links.len());
                Some(links)
            }
        })
    }

    fn broad_match(&self, document: &Html, base: &Url, keep: fn(&Url) -> bool) -> Vec<Url> {
        let Some(any_link) = &self.any_link else {
            return Vec::new();
        };
        dedup(
            document
                .select(any_link)
                .filter_map(|a| a.value().attr("href"))
                .filter_map(|href| resolve_link(href, base))
                .filter(|url| keep(url)),
        )
    }
}

fn has_page_param(url: &Url) -> bool {
    url.query_pairs().any(|(k, _)| k == "page")
}

fn parse_chain(chain: &[&str]) -> Result<Vec<Selector>, ExtractionError> {
    chain
        .iter()
        .map(|css| {
            Selector::parse(css)
                .map_err(|e| ExtractionError::Html(format!("invalid selector '{}': {:?}", css, e)))
        })
        .collect()
}

fn dedup(links: impl Iterator<Item = Url>) -> Vec<Url> {
    let mut seen = HashSet::new();
    links.filter(|url| seen.insert(frontier_key(url))).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_url() -> Url {
        Url::parse("https://www.finn.no/job/fulltime/search.html").unwrap()
    }

    fn ad_links(class: &str, count: usize) -> String {
        (1..=count)
            .map(|i| {
                format!(
                    "<article class='result'><a class='{}' href='/job/fulltime/ad.html?finnkode={}'>Jobb {}</a></article>",
                    class, i, i
                )
            })
            .collect()
    }

    #[test]
    fn test_primary_selector() {
        let html = Html::parse_document(&format!(
            "<html><body>{}</body></html>",
            ad_links("sf-search-ad-link", 3)
        ));
        let page = ListingExtractor::new().extract(&html, &page_url());

        assert_eq!(page.job_links.len(), 3);
        assert_eq!(
            page.job_links[0].as_str(),
            "https://www.finn.no/job/fulltime/ad.html?finnkode=1"
        );
        assert!(page.pagination_links.is_empty());
    }

    #[test]
    fn test_fallback_selector_equivalent_to_primary() {
        let body = ad_links("legacy-link", 5);
        let html = Html::parse_document(&format!("<html><body>{}</body></html>", body));

        let fallback = ListingExtractor::with_selectors(&["a.does-not-exist", "a.legacy-link"], &[])
            .unwrap()
            .extract(&html, &page_url());
        let primary = ListingExtractor::with_selectors(&["a.legacy-link"], &[])
            .unwrap()
            .extract(&html, &page_url());

        assert_eq!(fallback.job_links.len(), 5);
        assert_eq!(fallback.job_links, primary.job_links);
    }

    #[test]
    fn test_broad_match_when_chain_exhausted() {
        let html = Html::parse_document(
            "<a href='/om-oss'>Om oss</a>\
             <a href='/job/fulltime/ad.html?finnkode=42'>Jobb</a>\
             <a href='https://www.finn.no/ad/43'>Jobb</a>",
        );
        let page = ListingExtractor::with_selectors(&["a.none"], &[])
            .unwrap()
            .extract(&html, &page_url());

        let urls: Vec<&str> = page.job_links.iter().map(Url::as_str).collect();
        assert_eq!(
            urls,
            vec![
                "https://www.finn.no/job/fulltime/ad.html?finnkode=42",
                "https://www.finn.no/ad/43"
            ]
        );
    }

    #[test]
    fn test_links_deduplicated_in_order() {
        let html = Html::parse_document(
            "<a class='sf-search-ad-link' href='/job/fulltime/ad.html?finnkode=2'>a</a>\
             <a class='sf-search-ad-link' href='/job/fulltime/ad.html?finnkode=1'>b</a>\
             <a class='sf-search-ad-link' href='/job/fulltime/ad.html?finnkode=2#x'>c</a>",
        );
        let page = ListingExtractor::new().extract(&html, &page_url());
        let ids: Vec<String> = page
            .job_links
            .iter()
            .map(|u| u.query().unwrap_or_default().to_string())
            .collect();
        assert_eq!(ids, vec!["finnkode=2", "finnkode=1"]);
    }

    #[test]
    fn test_pagination_chain_and_fallback() {
        let html = Html::parse_document(
            "<nav aria-label='Pagination'>\
               <a href='/job/fulltime/search.html?page=2'>2</a>\
               <a href='/job/fulltime/search.html?page=3'>3</a>\
             </nav>",
        );
        let page = ListingExtractor::new().extract(&html, &page_url());
        assert_eq!(page.pagination_links.len(), 2);

        let html = Html::parse_document("<a href='?page=2'>Neste</a><a href='/hjelp'>Hjelp</a>");
        let page = ListingExtractor::new().extract(&html, &page_url());
        assert_eq!(
            page.pagination_links
                .iter()
                .map(Url::as_str)
                .collect::<Vec<_>>(),
            vec!["https://www.finn.no/?page=2"]
        );
    }

    #[test]
    fn test_pagination_skips_current_page() {
        let current = Url::parse("https://www.finn.no/job/fulltime/search.html?page=2").unwrap();
        let html = Html::parse_document(
            "<div class='pagination'>\
               <a href='/job/fulltime/search.html?page=2'>2</a>\
               <a href='/job/fulltime/search.html?page=3'>3</a>\
             </div>",
        );
        let page = ListingExtractor::new().extract(&html, &current);
        assert_eq!(page.pagination_links.len(), 1);
        assert!(page.pagination_links[0].as_str().ends_with("page=3"));
    }

    #[test]
    fn test_invalid_custom_selector_rejected() {
        assert!(matches!(
            ListingExtractor::with_selectors(&["a[[["], &[]),
            Err(ExtractionError::Html(_))
        ));
    }
}
