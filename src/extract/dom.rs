//! Small helpers over the scraper DOM shared by the extractors

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};
use url::Url;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Elements whose text is never page content
const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Compiles a selector, logging instead of failing on bad CSS
pub fn selector(css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(selector) => Some(selector),
        Err(e) => {
            tracing::warn!("Failed to compile selector '{}': {:?}", css, e);
            None
        }
    }
}

/// Compiles a chain of selectors, dropping the ones that do not parse
pub fn compile_chain(chain: &[&str]) -> Vec<Selector> {
    chain.iter().filter_map(|css| selector(css)).collect()
}

/// Collapses whitespace runs to single spaces and trims
pub fn squash(text: &str) -> String {
    WHITESPACE.replace_all(text.trim(), " ").into_owned()
}

/// Text of an element on one line
pub fn inline_text(element: ElementRef<'_>) -> String {
    squash(&visible_text_nodes(element).join(" "))
}

/// Text of an element, one line per non-empty text node
pub fn text_lines(element: ElementRef<'_>) -> Vec<String> {
    visible_text_nodes(element)
        .into_iter()
        .map(|t| squash(&t))
        .filter(|t| !t.is_empty())
        .collect()
}

/// All visible text of a document, newline separated
pub fn page_text(document: &Html) -> String {
    text_lines(document.root_element()).join("\n")
}

fn visible_text_nodes(element: ElementRef<'_>) -> Vec<String> {
    element
        .descendants()
        .filter_map(|node| {
            let text: &str = node.value().as_text()?;
            let hidden = node
                .parent()
                .and_then(|p| p.value().as_element().map(|e| e.name().to_string()))
                .is_some_and(|name| SKIPPED_ELEMENTS.contains(&name.as_str()));
            (!hidden).then(|| text.to_string())
        })
        .collect()
}

/// Text of the first non-empty sibling after `element`, text node or element
pub fn next_sibling_text(element: ElementRef<'_>) -> Option<String> {
    element.next_siblings().find_map(|node| match node.value() {
        Node::Text(text) => non_empty(squash(text)),
        Node::Element(_) => ElementRef::wrap(node).and_then(|e| non_empty(inline_text(e))),
        _ => None,
    })
}

/// Runs a selector chain: the first selector with at least one match wins
pub fn first_matching<'a>(root: ElementRef<'a>, chain: &[Selector]) -> Vec<ElementRef<'a>> {
    chain
        .iter()
        .map(|s| root.select(s).collect::<Vec<_>>())
        .find(|matches| !matches.is_empty())
        .unwrap_or_default()
}

/// Text of the first element matching any selector in the chain
pub fn first_text(root: ElementRef<'_>, chain: &[&str]) -> Option<String> {
    chain.iter().find_map(|css| {
        let sel = selector(css)?;
        root.select(&sel).find_map(|e| non_empty(inline_text(e)))
    })
}

/// An attribute of the first element matching any selector in the chain
pub fn first_attr(root: ElementRef<'_>, chain: &[&str], attr: &str) -> Option<String> {
    chain.iter().find_map(|css| {
        let sel = selector(css)?;
        root.select(&sel)
            .find_map(|e| e.value().attr(attr).map(str::trim).and_then(|v| non_empty(v.to_string())))
    })
}

/// Trimmed text, or None when nothing is left
pub fn non_empty(text: String) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// The origin of a page as a join base (`scheme://host[:port]/`)
pub fn origin_base(page_url: &Url) -> Url {
    let mut base = page_url.clone();
    base.set_path("/");
    base.set_query(None);
    base.set_fragment(None);
    base
}

/// Resolves a link href to an absolute http(s) URL
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel:, data: schemes
/// - fragment-only links
/// - invalid URLs or non-HTTP(S) URLs after resolution
pub fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
    {
        return None;
    }

    base_url
        .join(href)
        .ok()
        .filter(|url| url.scheme() == "http" || url.scheme() == "https")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_url() -> Url {
        Url::parse("https://www.finn.no/job/fulltime/search.html?page=2").unwrap()
    }

    #[test]
    fn test_resolve_relative_against_origin() {
        let base = origin_base(&base_url());
        assert_eq!(
            resolve_link("ad.html?finnkode=5", &base).unwrap().as_str(),
            "https://www.finn.no/ad.html?finnkode=5"
        );
        assert_eq!(
            resolve_link("/job/fulltime/ad.html?finnkode=5", &base)
                .unwrap()
                .as_str(),
            "https://www.finn.no/job/fulltime/ad.html?finnkode=5"
        );
    }

    #[test]
    fn test_resolve_skips_special_links() {
        let base = base_url();
        assert!(resolve_link("javascript:void(0)", &base).is_none());
        assert!(resolve_link("mailto:ola@firma.no", &base).is_none());
        assert!(resolve_link("TEL:+4790000000", &base).is_none());
        assert!(resolve_link("#section", &base).is_none());
        assert!(resolve_link("   ", &base).is_none());
    }

    #[test]
    fn test_page_text_skips_scripts() {
        let html = Html::parse_document(
            "<html><head><script>var x = 'hidden';</script></head>\
             <body><p>Hello   <b>world</b></p><style>p{}</style></body></html>",
        );
        assert_eq!(page_text(&html), "Hello\nworld");
    }

    #[test]
    fn test_inline_text_squashes_whitespace() {
        let html = Html::parse_fragment("<li>Telefon:\n   <a>900 00 000</a></li>");
        let sel = selector("li").unwrap();
        let li = html.select(&sel).next().unwrap();
        assert_eq!(inline_text(li), "Telefon: 900 00 000");
        assert_eq!(text_lines(li), vec!["Telefon:", "900 00 000"]);
    }

    #[test]
    fn test_next_sibling_text() {
        let html = Html::parse_fragment("<dl><dt>Firma</dt>\n<dd> Acme AS </dd></dl>");
        let sel = selector("dt").unwrap();
        let dt = html.select(&sel).next().unwrap();
        assert_eq!(next_sibling_text(dt).as_deref(), Some("Acme AS"));
    }

    #[test]
    fn test_first_matching_falls_through() {
        let html = Html::parse_fragment("<a class='b' href='/1'>1</a><a class='b' href='/2'>2</a>");
        let chain = compile_chain(&["a.a", "a.b"]);
        assert_eq!(first_matching(html.root_element(), &chain).len(), 2);
    }
}
