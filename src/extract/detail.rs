//! Posting pages: every field of a [`JobRecord`]
//!
//! Each field has its own ordered strategy list. Only the title is
//! required; every other field is best-effort and left empty or absent
//! when no strategy finds it.

use crate::extract::contacts::resolve_contacts;
use crate::extract::dom::{
    first_attr, first_text, inline_text, non_empty, resolve_link, selector, text_lines,
};
use crate::extract::email::{clean_email, find_emails};
use crate::extract::labels::{
    COMPANY, EMPLOYMENT_TYPE, EXPIRATION_DATE, EXTERNAL_ID, LOCATION, PUBLICATION_DATE, SALARY,
};
use crate::extract::phone::find_phones;
use crate::extract::{first_of, JobRecord, Strategy};
use crate::ExtractionError;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html};
use url::Url;

/// Longest description kept when no named subsections exist
pub const DESCRIPTION_MAX_CHARS: usize = 2000;

/// Appended to a truncated description
pub const TRUNCATION_MARKER: &str = "...";

/// Subtitles longer than this are body text, not a company name
const MAX_SUBTITLE_CHARS: usize = 100;

const TITLE_CHAIN: &[&str] = &[
    "h1[data-testid='object-title']",
    "section[aria-labelledby] h1",
    "h1.u-t2",
    "h1",
    "h2.u-t3",
];

const SUBTITLE_CHAIN: &[&str] = &[
    "[data-testid='object-subtitle']",
    ".job-subtitle",
    "h1 + p",
    "h1 + h2",
    "h1 + div",
];

const DESCRIPTION_CHAIN: &[&str] = &[
    "[data-testid='description']",
    ".import-decoration",
    "section.description",
    "div.description",
    "article",
];

const LOGO_CHAIN: &[&str] = &[
    "img[data-testid='company-logo']",
    ".company-logo img",
    "img.company-logo",
    "img[alt$='logo']",
    "img[alt$='Logo']",
];

const APPLY_LINK_CHAIN: &[&str] = &[
    "a[data-testid='apply-button']",
    "a.apply-button",
    "a[href*='/apply']",
    "a[href*='soknad']",
];

/// Named description subsections, assembled in page order
const SECTION_HEADINGS: &[&str] = &[
    "Arbeidsoppgaver",
    "Kvalifikasjoner",
    "Personlige egenskaper",
    "Vi tilbyr",
];

/// "Om arbeidsgiveren" is generic; "Om Acme AS" names the company
const GENERIC_ABOUT: &[&str] = &[
    "arbeidsgiveren",
    "arbeidsgiver",
    "oss",
    "bedriften",
    "stillingen",
    "jobben",
];

/// Employment categories in lookup order
pub const EMPLOYMENT_VOCABULARY: &[&str] = &[
    "Fast",
    "Engasjement",
    "Vikariat",
    "Prosjekt",
    "Sesong",
    "Lærling",
    "Trainee",
    "Selvstendig næringsdrivende",
    "Franchise",
    "Annet",
];

static EMPLOYMENT_WORDS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    EMPLOYMENT_VOCABULARY
        .iter()
        .map(|term| {
            let pattern = format!(r"(?i)\b{}\b", regex::escape(term));
            (*term, Regex::new(&pattern).expect("vocabulary term is escaped"))
        })
        .collect()
});

static NORWEGIAN_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,2})\.(\d{1,2})\.(\d{4})\b").expect("valid date regex"));

static DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{4,}").expect("valid digits regex"));

static TRAILING_DIGITS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)/?$").expect("valid trailing digits regex"));

const TITLE: &[(&str, Strategy<DetailPage, String>)] = &[
    ("heading", title_from_heading),
    ("og-title", title_from_og_meta),
    ("document-title", title_from_document_title),
];

const COMPANY_STRATEGIES: &[(&str, Strategy<DetailPage, String>)] = &[
    ("subtitle", company_from_subtitle),
    ("definition-list", company_from_definition),
    ("logo-alt", company_from_logo_alt),
    ("free-text", company_from_free_text),
];

const DESCRIPTION: &[(&str, Strategy<DetailPage, String>)] = &[
    ("named-sections", description_from_sections),
    ("full-section", description_from_container),
];

const EMPLOYMENT: &[(&str, Strategy<DetailPage, String>)] = &[
    ("label", employment_from_label),
    ("vocabulary", employment_from_vocabulary),
];

const PUBLICATION: &[(&str, Strategy<DetailPage, String>)] = &[
    ("label", publication_from_label),
    ("time-element", publication_from_time_element),
];

const APPLICATION_URL: &[(&str, Strategy<DetailPage, String>)] = &[
    ("apply-selector", application_from_selector),
    ("apply-text", application_from_link_text),
];

const EXTERNAL_ID_STRATEGIES: &[(&str, Strategy<DetailPage, String>)] = &[
    ("finnkode", external_id_from_query),
    ("label", external_id_from_label),
    ("path", external_id_from_path),
];

/// A parsed posting page and its visible text
#[derive(Debug)]
pub struct DetailPage {
    document: Html,
    url: Url,
    lines: Vec<String>,
}

impl DetailPage {
    pub fn parse(html: &str, url: &Url) -> Self {
        let document = Html::parse_document(html);
        let lines = text_lines(document.root_element());
        Self {
            document,
            url: url.clone(),
            lines,
        }
    }

    fn root(&self) -> ElementRef<'_> {
        self.document.root_element()
    }

    /// Builds the full record; fails only when no title can be found
    pub fn extract(&self) -> Result<JobRecord, ExtractionError> {
        let title = first_of(self, TITLE).ok_or(ExtractionError::MissingField("title"))?;

        let text = self.lines.join("\n");
        let global_phones = find_phones(&text);
        let global_emails = self.global_emails(&text);
        let contact_persons = resolve_contacts(&self.document, &global_phones, &global_emails);

        Ok(JobRecord {
            url: self.url.to_string(),
            title,
            description: first_of(self, DESCRIPTION).unwrap_or_default(),
            company: first_of(self, COMPANY_STRATEGIES).unwrap_or_default(),
            contact_persons,
            email: global_emails.into_iter().next(),
            application_url: first_of(self, APPLICATION_URL),
            location: LOCATION.lookup(&self.document, &self.lines),
            employment_type: first_of(self, EMPLOYMENT),
            salary: SALARY.lookup(&self.document, &self.lines),
            publication_date: first_of(self, PUBLICATION).map(|d| normalize_date(&d)),
            expiration_date: EXPIRATION_DATE
                .lookup(&self.document, &self.lines)
                .map(|d| normalize_date(&d)),
            external_id: first_of(self, EXTERNAL_ID_STRATEGIES),
            company_logo_url: self.logo_url(),
        })
    }

    /// `mailto:` links first, then addresses in the visible text
    fn global_emails(&self, text: &str) -> Vec<String> {
        let mut emails: Vec<String> = selector("a[href^='mailto:'], a[href^='MAILTO:']")
            .map(|sel| {
                self.document
                    .select(&sel)
                    .filter_map(|a| a.value().attr("href"))
                    .filter_map(clean_email)
                    .collect()
            })
            .unwrap_or_default();

        for email in find_emails(text) {
            if !emails.contains(&email) {
                emails.push(email);
            }
        }
        emails
    }

    fn logo_url(&self) -> Option<String> {
        let src = first_attr(self.root(), LOGO_CHAIN, "src")
            .or_else(|| first_attr(self.root(), LOGO_CHAIN, "data-src"))?;
        resolve_link(&src, &self.url).map(String::from)
    }
}

/// Parses one posting into a record
pub fn extract_job(html: &str, url: &Url) -> Result<JobRecord, ExtractionError> {
    DetailPage::parse(html, url).extract()
}

// Title

fn title_from_heading(page: &DetailPage) -> Option<String> {
    first_text(page.root(), TITLE_CHAIN)
}

fn title_from_og_meta(page: &DetailPage) -> Option<String> {
    first_attr(page.root(), &["meta[property='og:title']"], "content")
}

fn title_from_document_title(page: &DetailPage) -> Option<String> {
    let title = first_text(page.root(), &["head > title"])?;
    non_empty(title.split(" | ").next().unwrap_or_default().to_string())
}

// Company

fn company_from_subtitle(page: &DetailPage) -> Option<String> {
    first_text(page.root(), SUBTITLE_CHAIN).filter(|s| s.chars().count() <= MAX_SUBTITLE_CHARS)
}

fn company_from_definition(page: &DetailPage) -> Option<String> {
    COMPANY.structured_value(&page.document)
}

fn company_from_logo_alt(page: &DetailPage) -> Option<String> {
    let alt = first_attr(page.root(), LOGO_CHAIN, "alt")?;
    strip_logo_suffix(&alt)
}

fn company_from_free_text(page: &DetailPage) -> Option<String> {
    COMPANY
        .value_in_lines(&page.lines)
        .or_else(|| company_from_about_heading(page))
}

/// "Om Acme AS" headings name the employer
fn company_from_about_heading(page: &DetailPage) -> Option<String> {
    let sel = selector("h2, h3, h4")?;
    page.document.select(&sel).find_map(|heading| {
        let text = inline_text(heading);
        let subject = text.strip_prefix("Om ")?.trim();
        let generic = GENERIC_ABOUT.iter().any(|g| subject.eq_ignore_ascii_case(g));
        (!generic).then(|| subject.to_string()).and_then(non_empty)
    })
}

/// `"Acme AS logo"` → `"Acme AS"`
pub fn strip_logo_suffix(alt: &str) -> Option<String> {
    let alt = alt.trim();
    let stripped = match alt.len().checked_sub(4).and_then(|i| alt.get(i..).map(|tail| (i, tail))) {
        Some((i, tail)) if tail.eq_ignore_ascii_case("logo") => &alt[..i],
        _ => alt,
    };
    let stripped = stripped.trim_end_matches(|c: char| c.is_whitespace() || matches!(c, '-' | '|' | ':'));
    non_empty(stripped.to_string())
}

// Description

fn description_from_sections(page: &DetailPage) -> Option<String> {
    let sel = selector("h2, h3, h4, h5, strong, b")?;
    let mut used: Vec<&str> = Vec::new();
    let mut sections: Vec<String> = Vec::new();

    for heading in page.document.select(&sel) {
        let text = inline_text(heading);
        let Some(name) = SECTION_HEADINGS
            .iter()
            .copied()
            .find(|name| text.to_lowercase().starts_with(&name.to_lowercase()))
        else {
            continue;
        };
        if used.contains(&name) {
            continue;
        }

        let body = section_body(heading_anchor(heading));
        if body.is_empty() {
            continue;
        }

        used.push(name);
        sections.push(format!("## {}\n{}", text.trim_end_matches(':').trim(), body));
    }

    (!sections.is_empty()).then(|| truncate_description(&sections.join("\n\n")))
}

/// A `<strong>` that fills its whole `<p>` stands for the paragraph
fn heading_anchor(heading: ElementRef<'_>) -> ElementRef<'_> {
    let wrapped = heading
        .parent()
        .and_then(ElementRef::wrap)
        .filter(|p| p.value().name() == "p" && inline_text(*p) == inline_text(heading));
    wrapped.unwrap_or(heading)
}

fn section_body(anchor: ElementRef<'_>) -> String {
    anchor
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .take_while(|e| !is_heading(*e))
        .flat_map(text_lines)
        .collect::<Vec<_>>()
        .join("\n")
}

fn is_heading(element: ElementRef<'_>) -> bool {
    let name = element.value().name();
    if matches!(name, "h1" | "h2" | "h3" | "h4" | "h5" | "h6") {
        return true;
    }
    if name != "p" {
        return false;
    }
    let Some(sel) = selector("strong, b") else {
        return false;
    };
    element
        .select(&sel)
        .next()
        .is_some_and(|strong| inline_text(strong) == inline_text(element))
}

fn description_from_container(page: &DetailPage) -> Option<String> {
    DESCRIPTION_CHAIN.iter().find_map(|css| {
        let sel = selector(css)?;
        let section = page.document.select(&sel).next()?;
        non_empty(text_lines(section).join("\n")).map(|text| truncate_description(&text))
    })
}

/// Cuts to [`DESCRIPTION_MAX_CHARS`] characters and appends the marker
pub fn truncate_description(text: &str) -> String {
    match text.char_indices().nth(DESCRIPTION_MAX_CHARS) {
        Some((cut, _)) => format!("{}{}", &text[..cut], TRUNCATION_MARKER),
        None => text.to_string(),
    }
}

// Employment type

fn employment_from_label(page: &DetailPage) -> Option<String> {
    EMPLOYMENT_TYPE.lookup(&page.document, &page.lines)
}

fn employment_from_vocabulary(page: &DetailPage) -> Option<String> {
    let text = page.lines.join("\n");
    EMPLOYMENT_WORDS
        .iter()
        .find(|(_, pattern)| pattern.is_match(&text))
        .map(|(term, _)| term.to_string())
}

// Dates

fn publication_from_label(page: &DetailPage) -> Option<String> {
    PUBLICATION_DATE.lookup(&page.document, &page.lines)
}

fn publication_from_time_element(page: &DetailPage) -> Option<String> {
    first_attr(page.root(), &["time[datetime]"], "datetime")
}

/// `dd.mm.yyyy` anywhere in the value becomes `yyyy-mm-dd`; anything else is kept
pub fn normalize_date(value: &str) -> String {
    NORWEGIAN_DATE
        .captures(value)
        .and_then(|c| {
            let day = c.get(1)?.as_str().parse().ok()?;
            let month = c.get(2)?.as_str().parse().ok()?;
            let year = c.get(3)?.as_str().parse().ok()?;
            NaiveDate::from_ymd_opt(year, month, day)
        })
        .map(|date| date.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| value.trim().to_string())
}

// Application URL

fn application_from_selector(page: &DetailPage) -> Option<String> {
    let href = first_attr(page.root(), APPLY_LINK_CHAIN, "href")?;
    resolve_link(&href, &page.url).map(String::from)
}

fn application_from_link_text(page: &DetailPage) -> Option<String> {
    let sel = selector("a[href]")?;
    page.document
        .select(&sel)
        .filter(|a| inline_text(*a).to_lowercase().starts_with("søk"))
        .filter_map(|a| a.value().attr("href"))
        .find_map(|href| resolve_link(href, &page.url))
        .map(String::from)
}

// External id

fn external_id_from_query(page: &DetailPage) -> Option<String> {
    page.url
        .query_pairs()
        .find(|(k, _)| k == "finnkode")
        .and_then(|(_, v)| non_empty(v.into_owned()))
}

fn external_id_from_label(page: &DetailPage) -> Option<String> {
    let value = EXTERNAL_ID.lookup(&page.document, &page.lines)?;
    DIGITS.find(&value).map(|m| m.as_str().to_string())
}

fn external_id_from_path(page: &DetailPage) -> Option<String> {
    TRAILING_DIGITS
        .captures(page.url.path())
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}
