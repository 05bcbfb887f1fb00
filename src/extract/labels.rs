//! Label/value lookup: "Sted: Oslo", `<dt>Sted</dt><dd>Oslo</dd>` and friends

use crate::extract::dom::{inline_text, next_sibling_text, selector};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;

/// Elements holding a label whose value is the following `dd`/`td`
const STRUCTURED_LABEL_ELEMENTS: &str = "dt, th";

/// Inline elements holding a label whose value is the next sibling
const INLINE_LABEL_ELEMENTS: &str = "span, strong, b, label, h3, h4, p, div";

/// A fixed family of labels that introduce the same value
#[derive(Debug)]
pub struct LabelSet {
    labels: &'static [&'static str],
    /// `^(label)\b :? (rest)$`, case-insensitive, longest label first
    line: Regex,
}

impl LabelSet {
    pub fn new(labels: &'static [&'static str]) -> Self {
        let mut sorted: Vec<&str> = labels.to_vec();
        sorted.sort_by_key(|l| std::cmp::Reverse(l.chars().count()));
        let alternation = sorted
            .iter()
            .map(|l| regex::escape(l))
            .collect::<Vec<_>>()
            .join("|");

        let line = Regex::new(&format!(r"(?i)^(?:{})\b\.?\s*:?\s*(.*)$", alternation))
            .expect("label alternation is escaped");

        Self { labels, line }
    }

    pub fn labels(&self) -> &'static [&'static str] {
        self.labels
    }

    /// True when the whole text is one of the labels (optionally with a colon)
    pub fn is_label(&self, text: &str) -> bool {
        let text = text.trim().trim_end_matches(':').trim().to_lowercase();
        self.labels.iter().any(|l| l.to_lowercase() == text)
    }

    /// If the line starts with a label, the text after it (possibly empty)
    pub fn strip<'t>(&self, line: &'t str) -> Option<&'t str> {
        self.line
            .captures(line.trim())
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim())
    }

    /// Finds the value for this label in a sequence of text lines
    ///
    /// Accepts both "Label: value" on one line and a bare "Label" line
    /// followed by the value on the next line.
    pub fn value_in_lines<S: AsRef<str>>(&self, lines: &[S]) -> Option<String> {
        lines.iter().enumerate().find_map(|(i, line)| {
            let rest = self.strip(line.as_ref())?;
            if !rest.is_empty() {
                return Some(rest.to_string());
            }
            lines
                .get(i + 1)
                .map(|next| next.as_ref().trim())
                .filter(|next| !next.is_empty() && self.strip(next).is_none())
                .map(str::to_string)
        })
    }

    /// Value of a `<dt>`/`<th>` label: the following `<dd>`/`<td>`
    pub fn structured_value(&self, document: &Html) -> Option<String> {
        let sel = selector(STRUCTURED_LABEL_ELEMENTS)?;
        document
            .select(&sel)
            .filter(|e| self.is_label(&inline_text(*e)))
            .find_map(next_sibling_text)
    }

    /// Value of an inline label element: the text right after it
    pub fn sibling_value(&self, document: &Html) -> Option<String> {
        let sel = selector(INLINE_LABEL_ELEMENTS)?;
        document
            .select(&sel)
            .filter(|e| self.is_label(&inline_text(*e)))
            .find_map(next_sibling_text)
    }

    /// Runs the ordered lookup: structured → sibling → free-text lines
    pub fn lookup(&self, document: &Html, lines: &[String]) -> Option<String> {
        self.structured_value(document)
            .or_else(|| self.sibling_value(document))
            .or_else(|| self.value_in_lines(lines))
    }
}

// Field vocabulary of the target site

pub static LOCATION: Lazy<LabelSet> = Lazy::new(|| LabelSet::new(&["Sted", "Arbeidssted"]));

pub static EMPLOYMENT_TYPE: Lazy<LabelSet> =
    Lazy::new(|| LabelSet::new(&["Ansettelsesform", "Stillingstype"]));

pub static EXPIRATION_DATE: Lazy<LabelSet> =
    Lazy::new(|| LabelSet::new(&["Frist", "Søknadsfrist"]));

pub static PUBLICATION_DATE: Lazy<LabelSet> =
    Lazy::new(|| LabelSet::new(&["Publisert", "Sist endret"]));

pub static SALARY: Lazy<LabelSet> = Lazy::new(|| LabelSet::new(&["Lønn"]));

pub static COMPANY: Lazy<LabelSet> = Lazy::new(|| LabelSet::new(&["Firma", "Arbeidsgiver"]));

pub static EXTERNAL_ID: Lazy<LabelSet> =
    Lazy::new(|| LabelSet::new(&["FINN-kode", "Annonsenummer"]));

pub static CONTACT: Lazy<LabelSet> =
    Lazy::new(|| LabelSet::new(&["Kontaktperson", "Kontaktpersoner"]));

pub static RECRUITER: Lazy<LabelSet> = Lazy::new(|| LabelSet::new(&["Rekrutteringsansvarlig"]));

pub static PHONE: Lazy<LabelSet> =
    Lazy::new(|| LabelSet::new(&["Telefon", "Mobil", "Tlf", "Mob"]));

pub static EMAIL: Lazy<LabelSet> = Lazy::new(|| LabelSet::new(&["E-post", "Epost"]));

pub static ROLE: Lazy<LabelSet> =
    Lazy::new(|| LabelSet::new(&["Stillingstittel", "Stilling", "Rolle", "Tittel"]));

#[cfg(test)]
mod tests {
    use super::*;

    static PHONE_LABELS: &[&str] = &["Telefon", "Mobil", "Tlf", "Mob"];

    #[test]
    fn test_strip_with_colon_and_value() {
        let set = LabelSet::new(PHONE_LABELS);
        assert_eq!(set.strip("Telefon: 900 00 000"), Some("900 00 000"));
        assert_eq!(set.strip("tlf. 22 33 44 55"), Some("22 33 44 55"));
        assert_eq!(set.strip("Mobil"), Some(""));
        assert_eq!(set.strip("Telefonnummer finnes ikke"), None);
        assert_eq!(set.strip("Ring oss"), None);
    }

    #[test]
    fn test_value_on_next_line() {
        let set = LabelSet::new(PHONE_LABELS);
        let lines = vec!["Kari Nordmann", "Mobil:", "912 34 567"];
        assert_eq!(set.value_in_lines(&lines).as_deref(), Some("912 34 567"));
    }

    #[test]
    fn test_label_followed_by_other_label_is_not_a_value() {
        let set = LabelSet::new(PHONE_LABELS);
        let lines = vec!["Telefon:", "Mobil:"];
        assert_eq!(set.value_in_lines(&lines), None);
    }

    #[test]
    fn test_structured_value() {
        let set = LabelSet::new(&["Sted", "Arbeidssted"]);
        let html = Html::parse_document(
            "<dl><dt>Frist</dt><dd>Snarest</dd><dt>Arbeidssted:</dt><dd>Oslo</dd></dl>",
        );
        assert_eq!(set.structured_value(&html).as_deref(), Some("Oslo"));
    }

    #[test]
    fn test_sibling_value() {
        let set = LabelSet::new(&["Ansettelsesform"]);
        let html = Html::parse_document(
            "<div><span>Ansettelsesform</span> <span>Engasjement</span></div>",
        );
        assert_eq!(set.sibling_value(&html).as_deref(), Some("Engasjement"));
    }

    #[test]
    fn test_is_label_handles_non_ascii() {
        let set = LabelSet::new(&["Søknadsfrist"]);
        assert!(set.is_label("SØKNADSFRIST:"));
        assert!(!set.is_label("Søknadsfrist 01.02.2025"));
    }
}
