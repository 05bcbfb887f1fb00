//! Email normalization: find, clean and validate noisy email-like text
//!
//! Every function here is a plain string-in/string-out transformation so the
//! heuristics can be tested without a page. The pipeline is:
//!
//! 1. [`prepare`] decodes entities and expands `[at]`/`(dot)` obfuscations
//! 2. discovery collects candidates (strict → per-TLD → permissive)
//! 3. each candidate is cleaned and run through the rescue steps
//!
//! [`clean_email`] is idempotent: feeding its output back in returns the
//! same address, and an input that yields nothing yields nothing again.

use crate::extract::{first_of, Strategy};
use once_cell::sync::Lazy;
use regex::Regex;

/// TLDs accepted without rescue, in lookup order
pub const KNOWN_TLDS: &[&str] = &[
    "no", "com", "org", "net", "info", "se", "dk", "io", "co", "uk", "us", "eu", "de", "fr",
    "it", "es", "pl", "ru", "nl", "be", "me", "biz", "group",
];

/// Words that commonly run into an address when labels are glued together
const CONTAMINATION_WORDS: &[&str] = &[
    "Telefon", "Tlf", "Mobil", "Mob", "Tel", "Phone", "Kontakt", "Epost", "E-post", "Adresse",
    "Nettside", "Web", "Søk",
];

/// Characters that never belong in an address
const NOISE_CHARS: &[char] = &['"', '\'', '<', '>', '(', ')', '[', ']', '{', '}', ',', ';', ':'];

static STRICT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").expect("valid strict email regex")
});

static PER_TLD: Lazy<Vec<Regex>> = Lazy::new(|| {
    KNOWN_TLDS
        .iter()
        .map(|tld| {
            Regex::new(&format!(
                r"(?i)[A-Za-z0-9._%+-]+@(?:[A-Za-z0-9-]+\.)+{}",
                regex::escape(tld)
            ))
            .expect("valid per-TLD email regex")
        })
        .collect()
});

static PERMISSIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[\w.+%-]+@[\w-]+(?:\.[\w-]+)+").expect("valid permissive email regex")
});

/// A complete address ending in a known TLD
static VALID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)^[a-z0-9._%+-]+@[a-z0-9-]+(?:\.[a-z0-9-]+)*\.(?:{})$",
        KNOWN_TLDS.join("|")
    ))
    .expect("valid email validation regex")
});

/// A complete address ending in any 2-3 letter TLD
static GENERIC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9-]+(?:\.[A-Za-z0-9-]+)*\.[A-Za-z]{2,3}$")
        .expect("valid generic email regex")
});

static OBFUSCATED_AT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\s*[\[\(\{]\s*(?:at|alfa|krøllalfa)\s*[\]\)\}]\s*")
        .expect("valid obfuscated-at regex")
});

static OBFUSCATED_DOT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\s*[\[\(\{]\s*(?:dot|punktum|punkt)\s*[\]\)\}]\s*")
        .expect("valid obfuscated-dot regex")
});

const DISCOVERY: &[(&str, Strategy<str, Vec<String>>)] = &[
    ("strict", strict_candidates),
    ("known-tld", known_tld_candidates),
    ("permissive", permissive_candidates),
    ("whole-text", whole_text_candidate),
];

const RESCUE: &[(&str, Strategy<str, String>)] = &[
    ("valid", accept_valid),
    ("known-tld-truncation", truncate_after_known_tld),
    ("contamination-word", cut_contamination_word),
    ("short-tld", assume_short_tld),
];

/// Cleans one email-like string, returning the first address it yields
///
/// # Examples
///
/// ```
/// use jobsift::clean_email;
///
/// assert_eq!(
///     clean_email("john.doe [at] example [dot] no").as_deref(),
///     Some("john.doe@example.no")
/// );
/// assert_eq!(clean_email("no address here"), None);
/// ```
pub fn clean_email(text: &str) -> Option<String> {
    find_emails(text).into_iter().next()
}

/// All distinct addresses in a text span, in order of appearance
pub fn find_emails(text: &str) -> Vec<String> {
    let prepared = prepare(text);
    let candidates = first_of(prepared.as_str(), DISCOVERY).unwrap_or_default();

    let mut found: Vec<String> = Vec::new();
    for email in candidates.iter().filter_map(|c| clean_candidate(c)) {
        if !found.contains(&email) {
            found.push(email);
        }
    }
    found
}

/// Decodes the entities used to hide `@` and `.`, then expands obfuscations
pub fn prepare(text: &str) -> String {
    let decoded = text
        .replace("&#64;", "@")
        .replace("&#x40;", "@")
        .replace("&commat;", "@")
        .replace("&#46;", ".")
        .replace("&period;", ".")
        .replace("&nbsp;", " ")
        .replace('\u{a0}', " ")
        .replace("&amp;", "&");

    let at = OBFUSCATED_AT.replace_all(&decoded, "@");
    OBFUSCATED_DOT.replace_all(&at, ".").into_owned()
}

/// Strips transport noise from a candidate and validates it
fn clean_candidate(candidate: &str) -> Option<String> {
    let squeezed: String = candidate.chars().filter(|c| !c.is_whitespace()).collect();
    let without_scheme = strip_mailto(&squeezed);
    let denoised: String = without_scheme
        .chars()
        .filter(|c| !NOISE_CHARS.contains(c))
        .collect();
    let trimmed = denoised.trim_matches(|c: char| !c.is_alphanumeric());

    if !trimmed.contains('@') {
        return None;
    }

    first_of(trimmed, RESCUE).map(|email| email.to_lowercase())
}

fn strip_mailto(text: &str) -> &str {
    match text.get(..7) {
        Some(prefix) if prefix.eq_ignore_ascii_case("mailto:") => &text[7..],
        _ => text,
    }
}

// Discovery

/// True when a letter or digit (any script) sits right before `start`
fn glued_on_left(text: &str, start: usize) -> bool {
    text[..start].chars().next_back().is_some_and(char::is_alphanumeric)
}

fn strict_candidates(text: &str) -> Option<Vec<String>> {
    let found: Vec<String> = STRICT
        .find_iter(text)
        .filter(|m| {
            let after = text[m.end()..].chars().next();
            !glued_on_left(text, m.start()) && !after.is_some_and(char::is_alphanumeric)
        })
        .map(|m| m.as_str().to_string())
        .collect();
    (!found.is_empty()).then_some(found)
}

/// Like strict discovery but lets the TLD run into trailing text
fn known_tld_candidates(text: &str) -> Option<Vec<String>> {
    PER_TLD.iter().find_map(|pattern| {
        let found: Vec<String> = pattern
            .find_iter(text)
            .filter(|m| !glued_on_left(text, m.start()))
            .map(|m| m.as_str().to_string())
            .collect();
        (!found.is_empty()).then_some(found)
    })
}

fn permissive_candidates(text: &str) -> Option<Vec<String>> {
    let found: Vec<String> = PERMISSIVE
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect();
    (!found.is_empty()).then_some(found)
}

/// Short spans like `ola @ firma.no` only become an address once whitespace goes
fn whole_text_candidate(text: &str) -> Option<Vec<String>> {
    let short = text.split_whitespace().count() <= 3 && text.len() <= 254;
    (short && text.matches('@').count() == 1).then(|| vec![text.to_string()])
}

// Validation and rescue

fn accept_valid(candidate: &str) -> Option<String> {
    VALID.is_match(candidate).then(|| candidate.to_string())
}

/// Cuts right after a known TLD that follows the `@`, preferring the longest TLD
fn truncate_after_known_tld(candidate: &str) -> Option<String> {
    let at = candidate.find('@')?;
    let lower = candidate.to_ascii_lowercase();
    let domain = &lower[at..];

    KNOWN_TLDS
        .iter()
        .flat_map(|tld| {
            let needle = format!(".{}", tld);
            domain
                .match_indices(&needle)
                .map(|(idx, _)| (tld.len(), at + idx + needle.len()))
                .collect::<Vec<_>>()
        })
        .filter(|&(_, end)| VALID.is_match(&candidate[..end]))
        .max()
        .map(|(_, end)| candidate[..end].to_string())
}

/// Cuts at a label word glued onto the end of the address
fn cut_contamination_word(candidate: &str) -> Option<String> {
    let at = candidate.find('@')?;
    let cut = CONTAMINATION_WORDS
        .iter()
        .filter_map(|word| candidate[at..].find(*word).map(|idx| at + idx))
        .min()?;

    let head = candidate[..cut].trim_end_matches(|c: char| !c.is_alphanumeric());
    GENERIC.is_match(head).then(|| head.to_string())
}

/// Keeps at most three letters after the last dot of the domain
fn assume_short_tld(candidate: &str) -> Option<String> {
    let at = candidate.find('@')?;
    let dot = candidate.rfind('.').filter(|&dot| dot > at)?;

    let tld: String = candidate[dot + 1..]
        .chars()
        .take_while(char::is_ascii_alphabetic)
        .take(3)
        .collect();
    if tld.len() < 2 {
        return None;
    }

    let rescued = format!("{}{}", &candidate[..=dot], tld);
    GENERIC.is_match(&rescued).then_some(rescued)
}
