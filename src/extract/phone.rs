//! Norwegian phone numbers in free text

use crate::extract::dom::squash;
use once_cell::sync::Lazy;
use regex::Regex;

/// Optional +47/0047 prefix, then eight digits with optional space or dash
/// separators. Dots are not separators so dates never match.
static PHONE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:(?:\+|00)47[\s-]?)?\d(?:[\s-]?\d){7}").expect("valid phone regex")
});

/// Digits compared when matching the same number written two ways
const SIGNIFICANT_DIGITS: usize = 8;

/// All distinct phone numbers in the text, in order of appearance
pub fn find_phones(text: &str) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();

    for m in PHONE.find_iter(text) {
        let before = text[..m.start()].chars().next_back();
        let after = text[m.end()..].chars().next();
        if before.is_some_and(|c| c.is_ascii_digit() || c == '+') || after.is_some_and(|c| c.is_ascii_digit()) {
            continue;
        }

        let phone = squash(m.as_str());
        if !found.iter().any(|f| same_number(f, &phone)) {
            found.push(phone);
        }
    }

    found
}

pub fn first_phone(text: &str) -> Option<String> {
    find_phones(text).into_iter().next()
}

/// Phone number from a `tel:` link
pub fn phone_from_href(href: &str) -> Option<String> {
    let href = href.trim();
    if !href.get(..4)?.eq_ignore_ascii_case("tel:") {
        return None;
    }
    first_phone(&href[4..])
}

/// The national part of a number, used for comparisons
pub fn digits_key(phone: &str) -> String {
    let digits: Vec<char> = phone.chars().filter(char::is_ascii_digit).collect();
    digits[digits.len().saturating_sub(SIGNIFICANT_DIGITS)..]
        .iter()
        .collect()
}

/// True when both strings denote the same number
pub fn same_number(a: &str, b: &str) -> bool {
    let key = digits_key(a);
    !key.is_empty() && key == digits_key(b)
}

/// True when the number appears in the text, however it is spaced there
pub fn occurs_in(phone: &str, text: &str) -> bool {
    let key = digits_key(phone);
    if key.len() < SIGNIFICANT_DIGITS {
        return false;
    }
    let text_digits: String = text.chars().filter(char::is_ascii_digit).collect();
    text_digits.contains(&key)
}
