//! Contact persons: who to call about a posting, with phone and email
//!
//! Postings describe contacts in one of three shapes, tried in order. The
//! first shape that yields at least one named person decides the result:
//!
//! 1. structured blocks, one per person
//! 2. a single "Kontaktperson: Name" line with details in sibling items
//! 3. an inline "Rekrutteringsansvarlig: Name, tlf ..., e-post ..." sentence

use crate::extract::dom::{compile_chain, first_matching, first_text, inline_text, selector, text_lines};
use crate::extract::email::clean_email;
use crate::extract::labels::{CONTACT, EMAIL, PHONE, RECRUITER, ROLE};
use crate::extract::phone::{first_phone, occurs_in, phone_from_href};
use crate::extract::{first_of, ContactPerson, Strategy};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

/// One element per contact person, most specific first
const BLOCK_CHAIN: &[&str] = &[
    "[data-testid='contact-person']",
    ".contact-person",
    "ul.contacts > li",
    "section.contact li.contact",
];

/// Where a block keeps the person's name
const BLOCK_NAME_CHAIN: &[&str] = &[".contact-name", "h3", "h4", "strong", "b"];

/// Where a block keeps the person's role without a label
const BLOCK_ROLE_CHAIN: &[&str] = &[".contact-role", ".contact-title"];

/// Characters that end a name in running text
const NAME_SEPARATORS: &[char] = &[',', ';', '|', '(', '–', '—', '/'];

/// Words that start contact details rather than continue a name
const NAME_STOP_WORDS: &[&str] = &[
    "tlf", "tlf.", "telefon", "mobil", "mob", "mob.", "e-post", "epost", "tel", "tel.",
];

static BLOCKS: Lazy<Vec<Selector>> = Lazy::new(|| compile_chain(BLOCK_CHAIN));

/// Everything the contact patterns look at
#[derive(Debug)]
pub struct ContactContext<'a> {
    pub document: &'a Html,
    /// Phones found anywhere on the page, in order
    pub global_phones: &'a [String],
    /// Emails found anywhere on the page, in order
    pub global_emails: &'a [String],
}

/// Resolves the contact persons of a posting
///
/// Returns an empty list when no pattern matches.
pub fn resolve_contacts(
    document: &Html,
    global_phones: &[String],
    global_emails: &[String],
) -> Vec<ContactPerson> {
    let ctx = ContactContext {
        document,
        global_phones,
        global_emails,
    };

    let patterns: [(&str, Strategy<ContactContext<'_>, Vec<ContactPerson>>); 3] = [
        ("structured-blocks", structured_blocks),
        ("legacy-line", legacy_line),
        ("recruiter-inline", recruiter_inline),
    ];

    first_of(&ctx, &patterns).unwrap_or_default()
}

// Pattern 1: one block per person

fn structured_blocks(ctx: &ContactContext<'_>) -> Option<Vec<ContactPerson>> {
    let blocks = first_matching(ctx.document.root_element(), &BLOCKS);
    let contacts: Vec<ContactPerson> = blocks
        .into_iter()
        .filter_map(|block| contact_from_block(ctx, block))
        .collect();
    (!contacts.is_empty()).then_some(contacts)
}

fn contact_from_block(ctx: &ContactContext<'_>, block: ElementRef<'_>) -> Option<ContactPerson> {
    let raw_name = first_text(block, BLOCK_NAME_CHAIN)?;
    let name = CONTACT.strip(&raw_name).unwrap_or(&raw_name);
    let mut person = ContactPerson::new(&trim_name(name)?)?;

    let lines = text_lines(block);
    let block_text = lines.join(" ");

    person.role = first_text(block, BLOCK_ROLE_CHAIN).or_else(|| ROLE.value_in_lines(&lines));

    person.phone_number = PHONE
        .value_in_lines(&lines)
        .and_then(|value| first_phone(&value))
        .or_else(|| link_value(block, "a[href^='tel:'], a[href^='TEL:']", phone_from_href))
        .or_else(|| {
            ctx.global_phones
                .iter()
                .find(|phone| occurs_in(phone, &block_text))
                .cloned()
        });

    person.email = EMAIL
        .value_in_lines(&lines)
        .and_then(|value| clean_email(&value))
        .or_else(|| link_value(block, "a[href^='mailto:'], a[href^='MAILTO:']", clean_email))
        .or_else(|| {
            let lower = block_text.to_lowercase();
            ctx.global_emails
                .iter()
                .find(|email| lower.contains(email.as_str()))
                .cloned()
        });

    Some(person)
}

fn link_value(block: ElementRef<'_>, css: &str, parse: fn(&str) -> Option<String>) -> Option<String> {
    let sel = selector(css)?;
    block
        .select(&sel)
        .filter_map(|a| a.value().attr("href"))
        .find_map(parse)
}

// Pattern 2: "Kontaktperson: Name" with details beside it

fn legacy_line(ctx: &ContactContext<'_>) -> Option<Vec<ContactPerson>> {
    let (name, siblings) =
        labeled_contact_line(ctx.document).or_else(|| labeled_contact_term(ctx.document))?;
    let mut person = ContactPerson::new(&name)?;

    let lines: Vec<String> = siblings.iter().flat_map(|e| text_lines(*e)).collect();
    let sibling_text = lines.join(" ");

    person.role = ROLE.value_in_lines(&lines);

    let local_phone = PHONE
        .value_in_lines(&lines)
        .and_then(|value| first_phone(&value))
        .or_else(|| first_phone(&sibling_text));
    let local_email = EMAIL
        .value_in_lines(&lines)
        .and_then(|value| clean_email(&value))
        .or_else(|| clean_email(&sibling_text));

    person.phone_number = local_phone.or_else(|| ctx.global_phones.first().cloned());
    person.email = local_email.or_else(|| ctx.global_emails.first().cloned());

    Some(vec![person])
}

/// `<li>Kontaktperson: Ola Nordmann</li>` and following sibling items
fn labeled_contact_line(document: &Html) -> Option<(String, Vec<ElementRef<'_>>)> {
    let sel = selector("li, p")?;
    document.select(&sel).find_map(|element| {
        let text = inline_text(element);
        let name = trim_name(CONTACT.strip(&text)?)?;
        Some((name, following_elements(element)))
    })
}

/// `<dt>Kontaktperson</dt><dd>Ola Nordmann</dd>` and what follows the `<dd>`
fn labeled_contact_term(document: &Html) -> Option<(String, Vec<ElementRef<'_>>)> {
    let sel = selector("dt, th")?;
    document.select(&sel).find_map(|term| {
        if !CONTACT.is_label(&inline_text(term)) {
            return None;
        }
        let value = term.next_siblings().find_map(ElementRef::wrap)?;
        let name = trim_name(&inline_text(value))?;
        Some((name, following_elements(value)))
    })
}

fn following_elements(element: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    element.next_siblings().filter_map(ElementRef::wrap).collect()
}

// Pattern 3: "Rekrutteringsansvarlig: Name, tlf ..., e-post ..."

fn recruiter_inline(ctx: &ContactContext<'_>) -> Option<Vec<ContactPerson>> {
    let sel = selector("p, li, div, span, dd")?;

    // The innermost element carrying a name after the label has the shortest text
    let text = ctx
        .document
        .select(&sel)
        .map(inline_text)
        .filter(|text| RECRUITER.strip(text).and_then(trim_name).is_some())
        .min_by_key(|text| text.len())?;

    let rest = RECRUITER.strip(&text)?;
    let mut person = ContactPerson::new(&trim_name(rest)?)?;

    person.role = RECRUITER.labels().first().map(|label| label.to_string());
    person.phone_number = first_phone(rest);
    person.email = clean_email(rest);

    Some(vec![person])
}

/// Cuts a name out of running text
///
/// Stops at the first separator, at a contact-detail keyword, or at a token
/// holding a digit or an `@`.
pub fn trim_name(raw: &str) -> Option<String> {
    let head = raw.split(NAME_SEPARATORS).next().unwrap_or_default();
    let name = head
        .split_whitespace()
        .take_while(|token| {
            let lower = token.to_lowercase();
            !NAME_STOP_WORDS.contains(&lower.trim_end_matches(':'))
                && !token.contains('@')
                && !token.chars().any(|c| c.is_ascii_digit() || c == '+')
        })
        .collect::<Vec<_>>()
        .join(" ");

    let name = name.trim_end_matches([':', '-', '.']).trim();
    (!name.is_empty()).then(|| name.to_string())
}
