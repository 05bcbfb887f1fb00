//! Page extraction: listing links, posting fields, contacts and emails
//!
//! Each extractor is built from ordered strategy lists run through
//! [`first_of`]. A strategy is a pure function from a parsed page (or a text
//! span) to an optional value, so every fallback can be tested on its own.

pub mod contacts;
pub mod detail;
pub mod dom;
pub mod email;
pub mod labels;
pub mod listing;
pub mod phone;

pub use contacts::resolve_contacts;
pub use detail::{extract_job, DetailPage, DESCRIPTION_MAX_CHARS, TRUNCATION_MARKER};
pub use email::{clean_email, find_emails};
pub use listing::{ListingExtractor, ListingPage};

use serde::{Deserialize, Serialize};

/// A person to contact about a posting. Never built without a name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactPerson {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub email: Option<String>,
}

impl ContactPerson {
    /// Returns None for a blank name
    pub fn new(name: &str) -> Option<Self> {
        let name = name.trim();
        (!name.is_empty()).then(|| Self {
            name: name.to_string(),
            role: None,
            phone_number: None,
            email: None,
        })
    }
}

/// The structured record emitted for one posting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    pub url: String,
    pub title: String,
    pub description: String,
    pub company: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub contact_persons: Vec<ContactPerson>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub application_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub employment_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub salary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub publication_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub expiration_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub external_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub company_logo_url: Option<String>,
}

/// A named extraction strategy
pub type Strategy<C, T> = fn(&C) -> Option<T>;

/// Runs strategies in order and returns the first value produced
///
/// Strategies returning `None` mean "try the next one". The name of the
/// winning strategy is traced for debugging selector drift.
pub fn first_of<C: ?Sized, T>(ctx: &C, strategies: &[(&'static str, Strategy<C, T>)]) -> Option<T> {
    strategies.iter().find_map(|(name, strategy)| {
        let found = strategy(ctx);
        if found.is_some() {
            tracing::trace!("Strategy '{}' matched", name);
        }
        found
    })
}
