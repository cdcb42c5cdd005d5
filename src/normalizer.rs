use std::collections::HashSet;

use crate::utils::collapse_whitespace;

pub const EMAIL_CONFIRMED: &str = "email confirmed";
pub const EXPERIENCED_BUYER: &str = "experienced buyer";
pub const COMPLETE_ORDER: &str = "complete order via rfq";
pub const TYPICAL_REPLIES: &str = "typical replies";
pub const INTERACTIVE_USER: &str = "interactive user";

/// Protocol-relative links get `https:`; everything else is returned as is.
pub fn normalize_url(href: &str) -> String {
    if href.starts_with("//") {
        format!("https:{href}")
    } else {
        href.to_string()
    }
}

/// Value of the `p=` query fragment up to the next `&`, or empty.
pub fn parse_rfq_id(href: &str) -> String {
    match href.split_once("p=") {
        Some((_, rest)) => rest.split('&').next().unwrap_or_default().to_string(),
        None => String::new(),
    }
}

/// Collapses whitespace as a rendered page would, removes configured labels,
/// then trims what is left.
pub fn clean_text(raw: &str, labels: &[String]) -> String {
    let mut text = collapse_whitespace(raw);
    for label in labels.iter().map(|l| collapse_whitespace(l)) {
        if !label.is_empty() {
            text = text.replace(label.as_str(), "");
        }
    }
    collapse_whitespace(&text)
}

/// Lowercased buyer badge texts found on a card.
#[derive(Debug, Default)]
pub struct BuyerTags(HashSet<String>);

impl BuyerTags {
    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            texts
                .into_iter()
                .map(|t| collapse_whitespace(t.as_ref()).to_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
        )
    }

    pub fn has(&self, phrase: &str) -> bool {
        self.0.contains(phrase)
    }

    pub fn flag(&self, phrase: &str) -> String {
        let answer = if self.has(phrase) { "Yes" } else { "No" };
        answer.to_string()
    }
}
