//! Normalization and noise classification for raw GKG entity fields.
//!
//! Entity columns (themes, persons, organizations) arrive as
//! semicolon-delimited lists. [`split_and_clean`] turns one such field into
//! lowercased, trimmed tokens with stopwords and noise removed; [`is_noise`]
//! is the shared predicate the scorer also applies when re-reading persisted
//! documents, which may contain noise leaked by older ingests.

use std::sync::LazyLock;

use regex::Regex;

use crate::model::Keyword;

const STOPWORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "of", "in", "for", "on", "with", "to", "from", "by", "at",
    "is", "was", "are",
];

static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(https?://|www\.)").expect("static regex"));

// Matches a bare domain, optionally followed by a path. The path form is
// what catches tokens like "google.com/news" that slip past the URL prefix
// check. No whitespace anywhere in the token.
static DOMAIN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9.-]+\.[a-z]{2,}(/\S*)?$").expect("static regex"));

static NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?\d+(\.\d+)?$").expect("static regex"));

/// Split a semicolon-delimited entity field into clean tokens.
///
/// Each part is lowercased, stripped of leading/trailing non-word
/// characters, and has internal whitespace runs collapsed to single spaces.
/// Empty parts, stopwords, and noise tokens are dropped.
pub fn split_and_clean(field: &str) -> Vec<String> {
    field
        .split(';')
        .filter_map(clean_token)
        .filter(|t| !STOPWORDS.contains(&t.as_str()))
        .filter(|t| !is_noise(t))
        .collect()
}

fn clean_token(part: &str) -> Option<String> {
    let lowered = part.to_lowercase();
    let trimmed = lowered.trim_matches(|c: char| !c.is_ascii_alphanumeric() && c != '_');
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.split_whitespace().collect::<Vec<_>>().join(" "))
}

/// True for tokens that carry no semantic signal: too short, URLs, domains
/// (with or without a path), numeric vectors, or mostly digits.
pub fn is_noise(token: &str) -> bool {
    if token.chars().count() < 3 {
        return true;
    }
    if URL_RE.is_match(token) || DOMAIN_RE.is_match(token) {
        return true;
    }
    if is_numeric_vector(token) {
        return true;
    }
    digit_ratio(token) > 0.6
}

/// Four or more comma-separated numbers, integer or decimal.
pub fn is_numeric_vector(token: &str) -> bool {
    let parts: Vec<&str> = token.split(',').collect();
    parts.len() >= 4 && parts.iter().all(|p| NUMBER_RE.is_match(p))
}

/// Drop keywords whose word is noise. The scorer's strict tier applies this
/// to both the current-day and baseline keyword sets.
pub fn filter_noise(keywords: Vec<Keyword>) -> Vec<Keyword> {
    keywords.into_iter().filter(|k| !is_noise(&k.word)).collect()
}

fn digit_ratio(token: &str) -> f64 {
    let total = token.chars().count();
    if total == 0 {
        return 0.0;
    }
    let digits = token.chars().filter(|c| c.is_ascii_digit()).count();
    digits as f64 / total as f64
}
