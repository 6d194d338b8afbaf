//! Deterministic episode filename derivation (spec §4.2).

use chrono::{DateTime, Utc};
use thiserror::Error;
use unicode_normalization::UnicodeNormalization;

/// Maximum slug length, truncated on a whitespace/hyphen boundary.
pub const MAX_SLUG_LEN: usize = 80;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum KeygenError {
    #[error("unparseable publish date: {0:?}")]
    InvalidDate(String),
}

/// Derive the deterministic `fileKey` for an episode from its title and
/// publish date. Pure and stable across platforms: the same
/// `(title, pub_date)` pair always yields the same bytes, and
/// NFC/NFD-equivalent titles collapse to the same key.
pub fn file_key(title: &str, pub_date: &str) -> Result<String, KeygenError> {
    let date = parse_date(pub_date)?;
    let slug = slugify(title);
    Ok(format!("{}_{}", date.format("%Y-%m-%d"), slug))
}

fn parse_date(pub_date: &str) -> Result<DateTime<Utc>, KeygenError> {
    if let Ok(dt) = DateTime::parse_from_rfc2822(pub_date) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(pub_date) {
        return Ok(dt.with_timezone(&Utc));
    }
    // A handful of feeds emit RFC2822 without the weekday prefix or with a
    // non-standard offset; chrono's strict parsers reject those, so fall
    // back to a couple of the formats actually observed in the wild before
    // giving up.
    for fmt in ["%a, %d %b %Y %H:%M:%S %z", "%d %b %Y %H:%M:%S %z"] {
        if let Ok(dt) = DateTime::parse_from_str(pub_date, fmt) {
            return Ok(dt.with_timezone(&Utc));
        }
    }
    Err(KeygenError::InvalidDate(pub_date.to_string()))
}

/// Normalize to NFC, collapse whitespace runs to single hyphens, drop any
/// character outside `[A-Za-z0-9_.-]` (this includes emoji — stripped
/// rather than transliterated, which keeps the function pure and total),
/// then truncate to `MAX_SLUG_LEN` on a whitespace/hyphen boundary.
fn slugify(title: &str) -> String {
    let normalized: String = title.nfc().collect();

    let mut out = String::with_capacity(normalized.len());
    let mut last_was_space = false;
    for c in normalized.chars() {
        if c.is_whitespace() {
            if !last_was_space && !out.is_empty() {
                out.push('-');
            }
            last_was_space = true;
            continue;
        }
        last_was_space = false;
        if c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == '-' {
            out.push(c);
        }
        // else: drop (emoji, punctuation, non-ASCII letters)
    }

    let trimmed = out.trim_matches('-');
    truncate_on_boundary(trimmed, MAX_SLUG_LEN)
}

fn truncate_on_boundary(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    let mut cut = max_len;
    while cut > 0 && !s.is_char_boundary(cut) {
        cut -= 1;
    }
    let slice = &s[..cut];
    match slice.rfind(['-', '_']) {
        Some(idx) if idx > 0 => slice[..idx].to_string(),
        _ => slice.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_across_calls() {
        let a = file_key("The Opener", "Mon, 06 Jan 2020 12:00:00 GMT").unwrap();
        let b = file_key("The Opener", "Mon, 06 Jan 2020 12:00:00 GMT").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn e1_scenario_from_spec() {
        let key = file_key("The Opener", "Mon, 06 Jan 2020 12:00:00 GMT").unwrap();
        assert_eq!(key, "2020-01-06_The-Opener");
    }

    #[test]
    fn rfc3339_date_also_parses() {
        let key = file_key("Episode Two", "2021-03-15T08:30:00Z").unwrap();
        assert_eq!(key, "2021-03-15_Episode-Two");
    }

    #[test]
    fn nfc_and_nfd_titles_collapse_to_same_key() {
        // "é" as a single codepoint (NFC) vs "e" + combining acute (NFD).
        let nfc_title = "Caf\u{00e9} Talk";
        let nfd_title = "Cafe\u{0301} Talk";
        let a = file_key(nfc_title, "2020-01-06T00:00:00Z").unwrap();
        let b = file_key(nfd_title, "2020-01-06T00:00:00Z").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn invalid_date_is_rejected() {
        let err = file_key("Whatever", "not-a-date").unwrap_err();
        assert_eq!(err, KeygenError::InvalidDate("not-a-date".to_string()));
    }

    #[test]
    fn whitespace_runs_collapse_to_single_hyphen() {
        let key = file_key("Multiple   Spaces   Here", "2020-01-06T00:00:00Z").unwrap();
        assert_eq!(key, "2020-01-06_Multiple-Spaces-Here");
    }

    #[test]
    fn long_titles_truncate_on_a_boundary() {
        let long_title = "word ".repeat(30);
        let key = file_key(&long_title, "2020-01-06T00:00:00Z").unwrap();
        let slug = key.strip_prefix("2020-01-06_").unwrap();
        assert!(slug.len() <= MAX_SLUG_LEN);
        assert!(!slug.ends_with('-'));
    }

    #[test]
    fn emoji_is_stripped_deterministically() {
        let key = file_key("Great Episode \u{1F680}", "2020-01-06T00:00:00Z").unwrap();
        assert_eq!(key, "2020-01-06_Great-Episode");
    }
}
