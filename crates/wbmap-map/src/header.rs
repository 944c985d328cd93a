//! Header normalization.

use std::collections::BTreeSet;

use wbmap_rules::HeaderRules;

/// One input header and the forms it is compared under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderRecord {
    /// Header text as supplied.
    pub raw: String,
    /// Lower-cased, whitespace collapsed, duplicate suffix removed, ordinal moved to the end.
    pub lower: String,
    /// `lower` with everything but letters replaced by single spaces.
    pub stripped: String,
    /// `stripped` without any whitespace.
    pub compact: String,
    pub is_mapped: bool,
}

impl HeaderRecord {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let lower = lower_form(&raw);
        let stripped = stripped_form(&lower);
        let compact = stripped.split_whitespace().collect();
        Self {
            raw,
            lower,
            stripped,
            compact,
            is_mapped: false,
        }
    }
}

/// Headers that take part in mapping, and those dropped by the never-map rules.
#[derive(Debug, Clone, Default)]
pub struct NormalizedHeaders {
    pub records: Vec<HeaderRecord>,
    pub ignored: Vec<String>,
}

pub fn normalize_headers(raw: &[String], never_map: Option<&HeaderRules>) -> NormalizedHeaders {
    let mut normalized = NormalizedHeaders::default();
    let mut seen = BTreeSet::new();
    for header in raw {
        if !seen.insert(header.as_str()) {
            tracing::warn!(header = %header, "duplicate header ignored");
            continue;
        }
        let record = HeaderRecord::new(header.clone());
        if never_map.is_some_and(|rules| rules.matches(&record.lower)) {
            tracing::debug!(header = %header, "header matches never-map rules");
            normalized.ignored.push(header.clone());
            continue;
        }
        normalized.records.push(record);
    }
    normalized
}

pub fn lower_form(raw: &str) -> String {
    let collapsed = collapse_whitespace(&raw.to_lowercase());
    let trimmed = strip_duplicate_suffix(&collapsed).trim();
    move_leading_ordinal(trimmed)
}

pub fn stripped_form(value: &str) -> String {
    let letters: String = value
        .chars()
        .map(|c| if c.is_alphabetic() { c } else { ' ' })
        .collect();
    collapse_whitespace(&letters)
}

fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Removes a trailing `(n)` that spreadsheets append to repeated column names.
fn strip_duplicate_suffix(value: &str) -> &str {
    let Some(inner) = value.strip_suffix(')') else {
        return value;
    };
    let Some(open) = inner.rfind('(') else {
        return value;
    };
    let digits = &inner[open + 1..];
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return value;
    }
    &value[..open]
}

/// `"1st collector"` becomes `"collector 1st"`.
fn move_leading_ordinal(value: &str) -> String {
    let Some((first, rest)) = value.split_once(' ') else {
        return value.to_string();
    };
    if !is_ordinal(first) || rest.is_empty() {
        return value.to_string();
    }
    format!("{rest} {first}")
}

fn is_ordinal(token: &str) -> bool {
    let digits = token.trim_end_matches(|c: char| c.is_ascii_alphabetic());
    let suffix = &token[digits.len()..];
    !digits.is_empty()
        && digits.chars().all(|c| c.is_ascii_digit())
        && matches!(suffix, "st" | "nd" | "rd" | "th")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_all_forms() {
        let record = HeaderRecord::new("  Collector  2 First_Name (3) ");
        assert_eq!(record.lower, "collector 2 first_name");
        assert_eq!(record.stripped, "collector first name");
        assert_eq!(record.compact, "collectorfirstname");
        assert!(!record.is_mapped);
    }

    #[test]
    fn moves_leading_ordinal_to_end() {
        assert_eq!(lower_form("1st Collector"), "collector 1st");
        assert_eq!(lower_form("22nd Determiner Last Name"), "determiner last name 22nd");
        assert_eq!(lower_form("1 Collector"), "1 collector");
        assert_eq!(lower_form("1st"), "1st");
    }

    #[test]
    fn keeps_non_numeric_parentheses() {
        assert_eq!(lower_form("Elevation (m)"), "elevation (m)");
        assert_eq!(lower_form("Count (2)"), "count");
        assert_eq!(lower_form("()"), "()");
    }

    #[test]
    fn drops_duplicates_and_never_map_headers() {
        let rules = wbmap_rules::default_rules().unwrap();
        let never_map = rules.never_map(wbmap_model::Scope::AutoMapper);
        let raw = ["Row", "Catalog #", "Catalog #", "Unnamed: 4"].map(String::from);
        let normalized = normalize_headers(&raw, never_map);
        let kept: Vec<_> = normalized.records.iter().map(|r| r.raw.as_str()).collect();
        assert_eq!(kept, ["Catalog #"]);
        assert_eq!(normalized.ignored, ["Row", "Unnamed: 4"]);
    }
}
