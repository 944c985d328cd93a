//! Comparison of normalized headers against fields, table phrases and ranks.

use std::collections::HashMap;

use regex::Regex;
use wbmap_model::Field;
use wbmap_rules::FieldSynonyms;

use crate::header::{HeaderRecord, stripped_form};

/// Optional ordinal after a table or field phrase, e.g. the `2` in `collector 2 last name`.
const ORDINAL: &str = r"(?: (\d+)(?:st|nd|rd|th)?)?";

/// A formatted-synonym hit, with the to-many ordinal embedded in the header if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormattedMatch {
    pub index: Option<u32>,
}

/// Matches `"<table> <field>"` and `"<field> <table>"` headers for one
/// table/field pair, each side optionally followed by an ordinal.
#[derive(Debug, Clone)]
pub struct FormattedPattern {
    table_first: Regex,
    field_first: Regex,
}

impl FormattedPattern {
    pub fn new(table_phrases: &[String], field_phrases: &[String]) -> Result<Self, regex::Error> {
        let table = alternation(table_phrases);
        let field = alternation(field_phrases);
        Ok(Self {
            table_first: Regex::new(&format!("^{table}{ORDINAL} {field}{ORDINAL}$"))?,
            field_first: Regex::new(&format!("^{field}{ORDINAL} {table}{ORDINAL}$"))?,
        })
    }

    pub fn matches(&self, lower_header: &str) -> Option<FormattedMatch> {
        let captures = self
            .table_first
            .captures(lower_header)
            .or_else(|| self.field_first.captures(lower_header))?;
        let raw_index = captures.iter().skip(1).flatten().next();
        let index = match raw_index {
            Some(raw) => match raw.as_str().parse::<u32>() {
                Ok(index) if index > 0 => Some(index),
                _ => return None,
            },
            None => None,
        };
        Some(FormattedMatch { index })
    }
}

fn alternation(phrases: &[String]) -> String {
    let escaped: Vec<String> = phrases.iter().map(|phrase| regex::escape(phrase)).collect();
    format!("(?:{})", escaped.join("|"))
}

/// Compiled formatted patterns of one run, keyed by table, field and table phrases.
#[derive(Debug, Default)]
pub struct PatternCache {
    patterns: HashMap<(String, String, String), Option<FormattedPattern>>,
}

impl PatternCache {
    pub fn get_or_build(
        &mut self,
        table: &str,
        field: &Field,
        synonyms: Option<&FieldSynonyms>,
        table_phrases: &[String],
    ) -> Option<&FormattedPattern> {
        let key = (
            table.to_string(),
            field.name.clone(),
            table_phrases.join("|"),
        );
        self.patterns
            .entry(key)
            .or_insert_with(|| {
                let field_phrases = field_phrases(field, synonyms);
                if table_phrases.is_empty() || field_phrases.is_empty() {
                    return None;
                }
                match FormattedPattern::new(table_phrases, &field_phrases) {
                    Ok(pattern) => Some(pattern),
                    Err(error) => {
                        tracing::warn!(table, field = %field.name, %error, "cannot build formatted pattern");
                        None
                    }
                }
            })
            .as_ref()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// Formatted synonyms of a field followed by its lower-cased label.
pub fn field_phrases(field: &Field, synonyms: Option<&FieldSynonyms>) -> Vec<String> {
    let mut phrases: Vec<String> = synonyms
        .map(|synonyms| synonyms.formatted.clone())
        .unwrap_or_default();
    push_unique(&mut phrases, field.label.trim().to_lowercase());
    phrases
}

/// Phrases used to qualify a rank name: formatted synonyms, label and name.
pub fn rank_field_phrases(field: &Field, synonyms: Option<&FieldSynonyms>) -> Vec<String> {
    let mut phrases = field_phrases(field, synonyms);
    push_unique(&mut phrases, field.name.clone());
    phrases
}

pub(crate) fn push_unique(phrases: &mut Vec<String>, phrase: String) {
    if !phrase.is_empty() && !phrases.contains(&phrase) {
        phrases.push(phrase);
    }
}

/// Direct comparison against the field's label and name.
pub fn matches_label_or_name(field: &Field, header: &HeaderRecord) -> bool {
    let label = field.label.trim().to_lowercase();
    label == header.lower
        || (!header.stripped.is_empty() && stripped_form(&label) == header.stripped)
        || field.name == header.lower.replace(' ', "")
        || (!header.compact.is_empty() && field.name == header.compact)
}

/// Field comparisons tried ahead of the formatted phrases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRules {
    /// Declared header rules only. Used for tables with table synonyms in the shortcut pass.
    Declared,
    /// Declared header rules, then label and name.
    Direct,
}

impl FieldRules {
    pub fn matches(self, field: &Field, synonyms: Option<&FieldSynonyms>, header: &HeaderRecord) -> bool {
        synonyms.is_some_and(|synonyms| synonyms.headers.matches(&header.lower))
            || (self == Self::Direct && matches_label_or_name(field, header))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phrases(values: &[&str]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    fn field(name: &str, label: &str) -> Field {
        Field {
            name: name.to_string(),
            label: label.to_string(),
            hidden: false,
            read_only: false,
        }
    }

    #[test]
    fn formatted_pattern_extracts_ordinal() {
        let pattern = FormattedPattern::new(
            &phrases(&["collector", "coll"]),
            &phrases(&["last name", "surname"]),
        )
        .unwrap();
        assert_eq!(
            pattern.matches("collector last name"),
            Some(FormattedMatch { index: None })
        );
        assert_eq!(
            pattern.matches("collector 2 last name"),
            Some(FormattedMatch { index: Some(2) })
        );
        assert_eq!(
            pattern.matches("surname coll 3rd"),
            Some(FormattedMatch { index: Some(3) })
        );
        assert_eq!(
            pattern.matches("collector last name 1st"),
            Some(FormattedMatch { index: Some(1) })
        );
        assert_eq!(pattern.matches("collector 0 last name"), None);
        assert_eq!(pattern.matches("collectors last name"), None);
        assert_eq!(pattern.matches("last name"), None);
    }

    #[test]
    fn phrases_are_escaped() {
        let pattern = FormattedPattern::new(&phrases(&["acc."]), &phrases(&["no (x)"])).unwrap();
        assert!(pattern.matches("acc. no (x)").is_some());
        assert!(pattern.matches("accx no (x)").is_none());
    }

    #[test]
    fn cache_reuses_patterns() {
        let mut cache = PatternCache::default();
        let first_name = field("firstname", "First Name");
        let table = phrases(&["determiner"]);
        assert!(cache.get_or_build("agent", &first_name, None, &table).is_some());
        assert!(cache.get_or_build("agent", &first_name, None, &table).is_some());
        assert_eq!(cache.len(), 1);
        assert!(cache.get_or_build("agent", &first_name, None, &[]).is_none());
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn label_and_name_comparisons() {
        let latitude = field("latitude1", "Latitude1");
        assert!(matches_label_or_name(&latitude, &HeaderRecord::new("Latitude1")));
        let station = field("stationfieldnumber", "Station Field Number");
        assert!(matches_label_or_name(&station, &HeaderRecord::new("Station-Field Number")));
        assert!(matches_label_or_name(&station, &HeaderRecord::new("StationFieldNumber")));
        assert!(!matches_label_or_name(&station, &HeaderRecord::new("Field Number")));
        let empty = field("remarks", "Remarks");
        assert!(!matches_label_or_name(&empty, &HeaderRecord::new("#")));
    }

    #[test]
    fn declared_rules_skip_label_and_name() {
        let rules = wbmap_rules::Rules::from_json_str(
            r#"{"synonyms": {"Agent": {"lastName": {"suggestion": {"headers": {"string": ["Surname"]}}}}}}"#,
        )
        .unwrap();
        let synonyms = rules.field_synonyms("agent", "lastname", wbmap_model::Scope::Suggestion);
        let last_name = field("lastname", "Last Name");
        let surname = HeaderRecord::new("Surname");
        let label = HeaderRecord::new("Last Name");
        assert!(FieldRules::Declared.matches(&last_name, synonyms, &surname));
        assert!(!FieldRules::Declared.matches(&last_name, synonyms, &label));
        assert!(FieldRules::Direct.matches(&last_name, synonyms, &surname));
        assert!(FieldRules::Direct.matches(&last_name, synonyms, &label));
        assert!(!FieldRules::Declared.matches(&last_name, None, &surname));
    }
}
