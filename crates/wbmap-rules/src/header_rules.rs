use regex::{Regex, RegexBuilder};

use crate::document::HeaderRulesDocument;
use crate::error::RulesError;

/// Comparison rules applied to a lower-cased header.
///
/// A header matches when any pattern of any kind matches.
#[derive(Debug, Clone, Default)]
pub struct HeaderRules {
    strings: Vec<String>,
    contains: Vec<String>,
    regexes: Vec<Regex>,
}

impl HeaderRules {
    pub(crate) fn compile(
        document: &HeaderRulesDocument,
        location: &str,
    ) -> Result<Self, RulesError> {
        let regexes = document
            .regex
            .iter()
            .map(|pattern| {
                // Patterns are not lower-cased so that escapes like `\D` survive.
                RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .map_err(|source| RulesError::InvalidPattern {
                        location: location.to_string(),
                        pattern: pattern.clone(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            strings: lower_all(&document.string),
            contains: lower_all(&document.contains),
            regexes,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty() && self.contains.is_empty() && self.regexes.is_empty()
    }

    pub fn matches(&self, lower_header: &str) -> bool {
        self.strings.iter().any(|value| value == lower_header)
            || self
                .contains
                .iter()
                .any(|value| lower_header.contains(value.as_str()))
            || self
                .regexes
                .iter()
                .any(|regex| regex.is_match(lower_header))
    }
}

pub(crate) fn lower_all(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|value| value.trim().to_lowercase())
        .filter(|value| !value.is_empty())
        .collect()
}
