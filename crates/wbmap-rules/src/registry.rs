#![deny(unsafe_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use wbmap_model::{PathSegment, Schema, Scope, parse_segments};

use crate::document::{FieldSynonymDocument, RulesDocument, ShortcutDocument};
use crate::error::RulesError;
use crate::header_rules::{HeaderRules, lower_all};

/// Alternate names for a table, valid when the path reaching the table ends
/// in `path_suffix` (relationship names only, to-many markers ignored).
#[derive(Debug, Clone)]
pub struct TableSynonym {
    pub path_suffix: Vec<String>,
    pub synonyms: Vec<String>,
}

impl TableSynonym {
    pub fn applies_to(&self, path: &[PathSegment]) -> bool {
        let names: Vec<&str> = path.iter().filter_map(PathSegment::as_name).collect();
        if self.path_suffix.len() > names.len() {
            return false;
        }
        let tail = &names[names.len() - self.path_suffix.len()..];
        tail.iter()
            .zip(&self.path_suffix)
            .all(|(name, expected)| name.eq_ignore_ascii_case(expected))
    }
}

#[derive(Debug, Clone)]
pub struct Shortcut {
    pub target_path: Vec<PathSegment>,
    pub headers: HeaderRules,
}

#[derive(Debug, Clone, Default)]
pub struct FieldSynonyms {
    pub headers: HeaderRules,
    pub formatted: Vec<String>,
}

/// A rule entry that names a table, field or rank the schema does not have.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, serde::Serialize)]
pub struct StaleReference {
    pub section: &'static str,
    pub table: String,
    pub detail: Option<String>,
}

impl fmt::Display for StaleReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.detail {
            Some(detail) => write!(f, "{}: {}.{}", self.section, self.table, detail),
            None => write!(f, "{}: {}", self.section, self.table),
        }
    }
}

/// Immutable, lower-cased rule store.
#[derive(Debug, Clone, Default)]
pub struct Rules {
    table_synonyms: BTreeMap<String, Vec<TableSynonym>>,
    rank_synonyms: BTreeMap<String, BTreeMap<String, Vec<String>>>,
    shortcuts: BTreeMap<String, BTreeMap<Scope, Vec<Shortcut>>>,
    field_synonyms: BTreeMap<String, BTreeMap<String, BTreeMap<Scope, FieldSynonyms>>>,
    dont_match: BTreeMap<String, BTreeMap<String, BTreeSet<Scope>>>,
    never_map: BTreeMap<Scope, HeaderRules>,
}

impl Rules {
    pub fn from_json_str(contents: &str) -> Result<Self, RulesError> {
        let document: RulesDocument =
            serde_json::from_str(contents).map_err(RulesError::InvalidDocument)?;
        Self::from_document(&document)
    }

    pub fn from_document(document: &RulesDocument) -> Result<Self, RulesError> {
        let mut rules = Self::default();

        for (table, entries) in &document.table_synonyms {
            let compiled = entries
                .iter()
                .map(|entry| TableSynonym {
                    path_suffix: lower_all(&entry.path_suffix),
                    synonyms: lower_all(&entry.synonyms),
                })
                .filter(|entry| !entry.synonyms.is_empty());
            rules
                .table_synonyms
                .entry(table.to_lowercase())
                .or_default()
                .extend(compiled);
        }

        for (table, ranks) in &document.rank_synonyms {
            let target = rules.rank_synonyms.entry(table.to_lowercase()).or_default();
            for (rank, synonyms) in ranks {
                target
                    .entry(rank.to_lowercase())
                    .or_default()
                    .extend(lower_all(synonyms));
            }
        }

        for (table, scopes) in &document.shortcuts {
            let table = table.to_lowercase();
            for (scope, entries) in scopes {
                let compiled = entries
                    .iter()
                    .enumerate()
                    .map(|(index, entry)| compile_shortcut(&table, *scope, index, entry))
                    .collect::<Result<Vec<_>, _>>()?;
                rules
                    .shortcuts
                    .entry(table.clone())
                    .or_default()
                    .entry(*scope)
                    .or_default()
                    .extend(compiled);
            }
        }

        for (table, fields) in &document.synonyms {
            let table = table.to_lowercase();
            for (field, scopes) in fields {
                let field = field.to_lowercase();
                for (scope, entry) in scopes {
                    let location = format!("synonyms.{table}.{field}.{scope}");
                    let compiled = compile_field_synonyms(entry, &location)?;
                    rules
                        .field_synonyms
                        .entry(table.clone())
                        .or_default()
                        .entry(field.clone())
                        .or_default()
                        .insert(*scope, compiled);
                }
            }
        }

        for (table, fields) in &document.dont_match {
            let target = rules.dont_match.entry(table.to_lowercase()).or_default();
            for (field, scopes) in fields {
                target
                    .entry(field.to_lowercase())
                    .or_default()
                    .extend(scopes.iter().copied());
            }
        }

        for (scope, entry) in &document.never_map {
            let location = format!("never_map.{scope}");
            rules
                .never_map
                .insert(*scope, HeaderRules::compile(entry, &location)?);
        }

        Ok(rules)
    }

    /// True when `table` declares table synonyms under any path filter.
    pub fn has_table_synonyms(&self, table: &str) -> bool {
        self.table_synonyms
            .get(table)
            .is_some_and(|entries| !entries.is_empty())
    }

    /// Synonyms of `table` whose path filter matches the path that reached it.
    pub fn table_synonyms_for(&self, table: &str, path: &[PathSegment]) -> Vec<&str> {
        let Some(entries) = self.table_synonyms.get(table) else {
            return Vec::new();
        };
        let mut synonyms: Vec<&str> = Vec::new();
        for entry in entries.iter().filter(|entry| entry.applies_to(path)) {
            for synonym in &entry.synonyms {
                if !synonyms.contains(&synonym.as_str()) {
                    synonyms.push(synonym);
                }
            }
        }
        synonyms
    }

    pub fn rank_synonyms(&self, table: &str, rank: &str) -> &[String] {
        self.rank_synonyms
            .get(table)
            .and_then(|ranks| ranks.get(&rank.to_lowercase()))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn shortcuts(&self, table: &str, scope: Scope) -> &[Shortcut] {
        self.shortcuts
            .get(table)
            .and_then(|scopes| scopes.get(&scope))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn field_synonyms(&self, table: &str, field: &str, scope: Scope) -> Option<&FieldSynonyms> {
        self.field_synonyms.get(table)?.get(field)?.get(&scope)
    }

    /// True when `field` of `table` must never be auto-matched in `scope`.
    pub fn is_denied(&self, table: &str, field: &str, scope: Scope) -> bool {
        self.dont_match
            .get(table)
            .and_then(|fields| fields.get(field))
            .is_some_and(|scopes| scopes.contains(&scope))
    }

    pub fn never_map(&self, scope: Scope) -> Option<&HeaderRules> {
        self.never_map.get(&scope)
    }

    /// Rule entries that refer to tables, fields or ranks missing from `schema`.
    pub fn stale_references(&self, schema: &Schema) -> Vec<StaleReference> {
        let mut stale = BTreeSet::new();
        let mut missing_table = |section: &'static str, table: &str| {
            if schema.table(table).is_none() {
                stale.insert(StaleReference {
                    section,
                    table: table.to_string(),
                    detail: None,
                });
                true
            } else {
                false
            }
        };

        let mut details: Vec<StaleReference> = Vec::new();
        for table in self.table_synonyms.keys() {
            missing_table("table_synonyms", table);
        }
        for (table, ranks) in &self.rank_synonyms {
            if missing_table("rank_synonyms", table) {
                continue;
            }
            for rank in ranks.keys() {
                if schema.canonical_rank(table, rank).is_none() {
                    details.push(StaleReference {
                        section: "rank_synonyms",
                        table: table.clone(),
                        detail: Some(rank.clone()),
                    });
                }
            }
        }
        for (table, scopes) in &self.shortcuts {
            if missing_table("shortcuts", table) {
                continue;
            }
            for shortcut in scopes.values().flatten() {
                if !schema.resolves_to_field(table, &shortcut.target_path) {
                    details.push(StaleReference {
                        section: "shortcuts",
                        table: table.clone(),
                        detail: Some(wbmap_model::display_segments(&shortcut.target_path)),
                    });
                }
            }
        }
        for (section, table, fields) in self
            .field_synonyms
            .iter()
            .map(|(table, fields)| ("synonyms", table, fields.keys().collect::<Vec<_>>()))
            .chain(
                self.dont_match
                    .iter()
                    .map(|(table, fields)| ("dont_match", table, fields.keys().collect())),
            )
        {
            if missing_table(section, table) {
                continue;
            }
            let Some(schema_table) = schema.table(table) else {
                continue;
            };
            for field in fields {
                if schema_table.field(field).is_none() {
                    details.push(StaleReference {
                        section,
                        table: table.clone(),
                        detail: Some(field.clone()),
                    });
                }
            }
        }

        stale.extend(details);
        stale.into_iter().collect()
    }
}

fn compile_shortcut(
    table: &str,
    scope: Scope,
    index: usize,
    entry: &ShortcutDocument,
) -> Result<Shortcut, RulesError> {
    let target_path = parse_segments(&entry.target_path.to_lowercase()).map_err(|source| {
        RulesError::InvalidShortcutPath {
            table: table.to_string(),
            source,
        }
    })?;
    if target_path.is_empty() {
        return Err(RulesError::EmptyShortcut {
            table: table.to_string(),
            scope: scope.to_string(),
            index,
        });
    }
    let location = format!("shortcuts.{table}.{scope}[{index}]");
    Ok(Shortcut {
        target_path,
        headers: HeaderRules::compile(&entry.headers, &location)?,
    })
}

fn compile_field_synonyms(
    entry: &FieldSynonymDocument,
    location: &str,
) -> Result<FieldSynonyms, RulesError> {
    Ok(FieldSynonyms {
        headers: HeaderRules::compile(&entry.headers, location)?,
        formatted: lower_all(&entry.formatted_synonyms),
    })
}
