//! Serialized form of the rule document.
//!
//! The document is pure data keyed by table, field and scope. Keys may use
//! any casing; [`Rules`](crate::Rules) lower-cases them on load.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use wbmap_model::Scope;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RulesDocument {
    /// Table -> alternate names, each valid when the path to the table ends in `path_suffix`.
    #[serde(default)]
    pub table_synonyms: BTreeMap<String, Vec<TableSynonymDocument>>,
    /// Tree table -> rank -> alternate rank names.
    #[serde(default)]
    pub rank_synonyms: BTreeMap<String, BTreeMap<String, Vec<String>>>,
    /// Table -> scope -> headers that jump straight to a fixed sub-path.
    #[serde(default)]
    pub shortcuts: BTreeMap<String, BTreeMap<Scope, Vec<ShortcutDocument>>>,
    /// Table -> field -> scope -> synonyms.
    #[serde(default)]
    pub synonyms: BTreeMap<String, BTreeMap<String, BTreeMap<Scope, FieldSynonymDocument>>>,
    /// Table -> field -> scopes in which the field must never be auto-matched.
    #[serde(default)]
    pub dont_match: BTreeMap<String, BTreeMap<String, Vec<Scope>>>,
    /// Scope -> headers that are dropped before mapping starts.
    #[serde(default)]
    pub never_map: BTreeMap<Scope, HeaderRulesDocument>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HeaderRulesDocument {
    #[serde(default)]
    pub string: Vec<String>,
    #[serde(default)]
    pub contains: Vec<String>,
    #[serde(default)]
    pub regex: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TableSynonymDocument {
    #[serde(default)]
    pub path_suffix: Vec<String>,
    pub synonyms: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShortcutDocument {
    /// Dotted mapping path relative to the table the shortcut is declared on.
    pub target_path: String,
    pub headers: HeaderRulesDocument,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldSynonymDocument {
    #[serde(default)]
    pub headers: HeaderRulesDocument,
    /// Synonyms that only match when combined with a table name or synonym.
    #[serde(default)]
    pub formatted_synonyms: Vec<String>,
}
