#![deny(unsafe_code)]

pub mod document;
pub mod error;
pub mod header_rules;
pub mod loaders;
pub mod registry;

pub use crate::document::{
    FieldSynonymDocument, HeaderRulesDocument, RulesDocument, ShortcutDocument,
    TableSynonymDocument,
};
pub use crate::error::RulesError;
pub use crate::header_rules::HeaderRules;
pub use crate::loaders::{default_rules, load_rules, load_rules_document, rules_path_from_env};
pub use crate::registry::{FieldSynonyms, Rules, Shortcut, StaleReference, TableSynonym};
