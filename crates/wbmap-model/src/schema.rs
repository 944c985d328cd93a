//! In-memory snapshot of the relational schema the auto-mapper searches.
//!
//! The schema is a directed graph: tables are vertices keyed by lower-cased
//! name and relationships are labelled edges. Tree tables additionally carry
//! an ordered list of ranks, root first.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};
use crate::path::PathSegment;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelationshipKind {
    ManyToOne,
    OneToOne,
    OneToMany,
    ManyToMany,
}

impl RelationshipKind {
    pub fn is_to_many(self) -> bool {
        matches!(self, Self::OneToMany | Self::ManyToMany)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ManyToOne => "many-to-one",
            Self::OneToOne => "one-to-one",
            Self::OneToMany => "one-to-many",
            Self::ManyToMany => "many-to-many",
        }
    }
}

impl fmt::Display for RelationshipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Field {
    pub name: String,
    pub label: String,
    pub hidden: bool,
    pub read_only: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Relationship {
    pub name: String,
    pub label: String,
    pub kind: RelationshipKind,
    pub related_table: String,
    pub other_side_name: Option<String>,
    pub hidden: bool,
    pub read_only: bool,
}

impl Relationship {
    pub fn is_to_many(&self) -> bool {
        self.kind.is_to_many()
    }

    /// Hidden and read-only relationships are never followed.
    pub fn is_navigable(&self) -> bool {
        !self.hidden && !self.read_only
    }
}

/// Ranks of a tree table, ordered from the root down.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeDef {
    pub ranks: Vec<String>,
}

impl TreeDef {
    /// Every rank except the root, which is never mapped.
    pub fn mappable_ranks(&self) -> &[String] {
        self.ranks.get(1..).unwrap_or_default()
    }

    pub fn canonical_rank(&self, rank: &str) -> Option<&str> {
        self.ranks
            .iter()
            .find(|candidate| candidate.eq_ignore_ascii_case(rank))
            .map(String::as_str)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Table {
    /// Lower-cased name used in mapping paths and lookups.
    pub name: String,
    /// Name as it appears in the snapshot.
    pub display_name: String,
    pub label: String,
    pub fields: Vec<Field>,
    pub relationships: Vec<Relationship>,
    pub tree: Option<TreeDef>,
}

impl Table {
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields
            .iter()
            .find(|field| field.name.eq_ignore_ascii_case(name))
    }

    pub fn relationship(&self, name: &str) -> Option<&Relationship> {
        self.relationships
            .iter()
            .find(|relationship| relationship.name.eq_ignore_ascii_case(name))
    }

    pub fn is_tree(&self) -> bool {
        self.tree.is_some()
    }

    pub fn navigable_relationships(&self) -> impl Iterator<Item = &Relationship> {
        self.relationships
            .iter()
            .filter(|relationship| relationship.is_navigable())
    }

    pub fn visible_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|field| !field.hidden)
    }

    /// Fields an uploaded column can be written to.
    pub fn mappable_fields(&self) -> impl Iterator<Item = &Field> {
        self.visible_fields().filter(|field| !field.read_only)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Schema {
    tables: BTreeMap<String, Table>,
}

impl Schema {
    pub fn from_json_str(contents: &str) -> Result<Self> {
        let document: SchemaDocument =
            serde_json::from_str(contents).map_err(ModelError::InvalidDocument)?;
        Self::from_document(document)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let document: SchemaDocument =
            serde_json::from_str(&contents).map_err(|source| ModelError::Json {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_document(document)
    }

    pub fn from_document(document: SchemaDocument) -> Result<Self> {
        let mut tables = BTreeMap::new();
        for raw in document.tables {
            let table = raw.into_table();
            if tables.contains_key(&table.name) {
                return Err(ModelError::DuplicateTable(table.display_name));
            }
            tables.insert(table.name.clone(), table);
        }
        for table in tables.values() {
            for relationship in &table.relationships {
                if !tables.contains_key(&relationship.related_table) {
                    return Err(ModelError::DanglingRelationship {
                        table: table.display_name.clone(),
                        relationship: relationship.name.clone(),
                        related: relationship.related_table.clone(),
                    });
                }
            }
        }
        Ok(Self { tables })
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.get(&name.to_lowercase())
    }

    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.values()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Stored casing of `rank` in a tree table, matched case-insensitively.
    pub fn canonical_rank(&self, table: &str, rank: &str) -> Option<&str> {
        self.table(table)?.tree.as_ref()?.canonical_rank(rank)
    }

    /// Follows relationship, to-many and rank segments from `base` and
    /// returns the table the segments end on.
    pub fn resolve_path(&self, base: &str, segments: &[PathSegment]) -> Option<&Table> {
        let mut table = self.table(base)?;
        for segment in segments {
            match segment {
                PathSegment::Name(name) => {
                    let relationship = table.relationship(name)?;
                    table = self.table(&relationship.related_table)?;
                }
                PathSegment::ToMany(_) => {}
                PathSegment::Rank(rank) => {
                    table.tree.as_ref()?.canonical_rank(rank)?;
                }
            }
        }
        Some(table)
    }

    /// True when `segments` lead from `base` to a field of the table reached.
    pub fn resolves_to_field(&self, base: &str, segments: &[PathSegment]) -> bool {
        let Some((PathSegment::Name(leaf), head)) = segments.split_last() else {
            return false;
        };
        self.resolve_path(base, head)
            .is_some_and(|table| table.field(leaf).is_some())
    }
}

/// Serialized form of a schema snapshot.
#[derive(Debug, Clone, Deserialize)]
pub struct SchemaDocument {
    pub tables: Vec<TableDocument>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TableDocument {
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldDocument>,
    #[serde(default)]
    pub relationships: Vec<RelationshipDocument>,
    #[serde(default)]
    pub tree: Option<TreeDef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FieldDocument {
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub read_only: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RelationshipDocument {
    pub name: String,
    pub kind: RelationshipKind,
    pub related_table: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub other_side_name: Option<String>,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub read_only: bool,
}

impl TableDocument {
    fn into_table(self) -> Table {
        let fields = self
            .fields
            .into_iter()
            .map(|field| Field {
                label: field.label.unwrap_or_else(|| field.name.clone()),
                name: field.name.to_lowercase(),
                hidden: field.hidden,
                read_only: field.read_only,
            })
            .collect();
        let relationships = self
            .relationships
            .into_iter()
            .map(|relationship| Relationship {
                label: relationship
                    .label
                    .unwrap_or_else(|| relationship.name.clone()),
                name: relationship.name.to_lowercase(),
                kind: relationship.kind,
                related_table: relationship.related_table.to_lowercase(),
                other_side_name: relationship.other_side_name.map(|name| name.to_lowercase()),
                hidden: relationship.hidden,
                read_only: relationship.read_only,
            })
            .collect();
        Table {
            name: self.name.to_lowercase(),
            label: self.label.unwrap_or_else(|| self.name.clone()),
            display_name: self.name,
            fields,
            relationships,
            tree: self.tree,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::parse_segments;

    const SAMPLE: &str = r#"{
        "tables": [
            {
                "name": "Determination",
                "fields": [{"name": "determinedDate", "label": "Date"}],
                "relationships": [
                    {"name": "taxon", "kind": "many-to-one", "related_table": "Taxon"}
                ]
            },
            {
                "name": "Taxon",
                "fields": [{"name": "name"}, {"name": "author"}],
                "relationships": [
                    {"name": "parent", "kind": "many-to-one", "related_table": "Taxon",
                     "other_side_name": "children"}
                ],
                "tree": {"ranks": ["Life", "Kingdom", "Class", "Genus"]}
            }
        ]
    }"#;

    #[test]
    fn lowercases_names_and_keeps_labels() {
        let schema = Schema::from_json_str(SAMPLE).unwrap();
        let determination = schema.table("DETERMINATION").unwrap();
        assert_eq!(determination.display_name, "Determination");
        assert_eq!(determination.fields[0].name, "determineddate");
        assert_eq!(determination.fields[0].label, "Date");
        let taxon = schema.table("taxon").unwrap();
        assert_eq!(taxon.fields[1].label, "author");
        assert_eq!(
            taxon.relationships[0].other_side_name.as_deref(),
            Some("children")
        );
    }

    #[test]
    fn resolves_ranks_and_relationships() {
        let schema = Schema::from_json_str(SAMPLE).unwrap();
        assert_eq!(schema.canonical_rank("taxon", "class"), Some("Class"));
        assert_eq!(schema.canonical_rank("determination", "class"), None);
        let path = parse_segments("taxon.$class.name").unwrap();
        assert!(schema.resolves_to_field("determination", &path));
        let bad = parse_segments("taxon.$order.name").unwrap();
        assert!(!schema.resolves_to_field("determination", &bad));
        let tree = schema.table("taxon").unwrap().tree.as_ref().unwrap();
        assert_eq!(tree.mappable_ranks(), ["Kingdom", "Class", "Genus"]);
    }

    #[test]
    fn rejects_dangling_relationships() {
        let json = r#"{"tables": [{"name": "A", "relationships": [
            {"name": "b", "kind": "many-to-one", "related_table": "B"}]}]}"#;
        let err = Schema::from_json_str(json).unwrap_err();
        assert!(err.to_string().contains("unknown table 'b'"));
    }
}
