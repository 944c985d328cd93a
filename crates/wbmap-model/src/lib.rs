#![deny(unsafe_code)]

pub mod error;
pub mod path;
pub mod schema;
pub mod scope;

pub use error::{ModelError, Result};
pub use path::{MappingPath, PathSegment, display_segments, hop_count, parse_segments};
pub use schema::{
    Field, FieldDocument, Relationship, RelationshipDocument, RelationshipKind, Schema,
    SchemaDocument, Table, TableDocument, TreeDef,
};
pub use scope::Scope;
