use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("mapping path must contain at least one segment")]
    EmptyPath,

    #[error("invalid mapping path segment '{0}'")]
    InvalidSegment(String),

    #[error("unknown scope '{0}' (expected 'automapper' or 'suggestion')")]
    UnknownScope(String),

    #[error("failed to read schema {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse schema {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid schema document: {0}")]
    InvalidDocument(#[source] serde_json::Error),

    #[error("duplicate table '{0}' in schema")]
    DuplicateTable(String),

    #[error("relationship {table}.{relationship} points at unknown table '{related}'")]
    DanglingRelationship {
        table: String,
        relationship: String,
        related: String,
    },
}

pub type Result<T> = std::result::Result<T, ModelError>;
