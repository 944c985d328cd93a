#![deny(unsafe_code)]

use wbmap_model::ModelError;

/// Errors raised while constructing or running the auto-mapper.
#[derive(Debug, thiserror::Error)]
pub enum AutoMapperError {
    #[error("table '{0}' is not part of the schema")]
    UnknownTable(String),

    #[error("path '{path}' does not lead from '{base_table}' to '{starting_table}'")]
    StartingPathMismatch {
        base_table: String,
        starting_table: String,
        path: String,
    },

    /// A rule produced a zero-length path; the run is aborted.
    #[error("empty mapping path produced for header '{header}' on table '{table}'")]
    EmptyMappingPath { header: String, table: String },

    #[error(transparent)]
    Model(#[from] ModelError),
}

pub type Result<T> = std::result::Result<T, AutoMapperError>;
