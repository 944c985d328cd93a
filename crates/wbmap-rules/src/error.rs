#![deny(unsafe_code)]

use std::path::PathBuf;

use wbmap_model::ModelError;

#[derive(Debug, thiserror::Error)]
pub enum RulesError {
    #[error("failed to read rules {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse rules {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid rules document: {0}")]
    InvalidDocument(#[source] serde_json::Error),

    #[error("invalid regular expression '{pattern}' in {location}: {source}")]
    InvalidPattern {
        location: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("shortcut #{index} of {table} ({scope}) has an empty target path")]
    EmptyShortcut {
        table: String,
        scope: String,
        index: usize,
    },

    #[error("invalid target path in shortcut of {table}: {source}")]
    InvalidShortcutPath {
        table: String,
        #[source]
        source: ModelError,
    },
}

impl RulesError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
