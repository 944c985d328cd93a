#![deny(unsafe_code)]

//! Schema auto-mapper: proposes mapping paths for free-text spreadsheet headers.
//!
//! A run searches the schema graph breadth-first from a base table, applies
//! the declarative rules of [`wbmap_rules::Rules`] at every table it reaches
//! and commits the matches it finds, renumbering to-many markers when two
//! headers claim the same record.

pub mod config;
pub mod engine;
pub mod error;
pub mod header;
pub mod matcher;
mod registrar;
pub mod results;
mod state;

pub use config::{AutoMapperConfig, PathIsMapped};
pub use engine::{AutoMapper, MAX_DEPTH};
pub use error::{AutoMapperError, Result};
pub use header::{HeaderRecord, NormalizedHeaders, normalize_headers};
pub use registrar::MAX_TO_MANY_INDEX;
pub use results::{AutoMapperResults, HeaderMapping};
