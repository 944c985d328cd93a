//! Mapping paths from a base table to a leaf field.
//!
//! A path is rendered as dot-separated segments, for example
//! `determinations.#1.taxon.$Class.name`: plain names are fields or
//! relationships, `#N` selects the Nth record of a to-many relationship and
//! `$Rank` selects a rank of a tree table.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

const TO_MANY_PREFIX: char = '#';
const RANK_PREFIX: char = '$';
const SEPARATOR: char = '.';

/// One step of a mapping path.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PathSegment {
    /// A field or relationship name. Which of the two is decided by the schema.
    Name(String),
    /// The 1-based ordinal of a record reached through a to-many relationship.
    ToMany(u32),
    /// A rank of a tree table.
    Rank(String),
}

impl PathSegment {
    pub fn name(value: impl Into<String>) -> Self {
        Self::Name(value.into())
    }

    pub fn rank(value: impl Into<String>) -> Self {
        Self::Rank(value.into())
    }

    pub fn is_to_many(&self) -> bool {
        matches!(self, Self::ToMany(_))
    }

    pub fn is_rank(&self) -> bool {
        matches!(self, Self::Rank(_))
    }

    pub fn as_name(&self) -> Option<&str> {
        match self {
            Self::Name(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => f.write_str(name),
            Self::ToMany(index) => write!(f, "{TO_MANY_PREFIX}{index}"),
            Self::Rank(rank) => write!(f, "{RANK_PREFIX}{rank}"),
        }
    }
}

impl FromStr for PathSegment {
    type Err = ModelError;

    fn from_str(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let invalid = || ModelError::InvalidSegment(raw.to_string());
        if trimmed.is_empty() || trimmed.contains(SEPARATOR) {
            return Err(invalid());
        }
        if let Some(index) = trimmed.strip_prefix(TO_MANY_PREFIX) {
            let index: u32 = index.parse().map_err(|_| invalid())?;
            if index == 0 {
                return Err(invalid());
            }
            return Ok(Self::ToMany(index));
        }
        if let Some(rank) = trimmed.strip_prefix(RANK_PREFIX) {
            if rank.is_empty() {
                return Err(invalid());
            }
            return Ok(Self::Rank(rank.to_string()));
        }
        Ok(Self::Name(trimmed.to_string()))
    }
}

impl Serialize for PathSegment {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PathSegment {
    fn deserialize<D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Parses a dot-separated path into segments. An empty string yields no segments.
pub fn parse_segments(raw: &str) -> Result<Vec<PathSegment>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    trimmed.split(SEPARATOR).map(str::parse).collect()
}

/// Renders a (possibly empty) segment list in the dotted text form.
pub fn display_segments(segments: &[PathSegment]) -> String {
    segments
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(".")
}

/// Number of relationship and rank hops in a segment list.
///
/// The trailing name is the leaf field and does not count.
pub fn hop_count(segments: &[PathSegment]) -> usize {
    let Some((last, head)) = segments.split_last() else {
        return 0;
    };
    let hops = head
        .iter()
        .filter(|segment| !segment.is_to_many())
        .count();
    if last.is_rank() { hops + 1 } else { hops }
}

/// A complete, non-empty mapping path.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<PathSegment>", into = "Vec<PathSegment>")]
pub struct MappingPath(Vec<PathSegment>);

impl MappingPath {
    pub fn new(segments: Vec<PathSegment>) -> Result<Self> {
        if segments.is_empty() {
            return Err(ModelError::EmptyPath);
        }
        Ok(Self(segments))
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn into_segments(self) -> Vec<PathSegment> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; kept alongside `len` for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn last(&self) -> &PathSegment {
        // Non-empty by construction.
        &self.0[self.0.len() - 1]
    }

    pub fn to_many_count(&self) -> usize {
        self.0.iter().filter(|segment| segment.is_to_many()).count()
    }

    /// Relationship and rank hops between the base table and the leaf field.
    pub fn relationship_depth(&self) -> usize {
        hop_count(&self.0)
    }

    pub fn starts_with(&self, prefix: &[PathSegment]) -> bool {
        self.0.starts_with(prefix)
    }

    /// Concatenates a base path with further segments.
    pub fn join(base: &[PathSegment], tail: &[PathSegment]) -> Result<Self> {
        let mut segments = Vec::with_capacity(base.len() + tail.len());
        segments.extend_from_slice(base);
        segments.extend_from_slice(tail);
        Self::new(segments)
    }
}

impl TryFrom<Vec<PathSegment>> for MappingPath {
    type Error = ModelError;

    fn try_from(segments: Vec<PathSegment>) -> Result<Self> {
        Self::new(segments)
    }
}

impl From<MappingPath> for Vec<PathSegment> {
    fn from(path: MappingPath) -> Self {
        path.0
    }
}

impl AsRef<[PathSegment]> for MappingPath {
    fn as_ref(&self) -> &[PathSegment] {
        &self.0
    }
}

impl fmt::Display for MappingPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&display_segments(&self.0))
    }
}

impl FromStr for MappingPath {
    type Err = ModelError;

    fn from_str(raw: &str) -> Result<Self> {
        Self::new(parse_segments(raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_segment_kinds() {
        let path: MappingPath = "determinations.#1.taxon.$Class.name".parse().unwrap();
        assert_eq!(
            path.segments(),
            &[
                PathSegment::name("determinations"),
                PathSegment::ToMany(1),
                PathSegment::name("taxon"),
                PathSegment::rank("Class"),
                PathSegment::name("name"),
            ]
        );
        assert_eq!(path.to_string(), "determinations.#1.taxon.$Class.name");
        assert_eq!(path.to_many_count(), 1);
        assert_eq!(path.relationship_depth(), 3);
    }

    #[test]
    fn rejects_bad_segments() {
        assert!("#0".parse::<PathSegment>().is_err());
        assert!("#x".parse::<PathSegment>().is_err());
        assert!("$".parse::<PathSegment>().is_err());
        assert!("a..b".parse::<MappingPath>().is_err());
        assert!(matches!(
            "".parse::<MappingPath>(),
            Err(ModelError::EmptyPath)
        ));
    }

    #[test]
    fn serializes_as_string_array() {
        let path: MappingPath = "collectors.#2.agent.lastname".parse().unwrap();
        let json = serde_json::to_string(&path).unwrap();
        assert_eq!(json, r##"["collectors","#2","agent","lastname"]"##);
        let back: MappingPath = serde_json::from_str(&json).unwrap();
        assert_eq!(back, path);
        assert!(serde_json::from_str::<MappingPath>("[]").is_err());
    }

    #[test]
    fn hop_count_ignores_leaf_and_markers() {
        let leaf = parse_segments("catalognumber").unwrap();
        assert_eq!(hop_count(&leaf), 0);
        let rank_node = parse_segments("determinations.#1.taxon.$Genus").unwrap();
        assert_eq!(hop_count(&rank_node), 3);
        assert_eq!(hop_count(&[]), 0);
    }
}
