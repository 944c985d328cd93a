use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Named matching profile controlling strictness and multiplicity of results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Scope {
    /// Import mapping: one path per header, paths unique across headers.
    #[default]
    AutoMapper,
    /// Suggestions for a single line: several candidate paths per header.
    Suggestion,
}

impl Scope {
    pub const ALL: [Scope; 2] = [Scope::AutoMapper, Scope::Suggestion];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::AutoMapper => "automapper",
            Self::Suggestion => "suggestion",
        }
    }

    pub fn allows_multiple_mappings(self) -> bool {
        matches!(self, Self::Suggestion)
    }

    /// Whether paths already present in the working mapping tree count as taken.
    pub fn checks_existing_mappings(self) -> bool {
        matches!(self, Self::AutoMapper)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scope {
    type Err = ModelError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_lowercase().as_str() {
            "automapper" => Ok(Self::AutoMapper),
            "suggestion" => Ok(Self::Suggestion),
            _ => Err(ModelError::UnknownScope(raw.to_string())),
        }
    }
}

impl Serialize for Scope {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Scope {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
