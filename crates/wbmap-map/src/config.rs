//! Construction record for one auto-mapper run.

use std::fmt;

use wbmap_model::{MappingPath, PathSegment, Scope};

/// Callback reporting whether a path is already claimed in the working mapping tree.
pub type PathIsMapped<'a> = Box<dyn Fn(&MappingPath) -> bool + 'a>;

/// Inputs of a single [`AutoMapper`](crate::AutoMapper) run.
///
/// `starting_table`, `path` and `path_offset` anchor the search at a sub-path
/// of an existing mapping when refining it; by default the search starts at
/// the base table with an empty path.
pub struct AutoMapperConfig<'a> {
    pub headers: Vec<String>,
    pub base_table: String,
    pub starting_table: Option<String>,
    pub path: Vec<PathSegment>,
    pub path_offset: usize,
    pub scope: Scope,
    pub path_is_mapped: Option<PathIsMapped<'a>>,
}

impl<'a> AutoMapperConfig<'a> {
    pub fn new<I, S>(headers: I, base_table: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            base_table: base_table.into(),
            starting_table: None,
            path: Vec::new(),
            path_offset: 0,
            scope: Scope::default(),
            path_is_mapped: None,
        }
    }

    #[must_use]
    pub fn with_starting_table(mut self, table: impl Into<String>) -> Self {
        self.starting_table = Some(table.into());
        self
    }

    #[must_use]
    pub fn with_path(mut self, path: Vec<PathSegment>) -> Self {
        self.path = path;
        self
    }

    /// To-many markers before this position are never renumbered on collision.
    #[must_use]
    pub fn with_path_offset(mut self, offset: usize) -> Self {
        self.path_offset = offset;
        self
    }

    #[must_use]
    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    #[must_use]
    pub fn with_path_is_mapped(mut self, callback: impl Fn(&MappingPath) -> bool + 'a) -> Self {
        self.path_is_mapped = Some(Box::new(callback));
        self
    }

    pub fn starting_table(&self) -> &str {
        self.starting_table.as_deref().unwrap_or(&self.base_table)
    }
}

impl fmt::Debug for AutoMapperConfig<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AutoMapperConfig")
            .field("headers", &self.headers)
            .field("base_table", &self.base_table)
            .field("starting_table", &self.starting_table)
            .field("path", &self.path)
            .field("path_offset", &self.path_offset)
            .field("scope", &self.scope)
            .field("path_is_mapped", &self.path_is_mapped.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starting_table_defaults_to_base() {
        let config = AutoMapperConfig::new(["Catalog #"], "CollectionObject");
        assert_eq!(config.starting_table(), "CollectionObject");
        assert_eq!(config.scope, Scope::AutoMapper);
        let config = config.with_starting_table("Determination");
        assert_eq!(config.starting_table(), "Determination");
    }

    #[test]
    fn debug_hides_callback() {
        let config = AutoMapperConfig::new(Vec::<String>::new(), "Agent")
            .with_path_is_mapped(|_| false);
        assert!(format!("{config:?}").contains("path_is_mapped: true"));
    }
}
