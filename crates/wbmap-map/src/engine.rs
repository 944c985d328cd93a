//! Two-pass breadth-first search of the schema graph.
//!
//! The first pass applies shortcuts from the base table, plus table-synonym
//! phrases and declared header rules on tables that carry table synonyms. The
//! second applies field rules, labels and rank names from the starting table.
//! Matches are handed to the registrar, which decides whether a path is
//! committed.

use std::collections::BTreeSet;

use wbmap_model::{Field, PathSegment, Schema, Table, display_segments};
use wbmap_rules::Rules;

use crate::config::AutoMapperConfig;
use crate::error::{AutoMapperError, Result};
use crate::header::{NormalizedHeaders, normalize_headers};
use crate::matcher::{FieldRules, PatternCache, push_unique, rank_field_phrases};
use crate::registrar::{Candidate, Registrar, follows_starting_path};
use crate::results::AutoMapperResults;
use crate::state::{MapperState, ParentLink, TraversalNode, WorkQueue};

/// Maximum number of relationship and rank hops in a mapping path.
pub const MAX_DEPTH: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pass {
    Shortcuts,
    Synonyms,
}

impl Pass {
    fn as_str(self) -> &'static str {
        match self {
            Self::Shortcuts => "shortcuts",
            Self::Synonyms => "synonyms",
        }
    }
}

/// Proposes mapping paths for spreadsheet headers.
///
/// Construction validates the tables and starting path against the schema
/// and normalizes the headers. [`map`](Self::map) is pure and can be called
/// any number of times; each call owns its own traversal state.
///
/// ```ignore
/// let config = AutoMapperConfig::new(["Catalog #", "Collector 1 Last Name"], "CollectionObject");
/// let results = AutoMapper::new(&schema, rules, config)?.map()?;
/// ```
#[derive(Debug)]
pub struct AutoMapper<'a> {
    schema: &'a Schema,
    rules: &'a Rules,
    config: AutoMapperConfig<'a>,
    base_table: &'a Table,
    starting_table: &'a Table,
    starting_path: Vec<PathSegment>,
    starting_parent: Option<ParentLink>,
    headers: NormalizedHeaders,
}

impl<'a> AutoMapper<'a> {
    pub fn new(schema: &'a Schema, rules: &'a Rules, config: AutoMapperConfig<'a>) -> Result<Self> {
        let base_table = schema
            .table(&config.base_table)
            .ok_or_else(|| AutoMapperError::UnknownTable(config.base_table.clone()))?;
        let starting_table = schema
            .table(config.starting_table())
            .ok_or_else(|| AutoMapperError::UnknownTable(config.starting_table().to_string()))?;
        let (starting_path, starting_parent) = resolve_starting_path(schema, base_table, &config.path)
            .filter(|(_, reached, _)| reached.name == starting_table.name)
            .map(|(path, _, parent)| (path, parent))
            .ok_or_else(|| AutoMapperError::StartingPathMismatch {
                base_table: base_table.name.clone(),
                starting_table: starting_table.name.clone(),
                path: display_segments(&config.path),
            })?;

        for stale in rules.stale_references(schema) {
            tracing::warn!(reference = %stale, "rule refers to an item missing from the schema");
        }

        let headers = normalize_headers(&config.headers, rules.never_map(config.scope));
        Ok(Self {
            schema,
            rules,
            config,
            base_table,
            starting_table,
            starting_path,
            starting_parent,
            headers,
        })
    }

    /// Headers dropped before matching by the never-map rules.
    pub fn ignored_headers(&self) -> &[String] {
        &self.headers.ignored
    }

    pub fn map(&self) -> Result<AutoMapperResults> {
        let span = tracing::info_span!(
            "automapper",
            base_table = %self.base_table.name,
            scope = %self.config.scope
        );
        let _entered = span.enter();

        let mut walk = Walk {
            mapper: self,
            registrar: Registrar {
                schema: self.schema,
                rules: self.rules,
                scope: self.config.scope,
                starting_path: &self.starting_path,
                path_offset: self.config.path_offset,
                path_is_mapped: self.config.path_is_mapped.as_ref(),
            },
            state: MapperState::new(self.headers.records.clone()),
            patterns: PatternCache::default(),
        };
        walk.shortcut_pass()?;
        walk.synonym_pass()?;
        tracing::debug!(patterns = walk.patterns.len(), "compiled formatted patterns");
        Ok(walk.state.into_results(self.headers.ignored.clone()))
    }

    fn table_phrases(&self, table: &Table, path: &[PathSegment], with_label: bool) -> Vec<String> {
        let mut phrases: Vec<String> = self
            .rules
            .table_synonyms_for(&table.name, path)
            .into_iter()
            .map(str::to_string)
            .collect();
        if with_label {
            push_unique(&mut phrases, table.label.trim().to_lowercase());
        }
        phrases
    }

    fn expand(
        &self,
        table: &Table,
        node: &TraversalNode,
        level: usize,
        pass: Pass,
        visited: Option<&BTreeSet<String>>,
        queue: &mut WorkQueue,
    ) {
        // Rank nodes are leaves of the walk.
        if node.depth >= MAX_DEPTH || node.path.last().is_some_and(PathSegment::is_rank) {
            return;
        }
        for relationship in table.navigable_relationships() {
            if table.is_tree() && relationship.related_table == table.name {
                continue;
            }
            if visited.is_some_and(|visited| visited.contains(&relationship.related_table)) {
                continue;
            }
            if let Some(parent) = &node.parent {
                if pass == Pass::Shortcuts && parent.is_reversed_by(relationship) {
                    continue;
                }
                if parent.to_many && relationship.is_to_many() {
                    continue;
                }
            }
            let mut path = node.path.clone();
            path.push(PathSegment::name(relationship.name.clone()));
            if relationship.is_to_many() {
                let index = self.starting_index_at(&path).unwrap_or(1);
                path.push(PathSegment::ToMany(index));
            }
            queue.push_queue_level(
                level + 1,
                TraversalNode {
                    table: relationship.related_table.clone(),
                    path,
                    depth: node.depth + 1,
                    parent: Some(ParentLink::new(&table.name, relationship)),
                },
            );
        }
    }

    /// The to-many ordinal the starting path uses right after `path`, if `path` is its prefix.
    fn starting_index_at(&self, path: &[PathSegment]) -> Option<u32> {
        match self.starting_path.get(path.len()) {
            Some(PathSegment::ToMany(index)) if self.starting_path.starts_with(path) => Some(*index),
            _ => None,
        }
    }
}

/// Canonical form of `path`, the table it reaches and the relationship it ends on.
fn resolve_starting_path<'s>(
    schema: &'s Schema,
    base: &'s Table,
    path: &[PathSegment],
) -> Option<(Vec<PathSegment>, &'s Table, Option<ParentLink>)> {
    let mut table = base;
    let mut parent = None;
    let mut canonical = Vec::with_capacity(path.len());
    for segment in path {
        match segment {
            PathSegment::Name(name) => {
                let relationship = table.relationship(name)?;
                parent = Some(ParentLink::new(&table.name, relationship));
                canonical.push(PathSegment::name(relationship.name.clone()));
                table = schema.table(&relationship.related_table)?;
            }
            PathSegment::ToMany(index) => canonical.push(PathSegment::ToMany(*index)),
            PathSegment::Rank(rank) => {
                let stored = table.tree.as_ref()?.canonical_rank(rank)?;
                canonical.push(PathSegment::rank(stored));
            }
        }
    }
    Some((canonical, table, parent))
}

/// Mutable side of one `map()` call.
struct Walk<'m, 'a> {
    mapper: &'m AutoMapper<'a>,
    registrar: Registrar<'m>,
    state: MapperState,
    patterns: PatternCache,
}

impl Walk<'_, '_> {
    fn shortcut_pass(&mut self) -> Result<()> {
        let pass = Pass::Shortcuts;
        let schema = self.mapper.schema;
        let base = self.mapper.base_table;
        let mapped_before = self.state.results.total();
        tracing::debug!(pass = pass.as_str(), table = %base.name, "starting pass");

        let mut queue = WorkQueue::seeded(TraversalNode::seed(&base.name, &[], None));
        let mut evaluated = 0usize;
        while let Some((level, nodes)) = queue.pop_level() {
            for node in nodes {
                if !follows_starting_path(&node.path, &self.mapper.starting_path) {
                    continue;
                }
                let Some(table) = schema.table(&node.table) else {
                    continue;
                };
                evaluated += 1;
                trace_node(pass, level, &node);

                self.match_shortcuts(table, &node)?;
                if !table.is_tree() && self.mapper.rules.has_table_synonyms(&table.name) {
                    let phrases = self.mapper.table_phrases(table, &node.path, false);
                    self.match_fields(table, &node, &phrases, FieldRules::Declared)?;
                }
                self.mapper.expand(table, &node, level, pass, None, &mut queue);
            }
        }

        tracing::debug!(
            pass = pass.as_str(),
            nodes = evaluated,
            committed = self.state.results.total() - mapped_before,
            "finished pass"
        );
        Ok(())
    }

    fn synonym_pass(&mut self) -> Result<()> {
        let pass = Pass::Synonyms;
        let schema = self.mapper.schema;
        let start = self.mapper.starting_table;
        let mapped_before = self.state.results.total();
        tracing::debug!(pass = pass.as_str(), table = %start.name, "starting pass");

        let seed = TraversalNode::seed(
            &start.name,
            &self.mapper.starting_path,
            self.mapper.starting_parent.clone(),
        );
        let mut queue = WorkQueue::seeded(seed);
        let mut visited = BTreeSet::new();
        let mut evaluated = 0usize;
        while let Some((level, nodes)) = queue.pop_level() {
            for node in nodes {
                if !visited.insert(node.table.clone()) {
                    continue;
                }
                let Some(table) = schema.table(&node.table) else {
                    continue;
                };
                evaluated += 1;
                trace_node(pass, level, &node);

                if table.is_tree() {
                    self.match_ranks(table, &node)?;
                } else {
                    let phrases = self.mapper.table_phrases(table, &node.path, true);
                    self.match_fields(table, &node, &phrases, FieldRules::Direct)?;
                }
                self.mapper
                    .expand(table, &node, level, pass, Some(&visited), &mut queue);
            }
        }

        tracing::debug!(
            pass = pass.as_str(),
            nodes = evaluated,
            committed = self.state.results.total() - mapped_before,
            "finished pass"
        );
        Ok(())
    }

    fn match_shortcuts(&mut self, table: &Table, node: &TraversalNode) -> Result<()> {
        let shortcuts = self.mapper.rules.shortcuts(&table.name, self.registrar.scope);
        if shortcuts.is_empty() {
            return Ok(());
        }
        for header in self.state.unmapped() {
            for shortcut in shortcuts {
                if self.state.is_mapped(header) {
                    break;
                }
                if !shortcut.headers.matches(&self.state.headers[header].lower) {
                    continue;
                }
                if !self
                    .mapper
                    .schema
                    .resolves_to_field(&table.name, &shortcut.target_path)
                {
                    tracing::trace!(
                        table = %table.name,
                        target = %display_segments(&shortcut.target_path),
                        "skipping unresolvable shortcut"
                    );
                    continue;
                }
                let outcome = self.registrar.register_result(
                    &mut self.state,
                    Candidate {
                        header,
                        table,
                        base: &node.path,
                        segments: &shortcut.target_path,
                        index: None,
                    },
                )?;
                if outcome.stops_search() {
                    break;
                }
            }
        }
        Ok(())
    }

    /// Matches headers against each field of a plain table.
    ///
    /// `field_rules` picks the comparisons tried before the formatted phrases built
    /// from `table_phrases`.
    fn match_fields(
        &mut self,
        table: &Table,
        node: &TraversalNode,
        table_phrases: &[String],
        field_rules: FieldRules,
    ) -> Result<()> {
        let scope = self.registrar.scope;
        for field in table.mappable_fields() {
            let synonyms = self.mapper.rules.field_synonyms(&table.name, &field.name, scope);
            let pattern = self
                .patterns
                .get_or_build(&table.name, field, synonyms, table_phrases);
            let leaf = [PathSegment::name(field.name.clone())];
            for header in self.state.unmapped() {
                let record = &self.state.headers[header];
                let hit = if field_rules.matches(field, synonyms, record) {
                    Some(None)
                } else {
                    pattern
                        .and_then(|pattern| pattern.matches(&record.lower))
                        .map(|found| found.index)
                };
                let Some(index) = hit else {
                    continue;
                };
                self.registrar.register_result(
                    &mut self.state,
                    Candidate {
                        header,
                        table,
                        base: &node.path,
                        segments: &leaf,
                        index,
                    },
                )?;
            }
        }
        Ok(())
    }

    /// Matches headers against rank names of a tree table.
    fn match_ranks(&mut self, table: &Table, node: &TraversalNode) -> Result<()> {
        let Some(tree) = table.tree.as_ref() else {
            return Ok(());
        };
        let reentering = node.path.last().is_some_and(PathSegment::is_rank);
        let ranks: Vec<&str> = match node.path.last() {
            Some(PathSegment::Rank(rank)) => tree.canonical_rank(rank).into_iter().collect(),
            _ if node.depth < MAX_DEPTH => {
                tree.mappable_ranks().iter().map(String::as_str).collect()
            }
            _ => Vec::new(),
        };
        let scope = self.registrar.scope;
        let fields: Vec<(&Field, Vec<String>)> = table
            .mappable_fields()
            .map(|field| {
                let synonyms = self.mapper.rules.field_synonyms(&table.name, &field.name, scope);
                (field, rank_field_phrases(field, synonyms))
            })
            .collect();
        let name_field = table.mappable_fields().find(|field| field.name == "name");

        for rank in ranks {
            let mut names = vec![rank.to_lowercase()];
            for synonym in self.mapper.rules.rank_synonyms(&table.name, rank) {
                push_unique(&mut names, synonym.clone());
            }
            for header in self.state.unmapped() {
                let lower = &self.state.headers[header].lower;
                let field = if names.contains(lower) {
                    name_field
                } else {
                    fields
                        .iter()
                        .find(|(_, phrases)| {
                            names.iter().any(|name| {
                                phrases.iter().any(|phrase| is_qualified_by(lower, name, phrase))
                            })
                        })
                        .map(|(field, _)| *field)
                };
                let Some(field) = field else {
                    continue;
                };
                let segments = if reentering {
                    vec![PathSegment::name(field.name.clone())]
                } else {
                    vec![PathSegment::rank(rank), PathSegment::name(field.name.clone())]
                };
                self.registrar.register_result(
                    &mut self.state,
                    Candidate {
                        header,
                        table,
                        base: &node.path,
                        segments: &segments,
                        index: None,
                    },
                )?;
            }
        }
        Ok(())
    }
}

/// True when `header` reads `"<name> <phrase>"`.
fn is_qualified_by(header: &str, name: &str, phrase: &str) -> bool {
    header
        .strip_prefix(name)
        .and_then(|rest| rest.strip_prefix(' '))
        .is_some_and(|rest| rest == phrase)
}

fn trace_node(pass: Pass, level: usize, node: &TraversalNode) {
    tracing::trace!(
        pass = pass.as_str(),
        bfs_level = level,
        table = %node.table,
        path = %display_segments(&node.path),
        "visiting node"
    );
}
