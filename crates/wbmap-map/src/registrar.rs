//! Commits matched paths into the result store.

use std::fmt;

use wbmap_model::{MappingPath, PathSegment, Schema, Scope, Table};
use wbmap_rules::Rules;

use crate::config::PathIsMapped;
use crate::engine::MAX_DEPTH;
use crate::error::{AutoMapperError, Result};
use crate::state::MapperState;

/// Highest ordinal a to-many marker is bumped to while resolving collisions.
pub const MAX_TO_MANY_INDEX: u32 = 999;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CommitOutcome {
    /// The path was recorded. `stop_search` is set when the header needs no
    /// further candidates: a single-mapping run and a path without to-many hops.
    Accepted { stop_search: bool },
    Rejected,
}

impl CommitOutcome {
    pub(crate) fn stops_search(self) -> bool {
        matches!(self, Self::Accepted { stop_search: true })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RejectReason {
    DeniedField,
    OutsideStartingPath,
    TooDeep,
    Exhausted,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::DeniedField => "field is on the don't-match list",
            Self::OutsideStartingPath => "path leaves the starting path",
            Self::TooDeep => "path exceeds the depth limit",
            Self::Exhausted => "no to-many marker left to renumber",
        })
    }
}

/// Read-only inputs of a commit.
pub(crate) struct Registrar<'a> {
    pub schema: &'a Schema,
    pub rules: &'a Rules,
    pub scope: Scope,
    pub starting_path: &'a [PathSegment],
    pub path_offset: usize,
    pub path_is_mapped: Option<&'a PathIsMapped<'a>>,
}

/// What was matched, and where.
pub(crate) struct Candidate<'c> {
    pub header: usize,
    /// Table `segments` are relative to.
    pub table: &'c Table,
    pub base: &'c [PathSegment],
    pub segments: &'c [PathSegment],
    /// Ordinal taken from the header text, if any.
    pub index: Option<u32>,
}

impl Registrar<'_> {
    pub(crate) fn register_result(
        &self,
        state: &mut MapperState,
        candidate: Candidate<'_>,
    ) -> Result<CommitOutcome> {
        let (segments, leaf_table) =
            canonicalize_ranks(self.schema, candidate.table, candidate.segments);
        let Ok(joined) = MappingPath::join(candidate.base, &segments) else {
            return Err(AutoMapperError::EmptyMappingPath {
                header: state.headers[candidate.header].raw.clone(),
                table: candidate.table.name.clone(),
            });
        };

        if let Some(reason) = self.precheck(&joined, leaf_table) {
            return Ok(self.reject(state, candidate.header, joined.segments(), reason));
        }

        let mut path = match candidate.index {
            Some(index) => renumber_last_to_many(joined, index)?,
            None => joined,
        };
        let allow_multiple = self.scope.allows_multiple_mappings();
        while self.is_taken(state, candidate.header, &path, allow_multiple) {
            match bump_to_many(&path, self.path_offset) {
                Some(next) => path = next,
                None => {
                    let segments = path.into_segments();
                    return Ok(self.reject(state, candidate.header, &segments, RejectReason::Exhausted));
                }
            }
        }

        let stop_search = !allow_multiple && path.to_many_count() == 0;
        tracing::debug!(
            header = %state.headers[candidate.header].raw,
            path = %path,
            "mapped header"
        );
        if !allow_multiple {
            state.mark_header_mapped(candidate.header);
        }
        state.results.push(candidate.header, path);
        Ok(CommitOutcome::Accepted { stop_search })
    }

    fn precheck(&self, path: &MappingPath, leaf_table: Option<&Table>) -> Option<RejectReason> {
        if let (Some(table), Some(field)) = (leaf_table, path.last().as_name())
            && self.rules.is_denied(&table.name, field, self.scope)
        {
            return Some(RejectReason::DeniedField);
        }
        if !path.starts_with(self.starting_path) {
            return Some(RejectReason::OutsideStartingPath);
        }
        if path.relationship_depth() > MAX_DEPTH {
            return Some(RejectReason::TooDeep);
        }
        None
    }

    fn is_taken(
        &self,
        state: &MapperState,
        header: usize,
        path: &MappingPath,
        allow_multiple: bool,
    ) -> bool {
        (!allow_multiple && state.results.is_claimed(path))
            || state.results.header_has(header, path)
            || (self.scope.checks_existing_mappings()
                && self.path_is_mapped.is_some_and(|callback| callback(path)))
    }

    fn reject(
        &self,
        state: &MapperState,
        header: usize,
        segments: &[PathSegment],
        reason: RejectReason,
    ) -> CommitOutcome {
        tracing::trace!(
            header = %state.headers[header].raw,
            path = %wbmap_model::display_segments(segments),
            %reason,
            "rejected candidate"
        );
        CommitOutcome::Rejected
    }
}

/// True when `path` agrees with `starting_path` over their common length.
pub(crate) fn follows_starting_path(path: &[PathSegment], starting_path: &[PathSegment]) -> bool {
    path.iter().zip(starting_path).all(|(left, right)| left == right)
}

/// Replaces the right-most to-many marker with an ordinal read from the header.
fn renumber_last_to_many(path: MappingPath, index: u32) -> Result<MappingPath> {
    let mut segments = path.into_segments();
    if let Some(marker) = segments.iter_mut().rev().find(|segment| segment.is_to_many()) {
        *marker = PathSegment::ToMany(index);
    }
    Ok(MappingPath::new(segments)?)
}

/// Increments the right-most to-many marker at or after `offset`.
pub(crate) fn bump_to_many(path: &MappingPath, offset: usize) -> Option<MappingPath> {
    let mut segments = path.segments().to_vec();
    let position = segments
        .iter()
        .enumerate()
        .rev()
        .take_while(|(position, _)| *position >= offset)
        .find_map(|(position, segment)| match segment {
            PathSegment::ToMany(index) if *index < MAX_TO_MANY_INDEX => Some(position),
            _ => None,
        })?;
    if let PathSegment::ToMany(index) = &mut segments[position] {
        *index += 1;
    }
    MappingPath::new(segments).ok()
}

/// Restores the stored casing of rank segments and returns the table owning the leaf.
///
/// Rule data is lower-cased while tree ranks keep their schema casing.
pub(crate) fn canonicalize_ranks<'s>(
    schema: &'s Schema,
    table: &'s Table,
    segments: &[PathSegment],
) -> (Vec<PathSegment>, Option<&'s Table>) {
    let mut current = Some(table);
    let mut canonical = Vec::with_capacity(segments.len());
    let last = segments.len().saturating_sub(1);
    for (position, segment) in segments.iter().enumerate() {
        match segment {
            PathSegment::Rank(rank) => {
                let stored = current
                    .and_then(|table| table.tree.as_ref())
                    .and_then(|tree| tree.canonical_rank(rank))
                    .unwrap_or(rank.as_str());
                canonical.push(PathSegment::rank(stored));
            }
            PathSegment::Name(name) if position < last => {
                current = current
                    .and_then(|table| table.relationship(name))
                    .and_then(|relationship| schema.table(&relationship.related_table));
                canonical.push(segment.clone());
            }
            _ => canonical.push(segment.clone()),
        }
    }
    (canonical, current)
}
