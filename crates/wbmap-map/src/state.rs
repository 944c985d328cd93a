//! Per-run traversal state.

use wbmap_model::{PathSegment, Relationship};

use crate::header::HeaderRecord;
use crate::results::{AutoMapperResults, HeaderMapping, ResultStore};

/// The relationship a node was reached through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ParentLink {
    pub source_table: String,
    pub relationship: String,
    pub other_side: Option<String>,
    pub to_many: bool,
}

impl ParentLink {
    pub(crate) fn new(source_table: &str, relationship: &Relationship) -> Self {
        Self {
            source_table: source_table.to_string(),
            relationship: relationship.name.clone(),
            other_side: relationship.other_side_name.clone(),
            to_many: relationship.is_to_many(),
        }
    }

    /// True when `relationship` leads straight back over the link that was just followed.
    pub(crate) fn is_reversed_by(&self, relationship: &Relationship) -> bool {
        relationship.related_table == self.source_table
            && (self.other_side.as_deref() == Some(relationship.name.as_str())
                || relationship.other_side_name.as_deref() == Some(self.relationship.as_str()))
    }
}

/// One table reached from the base table along `path`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TraversalNode {
    pub table: String,
    pub path: Vec<PathSegment>,
    /// Relationship and rank hops in `path`.
    pub depth: usize,
    pub parent: Option<ParentLink>,
}

impl TraversalNode {
    pub(crate) fn seed(table: &str, path: &[PathSegment], parent: Option<ParentLink>) -> Self {
        Self {
            table: table.to_string(),
            path: path.to_vec(),
            depth: path.iter().filter(|segment| !segment.is_to_many()).count(),
            parent,
        }
    }
}

/// Breadth-first work queue indexed by level.
#[derive(Debug, Default)]
pub(crate) struct WorkQueue {
    levels: Vec<Vec<TraversalNode>>,
    next: usize,
}

impl WorkQueue {
    pub(crate) fn seeded(node: TraversalNode) -> Self {
        Self {
            levels: vec![vec![node]],
            next: 0,
        }
    }

    pub(crate) fn push_queue_level(&mut self, level: usize, node: TraversalNode) {
        if self.levels.len() <= level {
            self.levels.resize_with(level + 1, Vec::new);
        }
        self.levels[level].push(node);
    }

    /// Takes the next level and its index. Children of its nodes go to `index + 1`.
    pub(crate) fn pop_level(&mut self) -> Option<(usize, Vec<TraversalNode>)> {
        let level = self.next;
        let nodes = std::mem::take(self.levels.get_mut(level)?);
        self.next += 1;
        Some((level, nodes))
    }
}

/// Mutable state owned by one `map()` call.
#[derive(Debug)]
pub(crate) struct MapperState {
    pub headers: Vec<HeaderRecord>,
    pub results: ResultStore,
}

impl MapperState {
    pub(crate) fn new(headers: Vec<HeaderRecord>) -> Self {
        let results = ResultStore::new(headers.len());
        Self { headers, results }
    }

    pub(crate) fn mark_header_mapped(&mut self, header: usize) {
        self.headers[header].is_mapped = true;
    }

    pub(crate) fn is_mapped(&self, header: usize) -> bool {
        self.headers[header].is_mapped
    }

    /// Indices of headers still open for matching, in input order.
    pub(crate) fn unmapped(&self) -> Vec<usize> {
        (0..self.headers.len())
            .filter(|&index| !self.is_mapped(index))
            .collect()
    }

    pub(crate) fn into_results(self, ignored: Vec<String>) -> AutoMapperResults {
        let mappings = self
            .headers
            .into_iter()
            .zip(self.results.into_paths())
            .map(|(header, paths)| HeaderMapping {
                header: header.raw,
                paths,
            })
            .collect();
        AutoMapperResults::new(mappings, ignored)
    }
}

#[cfg(test)]
mod tests {
    use wbmap_model::RelationshipKind;

    use super::*;

    fn relationship(name: &str, related: &str, other_side: Option<&str>) -> Relationship {
        Relationship {
            name: name.to_string(),
            label: name.to_string(),
            kind: RelationshipKind::ManyToOne,
            related_table: related.to_string(),
            other_side_name: other_side.map(ToString::to_string),
            hidden: false,
            read_only: false,
        }
    }

    #[test]
    fn queue_drains_level_by_level() {
        let root = TraversalNode::seed("collectionobject", &[], None);
        let mut queue = WorkQueue::seeded(root);
        let (level, nodes) = queue.pop_level().unwrap();
        assert_eq!((level, nodes.len()), (0, 1));
        queue.push_queue_level(1, TraversalNode::seed("agent", &[PathSegment::name("cataloger")], None));
        queue.push_queue_level(1, TraversalNode::seed("accession", &[PathSegment::name("accession")], None));
        let (level, nodes) = queue.pop_level().unwrap();
        assert_eq!(level, 1);
        assert_eq!(nodes[0].table, "agent");
        assert_eq!(nodes[1].depth, 1);
        assert!(queue.pop_level().is_none());
    }

    #[test]
    fn detects_reversed_relationships() {
        let link = ParentLink::new(
            "collectionobject",
            &relationship("determinations", "determination", Some("collectionobject")),
        );
        assert!(link.is_reversed_by(&relationship(
            "collectionobject",
            "collectionobject",
            Some("determinations")
        )));
        assert!(link.is_reversed_by(&relationship("collectionobject", "collectionobject", None)));
        assert!(!link.is_reversed_by(&relationship("taxon", "taxon", None)));
    }

    #[test]
    fn seed_depth_ignores_to_many_markers() {
        let path = [PathSegment::name("determinations"), PathSegment::ToMany(2)];
        assert_eq!(TraversalNode::seed("determination", &path, None).depth, 1);
    }
}
