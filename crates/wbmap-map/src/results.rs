//! Accumulated mapping results.

use std::collections::BTreeSet;

use serde::Serialize;
use wbmap_model::MappingPath;

/// Paths proposed during one run, kept parallel to the header list.
#[derive(Debug, Clone, Default)]
pub(crate) struct ResultStore {
    paths: Vec<Vec<MappingPath>>,
    claimed: BTreeSet<MappingPath>,
}

impl ResultStore {
    pub(crate) fn new(header_count: usize) -> Self {
        Self {
            paths: vec![Vec::new(); header_count],
            claimed: BTreeSet::new(),
        }
    }

    /// True when any header already holds `path`.
    pub(crate) fn is_claimed(&self, path: &MappingPath) -> bool {
        self.claimed.contains(path)
    }

    pub(crate) fn header_has(&self, header: usize, path: &MappingPath) -> bool {
        self.paths[header].contains(path)
    }

    pub(crate) fn push(&mut self, header: usize, path: MappingPath) {
        self.claimed.insert(path.clone());
        self.paths[header].push(path);
    }

    pub(crate) fn total(&self) -> usize {
        self.paths.iter().map(Vec::len).sum()
    }

    pub(crate) fn into_paths(self) -> Vec<Vec<MappingPath>> {
        self.paths
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderMapping {
    pub header: String,
    pub paths: Vec<MappingPath>,
}

/// Output of [`AutoMapper::map`](crate::AutoMapper::map).
///
/// Every header that survived normalization has an entry, in input order,
/// with its paths in discovery order. An empty list means no proposal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AutoMapperResults {
    mappings: Vec<HeaderMapping>,
    ignored: Vec<String>,
}

impl AutoMapperResults {
    pub(crate) fn new(mappings: Vec<HeaderMapping>, ignored: Vec<String>) -> Self {
        Self { mappings, ignored }
    }

    pub fn get(&self, header: &str) -> Option<&[MappingPath]> {
        self.mappings
            .iter()
            .find(|mapping| mapping.header == header)
            .map(|mapping| mapping.paths.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = &HeaderMapping> {
        self.mappings.iter()
    }

    /// Headers with at least one proposed path.
    pub fn mapped_headers(&self) -> impl Iterator<Item = &str> {
        self.mappings
            .iter()
            .filter(|mapping| !mapping.paths.is_empty())
            .map(|mapping| mapping.header.as_str())
    }

    /// Surviving headers without any proposal; these are left for manual mapping.
    pub fn unmapped_headers(&self) -> impl Iterator<Item = &str> {
        self.mappings
            .iter()
            .filter(|mapping| mapping.paths.is_empty())
            .map(|mapping| mapping.header.as_str())
    }

    /// Headers dropped by the never-map rules.
    pub fn ignored_headers(&self) -> &[String] {
        &self.ignored
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    /// True when no header received a path.
    pub fn is_empty(&self) -> bool {
        self.mapped_headers().next().is_none()
    }
}

impl<'a> IntoIterator for &'a AutoMapperResults {
    type Item = &'a HeaderMapping;
    type IntoIter = std::slice::Iter<'a, HeaderMapping>;

    fn into_iter(self) -> Self::IntoIter {
        self.mappings.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn results() -> AutoMapperResults {
        AutoMapperResults::new(
            vec![
                HeaderMapping {
                    header: "Catalog #".to_string(),
                    paths: vec!["catalognumber".parse().unwrap()],
                },
                HeaderMapping {
                    header: "Mystery".to_string(),
                    paths: Vec::new(),
                },
            ],
            vec!["Row".to_string()],
        )
    }

    #[test]
    fn splits_mapped_and_unmapped() {
        let results = results();
        assert_eq!(results.mapped_headers().collect::<Vec<_>>(), ["Catalog #"]);
        assert_eq!(results.unmapped_headers().collect::<Vec<_>>(), ["Mystery"]);
        assert_eq!(results.ignored_headers(), ["Row"]);
        assert_eq!(results.get("Mystery"), Some(&[][..]));
        assert!(results.get("Row").is_none());
        assert!(!results.is_empty());
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn serializes_paths_as_segment_arrays() {
        let json = serde_json::to_value(results()).unwrap();
        assert_eq!(json["mappings"][0]["paths"][0][0], "catalognumber");
        assert_eq!(json["ignored"][0], "Row");
    }

    #[test]
    fn store_tracks_claims_across_headers() {
        let mut store = ResultStore::new(2);
        let path: MappingPath = "accession.accessionnumber".parse().unwrap();
        store.push(0, path.clone());
        assert!(store.is_claimed(&path));
        assert!(store.header_has(0, &path));
        assert!(!store.header_has(1, &path));
        assert_eq!(store.total(), 1);
    }
}
