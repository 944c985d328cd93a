use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::OnceLock;

use proptest::prelude::*;
use wbmap_map::{AutoMapper, AutoMapperConfig, AutoMapperResults, MAX_DEPTH};
use wbmap_model::{Schema, Scope};
use wbmap_rules::default_rules;

const HEADER_POOL: &[&str] = &[
    "Catalog #",
    "Cataloged by",
    "Accession No.",
    "ID Date",
    "Who ID First Name",
    "Determiner 1 First Name",
    "Determiner 2 Last Name",
    "Collector 1 Last Name",
    "Collector Last Name",
    "Collector Last Name (2)",
    "2nd Collector First Name",
    "Collecting Date",
    "Field Number",
    "Latitude1",
    "Longitude1",
    "Locality Name",
    "Class",
    "Genus",
    "Species Author",
    "Scientific Name",
    "Remarks",
    "Text1",
    "Title",
    "Prep Type",
    "Count",
    "Row",
    "Unnamed: 3",
    "Mystery Column",
];

fn schema() -> &'static Schema {
    static SCHEMA: OnceLock<Schema> = OnceLock::new();
    SCHEMA.get_or_init(|| {
        let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/schema.json");
        Schema::from_path(&path).expect("load fixture schema")
    })
}

fn map(headers: &[&str], scope: Scope) -> AutoMapperResults {
    let config = AutoMapperConfig::new(headers.iter().copied(), "CollectionObject").with_scope(scope);
    AutoMapper::new(schema(), default_rules().expect("default rules"), config)
        .expect("construct auto-mapper")
        .map()
        .expect("map headers")
}

fn header_sets() -> impl Strategy<Value = Vec<&'static str>> {
    prop::sample::subsequence(HEADER_POOL.to_vec(), 0..=HEADER_POOL.len()).prop_shuffle()
}

fn scopes() -> impl Strategy<Value = Scope> {
    prop::sample::select(Scope::ALL.to_vec())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn mapping_is_deterministic(headers in header_sets(), scope in scopes()) {
        let config = AutoMapperConfig::new(headers.iter().copied(), "CollectionObject").with_scope(scope);
        let mapper = AutoMapper::new(schema(), default_rules().unwrap(), config).unwrap();
        let first = mapper.map().unwrap();
        prop_assert_eq!(&first, &mapper.map().unwrap());
        prop_assert_eq!(&first, &map(&headers, scope));
    }

    #[test]
    fn proposed_paths_resolve_within_depth(headers in header_sets(), scope in scopes()) {
        let results = map(&headers, scope);
        for mapping in &results {
            for path in &mapping.paths {
                prop_assert!(!path.is_empty());
                prop_assert!(path.relationship_depth() <= MAX_DEPTH, "{} too deep", path);
                prop_assert!(
                    schema().resolves_to_field("collectionobject", path.segments()),
                    "{} does not resolve",
                    path
                );
            }
        }
    }

    #[test]
    fn automapper_claims_each_path_once(headers in header_sets()) {
        let results = map(&headers, Scope::AutoMapper);
        let mut seen = BTreeSet::new();
        for mapping in &results {
            prop_assert!(mapping.paths.len() <= 1, "{} has several paths", mapping.header);
            for path in &mapping.paths {
                prop_assert!(seen.insert(path.clone()), "{} claimed twice", path);
            }
        }
    }

    #[test]
    fn every_header_is_reported_once(headers in header_sets(), scope in scopes()) {
        let results = map(&headers, scope);
        let reported = results.len() + results.ignored_headers().len();
        prop_assert_eq!(reported, headers.len());
    }
}
