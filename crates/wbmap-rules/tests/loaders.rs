use std::path::PathBuf;

use wbmap_model::{Schema, Scope, parse_segments};
use wbmap_rules::{Rules, default_rules, load_rules};

fn fixture_schema() -> Schema {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../wbmap-map/tests/fixtures/schema.json");
    Schema::from_path(&path).expect("load fixture schema")
}

#[test]
fn embedded_rules_compile() {
    let rules = default_rules().expect("compile embedded rules");
    assert!(rules.has_table_synonyms("agent"));
    assert!(!rules.shortcuts("collectionobject", Scope::AutoMapper).is_empty());
    assert!(rules.is_denied("agent", "title", Scope::Suggestion));
    assert!(rules.never_map(Scope::AutoMapper).is_some());
    assert!(rules.never_map(Scope::Suggestion).is_none());

    // Second call hands out the cached instance.
    let again = default_rules().expect("cached rules");
    assert!(std::ptr::eq(rules, again));
}

#[test]
fn embedded_rules_match_fixture_schema() {
    let rules = default_rules().expect("compile embedded rules");
    let stale = rules.stale_references(&fixture_schema());
    assert!(stale.is_empty(), "stale references: {stale:?}");
}

#[test]
fn never_map_handles_spreadsheet_artifacts() {
    let rules = default_rules().expect("compile embedded rules");
    let never_map = rules.never_map(Scope::AutoMapper).expect("never_map rules");
    assert!(never_map.matches("unnamed: 3"));
    assert!(never_map.matches("row number"));
    assert!(!never_map.matches("catalog number"));
}

#[test]
fn determiner_synonyms_depend_on_path() {
    let rules = default_rules().expect("compile embedded rules");
    let determiner = parse_segments("determinations.#1.determiner").unwrap();
    let synonyms = rules.table_synonyms_for("agent", &determiner);
    assert!(synonyms.contains(&"who id"));
    assert!(!synonyms.contains(&"collector"));
    let cataloger = parse_segments("cataloger").unwrap();
    assert_eq!(rules.table_synonyms_for("agent", &cataloger), ["cataloger", "cataloged by"]);
}

#[test]
fn stale_references_report_unknown_names() {
    let json = r#"{
        "table_synonyms": {"Specimen": [{"synonyms": ["Spec"]}]},
        "rank_synonyms": {"Taxon": {"Tribe": ["Tribus"]}},
        "shortcuts": {"CollectionObject": {"automapper": [
            {"target_path": "cataloger.nickname", "headers": {"string": ["Nick"]}}
        ]}},
        "synonyms": {"Agent": {"shoeSize": {"automapper": {"formatted_synonyms": ["Shoe"]}}}},
        "dont_match": {"Locality": {"latitude1": ["suggestion"]}}
    }"#;
    let rules = Rules::from_json_str(json).unwrap();
    let rendered = rules
        .stale_references(&fixture_schema())
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n");
    insta::assert_snapshot!(rendered, @r"
    rank_synonyms: taxon.tribe
    shortcuts: collectionobject.cataloger.nickname
    synonyms: agent.shoesize
    table_synonyms: specimen
    ");
}

#[test]
fn loads_rules_from_disk() {
    let mut path = std::env::temp_dir();
    path.push(format!("wbmap-rules-{}.json", std::process::id()));
    std::fs::write(&path, include_str!("../data/default_rules.json")).unwrap();
    let rules = load_rules(&path).expect("load rules from disk");
    std::fs::remove_file(&path).ok();
    assert_eq!(
        rules.shortcuts("collectionobject", Scope::AutoMapper).len(),
        default_rules()
            .unwrap()
            .shortcuts("collectionobject", Scope::AutoMapper)
            .len()
    );
}

#[test]
fn missing_file_reports_path() {
    let err = load_rules(&PathBuf::from("/nonexistent/wbmap-rules.json")).unwrap_err();
    assert!(err.to_string().contains("/nonexistent/wbmap-rules.json"));
}
