//! Integration tests for querying recorded EDS responses.
//!
//! These tests validate that `ResponseDocument` answers attribute queries
//! against a DSML body shaped like a real directory response.

use eds_dsml::ResponseDocument;
use std::fs;
use std::path::PathBuf;

/// Get the path to the test fixtures directory.
fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

/// Load the person fixture from disk.
fn load_person_fixture() -> Vec<u8> {
    let fixture_path = fixtures_dir().join("production_person.xml");
    fs::read(&fixture_path).unwrap_or_else(|e| {
        panic!(
            "Failed to read person fixture at {}: {}",
            fixture_path.display(),
            e
        )
    })
}

fn load_document() -> ResponseDocument {
    ResponseDocument::build(load_person_fixture())
        .unwrap_or_else(|e| panic!("Failed to parse person fixture: {e}"))
}

#[test]
fn test_single_valued_attributes() {
    let doc = load_document();

    assert_eq!(doc.entry_count(), 1);
    assert_eq!(doc.query_first_value("uid").as_deref(), Some("mrivera"));
    assert_eq!(doc.query_first_value("cn").as_deref(), Some("Maria Elena Rivera"));
    assert_eq!(doc.query_first_value("emplId").as_deref(), Some("22014587"));
    assert_eq!(
        doc.query_first_value("employeePrimaryDeptName").as_deref(),
        Some("Research, Innovation & Impact")
    );
}

#[test]
fn test_multi_valued_attributes() {
    let doc = load_document();

    assert_eq!(
        doc.query_values("eduPersonAffiliation"),
        vec!["staff", "employee", "student", "member"]
    );
    assert_eq!(doc.query_values("studentStatusHistory").len(), 3);
}

#[test]
fn test_missing_attributes_are_empty() {
    let doc = load_document();

    // The person has no preferred names recorded.
    assert!(doc.query_values("preferredCn").is_empty());
    assert_eq!(doc.query_first_value("preferredGivenname"), None);
    assert!(doc.query_values("foo").is_empty());
}

#[test]
fn test_objectclass_values_are_not_attributes() {
    let doc = load_document();

    // oc-value nodes live outside dsml:attr and must not leak into lookups.
    assert!(doc.query_values("objectclass").is_empty());
    assert!(doc.query_values("top").is_empty());
}

#[test]
fn test_queries_are_repeatable() {
    let doc = load_document();

    let first = doc.query_values("eduPersonAffiliation");
    let second = doc.query_values("eduPersonAffiliation");
    assert_eq!(first, second);
}
