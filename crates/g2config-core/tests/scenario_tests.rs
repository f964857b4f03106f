//! End-to-end scenarios through `apply` and `run_query`
//!
//! ## Scenarios Covered
//!
//! A. Add a data source and list it
//! B. Add, delete, then get reports not-found
//! C. Duplicate add fails and leaves the document alone
//! D. A call naming an unknown function is an invalid reference

mod common;

use common::{apply_ok, base_document, try_apply};
use g2config_core::{run_query, ConfigError, EntityKey, Query};
use g2config_core_types::EntityKind;
use serde_json::json;

#[test]
fn test_scenario_a_add_data_source_and_list() {
    // GIVEN a document with TEST (1) and SEARCH (2)
    let doc = base_document();

    // WHEN we add CUSTOMERS
    let doc = apply_ok(&doc, json!({"op": "addDataSource", "dataSource": "customers"}));

    // THEN the listing shows three data sources in insertion order
    let listed = run_query(
        &doc,
        &Query::ListViews {
            kind: EntityKind::DataSource,
            related: None,
            contains: None,
        },
    )
    .unwrap();
    let codes: Vec<_> = listed
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["dataSource"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(codes, vec!["TEST", "SEARCH", "CUSTOMERS"]);

    // AND the new record got id 3 with the documented defaults
    let added = &listed[2];
    assert_eq!(added["id"], 3);
    assert_eq!(added["description"], "CUSTOMERS");
    assert_eq!(added["retentionLevel"], "Remember");
    assert_eq!(added["conversational"], "No");
    assert_eq!(added["reliability"], 1);
}

#[test]
fn test_scenario_b_add_delete_then_get_not_found() {
    // GIVEN a document with CUSTOMERS added
    let doc = apply_ok(
        &base_document(),
        json!({"op": "addDataSource", "dataSource": "CUSTOMERS"}),
    );

    // WHEN it is deleted
    let doc = apply_ok(&doc, json!({"op": "deleteDataSource", "code": "customers"}));

    // THEN getting it reports not-found
    let result = run_query(
        &doc,
        &Query::GetEntity {
            kind: EntityKind::DataSource,
            key: EntityKey::code("CUSTOMERS"),
        },
    );
    assert!(matches!(
        result,
        Err(ConfigError::NotFound {
            kind: EntityKind::DataSource,
            ..
        })
    ));
}

#[test]
fn test_scenario_c_duplicate_add_is_rejected() {
    // GIVEN a document that already has TEST
    let doc = base_document();
    let before = doc.serialize().unwrap();

    // WHEN we add "test" again, differing only in case
    let result = try_apply(&doc, json!({"op": "addDataSource", "dataSource": "test"}));

    // THEN the add fails with duplicate-code
    assert!(matches!(
        result,
        Err(ConfigError::DuplicateCode { ref key, .. }) if key == "TEST"
    ));

    // AND the caller's document is byte-for-byte unchanged
    assert_eq!(doc.serialize().unwrap(), before);
}

#[test]
fn test_scenario_d_call_with_unknown_function() {
    // GIVEN a document with feature ALT_NAME but no function CMP_NOPE
    let doc = base_document();

    // WHEN a comparison call names CMP_NOPE
    let result = try_apply(
        &doc,
        json!({
            "op": "addComparisonCall",
            "feature": "ALT_NAME",
            "function": "CMP_NOPE",
            "elementList": ["FULL_NAME"]
        }),
    );

    // THEN it is an invalid reference to the comparison function registry
    assert!(matches!(
        result,
        Err(ConfigError::InvalidReference {
            target: EntityKind::ComparisonFunction,
            ..
        })
    ));

    // AND no call was written
    assert!(doc.records(EntityKind::ComparisonCall).is_empty());
}

#[test]
fn test_comparison_call_listed_by_feature() {
    // GIVEN a comparison call on ALT_NAME
    let doc = apply_ok(
        &base_document(),
        json!({
            "op": "addComparisonCall",
            "feature": "ALT_NAME",
            "function": "CMP_NAME",
            "elementList": ["FULL_NAME", "SUR_NAME"]
        }),
    );

    // WHEN listing calls related to ALT_NAME
    let listed = run_query(
        &doc,
        &serde_json::from_value(json!({
            "op": "listViews",
            "kind": "comparison_call",
            "related": {"kind": "feature", "key": "ALT_NAME"}
        }))
        .unwrap(),
    )
    .unwrap();

    // THEN the single call shows resolved codes and its two elements
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["feature"], "ALT_NAME");
    assert_eq!(listed[0]["function"], "CMP_NAME");
    assert_eq!(listed[0]["elementList"].as_array().unwrap().len(), 2);
}

#[test]
fn test_feature_add_creates_elements_and_calls() {
    // GIVEN the base document
    let doc = base_document();

    // WHEN adding a feature with a new element and a comparison function
    let doc = apply_ok(
        &doc,
        json!({
            "op": "addFeature",
            "feature": "NICKNAME",
            "class": "NAME",
            "behavior": "FM",
            "comparison": "CMP_NAME",
            "elementList": [
                {"element": "NICK", "compared": "Yes"},
                "SUR_NAME"
            ]
        }),
    );

    // THEN the missing element exists and the call carries one compared row
    let nick = run_query(
        &doc,
        &Query::GetEntity {
            kind: EntityKind::Element,
            key: EntityKey::code("NICK"),
        },
    )
    .unwrap();
    assert_eq!(nick["FELEM_ID"], 3);
    assert_eq!(doc.records(EntityKind::ComparisonCall).len(), 1);
    assert_eq!(doc.records(EntityKind::ComparisonCallElement).len(), 1);

    // AND the feature view reports the comparison function
    let feature = run_query(
        &doc,
        &Query::GetView {
            kind: EntityKind::Feature,
            key: EntityKey::code("NICKNAME"),
        },
    )
    .unwrap();
    assert_eq!(feature["comparison"], "CMP_NAME");
    assert_eq!(feature["behavior"], "FM");
}
