#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{base_document, command};
use g2config_core::errors::ConfigError;
use g2config_core::logging_facility::test_capture::init_test_capture;
use g2config_core::{apply, log_op_end, log_op_error, log_op_start, run_query, Query};
use g2config_core::RejectReferencedPolicy;
use g2config_core_types::schema::{EVENT_END, EVENT_END_ERROR, EVENT_START};
use g2config_core_types::EntityKind;
use serde_json::json;

#[test]
fn test_log_op_start_macro() {
    let capture = init_test_capture();
    let op_name = "test_log_op_start_unique_1";

    log_op_start!(op_name);

    capture.assert_event_exists(op_name, EVENT_START);
}

#[test]
fn test_log_op_end_records_duration() {
    let capture = init_test_capture();
    let op_name = "test_log_op_end_unique_2";

    log_op_end!(op_name, duration_ms = 42);

    capture.assert_event_field(op_name, EVENT_END, "duration_ms", "42");
}

#[test]
fn test_log_op_error_includes_codes() {
    let capture = init_test_capture();
    let op_name = "test_log_op_error_unique_3";

    let err = ConfigError::NotFound {
        kind: EntityKind::Rule,
        key: "SF1".to_string(),
    };
    log_op_error!(op_name, err, duration_ms = 10);

    capture.assert_event_field(op_name, EVENT_END_ERROR, "err_code", "ERR_NOT_FOUND");
    capture.assert_event_field(op_name, EVENT_END_ERROR, "err_numeric", "3");
}

#[test]
fn test_apply_logs_start_and_end() {
    let capture = init_test_capture();

    apply(
        base_document(),
        command(json!({"op": "addPlan", "plan": "LOGGED_PLAN"})),
        &RejectReferencedPolicy,
    )
    .unwrap();

    capture.assert_event_exists("add_plan", EVENT_START);
    capture.assert_event_exists("add_plan", EVENT_END);
}

#[test]
fn test_failed_apply_logs_error_kind() {
    let capture = init_test_capture();

    let result = apply(
        base_document(),
        command(json!({"op": "deleteRule", "code": "NO_SUCH_RULE"})),
        &RejectReferencedPolicy,
    );
    assert!(result.is_err());

    capture.assert_event_field("delete_rule", EVENT_END_ERROR, "err_code", "ERR_NOT_FOUND");
    capture.assert_event_field("delete_rule", EVENT_END_ERROR, "entity_kind", "rule");
}

#[test]
fn test_run_query_logs_result_len() {
    let capture = init_test_capture();

    run_query(&base_document(), &Query::ListSections).unwrap();

    let ends = capture.count_events(|e| {
        e.op.as_deref() == Some("list_sections")
            && e.event.as_deref() == Some(EVENT_END)
            && e.field("result_len").is_some()
    });
    assert!(ends >= 1);
}
