//! Text-in/text-out adapter
//!
//! Every entry point takes the current document text and returns the next
//! document (or a query payload) as text. Failure is `None`; the numeric
//! code and message go to the calling thread's last-error slot.
//!
//! Optional numbers use negative sentinels here and only here; the engine
//! below sees `Option`.

use crate::apply::apply;
use crate::commands::Command;
use crate::errors::{ConfigError, ExError, Result};
use crate::last_error::set_last_error;
use crate::model::Document;
use crate::ops::data_source_ops::AddDataSource;
use crate::policy::{DeletePolicy, RejectReferencedPolicy};
use crate::queries::{run_query, Query};
use crate::registry::EntityKey;
use g2config_core_types::EntityKind;

/// Negative means "not supplied"
pub fn optional_number(value: i64) -> Option<i64> {
    (value >= 0).then_some(value)
}

fn parse_request<T: serde::de::DeserializeOwned>(text: &str) -> Result<T> {
    serde_json::from_str(text).map_err(|e| ConfigError::MalformedRequest {
        reason: e.to_string(),
    })
}

/// Convert an engine result to boundary form, recording any failure
fn report(op: &str, result: Result<String>) -> Option<String> {
    match result {
        Ok(text) => Some(text),
        Err(err) => {
            set_last_error(&ExError::from(err).with_op(op));
            None
        }
    }
}

fn mutate(config_text: &str, cmd: Command, policy: &dyn DeletePolicy) -> Result<String> {
    let doc = Document::parse(config_text)?;
    apply(doc, cmd, policy)?.serialize()
}

fn read(config_text: &str, query: &Query) -> Result<String> {
    let doc = Document::parse(config_text)?;
    Ok(run_query(&doc, query)?.to_string())
}

/// Apply a JSON command under the default reject policy
///
/// ```
/// use g2config_core::boundary::execute;
///
/// let out = execute(r#"{"G2_CONFIG":{}}"#, r#"{"op":"addDataSource","dataSource":"TEST"}"#);
/// assert!(out.unwrap().contains("\"DSRC_CODE\":\"TEST\""));
/// ```
pub fn execute(config_text: &str, command_json: &str) -> Option<String> {
    execute_with_policy(config_text, command_json, &RejectReferencedPolicy)
}

pub fn execute_with_policy(
    config_text: &str,
    command_json: &str,
    policy: &dyn DeletePolicy,
) -> Option<String> {
    let result = parse_request::<Command>(command_json)
        .and_then(|cmd| mutate(config_text, cmd, policy));
    report("execute", result)
}

/// Run a JSON query and return its JSON payload
pub fn query(config_text: &str, query_json: &str) -> Option<String> {
    let result = parse_request::<Query>(query_json).and_then(|q| read(config_text, &q));
    report("query", result)
}

// ===== Data source shims =====

/// Add a data source; a negative `reliability` takes the default
pub fn add_data_source(
    config_text: &str,
    code: &str,
    description: Option<&str>,
    reliability: i64,
) -> Option<String> {
    let params = AddDataSource {
        description: description.map(str::to_string),
        reliability: optional_number(reliability),
        ..AddDataSource::new(code)
    };
    report(
        "add_data_source",
        mutate(config_text, Command::AddDataSource(params), &RejectReferencedPolicy),
    )
}

pub fn delete_data_source(config_text: &str, code: &str) -> Option<String> {
    let cmd = Command::DeleteDataSource {
        code: code.to_string(),
    };
    report(
        "delete_data_source",
        mutate(config_text, cmd, &RejectReferencedPolicy),
    )
}

/// Resolved listing of every data source, as a JSON array
pub fn list_data_sources(config_text: &str) -> Option<String> {
    let q = Query::ListViews {
        kind: EntityKind::DataSource,
        related: None,
        contains: None,
    };
    report("list_data_sources", read(config_text, &q))
}

/// Resolved view of one data source, by code
pub fn get_data_source(config_text: &str, code: &str) -> Option<String> {
    let q = Query::GetView {
        kind: EntityKind::DataSource,
        key: EntityKey::code(code),
    };
    report("get_data_source", read(config_text, &q))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::last_error::{clear_last_error, last_error_code};

    const EMPTY: &str = r#"{"G2_CONFIG":{}}"#;

    #[test]
    fn test_optional_number_sentinel() {
        assert_eq!(optional_number(-1), None);
        assert_eq!(optional_number(0), Some(0));
        assert_eq!(optional_number(7), Some(7));
    }

    #[test]
    fn test_malformed_command_sets_code_one() {
        clear_last_error();
        assert_eq!(execute(EMPTY, "{not json"), None);
        assert_eq!(last_error_code(), 1);
    }

    #[test]
    fn test_malformed_document_sets_code_one() {
        clear_last_error();
        assert_eq!(list_data_sources("[]"), None);
        assert_eq!(last_error_code(), 1);
    }

    #[test]
    fn test_shim_add_uses_defaults_for_sentinels() {
        let out = add_data_source(EMPTY, "test", None, -1).unwrap();
        let listed: serde_json::Value =
            serde_json::from_str(&list_data_sources(&out).unwrap()).unwrap();
        assert_eq!(listed[0]["dataSource"], "TEST");
        assert_eq!(listed[0]["reliability"], 1);
    }
}
