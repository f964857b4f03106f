//! Query engine
//!
//! Pure reads over a document. `run_query` is the tagged-JSON entry point
//! used by the boundary adapter and the CLI; the functions in the
//! submodules are the typed API.

pub mod entity_queries;
pub mod section_queries;
pub mod views;

pub use entity_queries::{get_entity, list_entities, ListFilter, RelatedFilter};
pub use section_queries::{get_section, list_sections};
pub use views::{list_views, view};

use serde::Deserialize;
use serde_json::{json, Value};

use crate::errors::Result;
use crate::model::Document;
use crate::ops::hash_ops::{hash_values, HashList};
use crate::ops::system_ops;
use crate::registry::EntityKey;
use crate::{log_op_end, log_op_error, log_op_start};
use g2config_core_types::EntityKind;

/// A read request, as accepted on the text boundary
///
/// ```
/// use g2config_core::queries::Query;
///
/// let q: Query = serde_json::from_str(r#"{"op":"listEntities","kind":"data_source"}"#).unwrap();
/// assert_eq!(q.name(), "list_entities");
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Query {
    GetEntity {
        kind: EntityKind,
        key: EntityKey,
    },
    ListEntities {
        kind: EntityKind,
        #[serde(default)]
        related: Option<RelatedFilter>,
        #[serde(default)]
        contains: Option<String>,
    },
    /// Resolved view of one entity
    GetView {
        kind: EntityKind,
        key: EntityKey,
    },
    ListViews {
        kind: EntityKind,
        #[serde(default)]
        related: Option<RelatedFilter>,
        #[serde(default)]
        contains: Option<String>,
    },
    GetSection {
        section: String,
        #[serde(default)]
        contains: Option<String>,
    },
    ListSections,
    SystemParameters,
    Version,
    CompatibilityVersion,
    VerifyCompatibilityVersion {
        expected: String,
    },
    HashValues {
        list: HashList,
    },
}

impl Query {
    /// Operation name used in log events
    pub fn name(&self) -> &'static str {
        match self {
            Query::GetEntity { .. } => "get_entity",
            Query::ListEntities { .. } => "list_entities",
            Query::GetView { .. } => "get_view",
            Query::ListViews { .. } => "list_views",
            Query::GetSection { .. } => "get_section",
            Query::ListSections => "list_sections",
            Query::SystemParameters => "system_parameters",
            Query::Version => "version",
            Query::CompatibilityVersion => "compatibility_version",
            Query::VerifyCompatibilityVersion { .. } => "verify_compatibility_version",
            Query::HashValues { .. } => "hash_values",
        }
    }
}

fn filter(related: &Option<RelatedFilter>, contains: &Option<String>) -> ListFilter {
    ListFilter {
        related: related.clone(),
        contains: contains.clone(),
    }
}

fn execute(doc: &Document, query: &Query) -> Result<Value> {
    Ok(match query {
        Query::GetEntity { kind, key } => get_entity(doc, *kind, key)?,
        Query::ListEntities {
            kind,
            related,
            contains,
        } => Value::Array(list_entities(doc, *kind, &filter(related, contains))?),
        Query::GetView { kind, key } => view(doc, *kind, &get_entity(doc, *kind, key)?)?,
        Query::ListViews {
            kind,
            related,
            contains,
        } => Value::Array(list_views(doc, *kind, &filter(related, contains))?),
        Query::GetSection { section, contains } => {
            Value::Array(get_section(doc, section, contains.as_deref())?)
        }
        Query::ListSections => json!(list_sections(doc)),
        Query::SystemParameters => json!(system_ops::system_parameters(doc)),
        Query::Version => json!({ "version": system_ops::version(doc)? }),
        Query::CompatibilityVersion => {
            json!({ "compatibilityVersion": system_ops::compatibility_version(doc)? })
        }
        Query::VerifyCompatibilityVersion { expected } => {
            serde_json::to_value(system_ops::verify_compatibility_version(doc, expected)?)?
        }
        Query::HashValues { list } => json!(hash_values(doc, *list)),
    })
}

/// Run a query, logging start and outcome
///
/// # Errors
///
/// Whatever the underlying read reports: `NotFound` for a missing entity,
/// `SectionNotFound` for a missing section, `InvalidField` for a related
/// filter between unconnected kinds.
pub fn run_query(doc: &Document, query: &Query) -> Result<Value> {
    let op = query.name();
    log_op_start!(op);
    let start = std::time::Instant::now();

    let result = execute(doc, query).map_err(|e| {
        log_op_error!(op, e.clone(), duration_ms = start.elapsed().as_millis() as u64);
        e
    })?;

    let result_len = result.as_array().map_or(1, Vec::len);
    log_op_end!(
        op,
        duration_ms = start.elapsed().as_millis() as u64,
        result_len = result_len
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ConfigError;

    fn doc() -> Document {
        Document::parse(
            r#"{"G2_CONFIG":{"CFG_DSRC":[
                {"DSRC_ID":1,"DSRC_CODE":"TEST","DSRC_DESC":"Test","DSRC_RELY":1,
                 "RETENTION_LEVEL":"Remember","CONVERSATIONAL":"No"}
            ]}}"#,
        )
        .unwrap()
    }

    #[test]
    fn test_query_deserializes_tagged() {
        let q: Query = serde_json::from_str(
            r#"{"op":"getEntity","kind":"data_source","key":"test"}"#,
        )
        .unwrap();
        assert_eq!(
            q,
            Query::GetEntity {
                kind: EntityKind::DataSource,
                key: EntityKey::code("test"),
            }
        );
    }

    #[test]
    fn test_run_list_entities() {
        let q = Query::ListEntities {
            kind: EntityKind::DataSource,
            related: None,
            contains: None,
        };
        let result = run_query(&doc(), &q).unwrap();
        assert_eq!(result.as_array().map(Vec::len), Some(1));
    }

    #[test]
    fn test_run_get_view_resolves_code() {
        let q = Query::GetView {
            kind: EntityKind::DataSource,
            key: EntityKey::code("TEST"),
        };
        let result = run_query(&doc(), &q).unwrap();
        assert_eq!(result["dataSource"], "TEST");
    }

    #[test]
    fn test_run_get_missing_entity() {
        let q = Query::GetEntity {
            kind: EntityKind::DataSource,
            key: EntityKey::code("NOPE"),
        };
        assert!(matches!(
            run_query(&doc(), &q),
            Err(ConfigError::NotFound { .. })
        ));
    }

    #[test]
    fn test_run_list_sections() {
        let result = run_query(&doc(), &Query::ListSections).unwrap();
        assert_eq!(result, json!(["CFG_DSRC"]));
    }
}
