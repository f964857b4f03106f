//! Record lookup and filtered listing
//!
//! Results are copies of the stored records, in document (insertion) order.

use serde::Deserialize;
use serde_json::Value;

use crate::errors::{ConfigError, Result};
use crate::model::Document;
use crate::refgraph::{edges_from, points_at};
use crate::registry::{EntityKey, Registry};
use g2config_core_types::EntityKind;

/// Restrict a listing to records connected to one entity
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedFilter {
    pub kind: EntityKind,
    pub key: EntityKey,
}

/// Listing filter; both parts are optional and combine with AND
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListFilter {
    pub related: Option<RelatedFilter>,
    /// Case-insensitive substring of the record's JSON text
    pub contains: Option<String>,
}

impl ListFilter {
    pub fn related_to(kind: EntityKind, key: EntityKey) -> Self {
        Self {
            related: Some(RelatedFilter { kind, key }),
            contains: None,
        }
    }

    pub fn containing(text: impl Into<String>) -> Self {
        Self {
            related: None,
            contains: Some(text.into()),
        }
    }
}

/// Fetch one record
///
/// # Errors
///
/// Returns `NotFound` when `key` names no record.
pub fn get_entity(doc: &Document, kind: EntityKind, key: &EntityKey) -> Result<Value> {
    Registry::new(doc, kind).get(key).cloned()
}

/// Whether `record` (of `kind`) and `target` (of `related`) are linked by a
/// reference in either direction
fn linked(kind: EntityKind, record: &Value, related: EntityKind, target: &Value) -> bool {
    edges_from(kind)
        .filter(|e| e.to == related)
        .any(|e| points_at(e, record, target))
        || edges_from(related)
            .filter(|e| e.to == kind)
            .any(|e| points_at(e, target, record))
}

fn has_edge(kind: EntityKind, related: EntityKind) -> bool {
    edges_from(kind).any(|e| e.to == related) || edges_from(related).any(|e| e.to == kind)
}

pub(crate) fn text_matches(record: &Value, needle: &str) -> bool {
    record.to_string().to_lowercase().contains(&needle.to_lowercase())
}

/// List the records of a kind matching `filter`
///
/// # Errors
///
/// - `NotFound` when the related entity does not exist
/// - `InvalidField` when the two kinds are not connected by any reference
pub fn list_entities(doc: &Document, kind: EntityKind, filter: &ListFilter) -> Result<Vec<Value>> {
    let target = match &filter.related {
        Some(related) => {
            if !has_edge(kind, related.kind) {
                return Err(ConfigError::InvalidField {
                    field: "related".to_string(),
                    reason: format!("{} has no reference to or from {}", kind, related.kind),
                });
            }
            Some((related.kind, Registry::new(doc, related.kind).get(&related.key)?))
        }
        None => None,
    };
    let needle = filter.contains.as_deref().map(str::trim).filter(|s| !s.is_empty());

    Ok(doc
        .records(kind)
        .iter()
        .filter(|r| match target {
            Some((related, t)) => linked(kind, r, related, t),
            None => true,
        })
        .filter(|r| needle.map_or(true, |n| text_matches(r, n)))
        .cloned()
        .collect())
}
