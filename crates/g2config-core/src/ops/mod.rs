//! Mutation engine
//!
//! `engine` holds the descriptor-driven insert/update/delete; the remaining
//! modules translate typed parameters for each entity kind into records and
//! patches.

pub mod attribute_ops;
pub mod behavior_override_ops;
pub mod call_ops;
pub mod data_source_ops;
pub mod element_ops;
pub mod engine;
pub mod entity_ops;
pub mod feature_ops;
pub mod fragment_ops;
pub mod function_ops;
pub mod hash_ops;
pub mod patch;
pub mod plan_ops;
pub mod rule_ops;
pub mod section_ops;
pub mod system_ops;
pub mod threshold_ops;

pub use engine::DeleteReport;
pub use patch::{FieldUpdate, Patch, Update};

use serde_json::{Map, Value};

use crate::errors::{ConfigError, Result};
use crate::registry::{EntityKey, Registry};
use crate::model::Document;
use g2config_core_types::EntityKind;

/// Wildcard feature code meaning "every feature"
pub const ALL_FEATURES: &str = "ALL";
/// Wildcard element code meaning "no element"
pub const NO_ELEMENT: &str = "N/A";

/// Turn a `json!` object literal into a record map
pub(crate) fn record(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Id of a referenced entity, reporting an unknown target as an invalid
/// reference from `from.field`
pub(crate) fn reference_id(
    doc: &Document,
    from: EntityKind,
    field: &str,
    to: EntityKind,
    key: &EntityKey,
) -> Result<i64> {
    let registry = Registry::new(doc, to);
    let id_field = registry.descriptor().id_field;
    registry
        .position(key)
        .and_then(|i| id_field.and_then(|f| registry.records()[i].get(f)))
        .and_then(Value::as_i64)
        .ok_or_else(|| ConfigError::InvalidReference {
            kind: from,
            field: field.to_string(),
            target: to,
            value: key.to_string(),
        })
}

/// Id of an existing entity, reporting an unknown target as not found
pub(crate) fn lookup_id(doc: &Document, kind: EntityKind, key: &EntityKey) -> Result<i64> {
    let registry = Registry::new(doc, kind);
    let id_field = registry.descriptor().id_field;
    let index = registry.find(key)?;
    id_field
        .and_then(|f| registry.records()[index].get(f))
        .and_then(Value::as_i64)
        .ok_or_else(|| ConfigError::NotFound {
            kind,
            key: key.to_string(),
        })
}

/// Resolve an optional feature code where absent or "ALL" means `wildcard`
pub(crate) fn feature_or_wildcard(
    doc: &Document,
    from: EntityKind,
    field: &str,
    feature: Option<&str>,
    wildcard: i64,
) -> Result<i64> {
    match feature.map(str::trim) {
        None => Ok(wildcard),
        Some(code) if code.is_empty() || code.eq_ignore_ascii_case(ALL_FEATURES) => Ok(wildcard),
        Some(code) => reference_id(doc, from, field, EntityKind::Feature, &EntityKey::code(code)),
    }
}

/// Resolve a feature for lookups, where absent or "ALL" means `wildcard`
pub(crate) fn existing_feature_or_wildcard(
    doc: &Document,
    feature: Option<&str>,
    wildcard: i64,
) -> Result<i64> {
    match feature.map(str::trim) {
        None => Ok(wildcard),
        Some(code) if code.is_empty() || code.eq_ignore_ascii_case(ALL_FEATURES) => Ok(wildcard),
        Some(code) => lookup_id(doc, EntityKind::Feature, &EntityKey::code(code)),
    }
}

/// Run a multi-step mutation on a working copy, committing only on success
pub(crate) fn atomically<T>(
    doc: &mut Document,
    f: impl FnOnce(&mut Document) -> Result<T>,
) -> Result<T> {
    let mut work = doc.clone();
    let out = f(&mut work)?;
    *doc = work;
    Ok(out)
}
