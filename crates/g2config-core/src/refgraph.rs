//! Reference graph between entity kinds
//!
//! A static edge table records which field of which kind points at which
//! other kind, and whether it points by code, by id or by a comma-separated
//! id list. Edges are either **owned** (the referencing record is part of
//! its target and goes away with it) or **associations** (handled by the
//! delete policy).
//!
//! Non-positive ids, null and empty strings mean "unset" and never need to
//! resolve. This covers the `-1` and `0` wildcard conventions used for
//! "ALL" features, "N/A" elements and the "PARENT" feature of expression
//! call elements.

use serde_json::Value;

use crate::errors::{ConfigError, Result};
use crate::model::descriptor;
use crate::model::record::get_i64;
use crate::model::Document;
use crate::registry::Registry;
use g2config_core_types::EntityKind;

/// How a reference field names its target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKey {
    Code,
    Id,
    /// Comma-separated ids held in a string
    IdList,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    /// Referencing record is removed together with its target
    Owned,
    /// Referencing record is independent; delete policy decides
    Association,
}

#[derive(Debug, Clone, Copy)]
pub struct ReferenceEdge {
    pub from: EntityKind,
    pub field: &'static str,
    pub to: EntityKind,
    pub key: RefKey,
    pub ownership: Ownership,
    /// Field may be cleared when its target is deleted
    pub nullable: bool,
}

const fn owned(from: EntityKind, field: &'static str, to: EntityKind) -> ReferenceEdge {
    ReferenceEdge {
        from,
        field,
        to,
        key: RefKey::Id,
        ownership: Ownership::Owned,
        nullable: false,
    }
}

const fn assoc(
    from: EntityKind,
    field: &'static str,
    to: EntityKind,
    key: RefKey,
    nullable: bool,
) -> ReferenceEdge {
    ReferenceEdge {
        from,
        field,
        to,
        key,
        ownership: Ownership::Association,
        nullable,
    }
}

use EntityKind as K;

pub static REFERENCE_GRAPH: &[ReferenceEdge] = &[
    // Bill-of-material rows and calls belong to their feature
    owned(K::FeatureElement, "FTYPE_ID", K::Feature),
    owned(K::StandardizeCall, "FTYPE_ID", K::Feature),
    owned(K::ExpressionCall, "FTYPE_ID", K::Feature),
    owned(K::ComparisonCall, "FTYPE_ID", K::Feature),
    owned(K::DistinctCall, "FTYPE_ID", K::Feature),
    owned(K::BehaviorOverride, "FTYPE_ID", K::Feature),
    // Call element rows belong to their call
    owned(K::ExpressionCallElement, "EFCALL_ID", K::ExpressionCall),
    owned(K::ComparisonCallElement, "CFCALL_ID", K::ComparisonCall),
    owned(K::DistinctCallElement, "DFCALL_ID", K::DistinctCall),
    // Thresholds belong to their plan
    owned(K::GenericThreshold, "GPLAN_ID", K::GenericPlan),
    // Associations
    assoc(K::Attribute, "FTYPE_CODE", K::Feature, RefKey::Code, true),
    assoc(K::Attribute, "FELEM_CODE", K::Element, RefKey::Code, true),
    assoc(K::Feature, "FCLASS_ID", K::FeatureClass, RefKey::Id, false),
    assoc(K::FeatureElement, "FELEM_ID", K::Element, RefKey::Id, false),
    assoc(K::StandardizeCall, "FELEM_ID", K::Element, RefKey::Id, false),
    assoc(K::StandardizeCall, "SFUNC_ID", K::StandardizeFunction, RefKey::Id, false),
    assoc(K::ExpressionCall, "FELEM_ID", K::Element, RefKey::Id, false),
    assoc(K::ExpressionCall, "EFUNC_ID", K::ExpressionFunction, RefKey::Id, false),
    assoc(K::ExpressionCall, "EFEAT_FTYPE_ID", K::Feature, RefKey::Id, true),
    assoc(K::ComparisonCall, "CFUNC_ID", K::ComparisonFunction, RefKey::Id, false),
    assoc(K::DistinctCall, "DFUNC_ID", K::DistinctFunction, RefKey::Id, false),
    assoc(K::ExpressionCallElement, "FTYPE_ID", K::Feature, RefKey::Id, false),
    assoc(K::ExpressionCallElement, "FELEM_ID", K::Element, RefKey::Id, false),
    assoc(K::ComparisonCallElement, "FTYPE_ID", K::Feature, RefKey::Id, false),
    assoc(K::ComparisonCallElement, "FELEM_ID", K::Element, RefKey::Id, false),
    assoc(K::DistinctCallElement, "FTYPE_ID", K::Feature, RefKey::Id, false),
    assoc(K::DistinctCallElement, "FELEM_ID", K::Element, RefKey::Id, false),
    assoc(K::ComparisonThreshold, "CFUNC_ID", K::ComparisonFunction, RefKey::Id, false),
    assoc(K::ComparisonThreshold, "FTYPE_ID", K::Feature, RefKey::Id, false),
    assoc(K::GenericThreshold, "FTYPE_ID", K::Feature, RefKey::Id, false),
    assoc(K::Rule, "QUAL_ERFRAG_CODE", K::Fragment, RefKey::Code, true),
    assoc(K::Rule, "DISQ_ERFRAG_CODE", K::Fragment, RefKey::Code, true),
    assoc(K::Fragment, "ERFRAG_DEPENDS", K::Fragment, RefKey::IdList, false),
];

/// Edges leaving records of `kind`
pub fn edges_from(kind: EntityKind) -> impl Iterator<Item = &'static ReferenceEdge> {
    REFERENCE_GRAPH.iter().filter(move |e| e.from == kind)
}

/// Edges pointing at records of `kind`
pub fn edges_to(kind: EntityKind) -> impl Iterator<Item = &'static ReferenceEdge> {
    REFERENCE_GRAPH.iter().filter(move |e| e.to == kind)
}

/// True when a reference value means "no reference"
pub fn is_unset(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(Value::Number(n)) => n.as_i64().is_some_and(|i| i <= 0),
        Some(_) => false,
    }
}

/// Parse a comma-separated id list such as `"3,7"`
pub fn parse_id_list(raw: &str) -> Vec<i64> {
    raw.split(',')
        .filter_map(|part| part.trim().parse::<i64>().ok())
        .collect()
}

/// Does `record`'s edge field point at `target`?
pub fn points_at(edge: &ReferenceEdge, record: &Value, target: &Value) -> bool {
    let value = record.get(edge.field);
    if is_unset(value) {
        return false;
    }
    let target_desc = descriptor(edge.to);
    match edge.key {
        RefKey::Code => {
            let (Some(code_field), Some(Value::String(code))) = (target_desc.code_field, value)
            else {
                return false;
            };
            target
                .get(code_field)
                .and_then(Value::as_str)
                .is_some_and(|t| t.eq_ignore_ascii_case(code.trim()))
        }
        RefKey::Id => {
            let Some(id_field) = target_desc.id_field else {
                return false;
            };
            value.and_then(Value::as_i64).is_some()
                && value.and_then(Value::as_i64) == get_i64(target, id_field)
        }
        RefKey::IdList => {
            let (Some(id_field), Some(Value::String(list))) = (target_desc.id_field, value) else {
                return false;
            };
            get_i64(target, id_field).is_some_and(|id| parse_id_list(list).contains(&id))
        }
    }
}

/// Check that every populated reference of `record` resolves
///
/// # Errors
///
/// Returns `InvalidReference` naming the first field that does not resolve.
pub fn validate_references(doc: &Document, kind: EntityKind, record: &Value) -> Result<()> {
    for edge in edges_from(kind) {
        let value = record.get(edge.field);
        if is_unset(value) {
            continue;
        }
        let target = Registry::new(doc, edge.to);
        let invalid = |shown: String| ConfigError::InvalidReference {
            kind,
            field: edge.field.to_string(),
            target: edge.to,
            value: shown,
        };
        match (edge.key, value) {
            (RefKey::Code, Some(Value::String(code))) => {
                if !target.exists_by_code(code) {
                    return Err(invalid(code.clone()));
                }
            }
            (RefKey::Id, Some(v)) => match v.as_i64() {
                Some(id) if target.exists_by_id(id) => {}
                _ => return Err(invalid(v.to_string())),
            },
            (RefKey::IdList, Some(Value::String(list))) => {
                if let Some(missing) = parse_id_list(list)
                    .into_iter()
                    .find(|id| !target.exists_by_id(*id))
                {
                    return Err(invalid(missing.to_string()));
                }
            }
            (_, Some(other)) => return Err(invalid(other.to_string())),
            (_, None) => {}
        }
    }
    Ok(())
}

/// Value written into a nullable reference field when its target goes away
pub fn cleared_value(edge: &ReferenceEdge, current: Option<&Value>, removed_id: Option<i64>) -> Value {
    match edge.key {
        RefKey::Code => Value::Null,
        RefKey::Id => Value::from(-1),
        RefKey::IdList => {
            let remaining: Vec<String> = current
                .and_then(Value::as_str)
                .map(parse_id_list)
                .unwrap_or_default()
                .into_iter()
                .filter(|id| Some(*id) != removed_id)
                .map(|id| id.to_string())
                .collect();
            if remaining.is_empty() {
                Value::Null
            } else {
                Value::from(remaining.join(","))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_every_edge_field_is_described() {
        for edge in REFERENCE_GRAPH {
            let d = descriptor(edge.from);
            assert!(
                d.field(edge.field).is_some(),
                "{}.{} is not a known field",
                edge.from,
                edge.field
            );
        }
    }

    #[test]
    fn test_unset_conventions() {
        assert!(is_unset(None));
        assert!(is_unset(Some(&json!(null))));
        assert!(is_unset(Some(&json!(-1))));
        assert!(is_unset(Some(&json!(0))));
        assert!(is_unset(Some(&json!(""))));
        assert!(!is_unset(Some(&json!(1))));
        assert!(!is_unset(Some(&json!("NAME"))));
    }

    #[test]
    fn test_points_at_by_code_and_id_list() {
        let attr_edge = edges_from(K::Attribute)
            .find(|e| e.field == "FTYPE_CODE")
            .unwrap();
        let feature = json!({"FTYPE_ID": 3, "FTYPE_CODE": "NAME"});
        assert!(points_at(attr_edge, &json!({"FTYPE_CODE": "name"}), &feature));
        assert!(!points_at(attr_edge, &json!({"FTYPE_CODE": "ADDRESS"}), &feature));

        let dep_edge = edges_from(K::Fragment).next().unwrap();
        let frag = json!({"ERFRAG_ID": 7, "ERFRAG_CODE": "SAME_NAME"});
        assert!(points_at(dep_edge, &json!({"ERFRAG_DEPENDS": "3,7"}), &frag));
        assert!(!points_at(dep_edge, &json!({"ERFRAG_DEPENDS": null}), &frag));
    }

    #[test]
    fn test_cleared_id_list_drops_only_removed_id() {
        let edge = edges_from(K::Fragment).next().unwrap();
        let cleared = cleared_value(edge, Some(&json!("3,7")), Some(7));
        assert_eq!(cleared, json!("3"));
        assert_eq!(cleared_value(edge, Some(&json!("7")), Some(7)), Value::Null);
    }
}
