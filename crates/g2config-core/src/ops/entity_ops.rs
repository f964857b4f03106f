//! Raw entity maintenance
//!
//! `setEntity` and `deleteEntity` address any writable kind by key, but the
//! fields a kind derives from other state stay under that kind's rules:
//! a fragment source still recomputes its dependencies, and the
//! feature/element sides of a call can only change through the call
//! commands. Coded values are translated the same way the typed commands
//! translate them.

use serde_json::{Map, Value};

use crate::errors::{ConfigError, Result};
use crate::model::record::{normalize_code, yes_no};
use crate::model::{descriptor, Document, FieldShape};
use crate::ops::attribute_ops::{attribute_class, requirement};
use crate::ops::engine::{self, DeleteReport};
use crate::ops::feature_ops::{self, FREQUENCIES};
use crate::ops::fragment_ops;
use crate::ops::patch::{Patch, Update};
use crate::policy::DeletePolicy;
use crate::registry::EntityKey;
use g2config_core_types::EntityKind;

/// Fields a kind keeps consistent itself and which cannot be written raw
pub(crate) fn kind_owned_fields(kind: EntityKind) -> &'static [&'static str] {
    match kind {
        EntityKind::Fragment => &["ERFRAG_DEPENDS"],
        EntityKind::StandardizeCall | EntityKind::ExpressionCall => &["FTYPE_ID", "FELEM_ID"],
        EntityKind::ComparisonCall | EntityKind::DistinctCall => &["FTYPE_ID"],
        _ => &[],
    }
}

/// Reject a write to a field listed by [`kind_owned_fields`]
pub(crate) fn check_writable(kind: EntityKind, field: &str) -> Result<()> {
    if kind_owned_fields(kind).contains(&field) {
        return Err(ConfigError::InvalidField {
            field: field.to_string(),
            reason: format!("maintained by the {} commands", kind),
        });
    }
    Ok(())
}

/// Translate a raw value into the form the typed commands store
pub(crate) fn normalize_field(kind: EntityKind, field: &str, value: &Value) -> Result<Value> {
    let Some(raw) = value.as_str() else {
        return Ok(value.clone());
    };
    let text = match (kind, field) {
        (EntityKind::Attribute, "ATTR_CLASS") => attribute_class(raw)?,
        (EntityKind::Attribute, "FELEM_REQ") => requirement(raw)?,
        (EntityKind::Attribute, "FTYPE_CODE" | "FELEM_CODE") => normalize_code(field, raw)?,
        (EntityKind::Feature, "FTYPE_FREQ") => {
            let frequency = raw.trim().to_uppercase();
            if !FREQUENCIES.contains(&frequency.as_str()) {
                return Err(ConfigError::InvalidField {
                    field: field.to_string(),
                    reason: format!("must be one of {}", FREQUENCIES.join(", ")),
                });
            }
            frequency
        }
        _ => match descriptor(kind).field(field).map(|s| s.shape) {
            Some(FieldShape::YesNo) => yes_no(field, raw)?.to_string(),
            _ => return Ok(value.clone()),
        },
    };
    Ok(Value::String(text))
}

/// Patch raw fields of one entity; `null` clears a field
///
/// # Errors
///
/// - `NotFound` when `key` names no record
/// - `InvalidField` for a field the kind maintains, or a value that does
///   not translate
/// - anything [`engine::update`] reports
pub fn set_entity(
    doc: &mut Document,
    kind: EntityKind,
    key: &EntityKey,
    fields: &Map<String, Value>,
) -> Result<()> {
    let mut patch = Patch::new();
    let mut source = Update::Unchanged;
    for (name, value) in fields {
        let name = name.trim().to_uppercase();
        check_writable(kind, &name)?;
        if kind == EntityKind::Fragment && name == "ERFRAG_SOURCE" {
            source = match value {
                Value::Null => Update::Clear,
                Value::String(s) => Update::Set(s.clone()),
                other => {
                    return Err(ConfigError::InvalidField {
                        field: name,
                        reason: format!("expected Str, got {}", other),
                    })
                }
            };
            continue;
        }
        patch = match value {
            Value::Null => patch.clear(name),
            value => {
                let value = normalize_field(kind, &name, value)?;
                patch.set(name, value)
            }
        };
    }
    if kind == EntityKind::Fragment {
        patch = fragment_ops::with_source(doc, key, patch, source)?;
    }
    engine::update(doc, kind, key, &patch)
}

/// Delete one entity by key, honoring the kind's own delete rules
///
/// # Errors
///
/// Returns `UnsupportedOperation` for a locked feature, otherwise anything
/// [`engine::delete`] reports.
pub fn delete_entity(
    doc: &mut Document,
    kind: EntityKind,
    key: &EntityKey,
    policy: &dyn DeletePolicy,
) -> Result<DeleteReport> {
    match kind {
        EntityKind::Feature => feature_ops::delete_feature(doc, key, policy),
        _ => engine::delete(doc, kind, key, policy),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::RejectReferencedPolicy;
    use serde_json::json;

    fn doc() -> Document {
        Document::from_value(json!({"G2_CONFIG": {
            "CFG_FCLASS": [{"FCLASS_ID": 1, "FCLASS_CODE": "OTHER"}],
            "CFG_FTYPE": [
                {"FTYPE_ID": 1, "FTYPE_CODE": "NAME", "FCLASS_ID": 1, "FTYPE_FREQ": "NAME"},
                {"FTYPE_ID": 2, "FTYPE_CODE": "COLOR", "FCLASS_ID": 1, "FTYPE_FREQ": "FM",
                 "FTYPE_EXCL": "No", "FTYPE_STAB": "No"}
            ],
            "CFG_FELEM": [{"FELEM_ID": 1, "FELEM_CODE": "COLOR"}],
            "CFG_ATTR": [
                {"ATTR_ID": 1, "ATTR_CODE": "COLOR", "ATTR_CLASS": "OTHER",
                 "FTYPE_CODE": "COLOR", "FELEM_CODE": "COLOR", "FELEM_REQ": "Yes"}
            ],
            "CFG_ERFRAG": [
                {"ERFRAG_ID": 1, "ERFRAG_CODE": "BASE", "ERFRAG_SOURCE": "./SCORES/NAME[./FULL_SCORE>90]",
                 "ERFRAG_DEPENDS": null},
                {"ERFRAG_ID": 2, "ERFRAG_CODE": "OUTER", "ERFRAG_SOURCE": "./SCORES/DOB[./FULL_SCORE>90]",
                 "ERFRAG_DEPENDS": null}
            ]
        }}))
        .unwrap()
    }

    fn fields(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[test]
    fn test_fragment_source_recomputes_dependencies() {
        // GIVEN two independent fragments
        let mut doc = doc();

        // WHEN the outer source is set raw to embed the base fragment
        set_entity(
            &mut doc,
            EntityKind::Fragment,
            &EntityKey::code("OUTER"),
            &fields(json!({"erfrag_source": "./FRAGMENT[./BASE>0]"})),
        )
        .unwrap();

        // THEN the dependency list follows, and the base cannot embed it back
        assert_eq!(doc.records(EntityKind::Fragment)[1]["ERFRAG_DEPENDS"], "1");
        let result = set_entity(
            &mut doc,
            EntityKind::Fragment,
            &EntityKey::code("BASE"),
            &fields(json!({"ERFRAG_SOURCE": "./FRAGMENT[./OUTER>0]"})),
        );
        assert!(matches!(result, Err(ConfigError::InvalidField { .. })));
    }

    #[test]
    fn test_kind_owned_fields_are_rejected() {
        let mut doc = doc();
        let result = set_entity(
            &mut doc,
            EntityKind::Fragment,
            &EntityKey::code("OUTER"),
            &fields(json!({"ERFRAG_DEPENDS": "1"})),
        );
        assert!(matches!(
            result,
            Err(ConfigError::InvalidField { ref field, .. }) if field == "ERFRAG_DEPENDS"
        ));
        assert!(check_writable(EntityKind::ComparisonCall, "FTYPE_ID").is_err());
        assert!(check_writable(EntityKind::StandardizeCall, "FELEM_ID").is_err());
        assert!(check_writable(EntityKind::StandardizeCall, "SFUNC_ID").is_ok());
    }

    #[test]
    fn test_values_are_translated() {
        // GIVEN an attribute and a feature
        let mut doc = doc();

        // WHEN coded fields are written in loose form
        set_entity(
            &mut doc,
            EntityKind::Attribute,
            &EntityKey::code("COLOR"),
            &fields(json!({"ATTR_CLASS": "other", "FELEM_REQ": "desired"})),
        )
        .unwrap();
        set_entity(
            &mut doc,
            EntityKind::Feature,
            &EntityKey::code("COLOR"),
            &fields(json!({"FTYPE_FREQ": "f1", "FTYPE_EXCL": "yes"})),
        )
        .unwrap();

        // THEN they are stored the way the typed commands store them
        let attr = &doc.records(EntityKind::Attribute)[0];
        assert_eq!(attr["ATTR_CLASS"], "OTHER");
        assert_eq!(attr["FELEM_REQ"], "Desired");
        let feature = &doc.records(EntityKind::Feature)[1];
        assert_eq!(feature["FTYPE_FREQ"], "F1");
        assert_eq!(feature["FTYPE_EXCL"], "Yes");

        let result = set_entity(
            &mut doc,
            EntityKind::Feature,
            &EntityKey::code("COLOR"),
            &fields(json!({"FTYPE_FREQ": "SOMETIMES"})),
        );
        assert!(matches!(result, Err(ConfigError::InvalidField { .. })));
    }

    #[test]
    fn test_dangling_attribute_reference_is_rejected() {
        let mut doc = doc();
        let result = set_entity(
            &mut doc,
            EntityKind::Attribute,
            &EntityKey::code("COLOR"),
            &fields(json!({"FTYPE_CODE": "bogus"})),
        );
        assert!(matches!(result, Err(ConfigError::InvalidReference { .. })));
        assert_eq!(doc.records(EntityKind::Attribute)[0]["FTYPE_CODE"], "COLOR");
    }

    #[test]
    fn test_delete_entity_keeps_locked_features() {
        let mut doc = doc();
        assert!(matches!(
            delete_entity(&mut doc, EntityKind::Feature, &EntityKey::code("NAME"), &RejectReferencedPolicy),
            Err(ConfigError::UnsupportedOperation { kind: EntityKind::Feature, .. })
        ));
        doc.records_mut(EntityKind::Attribute).unwrap().clear();
        delete_entity(&mut doc, EntityKind::Feature, &EntityKey::code("COLOR"), &RejectReferencedPolicy).unwrap();
        assert_eq!(doc.records(EntityKind::Feature).len(), 1);
    }
}
