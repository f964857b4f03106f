//! Raw section maintenance
//!
//! Sections are the top-level members of `G2_CONFIG`. These operations work
//! below the entity layer but keep the document valid: entity sections stay
//! arrays of records, identity fields and kind-maintained fields are never
//! written, known fields keep their shape, and the rewritten section must
//! still satisfy its references and uniqueness constraints.

use serde_json::Value;

use crate::errors::{ConfigError, Result};
use crate::model::{descriptor, Document, WATERMARK_SECTION};
use crate::ops::engine;
use crate::ops::entity_ops::{check_writable, normalize_field};
use g2config_core_types::EntityKind;

/// Entity kind stored in a section, if the section is a known one
pub fn section_kind(section: &str) -> Option<EntityKind> {
    EntityKind::ALL
        .iter()
        .copied()
        .find(|k| k.section().eq_ignore_ascii_case(section.trim()))
}

fn section_name(raw: &str) -> Result<String> {
    let name = raw.trim().to_uppercase();
    if name.is_empty() {
        return Err(ConfigError::MissingField {
            field: "section".to_string(),
        });
    }
    Ok(name)
}

/// Add an empty section
///
/// # Errors
///
/// Returns `DuplicateSection` when the section exists.
pub fn add_section(doc: &mut Document, section: &str) -> Result<()> {
    let name = section_name(section)?;
    let config = doc.config_mut();
    if config.contains_key(&name) {
        return Err(ConfigError::DuplicateSection { section: name });
    }
    config.insert(name, Value::Array(Vec::new()));
    Ok(())
}

/// Remove a section
///
/// An entity section can only be removed while it holds no records, and the
/// id high-water marks can never be removed.
///
/// # Errors
///
/// Returns `SectionNotFound`, or `UnsupportedOperation` for a non-empty
/// entity section.
pub fn remove_section(doc: &mut Document, section: &str) -> Result<()> {
    let name = section_name(section)?;
    if !doc.config().contains_key(&name) {
        return Err(ConfigError::SectionNotFound { section: name });
    }
    if name == WATERMARK_SECTION {
        return Err(ConfigError::InvalidField {
            field: "section".to_string(),
            reason: format!("{} is maintained by the engine", name),
        });
    }
    if let Some(kind) = section_kind(&name) {
        if !doc.records(kind).is_empty() {
            return Err(ConfigError::UnsupportedOperation {
                kind,
                operation: "remove non-empty section".to_string(),
            });
        }
    }
    doc.config_mut().remove(&name);
    Ok(())
}

fn section_records(doc: &Document, name: &str) -> Result<Vec<Value>> {
    match doc.config().get(name) {
        Some(Value::Array(records)) => Ok(records.clone()),
        Some(_) => Err(ConfigError::InvalidSection {
            section: name.to_string(),
        }),
        None => Err(ConfigError::SectionNotFound {
            section: name.to_string(),
        }),
    }
}

fn check_field(kind: EntityKind, field: &str, value: Option<&Value>) -> Result<()> {
    let desc = descriptor(kind);
    if desc.is_immutable(field) {
        return Err(ConfigError::ImmutableField {
            kind,
            field: field.to_string(),
        });
    }
    check_writable(kind, field)?;
    if let (Some(spec), Some(value)) = (desc.field(field), value) {
        let ok = if value.is_null() {
            spec.nullable
        } else {
            spec.shape.accepts(value)
        };
        if !ok {
            return Err(ConfigError::InvalidField {
                field: field.to_string(),
                reason: format!("expected {:?}, got {}", spec.shape, value),
            });
        }
    }
    Ok(())
}

/// Validate the rewritten records of an entity section, then store them
fn replace_section(doc: &mut Document, name: &str, records: Vec<Value>) -> Result<()> {
    if let Some(kind) = section_kind(name) {
        engine::validate_collection(doc, kind, &records)?;
    }
    doc.config_mut().insert(name.to_string(), Value::Array(records));
    Ok(())
}

/// Set `field` to `value` on every record of a section, returning how many
/// records changed
///
/// Nothing is written unless every rewritten record is valid.
///
/// # Errors
///
/// - `SectionNotFound` or `InvalidSection` when the section is absent or not an array
/// - `ImmutableField` when the field is an identity field of the section's kind
/// - `InvalidField` when the value does not fit a known field, or the kind
///   maintains the field itself
/// - `InvalidReference` when the value leaves a dangling reference
/// - `DuplicateCode` when the value makes records clash
pub fn add_section_field(doc: &mut Document, section: &str, field: &str, value: Value) -> Result<usize> {
    let name = section_name(section)?;
    let field = field.trim().to_uppercase();
    let value = match section_kind(&name) {
        Some(kind) => {
            check_field(kind, &field, Some(&value))?;
            normalize_field(kind, &field, &value)?
        }
        None => value,
    };
    let mut records = section_records(doc, &name)?;
    let mut count = 0;
    for record in &mut records {
        if let Value::Object(record) = record {
            record.insert(field.clone(), value.clone());
            count += 1;
        }
    }
    replace_section(doc, &name, records)?;
    Ok(count)
}

/// Remove `field` from every record of a section, returning how many
/// records had it
///
/// # Errors
///
/// Same as [`add_section_field`], except that no value is checked.
pub fn remove_section_field(doc: &mut Document, section: &str, field: &str) -> Result<usize> {
    let name = section_name(section)?;
    let field = field.trim().to_uppercase();
    if let Some(kind) = section_kind(&name) {
        check_field(kind, &field, None)?;
    }
    let mut records = section_records(doc, &name)?;
    let mut count = 0;
    for record in &mut records {
        if let Value::Object(record) = record {
            if record.remove(&field).is_some() {
                count += 1;
            }
        }
    }
    replace_section(doc, &name, records)?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc() -> Document {
        Document::from_value(json!({"G2_CONFIG": {
            "CFG_DSRC": [
                {"DSRC_ID": 1, "DSRC_CODE": "A"},
                {"DSRC_ID": 2, "DSRC_CODE": "B"}
            ],
            "CFG_CUSTOM": [{"NAME": "x"}, {"NAME": "y", "EXTRA": 1}],
            "CFG_FCLASS": [{"FCLASS_ID": 1, "FCLASS_CODE": "OTHER"}],
            "CFG_FTYPE": [
                {"FTYPE_ID": 1, "FTYPE_CODE": "COLOR", "FCLASS_ID": 1},
                {"FTYPE_ID": 2, "FTYPE_CODE": "SHAPE", "FCLASS_ID": 1}
            ],
            "CFG_FELEM": [{"FELEM_ID": 1, "FELEM_CODE": "COLOR"}],
            "CFG_ATTR": [
                {"ATTR_ID": 1, "ATTR_CODE": "COLOR", "ATTR_CLASS": "OTHER",
                 "FTYPE_CODE": "COLOR", "FELEM_CODE": "COLOR", "FELEM_REQ": "Yes"}
            ],
            "CFG_CFCALL": [
                {"CFCALL_ID": 1, "FTYPE_ID": 1, "CFUNC_ID": 1, "EXEC_ORDER": 1},
                {"CFCALL_ID": 2, "FTYPE_ID": 2, "CFUNC_ID": 1, "EXEC_ORDER": 1}
            ],
            "CFG_CFUNC": [{"CFUNC_ID": 1, "CFUNC_CODE": "CMP_COLOR"}],
            "CFG_CFRTN": [
                {"CFRTN_ID": 1, "CFUNC_ID": 1, "FTYPE_ID": 1, "CFUNC_RTNVAL": "FULL_SCORE", "EXEC_ORDER": 1},
                {"CFRTN_ID": 2, "CFUNC_ID": 1, "FTYPE_ID": 1, "CFUNC_RTNVAL": "TOKEN_SCORE", "EXEC_ORDER": 2}
            ]
        }}))
        .unwrap()
    }

    #[test]
    fn test_add_and_remove_section() {
        let mut doc = doc();
        add_section(&mut doc, "cfg_new").unwrap();
        assert_eq!(doc.config()["CFG_NEW"], json!([]));
        assert!(matches!(
            add_section(&mut doc, "CFG_NEW"),
            Err(ConfigError::DuplicateSection { .. })
        ));
        remove_section(&mut doc, "CFG_NEW").unwrap();
        assert!(matches!(
            remove_section(&mut doc, "CFG_NEW"),
            Err(ConfigError::SectionNotFound { .. })
        ));
    }

    #[test]
    fn test_non_empty_entity_section_is_kept() {
        let mut doc = doc();
        assert!(matches!(
            remove_section(&mut doc, "CFG_DSRC"),
            Err(ConfigError::UnsupportedOperation { kind: EntityKind::DataSource, .. })
        ));
        remove_section(&mut doc, "CFG_CUSTOM").unwrap();
    }

    #[test]
    fn test_section_fields_report_counts() {
        let mut doc = doc();
        assert_eq!(remove_section_field(&mut doc, "CFG_CUSTOM", "extra").unwrap(), 1);
        assert_eq!(add_section_field(&mut doc, "cfg_dsrc", "dsrc_rely", json!(3)).unwrap(), 2);
        assert_eq!(doc.records(EntityKind::DataSource)[1]["DSRC_RELY"], 3);
    }

    #[test]
    fn test_section_fields_respect_descriptors() {
        let mut doc = doc();
        assert!(matches!(
            remove_section_field(&mut doc, "CFG_DSRC", "DSRC_CODE"),
            Err(ConfigError::ImmutableField { .. })
        ));
        assert!(matches!(
            add_section_field(&mut doc, "CFG_DSRC", "DSRC_RELY", json!("high")),
            Err(ConfigError::InvalidField { .. })
        ));
        assert!(matches!(
            add_section_field(&mut doc, "CFG_MISSING", "X", json!(1)),
            Err(ConfigError::SectionNotFound { .. })
        ));
    }

    #[test]
    fn test_section_field_cannot_leave_dangling_reference() {
        // GIVEN an attribute mapped to an existing feature
        let mut doc = doc();
        let before = doc.clone();

        // WHEN every attribute is pointed at a feature that does not exist
        let result = add_section_field(&mut doc, "CFG_ATTR", "FTYPE_CODE", json!("bogus"));

        // THEN the write is refused and the section is untouched
        assert!(matches!(
            result,
            Err(ConfigError::InvalidReference { kind: EntityKind::Attribute, .. })
        ));
        assert_eq!(doc, before);
    }

    #[test]
    fn test_section_field_respects_kind_rules() {
        let mut doc = doc();

        // Comparison calls are keyed by feature; this field is theirs to keep.
        assert!(matches!(
            add_section_field(&mut doc, "CFG_CFCALL", "FTYPE_ID", json!(1)),
            Err(ConfigError::InvalidField { ref field, .. }) if field == "FTYPE_ID"
        ));

        // One return value for every threshold of the same function and feature
        let before = doc.clone();
        assert!(matches!(
            add_section_field(&mut doc, "CFG_CFRTN", "CFUNC_RTNVAL", json!("FULL_SCORE")),
            Err(ConfigError::DuplicateCode { kind: EntityKind::ComparisonThreshold, .. })
        ));
        assert_eq!(doc, before);

        assert_eq!(add_section_field(&mut doc, "CFG_ATTR", "felem_req", json!("any")).unwrap(), 1);
        assert_eq!(doc.records(EntityKind::Attribute)[0]["FELEM_REQ"], "Any");
    }
}
