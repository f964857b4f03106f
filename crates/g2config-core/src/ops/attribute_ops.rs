use serde::Deserialize;
use serde_json::{json, Value};

use crate::errors::{ConfigError, Result};
use crate::model::record::{normalize_code, yes_no};
use crate::model::Document;
use crate::ops::engine::{self, DeleteReport};
use crate::ops::patch::{Patch, Update};
use crate::ops::record;
use crate::policy::DeletePolicy;
use crate::registry::EntityKey;
use g2config_core_types::EntityKind;

/// Allowed values of `ATTR_CLASS`
pub const ATTRIBUTE_CLASSES: [&str; 7] = [
    "NAME",
    "ATTRIBUTE",
    "IDENTIFIER",
    "ADDRESS",
    "PHONE",
    "RELATIONSHIP",
    "OTHER",
];

/// Allowed values of `FELEM_REQ`
pub const REQUIREMENTS: [&str; 4] = ["Yes", "No", "Any", "Desired"];

pub(crate) fn attribute_class(raw: &str) -> Result<String> {
    let class = normalize_code("ATTR_CLASS", raw)?;
    if ATTRIBUTE_CLASSES.contains(&class.as_str()) {
        Ok(class)
    } else {
        Err(ConfigError::InvalidField {
            field: "ATTR_CLASS".to_string(),
            reason: format!("must be one of {}", ATTRIBUTE_CLASSES.join(", ")),
        })
    }
}

/// Canonical spelling of a `FELEM_REQ` value
pub(crate) fn requirement(raw: &str) -> Result<String> {
    REQUIREMENTS
        .iter()
        .find(|r| r.eq_ignore_ascii_case(raw.trim()))
        .map(|r| r.to_string())
        .ok_or_else(|| ConfigError::InvalidField {
            field: "FELEM_REQ".to_string(),
            reason: format!("must be one of {}", REQUIREMENTS.join(", ")),
        })
}

fn optional_code(field: &str, raw: Option<&str>) -> Result<Value> {
    match raw {
        Some(code) if !code.trim().is_empty() => Ok(Value::from(normalize_code(field, code)?)),
        _ => Ok(Value::Null),
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddAttribute {
    #[serde(alias = "code")]
    pub attribute: String,
    pub class: String,
    #[serde(default)]
    pub feature: Option<String>,
    #[serde(default)]
    pub element: Option<String>,
    #[serde(default)]
    pub required: Option<String>,
    #[serde(default)]
    pub default_value: Option<Value>,
    #[serde(default)]
    pub internal: Option<String>,
}

impl AddAttribute {
    pub fn new(code: impl Into<String>, class: impl Into<String>) -> Self {
        Self {
            attribute: code.into(),
            class: class.into(),
            feature: None,
            element: None,
            required: None,
            default_value: None,
            internal: None,
        }
    }

    pub fn mapped_to(mut self, feature: impl Into<String>, element: impl Into<String>) -> Self {
        self.feature = Some(feature.into());
        self.element = Some(element.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AttributeUpdate {
    pub class: Update<String>,
    pub feature: Update<String>,
    pub element: Update<String>,
    pub required: Update<String>,
    pub default_value: Update<Value>,
    pub internal: Update<String>,
}

/// Add an attribute, returning its id
///
/// # Errors
///
/// - `DuplicateCode` if the code exists
/// - `InvalidField` for an unknown class or bad flag
/// - `InvalidReference` if the feature or element does not exist
pub fn add_attribute(doc: &mut Document, params: AddAttribute) -> Result<i64> {
    let rec = record(json!({
        "ATTR_CODE": normalize_code("ATTR_CODE", &params.attribute)?,
        "ATTR_CLASS": attribute_class(&params.class)?,
        "FTYPE_CODE": optional_code("FTYPE_CODE", params.feature.as_deref())?,
        "FELEM_CODE": optional_code("FELEM_CODE", params.element.as_deref())?,
        "FELEM_REQ": requirement(params.required.as_deref().unwrap_or("No"))?,
        "DEFAULT_VALUE": params.default_value.unwrap_or(Value::Null),
        "INTERNAL": yes_no("INTERNAL", params.internal.as_deref().unwrap_or("No"))?,
    }));
    Ok(engine::insert(doc, EntityKind::Attribute, rec)?.unwrap_or_default())
}

/// # Errors
///
/// Returns `NotFound` for an unknown code.
pub fn delete_attribute(
    doc: &mut Document,
    code: &str,
    policy: &dyn DeletePolicy,
) -> Result<DeleteReport> {
    engine::delete(doc, EntityKind::Attribute, &EntityKey::code(code), policy)
}

/// # Errors
///
/// Returns `NotFound`, `InvalidField` or `InvalidReference`.
pub fn set_attribute(doc: &mut Document, code: &str, update: AttributeUpdate) -> Result<()> {
    let class = match update.class {
        Update::Set(c) => Update::Set(attribute_class(&c)?),
        other => other,
    };
    let required = match update.required {
        Update::Set(v) => Update::Set(requirement(&v)?),
        other => other,
    };
    let internal = match update.internal {
        Update::Set(v) => Update::Set(yes_no("INTERNAL", &v)?.to_string()),
        other => other,
    };
    let patch = Patch::new()
        .update("ATTR_CLASS", class)
        .update("FTYPE_CODE", update.feature.map(|c| c.trim().to_uppercase()))
        .update("FELEM_CODE", update.element.map(|c| c.trim().to_uppercase()))
        .update("FELEM_REQ", required)
        .update("DEFAULT_VALUE", update.default_value)
        .update("INTERNAL", internal);
    engine::update(doc, EntityKind::Attribute, &EntityKey::code(code), &patch)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_class_is_rejected() {
        let mut doc = Document::empty();
        let result = add_attribute(&mut doc, AddAttribute::new("COLOR", "hue"));
        assert!(matches!(result, Err(ConfigError::InvalidField { .. })));
        assert!(doc.records(EntityKind::Attribute).is_empty());
    }

    #[test]
    fn test_requirement_accepts_any_and_desired() {
        let mut doc = Document::empty();
        let mut params = AddAttribute::new("COLOR", "other");
        params.required = Some("any".to_string());
        add_attribute(&mut doc, params).unwrap();
        assert_eq!(doc.records(EntityKind::Attribute)[0]["FELEM_REQ"], "Any");

        let update = AttributeUpdate {
            required: Update::Set("DESIRED".to_string()),
            ..Default::default()
        };
        set_attribute(&mut doc, "COLOR", update).unwrap();
        assert_eq!(doc.records(EntityKind::Attribute)[0]["FELEM_REQ"], "Desired");

        let update = AttributeUpdate {
            required: Update::Set("sometimes".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            set_attribute(&mut doc, "COLOR", update),
            Err(ConfigError::InvalidField { ref field, .. }) if field == "FELEM_REQ"
        ));
    }

    #[test]
    fn test_attribute_with_unknown_feature_is_invalid_reference() {
        let mut doc = Document::empty();
        let params = AddAttribute::new("COLOR", "other").mapped_to("COLOR", "VALUE");
        let result = add_attribute(&mut doc, params);
        assert!(matches!(
            result,
            Err(ConfigError::InvalidReference { target: EntityKind::Feature, .. })
        ));
    }
}
