//! Feature types and their element lists
//!
//! Adding a feature writes the `CFG_FTYPE` row, one `CFG_FBOM` row per
//! element (creating missing elements), and optionally the standardize,
//! expression and comparison calls with their element rows.

use serde::Deserialize;
use serde_json::{json, Value};

use crate::errors::{ConfigError, Result};
use crate::model::record::{flag, get_i64, get_str, normalize_code, yes_no};
use crate::model::Document;
use crate::ops::element_ops::{add_element, AddElement};
use crate::ops::engine::{self, DeleteReport};
use crate::ops::patch::{Patch, Update};
use crate::ops::{atomically, lookup_id, record, reference_id};
use crate::policy::DeletePolicy;
use crate::registry::{EntityKey, Registry};
use g2config_core_types::EntityKind;

/// Features the resolution engine depends on; they can never be deleted
pub const LOCKED_FEATURES: [&str; 12] = [
    "NAME",
    "ADDRESS",
    "PHONE",
    "EMAIL",
    "RECORD_TYPE",
    "DATE_OF_BIRTH",
    "NATIONAL_ID",
    "TAX_ID",
    "ACCT_NUM",
    "SSN_NUM",
    "PASSPORT_NUM",
    "DRIVERS_LICENSE_NUM",
];

/// Frequencies a behavior code may start with
pub const FREQUENCIES: [&str; 7] = ["A1", "F1", "FF", "FM", "FVM", "NONE", "NAME"];

/// Parsed feature behavior, e.g. `F1ES` = frequency F1, exclusive, stable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Behavior {
    pub frequency: String,
    pub exclusive: bool,
    pub stable: bool,
}

impl Behavior {
    /// Parse a behavior code
    ///
    /// # Errors
    ///
    /// Returns `InvalidField` for an unknown frequency.
    pub fn parse(raw: &str) -> Result<Self> {
        let code = raw.trim().to_uppercase();
        if code == "NAME" || code == "NONE" {
            return Ok(Self {
                frequency: code,
                exclusive: false,
                stable: false,
            });
        }
        let mut frequency = code.as_str();
        let mut exclusive = false;
        let mut stable = false;
        loop {
            if !stable && frequency.len() > 2 && frequency.ends_with('S') {
                stable = true;
                frequency = &frequency[..frequency.len() - 1];
            } else if !exclusive && frequency.len() > 2 && frequency.ends_with('E') {
                exclusive = true;
                frequency = &frequency[..frequency.len() - 1];
            } else {
                break;
            }
        }
        if !FREQUENCIES[..5].contains(&frequency) {
            return Err(ConfigError::InvalidField {
                field: "behavior".to_string(),
                reason: format!("'{}' is not a valid behavior code", raw),
            });
        }
        Ok(Self {
            frequency: frequency.to_string(),
            exclusive,
            stable,
        })
    }

    /// Rebuild a behavior from the stored `CFG_FTYPE`/`CFG_FBOVR` fields
    pub fn from_record(record: &Value) -> Self {
        let yes = |f: &str| {
            record
                .get(f)
                .and_then(Value::as_str)
                .is_some_and(|v| v.eq_ignore_ascii_case("yes"))
        };
        Self {
            frequency: record
                .get("FTYPE_FREQ")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            exclusive: yes("FTYPE_EXCL"),
            stable: yes("FTYPE_STAB"),
        }
    }

    pub fn code(&self) -> String {
        let mut code = self.frequency.clone();
        if self.exclusive {
            code.push('E');
        }
        if self.stable {
            code.push('S');
        }
        code
    }
}

/// One entry of a feature's element list: a bare code or a detailed spec
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FeatureElementSpec {
    Code(String),
    Detailed(FeatureElementDetail),
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureElementDetail {
    pub element: String,
    #[serde(default)]
    pub expressed: Option<String>,
    #[serde(default)]
    pub compared: Option<String>,
    /// "Yes"/"No" shorthand for display level 1/0
    #[serde(default)]
    pub display: Option<String>,
    #[serde(default)]
    pub display_level: Option<i64>,
    #[serde(default)]
    pub display_delim: Option<String>,
    #[serde(default)]
    pub derived: Option<String>,
}

impl FeatureElementSpec {
    fn detail(&self) -> FeatureElementDetail {
        match self {
            FeatureElementSpec::Code(code) => FeatureElementDetail {
                element: code.clone(),
                ..Default::default()
            },
            FeatureElementSpec::Detailed(detail) => detail.clone(),
        }
    }
}

struct ResolvedElement {
    code: String,
    expressed: bool,
    compared: bool,
    display_level: i64,
    display_delim: Option<String>,
    derived: &'static str,
}

fn resolve_element(detail: FeatureElementDetail) -> Result<ResolvedElement> {
    let is_yes = |field: &str, v: &Option<String>| -> Result<bool> {
        Ok(match v {
            Some(raw) => yes_no(field, raw)? == "Yes",
            None => false,
        })
    };
    let display_level = match (detail.display_level, detail.display.as_deref()) {
        (Some(level), _) => level,
        (None, Some(raw)) => i64::from(yes_no("display", raw)? == "Yes"),
        (None, None) => 1,
    };
    Ok(ResolvedElement {
        code: normalize_code("element", &detail.element)?,
        expressed: is_yes("expressed", &detail.expressed)?,
        compared: is_yes("compared", &detail.compared)?,
        display_level,
        display_delim: detail.display_delim,
        derived: yes_no("derived", detail.derived.as_deref().unwrap_or("No"))?,
    })
}

/// Parameters for adding a feature
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddFeature {
    #[serde(alias = "code")]
    pub feature: String,
    pub element_list: Vec<FeatureElementSpec>,
    #[serde(default)]
    pub class: Option<String>,
    #[serde(default)]
    pub behavior: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub candidates: Option<String>,
    #[serde(default)]
    pub anonymize: Option<String>,
    #[serde(default)]
    pub derived: Option<String>,
    #[serde(default)]
    pub history: Option<String>,
    #[serde(default)]
    pub match_key: Option<String>,
    #[serde(default)]
    pub standardize: Option<String>,
    #[serde(default)]
    pub expression: Option<String>,
    #[serde(default)]
    pub comparison: Option<String>,
    #[serde(default)]
    pub version: Option<i64>,
    #[serde(default)]
    pub rtype_id: Option<i64>,
}

impl AddFeature {
    pub fn new<I, S>(code: impl Into<String>, elements: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            feature: code.into(),
            element_list: elements
                .into_iter()
                .map(|e| FeatureElementSpec::Code(e.into()))
                .collect(),
            class: None,
            behavior: None,
            description: None,
            candidates: None,
            anonymize: None,
            derived: None,
            history: None,
            match_key: None,
            standardize: None,
            expression: None,
            comparison: None,
            version: None,
            rtype_id: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeatureUpdate {
    pub description: Update<String>,
    pub class: Update<String>,
    pub behavior: Update<String>,
    pub candidates: Update<String>,
    pub anonymize: Update<String>,
    pub derived: Update<String>,
    pub history: Update<String>,
    pub match_key: Update<String>,
    pub version: Update<i64>,
    pub rtype_id: Update<i64>,
}

fn flag_update(field: &str, update: Update<String>) -> Result<Update<String>> {
    Ok(match update {
        Update::Set(v) => Update::Set(yes_no(field, &v)?.to_string()),
        other => other,
    })
}

fn element_id_or_create(doc: &mut Document, code: &str) -> Result<i64> {
    match Registry::new(doc, EntityKind::Element).id_of(code) {
        Ok(id) => Ok(id),
        Err(ConfigError::NotFound { .. }) => add_element(doc, AddElement::new(code)),
        Err(e) => Err(e),
    }
}

fn insert_id(doc: &mut Document, kind: EntityKind, value: Value) -> Result<i64> {
    engine::insert(doc, kind, record(value))?.ok_or_else(|| ConfigError::Internal {
        message: format!("{} has no id field", kind),
    })
}

/// Add a feature with its element list, returning the feature id
///
/// # Errors
///
/// - `DuplicateCode` if the feature exists or an element is listed twice
/// - `MissingField` for an empty element list
/// - `InvalidField` for a bad behavior, flag, or an expression/comparison
///   function with no expressed/compared elements
/// - `InvalidReference` for an unknown class or function
pub fn add_feature(doc: &mut Document, params: AddFeature) -> Result<i64> {
    let code = normalize_code("FTYPE_CODE", &params.feature)?;
    if Registry::new(doc, EntityKind::Feature).exists_by_code(&code) {
        return Err(ConfigError::DuplicateCode {
            kind: EntityKind::Feature,
            key: code,
        });
    }
    if params.element_list.is_empty() {
        return Err(ConfigError::MissingField {
            field: "elementList".to_string(),
        });
    }
    let elements = params
        .element_list
        .iter()
        .map(|spec| resolve_element(spec.detail()))
        .collect::<Result<Vec<_>>>()?;

    let class = params.class.as_deref().unwrap_or("OTHER");
    let fclass_id = reference_id(
        doc,
        EntityKind::Feature,
        "FCLASS_ID",
        EntityKind::FeatureClass,
        &EntityKey::code(class),
    )?;
    let behavior = Behavior::parse(params.behavior.as_deref().unwrap_or("FM"))?;

    let function = |field: &str, call: EntityKind, kind: EntityKind, code: &Option<String>| {
        code.as_deref()
            .map(|c| reference_id(doc, call, field, kind, &EntityKey::code(c)))
            .transpose()
    };
    let sfunc_id = function(
        "SFUNC_ID",
        EntityKind::StandardizeCall,
        EntityKind::StandardizeFunction,
        &params.standardize,
    )?;
    let efunc_id = function(
        "EFUNC_ID",
        EntityKind::ExpressionCall,
        EntityKind::ExpressionFunction,
        &params.expression,
    )?;
    let cfunc_id = function(
        "CFUNC_ID",
        EntityKind::ComparisonCall,
        EntityKind::ComparisonFunction,
        &params.comparison,
    )?;

    if efunc_id.is_some() && !elements.iter().any(|e| e.expressed) {
        return Err(ConfigError::InvalidField {
            field: "expression".to_string(),
            reason: "an expression function needs at least one expressed element".to_string(),
        });
    }
    if cfunc_id.is_some() && !elements.iter().any(|e| e.compared) {
        return Err(ConfigError::InvalidField {
            field: "comparison".to_string(),
            reason: "a comparison function needs at least one compared element".to_string(),
        });
    }

    let description = params.description.unwrap_or_else(|| code.clone());
    let match_key = match params.match_key {
        Some(raw) => raw.trim().to_string(),
        None => flag(cfunc_id.is_some()).to_string(),
    };
    let feature = json!({
        "FTYPE_CODE": code,
        "FTYPE_DESC": description,
        "FCLASS_ID": fclass_id,
        "FTYPE_FREQ": behavior.frequency,
        "FTYPE_EXCL": flag(behavior.exclusive),
        "FTYPE_STAB": flag(behavior.stable),
        "ANONYMIZE": yes_no("anonymize", params.anonymize.as_deref().unwrap_or("No"))?,
        "DERIVED": yes_no("derived", params.derived.as_deref().unwrap_or("No"))?,
        "USED_FOR_CAND": yes_no("candidates", params.candidates.as_deref().unwrap_or("No"))?,
        "SHOW_IN_MATCH_KEY": match_key,
        "PERSIST_HISTORY": yes_no("history", params.history.as_deref().unwrap_or("Yes"))?,
        "VERSION": params.version.unwrap_or(1),
        "RTYPE_ID": params.rtype_id.unwrap_or(0),
    });

    atomically(doc, |doc| {
        let ftype_id = insert_id(doc, EntityKind::Feature, feature)?;

        let mut element_ids = Vec::with_capacity(elements.len());
        for (i, element) in elements.iter().enumerate() {
            let felem_id = element_id_or_create(doc, &element.code)?;
            let mut bom = record(json!({
                "FTYPE_ID": ftype_id,
                "FELEM_ID": felem_id,
                "EXEC_ORDER": i as i64 + 1,
                "DISPLAY_LEVEL": element.display_level,
                "DERIVED": element.derived,
            }));
            if let Some(delim) = &element.display_delim {
                bom.insert("DISPLAY_DELIM".to_string(), Value::from(delim.clone()));
            }
            engine::insert(doc, EntityKind::FeatureElement, bom)?;
            element_ids.push(felem_id);
        }

        if let Some(sfunc_id) = sfunc_id {
            insert_id(
                doc,
                EntityKind::StandardizeCall,
                json!({"FTYPE_ID": ftype_id, "FELEM_ID": -1, "SFUNC_ID": sfunc_id, "EXEC_ORDER": 1}),
            )?;
        }

        if let Some(efunc_id) = efunc_id {
            let efcall_id = insert_id(
                doc,
                EntityKind::ExpressionCall,
                json!({
                    "FTYPE_ID": ftype_id,
                    "FELEM_ID": -1,
                    "EFUNC_ID": efunc_id,
                    "EXEC_ORDER": 1,
                    "EFEAT_FTYPE_ID": -1,
                    "IS_VIRTUAL": "No",
                }),
            )?;
            let expressed = elements.iter().zip(&element_ids).filter(|(e, _)| e.expressed);
            for (order, (_, felem_id)) in expressed.enumerate() {
                engine::insert(
                    doc,
                    EntityKind::ExpressionCallElement,
                    record(json!({
                        "EFCALL_ID": efcall_id,
                        "FTYPE_ID": ftype_id,
                        "FELEM_ID": felem_id,
                        "EXEC_ORDER": order as i64 + 1,
                        "FELEM_REQ": "Yes",
                    })),
                )?;
            }
        }

        if let Some(cfunc_id) = cfunc_id {
            let cfcall_id = insert_id(
                doc,
                EntityKind::ComparisonCall,
                json!({"FTYPE_ID": ftype_id, "CFUNC_ID": cfunc_id, "EXEC_ORDER": 1}),
            )?;
            let compared = elements.iter().zip(&element_ids).filter(|(e, _)| e.compared);
            for (order, (_, felem_id)) in compared.enumerate() {
                engine::insert(
                    doc,
                    EntityKind::ComparisonCallElement,
                    record(json!({
                        "CFCALL_ID": cfcall_id,
                        "FTYPE_ID": ftype_id,
                        "FELEM_ID": felem_id,
                        "EXEC_ORDER": order as i64 + 1,
                    })),
                )?;
            }
        }

        Ok(ftype_id)
    })
}

/// Delete a feature with its element rows, calls and behavior overrides
///
/// # Errors
///
/// - `NotFound` for an unknown feature
/// - `UnsupportedOperation` for one of the `LOCKED_FEATURES`
/// - `ReferencedByOthers` while attributes, thresholds or other features'
///   calls still point at it
pub fn delete_feature(
    doc: &mut Document,
    key: &EntityKey,
    policy: &dyn DeletePolicy,
) -> Result<DeleteReport> {
    let feature = Registry::new(doc, EntityKind::Feature).get(key)?;
    if let Some(code) = get_str(feature, "FTYPE_CODE")
        .filter(|code| LOCKED_FEATURES.iter().any(|l| l.eq_ignore_ascii_case(code)))
    {
        return Err(ConfigError::UnsupportedOperation {
            kind: EntityKind::Feature,
            operation: format!("delete locked feature {}", code),
        });
    }
    engine::delete(doc, EntityKind::Feature, key, policy)
}

/// # Errors
///
/// Returns `NotFound`, `InvalidField` or `InvalidReference`.
pub fn set_feature(doc: &mut Document, key: &EntityKey, update: FeatureUpdate) -> Result<()> {
    let mut patch = Patch::new()
        .update("FTYPE_DESC", update.description)
        .update("USED_FOR_CAND", flag_update("candidates", update.candidates)?)
        .update("ANONYMIZE", flag_update("anonymize", update.anonymize)?)
        .update("DERIVED", flag_update("derived", update.derived)?)
        .update("PERSIST_HISTORY", flag_update("history", update.history)?)
        .update("SHOW_IN_MATCH_KEY", update.match_key)
        .update("VERSION", update.version)
        .update("RTYPE_ID", update.rtype_id);

    match update.class {
        Update::Set(class) => {
            let fclass_id = reference_id(
                doc,
                EntityKind::Feature,
                "FCLASS_ID",
                EntityKind::FeatureClass,
                &EntityKey::code(class),
            )?;
            patch = patch.set("FCLASS_ID", fclass_id);
        }
        Update::Clear => patch = patch.clear("FCLASS_ID"),
        Update::Unchanged => {}
    }

    match update.behavior {
        Update::Set(raw) => {
            let behavior = Behavior::parse(&raw)?;
            patch = patch
                .set("FTYPE_FREQ", behavior.frequency)
                .set("FTYPE_EXCL", flag(behavior.exclusive))
                .set("FTYPE_STAB", flag(behavior.stable));
        }
        Update::Clear => patch = patch.clear("FTYPE_FREQ"),
        Update::Unchanged => {}
    }

    engine::update(doc, EntityKind::Feature, key, &patch)
}

/// Parameters for adding one element to an existing feature
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddFeatureElement {
    pub feature: String,
    pub element: String,
    #[serde(default)]
    pub exec_order: Option<i64>,
    #[serde(default)]
    pub display_level: Option<i64>,
    #[serde(default)]
    pub display_delim: Option<String>,
    #[serde(default)]
    pub derived: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeatureElementUpdate {
    pub exec_order: Update<i64>,
    pub display_level: Update<i64>,
    pub display_delim: Update<String>,
    pub derived: Update<String>,
}

fn feature_element_key(doc: &Document, feature: &str, element: &str) -> Result<EntityKey> {
    let ftype_id = lookup_id(doc, EntityKind::Feature, &EntityKey::code(feature))?;
    let felem_id = lookup_id(doc, EntityKind::Element, &EntityKey::code(element))?;
    Ok(EntityKey::fields([
        ("FTYPE_ID", Value::from(ftype_id)),
        ("FELEM_ID", Value::from(felem_id)),
    ]))
}

/// Add an element to a feature's element list
///
/// Exec order defaults to one past the feature's current maximum.
///
/// # Errors
///
/// Returns `InvalidReference` for an unknown feature or element and
/// `DuplicateCode` when the element is already listed.
pub fn add_feature_element(doc: &mut Document, params: AddFeatureElement) -> Result<()> {
    let ftype_id = reference_id(
        doc,
        EntityKind::FeatureElement,
        "FTYPE_ID",
        EntityKind::Feature,
        &EntityKey::code(&params.feature),
    )?;
    let felem_id = reference_id(
        doc,
        EntityKind::FeatureElement,
        "FELEM_ID",
        EntityKind::Element,
        &EntityKey::code(&params.element),
    )?;
    let exec_order = match params.exec_order {
        Some(order) => order,
        None => {
            doc.records(EntityKind::FeatureElement)
                .iter()
                .filter(|r| get_i64(r, "FTYPE_ID") == Some(ftype_id))
                .filter_map(|r| get_i64(r, "EXEC_ORDER"))
                .max()
                .unwrap_or(0)
                + 1
        }
    };
    let mut bom = record(json!({
        "FTYPE_ID": ftype_id,
        "FELEM_ID": felem_id,
        "EXEC_ORDER": exec_order,
        "DISPLAY_LEVEL": params.display_level.unwrap_or(1),
        "DERIVED": yes_no("derived", params.derived.as_deref().unwrap_or("No"))?,
    }));
    if let Some(delim) = params.display_delim {
        bom.insert("DISPLAY_DELIM".to_string(), Value::from(delim));
    }
    engine::insert(doc, EntityKind::FeatureElement, bom)?;
    Ok(())
}

/// # Errors
///
/// Returns `NotFound` when the feature, element or row does not exist.
pub fn delete_feature_element(
    doc: &mut Document,
    feature: &str,
    element: &str,
    policy: &dyn DeletePolicy,
) -> Result<DeleteReport> {
    let key = feature_element_key(doc, feature, element)?;
    engine::delete(doc, EntityKind::FeatureElement, &key, policy)
}

/// # Errors
///
/// Returns `NotFound` when the feature, element or row does not exist.
pub fn set_feature_element(
    doc: &mut Document,
    feature: &str,
    element: &str,
    update: FeatureElementUpdate,
) -> Result<()> {
    let key = feature_element_key(doc, feature, element)?;
    let patch = Patch::new()
        .update("EXEC_ORDER", update.exec_order)
        .update("DISPLAY_LEVEL", update.display_level)
        .update("DISPLAY_DELIM", update.display_delim)
        .update("DERIVED", flag_update("derived", update.derived)?);
    engine::update(doc, EntityKind::FeatureElement, &key, &patch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::RejectReferencedPolicy;

    #[test]
    fn test_behavior_parse_suffixes() {
        let b = Behavior::parse("f1es").unwrap();
        assert_eq!((b.frequency.as_str(), b.exclusive, b.stable), ("F1", true, true));
        assert_eq!(b.code(), "F1ES");

        let b = Behavior::parse("FME").unwrap();
        assert_eq!((b.frequency.as_str(), b.exclusive, b.stable), ("FM", true, false));

        let b = Behavior::parse("NONE").unwrap();
        assert_eq!((b.frequency.as_str(), b.exclusive, b.stable), ("NONE", false, false));

        assert!(Behavior::parse("F2").is_err());
        assert!(Behavior::parse("FVMS").unwrap().stable);
    }

    #[test]
    fn test_locked_feature_cannot_be_deleted() {
        let mut doc = Document::from_value(json!({"G2_CONFIG": {
            "CFG_FCLASS": [{"FCLASS_ID": 1, "FCLASS_CODE": "OTHER"}],
            "CFG_FTYPE": [
                {"FTYPE_ID": 1, "FTYPE_CODE": "NAME", "FCLASS_ID": 1},
                {"FTYPE_ID": 2, "FTYPE_CODE": "COLOR", "FCLASS_ID": 1}
            ]
        }}))
        .unwrap();

        let result = delete_feature(&mut doc, &EntityKey::code("name"), &RejectReferencedPolicy);
        assert!(matches!(
            result,
            Err(ConfigError::UnsupportedOperation { kind: EntityKind::Feature, .. })
        ));
        assert_eq!(doc.records(EntityKind::Feature).len(), 2);

        delete_feature(&mut doc, &EntityKey::code("COLOR"), &RejectReferencedPolicy).unwrap();
        assert_eq!(doc.records(EntityKind::Feature).len(), 1);
    }

    #[test]
    fn test_element_spec_accepts_code_or_object() {
        let specs: Vec<FeatureElementSpec> = serde_json::from_value(json!([
            "COLOR",
            {"element": "SHADE", "compared": "Yes", "displayLevel": 0}
        ]))
        .unwrap();
        assert_eq!(specs[0], FeatureElementSpec::Code("COLOR".to_string()));
        let detail = specs[1].detail();
        assert_eq!(detail.compared.as_deref(), Some("Yes"));
        assert_eq!(detail.display_level, Some(0));
    }
}
