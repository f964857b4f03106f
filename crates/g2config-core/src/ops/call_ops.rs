//! Calls binding functions to features or elements, and their element rows
//!
//! Standardize and expression calls bind to exactly one of a feature or an
//! element; the other side is stored as `-1`. Comparison and distinct calls
//! bind to a feature, one call per feature. Expression, comparison and
//! distinct calls own element rows (`CFG_EFBOM`, `CFG_CFBOM`, `CFG_DFBOM`)
//! which are removed with the call.

use serde::Deserialize;
use serde_json::{json, Value};

use crate::errors::{ConfigError, Result};
use crate::model::record::{get_i64, yes_no};
use crate::model::Document;
use crate::ops::engine::{self, DeleteReport};
use crate::ops::patch::{Patch, Update};
use crate::ops::{atomically, lookup_id, record, reference_id, ALL_FEATURES, NO_ELEMENT};
use crate::policy::DeletePolicy;
use crate::registry::{EntityKey, Registry};
use g2config_core_types::EntityKind;

/// Feature code marking an expression element taken from the call's own feature
pub const PARENT_FEATURE: &str = "PARENT";

/// Static facts about one call kind
#[derive(Debug, Clone, Copy)]
pub struct CallInfo {
    pub call: EntityKind,
    pub id_field: &'static str,
    pub function_field: &'static str,
    pub function: EntityKind,
    pub element: Option<EntityKind>,
}

/// Facts for a call kind
///
/// # Errors
///
/// Returns `UnsupportedOperation` when `kind` is not a call kind.
pub fn call_info(kind: EntityKind) -> Result<CallInfo> {
    let info = |call, id_field, function_field, function, element| CallInfo {
        call,
        id_field,
        function_field,
        function,
        element,
    };
    match kind {
        EntityKind::StandardizeCall => Ok(info(
            kind,
            "SFCALL_ID",
            "SFUNC_ID",
            EntityKind::StandardizeFunction,
            None,
        )),
        EntityKind::ExpressionCall => Ok(info(
            kind,
            "EFCALL_ID",
            "EFUNC_ID",
            EntityKind::ExpressionFunction,
            Some(EntityKind::ExpressionCallElement),
        )),
        EntityKind::ComparisonCall => Ok(info(
            kind,
            "CFCALL_ID",
            "CFUNC_ID",
            EntityKind::ComparisonFunction,
            Some(EntityKind::ComparisonCallElement),
        )),
        EntityKind::DistinctCall => Ok(info(
            kind,
            "DFCALL_ID",
            "DFUNC_ID",
            EntityKind::DistinctFunction,
            Some(EntityKind::DistinctCallElement),
        )),
        other => Err(ConfigError::UnsupportedOperation {
            kind: other,
            operation: "call".to_string(),
        }),
    }
}

/// Call kind owning rows of a call element kind
///
/// # Errors
///
/// Returns `UnsupportedOperation` when `kind` is not a call element kind.
pub fn element_call_info(kind: EntityKind) -> Result<CallInfo> {
    let call = match kind {
        EntityKind::ExpressionCallElement => EntityKind::ExpressionCall,
        EntityKind::ComparisonCallElement => EntityKind::ComparisonCall,
        EntityKind::DistinctCallElement => EntityKind::DistinctCall,
        other => {
            return Err(ConfigError::UnsupportedOperation {
                kind: other,
                operation: "call element".to_string(),
            })
        }
    };
    call_info(call)
}

/// One element of a call's element list: a bare code or a detailed spec
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum CallElementSpec {
    Code(String),
    Detailed(CallElementDetail),
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallElementDetail {
    pub element: String,
    #[serde(default)]
    pub required: Option<String>,
    /// Feature the element is read from; absent or "PARENT" means the
    /// call's own feature
    #[serde(default)]
    pub feature: Option<String>,
}

impl CallElementSpec {
    fn detail(&self) -> CallElementDetail {
        match self {
            CallElementSpec::Code(code) => CallElementDetail {
                element: code.clone(),
                ..Default::default()
            },
            CallElementSpec::Detailed(detail) => detail.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddStandardizeCall {
    #[serde(default)]
    pub feature: Option<String>,
    #[serde(default)]
    pub element: Option<String>,
    #[serde(default)]
    pub exec_order: Option<i64>,
    pub function: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddExpressionCall {
    #[serde(default)]
    pub feature: Option<String>,
    #[serde(default)]
    pub element: Option<String>,
    #[serde(default)]
    pub exec_order: Option<i64>,
    pub function: String,
    #[serde(default)]
    pub element_list: Vec<CallElementSpec>,
    /// Feature the expression produces
    #[serde(default)]
    pub expression_feature: Option<String>,
    #[serde(default)]
    pub is_virtual: Option<String>,
}

/// Parameters for comparison and distinct calls
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddFeatureCall {
    pub feature: String,
    pub function: String,
    #[serde(default)]
    pub element_list: Vec<CallElementSpec>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CallUpdate {
    pub exec_order: Update<i64>,
    pub is_virtual: Update<String>,
}

fn function_id(doc: &Document, info: &CallInfo, code: &str) -> Result<i64> {
    reference_id(
        doc,
        info.call,
        info.function_field,
        info.function,
        &EntityKey::code(code),
    )
}

/// Resolve the feature/element binding of a standardize or expression call
fn binding(
    doc: &Document,
    kind: EntityKind,
    feature: Option<&str>,
    element: Option<&str>,
) -> Result<(i64, i64)> {
    let feature = feature
        .map(str::trim)
        .filter(|f| !f.is_empty() && !f.eq_ignore_ascii_case(ALL_FEATURES));
    let element = element
        .map(str::trim)
        .filter(|e| !e.is_empty() && !e.eq_ignore_ascii_case(NO_ELEMENT));
    let (ftype_id, felem_id) = match (feature, element) {
        (Some(f), None) => (
            reference_id(doc, kind, "FTYPE_ID", EntityKind::Feature, &EntityKey::code(f))?,
            -1,
        ),
        (None, Some(e)) => (
            -1,
            reference_id(doc, kind, "FELEM_ID", EntityKind::Element, &EntityKey::code(e))?,
        ),
        _ => {
            return Err(ConfigError::InvalidField {
                field: "feature".to_string(),
                reason: "exactly one of feature or element must be given".to_string(),
            })
        }
    };
    Ok((ftype_id, felem_id))
}

fn next_exec_order(doc: &Document, kind: EntityKind, ftype_id: i64, felem_id: i64) -> i64 {
    doc.records(kind)
        .iter()
        .filter(|r| get_i64(r, "FTYPE_ID") == Some(ftype_id) && get_i64(r, "FELEM_ID") == Some(felem_id))
        .filter_map(|r| get_i64(r, "EXEC_ORDER"))
        .max()
        .unwrap_or(0)
        + 1
}

fn insert_call(doc: &mut Document, kind: EntityKind, value: Value) -> Result<i64> {
    engine::insert(doc, kind, record(value))?.ok_or_else(|| ConfigError::Internal {
        message: format!("{} has no id field", kind),
    })
}

/// Resolve the feature id an element row reads from
fn element_feature_id(
    doc: &Document,
    element_kind: EntityKind,
    call_feature: i64,
    feature: Option<&str>,
) -> Result<i64> {
    let parent = if element_kind == EntityKind::ExpressionCallElement {
        -1
    } else {
        call_feature
    };
    match feature.map(str::trim) {
        None => Ok(parent),
        Some(f) if f.is_empty() || f.eq_ignore_ascii_case(PARENT_FEATURE) => Ok(parent),
        Some(f) => reference_id(doc, element_kind, "FTYPE_ID", EntityKind::Feature, &EntityKey::code(f)),
    }
}

fn insert_elements(
    doc: &mut Document,
    info: &CallInfo,
    call_id: i64,
    specs: &[CallElementSpec],
) -> Result<()> {
    let Some(element_kind) = info.element else {
        return Ok(());
    };
    for (i, spec) in specs.iter().enumerate() {
        let detail = spec.detail();
        add_call_element(
            doc,
            element_kind,
            AddCallElement {
                call_id,
                element: detail.element,
                feature: detail.feature,
                exec_order: Some(i as i64 + 1),
                required: detail.required,
            },
        )?;
    }
    Ok(())
}

/// Add a standardize call, returning its id
///
/// # Errors
///
/// - `InvalidField` unless exactly one of feature or element is given
/// - `InvalidReference` for an unknown feature, element or function
/// - `DuplicateCode` when the exec order is taken for the binding
pub fn add_standardize_call(doc: &mut Document, params: AddStandardizeCall) -> Result<i64> {
    let info = call_info(EntityKind::StandardizeCall)?;
    let (ftype_id, felem_id) = binding(
        doc,
        info.call,
        params.feature.as_deref(),
        params.element.as_deref(),
    )?;
    let sfunc_id = function_id(doc, &info, &params.function)?;
    let exec_order = params
        .exec_order
        .unwrap_or_else(|| next_exec_order(doc, info.call, ftype_id, felem_id));
    insert_call(
        doc,
        info.call,
        json!({
            "FTYPE_ID": ftype_id,
            "FELEM_ID": felem_id,
            "SFUNC_ID": sfunc_id,
            "EXEC_ORDER": exec_order,
        }),
    )
}

/// Add an expression call with its element list, returning its id
///
/// # Errors
///
/// Same as [`add_standardize_call`], plus `InvalidReference` for unknown
/// list elements or expression feature.
pub fn add_expression_call(doc: &mut Document, params: AddExpressionCall) -> Result<i64> {
    let info = call_info(EntityKind::ExpressionCall)?;
    let (ftype_id, felem_id) = binding(
        doc,
        info.call,
        params.feature.as_deref(),
        params.element.as_deref(),
    )?;
    let efunc_id = function_id(doc, &info, &params.function)?;
    let efeat_ftype_id = match params.expression_feature.as_deref().map(str::trim) {
        None => -1,
        Some(f) if f.is_empty() || f.eq_ignore_ascii_case(NO_ELEMENT) => -1,
        Some(f) => reference_id(
            doc,
            info.call,
            "EFEAT_FTYPE_ID",
            EntityKind::Feature,
            &EntityKey::code(f),
        )?,
    };
    let is_virtual = yes_no("IS_VIRTUAL", params.is_virtual.as_deref().unwrap_or("No"))?;
    let exec_order = params
        .exec_order
        .unwrap_or_else(|| next_exec_order(doc, info.call, ftype_id, felem_id));

    atomically(doc, |doc| {
        let efcall_id = insert_call(
            doc,
            info.call,
            json!({
                "FTYPE_ID": ftype_id,
                "FELEM_ID": felem_id,
                "EFUNC_ID": efunc_id,
                "EXEC_ORDER": exec_order,
                "EFEAT_FTYPE_ID": efeat_ftype_id,
                "IS_VIRTUAL": is_virtual,
            }),
        )?;
        insert_elements(doc, &info, efcall_id, &params.element_list)?;
        Ok(efcall_id)
    })
}

fn add_feature_call(doc: &mut Document, kind: EntityKind, params: AddFeatureCall) -> Result<i64> {
    let info = call_info(kind)?;
    let ftype_id = reference_id(
        doc,
        kind,
        "FTYPE_ID",
        EntityKind::Feature,
        &EntityKey::code(&params.feature),
    )?;
    let func_id = function_id(doc, &info, &params.function)?;

    let mut call = record(json!({"FTYPE_ID": ftype_id, "EXEC_ORDER": 1}));
    call.insert(info.function_field.to_string(), Value::from(func_id));

    atomically(doc, |doc| {
        let call_id = insert_call(doc, kind, Value::Object(call))?;
        insert_elements(doc, &info, call_id, &params.element_list)?;
        Ok(call_id)
    })
}

/// Add the comparison call of a feature, returning its id
///
/// # Errors
///
/// - `InvalidReference` for an unknown feature, function or element
/// - `DuplicateCode` when the feature already has a comparison call
pub fn add_comparison_call(doc: &mut Document, params: AddFeatureCall) -> Result<i64> {
    add_feature_call(doc, EntityKind::ComparisonCall, params)
}

/// Add the distinct call of a feature, returning its id
///
/// # Errors
///
/// - `InvalidReference` for an unknown feature, function or element
/// - `DuplicateCode` when the feature already has a distinct call
pub fn add_distinct_call(doc: &mut Document, params: AddFeatureCall) -> Result<i64> {
    add_feature_call(doc, EntityKind::DistinctCall, params)
}

/// Delete a call and its element rows
///
/// # Errors
///
/// Returns `UnsupportedOperation` for a non-call kind and `NotFound` for an
/// unknown id.
pub fn delete_call(
    doc: &mut Document,
    kind: EntityKind,
    id: i64,
    policy: &dyn DeletePolicy,
) -> Result<DeleteReport> {
    call_info(kind)?;
    engine::delete(doc, kind, &EntityKey::Id(id), policy)
}

/// # Errors
///
/// Returns `NotFound`, `InvalidField` (virtual flag outside expression
/// calls) or `DuplicateCode` for a taken exec order.
pub fn set_call(doc: &mut Document, kind: EntityKind, id: i64, update: CallUpdate) -> Result<()> {
    call_info(kind)?;
    let is_virtual = match update.is_virtual {
        Update::Unchanged => Update::Unchanged,
        _ if kind != EntityKind::ExpressionCall => {
            return Err(ConfigError::InvalidField {
                field: "isVirtual".to_string(),
                reason: format!("not applicable to {}", kind),
            })
        }
        Update::Set(v) => Update::Set(yes_no("IS_VIRTUAL", &v)?.to_string()),
        Update::Clear => Update::Clear,
    };
    let patch = Patch::new()
        .update("EXEC_ORDER", update.exec_order)
        .update("IS_VIRTUAL", is_virtual);
    engine::update(doc, kind, &EntityKey::Id(id), &patch)
}

/// Parameters for adding one element row to a call
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCallElement {
    pub call_id: i64,
    pub element: String,
    #[serde(default)]
    pub feature: Option<String>,
    #[serde(default)]
    pub exec_order: Option<i64>,
    #[serde(default)]
    pub required: Option<String>,
}

/// Names one element row of a call
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallElementKey {
    pub call_id: i64,
    pub element: String,
    #[serde(default)]
    pub feature: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CallElementUpdate {
    pub exec_order: Update<i64>,
    pub required: Update<String>,
}

fn call_feature(doc: &Document, info: &CallInfo, call_id: i64) -> Result<i64> {
    let call = Registry::new(doc, info.call).get(&EntityKey::Id(call_id))?;
    Ok(get_i64(call, "FTYPE_ID").unwrap_or(-1))
}

/// Add an element row to an expression, comparison or distinct call
///
/// Exec order defaults to one past the call's current maximum; the
/// required flag (expression calls only) defaults to "Yes".
///
/// # Errors
///
/// - `NotFound` for an unknown call
/// - `InvalidReference` for an unknown element or feature
/// - `DuplicateCode` when the element row exists
pub fn add_call_element(doc: &mut Document, kind: EntityKind, params: AddCallElement) -> Result<()> {
    let info = element_call_info(kind)?;
    let parent_feature = call_feature(doc, &info, params.call_id)?;
    let ftype_id = element_feature_id(doc, kind, parent_feature, params.feature.as_deref())?;
    let felem_id = reference_id(
        doc,
        kind,
        "FELEM_ID",
        EntityKind::Element,
        &EntityKey::code(&params.element),
    )?;
    let exec_order = params.exec_order.unwrap_or_else(|| {
        doc.records(kind)
            .iter()
            .filter(|r| get_i64(r, info.id_field) == Some(params.call_id))
            .filter_map(|r| get_i64(r, "EXEC_ORDER"))
            .max()
            .unwrap_or(0)
            + 1
    });

    let mut row = record(json!({
        "FTYPE_ID": ftype_id,
        "FELEM_ID": felem_id,
        "EXEC_ORDER": exec_order,
    }));
    row.insert(info.id_field.to_string(), Value::from(params.call_id));
    if kind == EntityKind::ExpressionCallElement {
        let required = yes_no("FELEM_REQ", params.required.as_deref().unwrap_or("Yes"))?;
        row.insert("FELEM_REQ".to_string(), Value::from(required));
    }
    engine::insert(doc, kind, row)?;
    Ok(())
}

fn element_row_key(doc: &Document, kind: EntityKind, key: &CallElementKey) -> Result<EntityKey> {
    let info = element_call_info(kind)?;
    let parent_feature = call_feature(doc, &info, key.call_id)?;
    let ftype_id = match key.feature.as_deref().map(str::trim) {
        Some(f) if !f.is_empty() && !f.eq_ignore_ascii_case(PARENT_FEATURE) => {
            lookup_id(doc, EntityKind::Feature, &EntityKey::code(f))?
        }
        _ if kind == EntityKind::ExpressionCallElement => -1,
        _ => parent_feature,
    };
    let felem_id = lookup_id(doc, EntityKind::Element, &EntityKey::code(&key.element))?;
    Ok(EntityKey::fields([
        (info.id_field, Value::from(key.call_id)),
        ("FTYPE_ID", Value::from(ftype_id)),
        ("FELEM_ID", Value::from(felem_id)),
    ]))
}

/// # Errors
///
/// Returns `NotFound` when the call, element or row does not exist.
pub fn delete_call_element(
    doc: &mut Document,
    kind: EntityKind,
    key: &CallElementKey,
    policy: &dyn DeletePolicy,
) -> Result<DeleteReport> {
    let row = element_row_key(doc, kind, key)?;
    engine::delete(doc, kind, &row, policy)
}

/// # Errors
///
/// Returns `NotFound` when the row does not exist, `InvalidField` for a
/// required flag outside expression calls.
pub fn set_call_element(
    doc: &mut Document,
    kind: EntityKind,
    key: &CallElementKey,
    update: CallElementUpdate,
) -> Result<()> {
    let row = element_row_key(doc, kind, key)?;
    let required = match update.required {
        Update::Unchanged => Update::Unchanged,
        _ if kind != EntityKind::ExpressionCallElement => {
            return Err(ConfigError::InvalidField {
                field: "required".to_string(),
                reason: format!("not applicable to {}", kind),
            })
        }
        Update::Set(v) => Update::Set(yes_no("FELEM_REQ", &v)?.to_string()),
        Update::Clear => Update::Clear,
    };
    let patch = Patch::new()
        .update("EXEC_ORDER", update.exec_order)
        .update("FELEM_REQ", required);
    engine::update(doc, kind, &row, &patch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::RejectReferencedPolicy;

    fn doc() -> Document {
        Document::from_value(json!({"G2_CONFIG": {
            "CFG_FCLASS": [{"FCLASS_ID": 1, "FCLASS_CODE": "OTHER"}],
            "CFG_FELEM": [
                {"FELEM_ID": 1, "FELEM_CODE": "FIRST"},
                {"FELEM_ID": 2, "FELEM_CODE": "LAST"}
            ],
            "CFG_FTYPE": [{"FTYPE_ID": 1, "FTYPE_CODE": "NAME", "FCLASS_ID": 1}],
            "CFG_SFUNC": [{"SFUNC_ID": 1, "SFUNC_CODE": "PARSE_NAME"}],
            "CFG_EFUNC": [{"EFUNC_ID": 1, "EFUNC_CODE": "NAME_HASHER"}],
            "CFG_CFUNC": [{"CFUNC_ID": 1, "CFUNC_CODE": "CMP_NAME"}]
        }}))
        .unwrap()
    }

    fn standardize(feature: Option<&str>, element: Option<&str>) -> AddStandardizeCall {
        AddStandardizeCall {
            feature: feature.map(String::from),
            element: element.map(String::from),
            exec_order: None,
            function: "PARSE_NAME".to_string(),
        }
    }

    #[test]
    fn test_standardize_call_requires_exactly_one_binding() {
        let mut doc = doc();
        let both = add_standardize_call(&mut doc, standardize(Some("NAME"), Some("FIRST")));
        assert!(matches!(both, Err(ConfigError::InvalidField { .. })));
        let neither = add_standardize_call(&mut doc, standardize(Some("ALL"), Some("N/A")));
        assert!(matches!(neither, Err(ConfigError::InvalidField { .. })));
    }

    #[test]
    fn test_standardize_call_exec_order_increments_per_binding() {
        let mut doc = doc();
        add_standardize_call(&mut doc, standardize(Some("NAME"), None)).unwrap();
        add_standardize_call(&mut doc, standardize(Some("NAME"), None)).unwrap();
        add_standardize_call(&mut doc, standardize(None, Some("FIRST"))).unwrap();

        let orders: Vec<_> = doc
            .records(EntityKind::StandardizeCall)
            .iter()
            .map(|r| (r["FTYPE_ID"].as_i64(), r["FELEM_ID"].as_i64(), r["EXEC_ORDER"].as_i64()))
            .collect();
        assert_eq!(
            orders,
            vec![
                (Some(1), Some(-1), Some(1)),
                (Some(1), Some(-1), Some(2)),
                (Some(-1), Some(1), Some(1)),
            ]
        );

        let mut clash = standardize(Some("NAME"), None);
        clash.exec_order = Some(2);
        assert!(matches!(
            add_standardize_call(&mut doc, clash),
            Err(ConfigError::DuplicateCode { .. })
        ));
    }

    #[test]
    fn test_expression_call_writes_element_rows() {
        let mut doc = doc();
        let params: AddExpressionCall = serde_json::from_value(json!({
            "feature": "NAME",
            "function": "NAME_HASHER",
            "elementList": ["FIRST", {"element": "LAST", "required": "no", "feature": "NAME"}]
        }))
        .unwrap();
        let id = add_expression_call(&mut doc, params).unwrap();

        let rows = doc.records(EntityKind::ExpressionCallElement);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["EFCALL_ID"], id);
        assert_eq!(rows[0]["FTYPE_ID"], -1);
        assert_eq!(rows[0]["FELEM_REQ"], "Yes");
        assert_eq!(rows[1]["FTYPE_ID"], 1);
        assert_eq!(rows[1]["FELEM_REQ"], "No");
        assert_eq!(rows[1]["EXEC_ORDER"], 2);
        assert_eq!(doc.records(EntityKind::ExpressionCall)[0]["IS_VIRTUAL"], "No");
    }

    #[test]
    fn test_expression_call_with_unknown_element_writes_nothing() {
        let mut doc = doc();
        let params: AddExpressionCall = serde_json::from_value(json!({
            "feature": "NAME",
            "function": "NAME_HASHER",
            "elementList": ["FIRST", "MIDDLE"]
        }))
        .unwrap();
        let result = add_expression_call(&mut doc, params);
        assert!(matches!(result, Err(ConfigError::InvalidReference { .. })));
        assert!(doc.records(EntityKind::ExpressionCall).is_empty());
        assert!(doc.records(EntityKind::ExpressionCallElement).is_empty());
    }

    #[test]
    fn test_comparison_call_is_one_per_feature_and_owns_elements() {
        let mut doc = doc();
        let params = AddFeatureCall {
            feature: "NAME".to_string(),
            function: "CMP_NAME".to_string(),
            element_list: vec![CallElementSpec::Code("FIRST".to_string())],
        };
        let id = add_comparison_call(&mut doc, params.clone()).unwrap();
        assert_eq!(doc.records(EntityKind::ComparisonCallElement)[0]["FTYPE_ID"], 1);
        assert!(matches!(
            add_comparison_call(&mut doc, params),
            Err(ConfigError::DuplicateCode { .. })
        ));

        let report = delete_call(&mut doc, EntityKind::ComparisonCall, id, &RejectReferencedPolicy).unwrap();
        assert_eq!(report.removed, 2);
        assert!(doc.records(EntityKind::ComparisonCallElement).is_empty());
    }

    #[test]
    fn test_call_element_add_set_delete() {
        let mut doc = doc();
        let id = add_comparison_call(
            &mut doc,
            AddFeatureCall {
                feature: "NAME".to_string(),
                function: "CMP_NAME".to_string(),
                element_list: vec![],
            },
        )
        .unwrap();
        let kind = EntityKind::ComparisonCallElement;
        add_call_element(
            &mut doc,
            kind,
            AddCallElement {
                call_id: id,
                element: "LAST".to_string(),
                feature: None,
                exec_order: None,
                required: None,
            },
        )
        .unwrap();
        let key = CallElementKey {
            call_id: id,
            element: "last".to_string(),
            feature: None,
        };
        set_call_element(
            &mut doc,
            kind,
            &key,
            CallElementUpdate {
                exec_order: Update::Set(5),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(doc.records(kind)[0]["EXEC_ORDER"], 5);

        let bad = CallElementUpdate {
            required: Update::Set("Yes".to_string()),
            ..Default::default()
        };
        assert!(set_call_element(&mut doc, kind, &key, bad).is_err());

        delete_call_element(&mut doc, kind, &key, &RejectReferencedPolicy).unwrap();
        assert!(doc.records(kind).is_empty());
    }

    #[test]
    fn test_call_kind_checks() {
        let mut doc = doc();
        assert!(matches!(
            delete_call(&mut doc, EntityKind::Feature, 1, &RejectReferencedPolicy),
            Err(ConfigError::UnsupportedOperation { .. })
        ));
        assert!(element_call_info(EntityKind::StandardizeCall).is_err());
    }
}
