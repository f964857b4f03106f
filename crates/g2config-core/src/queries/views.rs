//! Resolved listing views
//!
//! A view replaces the ids inside a record with the codes they point at and
//! renames fields to the camelCase names used by the configuration tool's
//! listings. Feature id `0`/`-1` renders as "ALL" and element id `-1` as
//! "N/A".

use serde_json::{json, Map, Value};

use crate::errors::Result;
use crate::model::record::{get_i64, get_str};
use crate::model::{descriptor, Document};
use crate::ops::call_ops::call_info;
use crate::ops::feature_ops::Behavior;
use crate::ops::{ALL_FEATURES, NO_ELEMENT};
use crate::queries::entity_queries::{list_entities, ListFilter};
use crate::registry::Registry;
use g2config_core_types::EntityKind;

fn code_of(doc: &Document, kind: EntityKind, id: Option<i64>) -> Value {
    match id {
        Some(id) if id > 0 => Registry::new(doc, kind)
            .code_of(id)
            .map_or(Value::Null, Value::from),
        _ => Value::Null,
    }
}

fn feature_code(doc: &Document, id: Option<i64>) -> Value {
    match id {
        Some(id) if id > 0 => code_of(doc, EntityKind::Feature, Some(id)),
        _ => Value::from(ALL_FEATURES),
    }
}

fn element_code(doc: &Document, id: Option<i64>) -> Value {
    match id {
        Some(id) if id > 0 => code_of(doc, EntityKind::Element, Some(id)),
        _ => Value::from(NO_ELEMENT),
    }
}

fn field(record: &Value, name: &str) -> Value {
    record.get(name).cloned().unwrap_or(Value::Null)
}

fn feature_view(doc: &Document, record: &Value) -> Value {
    let ftype_id = get_i64(record, "FTYPE_ID");
    let first_call = |kind: EntityKind| {
        doc.records(kind)
            .iter()
            .filter(|c| get_i64(c, "FTYPE_ID") == ftype_id)
            .min_by_key(|c| get_i64(c, "EXEC_ORDER").unwrap_or_default())
    };
    let function_code = |call: Option<&Value>, call_kind: EntityKind| -> Value {
        call_info(call_kind)
            .ok()
            .and_then(|info| call.map(|c| code_of(doc, info.function, get_i64(c, info.function_field))))
            .unwrap_or(Value::Null)
    };
    let sfcall = first_call(EntityKind::StandardizeCall);
    let efcall = first_call(EntityKind::ExpressionCall);
    let cfcall = first_call(EntityKind::ComparisonCall);

    let uses = |call: Option<&Value>, element_kind: EntityKind, id_field: &str, felem_id: Option<i64>| {
        call.and_then(|c| get_i64(c, id_field)).is_some_and(|call_id| {
            doc.records(element_kind).iter().any(|b| {
                get_i64(b, id_field) == Some(call_id) && get_i64(b, "FELEM_ID") == felem_id
            })
        })
    };
    let yes = |b: bool| if b { "Yes" } else { "No" };

    let mut boms: Vec<&Value> = doc
        .records(EntityKind::FeatureElement)
        .iter()
        .filter(|b| get_i64(b, "FTYPE_ID") == ftype_id)
        .collect();
    boms.sort_by_key(|b| get_i64(b, "EXEC_ORDER").unwrap_or_default());
    let element_list: Vec<Value> = boms
        .into_iter()
        .map(|b| {
            let felem_id = get_i64(b, "FELEM_ID");
            json!({
                "element": element_code(doc, felem_id),
                "expressed": yes(uses(efcall, EntityKind::ExpressionCallElement, "EFCALL_ID", felem_id)),
                "compared": yes(uses(cfcall, EntityKind::ComparisonCallElement, "CFCALL_ID", felem_id)),
                "derived": get_str(b, "DERIVED").unwrap_or("No"),
                "display": yes(get_i64(b, "DISPLAY_LEVEL").unwrap_or(1) != 0),
            })
        })
        .collect();

    json!({
        "id": ftype_id,
        "feature": field(record, "FTYPE_CODE"),
        "class": code_of(doc, EntityKind::FeatureClass, get_i64(record, "FCLASS_ID")),
        "behavior": Behavior::from_record(record).code(),
        "anonymize": field(record, "ANONYMIZE"),
        "candidates": field(record, "USED_FOR_CAND"),
        "standardize": function_code(sfcall, EntityKind::StandardizeCall),
        "expression": function_code(efcall, EntityKind::ExpressionCall),
        "comparison": function_code(cfcall, EntityKind::ComparisonCall),
        "matchKey": field(record, "SHOW_IN_MATCH_KEY"),
        "version": field(record, "VERSION"),
        "elementList": element_list,
    })
}

fn call_view(doc: &Document, kind: EntityKind, record: &Value) -> Result<Value> {
    let info = call_info(kind)?;
    let mut view = Map::new();
    view.insert("id".to_string(), field(record, info.id_field));
    view.insert(
        "feature".to_string(),
        feature_code(doc, get_i64(record, "FTYPE_ID")),
    );
    if matches!(kind, EntityKind::StandardizeCall | EntityKind::ExpressionCall) {
        view.insert(
            "element".to_string(),
            element_code(doc, get_i64(record, "FELEM_ID")),
        );
    }
    view.insert("execOrder".to_string(), field(record, "EXEC_ORDER"));
    view.insert(
        "function".to_string(),
        code_of(doc, info.function, get_i64(record, info.function_field)),
    );
    if kind == EntityKind::ExpressionCall {
        view.insert("isVirtual".to_string(), field(record, "IS_VIRTUAL"));
        let efeat = get_i64(record, "EFEAT_FTYPE_ID");
        view.insert(
            "expressionFeature".to_string(),
            match efeat {
                Some(id) if id > 0 => code_of(doc, EntityKind::Feature, Some(id)),
                _ => Value::from(NO_ELEMENT),
            },
        );
    }
    if let Some(element_kind) = info.element {
        let call_id = get_i64(record, info.id_field);
        let mut rows: Vec<&Value> = doc
            .records(element_kind)
            .iter()
            .filter(|r| get_i64(r, info.id_field) == call_id)
            .collect();
        rows.sort_by_key(|r| get_i64(r, "EXEC_ORDER").unwrap_or_default());
        let elements: Vec<Value> = rows
            .into_iter()
            .map(|r| {
                let mut e = Map::new();
                e.insert("element".to_string(), element_code(doc, get_i64(r, "FELEM_ID")));
                let ftype = get_i64(r, "FTYPE_ID");
                e.insert(
                    "feature".to_string(),
                    match ftype {
                        Some(id) if id > 0 => code_of(doc, EntityKind::Feature, Some(id)),
                        _ => Value::from("PARENT"),
                    },
                );
                if let Some(req) = r.get("FELEM_REQ") {
                    e.insert("required".to_string(), req.clone());
                }
                Value::Object(e)
            })
            .collect();
        view.insert("elementList".to_string(), Value::from(elements));
    }
    Ok(Value::Object(view))
}

fn function_view(kind: EntityKind, record: &Value) -> Value {
    let desc = descriptor(kind);
    let mut view = Map::new();
    view.insert(
        "id".to_string(),
        desc.id_field.map_or(Value::Null, |f| field(record, f)),
    );
    view.insert(
        "function".to_string(),
        desc.code_field.map_or(Value::Null, |f| field(record, f)),
    );
    view.insert("connectStr".to_string(), field(record, "CONNECT_STR"));
    view.insert("language".to_string(), field(record, "LANGUAGE"));
    if let Some(anon) = record.get("ANON_SUPPORT") {
        view.insert("anonSupport".to_string(), anon.clone());
    }
    Value::Object(view)
}

/// Resolved view of one record
///
/// # Errors
///
/// Only fails on internal inconsistencies between kind tables.
pub fn view(doc: &Document, kind: EntityKind, record: &Value) -> Result<Value> {
    use EntityKind as K;
    Ok(match kind {
        K::DataSource => json!({
            "id": field(record, "DSRC_ID"),
            "dataSource": field(record, "DSRC_CODE"),
            "description": field(record, "DSRC_DESC"),
            "retentionLevel": field(record, "RETENTION_LEVEL"),
            "conversational": field(record, "CONVERSATIONAL"),
            "reliability": field(record, "DSRC_RELY"),
        }),
        K::Attribute => json!({
            "id": field(record, "ATTR_ID"),
            "attribute": field(record, "ATTR_CODE"),
            "class": field(record, "ATTR_CLASS"),
            "feature": field(record, "FTYPE_CODE"),
            "element": field(record, "FELEM_CODE"),
            "required": field(record, "FELEM_REQ"),
            "default": field(record, "DEFAULT_VALUE"),
            "internal": field(record, "INTERNAL"),
        }),
        K::Feature => feature_view(doc, record),
        K::FeatureClass => json!({
            "id": field(record, "FCLASS_ID"),
            "featureClass": field(record, "FCLASS_CODE"),
        }),
        K::Element => json!({
            "id": field(record, "FELEM_ID"),
            "element": field(record, "FELEM_CODE"),
            "datatype": field(record, "DATA_TYPE"),
            "tokenize": field(record, "TOKENIZE"),
        }),
        K::FeatureElement => json!({
            "feature": feature_code(doc, get_i64(record, "FTYPE_ID")),
            "element": element_code(doc, get_i64(record, "FELEM_ID")),
            "execOrder": field(record, "EXEC_ORDER"),
            "displayLevel": field(record, "DISPLAY_LEVEL"),
            "displayDelim": field(record, "DISPLAY_DELIM"),
            "derived": field(record, "DERIVED"),
        }),
        k if k.is_function() => function_view(k, record),
        k if k.is_call() => call_view(doc, k, record)?,
        k if k.is_call_element() => {
            let info = crate::ops::call_ops::element_call_info(k)?;
            json!({
                "callId": field(record, info.id_field),
                "feature": match get_i64(record, "FTYPE_ID") {
                    Some(id) if id > 0 => code_of(doc, K::Feature, Some(id)),
                    _ => Value::from("PARENT"),
                },
                "element": element_code(doc, get_i64(record, "FELEM_ID")),
                "execOrder": field(record, "EXEC_ORDER"),
                "required": field(record, "FELEM_REQ"),
            })
        }
        K::ComparisonThreshold => json!({
            "id": field(record, "CFRTN_ID"),
            "function": code_of(doc, K::ComparisonFunction, get_i64(record, "CFUNC_ID")),
            "returnOrder": field(record, "EXEC_ORDER"),
            "scoreName": field(record, "CFUNC_RTNVAL"),
            "feature": feature_code(doc, get_i64(record, "FTYPE_ID")),
            "sameScore": field(record, "SAME_SCORE"),
            "closeScore": field(record, "CLOSE_SCORE"),
            "likelyScore": field(record, "LIKELY_SCORE"),
            "plausibleScore": field(record, "PLAUSIBLE_SCORE"),
            "unlikelyScore": field(record, "UN_LIKELY_SCORE"),
        }),
        K::GenericThreshold => json!({
            "plan": code_of(doc, K::GenericPlan, get_i64(record, "GPLAN_ID")),
            "behavior": field(record, "BEHAVIOR"),
            "feature": feature_code(doc, get_i64(record, "FTYPE_ID")),
            "candidateCap": field(record, "CANDIDATE_CAP"),
            "scoringCap": field(record, "SCORING_CAP"),
            "sendToRedo": field(record, "SEND_TO_REDO"),
        }),
        K::GenericPlan => json!({
            "id": field(record, "GPLAN_ID"),
            "plan": field(record, "GPLAN_CODE"),
            "description": field(record, "GPLAN_DESC"),
        }),
        K::Fragment => json!({
            "id": field(record, "ERFRAG_ID"),
            "fragment": field(record, "ERFRAG_CODE"),
            "source": field(record, "ERFRAG_SOURCE"),
            "depends": field(record, "ERFRAG_DEPENDS"),
        }),
        K::Rule => {
            let resolves = get_str(record, "RESOLVE").is_some_and(|r| r.eq_ignore_ascii_case("yes"));
            json!({
                "id": field(record, "ERRULE_ID"),
                "rule": field(record, "ERRULE_CODE"),
                "resolve": field(record, "RESOLVE"),
                "relate": field(record, "RELATE"),
                "rtypeId": field(record, "RTYPE_ID"),
                "fragment": field(record, "QUAL_ERFRAG_CODE"),
                "disqualifier": field(record, "DISQ_ERFRAG_CODE"),
                "tier": if resolves { field(record, "ERRULE_TIER") } else { Value::Null },
            })
        }
        K::BehaviorOverride => json!({
            "feature": feature_code(doc, get_i64(record, "FTYPE_ID")),
            "usageType": field(record, "UTYPE_CODE"),
            "behavior": Behavior::from_record(record).code(),
        }),
        _ => record.clone(),
    })
}

/// List resolved views of the records matching `filter`
///
/// # Errors
///
/// Same as [`list_entities`].
pub fn list_views(doc: &Document, kind: EntityKind, filter: &ListFilter) -> Result<Vec<Value>> {
    list_entities(doc, kind, filter)?
        .iter()
        .map(|r| view(doc, kind, r))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc() -> Document {
        Document::from_value(json!({"G2_CONFIG": {
            "CFG_FCLASS": [{"FCLASS_ID": 1, "FCLASS_CODE": "NAME"}],
            "CFG_FELEM": [
                {"FELEM_ID": 1, "FELEM_CODE": "FULL"},
                {"FELEM_ID": 2, "FELEM_CODE": "LAST"}
            ],
            "CFG_FTYPE": [{"FTYPE_ID": 1, "FTYPE_CODE": "NAME", "FCLASS_ID": 1,
                           "FTYPE_FREQ": "NAME", "FTYPE_EXCL": "No", "FTYPE_STAB": "No",
                           "USED_FOR_CAND": "No", "SHOW_IN_MATCH_KEY": "Yes", "VERSION": 1}],
            "CFG_FBOM": [
                {"FTYPE_ID": 1, "FELEM_ID": 2, "EXEC_ORDER": 2, "DISPLAY_LEVEL": 0, "DERIVED": "No"},
                {"FTYPE_ID": 1, "FELEM_ID": 1, "EXEC_ORDER": 1, "DISPLAY_LEVEL": 1, "DERIVED": "No"}
            ],
            "CFG_SFUNC": [{"SFUNC_ID": 1, "SFUNC_CODE": "PARSE_NAME"}],
            "CFG_CFUNC": [{"CFUNC_ID": 1, "CFUNC_CODE": "CMP_NAME"}],
            "CFG_SFCALL": [{"SFCALL_ID": 3, "FTYPE_ID": -1, "FELEM_ID": 1, "SFUNC_ID": 1, "EXEC_ORDER": 1}],
            "CFG_CFCALL": [{"CFCALL_ID": 1, "FTYPE_ID": 1, "CFUNC_ID": 1, "EXEC_ORDER": 1}],
            "CFG_CFBOM": [{"CFCALL_ID": 1, "FTYPE_ID": 1, "FELEM_ID": 2, "EXEC_ORDER": 1}],
            "CFG_CFRTN": [{"CFRTN_ID": 1, "CFUNC_ID": 1, "FTYPE_ID": 0, "CFUNC_RTNVAL": "FULL",
                           "EXEC_ORDER": 1, "SAME_SCORE": 100}]
        }}))
        .unwrap()
    }

    #[test]
    fn test_feature_view_resolves_functions_and_elements() {
        let doc = doc();
        let feature = doc.records(EntityKind::Feature)[0].clone();
        let v = view(&doc, EntityKind::Feature, &feature).unwrap();
        assert_eq!(v["class"], "NAME");
        assert_eq!(v["behavior"], "NAME");
        assert_eq!(v["comparison"], "CMP_NAME");
        assert_eq!(v["standardize"], Value::Null);
        assert_eq!(v["elementList"][0]["element"], "FULL");
        assert_eq!(v["elementList"][1]["compared"], "Yes");
        assert_eq!(v["elementList"][1]["display"], "No");
    }

    #[test]
    fn test_call_views_render_wildcards() {
        let doc = doc();
        let calls = list_views(&doc, EntityKind::StandardizeCall, &ListFilter::default()).unwrap();
        assert_eq!(calls[0]["feature"], "ALL");
        assert_eq!(calls[0]["element"], "FULL");
        assert_eq!(calls[0]["function"], "PARSE_NAME");

        let calls = list_views(&doc, EntityKind::ComparisonCall, &ListFilter::default()).unwrap();
        assert_eq!(calls[0]["elementList"][0]["element"], "LAST");
        assert!(calls[0].get("element").is_none());
    }

    #[test]
    fn test_threshold_view() {
        let doc = doc();
        let rows = list_views(&doc, EntityKind::ComparisonThreshold, &ListFilter::default()).unwrap();
        assert_eq!(rows[0]["function"], "CMP_NAME");
        assert_eq!(rows[0]["feature"], "ALL");
        assert_eq!(rows[0]["sameScore"], 100);
        assert_eq!(rows[0]["closeScore"], Value::Null);
    }
}
