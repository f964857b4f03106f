//! Comparison thresholds (`CFG_CFRTN`) and generic thresholds
//! (`CFG_GENERIC_THRESHOLD`)
//!
//! A comparison threshold maps one return code of a comparison function to
//! its five scores, optionally for a single feature. A generic threshold
//! caps candidates and scoring for a behavior within a generic plan. In both
//! cases an absent feature (or "ALL") is stored as feature id `0`.

use serde::Deserialize;
use serde_json::{json, Value};

use crate::errors::{ConfigError, Result};
use crate::model::record::{get_i64, yes_no};
use crate::model::Document;
use crate::ops::engine::{self, DeleteReport};
use crate::ops::patch::{Patch, Update};
use crate::ops::{existing_feature_or_wildcard, feature_or_wildcard, lookup_id, record, reference_id};
use crate::policy::DeletePolicy;
use crate::registry::EntityKey;
use g2config_core_types::EntityKind;

/// Feature id meaning "every feature"
pub const ALL_FEATURES_ID: i64 = 0;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddComparisonThreshold {
    /// Comparison function code
    pub function: String,
    pub return_code: String,
    #[serde(default)]
    pub feature: Option<String>,
    #[serde(default)]
    pub exec_order: Option<i64>,
    #[serde(default)]
    pub same_score: Option<i64>,
    #[serde(default)]
    pub close_score: Option<i64>,
    #[serde(default)]
    pub likely_score: Option<i64>,
    #[serde(default)]
    pub plausible_score: Option<i64>,
    #[serde(default)]
    pub unlikely_score: Option<i64>,
}

impl AddComparisonThreshold {
    pub fn new(function: impl Into<String>, return_code: impl Into<String>) -> Self {
        Self {
            function: function.into(),
            return_code: return_code.into(),
            feature: None,
            exec_order: None,
            same_score: None,
            close_score: None,
            likely_score: None,
            plausible_score: None,
            unlikely_score: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ComparisonThresholdUpdate {
    pub exec_order: Update<i64>,
    pub same_score: Update<i64>,
    pub close_score: Update<i64>,
    pub likely_score: Update<i64>,
    pub plausible_score: Update<i64>,
    pub unlikely_score: Update<i64>,
}

/// Add a comparison threshold, returning its id
///
/// Exec order defaults to one past the function's highest.
///
/// # Errors
///
/// - `InvalidReference` for an unknown function or feature
/// - `DuplicateCode` when function, feature and return code already exist
pub fn add_comparison_threshold(doc: &mut Document, params: AddComparisonThreshold) -> Result<i64> {
    let kind = EntityKind::ComparisonThreshold;
    let cfunc_id = reference_id(
        doc,
        kind,
        "CFUNC_ID",
        EntityKind::ComparisonFunction,
        &EntityKey::code(&params.function),
    )?;
    let ftype_id = feature_or_wildcard(doc, kind, "FTYPE_ID", params.feature.as_deref(), ALL_FEATURES_ID)?;
    let exec_order = params.exec_order.unwrap_or_else(|| {
        doc.records(kind)
            .iter()
            .filter(|r| get_i64(r, "CFUNC_ID") == Some(cfunc_id))
            .filter_map(|r| get_i64(r, "EXEC_ORDER"))
            .max()
            .unwrap_or(0)
            + 1
    });

    let mut rec = record(json!({
        "CFUNC_ID": cfunc_id,
        "FTYPE_ID": ftype_id,
        "CFUNC_RTNVAL": params.return_code.trim().to_uppercase(),
        "EXEC_ORDER": exec_order,
    }));
    let scores = [
        ("SAME_SCORE", params.same_score),
        ("CLOSE_SCORE", params.close_score),
        ("LIKELY_SCORE", params.likely_score),
        ("PLAUSIBLE_SCORE", params.plausible_score),
        ("UN_LIKELY_SCORE", params.unlikely_score),
    ];
    for (field, score) in scores {
        if let Some(score) = score {
            rec.insert(field.to_string(), Value::from(score));
        }
    }

    Ok(engine::insert(doc, kind, rec)?.unwrap_or_default())
}

/// # Errors
///
/// Returns `NotFound` for an unknown id.
pub fn delete_comparison_threshold(
    doc: &mut Document,
    id: i64,
    policy: &dyn DeletePolicy,
) -> Result<DeleteReport> {
    engine::delete(doc, EntityKind::ComparisonThreshold, &EntityKey::Id(id), policy)
}

/// # Errors
///
/// Returns `NotFound` for an unknown id, `InvalidField` for a cleared score.
pub fn set_comparison_threshold(
    doc: &mut Document,
    id: i64,
    update: ComparisonThresholdUpdate,
) -> Result<()> {
    let patch = Patch::new()
        .update("EXEC_ORDER", update.exec_order)
        .update("SAME_SCORE", update.same_score)
        .update("CLOSE_SCORE", update.close_score)
        .update("LIKELY_SCORE", update.likely_score)
        .update("PLAUSIBLE_SCORE", update.plausible_score)
        .update("UN_LIKELY_SCORE", update.unlikely_score);
    engine::update(doc, EntityKind::ComparisonThreshold, &EntityKey::Id(id), &patch)
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddGenericThreshold {
    pub plan: String,
    pub behavior: String,
    #[serde(default)]
    pub feature: Option<String>,
    pub candidate_cap: i64,
    pub scoring_cap: i64,
    #[serde(default)]
    pub send_to_redo: Option<String>,
}

/// Names one generic threshold
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenericThresholdKey {
    pub plan: String,
    pub behavior: String,
    #[serde(default)]
    pub feature: Option<String>,
}

impl GenericThresholdKey {
    pub fn new(plan: impl Into<String>, behavior: impl Into<String>) -> Self {
        Self {
            plan: plan.into(),
            behavior: behavior.into(),
            feature: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenericThresholdUpdate {
    pub candidate_cap: Update<i64>,
    pub scoring_cap: Update<i64>,
    pub send_to_redo: Update<String>,
}

/// Generic threshold behaviors are stored as given, uppercased
fn behavior_code(raw: &str) -> Result<String> {
    let code = raw.trim().to_uppercase();
    if code.is_empty() {
        return Err(ConfigError::MissingField {
            field: "BEHAVIOR".to_string(),
        });
    }
    Ok(code)
}

fn threshold_key(doc: &Document, key: &GenericThresholdKey) -> Result<EntityKey> {
    let gplan_id = lookup_id(doc, EntityKind::GenericPlan, &EntityKey::code(&key.plan))?;
    let behavior = behavior_code(&key.behavior)?;
    let ftype_id = existing_feature_or_wildcard(doc, key.feature.as_deref(), ALL_FEATURES_ID)?;
    Ok(EntityKey::fields([
        ("GPLAN_ID", Value::from(gplan_id)),
        ("BEHAVIOR", Value::from(behavior)),
        ("FTYPE_ID", Value::from(ftype_id)),
    ]))
}

/// Add a generic threshold
///
/// # Errors
///
/// - `InvalidReference` for an unknown plan or feature
/// - `MissingField` for an empty behavior
/// - `InvalidField` for a redo flag other than Yes/No
/// - `DuplicateCode` when plan, behavior and feature already have a threshold
pub fn add_generic_threshold(doc: &mut Document, params: AddGenericThreshold) -> Result<()> {
    let kind = EntityKind::GenericThreshold;
    let gplan_id = reference_id(
        doc,
        kind,
        "GPLAN_ID",
        EntityKind::GenericPlan,
        &EntityKey::code(&params.plan),
    )?;
    let behavior = behavior_code(&params.behavior)?;
    let ftype_id = feature_or_wildcard(doc, kind, "FTYPE_ID", params.feature.as_deref(), ALL_FEATURES_ID)?;
    let send_to_redo = yes_no("SEND_TO_REDO", params.send_to_redo.as_deref().unwrap_or("Yes"))?;

    let rec = record(json!({
        "GPLAN_ID": gplan_id,
        "BEHAVIOR": behavior,
        "FTYPE_ID": ftype_id,
        "CANDIDATE_CAP": params.candidate_cap,
        "SCORING_CAP": params.scoring_cap,
        "SEND_TO_REDO": send_to_redo,
    }));
    engine::insert(doc, kind, rec)?;
    Ok(())
}

/// # Errors
///
/// Returns `NotFound` when the plan, feature or threshold does not exist.
pub fn delete_generic_threshold(
    doc: &mut Document,
    key: &GenericThresholdKey,
    policy: &dyn DeletePolicy,
) -> Result<DeleteReport> {
    let key = threshold_key(doc, key)?;
    engine::delete(doc, EntityKind::GenericThreshold, &key, policy)
}

/// # Errors
///
/// Returns `NotFound` for a missing threshold, `InvalidField` for a redo
/// flag other than Yes/No.
pub fn set_generic_threshold(
    doc: &mut Document,
    key: &GenericThresholdKey,
    update: GenericThresholdUpdate,
) -> Result<()> {
    let key = threshold_key(doc, key)?;
    let send_to_redo = match update.send_to_redo {
        Update::Set(v) => Update::Set(yes_no("SEND_TO_REDO", &v)?),
        Update::Clear => Update::Clear,
        Update::Unchanged => Update::Unchanged,
    };
    let patch = Patch::new()
        .update("CANDIDATE_CAP", update.candidate_cap)
        .update("SCORING_CAP", update.scoring_cap)
        .update("SEND_TO_REDO", send_to_redo);
    engine::update(doc, EntityKind::GenericThreshold, &key, &patch)
}
