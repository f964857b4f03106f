//! Generic plans (`CFG_GPLAN`)
//!
//! A plan owns its generic thresholds: deleting the plan removes them, and
//! cloning copies them under the new plan id.

use serde::Deserialize;
use serde_json::{json, Value};

use crate::errors::Result;
use crate::model::record::{get_i64, normalize_code};
use crate::model::Document;
use crate::ops::engine::{self, DeleteReport};
use crate::ops::patch::{Patch, Update};
use crate::ops::{atomically, lookup_id, record};
use crate::policy::DeletePolicy;
use crate::registry::EntityKey;
use g2config_core_types::EntityKind;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddPlan {
    #[serde(alias = "code")]
    pub plan: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClonePlan {
    pub source: String,
    pub plan: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlanUpdate {
    pub description: Update<String>,
}

/// Add an empty plan, returning its id
///
/// # Errors
///
/// Returns `DuplicateCode` when the code exists.
pub fn add_plan(doc: &mut Document, params: AddPlan) -> Result<i64> {
    let code = normalize_code("GPLAN_CODE", &params.plan)?;
    let description = params.description.unwrap_or_else(|| code.clone());
    let rec = record(json!({"GPLAN_CODE": code, "GPLAN_DESC": description}));
    Ok(engine::insert(doc, EntityKind::GenericPlan, rec)?.unwrap_or_default())
}

/// Copy a plan and all of its thresholds under a new code
///
/// # Errors
///
/// Returns `NotFound` for an unknown source and `DuplicateCode` when the new
/// code exists.
pub fn clone_plan(doc: &mut Document, params: ClonePlan) -> Result<i64> {
    let source_id = lookup_id(doc, EntityKind::GenericPlan, &EntityKey::code(&params.source))?;
    let thresholds: Vec<Value> = doc
        .records(EntityKind::GenericThreshold)
        .iter()
        .filter(|t| get_i64(t, "GPLAN_ID") == Some(source_id))
        .cloned()
        .collect();

    atomically(doc, |doc| {
        let plan_id = add_plan(
            doc,
            AddPlan {
                plan: params.plan,
                description: params.description,
            },
        )?;
        for threshold in thresholds {
            let mut rec = record(threshold);
            rec.insert("GPLAN_ID".to_string(), Value::from(plan_id));
            engine::insert(doc, EntityKind::GenericThreshold, rec)?;
        }
        Ok(plan_id)
    })
}

/// Delete a plan together with its thresholds
///
/// # Errors
///
/// Returns `NotFound` for an unknown plan.
pub fn delete_plan(doc: &mut Document, code: &str, policy: &dyn DeletePolicy) -> Result<DeleteReport> {
    engine::delete(doc, EntityKind::GenericPlan, &EntityKey::code(code), policy)
}

/// # Errors
///
/// Returns `NotFound` for an unknown plan.
pub fn set_plan(doc: &mut Document, code: &str, update: PlanUpdate) -> Result<()> {
    let patch = Patch::new().update("GPLAN_DESC", update.description);
    engine::update(doc, EntityKind::GenericPlan, &EntityKey::code(code), &patch)
}
