//! Behavior overrides (`CFG_FBOVR`): a feature behaving differently for one
//! usage type, e.g. a `PHONE` with usage `MOBILE`

use serde::Deserialize;
use serde_json::{json, Value};

use crate::errors::Result;
use crate::model::record::flag;
use crate::model::Document;
use crate::ops::engine::{self, DeleteReport};
use crate::ops::feature_ops::Behavior;
use crate::ops::patch::Patch;
use crate::ops::{lookup_id, record, reference_id};
use crate::policy::DeletePolicy;
use crate::registry::EntityKey;
use g2config_core_types::EntityKind;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddBehaviorOverride {
    pub feature: String,
    pub usage_type: String,
    pub behavior: String,
}

/// Names one override
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BehaviorOverrideKey {
    pub feature: String,
    pub usage_type: String,
}

impl BehaviorOverrideKey {
    pub fn new(feature: impl Into<String>, usage_type: impl Into<String>) -> Self {
        Self {
            feature: feature.into(),
            usage_type: usage_type.into(),
        }
    }
}

fn override_key(doc: &Document, key: &BehaviorOverrideKey) -> Result<EntityKey> {
    let ftype_id = lookup_id(doc, EntityKind::Feature, &EntityKey::code(&key.feature))?;
    Ok(EntityKey::fields([
        ("FTYPE_ID", Value::from(ftype_id)),
        ("UTYPE_CODE", Value::from(key.usage_type.trim().to_uppercase())),
    ]))
}

/// # Errors
///
/// - `InvalidReference` for an unknown feature
/// - `InvalidField` for a bad behavior code
/// - `DuplicateCode` when the feature already has an override for the usage type
pub fn add_behavior_override(doc: &mut Document, params: AddBehaviorOverride) -> Result<()> {
    let kind = EntityKind::BehaviorOverride;
    let ftype_id = reference_id(
        doc,
        kind,
        "FTYPE_ID",
        EntityKind::Feature,
        &EntityKey::code(&params.feature),
    )?;
    let behavior = Behavior::parse(&params.behavior)?;
    let rec = record(json!({
        "FTYPE_ID": ftype_id,
        "UTYPE_CODE": params.usage_type.trim().to_uppercase(),
        "FTYPE_FREQ": behavior.frequency,
        "FTYPE_EXCL": flag(behavior.exclusive),
        "FTYPE_STAB": flag(behavior.stable),
    }));
    engine::insert(doc, kind, rec)?;
    Ok(())
}

/// # Errors
///
/// Returns `NotFound` when the feature or override does not exist.
pub fn delete_behavior_override(
    doc: &mut Document,
    key: &BehaviorOverrideKey,
    policy: &dyn DeletePolicy,
) -> Result<DeleteReport> {
    let key = override_key(doc, key)?;
    engine::delete(doc, EntityKind::BehaviorOverride, &key, policy)
}

/// Replace the behavior of an existing override
///
/// # Errors
///
/// Returns `NotFound` or `InvalidField`.
pub fn set_behavior_override(doc: &mut Document, key: &BehaviorOverrideKey, behavior: &str) -> Result<()> {
    let key = override_key(doc, key)?;
    let behavior = Behavior::parse(behavior)?;
    let patch = Patch::new()
        .set("FTYPE_FREQ", behavior.frequency)
        .set("FTYPE_EXCL", flag(behavior.exclusive))
        .set("FTYPE_STAB", flag(behavior.stable));
    engine::update(doc, EntityKind::BehaviorOverride, &key, &patch)
}
