//! Resolution rules (`CFG_ERRULE`)
//!
//! A rule names a qualifying fragment and an optional disqualifying fragment
//! by code, and says whether a match resolves or only relates. The tier is
//! only kept for resolving rules.

use serde::Deserialize;
use serde_json::{json, Value};

use crate::errors::Result;
use crate::model::record::{normalize_code, yes_no};
use crate::model::Document;
use crate::ops::engine::{self, DeleteReport};
use crate::ops::patch::{Patch, Update};
use crate::ops::record;
use crate::policy::DeletePolicy;
use crate::registry::{EntityKey, Registry};
use g2config_core_types::EntityKind;

/// Relationship type assigned when none is given
pub const DEFAULT_RTYPE_ID: i64 = 1;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddRule {
    #[serde(alias = "code")]
    pub rule: String,
    #[serde(default)]
    pub resolve: Option<String>,
    #[serde(default)]
    pub relate: Option<String>,
    #[serde(default)]
    pub rtype_id: Option<i64>,
    /// Qualifying fragment code
    #[serde(default)]
    pub fragment: Option<String>,
    /// Disqualifying fragment code
    #[serde(default)]
    pub disqualifier: Option<String>,
    #[serde(default)]
    pub tier: Option<i64>,
}

impl AddRule {
    pub fn new(code: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self {
            rule: code.into(),
            resolve: None,
            relate: None,
            rtype_id: None,
            fragment: Some(fragment.into()),
            disqualifier: None,
            tier: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RuleUpdate {
    pub resolve: Update<String>,
    pub relate: Update<String>,
    pub rtype_id: Update<i64>,
    pub fragment: Update<String>,
    pub disqualifier: Update<String>,
    pub tier: Update<i64>,
}

fn fragment_code(raw: Option<String>) -> Option<String> {
    raw.map(|c| c.trim().to_uppercase()).filter(|c| !c.is_empty())
}

/// Add a rule, returning its id
///
/// Resolve defaults to "Yes", relate to "No".
///
/// # Errors
///
/// - `DuplicateCode` when the code exists
/// - `InvalidField` for a resolve or relate flag other than Yes/No
/// - `InvalidReference` for an unknown fragment code
pub fn add_rule(doc: &mut Document, params: AddRule) -> Result<i64> {
    let code = normalize_code("ERRULE_CODE", &params.rule)?;
    let resolve = yes_no("RESOLVE", params.resolve.as_deref().unwrap_or("Yes"))?;
    let relate = yes_no("RELATE", params.relate.as_deref().unwrap_or("No"))?;
    let tier = if resolve == "Yes" { params.tier } else { None };
    let rec = record(json!({
        "ERRULE_CODE": code,
        "RESOLVE": resolve,
        "RELATE": relate,
        "RTYPE_ID": params.rtype_id.unwrap_or(DEFAULT_RTYPE_ID),
        "QUAL_ERFRAG_CODE": fragment_code(params.fragment),
        "DISQ_ERFRAG_CODE": fragment_code(params.disqualifier),
        "ERRULE_TIER": tier,
    }));
    Ok(engine::insert(doc, EntityKind::Rule, rec)?.unwrap_or_default())
}

/// # Errors
///
/// Returns `NotFound` for an unknown rule.
pub fn delete_rule(doc: &mut Document, code: &str, policy: &dyn DeletePolicy) -> Result<DeleteReport> {
    engine::delete(doc, EntityKind::Rule, &EntityKey::code(code), policy)
}

/// Update a rule; switching resolve to "No" drops the tier
///
/// # Errors
///
/// Returns `NotFound`, `InvalidField` or `InvalidReference`.
pub fn set_rule(doc: &mut Document, code: &str, update: RuleUpdate) -> Result<()> {
    let flag = |field: &str, u: Update<String>| -> Result<Update<&'static str>> {
        Ok(match u {
            Update::Set(v) => Update::Set(yes_no(field, &v)?),
            Update::Clear => Update::Clear,
            Update::Unchanged => Update::Unchanged,
        })
    };
    let resolve = flag("RESOLVE", update.resolve)?;
    let code_update = |u: Update<String>| match u {
        Update::Set(v) => match fragment_code(Some(v)) {
            Some(c) => Update::Set(c),
            None => Update::Clear,
        },
        other => other,
    };

    let mut patch = Patch::new()
        .update("RELATE", flag("RELATE", update.relate)?)
        .update("RTYPE_ID", update.rtype_id)
        .update("QUAL_ERFRAG_CODE", code_update(update.fragment))
        .update("DISQ_ERFRAG_CODE", code_update(update.disqualifier));

    let resolves = match &resolve {
        Update::Set(v) => *v == "Yes",
        _ => Registry::new(doc, EntityKind::Rule)
            .get(&EntityKey::code(code))?
            .get("RESOLVE")
            .and_then(Value::as_str)
            .is_some_and(|v| v.eq_ignore_ascii_case("yes")),
    };
    patch = patch.update("RESOLVE", resolve);
    patch = if resolves {
        patch.update("ERRULE_TIER", update.tier)
    } else {
        patch.clear("ERRULE_TIER")
    };
    engine::update(doc, EntityKind::Rule, &EntityKey::code(code), &patch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ConfigError;
    use crate::policy::{DeleteAction, KindDeletePolicy, RejectReferencedPolicy};

    fn doc() -> Document {
        Document::from_value(json!({"G2_CONFIG": {
            "CFG_ERFRAG": [
                {"ERFRAG_ID": 1, "ERFRAG_CODE": "SAME_NAME", "ERFRAG_SOURCE": "./SCORES/NAME"},
                {"ERFRAG_ID": 2, "ERFRAG_CODE": "DIFF_DOB", "ERFRAG_SOURCE": "./SCORES/DOB"}
            ]
        }}))
        .unwrap()
    }

    #[test]
    fn test_add_rule_defaults_and_references() {
        let mut doc = doc();
        let mut params = AddRule::new("sn", "same_name");
        params.disqualifier = Some("DIFF_DOB".to_string());
        params.tier = Some(10);
        let id = add_rule(&mut doc, params).unwrap();
        assert_eq!(id, 1);

        let rec = &doc.records(EntityKind::Rule)[0];
        assert_eq!(rec["ERRULE_CODE"], "SN");
        assert_eq!(rec["RESOLVE"], "Yes");
        assert_eq!(rec["RELATE"], "No");
        assert_eq!(rec["QUAL_ERFRAG_CODE"], "SAME_NAME");
        assert_eq!(rec["ERRULE_TIER"], 10);
    }

    #[test]
    fn test_add_rule_unknown_fragment() {
        let mut doc = doc();
        let result = add_rule(&mut doc, AddRule::new("X", "NOPE"));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidReference { target: EntityKind::Fragment, .. })
        ));
    }

    #[test]
    fn test_relate_only_rule_drops_tier() {
        let mut doc = doc();
        let mut params = AddRule::new("SN", "SAME_NAME");
        params.tier = Some(5);
        add_rule(&mut doc, params).unwrap();

        set_rule(
            &mut doc,
            "SN",
            RuleUpdate {
                resolve: Update::Set("No".to_string()),
                relate: Update::Set("Yes".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
        let rec = &doc.records(EntityKind::Rule)[0];
        assert_eq!(rec["RELATE"], "Yes");
        assert_eq!(rec["ERRULE_TIER"], Value::Null);
    }

    #[test]
    fn test_fragment_delete_respects_rules() {
        let mut doc = doc();
        let mut params = AddRule::new("SN", "SAME_NAME");
        params.disqualifier = Some("DIFF_DOB".to_string());
        add_rule(&mut doc, params).unwrap();

        let result = engine::delete(
            &mut doc,
            EntityKind::Fragment,
            &EntityKey::code("DIFF_DOB"),
            &RejectReferencedPolicy,
        );
        assert!(matches!(result, Err(ConfigError::ReferencedByOthers { .. })));

        let policy = KindDeletePolicy::default().with(EntityKind::Fragment, DeleteAction::NullOut);
        engine::delete(&mut doc, EntityKind::Fragment, &EntityKey::code("DIFF_DOB"), &policy).unwrap();
        assert_eq!(doc.records(EntityKind::Rule)[0]["DISQ_ERFRAG_CODE"], Value::Null);

        delete_rule(&mut doc, "SN", &RejectReferencedPolicy).unwrap();
        assert!(doc.records(EntityKind::Rule).is_empty());
    }
}
