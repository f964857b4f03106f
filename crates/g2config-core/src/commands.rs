//! Command inventory for every mutation the engine supports
//!
//! Commands are processed by `apply()`. On the text boundary they arrive as
//! internally tagged JSON, `{"op": "addDataSource", ...}`. Add commands
//! carry their typed parameters inline; set commands carry the target key
//! plus an `update` object in which an omitted field is left alone and an
//! explicit `null` clears it.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::ops::attribute_ops::{AddAttribute, AttributeUpdate};
use crate::ops::behavior_override_ops::{AddBehaviorOverride, BehaviorOverrideKey};
use crate::ops::call_ops::{
    AddCallElement, AddExpressionCall, AddFeatureCall, AddStandardizeCall, CallElementKey,
    CallElementUpdate, CallUpdate,
};
use crate::ops::data_source_ops::{AddDataSource, DataSourceUpdate};
use crate::ops::element_ops::{AddElement, ElementUpdate};
use crate::ops::feature_ops::{AddFeature, AddFeatureElement, FeatureElementUpdate, FeatureUpdate};
use crate::ops::fragment_ops::{AddFragment, FragmentUpdate};
use crate::ops::function_ops::{AddFunction, FunctionUpdate};
use crate::ops::hash_ops::HashList;
use crate::ops::plan_ops::{AddPlan, ClonePlan, PlanUpdate};
use crate::ops::rule_ops::{AddRule, RuleUpdate};
use crate::ops::threshold_ops::{
    AddComparisonThreshold, AddGenericThreshold, ComparisonThresholdUpdate, GenericThresholdKey,
    GenericThresholdUpdate,
};
use crate::registry::EntityKey;
use g2config_core_types::EntityKind;

/// A single mutation of the configuration document
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Command {
    // ===== Data sources =====
    AddDataSource(AddDataSource),
    DeleteDataSource {
        code: String,
    },
    SetDataSource {
        code: String,
        update: DataSourceUpdate,
    },

    // ===== Attributes =====
    AddAttribute(AddAttribute),
    DeleteAttribute {
        code: String,
    },
    SetAttribute {
        code: String,
        update: AttributeUpdate,
    },

    // ===== Elements =====
    AddElement(AddElement),
    DeleteElement {
        code: String,
    },
    SetElement {
        code: String,
        update: ElementUpdate,
    },

    // ===== Features and their element rows =====
    /// Add a feature together with its elements and any requested calls
    AddFeature(AddFeature),
    DeleteFeature {
        key: EntityKey,
    },
    SetFeature {
        key: EntityKey,
        update: FeatureUpdate,
    },
    AddFeatureElement(AddFeatureElement),
    DeleteFeatureElement {
        feature: String,
        element: String,
    },
    SetFeatureElement {
        feature: String,
        element: String,
        update: FeatureElementUpdate,
    },

    // ===== Functions, any of the eight registries =====
    AddFunction {
        kind: EntityKind,
        #[serde(flatten)]
        params: AddFunction,
    },
    DeleteFunction {
        kind: EntityKind,
        code: String,
    },
    SetFunction {
        kind: EntityKind,
        code: String,
        update: FunctionUpdate,
    },

    // ===== Calls =====
    AddStandardizeCall(AddStandardizeCall),
    AddExpressionCall(AddExpressionCall),
    AddComparisonCall(AddFeatureCall),
    AddDistinctCall(AddFeatureCall),
    DeleteCall {
        kind: EntityKind,
        id: i64,
    },
    SetCall {
        kind: EntityKind,
        id: i64,
        update: CallUpdate,
    },
    /// Add a bill-of-materials row to an expression, comparison or distinct call
    AddCallElement {
        kind: EntityKind,
        #[serde(flatten)]
        params: AddCallElement,
    },
    DeleteCallElement {
        kind: EntityKind,
        key: CallElementKey,
    },
    SetCallElement {
        kind: EntityKind,
        key: CallElementKey,
        update: CallElementUpdate,
    },

    // ===== Thresholds and plans =====
    AddComparisonThreshold(AddComparisonThreshold),
    DeleteComparisonThreshold {
        id: i64,
    },
    SetComparisonThreshold {
        id: i64,
        update: ComparisonThresholdUpdate,
    },
    AddGenericThreshold(AddGenericThreshold),
    DeleteGenericThreshold {
        key: GenericThresholdKey,
    },
    SetGenericThreshold {
        key: GenericThresholdKey,
        update: GenericThresholdUpdate,
    },
    AddPlan(AddPlan),
    /// Copy a plan and all of its thresholds under a new code
    ClonePlan(ClonePlan),
    DeletePlan {
        code: String,
    },
    SetPlan {
        code: String,
        update: PlanUpdate,
    },

    // ===== Resolution rules =====
    AddFragment(AddFragment),
    DeleteFragment {
        code: String,
    },
    SetFragment {
        code: String,
        update: FragmentUpdate,
    },
    AddRule(AddRule),
    DeleteRule {
        code: String,
    },
    SetRule {
        code: String,
        update: RuleUpdate,
    },
    AddBehaviorOverride(AddBehaviorOverride),
    DeleteBehaviorOverride {
        key: BehaviorOverrideKey,
    },
    SetBehaviorOverride {
        key: BehaviorOverrideKey,
        behavior: String,
    },

    // ===== Hashed value lists =====
    AddHashValue {
        list: HashList,
        value: String,
    },
    DeleteHashValue {
        list: HashList,
        value: String,
    },

    // ===== Sections =====
    AddSection {
        section: String,
    },
    RemoveSection {
        section: String,
    },
    /// Add `field` with `value` to every record of `section`
    AddSectionField {
        section: String,
        field: String,
        value: Value,
    },
    RemoveSectionField {
        section: String,
        field: String,
    },

    // ===== System =====
    SetSystemParameter {
        name: String,
        value: Value,
    },
    SetCompatibilityVersion {
        version: String,
    },

    // ===== Descriptor-driven fallbacks =====
    /// Patch raw document fields of any writable kind; `null` clears
    SetEntity {
        kind: EntityKind,
        key: EntityKey,
        fields: Map<String, Value>,
    },
    DeleteEntity {
        kind: EntityKind,
        key: EntityKey,
    },
}

impl Command {
    /// Operation name used in log events
    pub fn name(&self) -> &'static str {
        match self {
            Command::AddDataSource(_) => "add_data_source",
            Command::DeleteDataSource { .. } => "delete_data_source",
            Command::SetDataSource { .. } => "set_data_source",
            Command::AddAttribute(_) => "add_attribute",
            Command::DeleteAttribute { .. } => "delete_attribute",
            Command::SetAttribute { .. } => "set_attribute",
            Command::AddElement(_) => "add_element",
            Command::DeleteElement { .. } => "delete_element",
            Command::SetElement { .. } => "set_element",
            Command::AddFeature(_) => "add_feature",
            Command::DeleteFeature { .. } => "delete_feature",
            Command::SetFeature { .. } => "set_feature",
            Command::AddFeatureElement(_) => "add_feature_element",
            Command::DeleteFeatureElement { .. } => "delete_feature_element",
            Command::SetFeatureElement { .. } => "set_feature_element",
            Command::AddFunction { .. } => "add_function",
            Command::DeleteFunction { .. } => "delete_function",
            Command::SetFunction { .. } => "set_function",
            Command::AddStandardizeCall(_) => "add_standardize_call",
            Command::AddExpressionCall(_) => "add_expression_call",
            Command::AddComparisonCall(_) => "add_comparison_call",
            Command::AddDistinctCall(_) => "add_distinct_call",
            Command::DeleteCall { .. } => "delete_call",
            Command::SetCall { .. } => "set_call",
            Command::AddCallElement { .. } => "add_call_element",
            Command::DeleteCallElement { .. } => "delete_call_element",
            Command::SetCallElement { .. } => "set_call_element",
            Command::AddComparisonThreshold(_) => "add_comparison_threshold",
            Command::DeleteComparisonThreshold { .. } => "delete_comparison_threshold",
            Command::SetComparisonThreshold { .. } => "set_comparison_threshold",
            Command::AddGenericThreshold(_) => "add_generic_threshold",
            Command::DeleteGenericThreshold { .. } => "delete_generic_threshold",
            Command::SetGenericThreshold { .. } => "set_generic_threshold",
            Command::AddPlan(_) => "add_plan",
            Command::ClonePlan(_) => "clone_plan",
            Command::DeletePlan { .. } => "delete_plan",
            Command::SetPlan { .. } => "set_plan",
            Command::AddFragment(_) => "add_fragment",
            Command::DeleteFragment { .. } => "delete_fragment",
            Command::SetFragment { .. } => "set_fragment",
            Command::AddRule(_) => "add_rule",
            Command::DeleteRule { .. } => "delete_rule",
            Command::SetRule { .. } => "set_rule",
            Command::AddBehaviorOverride(_) => "add_behavior_override",
            Command::DeleteBehaviorOverride { .. } => "delete_behavior_override",
            Command::SetBehaviorOverride { .. } => "set_behavior_override",
            Command::AddHashValue { .. } => "add_hash_value",
            Command::DeleteHashValue { .. } => "delete_hash_value",
            Command::AddSection { .. } => "add_section",
            Command::RemoveSection { .. } => "remove_section",
            Command::AddSectionField { .. } => "add_section_field",
            Command::RemoveSectionField { .. } => "remove_section_field",
            Command::SetSystemParameter { .. } => "set_system_parameter",
            Command::SetCompatibilityVersion { .. } => "set_compatibility_version",
            Command::SetEntity { .. } => "set_entity",
            Command::DeleteEntity { .. } => "delete_entity",
        }
    }

    /// Entity kind the command targets, when it targets one
    pub fn kind(&self) -> Option<EntityKind> {
        use EntityKind as K;
        Some(match self {
            Command::AddDataSource(_)
            | Command::DeleteDataSource { .. }
            | Command::SetDataSource { .. } => K::DataSource,
            Command::AddAttribute(_)
            | Command::DeleteAttribute { .. }
            | Command::SetAttribute { .. } => K::Attribute,
            Command::AddElement(_) | Command::DeleteElement { .. } | Command::SetElement { .. } => {
                K::Element
            }
            Command::AddFeature(_) | Command::DeleteFeature { .. } | Command::SetFeature { .. } => {
                K::Feature
            }
            Command::AddFeatureElement(_)
            | Command::DeleteFeatureElement { .. }
            | Command::SetFeatureElement { .. } => K::FeatureElement,
            Command::AddStandardizeCall(_) => K::StandardizeCall,
            Command::AddExpressionCall(_) => K::ExpressionCall,
            Command::AddComparisonCall(_) => K::ComparisonCall,
            Command::AddDistinctCall(_) => K::DistinctCall,
            Command::AddFunction { kind, .. }
            | Command::DeleteFunction { kind, .. }
            | Command::SetFunction { kind, .. }
            | Command::DeleteCall { kind, .. }
            | Command::SetCall { kind, .. }
            | Command::AddCallElement { kind, .. }
            | Command::DeleteCallElement { kind, .. }
            | Command::SetCallElement { kind, .. }
            | Command::SetEntity { kind, .. }
            | Command::DeleteEntity { kind, .. } => *kind,
            Command::AddComparisonThreshold(_)
            | Command::DeleteComparisonThreshold { .. }
            | Command::SetComparisonThreshold { .. } => K::ComparisonThreshold,
            Command::AddGenericThreshold(_)
            | Command::DeleteGenericThreshold { .. }
            | Command::SetGenericThreshold { .. } => K::GenericThreshold,
            Command::AddPlan(_)
            | Command::ClonePlan(_)
            | Command::DeletePlan { .. }
            | Command::SetPlan { .. } => K::GenericPlan,
            Command::AddFragment(_)
            | Command::DeleteFragment { .. }
            | Command::SetFragment { .. } => K::Fragment,
            Command::AddRule(_) | Command::DeleteRule { .. } | Command::SetRule { .. } => K::Rule,
            Command::AddBehaviorOverride(_)
            | Command::DeleteBehaviorOverride { .. }
            | Command::SetBehaviorOverride { .. } => K::BehaviorOverride,
            Command::AddHashValue { .. }
            | Command::DeleteHashValue { .. }
            | Command::AddSection { .. }
            | Command::RemoveSection { .. }
            | Command::AddSectionField { .. }
            | Command::RemoveSectionField { .. }
            | Command::SetSystemParameter { .. }
            | Command::SetCompatibilityVersion { .. } => return None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::Update;

    #[test]
    fn test_add_command_carries_params_inline() {
        let cmd: Command =
            serde_json::from_str(r#"{"op":"addDataSource","dataSource":"customers"}"#).unwrap();

        match cmd {
            Command::AddDataSource(params) => {
                assert_eq!(params.data_source, "customers");
                assert_eq!(params.description, None);
            }
            other => panic!("Expected AddDataSource, got {:?}", other),
        }
    }

    #[test]
    fn test_set_command_distinguishes_clear_from_omission() {
        let cmd: Command = serde_json::from_str(
            r#"{"op":"setDataSource","code":"TEST","update":{"description":null,"reliability":2}}"#,
        )
        .unwrap();

        match cmd {
            Command::SetDataSource { code, update } => {
                assert_eq!(code, "TEST");
                assert_eq!(update.description, Update::Clear);
                assert_eq!(update.reliability, Update::Set(2));
                assert_eq!(update.retention_level, Update::Unchanged);
            }
            other => panic!("Expected SetDataSource, got {:?}", other),
        }
    }

    #[test]
    fn test_function_command_flattens_params() {
        let cmd: Command = serde_json::from_str(
            r#"{"op":"addFunction","kind":"comparison_function","function":"cmp_x","connectStr":"g2CmpX"}"#,
        )
        .unwrap();

        assert_eq!(cmd.kind(), Some(EntityKind::ComparisonFunction));
        assert_eq!(cmd.name(), "add_function");
    }

    #[test]
    fn test_unknown_op_is_rejected() {
        let result: Result<Command, _> = serde_json::from_str(r#"{"op":"launchRocket"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_section_commands_have_no_kind() {
        let cmd = Command::AddSection {
            section: "CFG_EXTRA".to_string(),
        };
        assert_eq!(cmd.kind(), None);
    }
}
