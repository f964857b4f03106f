//! Functional-boundary apply function
//!
//! `apply()` is the single entry point for mutating a configuration
//! document.
//!
//! ## Atomicity Contract
//!
//! - **All-or-nothing**: either the command succeeds and the returned
//!   document reflects it completely, or an error is returned and no
//!   document is produced
//! - **No panics**: invalid input yields a typed `ConfigError`
//! - **Invariants hold**: codes and ids stay unique, references resolve and
//!   ids are never reused in every document `apply()` returns
//!
//! The document is taken by value. A caller that needs the previous state
//! after a failure clones before calling.
//!
//! ## Example
//!
//! ```
//! use g2config_core::{apply, Command, Document, RejectReferencedPolicy};
//! use g2config_core::ops::data_source_ops::AddDataSource;
//!
//! let doc = Document::empty();
//! let cmd = Command::AddDataSource(AddDataSource::new("CUSTOMERS"));
//!
//! let doc = apply(doc, cmd, &RejectReferencedPolicy).unwrap();
//! assert!(doc.serialize().unwrap().contains("CUSTOMERS"));
//! ```

use crate::commands::Command;
use crate::errors::Result;
use crate::model::Document;
use crate::ops::{
    attribute_ops, behavior_override_ops, call_ops, data_source_ops, element_ops, entity_ops,
    feature_ops, fragment_ops, function_ops, hash_ops, plan_ops, rule_ops, section_ops,
    system_ops, threshold_ops, DeleteReport,
};
use crate::policy::DeletePolicy;
use crate::{log_op_end, log_op_error, log_op_start};

/// What a successful command did, for logging
enum Effect {
    Added(i64),
    Deleted(DeleteReport),
    Changed,
}

impl From<i64> for Effect {
    fn from(id: i64) -> Self {
        Effect::Added(id)
    }
}

impl From<DeleteReport> for Effect {
    fn from(report: DeleteReport) -> Self {
        Effect::Deleted(report)
    }
}

impl From<()> for Effect {
    fn from(_: ()) -> Self {
        Effect::Changed
    }
}

impl From<usize> for Effect {
    fn from(_: usize) -> Self {
        Effect::Changed
    }
}

/// Apply a command to a document, returning the next document
///
/// # Errors
///
/// Any `ConfigError` raised by validation: duplicate codes, unresolved
/// references, missing targets, unsafe deletes under `policy`, attempts to
/// change identity fields, or malformed parameters. The returned error
/// means no mutation is observable.
///
/// # Example
///
/// ```
/// use g2config_core::{apply, Command, ConfigError, Document, RejectReferencedPolicy};
///
/// let cmd = Command::DeleteDataSource { code: "NOPE".to_string() };
/// let result = apply(Document::empty(), cmd, &RejectReferencedPolicy);
/// assert!(matches!(result, Err(ConfigError::NotFound { .. })));
/// ```
pub fn apply(mut doc: Document, cmd: Command, policy: &dyn DeletePolicy) -> Result<Document> {
    let op = cmd.name();
    let entity_kind = cmd.kind().map_or("", |k| k.as_str());
    log_op_start!(op, entity_kind = entity_kind);
    let start = std::time::Instant::now();

    let effect = execute(&mut doc, cmd, policy).map_err(|e| {
        log_op_error!(
            op,
            e.clone(),
            duration_ms = start.elapsed().as_millis() as u64,
            entity_kind = entity_kind
        );
        e
    })?;

    let duration_ms = start.elapsed().as_millis() as u64;
    match effect {
        Effect::Added(id) => {
            log_op_end!(op, duration_ms = duration_ms, entity_id = id);
        }
        Effect::Deleted(report) => {
            log_op_end!(
                op,
                duration_ms = duration_ms,
                removed_len = report.removed,
                cleared_len = report.cleared
            );
        }
        Effect::Changed => {
            log_op_end!(op, duration_ms = duration_ms);
        }
    }

    Ok(doc)
}

fn execute(doc: &mut Document, cmd: Command, policy: &dyn DeletePolicy) -> Result<Effect> {
    Ok(match cmd {
        Command::AddDataSource(params) => data_source_ops::add_data_source(doc, params)?.into(),
        Command::DeleteDataSource { code } => {
            data_source_ops::delete_data_source(doc, &code, policy)?.into()
        }
        Command::SetDataSource { code, update } => {
            data_source_ops::set_data_source(doc, &code, update)?.into()
        }

        Command::AddAttribute(params) => attribute_ops::add_attribute(doc, params)?.into(),
        Command::DeleteAttribute { code } => {
            attribute_ops::delete_attribute(doc, &code, policy)?.into()
        }
        Command::SetAttribute { code, update } => {
            attribute_ops::set_attribute(doc, &code, update)?.into()
        }

        Command::AddElement(params) => element_ops::add_element(doc, params)?.into(),
        Command::DeleteElement { code } => element_ops::delete_element(doc, &code, policy)?.into(),
        Command::SetElement { code, update } => element_ops::set_element(doc, &code, update)?.into(),

        Command::AddFeature(params) => feature_ops::add_feature(doc, params)?.into(),
        Command::DeleteFeature { key } => feature_ops::delete_feature(doc, &key, policy)?.into(),
        Command::SetFeature { key, update } => feature_ops::set_feature(doc, &key, update)?.into(),
        Command::AddFeatureElement(params) => {
            feature_ops::add_feature_element(doc, params)?.into()
        }
        Command::DeleteFeatureElement { feature, element } => {
            feature_ops::delete_feature_element(doc, &feature, &element, policy)?.into()
        }
        Command::SetFeatureElement {
            feature,
            element,
            update,
        } => feature_ops::set_feature_element(doc, &feature, &element, update)?.into(),

        Command::AddFunction { kind, params } => {
            function_ops::add_function(doc, kind, params)?.into()
        }
        Command::DeleteFunction { kind, code } => {
            function_ops::delete_function(doc, kind, &code, policy)?.into()
        }
        Command::SetFunction { kind, code, update } => {
            function_ops::set_function(doc, kind, &code, update)?.into()
        }

        Command::AddStandardizeCall(params) => call_ops::add_standardize_call(doc, params)?.into(),
        Command::AddExpressionCall(params) => call_ops::add_expression_call(doc, params)?.into(),
        Command::AddComparisonCall(params) => call_ops::add_comparison_call(doc, params)?.into(),
        Command::AddDistinctCall(params) => call_ops::add_distinct_call(doc, params)?.into(),
        Command::DeleteCall { kind, id } => call_ops::delete_call(doc, kind, id, policy)?.into(),
        Command::SetCall { kind, id, update } => call_ops::set_call(doc, kind, id, update)?.into(),
        Command::AddCallElement { kind, params } => {
            call_ops::add_call_element(doc, kind, params)?.into()
        }
        Command::DeleteCallElement { kind, key } => {
            call_ops::delete_call_element(doc, kind, &key, policy)?.into()
        }
        Command::SetCallElement { kind, key, update } => {
            call_ops::set_call_element(doc, kind, &key, update)?.into()
        }

        Command::AddComparisonThreshold(params) => {
            threshold_ops::add_comparison_threshold(doc, params)?.into()
        }
        Command::DeleteComparisonThreshold { id } => {
            threshold_ops::delete_comparison_threshold(doc, id, policy)?.into()
        }
        Command::SetComparisonThreshold { id, update } => {
            threshold_ops::set_comparison_threshold(doc, id, update)?.into()
        }
        Command::AddGenericThreshold(params) => {
            threshold_ops::add_generic_threshold(doc, params)?.into()
        }
        Command::DeleteGenericThreshold { key } => {
            threshold_ops::delete_generic_threshold(doc, &key, policy)?.into()
        }
        Command::SetGenericThreshold { key, update } => {
            threshold_ops::set_generic_threshold(doc, &key, update)?.into()
        }

        Command::AddPlan(params) => plan_ops::add_plan(doc, params)?.into(),
        Command::ClonePlan(params) => plan_ops::clone_plan(doc, params)?.into(),
        Command::DeletePlan { code } => plan_ops::delete_plan(doc, &code, policy)?.into(),
        Command::SetPlan { code, update } => plan_ops::set_plan(doc, &code, update)?.into(),

        Command::AddFragment(params) => fragment_ops::add_fragment(doc, params)?.into(),
        Command::DeleteFragment { code } => {
            fragment_ops::delete_fragment(doc, &code, policy)?.into()
        }
        Command::SetFragment { code, update } => {
            fragment_ops::set_fragment(doc, &code, update)?.into()
        }

        Command::AddRule(params) => rule_ops::add_rule(doc, params)?.into(),
        Command::DeleteRule { code } => rule_ops::delete_rule(doc, &code, policy)?.into(),
        Command::SetRule { code, update } => rule_ops::set_rule(doc, &code, update)?.into(),

        Command::AddBehaviorOverride(params) => {
            behavior_override_ops::add_behavior_override(doc, params)?.into()
        }
        Command::DeleteBehaviorOverride { key } => {
            behavior_override_ops::delete_behavior_override(doc, &key, policy)?.into()
        }
        Command::SetBehaviorOverride { key, behavior } => {
            behavior_override_ops::set_behavior_override(doc, &key, &behavior)?.into()
        }

        Command::AddHashValue { list, value } => {
            hash_ops::add_hash_value(doc, list, &value)?.into()
        }
        Command::DeleteHashValue { list, value } => {
            hash_ops::delete_hash_value(doc, list, &value)?.into()
        }

        Command::AddSection { section } => section_ops::add_section(doc, &section)?.into(),
        Command::RemoveSection { section } => section_ops::remove_section(doc, &section)?.into(),
        Command::AddSectionField {
            section,
            field,
            value,
        } => section_ops::add_section_field(doc, &section, &field, value)?.into(),
        Command::RemoveSectionField { section, field } => {
            section_ops::remove_section_field(doc, &section, &field)?.into()
        }

        Command::SetSystemParameter { name, value } => {
            system_ops::set_system_parameter(doc, &name, value)?.into()
        }
        Command::SetCompatibilityVersion { version } => {
            system_ops::set_compatibility_version(doc, &version)?.into()
        }

        Command::SetEntity { kind, key, fields } => {
            entity_ops::set_entity(doc, kind, &key, &fields)?.into()
        }
        Command::DeleteEntity { kind, key } => {
            entity_ops::delete_entity(doc, kind, &key, policy)?.into()
        }
    })
}
