//! The eight function registries
//!
//! Standardize, expression, comparison, distinct, matching, scoring,
//! candidate and validation functions share one record shape:
//! `<P>_ID`, `<P>_CODE`, `<P>_DESC`, `CONNECT_STR` and `LANGUAGE`, where
//! `<P>` is the registry prefix (`SFUNC`, `CFUNC`, ...). Comparison
//! functions also carry `ANON_SUPPORT`.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::errors::{ConfigError, Result};
use crate::model::record::{normalize_code, yes_no};
use crate::model::{descriptor, Document};
use crate::ops::engine::{self, DeleteReport};
use crate::ops::patch::{Patch, Update};
use crate::policy::DeletePolicy;
use crate::registry::EntityKey;
use g2config_core_types::EntityKind;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddFunction {
    #[serde(alias = "code")]
    pub function: String,
    #[serde(default)]
    pub connect_str: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub anon_support: Option<String>,
}

impl AddFunction {
    pub fn new(code: impl Into<String>, connect_str: impl Into<String>) -> Self {
        Self {
            function: code.into(),
            connect_str: Some(connect_str.into()),
            description: None,
            language: None,
            anon_support: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FunctionUpdate {
    pub description: Update<String>,
    pub connect_str: Update<String>,
    pub language: Update<String>,
    pub anon_support: Update<String>,
}

/// Field names of a function registry
struct FunctionFields {
    code: &'static str,
    desc: String,
}

fn function_fields(kind: EntityKind) -> Result<FunctionFields> {
    let desc = descriptor(kind);
    match (kind.is_function(), desc.code_field) {
        (true, Some(code)) => Ok(FunctionFields {
            code,
            desc: code.replace("_CODE", "_DESC"),
        }),
        _ => Err(ConfigError::UnsupportedOperation {
            kind,
            operation: "function".to_string(),
        }),
    }
}

fn anon_support(kind: EntityKind, update: Update<String>) -> Result<Update<String>> {
    match update {
        Update::Unchanged => Ok(Update::Unchanged),
        _ if kind != EntityKind::ComparisonFunction => Err(ConfigError::InvalidField {
            field: "anonSupport".to_string(),
            reason: format!("not applicable to {}", kind),
        }),
        Update::Set(v) => Ok(Update::Set(yes_no("ANON_SUPPORT", &v)?.to_string())),
        Update::Clear => Ok(Update::Clear),
    }
}

/// Add a function to the registry of `kind`, returning its id
///
/// # Errors
///
/// - `UnsupportedOperation` if `kind` is not a function kind
/// - `MissingField` without a connect string
/// - `DuplicateCode` if the code exists
pub fn add_function(doc: &mut Document, kind: EntityKind, params: AddFunction) -> Result<i64> {
    let fields = function_fields(kind)?;
    let code = normalize_code(fields.code, &params.function)?;
    let connect_str = params
        .connect_str
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingField {
            field: "CONNECT_STR".to_string(),
        })?;

    let mut rec = Map::new();
    rec.insert(fields.code.to_string(), Value::from(code.clone()));
    rec.insert(
        fields.desc,
        Value::from(params.description.unwrap_or(code)),
    );
    rec.insert("CONNECT_STR".to_string(), Value::from(connect_str));
    rec.insert(
        "LANGUAGE".to_string(),
        params.language.map(Value::from).unwrap_or(Value::Null),
    );
    match anon_support(kind, params.anon_support.into())? {
        Update::Set(v) => {
            rec.insert("ANON_SUPPORT".to_string(), Value::from(v));
        }
        _ if kind == EntityKind::ComparisonFunction => {
            rec.insert("ANON_SUPPORT".to_string(), Value::from("No"));
        }
        _ => {}
    }

    Ok(engine::insert(doc, kind, rec)?.unwrap_or_default())
}

/// # Errors
///
/// Returns `NotFound`, or `ReferencedByOthers` while calls or thresholds
/// use the function.
pub fn delete_function(
    doc: &mut Document,
    kind: EntityKind,
    code: &str,
    policy: &dyn DeletePolicy,
) -> Result<DeleteReport> {
    function_fields(kind)?;
    engine::delete(doc, kind, &EntityKey::code(code), policy)
}

/// # Errors
///
/// Returns `NotFound` or `InvalidField`.
pub fn set_function(
    doc: &mut Document,
    kind: EntityKind,
    code: &str,
    update: FunctionUpdate,
) -> Result<()> {
    let fields = function_fields(kind)?;
    let patch = Patch::new()
        .update(&fields.desc, update.description)
        .update("CONNECT_STR", update.connect_str)
        .update("LANGUAGE", update.language)
        .update("ANON_SUPPORT", anon_support(kind, update.anon_support)?);
    engine::update(doc, kind, &EntityKey::code(code), &patch)
}
