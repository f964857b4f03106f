use serde::Deserialize;
use serde_json::json;

use crate::errors::Result;
use crate::model::record::{normalize_code, yes_no};
use crate::model::Document;
use crate::ops::engine::{self, DeleteReport};
use crate::ops::patch::{Patch, Update};
use crate::ops::record;
use crate::policy::DeletePolicy;
use crate::registry::EntityKey;
use g2config_core_types::EntityKind;

/// Parameters for adding a data source
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddDataSource {
    #[serde(alias = "code")]
    pub data_source: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub retention_level: Option<String>,
    #[serde(default)]
    pub conversational: Option<String>,
    #[serde(default)]
    pub reliability: Option<i64>,
}

impl AddDataSource {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            data_source: code.into(),
            description: None,
            retention_level: None,
            conversational: None,
            reliability: None,
        }
    }
}

/// Partial update of a data source
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DataSourceUpdate {
    pub description: Update<String>,
    pub retention_level: Update<String>,
    pub conversational: Update<String>,
    pub reliability: Update<i64>,
}

/// Add a data source, returning its id
///
/// The description defaults to the code, retention to "Remember",
/// conversational to "No" and reliability to 1.
///
/// # Errors
///
/// Returns `DuplicateCode` if the code exists, or `MissingField` /
/// `InvalidField` for bad parameters.
pub fn add_data_source(doc: &mut Document, params: AddDataSource) -> Result<i64> {
    let code = normalize_code("DSRC_CODE", &params.data_source)?;
    let conversational = yes_no(
        "CONVERSATIONAL",
        params.conversational.as_deref().unwrap_or("No"),
    )?;
    let description = params.description.unwrap_or_else(|| code.clone());
    let rec = record(json!({
        "DSRC_CODE": code,
        "DSRC_DESC": description,
        "DSRC_RELY": params.reliability.unwrap_or(1),
        "RETENTION_LEVEL": params.retention_level.unwrap_or_else(|| "Remember".to_string()),
        "CONVERSATIONAL": conversational,
    }));
    let id = engine::insert(doc, EntityKind::DataSource, rec)?;
    Ok(id.unwrap_or_default())
}

/// # Errors
///
/// Returns `NotFound` for an unknown code.
pub fn delete_data_source(
    doc: &mut Document,
    code: &str,
    policy: &dyn DeletePolicy,
) -> Result<DeleteReport> {
    engine::delete(doc, EntityKind::DataSource, &EntityKey::code(code), policy)
}

/// # Errors
///
/// Returns `NotFound` for an unknown code, `InvalidField` for bad values.
pub fn set_data_source(doc: &mut Document, code: &str, update: DataSourceUpdate) -> Result<()> {
    let conversational = match update.conversational {
        Update::Set(v) => Update::Set(yes_no("CONVERSATIONAL", &v)?.to_string()),
        other => other,
    };
    let patch = Patch::new()
        .update("DSRC_DESC", update.description)
        .update("RETENTION_LEVEL", update.retention_level)
        .update("CONVERSATIONAL", conversational)
        .update("DSRC_RELY", update.reliability);
    engine::update(doc, EntityKind::DataSource, &EntityKey::code(code), &patch)
}
