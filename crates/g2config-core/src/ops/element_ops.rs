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

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddElement {
    #[serde(alias = "code")]
    pub element: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub data_type: Option<String>,
    #[serde(default)]
    pub tokenize: Option<String>,
}

impl AddElement {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            element: code.into(),
            description: None,
            data_type: None,
            tokenize: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ElementUpdate {
    pub description: Update<String>,
    pub data_type: Update<String>,
    pub tokenize: Update<String>,
}

/// Add an element, returning its id
///
/// Data type defaults to "string" and tokenize to "No".
///
/// # Errors
///
/// Returns `DuplicateCode` if the code exists.
pub fn add_element(doc: &mut Document, params: AddElement) -> Result<i64> {
    let code = normalize_code("FELEM_CODE", &params.element)?;
    let tokenize = yes_no("TOKENIZE", params.tokenize.as_deref().unwrap_or("No"))?;
    let description = params.description.unwrap_or_else(|| code.clone());
    let rec = record(json!({
        "FELEM_CODE": code,
        "FELEM_DESC": description,
        "DATA_TYPE": params.data_type.unwrap_or_else(|| "string".to_string()).to_lowercase(),
        "TOKENIZE": tokenize,
    }));
    Ok(engine::insert(doc, EntityKind::Element, rec)?.unwrap_or_default())
}

/// # Errors
///
/// Returns `NotFound` for an unknown code, or `ReferencedByOthers` while
/// features, attributes or calls still use the element.
pub fn delete_element(
    doc: &mut Document,
    code: &str,
    policy: &dyn DeletePolicy,
) -> Result<DeleteReport> {
    engine::delete(doc, EntityKind::Element, &EntityKey::code(code), policy)
}

/// # Errors
///
/// Returns `NotFound` for an unknown code, `InvalidField` for bad values.
pub fn set_element(doc: &mut Document, code: &str, update: ElementUpdate) -> Result<()> {
    let tokenize = match update.tokenize {
        Update::Set(v) => Update::Set(yes_no("TOKENIZE", &v)?.to_string()),
        other => other,
    };
    let patch = Patch::new()
        .update("FELEM_DESC", update.description)
        .update("DATA_TYPE", update.data_type.map(|t| t.to_lowercase()))
        .update("TOKENIZE", tokenize);
    engine::update(doc, EntityKind::Element, &EntityKey::code(code), &patch)
}
