//! System parameters and version markers
//!
//! The only system parameter is `relationshipsBreakMatches`, stored as
//! `BREAK_RES` on the `CFG_RTYPE` row of relationship class 2. Version
//! markers live in the `CONFIG_BASE_VERSION` object.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{ConfigError, Result};
use crate::model::record::get_i64;
use crate::model::Document;

pub const RTYPE_SECTION: &str = "CFG_RTYPE";
pub const BREAK_MATCHES_RCLASS: i64 = 2;
pub const VERSION_SECTION: &str = "CONFIG_BASE_VERSION";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SystemParameter {
    #[serde(rename = "relationshipsBreakMatches")]
    RelationshipsBreakMatches,
}

impl SystemParameter {
    pub const ALL: [SystemParameter; 1] = [SystemParameter::RelationshipsBreakMatches];

    pub fn name(&self) -> &'static str {
        match self {
            SystemParameter::RelationshipsBreakMatches => "relationshipsBreakMatches",
        }
    }
}

impl FromStr for SystemParameter {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().replace('_', "");
        SystemParameter::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(&wanted))
            .ok_or_else(|| ConfigError::UnknownParameter { name: s.to_string() })
    }
}

fn break_matches_row(doc: &Document) -> Option<&Value> {
    doc.config()
        .get(RTYPE_SECTION)
        .and_then(Value::as_array)
        .and_then(|rows| {
            rows.iter()
                .find(|r| get_i64(r, "RCLASS_ID") == Some(BREAK_MATCHES_RCLASS))
        })
}

/// Current value of every system parameter present in the document
pub fn system_parameters(doc: &Document) -> BTreeMap<String, Value> {
    let mut params = BTreeMap::new();
    if let Some(value) = break_matches_row(doc).and_then(|r| r.get("BREAK_RES")) {
        params.insert(
            SystemParameter::RelationshipsBreakMatches.name().to_string(),
            value.clone(),
        );
    }
    params
}

/// Set a system parameter
///
/// # Errors
///
/// - `UnknownParameter` for an unrecognized name
/// - `InvalidField` when the value is not an integer
/// - `SectionNotFound` when the document has no relationship class 2 row
pub fn set_system_parameter(doc: &mut Document, name: &str, value: Value) -> Result<()> {
    match name.parse::<SystemParameter>()? {
        SystemParameter::RelationshipsBreakMatches => {
            if !value.is_i64() {
                return Err(ConfigError::InvalidField {
                    field: "BREAK_RES".to_string(),
                    reason: format!("expected an integer, got {}", value),
                });
            }
            let row = doc
                .config_mut()
                .get_mut(RTYPE_SECTION)
                .and_then(Value::as_array_mut)
                .and_then(|rows| {
                    rows.iter_mut()
                        .find(|r| get_i64(r, "RCLASS_ID") == Some(BREAK_MATCHES_RCLASS))
                })
                .and_then(Value::as_object_mut)
                .ok_or_else(|| ConfigError::SectionNotFound {
                    section: format!("{}[RCLASS_ID={}]", RTYPE_SECTION, BREAK_MATCHES_RCLASS),
                })?;
            row.insert("BREAK_RES".to_string(), value);
        }
    }
    Ok(())
}

fn version_missing(path: &str) -> ConfigError {
    ConfigError::SectionNotFound {
        section: format!("{}.{}", VERSION_SECTION, path),
    }
}

/// `CONFIG_BASE_VERSION.VERSION`
///
/// # Errors
///
/// Returns `SectionNotFound` when the marker is absent.
pub fn version(doc: &Document) -> Result<String> {
    doc.config()
        .get(VERSION_SECTION)
        .and_then(|v| v.get("VERSION"))
        .and_then(Value::as_str)
        .map(String::from)
        .ok_or_else(|| version_missing("VERSION"))
}

/// `CONFIG_BASE_VERSION.COMPATIBILITY_VERSION.CONFIG_VERSION`
///
/// # Errors
///
/// Returns `SectionNotFound` when the marker is absent.
pub fn compatibility_version(doc: &Document) -> Result<String> {
    doc.config()
        .get(VERSION_SECTION)
        .and_then(|v| v.get("COMPATIBILITY_VERSION"))
        .and_then(|v| v.get("CONFIG_VERSION"))
        .and_then(Value::as_str)
        .map(String::from)
        .ok_or_else(|| version_missing("COMPATIBILITY_VERSION.CONFIG_VERSION"))
}

/// Replace the compatibility version
///
/// # Errors
///
/// Returns `SectionNotFound` when `COMPATIBILITY_VERSION` is absent, and
/// `MissingField` for an empty version.
pub fn set_compatibility_version(doc: &mut Document, new_version: &str) -> Result<()> {
    let new_version = new_version.trim();
    if new_version.is_empty() {
        return Err(ConfigError::MissingField {
            field: "CONFIG_VERSION".to_string(),
        });
    }
    let compat = doc
        .config_mut()
        .get_mut(VERSION_SECTION)
        .and_then(|v| v.get_mut("COMPATIBILITY_VERSION"))
        .and_then(Value::as_object_mut)
        .ok_or_else(|| version_missing("COMPATIBILITY_VERSION"))?;
    compat.insert("CONFIG_VERSION".to_string(), Value::from(new_version));
    Ok(())
}

/// Outcome of comparing the document's compatibility version
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionCheck {
    pub current: String,
    pub expected: String,
    pub compatible: bool,
}

/// # Errors
///
/// Returns `SectionNotFound` when the marker is absent.
pub fn verify_compatibility_version(doc: &Document, expected: &str) -> Result<VersionCheck> {
    let current = compatibility_version(doc)?;
    Ok(VersionCheck {
        compatible: current == expected.trim(),
        current,
        expected: expected.trim().to_string(),
    })
}
