//! Hashed-value sets under `SYS_OOM`
//!
//! `SYS_OOM` is an object, not a record section. Its `NAME_HASH` and
//! `SSN_LAST4_HASH` arrays hold plain string values; adding a value twice
//! or removing one that is absent is an error. Values are treated as
//! sensitive and never logged in clear.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::errors::{ConfigError, Result};
use crate::model::Document;
use g2config_core_types::Sensitive;

pub const OOM_SECTION: &str = "SYS_OOM";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashList {
    Name,
    SsnLast4,
}

impl HashList {
    pub fn field(&self) -> &'static str {
        match self {
            HashList::Name => "NAME_HASH",
            HashList::SsnLast4 => "SSN_LAST4_HASH",
        }
    }
}

impl fmt::Display for HashList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", OOM_SECTION, self.field())
    }
}

fn oom_mut(doc: &mut Document) -> Result<&mut Map<String, Value>> {
    match doc.config_mut().get_mut(OOM_SECTION) {
        Some(Value::Object(oom)) => Ok(oom),
        Some(_) => Err(ConfigError::InvalidSection {
            section: OOM_SECTION.to_string(),
        }),
        None => Err(ConfigError::SectionNotFound {
            section: OOM_SECTION.to_string(),
        }),
    }
}

fn list_mut(oom: &mut Map<String, Value>, list: HashList) -> Result<&mut Vec<Value>> {
    match oom
        .entry(list.field())
        .or_insert_with(|| Value::Array(Vec::new()))
    {
        Value::Array(values) => Ok(values),
        _ => Err(ConfigError::InvalidSection {
            section: list.to_string(),
        }),
    }
}

/// Values of a hash list; empty when the list or `SYS_OOM` is absent
pub fn hash_values(doc: &Document, list: HashList) -> Vec<String> {
    doc.config()
        .get(OOM_SECTION)
        .and_then(|oom| oom.get(list.field()))
        .and_then(Value::as_array)
        .map(|values| {
            values
                .iter()
                .filter_map(Value::as_str)
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

/// Add one value to a hash list
///
/// # Errors
///
/// - `SectionNotFound` when the document has no `SYS_OOM`
/// - `DuplicateHash` when the value is already present
/// - `MissingField` for an empty value
pub fn add_hash_value(doc: &mut Document, list: HashList, value: &str) -> Result<()> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ConfigError::MissingField {
            field: list.field().to_string(),
        });
    }
    let values = list_mut(oom_mut(doc)?, list)?;
    if values.iter().any(|v| v.as_str() == Some(value)) {
        return Err(ConfigError::DuplicateHash {
            list: list.to_string(),
        });
    }
    values.push(Value::from(value));
    tracing::debug!(list = %list, value = %Sensitive::new(value), "hash value added");
    Ok(())
}

/// Remove one value from a hash list
///
/// # Errors
///
/// Returns `SectionNotFound` without `SYS_OOM` and `HashNotFound` when the
/// value is absent.
pub fn delete_hash_value(doc: &mut Document, list: HashList, value: &str) -> Result<()> {
    let value = value.trim();
    let values = list_mut(oom_mut(doc)?, list)?;
    let before = values.len();
    values.retain(|v| v.as_str() != Some(value));
    if values.len() == before {
        return Err(ConfigError::HashNotFound {
            list: list.to_string(),
        });
    }
    tracing::debug!(list = %list, value = %Sensitive::new(value), "hash value removed");
    Ok(())
}
