//! Entity registry: per-kind lookup by code, id or composite key
//!
//! A `Registry` is a read-only view of one collection of a document. Code
//! lookup is case-insensitive, id lookup is exact. Identifier allocation
//! honours the collection's high-water mark so ids are never reused.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::errors::{ConfigError, Result};
use crate::model::record::{get_i64, get_str, values_match};
use crate::model::{descriptor, Document, KindDescriptor};
use g2config_core_types::EntityKind;

/// How a caller names one entity
///
/// In JSON a number selects by id, a string by code (falling back to an id
/// when the string is numeric and no code matches) and an object by the
/// fields of the kind's composite key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityKey {
    Id(i64),
    Code(String),
    Fields(Map<String, Value>),
}

impl EntityKey {
    pub fn code(code: impl Into<String>) -> Self {
        EntityKey::Code(code.into())
    }

    /// Composite key from field/value pairs
    pub fn fields<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        EntityKey::Fields(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKey::Id(id) => write!(f, "{}", id),
            EntityKey::Code(code) => f.write_str(code),
            EntityKey::Fields(fields) => {
                let parts: Vec<String> = fields
                    .iter()
                    .map(|(k, v)| match v {
                        Value::String(s) => format!("{}={}", k, s),
                        other => format!("{}={}", k, other),
                    })
                    .collect();
                f.write_str(&parts.join(", "))
            }
        }
    }
}

/// Read-only view of one collection
#[derive(Clone, Copy)]
pub struct Registry<'a> {
    doc: &'a Document,
    descriptor: &'static KindDescriptor,
}

impl<'a> Registry<'a> {
    pub fn new(doc: &'a Document, kind: EntityKind) -> Self {
        Self {
            doc,
            descriptor: descriptor(kind),
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.descriptor.kind
    }

    pub fn descriptor(&self) -> &'static KindDescriptor {
        self.descriptor
    }

    pub fn records(&self) -> &'a [Value] {
        self.doc.records(self.descriptor.kind)
    }

    pub fn position_by_code(&self, code: &str) -> Option<usize> {
        let field = self.descriptor.code_field?;
        let wanted = code.trim();
        self.records()
            .iter()
            .position(|r| get_str(r, field).is_some_and(|c| c.eq_ignore_ascii_case(wanted)))
    }

    pub fn position_by_id(&self, id: i64) -> Option<usize> {
        let field = self.descriptor.id_field?;
        self.records()
            .iter()
            .position(|r| get_i64(r, field) == Some(id))
    }

    /// Position of the record whose fields all match `key`
    pub fn position_by_fields(&self, key: &Map<String, Value>) -> Option<usize> {
        if key.is_empty() {
            return None;
        }
        self.records().iter().position(|r| {
            key.iter()
                .all(|(field, wanted)| r.get(field).is_some_and(|v| values_match(v, wanted)))
        })
    }

    pub fn exists_by_code(&self, code: &str) -> bool {
        self.position_by_code(code).is_some()
    }

    pub fn exists_by_id(&self, id: i64) -> bool {
        self.position_by_id(id).is_some()
    }

    pub fn lookup_by_code(&self, code: &str) -> Option<&'a Value> {
        self.position_by_code(code).map(|i| &self.records()[i])
    }

    pub fn lookup_by_id(&self, id: i64) -> Option<&'a Value> {
        self.position_by_id(id).map(|i| &self.records()[i])
    }

    /// Position of the entity named by `key`, if any
    pub fn position(&self, key: &EntityKey) -> Option<usize> {
        match key {
            EntityKey::Id(id) => self.position_by_id(*id),
            EntityKey::Code(code) => self.position_by_code(code).or_else(|| {
                code.trim()
                    .parse::<i64>()
                    .ok()
                    .and_then(|id| self.position_by_id(id))
            }),
            EntityKey::Fields(fields) => self.position_by_fields(fields),
        }
    }

    /// Position of the entity named by `key`
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when nothing matches.
    pub fn find(&self, key: &EntityKey) -> Result<usize> {
        self.position(key).ok_or_else(|| ConfigError::NotFound {
            kind: self.kind(),
            key: key.to_string(),
        })
    }

    /// The record named by `key`
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when nothing matches.
    pub fn get(&self, key: &EntityKey) -> Result<&'a Value> {
        self.find(key).map(|i| &self.records()[i])
    }

    /// Id of the entity with `code`
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when no entity has the code.
    pub fn id_of(&self, code: &str) -> Result<i64> {
        let id_field = self.descriptor.id_field.ok_or_else(|| ConfigError::Internal {
            message: format!("{} has no id field", self.kind()),
        })?;
        self.lookup_by_code(code)
            .and_then(|r| get_i64(r, id_field))
            .ok_or_else(|| ConfigError::NotFound {
                kind: self.kind(),
                key: code.to_string(),
            })
    }

    /// Code of the entity with `id`, if it exists and has a code
    pub fn code_of(&self, id: i64) -> Option<&'a str> {
        let code_field = self.descriptor.code_field?;
        self.lookup_by_id(id).and_then(|r| get_str(r, code_field))
    }

    pub fn max_id(&self) -> i64 {
        let Some(field) = self.descriptor.id_field else {
            return 0;
        };
        self.records()
            .iter()
            .filter_map(|r| get_i64(r, field))
            .max()
            .unwrap_or(0)
    }

    /// Next identifier: one past the larger of the current maximum and the
    /// collection's high-water mark
    pub fn next_id(&self) -> i64 {
        self.max_id().max(self.doc.watermark(self.kind())) + 1
    }
}
