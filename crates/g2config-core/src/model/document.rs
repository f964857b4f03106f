//! In-memory configuration document
//!
//! The document is the JSON tree `{"G2_CONFIG": {<section>: [<record>, ...]}}`.
//! Objects use serde_json's default sorted map, so serialization is canonical:
//! object keys are emitted in sorted order and array order is insertion order.

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};

use crate::errors::{ConfigError, Result};
use g2config_core_types::EntityKind;

/// Key of the root configuration object
pub const ROOT_KEY: &str = "G2_CONFIG";

/// Section recording the highest id ever allocated per collection
pub const WATERMARK_SECTION: &str = "SYS_ID_WATERMARKS";

/// A parsed, structurally valid configuration document
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Top-level keys other than `G2_CONFIG`, kept verbatim
    outer: Map<String, Value>,
    config: Map<String, Value>,
}

impl Document {
    /// Create a document with an empty `G2_CONFIG` object
    pub fn empty() -> Self {
        Self {
            outer: Map::new(),
            config: Map::new(),
        }
    }

    /// Parse document text
    ///
    /// # Errors
    ///
    /// Returns `MalformedDocument` if the text is not a JSON object with a
    /// `G2_CONFIG` object, and `InvalidSection` if a known section is not an
    /// array of objects.
    pub fn parse(text: &str) -> Result<Self> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| ConfigError::MalformedDocument {
                reason: e.to_string(),
            })?;
        Self::from_value(value)
    }

    /// Build a document from an already-parsed JSON value
    ///
    /// # Errors
    ///
    /// Same structural checks as [`Document::parse`].
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(mut outer) = value else {
            return Err(ConfigError::MalformedDocument {
                reason: "document root is not an object".to_string(),
            });
        };
        let config = match outer.remove(ROOT_KEY) {
            Some(Value::Object(config)) => config,
            Some(_) => {
                return Err(ConfigError::MalformedDocument {
                    reason: format!("{} is not an object", ROOT_KEY),
                })
            }
            None => {
                return Err(ConfigError::MalformedDocument {
                    reason: format!("missing {} object", ROOT_KEY),
                })
            }
        };

        for kind in EntityKind::ALL {
            match config.get(kind.section()) {
                None => {}
                Some(Value::Array(records)) if records.iter().all(Value::is_object) => {}
                Some(_) => {
                    return Err(ConfigError::InvalidSection {
                        section: kind.section().to_string(),
                    })
                }
            }
        }

        Ok(Self { outer, config })
    }

    /// Serialize to compact canonical text
    ///
    /// # Errors
    ///
    /// Returns `Serialization` if JSON encoding fails.
    pub fn serialize(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Serialize to indented text
    ///
    /// # Errors
    ///
    /// Returns `Serialization` if JSON encoding fails.
    pub fn to_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// The `G2_CONFIG` object
    pub fn config(&self) -> &Map<String, Value> {
        &self.config
    }

    pub(crate) fn config_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.config
    }

    /// Records of a kind, empty when the section is absent
    pub fn records(&self, kind: EntityKind) -> &[Value] {
        match self.config.get(kind.section()) {
            Some(Value::Array(records)) => records.as_slice(),
            _ => &[],
        }
    }

    /// Mutable records of a kind, creating the section when absent
    pub(crate) fn records_mut(&mut self, kind: EntityKind) -> Result<&mut Vec<Value>> {
        let section = self
            .config
            .entry(kind.section())
            .or_insert_with(|| Value::Array(Vec::new()));
        match section {
            Value::Array(records) => Ok(records),
            _ => Err(ConfigError::InvalidSection {
                section: kind.section().to_string(),
            }),
        }
    }

    /// Highest id ever removed from a kind's collection (0 when none)
    pub fn watermark(&self, kind: EntityKind) -> i64 {
        self.config
            .get(WATERMARK_SECTION)
            .and_then(|w| w.get(kind.section()))
            .and_then(Value::as_i64)
            .unwrap_or(0)
    }

    pub(crate) fn raise_watermark(&mut self, kind: EntityKind, id: i64) {
        if id <= self.watermark(kind) {
            return;
        }
        let marks = self
            .config
            .entry(WATERMARK_SECTION)
            .or_insert_with(|| Value::Object(Map::new()));
        if !marks.is_object() {
            *marks = Value::Object(Map::new());
        }
        if let Value::Object(marks) = marks {
            marks.insert(kind.section().to_string(), Value::from(id));
        }
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut keys: Vec<&str> = self.outer.keys().map(String::as_str).collect();
        keys.push(ROOT_KEY);
        keys.sort_unstable();

        let mut map = serializer.serialize_map(Some(keys.len()))?;
        for key in keys {
            if key == ROOT_KEY {
                map.serialize_entry(key, &self.config)?;
            } else if let Some(value) = self.outer.get(key) {
                map.serialize_entry(key, value)?;
            }
        }
        map.end()
    }
}
