//! Partial-update types
//!
//! `Update<T>` is the tri-state used by typed update parameters: a field can
//! be left unchanged (omitted), explicitly cleared (JSON `null`) or set.
//! A `Patch` is the untyped form the engine applies to a record.

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// Tri-state field update
///
/// Use with `#[serde(default)]` so an omitted field deserializes to
/// `Unchanged` while an explicit `null` becomes `Clear`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Update<T> {
    #[default]
    Unchanged,
    Clear,
    Set(T),
}

impl<T> Update<T> {
    pub fn is_unchanged(&self) -> bool {
        matches!(self, Update::Unchanged)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Update<U> {
        match self {
            Update::Unchanged => Update::Unchanged,
            Update::Clear => Update::Clear,
            Update::Set(v) => Update::Set(f(v)),
        }
    }
}

impl<T> From<Option<T>> for Update<T> {
    /// `None` leaves the field unchanged
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Update::Set(v),
            None => Update::Unchanged,
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Update<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(v) => Update::Set(v),
            None => Update::Clear,
        })
    }
}

/// One field change inside a `Patch`
#[derive(Debug, Clone, PartialEq)]
pub enum FieldUpdate {
    Set(Value),
    Clear,
}

/// Ordered set of field changes keyed by document field name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Patch {
    changes: Vec<(String, FieldUpdate)>,
}

impl Patch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(field.into(), FieldUpdate::Set(value.into()));
        self
    }

    pub fn clear(mut self, field: impl Into<String>) -> Self {
        self.push(field.into(), FieldUpdate::Clear);
        self
    }

    /// Add a typed tri-state update; `Unchanged` adds nothing
    pub fn update<T: Into<Value>>(mut self, field: &str, update: Update<T>) -> Self {
        match update {
            Update::Unchanged => {}
            Update::Clear => self.push(field.to_string(), FieldUpdate::Clear),
            Update::Set(v) => self.push(field.to_string(), FieldUpdate::Set(v.into())),
        }
        self
    }

    /// Build a patch from a JSON object; keys are uppercased, `null` clears
    pub fn from_json(fields: &Map<String, Value>) -> Self {
        let mut patch = Self::new();
        for (key, value) in fields {
            let change = match value {
                Value::Null => FieldUpdate::Clear,
                other => FieldUpdate::Set(other.clone()),
            };
            patch.push(key.trim().to_uppercase(), change);
        }
        patch
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn changes(&self) -> &[(String, FieldUpdate)] {
        &self.changes
    }

    fn push(&mut self, field: String, change: FieldUpdate) {
        if let Some(existing) = self.changes.iter_mut().find(|(f, _)| *f == field) {
            existing.1 = change;
        } else {
            self.changes.push((field, change));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Deserialize)]
    struct Params {
        #[serde(default)]
        description: Update<String>,
    }

    #[test]
    fn test_update_distinguishes_omitted_from_null() {
        let omitted: Params = serde_json::from_value(json!({})).unwrap();
        let cleared: Params = serde_json::from_value(json!({"description": null})).unwrap();
        let set: Params = serde_json::from_value(json!({"description": "x"})).unwrap();
        assert_eq!(omitted.description, Update::Unchanged);
        assert_eq!(cleared.description, Update::Clear);
        assert_eq!(set.description, Update::Set("x".to_string()));
    }

    #[test]
    fn test_patch_from_json_uppercases_and_clears() {
        let map = json!({"dsrc_desc": "Customers", "Default_Value": null});
        let patch = Patch::from_json(map.as_object().unwrap());
        assert_eq!(
            patch.changes(),
            &[
                ("DEFAULT_VALUE".to_string(), FieldUpdate::Clear),
                ("DSRC_DESC".to_string(), FieldUpdate::Set(json!("Customers"))),
            ]
        );
    }

    #[test]
    fn test_unchanged_update_adds_nothing() {
        let patch = Patch::new().update::<i64>("DSRC_RELY", Update::Unchanged);
        assert!(patch.is_empty());
    }
}
