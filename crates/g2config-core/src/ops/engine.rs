//! Descriptor-driven insert, update and delete
//!
//! Every kind-specific operation translates its parameters into a record or
//! a `Patch` and then calls into this module, which enforces the document
//! invariants:
//!
//! - codes and composite keys are unique per collection
//! - ids are engine-assigned from `Registry::next_id`
//! - every populated reference resolves
//! - code, id and key fields never change
//! - deletes never leave dangling references
//!
//! All validation happens before the first write, so a failed call leaves
//! the document untouched.

use std::collections::BTreeSet;

use serde_json::{Map, Value};

use crate::errors::{ConfigError, Result};
use crate::model::record::{get_i64, key_text, normalize_code, values_match};
use crate::model::{descriptor, Document, KindDescriptor};
use crate::ops::patch::{FieldUpdate, Patch};
use crate::policy::{DeleteAction, DeletePolicy};
use crate::refgraph::{
    cleared_value, edges_to, points_at, validate_references, Ownership, ReferenceEdge,
};
use crate::registry::{EntityKey, Registry};
use g2config_core_types::EntityKind;

/// Counts reported by a delete
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeleteReport {
    /// Records removed, including the target
    pub removed: usize,
    /// Reference fields cleared under a null-out policy
    pub cleared: usize,
}

fn ensure_mutable(desc: &KindDescriptor, operation: &str) -> Result<()> {
    if desc.read_only {
        return Err(ConfigError::UnsupportedOperation {
            kind: desc.kind,
            operation: operation.to_string(),
        });
    }
    Ok(())
}

fn check_shape(desc: &KindDescriptor, field: &str, value: &Value) -> Result<()> {
    let Some(spec) = desc.field(field) else {
        return Ok(());
    };
    if value.is_null() {
        if spec.nullable {
            return Ok(());
        }
        return Err(ConfigError::InvalidField {
            field: field.to_string(),
            reason: "field cannot be null".to_string(),
        });
    }
    if !spec.shape.accepts(value) {
        return Err(ConfigError::InvalidField {
            field: field.to_string(),
            reason: format!("expected {:?}, got {}", spec.shape, value),
        });
    }
    Ok(())
}

/// Text naming a record in error messages
pub(crate) fn identity_text(desc: &KindDescriptor, record: &Value) -> String {
    if let Some(code) = desc.code_field.and_then(|f| record.get(f)).and_then(Value::as_str) {
        return code.to_string();
    }
    if let Some(id) = desc.id_field.and_then(|f| get_i64(record, f)) {
        return id.to_string();
    }
    key_text(record, desc.key_fields)
}

fn unique_clash(
    records: &[Value],
    candidate: &Value,
    fields: &[&str],
    skip: Option<usize>,
) -> bool {
    if fields.is_empty() || fields.iter().any(|f| candidate.get(*f).is_none()) {
        return false;
    }
    records.iter().enumerate().any(|(i, r)| {
        Some(i) != skip
            && fields.iter().all(|f| match (r.get(*f), candidate.get(*f)) {
                (Some(a), Some(b)) => values_match(a, b),
                _ => false,
            })
    })
}

/// Insert a new record, returning its assigned id when the kind has one
///
/// The code field, when present, is normalized to uppercase. Any id the
/// caller placed in the record is replaced.
///
/// # Errors
///
/// - `MissingField` when the code or a key field is absent
/// - `DuplicateCode` when the code, key or unique fields clash
/// - `InvalidField` when a known field has the wrong shape
/// - `InvalidReference` when a reference does not resolve
pub fn insert(
    doc: &mut Document,
    kind: EntityKind,
    mut record: Map<String, Value>,
) -> Result<Option<i64>> {
    let desc = descriptor(kind);
    ensure_mutable(desc, "add")?;
    let registry = Registry::new(doc, kind);

    if let Some(code_field) = desc.code_field {
        let raw = record
            .get(code_field)
            .and_then(Value::as_str)
            .ok_or_else(|| ConfigError::MissingField {
                field: code_field.to_string(),
            })?;
        let code = normalize_code(code_field, raw)?;
        if registry.exists_by_code(&code) {
            return Err(ConfigError::DuplicateCode { kind, key: code });
        }
        record.insert(code_field.to_string(), Value::from(code));
    }

    for key_field in desc.key_fields {
        if record.get(*key_field).map_or(true, Value::is_null) {
            return Err(ConfigError::MissingField {
                field: key_field.to_string(),
            });
        }
    }

    for (field, value) in &record {
        check_shape(desc, field, value)?;
    }

    let candidate = Value::Object(record);
    if unique_clash(registry.records(), &candidate, desc.key_fields, None)
        || unique_clash(registry.records(), &candidate, desc.unique_fields, None)
    {
        let fields = if desc.key_fields.is_empty() {
            desc.unique_fields
        } else {
            desc.key_fields
        };
        return Err(ConfigError::DuplicateCode {
            kind,
            key: key_text(&candidate, fields),
        });
    }
    let Value::Object(mut record) = candidate else {
        return Err(ConfigError::Internal {
            message: "record is not an object".to_string(),
        });
    };

    let id = desc.id_field.map(|id_field| {
        let id = registry.next_id();
        record.insert(id_field.to_string(), Value::from(id));
        id
    });

    let record = Value::Object(record);
    validate_references(doc, kind, &record)?;

    doc.records_mut(kind)?.push(record);
    Ok(id)
}

/// Apply a partial update to the record named by `key`
///
/// Only the fields in `patch` change. Setting an identity field to its
/// current value is a no-op; changing or clearing it fails.
///
/// # Errors
///
/// - `NotFound` when `key` names no record
/// - `ImmutableField` when the patch changes a code, id or key field
/// - `InvalidField` when a value has the wrong shape or clears a required field
/// - `DuplicateCode` when the update violates a uniqueness constraint
/// - `InvalidReference` when an updated reference does not resolve
pub fn update(doc: &mut Document, kind: EntityKind, key: &EntityKey, patch: &Patch) -> Result<()> {
    let desc = descriptor(kind);
    ensure_mutable(desc, "set")?;
    let registry = Registry::new(doc, kind);
    let index = registry.find(key)?;
    let current = &registry.records()[index];

    let mut next = current.clone();
    let Some(fields) = next.as_object_mut() else {
        return Err(ConfigError::InvalidSection {
            section: kind.section().to_string(),
        });
    };

    for (field, change) in patch.changes() {
        if desc.is_immutable(field) {
            let unchanged = match (change, current.get(field)) {
                (FieldUpdate::Set(v), Some(existing)) => values_match(existing, v),
                _ => false,
            };
            if unchanged {
                continue;
            }
            return Err(ConfigError::ImmutableField {
                kind,
                field: field.clone(),
            });
        }
        match change {
            FieldUpdate::Set(value) => {
                check_shape(desc, field, value)?;
                fields.insert(field.clone(), value.clone());
            }
            FieldUpdate::Clear => {
                check_shape(desc, field, &Value::Null)?;
                fields.insert(field.clone(), Value::Null);
            }
        }
    }

    if &next == current {
        return Ok(());
    }
    if unique_clash(registry.records(), &next, desc.unique_fields, Some(index)) {
        return Err(ConfigError::DuplicateCode {
            kind,
            key: key_text(&next, desc.unique_fields),
        });
    }
    validate_references(doc, kind, &next)?;

    doc.records_mut(kind)?[index] = next;
    Ok(())
}

/// Check a full replacement collection for `kind` before it is written
///
/// Every record must keep its keys and unique fields distinct from the
/// other records, and every populated reference must resolve.
///
/// # Errors
///
/// Returns `DuplicateCode` on a clash or `InvalidReference` for a dangling
/// reference; the first offending record is reported.
pub(crate) fn validate_collection(doc: &Document, kind: EntityKind, records: &[Value]) -> Result<()> {
    let desc = descriptor(kind);
    for (index, record) in records.iter().enumerate() {
        for fields in [desc.key_fields, desc.unique_fields] {
            if unique_clash(records, record, fields, Some(index)) {
                return Err(ConfigError::DuplicateCode {
                    kind,
                    key: key_text(record, fields),
                });
            }
        }
        validate_references(doc, kind, record)?;
    }
    Ok(())
}

struct PendingClear {
    kind: EntityKind,
    index: usize,
    edge: &'static ReferenceEdge,
    removed_id: Option<i64>,
}

struct DeletePlan {
    removals: BTreeSet<(EntityKind, usize)>,
    clears: Vec<PendingClear>,
}

fn referrers<'a>(
    doc: &'a Document,
    edge: &'static ReferenceEdge,
    target: &'a Value,
) -> impl Iterator<Item = usize> + 'a {
    doc.records(edge.from)
        .iter()
        .enumerate()
        .filter(move |(_, r)| points_at(edge, r, target))
        .map(|(i, _)| i)
}

fn plan_delete(
    doc: &Document,
    kind: EntityKind,
    index: usize,
    policy: &dyn DeletePolicy,
) -> Result<DeletePlan> {
    let mut removals = BTreeSet::from([(kind, index)]);
    let mut frontier = vec![(kind, index)];

    loop {
        // Owned dependents go with their owner
        while let Some((k, i)) = frontier.pop() {
            let target = &doc.records(k)[i];
            for edge in edges_to(k).filter(|e| e.ownership == Ownership::Owned) {
                for j in referrers(doc, edge, target) {
                    if removals.insert((edge.from, j)) {
                        frontier.push((edge.from, j));
                    }
                }
            }
        }

        let mut cascades = Vec::new();
        let mut clears = Vec::new();
        let mut blocked = None;
        for &(k, i) in &removals {
            let target = &doc.records(k)[i];
            let target_desc = descriptor(k);
            let removed_id = target_desc.id_field.and_then(|f| get_i64(target, f));
            for edge in edges_to(k).filter(|e| e.ownership == Ownership::Association) {
                for j in referrers(doc, edge, target) {
                    if removals.contains(&(edge.from, j)) {
                        continue;
                    }
                    match policy.on_referenced(k, edge.from) {
                        DeleteAction::Cascade => cascades.push((edge.from, j)),
                        DeleteAction::NullOut if edge.nullable => clears.push(PendingClear {
                            kind: edge.from,
                            index: j,
                            edge,
                            removed_id,
                        }),
                        _ => {
                            blocked.get_or_insert_with(|| ConfigError::ReferencedByOthers {
                                kind: k,
                                key: identity_text(target_desc, target),
                                referenced_by: edge.from,
                                field: edge.field.to_string(),
                            });
                        }
                    }
                }
            }
        }

        if cascades.is_empty() {
            if let Some(err) = blocked {
                return Err(err);
            }
            return Ok(DeletePlan { removals, clears });
        }
        for entry in cascades {
            if removals.insert(entry) {
                frontier.push(entry);
            }
        }
    }
}

/// Delete the record named by `key` together with its owned dependents
///
/// Association references are resolved through `policy`. Removed ids raise
/// their collection's high-water mark so they are never handed out again.
///
/// # Errors
///
/// - `NotFound` when `key` names no record
/// - `ReferencedByOthers` when a remaining reference blocks the delete
pub fn delete(
    doc: &mut Document,
    kind: EntityKind,
    key: &EntityKey,
    policy: &dyn DeletePolicy,
) -> Result<DeleteReport> {
    let desc = descriptor(kind);
    ensure_mutable(desc, "delete")?;
    let index = Registry::new(doc, kind).find(key)?;
    let plan = plan_delete(doc, kind, index, policy)?;

    let mut report = DeleteReport {
        removed: plan.removals.len(),
        cleared: 0,
    };

    for clear in &plan.clears {
        let records = doc.records_mut(clear.kind)?;
        if let Some(Value::Object(record)) = records.get_mut(clear.index) {
            let value = cleared_value(clear.edge, record.get(clear.edge.field), clear.removed_id);
            record.insert(clear.edge.field.to_string(), value);
            report.cleared += 1;
        }
    }

    // Highest index first so earlier indices stay valid
    for &(k, i) in plan.removals.iter().rev() {
        let removed = doc.records_mut(k)?.remove(i);
        if let Some(id) = descriptor(k).id_field.and_then(|f| get_i64(&removed, f)) {
            doc.raise_watermark(k, id);
        }
    }

    Ok(report)
}
