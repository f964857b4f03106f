//! Delete policy trait and implementations
//!
//! When a delete finds records that still reference the target through an
//! association edge, the `DeletePolicy` injected into `apply()` decides what
//! happens to them. Owned dependents (bill-of-material rows, a feature's
//! calls, a plan's thresholds) are always removed with their owner and never
//! consult the policy.

use std::collections::HashMap;

use g2config_core_types::EntityKind;

/// What to do with a record that references an entity being deleted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteAction {
    /// Fail the delete with referenced-by-others
    Reject,
    /// Delete the referencing record too
    Cascade,
    /// Clear the reference field; falls back to `Reject` when the field is
    /// not nullable
    NullOut,
}

/// Policy trait for deletes that would leave dangling references
pub trait DeletePolicy {
    /// Decide the action for `referencing` records pointing at a deleted
    /// `target` record
    fn on_referenced(&self, target: EntityKind, referencing: EntityKind) -> DeleteAction;
}

/// Default policy: any remaining reference blocks the delete
///
/// # Example
/// ```
/// use g2config_core::policy::{DeleteAction, DeletePolicy, RejectReferencedPolicy};
/// use g2config_core_types::EntityKind;
///
/// let policy = RejectReferencedPolicy;
/// assert_eq!(
///     policy.on_referenced(EntityKind::Feature, EntityKind::Attribute),
///     DeleteAction::Reject
/// );
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct RejectReferencedPolicy;

impl DeletePolicy for RejectReferencedPolicy {
    fn on_referenced(&self, _target: EntityKind, _referencing: EntityKind) -> DeleteAction {
        DeleteAction::Reject
    }
}

/// Deletes every referencing record, recursively
#[derive(Debug, Clone, Copy, Default)]
pub struct CascadePolicy;

impl DeletePolicy for CascadePolicy {
    fn on_referenced(&self, _target: EntityKind, _referencing: EntityKind) -> DeleteAction {
        DeleteAction::Cascade
    }
}

/// Policy configured per deleted entity kind
///
/// # Example
/// ```
/// use g2config_core::policy::{DeleteAction, DeletePolicy, KindDeletePolicy};
/// use g2config_core_types::EntityKind;
///
/// let policy = KindDeletePolicy::new(DeleteAction::Reject)
///     .with(EntityKind::Fragment, DeleteAction::NullOut);
///
/// assert_eq!(
///     policy.on_referenced(EntityKind::Fragment, EntityKind::Rule),
///     DeleteAction::NullOut
/// );
/// assert_eq!(
///     policy.on_referenced(EntityKind::Element, EntityKind::Attribute),
///     DeleteAction::Reject
/// );
/// ```
#[derive(Debug, Clone)]
pub struct KindDeletePolicy {
    default: DeleteAction,
    overrides: HashMap<EntityKind, DeleteAction>,
}

impl KindDeletePolicy {
    pub fn new(default: DeleteAction) -> Self {
        Self {
            default,
            overrides: HashMap::new(),
        }
    }

    /// Set the action used when an entity of `target` kind is deleted
    pub fn with(mut self, target: EntityKind, action: DeleteAction) -> Self {
        self.overrides.insert(target, action);
        self
    }
}

impl Default for KindDeletePolicy {
    fn default() -> Self {
        Self::new(DeleteAction::Reject)
    }
}

impl DeletePolicy for KindDeletePolicy {
    fn on_referenced(&self, target: EntityKind, _referencing: EntityKind) -> DeleteAction {
        self.overrides
            .get(&target)
            .copied()
            .unwrap_or(self.default)
    }
}
