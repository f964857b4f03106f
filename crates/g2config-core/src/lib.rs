//! G2 Config Core - schema-aware mutation engine for `G2_CONFIG` documents
//!
//! This crate provides:
//! - The document model with deterministic canonical serialization
//! - Per-kind descriptors, a registry for code/id lookup and id allocation
//! - A static reference graph enforcing integrity on add, set and delete
//! - Typed add/delete/set operations for every entity kind, behind the
//!   `Command` inventory and `apply()`
//! - Entity, view and section queries behind `Query` and `run_query()`
//! - A text boundary with a thread-local last-error slot
//!
//! Every mutation takes a whole document and yields the whole next document
//! or a typed error.

pub mod apply;
pub mod boundary;
pub mod commands;
pub mod digest;
pub mod errors;
pub mod last_error;
pub mod logging_facility;
pub mod model;
pub mod ops;
pub mod policy;
pub mod queries;
pub mod refgraph;
pub mod registry;

// Used by the logging macros so callers need no direct dependency
#[doc(hidden)]
pub use g2config_core_types as core_types;

// Re-export commonly used types
pub use apply::apply;
pub use commands::Command;
pub use digest::document_digest;
pub use errors::{ConfigError, ExError, ExErrorKind, Result};
pub use model::Document;
pub use policy::{CascadePolicy, DeleteAction, DeletePolicy, KindDeletePolicy, RejectReferencedPolicy};
pub use queries::{run_query, Query};
pub use registry::{EntityKey, Registry};
