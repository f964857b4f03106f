//! Core types shared across the G2 configuration crates
//!
//! This crate provides foundational types used by the engine, its logging
//! facility and the command-line front end:
//!
//! - **Entity kinds**: `EntityKind` and the document section each kind lives in
//! - **Sensitive data**: `Sensitive<T>` marker for automatic redaction
//! - **Schema constants**: Canonical field keys, event names and error codes

pub mod kind;
pub mod schema;
pub mod sensitive;

pub use kind::{EntityKind, UnknownEntityKind};
pub use sensitive::Sensitive;
