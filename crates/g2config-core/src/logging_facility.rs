//! Structured logging for the configuration engine
//!
//! - `init(profile)` installs the process-wide subscriber once
//! - `log_op_start!`, `log_op_end!` and `log_op_error!` emit the canonical
//!   operation events consumed by dashboards and tests
//! - `init_test_capture()` records events in memory for assertions
//!
//! ```rust
//! use g2config_core::logging_facility::{init, Profile};
//!
//! init(Profile::Development);
//! ```
//!
//! Every event carries `component`, `op` and `event`; errors add
//! `err_kind`, `err_code` and `err_numeric`. Field names come from
//! `g2config_core_types::schema`.

pub mod init;
pub mod macros;
pub mod test_capture;

pub use init::{init, Profile};
pub use test_capture::{init_test_capture, CapturedEvent, TestCapture};
