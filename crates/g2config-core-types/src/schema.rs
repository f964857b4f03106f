//! Canonical schema constants for structured logging and events
//!
//! These constants ensure consistency across all logging and error reporting.

// Canonical field keys for structured logging
pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";

// Entity identifiers
pub const FIELD_ENTITY_KIND: &str = "entity_kind";
pub const FIELD_ENTITY_CODE: &str = "entity_code";
pub const FIELD_ENTITY_ID: &str = "entity_id";

// Collection sizes
pub const FIELD_RESULT_LEN: &str = "result_len";
pub const FIELD_REMOVED_LEN: &str = "removed_len";

// Error fields
pub const FIELD_ERR_KIND: &str = "err.kind";
pub const FIELD_ERR_CODE: &str = "err.code";

// Canonical event names
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";

// Numeric error codes reported through the last-error channel.
// Zero means "no error recorded".
pub const ERROR_CODE_NONE: i64 = 0;
pub const ERROR_CODE_MALFORMED_INPUT: i64 = 1;
pub const ERROR_CODE_DUPLICATE_CODE: i64 = 2;
pub const ERROR_CODE_NOT_FOUND: i64 = 3;
pub const ERROR_CODE_INVALID_REFERENCE: i64 = 4;
pub const ERROR_CODE_REFERENCED_BY_OTHERS: i64 = 5;
pub const ERROR_CODE_IMMUTABLE_FIELD: i64 = 6;
pub const ERROR_CODE_INTERNAL: i64 = 7;
