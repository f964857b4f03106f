//! Per-thread last-error slot
//!
//! The text boundary reports failure as `None` and leaves the details here.
//! The slot is thread-local, so concurrent callers never see each other's
//! errors. A success does not clear it; `clear_last_error()` does.

use std::cell::RefCell;

use crate::errors::ExError;
use g2config_core_types::schema::ERROR_CODE_NONE;

#[derive(Debug, Clone)]
struct LastError {
    code: i64,
    message: String,
}

thread_local! {
    static LAST_ERROR: RefCell<Option<LastError>> = const { RefCell::new(None) };
}

/// Record `err` as the calling thread's most recent failure
pub fn set_last_error(err: &ExError) {
    let entry = LastError {
        code: err.numeric_code(),
        message: err.to_string(),
    };
    LAST_ERROR.with(|slot| *slot.borrow_mut() = Some(entry));
}

/// Numeric code of the last failure, or 0 when none is recorded
pub fn last_error_code() -> i64 {
    LAST_ERROR.with(|slot| slot.borrow().as_ref().map_or(ERROR_CODE_NONE, |e| e.code))
}

/// Message of the last failure, or an empty string
pub fn last_error_message() -> String {
    LAST_ERROR.with(|slot| {
        slot.borrow()
            .as_ref()
            .map(|e| e.message.clone())
            .unwrap_or_default()
    })
}

pub fn clear_last_error() {
    LAST_ERROR.with(|slot| *slot.borrow_mut() = None);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ExErrorKind;

    #[test]
    fn test_empty_slot_reads_zero() {
        clear_last_error();
        assert_eq!(last_error_code(), 0);
        assert_eq!(last_error_message(), "");
    }

    #[test]
    fn test_set_then_clear() {
        let err = ExError::new(ExErrorKind::NotFound).with_message("data_source not found: X");
        set_last_error(&err);
        assert_eq!(last_error_code(), 3);
        assert!(last_error_message().contains("not found: X"));

        clear_last_error();
        assert_eq!(last_error_code(), 0);
    }

    #[test]
    fn test_newer_failure_overwrites() {
        set_last_error(&ExError::new(ExErrorKind::NotFound));
        set_last_error(&ExError::new(ExErrorKind::DuplicateCode));
        assert_eq!(last_error_code(), 2);
        clear_last_error();
    }
}
