//! Sensitive data marker for automatic redaction
//!
//! Hashed identifier values (`SYS_OOM` name and SSN hashes) are wrapped in
//! `Sensitive<T>` before they reach a log line or an error message.

use std::fmt;

/// Wrapper that redacts its value in Debug and Display
///
/// # Example
///
/// ```
/// use g2config_core_types::Sensitive;
///
/// let hash = Sensitive::new("7f3a9c");
/// assert_eq!(format!("{:?}", hash), "***REDACTED***");
/// assert_eq!(hash.to_string(), "***REDACTED***");
/// assert_eq!(hash.expose(), &"7f3a9c");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Sensitive<T>(T);

impl<T> Sensitive<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }

    /// Borrow the underlying value
    pub fn expose(&self) -> &T {
        &self.0
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> fmt::Debug for Sensitive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***REDACTED***")
    }
}

impl<T> fmt::Display for Sensitive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***REDACTED***")
    }
}
