//! Field access helpers for JSON records

use serde_json::Value;

use crate::errors::{ConfigError, Result};

pub fn get_i64(record: &Value, field: &str) -> Option<i64> {
    record.get(field).and_then(Value::as_i64)
}

pub fn get_str<'a>(record: &'a Value, field: &str) -> Option<&'a str> {
    record.get(field).and_then(Value::as_str)
}

/// Trim and uppercase a code
///
/// # Errors
///
/// Returns `MissingField` when the code is empty after trimming.
pub fn normalize_code(field: &str, raw: &str) -> Result<String> {
    let code = raw.trim();
    if code.is_empty() {
        return Err(ConfigError::MissingField {
            field: field.to_string(),
        });
    }
    Ok(code.to_uppercase())
}

/// Normalize a yes/no flag to "Yes" or "No"
///
/// # Errors
///
/// Returns `InvalidField` for anything other than yes/no/y/n/true/false.
pub fn yes_no(field: &str, raw: &str) -> Result<&'static str> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "yes" | "y" | "true" => Ok("Yes"),
        "no" | "n" | "false" => Ok("No"),
        _ => Err(ConfigError::InvalidField {
            field: field.to_string(),
            reason: format!("expected Yes or No, got '{}'", raw),
        }),
    }
}

pub fn flag(value: bool) -> &'static str {
    if value {
        "Yes"
    } else {
        "No"
    }
}

/// Compare field values: strings case-insensitively, everything else exactly
pub fn values_match(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::String(a), Value::String(b)) => a.eq_ignore_ascii_case(b),
        _ => a == b,
    }
}

/// Human-readable rendering of a composite key, e.g. `FTYPE_ID=3, FELEM_ID=7`
pub fn key_text(record: &Value, fields: &[&str]) -> String {
    fields
        .iter()
        .map(|f| match record.get(*f) {
            Some(Value::String(s)) => format!("{}={}", f, s),
            Some(v) => format!("{}={}", f, v),
            None => format!("{}=null", f),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_code_trims_and_uppercases() {
        assert_eq!(normalize_code("DSRC_CODE", "  customers ").unwrap(), "CUSTOMERS");
        assert!(matches!(
            normalize_code("DSRC_CODE", "   "),
            Err(ConfigError::MissingField { .. })
        ));
    }

    #[test]
    fn test_yes_no_variants() {
        assert_eq!(yes_no("X", "y").unwrap(), "Yes");
        assert_eq!(yes_no("X", "FALSE").unwrap(), "No");
        assert!(yes_no("X", "sometimes").is_err());
    }

    #[test]
    fn test_key_text() {
        let rec = json!({"FTYPE_ID": 3, "BEHAVIOR": "NAME"});
        assert_eq!(key_text(&rec, &["FTYPE_ID", "BEHAVIOR"]), "FTYPE_ID=3, BEHAVIOR=NAME");
    }
}
