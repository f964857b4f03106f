//! Raw config section access

use serde_json::Value;

use crate::errors::{ConfigError, Result};
use crate::model::Document;
use crate::queries::entity_queries::text_matches;

/// Contents of one section
///
/// An array section yields its records, optionally filtered by a
/// case-insensitive substring of each record's JSON text. Any other value
/// yields a one-element list.
///
/// # Errors
///
/// `SectionNotFound` when the document has no such section.
pub fn get_section(doc: &Document, section: &str, contains: Option<&str>) -> Result<Vec<Value>> {
    let value = doc
        .config()
        .get(section)
        .ok_or_else(|| ConfigError::SectionNotFound {
            section: section.to_string(),
        })?;

    let matches = |record: &Value| contains.map_or(true, |needle| text_matches(record, needle));

    Ok(match value {
        Value::Array(records) => records.iter().filter(|r| matches(r)).cloned().collect(),
        other if matches(other) => vec![other.clone()],
        _ => Vec::new(),
    })
}

/// Names of every section in the document, sorted
pub fn list_sections(doc: &Document) -> Vec<String> {
    let mut names: Vec<String> = doc.config().keys().cloned().collect();
    names.sort();
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> Document {
        Document::parse(
            r#"{"G2_CONFIG":{
                "CFG_DSRC":[{"DSRC_ID":1,"DSRC_CODE":"TEST"},{"DSRC_ID":2,"DSRC_CODE":"CUSTOMERS"}],
                "SYS_OOM":{"NAME_HASH":[]}
            }}"#,
        )
        .unwrap()
    }

    #[test]
    fn test_get_section_filters_records() {
        let records = get_section(&doc(), "CFG_DSRC", Some("custom")).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["DSRC_ID"], 2);
    }

    #[test]
    fn test_get_object_section_is_single_value() {
        let records = get_section(&doc(), "SYS_OOM", None).unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].get("NAME_HASH").is_some());
    }

    #[test]
    fn test_get_missing_section() {
        let result = get_section(&doc(), "CFG_NOPE", None);
        assert!(matches!(result, Err(ConfigError::SectionNotFound { .. })));
    }

    #[test]
    fn test_list_sections_sorted() {
        assert_eq!(list_sections(&doc()), vec!["CFG_DSRC", "SYS_OOM"]);
    }
}
