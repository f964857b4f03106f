pub mod apply;
pub mod digest;
pub mod query;

use g2config_core::Document;
use std::path::Path;

/// Read and parse a configuration document from disk
pub fn load_document(path: &Path) -> Result<Document, Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(path)?;
    Ok(Document::parse(&text)?)
}

/// Read inline JSON, or the contents of a file when prefixed with `@`
pub fn read_request(raw: &str) -> Result<String, Box<dyn std::error::Error>> {
    match raw.strip_prefix('@') {
        Some(path) => Ok(std::fs::read_to_string(path)?),
        None => Ok(raw.to_string()),
    }
}
