//! Canonical document digest

use sha2::{Digest, Sha256};

use crate::errors::Result;
use crate::model::Document;

/// SHA-256 of the canonical serialization, hex encoded
///
/// Two documents with the same content hash identically regardless of the
/// key order of the text they were parsed from.
///
/// # Errors
///
/// Only if serialization itself fails.
pub fn document_digest(doc: &Document) -> Result<String> {
    let text = doc.serialize()?;
    Ok(hex::encode(Sha256::digest(text.as_bytes())))
}
