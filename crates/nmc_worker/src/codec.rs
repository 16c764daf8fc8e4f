//! JSON document codec.
//!
//! A document is a single JSON object written wholesale to disk. Values are
//! stored verbatim; the worker never interprets them.

use serde_json::{Map, Value};

use crate::error::WorkerError;

/// A persisted document: top-level keys to opaque values.
pub type Document = Map<String, Value>;

/// Encode a document as pretty-printed JSON.
///
/// # Errors
///
/// Returns [`WorkerError::Json`] if serialisation fails.
pub fn encode_document(document: &Document) -> Result<Vec<u8>, WorkerError> {
    let mut bytes = serde_json::to_vec_pretty(document)?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Decode a document. Empty or whitespace-only input is an empty document.
///
/// # Errors
///
/// Returns [`WorkerError::Json`] for malformed JSON and
/// [`WorkerError::NotAnObject`] if the top-level value is not an object.
pub fn decode_document(bytes: &[u8]) -> Result<Document, WorkerError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Document::new());
    }
    match serde_json::from_slice(bytes)? {
        Value::Object(document) => Ok(document),
        _ => Err(WorkerError::NotAnObject),
    }
}

/// Insert every key of `defaults` that `document` lacks.
///
/// Returns the keys that were added.
pub fn merge_defaults(document: &mut Document, defaults: &Document) -> Vec<String> {
    let mut added = Vec::new();
    for (key, value) in defaults {
        if !document.contains_key(key) {
            document.insert(key.clone(), value.clone());
            added.push(key.clone());
        }
    }
    added
}
