//! Serialization layer. Defaults to JSON via serde_json.
//!
//! Implement [`Serializer`] if a replica speaks something other than JSON.

use crate::error::{Error, Result};
use crate::record::{Document, Record};
use serde_json::Value;
use tracing::warn;

/// Converts documents to/from bytes for a replica.
pub trait Serializer: Send + Sync {
    /// Encode a document to bytes.
    fn serialize(&self, doc: &[Record]) -> Result<Vec<u8>>;

    /// Decode bytes back into a document.
    fn deserialize(&self, bytes: &[u8]) -> Result<Document>;
}

/// JSON serializer with optional pretty-printing.
#[derive(Debug, Clone, Default)]
pub struct JsonSerializer {
    pretty: bool,
}

impl JsonSerializer {
    /// Compact JSON (single line, no extra whitespace).
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretty-printed JSON with indentation, easier to read by hand.
    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl Serializer for JsonSerializer {
    fn serialize(&self, doc: &[Record]) -> Result<Vec<u8>> {
        let bytes = if self.pretty {
            serde_json::to_vec_pretty(doc)
        } else {
            serde_json::to_vec(doc)
        };
        bytes.map_err(|e| Error::Serialize(e.to_string()))
    }

    /// Valid JSON that isn't an array (`{}`, `null`, ...) decodes to an empty
    /// document, and array elements that aren't records are dropped. Only
    /// bytes that aren't JSON at all are an error.
    fn deserialize(&self, bytes: &[u8]) -> Result<Document> {
        let Value::Array(items) = serde_json::from_slice::<Value>(bytes)? else {
            return Ok(Document::new());
        };
        let mut doc = Document::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate() {
            match serde_json::from_value::<Record>(item) {
                Ok(record) => doc.push(record),
                Err(err) => warn!(index, %err, "dropping undecodable record"),
            }
        }
        Ok(doc)
    }
}
