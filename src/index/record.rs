//! One index record: the byte range, indentation, and content hash of a
//! single top-level key, stored on disk as a five-element JSON array.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

type Tuple = (usize, usize, usize, String, String);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Tuple", into = "Tuple")]
pub struct IndexRecord {
    /// Byte offset of the value's first byte.
    pub start: usize,
    /// Byte offset one past the value's last byte.
    pub end: usize,
    /// Number of indent units preceding the key.
    pub indent_level: usize,
    /// The indent unit string, e.g. `"\t"`, `"  "`, or `""`.
    pub indent_with: String,
    /// SHA-256 hex digest of the bytes in `[start, end)`.
    pub value_hash: String,
}

impl IndexRecord {
    pub fn new(start: usize, end: usize, indent_level: usize, indent_with: String, bytes: &[u8]) -> Self {
        Self {
            start,
            end,
            indent_level,
            indent_with,
            value_hash: hash_hex(bytes),
        }
    }

    /// Whether `bytes` (the file's current `[start, end)` slice) still
    /// matches the hash recorded for this key.
    pub fn matches(&self, bytes: &[u8]) -> bool {
        self.value_hash == hash_hex(bytes)
    }
}

pub fn hash_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    hex::encode(digest)
}

impl From<Tuple> for IndexRecord {
    fn from(t: Tuple) -> Self {
        Self {
            start: t.0,
            end: t.1,
            indent_level: t.2,
            indent_with: t.3,
            value_hash: t.4,
        }
    }
}

impl From<IndexRecord> for Tuple {
    fn from(r: IndexRecord) -> Self {
        (r.start, r.end, r.indent_level, r.indent_with, r.value_hash)
    }
}
