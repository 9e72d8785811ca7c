//! Whole-file read/write: parses or serializes an entire database in one
//! pass. The fallback path for reads, and the only path for writes when
//! compression is on (a compressed file can't be overwritten in place).

use crate::bytes_io;
use crate::config::{Config, Indent};
use crate::error::{Error, Result};
use serde_json::Value;

pub fn read(config: &Config, name: &str) -> Result<Value> {
    let bytes = bytes_io::read(config, name, None, None)?;
    serde_json::from_slice(&bytes).map_err(|e| Error::Serialization {
        key: name.to_string(),
        source: e,
    })
}

/// Serializes `value` the way it would be written to disk: pretty with the
/// configured indent unit when uncompressed, compact when compressed —
/// `serde_json::Map`'s default `BTreeMap` backing keeps key order stable
/// either way, without a separate sort pass.
pub fn serialize(config: &Config, value: &Value) -> Result<Vec<u8>> {
    if config.use_compression || matches!(config.indent, Indent::Flat) {
        return serde_json::to_vec(value).map_err(|e| Error::Serialization {
            key: String::new(),
            source: e,
        });
    }
    let unit = config.indent.unit();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(unit.as_bytes());
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    serde::Serialize::serialize(value, &mut ser).map_err(|e| Error::Serialization {
        key: String::new(),
        source: e,
    })?;
    Ok(buf)
}

pub fn write(config: &Config, name: &str, value: &Value) -> Result<()> {
    let bytes = serialize(config, value)?;
    tracing::debug!(name, bytes = bytes.len(), compressed = config.use_compression, "writing full database");
    bytes_io::write(config, name, &bytes, None)
}
