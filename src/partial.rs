//! Reads or rewrites a single top-level key of a database without parsing
//! or rewriting the rest of the file.

use crate::bytes_io;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::index::{IndexRecord, IndexStore};
use crate::paths;
use crate::scanner;
use serde_json::Value;

const SPACE: u8 = b' ';

/// `value_start`/`value_end` of `key` in `full`, after the key's own
/// `"<key>":` pattern at `[key_start, key_end)`, skipping one optional
/// space convention.
fn value_bounds(full: &[u8], key_end: usize) -> Result<(usize, usize)> {
    let value_start = key_end + if full.get(key_end) == Some(&SPACE) { 1 } else { 0 };
    let value_end = scanner::seek_past_value(full, value_start)?;
    Ok((value_start, value_end))
}

/// `partial_read_only`: `Ok(None)` means the key (or the database) was not
/// found, which callers treat as a benign sentinel, not an error.
pub fn partial_read_only(config: &Config, name: &str, key: &str) -> Result<Option<Value>> {
    let candidates = paths::resolve(config, name);
    candidates.check_consistent(name)?;
    if !candidates.exists() {
        return Ok(None);
    }

    let mut index = IndexStore::load(config, name)?;

    if let Some(record) = index.get(key) {
        let slice = bytes_io::read(config, name, Some(record.start), Some(record.end))?;
        if record.matches(&slice) {
            tracing::trace!(name, key, "partial read via index fast path");
            let value = serde_json::from_slice(&slice).map_err(|e| Error::Serialization {
                key: key.to_string(),
                source: e,
            })?;
            return Ok(Some(value));
        }
    }

    tracing::debug!(name, key, "partial read falling back to a full scan");
    let full = bytes_io::read(config, name, None, None)?;
    let Some((key_start, key_end)) = scanner::find_outermost_key(&full, key) else {
        return Ok(None);
    };
    let (value_start, value_end) = value_bounds(&full, key_end)?;
    let (indent_level, indent_with) = scanner::detect_indentation(&full, key_start, &config.indent);
    let slice = &full[value_start..value_end];
    let record = IndexRecord::new(value_start, value_end, indent_level, indent_with, slice);
    index.refresh(name, key, record)?;

    let value = serde_json::from_slice(slice).map_err(|e| Error::Serialization {
        key: key.to_string(),
        source: e,
    })?;
    Ok(Some(value))
}

struct OldRange {
    value_start: usize,
    value_end: usize,
    indent_level: usize,
    indent_with: String,
}

fn locate_for_write(config: &Config, name: &str, key: &str, index: &mut IndexStore) -> Result<OldRange> {
    if let Some(record) = index.get(key) {
        let slice = bytes_io::read(config, name, Some(record.start), Some(record.end))?;
        if record.matches(&slice) {
            return Ok(OldRange {
                value_start: record.start,
                value_end: record.end,
                indent_level: record.indent_level,
                indent_with: record.indent_with.clone(),
            });
        }
    }

    let full = bytes_io::read(config, name, None, None)?;
    let Some((key_start, key_end)) = scanner::find_outermost_key(&full, key) else {
        return Err(Error::KeyNotFound {
            name: name.to_string(),
            key: key.to_string(),
        });
    };
    let (value_start, value_end) = value_bounds(&full, key_end)?;
    let (indent_level, indent_with) = scanner::detect_indentation(&full, key_start, &config.indent);
    Ok(OldRange {
        value_start,
        value_end,
        indent_level,
        indent_with,
    })
}

/// Reindents freshly-serialized bytes, which carry the serializer's own
/// context-free two-space nesting, to sit at `indent_level` copies of
/// `indent_with` inside the surrounding file. Each line's own two-space
/// depth becomes additional levels on top of `indent_level`, so a value
/// nested several levels deep inside itself still lines up with what a
/// from-scratch pretty-print of the whole file would produce. A flat
/// (newline-free) serialization is unaffected.
fn reinject_indentation(serialized: &[u8], indent_level: usize, indent_with: &str) -> Vec<u8> {
    if indent_with.is_empty() {
        return serialized.to_vec();
    }
    let mut out = Vec::with_capacity(serialized.len());
    let mut lines = serialized.split(|&b| b == b'\n');
    if let Some(first) = lines.next() {
        out.extend_from_slice(first);
    }
    for line in lines {
        out.push(b'\n');
        let leading_spaces = line.iter().take_while(|&&b| b == b' ').count();
        let depth = indent_level + leading_spaces / 2;
        out.extend_from_slice(indent_with.repeat(depth).as_bytes());
        out.extend_from_slice(&line[leading_spaces..]);
    }
    out
}

pub fn partial_write(config: &Config, name: &str, key: &str, new_value: &Value) -> Result<()> {
    let candidates = paths::resolve(config, name);
    candidates.check_consistent(name)?;
    if !candidates.exists() {
        return Err(Error::NotFound(name.to_string()));
    }

    let mut index = IndexStore::load(config, name)?;
    let old_range = locate_for_write(config, name, key, &mut index)?;

    let pretty = serde_json::to_vec_pretty(new_value).map_err(|e| Error::Serialization {
        key: key.to_string(),
        source: e,
    })?;
    let serialized = reinject_indentation(&pretty, old_range.indent_level, &old_range.indent_with);
    let new_end = old_range.value_start + serialized.len();

    if config.use_compression {
        let full = bytes_io::read(config, name, None, None)?;
        let mut spliced = Vec::with_capacity(old_range.value_start + serialized.len() + full.len());
        spliced.extend_from_slice(&full[..old_range.value_start]);
        spliced.extend_from_slice(&serialized);
        spliced.extend_from_slice(&full[old_range.value_end..]);
        bytes_io::write(config, name, &spliced, None)?;
    } else {
        let suffix = bytes_io::read(config, name, Some(old_range.value_end), None)?;
        let mut body = serialized.clone();
        body.extend_from_slice(&suffix);
        bytes_io::write(config, name, &body, Some(old_range.value_start))?;
    }

    let record = IndexRecord::new(
        old_range.value_start,
        new_end,
        old_range.indent_level,
        old_range.indent_with,
        &serialized,
    );
    index.write_and_shift(name, key, record, old_range.value_end)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::full;
    use serde_json::json;

    #[test]
    fn reads_keys_after_full_write() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::new(dir.path());
        let value = json!({"a": "Hello{}", "b": [0, 1], "c": {"d": "e"}});
        full::write(&config, "u", &value).unwrap();

        assert_eq!(partial_read_only(&config, "u", "b").unwrap(), Some(json!([0, 1])));
        assert_eq!(partial_read_only(&config, "u", "c").unwrap(), Some(json!({"d": "e"})));
        assert_eq!(partial_read_only(&config, "u", "missing").unwrap(), None);
    }

    #[test]
    fn write_preserves_file_indentation() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::new(dir.path());
        let value = json!({"b": {"c": 2, "d": {"e": 3}}});
        full::write(&config, "t", &value).unwrap();

        partial_write(&config, "t", "b", &json!({"c": 3, "d": {"e": 3}})).unwrap();

        let expected = full::serialize(&config, &json!({"b": {"c": 3, "d": {"e": 3}}})).unwrap();
        let actual = std::fs::read(dir.path().join("t.json")).unwrap();
        assert_eq!(actual, expected);
    }

    #[test]
    fn downstream_entries_shift_after_write() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::new(dir.path());
        full::write(&config, "s", &json!({"x": "a", "y": "b", "z": "c"})).unwrap();

        partial_read_only(&config, "s", "x").unwrap();
        partial_read_only(&config, "s", "y").unwrap();
        partial_read_only(&config, "s", "z").unwrap();

        partial_write(&config, "s", "x", &json!("aaaa")).unwrap();

        assert_eq!(partial_read_only(&config, "s", "z").unwrap(), Some(json!("c")));
    }

    #[test]
    fn write_on_missing_database_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::new(dir.path());
        assert!(partial_write(&config, "missing", "a", &json!(1)).is_err());
    }

    #[test]
    fn write_on_missing_key_is_key_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::new(dir.path());
        full::write(&config, "u", &json!({"a": 1})).unwrap();
        let err = partial_write(&config, "u", "missing", &json!(2)).unwrap_err();
        assert!(matches!(err, Error::KeyNotFound { .. }));
    }

    #[test]
    fn deleting_index_does_not_change_partial_read_result() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::new(dir.path());
        full::write(&config, "u", &json!({"a": 1, "b": 2})).unwrap();
        partial_read_only(&config, "u", "a").unwrap();
        std::fs::remove_file(config.lock_dir().join("u.index")).unwrap();
        assert_eq!(partial_read_only(&config, "u", "b").unwrap(), Some(json!(2)));
    }
}
