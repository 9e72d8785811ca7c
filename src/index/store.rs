//! Eager-loaded, write-through sidecar index for one database.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::index::record::IndexRecord;
use crate::paths::escape_name;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

pub struct IndexStore {
    path: PathBuf,
    records: BTreeMap<String, IndexRecord>,
}

fn io_err(name: &str, source: std::io::Error) -> Error {
    Error::Io {
        name: name.to_string(),
        source,
    }
}

impl IndexStore {
    /// Loads the sidecar for `name`, starting from an empty map if it's
    /// absent or fails to parse — a corrupt index is never fatal, only
    /// stale, and every lookup is hash-verified by the caller anyway.
    pub fn load(config: &Config, name: &str) -> Result<Self> {
        let lock_dir = config.lock_dir();
        fs::create_dir_all(&lock_dir).map_err(|e| io_err(name, e))?;
        let path = lock_dir.join(format!("{}.index", escape_name(name)));

        let records = fs::read(&path)
            .ok()
            .and_then(|bytes| serde_json::from_slice::<BTreeMap<String, IndexRecord>>(&bytes).ok())
            .unwrap_or_else(|| {
                tracing::debug!(name, "starting from an empty index sidecar");
                BTreeMap::new()
            });

        Ok(Self { path, records })
    }

    pub fn get(&self, key: &str) -> Option<&IndexRecord> {
        self.records.get(key)
    }

    fn persist(&self, name: &str) -> Result<()> {
        let bytes = serde_json::to_vec(&self.records).map_err(|e| Error::Serialization {
            key: name.to_string(),
            source: e,
        })?;
        fs::write(&self.path, bytes).map_err(|e| io_err(name, e))
    }

    /// Replaces `key`'s record with a fresh one (e.g. after a read that
    /// refreshed a stale or missing entry) and persists. No shift: the
    /// byte range didn't move, only got (re)discovered.
    pub fn refresh(&mut self, name: &str, key: &str, record: IndexRecord) -> Result<()> {
        self.records.insert(key.to_string(), record);
        self.persist(name)
    }

    /// Replaces `key`'s record after a partial write, shifting every other
    /// record whose `start` is past the old value's end by
    /// `new_record.end - old_end`, then persists.
    pub fn write_and_shift(&mut self, name: &str, key: &str, new_record: IndexRecord, old_end: usize) -> Result<()> {
        let delta = new_record.end as i64 - old_end as i64;
        let mut shifted = 0;
        for (other_key, record) in self.records.iter_mut() {
            if other_key == key {
                continue;
            }
            if record.start > old_end {
                record.start = (record.start as i64 + delta) as usize;
                record.end = (record.end as i64 + delta) as usize;
                shifted += 1;
            }
        }
        tracing::trace!(name, key, delta, shifted, "shifted downstream index records after partial write");
        self.records.insert(key.to_string(), new_record);
        self.persist(name)
    }
}
