//! The safe I/O facade: pairs every public operation with the lock mode
//! it requires.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::full;
use crate::lock;
use crate::partial;
use crate::paths;
use serde_json::Value;
use std::fs;

/// One storage engine instance, bound to a `Config`. Cheap to clone — the
/// config itself is the only state, everything else lives on disk.
#[derive(Clone)]
pub struct Engine {
    config: Config,
}

impl Engine {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// No lock: existence is a point-in-time best-effort check, same as
    /// the path resolver it delegates to.
    pub fn exists(&self, name: &str) -> bool {
        paths::resolve(&self.config, name).exists()
    }

    pub fn read(&self, name: &str) -> Result<Value> {
        let _guard = lock::acquire_read(&self.config, name)?;
        full::read(&self.config, name)
    }

    pub fn partial_read(&self, name: &str, key: &str) -> Result<Option<Value>> {
        let _guard = lock::acquire_read(&self.config, name)?;
        partial::partial_read_only(&self.config, name, key)
    }

    pub fn write(&self, name: &str, value: &Value) -> Result<()> {
        let _guard = lock::acquire_write(&self.config, name)?;
        tracing::debug!(name, "full write under write lock");
        full::write(&self.config, name, value)
    }

    /// Fails with [`Error::AlreadyExists`] if `name` already exists, unless
    /// `force_overwrite` is set.
    pub fn create(&self, name: &str, value: &Value, force_overwrite: bool) -> Result<()> {
        let _guard = lock::acquire_write(&self.config, name)?;
        if !force_overwrite && paths::resolve(&self.config, name).exists() {
            return Err(Error::AlreadyExists(name.to_string()));
        }
        tracing::debug!(name, force_overwrite, "creating database");
        full::write(&self.config, name, value)
    }

    pub fn partial_write(&self, name: &str, key: &str, value: &Value) -> Result<()> {
        let _guard = lock::acquire_write(&self.config, name)?;
        partial::partial_write(&self.config, name, key, value)
    }

    pub fn delete(&self, name: &str) -> Result<()> {
        let _guard = lock::acquire_write(&self.config, name)?;
        tracing::info!(name, "deleting database");
        let candidates = paths::resolve(&self.config, name);
        if candidates.json_exists {
            fs::remove_file(&candidates.json_path).map_err(|e| Error::Io {
                name: name.to_string(),
                source: e,
            })?;
        }
        if candidates.ddb_exists {
            fs::remove_file(&candidates.ddb_path).map_err(|e| Error::Io {
                name: name.to_string(),
                source: e,
            })?;
        }
        Ok(())
    }

    pub fn list(&self, pattern: &str) -> Result<Vec<String>> {
        paths::list(&self.config, pattern)
    }
}
