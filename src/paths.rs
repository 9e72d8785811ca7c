//! Maps a logical database name to its on-disk candidate paths.

use crate::config::Config;
use crate::error::{Error, Result};
use std::path::PathBuf;

/// The two on-disk forms a database name could take, and which exist.
pub struct Candidates {
    pub json_path: PathBuf,
    pub json_exists: bool,
    pub ddb_path: PathBuf,
    pub ddb_exists: bool,
}

impl Candidates {
    pub fn exists(&self) -> bool {
        self.json_exists || self.ddb_exists
    }

    /// Fails with [`Error::Inconsistent`] if both forms exist.
    pub fn check_consistent(&self, name: &str) -> Result<()> {
        if self.json_exists && self.ddb_exists {
            return Err(Error::Inconsistent(name.to_string()));
        }
        Ok(())
    }
}

/// Returns the two candidate paths for `name` along with their existence.
pub fn resolve(config: &Config, name: &str) -> Candidates {
    let base = config.storage_root.join(name);
    let json_path = base.with_extension("json");
    let ddb_path = base.with_extension("ddb");
    Candidates {
        json_exists: json_path.is_file(),
        ddb_exists: ddb_path.is_file(),
        json_path,
        ddb_path,
    }
}

/// Escapes a database name for use as a lock/index sidecar file name:
/// `/` becomes `___`, `.` becomes `____`.
pub fn escape_name(name: &str) -> String {
    name.replace('/', "___").replace('.', "____")
}

/// Expands a glob pattern (e.g. `"users/*"`) against the storage root,
/// returning every matching database name with its extension stripped.
pub fn list(config: &Config, pattern: &str) -> Result<Vec<String>> {
    let root = &config.storage_root;
    let mut names = std::collections::BTreeSet::new();

    for ext in ["json", "ddb"] {
        let full_pattern = root.join(format!("{pattern}.{ext}"));
        let pattern_str = full_pattern.to_string_lossy().to_string();
        let entries = glob::glob(&pattern_str)
            .map_err(|e| Error::Io {
                name: pattern.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::InvalidInput, e),
            })?;
        for entry in entries {
            let path = entry.map_err(|e| Error::Io {
                name: pattern.to_string(),
                source: e.into(),
            })?;
            let stem = path.with_extension("");
            if let Ok(rel) = stem.strip_prefix(root) {
                let name = rel.to_string_lossy().replace(std::path::MAIN_SEPARATOR, "/");
                names.insert(name);
            }
        }
    }

    Ok(names.into_iter().collect())
}
