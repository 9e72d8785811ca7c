//! Process-wide configuration block.
//!
//! Held as a value on each [`crate::Engine`] instance rather than behind a
//! mutable global — see SPEC_FULL.md's design note on process-wide
//! configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// How a serialized value is indented when written to an uncompressed file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Indent {
    /// No indentation; values are written compact.
    Flat,
    /// `n` spaces per indent level.
    Spaces(usize),
    /// An arbitrary indent unit, e.g. `"\t"`.
    Custom(String),
}

impl Indent {
    pub fn unit(&self) -> String {
        match self {
            Indent::Flat => String::new(),
            Indent::Spaces(n) => " ".repeat(*n),
            Indent::Custom(s) => s.clone(),
        }
    }
}

impl Default for Indent {
    fn default() -> Self {
        Indent::Custom("\t".to_string())
    }
}

/// Timing constants governing the lock protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationalConstants {
    /// How long to sleep between snapshots while waiting for a lock grant.
    pub sleep_timeout: Duration,
    /// Refresh cadence for a held lock token's liveness heartbeat.
    pub lock_keep_alive_timeout: Duration,
    /// Age at which an unrefreshed lock token is presumed abandoned.
    pub remove_orphan_lock_timeout: Duration,
    /// Total time a lock acquisition attempt may wait before failing.
    pub acquire_lock_timeout: Duration,
}

impl Default for OperationalConstants {
    fn default() -> Self {
        Self {
            sleep_timeout: Duration::from_millis(1),
            lock_keep_alive_timeout: Duration::from_secs(10),
            remove_orphan_lock_timeout: Duration::from_secs(20),
            acquire_lock_timeout: Duration::from_secs(60),
        }
    }
}

/// Configuration for one storage engine instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Root directory under which every database name resolves.
    pub storage_root: PathBuf,
    /// Whether new/rewritten databases are stored DEFLATE-compressed (`.ddb`).
    pub use_compression: bool,
    /// Indent unit used when writing uncompressed files.
    pub indent: Indent,

    #[serde(skip, default)]
    pub constants: OperationalConstantsConfig,
}

/// Serde can't derive `Duration`-bearing structs with the field names we
/// want, so the timing knobs live in their own skip-serialized wrapper with
/// plain setters on [`Config`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OperationalConstantsConfig(pub OperationalConstants);

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_root: PathBuf::from("./ddb_storage"),
            use_compression: false,
            indent: Indent::default(),
            constants: OperationalConstantsConfig::default(),
        }
    }
}

impl Config {
    pub fn new(storage_root: impl AsRef<Path>) -> Self {
        Self {
            storage_root: storage_root.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    pub fn with_compression(mut self, use_compression: bool) -> Self {
        self.use_compression = use_compression;
        self
    }

    pub fn with_indent(mut self, indent: Indent) -> Self {
        self.indent = indent;
        self
    }

    pub fn with_constants(mut self, constants: OperationalConstants) -> Self {
        self.constants = OperationalConstantsConfig(constants);
        self
    }

    /// Directory holding index sidecars and lock tokens: `<root>/.ddb`.
    pub fn lock_dir(&self) -> PathBuf {
        self.storage_root.join(".ddb")
    }
}
