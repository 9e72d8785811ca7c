//! The lock token: an empty file whose name is the only data it carries.

use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Need,
    Has,
}

impl Stage {
    fn as_str(self) -> &'static str {
        match self {
            Stage::Need => "need",
            Stage::Has => "has",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "need" => Some(Stage::Need),
            "has" => Some(Stage::Has),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Read,
    Write,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Read => "read",
            Mode::Write => "write",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "read" => Some(Mode::Read),
            "write" => Some(Mode::Write),
            _ => None,
        }
    }
}

/// One lock token: `<escaped_name>.<id>.<time_ns>.<stage>.<mode>.lock`.
///
/// Ordering is by `(time_ns, id)` lexicographically on `id`, matching the
/// fairness rule: the oldest `time_ns` wins, ties broken by `id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockToken {
    pub escaped_name: String,
    pub id: String,
    pub time_ns: u128,
    pub stage: Stage,
    pub mode: Mode,
}

impl LockToken {
    pub fn new(escaped_name: impl Into<String>, id: impl Into<String>, time_ns: u128, stage: Stage, mode: Mode) -> Self {
        Self {
            escaped_name: escaped_name.into(),
            id: id.into(),
            time_ns,
            stage,
            mode,
        }
    }

    pub fn file_name(&self) -> String {
        format!(
            "{}.{}.{}.{}.{}.lock",
            self.escaped_name,
            self.id,
            self.time_ns,
            self.stage.as_str(),
            self.mode.as_str()
        )
    }

    pub fn path_in(&self, lock_dir: &Path) -> PathBuf {
        lock_dir.join(self.file_name())
    }

    /// Parses a lock file name back into its components. `None` if the name
    /// doesn't match the grammar (e.g. a stray file dropped into the lock
    /// directory by something else).
    pub fn parse(file_name: &str) -> Option<Self> {
        let stem = file_name.strip_suffix(".lock")?;
        let mut parts = stem.rsplitn(4, '.');
        let mode = Mode::parse(parts.next()?)?;
        let stage = Stage::parse(parts.next()?)?;
        let time_ns: u128 = parts.next()?.parse().ok()?;
        let rest = parts.next()?; // "<escaped_name>.<id>"
        let (escaped_name, id) = rest.rsplit_once('.')?;
        Some(Self {
            escaped_name: escaped_name.to_string(),
            id: id.to_string(),
            time_ns,
            stage,
            mode,
        })
    }

    /// `(time_ns, id)` as a sort key for fairness ordering.
    pub fn fairness_key(&self) -> (u128, &str) {
        (self.time_ns, &self.id)
    }
}
