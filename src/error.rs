//! Crate-wide error type.
//!
//! One `thiserror`-derived enum covers every error kind the storage engine
//! can surface, matching the error kinds of the component design.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("database \"{0}\" does not exist")]
    NotFound(String),

    #[error("database \"{0}\" is inconsistent: both .json and .ddb forms exist")]
    Inconsistent(String),

    #[error("database \"{0}\" already exists; pass force_overwrite to replace it")]
    AlreadyExists(String),

    #[error("thread already holds a {mode} lock on \"{name}\"")]
    DoubleLock { name: String, mode: &'static str },

    #[error("timed out waiting for a {mode} lock on \"{name}\"")]
    LockTimeout { name: String, mode: &'static str },

    #[error("key \"{key}\" not found in database \"{name}\"")]
    KeyNotFound { name: String, key: String },

    #[error("malformed JSON in database \"{name}\" at byte {offset}: {reason}")]
    MalformedJson {
        name: String,
        offset: usize,
        reason: String,
    },

    #[error("value for key \"{key}\" could not be serialized: {source}")]
    Serialization {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("io error for database \"{name}\": {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
