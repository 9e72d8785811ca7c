//! Filesystem-based multi-reader/single-writer lock protocol.
//!
//! The only shared state between contending threads or processes is the
//! directory listing of `<root>/.ddb/`; coordination rides entirely on
//! `open(O_CREAT|O_EXCL)` for token creation and `unlink` for release.

mod manager;
pub(crate) mod token;

pub use manager::{acquire_read, acquire_write, ReadGuard, WriteGuard};
