//! Raw byte-level reads and writes of a database file, transparent to its
//! on-disk compression form.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::paths;
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};

fn io_err(name: &str, source: std::io::Error) -> Error {
    Error::Io {
        name: name.to_string(),
        source,
    }
}

/// Reads `[start, end)` of the uncompressed JSON bytes of `name`. `start`
/// defaults to `0`, `end` defaults to the end of file.
pub fn read(config: &Config, name: &str, start: Option<usize>, end: Option<usize>) -> Result<Vec<u8>> {
    let candidates = paths::resolve(config, name);
    candidates.check_consistent(name)?;

    if candidates.json_exists {
        let mut file = File::open(&candidates.json_path).map_err(|e| io_err(name, e))?;
        let start = start.unwrap_or(0);
        file.seek(SeekFrom::Start(start as u64))
            .map_err(|e| io_err(name, e))?;
        let mut buf = Vec::new();
        match end {
            Some(end) => {
                let len = end.saturating_sub(start);
                buf.resize(len, 0);
                let n = read_up_to(&mut file, &mut buf).map_err(|e| io_err(name, e))?;
                buf.truncate(n);
            }
            None => {
                file.read_to_end(&mut buf).map_err(|e| io_err(name, e))?;
            }
        }
        return Ok(buf);
    }

    if candidates.ddb_exists {
        let mut raw = Vec::new();
        File::open(&candidates.ddb_path)
            .and_then(|mut f| f.read_to_end(&mut raw))
            .map_err(|e| io_err(name, e))?;
        let mut decoder = DeflateDecoder::new(&raw[..]);
        let mut json_bytes = Vec::new();
        decoder
            .read_to_end(&mut json_bytes)
            .map_err(|e| io_err(name, e))?;
        let start = start.unwrap_or(0).min(json_bytes.len());
        let end = end.unwrap_or(json_bytes.len()).min(json_bytes.len());
        if start >= end {
            return Ok(Vec::new());
        }
        return Ok(json_bytes[start..end].to_vec());
    }

    Err(Error::NotFound(name.to_string()))
}

/// Reads a file to `buf` until it's full or EOF, returning the number of
/// bytes actually read (shorter than `buf.len()` only at EOF).
fn read_up_to(file: &mut File, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut total = 0;
    while total < buf.len() {
        match file.read(&mut buf[total..])? {
            0 => break,
            n => total += n,
        }
    }
    Ok(total)
}

/// Writes `data` as the full (or ranged) content of `name`'s uncompressed
/// bytes, honoring `config.use_compression` for which on-disk form is
/// produced, and removing the other form only after the new write succeeds.
pub fn write(config: &Config, name: &str, data: &[u8], start: Option<usize>) -> Result<()> {
    let candidates = paths::resolve(config, name);

    if config.use_compression {
        debug_assert!(start.is_none(), "ranged writes are not supported on compressed databases");
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::new(1));
        encoder.write_all(data).map_err(|e| io_err(name, e))?;
        let compressed = encoder.finish().map_err(|e| io_err(name, e))?;
        fs::write(&candidates.ddb_path, compressed).map_err(|e| io_err(name, e))?;
        if candidates.json_exists {
            fs::remove_file(&candidates.json_path).map_err(|e| io_err(name, e))?;
        }
        return Ok(());
    }

    match start {
        None => {
            fs::write(&candidates.json_path, data).map_err(|e| io_err(name, e))?;
        }
        Some(start) => {
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(false)
                .open(&candidates.json_path)
                .map_err(|e| io_err(name, e))?;
            file.set_len(start as u64).map_err(|e| io_err(name, e))?;
            file.seek(SeekFrom::Start(start as u64))
                .map_err(|e| io_err(name, e))?;
            file.write_all(data).map_err(|e| io_err(name, e))?;
        }
    }

    if candidates.ddb_exists {
        fs::remove_file(&candidates.ddb_path).map_err(|e| io_err(name, e))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn round_trips_uncompressed() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::new(dir.path());
        write(&config, "db", b"{\"a\":1}", None).unwrap();
        assert_eq!(read(&config, "db", None, None).unwrap(), b"{\"a\":1}");
    }

    #[test]
    fn ranged_read() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::new(dir.path());
        write(&config, "db", b"0123456789", None).unwrap();
        assert_eq!(read(&config, "db", Some(2), Some(5)).unwrap(), b"234");
    }

    #[test]
    fn ranged_write_truncates_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::new(dir.path());
        write(&config, "db", b"0123456789", None).unwrap();
        write(&config, "db", b"XY", Some(2)).unwrap();
        assert_eq!(read(&config, "db", None, None).unwrap(), b"01XY");
    }

    #[test]
    fn compressed_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::new(dir.path());
        config.use_compression = true;
        write(&config, "db", b"{\"a\":1}", None).unwrap();
        assert!(dir.path().join("db.ddb").is_file());
        assert!(!dir.path().join("db.json").is_file());
        assert_eq!(read(&config, "db", None, None).unwrap(), b"{\"a\":1}");
    }

    #[test]
    fn switching_compression_removes_other_form() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::new(dir.path());
        write(&config, "db", b"{}", None).unwrap();
        config.use_compression = true;
        write(&config, "db", b"{}", None).unwrap();
        assert!(!dir.path().join("db.json").is_file());
        assert!(dir.path().join("db.ddb").is_file());
    }

    #[test]
    fn missing_database_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::new(dir.path());
        assert!(matches!(read(&config, "missing", None, None), Err(Error::NotFound(_))));
    }
}
