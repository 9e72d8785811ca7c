//! Read/write lock acquisition, orphan reclamation, and the liveness thread
//! that keeps a long-held token from looking abandoned.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::lock::token::{LockToken, Mode, Stage};
use crate::paths::escape_name;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

fn now_ns() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before unix epoch")
        .as_nanos()
}

fn current_id() -> String {
    format!("{}-{:?}", std::process::id(), thread::current().id())
}

fn touch(path: &Path) -> std::io::Result<()> {
    use std::io::ErrorKind;
    match File::options().create_new(true).write(true).open(path) {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(()),
        Err(e) => Err(e),
    }
}

fn unlink_tolerant(path: &Path) -> std::io::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

fn io_err(name: &str, source: std::io::Error) -> Error {
    Error::Io {
        name: name.to_string(),
        source,
    }
}

struct Snapshot {
    tokens: Vec<LockToken>,
}

impl Snapshot {
    /// Scans the lock directory for tokens belonging to `escaped_name`,
    /// reclaiming any that have aged past the orphan timeout along the way.
    /// `exempt` (our own just-created `need` token) is never reclaimed.
    fn take(config: &Config, lock_dir: &Path, escaped_name: &str, exempt: &LockToken) -> Result<Self> {
        fs::create_dir_all(lock_dir).map_err(|e| io_err(escaped_name, e))?;
        let orphan_timeout = config.constants.0.remove_orphan_lock_timeout;
        let mut tokens = Vec::new();

        for entry in fs::read_dir(lock_dir).map_err(|e| io_err(escaped_name, e))? {
            let entry = entry.map_err(|e| io_err(escaped_name, e))?;
            let file_name = entry.file_name();
            let Some(token) = LockToken::parse(&file_name.to_string_lossy()) else {
                continue;
            };
            if token.escaped_name != escaped_name {
                continue;
            }
            if &token != exempt && is_orphaned(&token, orphan_timeout) {
                tracing::debug!(name = escaped_name, file = %file_name.to_string_lossy(), "reclaiming orphaned lock token");
                unlink_tolerant(&entry.path()).map_err(|e| io_err(escaped_name, e))?;
                continue;
            }
            tokens.push(token);
        }
        Ok(Self { tokens })
    }

    fn any_has(&self) -> bool {
        self.tokens.iter().any(|t| t.stage == Stage::Has)
    }

    fn any_write(&self) -> bool {
        self.tokens.iter().any(|t| t.mode == Mode::Write)
    }

    fn any_has_write(&self) -> bool {
        self.tokens
            .iter()
            .any(|t| t.stage == Stage::Has && t.mode == Mode::Write)
    }

    fn any_has_with_id(&self, id: &str) -> bool {
        self.tokens
            .iter()
            .any(|t| t.stage == Stage::Has && t.id == id)
    }

    /// Whether `candidate` has the minimum `(time_ns, id)` among every
    /// `need` token currently on disk (including itself).
    fn is_head(&self, candidate: &LockToken) -> bool {
        self.tokens
            .iter()
            .filter(|t| t.stage == Stage::Need)
            .map(LockToken::fairness_key)
            .min()
            .map(|min_key| min_key == candidate.fairness_key())
            .unwrap_or(true)
    }
}

fn is_orphaned(token: &LockToken, orphan_timeout: Duration) -> bool {
    let age_ns = now_ns().saturating_sub(token.time_ns);
    age_ns > orphan_timeout.as_nanos()
}

/// Blocks until a lock of `mode` on `name` is granted, or fails with
/// [`Error::DoubleLock`] / [`Error::LockTimeout`].
fn acquire(config: &Config, name: &str, mode: Mode) -> Result<Held> {
    let escaped_name = escape_name(name);
    let lock_dir = config.lock_dir();
    fs::create_dir_all(&lock_dir).map_err(|e| io_err(name, e))?;
    let id = current_id();

    let need_token = LockToken::new(escaped_name.clone(), id.clone(), now_ns(), Stage::Need, mode);
    touch(&need_token.path_in(&lock_dir)).map_err(|e| io_err(name, e))?;

    let snapshot = Snapshot::take(config, &lock_dir, &escaped_name, &need_token)?;
    if snapshot.any_has_with_id(&id) {
        unlink_tolerant(&need_token.path_in(&lock_dir)).map_err(|e| io_err(name, e))?;
        return Err(Error::DoubleLock {
            name: name.to_string(),
            mode: mode.as_str(),
        });
    }

    let deadline = Instant::now() + config.constants.0.acquire_lock_timeout;
    let mut snapshot = snapshot;
    loop {
        let grant = match mode {
            Mode::Read => !snapshot.any_write() || (!snapshot.any_has_write() && snapshot.is_head(&need_token)),
            Mode::Write => !snapshot.any_has() && snapshot.is_head(&need_token),
        };

        if grant {
            let has_token = LockToken::new(escaped_name.clone(), id.clone(), now_ns(), Stage::Has, mode);
            touch(&has_token.path_in(&lock_dir)).map_err(|e| io_err(name, e))?;
            unlink_tolerant(&need_token.path_in(&lock_dir)).map_err(|e| io_err(name, e))?;
            let token = Arc::new(Mutex::new(has_token));
            let liveness = spawn_liveness(config.clone(), lock_dir.clone(), Arc::clone(&token));
            return Ok(Held {
                lock_dir,
                name: name.to_string(),
                token,
                liveness: Some(liveness),
            });
        }

        if Instant::now() >= deadline {
            unlink_tolerant(&need_token.path_in(&lock_dir)).map_err(|e| io_err(name, e))?;
            return Err(Error::LockTimeout {
                name: name.to_string(),
                mode: mode.as_str(),
            });
        }

        thread::sleep(config.constants.0.sleep_timeout);
        snapshot = Snapshot::take(config, &lock_dir, &escaped_name, &need_token)?;
    }
}

#[derive(Debug)]
struct Liveness {
    stop: mpsc::Sender<()>,
    handle: JoinHandle<()>,
}

/// Refreshes `token`'s on-disk file (new `time_ns`, old file unlinked) every
/// `keep_alive` interval until the stop signal arrives. `token` is shared
/// with the owning [`Held`] so that whichever filename is most recently on
/// disk is always the one release unlinks, not the grant-time one.
fn spawn_liveness(config: Config, lock_dir: PathBuf, token: Arc<Mutex<LockToken>>) -> Liveness {
    let (stop, stop_rx) = mpsc::channel();
    let keep_alive = config.constants.0.lock_keep_alive_timeout;
    let handle = thread::spawn(move || loop {
        if stop_rx.recv_timeout(keep_alive).is_ok() {
            return;
        }
        let mut current = token.lock().expect("lock token mutex poisoned");
        let refreshed = LockToken::new(
            current.escaped_name.clone(),
            current.id.clone(),
            now_ns(),
            current.stage,
            current.mode,
        );
        if touch(&refreshed.path_in(&lock_dir)).is_ok() {
            let _ = unlink_tolerant(&current.path_in(&lock_dir));
            *current = refreshed;
        }
    });
    Liveness { stop, handle }
}

/// A held lock token plus its liveness thread; releases both on drop.
#[derive(Debug)]
struct Held {
    lock_dir: PathBuf,
    name: String,
    token: Arc<Mutex<LockToken>>,
    liveness: Option<Liveness>,
}

impl Drop for Held {
    fn drop(&mut self) {
        if let Some(liveness) = self.liveness.take() {
            let _ = liveness.stop.send(());
            let _ = liveness.handle.join();
        }
        let current = self.token.lock().expect("lock token mutex poisoned");
        if let Err(e) = unlink_tolerant(&current.path_in(&self.lock_dir)) {
            tracing::warn!(name = %self.name, error = %e, "failed to release lock token");
        }
    }
}

/// Held while a read lock is in effect. Dropping releases it.
#[derive(Debug)]
#[allow(dead_code)]
pub struct ReadGuard(Held);

/// Held while a write lock is in effect. Dropping releases it.
#[derive(Debug)]
#[allow(dead_code)]
pub struct WriteGuard(Held);

pub fn acquire_read(config: &Config, name: &str) -> Result<ReadGuard> {
    acquire(config, name, Mode::Read).map(ReadGuard)
}

pub fn acquire_write(config: &Config, name: &str) -> Result<WriteGuard> {
    acquire(config, name, Mode::Write).map(WriteGuard)
}
