//! Persistence backends for credential records.

use crate::error::{AuthError, AuthResult};
use crate::record::CredentialRecord;
use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::warn;

/// Username → record, ordered so the JSON file diffs cleanly.
pub type CredentialMap = BTreeMap<String, CredentialRecord>;

/// Loads and saves the whole credential map.
///
/// `save` must be all-or-nothing: a reader sees either the previous map or
/// the new one.
pub trait CredentialBackend: Send + Sync {
    /// Reads the current map. A store that does not exist yet is empty.
    fn load(&self) -> AuthResult<CredentialMap>;

    /// Replaces the stored map.
    fn save(&self, map: &CredentialMap) -> AuthResult<()>;

    /// Loads, applies `apply`, and saves, with no other writer in between.
    ///
    /// Nothing is saved if `apply` fails. The default implementation does
    /// not lock; backends shared between processes override it.
    fn update(
        &self,
        apply: &mut dyn FnMut(&mut CredentialMap) -> AuthResult<()>,
    ) -> AuthResult<()> {
        let mut map = self.load()?;
        apply(&mut map)?;
        self.save(&map)
    }
}

const LOCK_SUFFIX: &str = ".lock";
const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(10);
const LOCK_RETRY_INTERVAL: Duration = Duration::from_millis(20);

/// Pretty-printed JSON file, e.g. `users.json`.
///
/// Updates take an exclusive `<file>.lock` beside the store, so concurrent
/// signups from separate processes cannot overwrite each other. A lock left
/// behind by a crashed process must be removed by hand; until then updates
/// fail with [`AuthError::Storage`] once the lock timeout passes.
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    path: PathBuf,
    lock_timeout: Duration,
}

impl JsonFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }

    /// How long [`update`](CredentialBackend::update) waits for another
    /// writer's lock.
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn lock_path(&self) -> PathBuf {
        let mut path = self.path.clone().into_os_string();
        path.push(LOCK_SUFFIX);
        PathBuf::from(path)
    }

    fn ensure_dir(&self) -> AuthResult<PathBuf> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)
            .map_err(|e| AuthError::Storage(format!("failed to create {}: {e}", dir.display())))?;
        Ok(dir)
    }

    fn acquire_lock(&self) -> AuthResult<LockFile> {
        let path = self.lock_path();
        let deadline = Instant::now() + self.lock_timeout;
        loop {
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(_) => return Ok(LockFile { path }),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    if Instant::now() >= deadline {
                        return Err(AuthError::Storage(format!(
                            "{} is held by another writer (remove it if none is running)",
                            path.display()
                        )));
                    }
                    std::thread::sleep(LOCK_RETRY_INTERVAL);
                }
                Err(e) => {
                    return Err(AuthError::Storage(format!(
                        "failed to create {}: {e}",
                        path.display()
                    )));
                }
            }
        }
    }
}

/// Removes the lock file when dropped.
struct LockFile {
    path: PathBuf,
}

impl Drop for LockFile {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), error = %e, "Failed to release credential lock");
        }
    }
}

impl CredentialBackend for JsonFileBackend {
    fn load(&self) -> AuthResult<CredentialMap> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(CredentialMap::new()),
            Err(e) => {
                return Err(AuthError::Storage(format!(
                    "failed to read {}: {e}",
                    self.path.display()
                )));
            }
        };

        serde_json::from_str(&contents)
            .map_err(|e| AuthError::Corrupt(format!("{}: {e}", self.path.display())))
    }

    fn save(&self, map: &CredentialMap) -> AuthResult<()> {
        let dir = self.ensure_dir()?;
        let json = serde_json::to_vec_pretty(map)?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir)
            .map_err(|e| AuthError::Storage(format!("failed to create temp file: {e}")))?;
        tmp.write_all(&json)
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| AuthError::Storage(format!("failed to write credentials: {e}")))?;
        tmp.persist(&self.path).map_err(|e| {
            AuthError::Storage(format!("failed to replace {}: {}", self.path.display(), e.error))
        })?;

        Ok(())
    }

    fn update(
        &self,
        apply: &mut dyn FnMut(&mut CredentialMap) -> AuthResult<()>,
    ) -> AuthResult<()> {
        self.ensure_dir()?;
        let _lock = self.acquire_lock()?;

        let mut map = self.load()?;
        apply(&mut map)?;
        self.save(&map)
    }
}

/// In-memory backend for tests and embedding.
#[derive(Default)]
pub struct MemoryBackend {
    map: Mutex<CredentialMap>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn map(&self) -> MutexGuard<'_, CredentialMap> {
        self.map.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl CredentialBackend for MemoryBackend {
    fn load(&self) -> AuthResult<CredentialMap> {
        Ok(self.map().clone())
    }

    fn save(&self, map: &CredentialMap) -> AuthResult<()> {
        *self.map() = map.clone();
        Ok(())
    }

    fn update(
        &self,
        apply: &mut dyn FnMut(&mut CredentialMap) -> AuthResult<()>,
    ) -> AuthResult<()> {
        let mut stored = self.map();
        let mut map = stored.clone();
        apply(&mut map)?;
        *stored = map;
        Ok(())
    }
}
