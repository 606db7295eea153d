//! Per-caller locker session state machine.

use crate::error::{LockerError, LockerResult};
use crate::locker::Locker;
use locker_crypto::{decrypt_with_aad, encrypt_with_aad, DerivedKey, EncryptedData};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

/// Key material for an unlocked session. Only reachable through
/// [`SessionState::Unlocked`].
pub(crate) struct UnlockedState {
    username: String,
    key: DerivedKey,
}

impl UnlockedState {
    pub(crate) fn new(username: String, key: DerivedKey) -> Self {
        Self { username, key }
    }
}

enum SessionState {
    Locked,
    Unlocked(UnlockedState),
}

impl SessionState {
    fn unlocked(&self) -> LockerResult<&UnlockedState> {
        match self {
            SessionState::Unlocked(unlocked) => Ok(unlocked),
            SessionState::Locked => Err(LockerError::SessionLocked),
        }
    }
}

/// Associated data binding a blob to its owner and name.
fn document_aad(username: &str, name: &str) -> Vec<u8> {
    let mut aad = Vec::with_capacity(16 + username.len() + name.len());
    aad.extend_from_slice(b"doclocker/v1\0");
    aad.extend_from_slice(username.as_bytes());
    aad.push(0);
    aad.extend_from_slice(name.as_bytes());
    aad
}

/// A caller's view of the locker, locked until a password is verified.
///
/// All methods take `&self`; the session can be shared between threads and
/// every transition is atomic.
pub struct LockerSession {
    locker: Locker,
    state: Mutex<SessionState>,
}

impl LockerSession {
    pub(crate) fn new(locker: Locker) -> Self {
        Self {
            locker,
            state: Mutex::new(SessionState::Locked),
        }
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        // The state is a plain value; a panic elsewhere cannot leave it torn.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn install(&self, unlocked: UnlockedState) {
        let username = unlocked.username.clone();
        *self.state() = SessionState::Unlocked(unlocked);
        info!(username = %username, "Locker unlocked");
    }

    /// Whether the session currently holds a key.
    pub fn is_unlocked(&self) -> bool {
        matches!(*self.state(), SessionState::Unlocked(_))
    }

    /// The user this session is unlocked for.
    pub fn username(&self) -> Option<String> {
        self.state().unlocked().ok().map(|u| u.username.clone())
    }

    /// Verifies `password` for `username` and, on success, unlocks the
    /// session with that user's derived key.
    ///
    /// Any failure leaves the session locked, even if it was unlocked before.
    pub fn verify_and_unlock(&self, username: &str, password: &str) -> LockerResult<()> {
        // Derivation is slow; keep it outside the state lock.
        match self.locker.authorize(username, password) {
            Ok(unlocked) => {
                self.install(unlocked);
                Ok(())
            }
            Err(e) => {
                self.lock();
                Err(e)
            }
        }
    }

    /// [`verify_and_unlock`](Self::verify_and_unlock) on the blocking pool,
    /// giving up after `timeout`.
    ///
    /// A derivation that finishes after the deadline is discarded; it never
    /// unlocks the session.
    pub async fn unlock_with_timeout(
        &self,
        username: &str,
        password: &str,
        timeout: Duration,
    ) -> LockerResult<()> {
        let locker = self.locker.clone();
        let username = username.to_string();
        let password = Zeroizing::new(password.to_string());
        let task = tokio::task::spawn_blocking(move || locker.authorize(&username, &password));

        let result = match tokio::time::timeout(timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => Err(LockerError::KeyDerivation(format!(
                "unlock task failed: {join_err}"
            ))),
            Err(_) => {
                warn!(timeout_ms = timeout.as_millis() as u64, "Unlock timed out");
                Err(LockerError::Timeout)
            }
        };

        match result {
            Ok(unlocked) => {
                self.install(unlocked);
                Ok(())
            }
            Err(e) => {
                self.lock();
                Err(e)
            }
        }
    }

    /// Locks the session and drops the key. Stored documents are untouched.
    pub fn lock(&self) {
        let previous = std::mem::replace(&mut *self.state(), SessionState::Locked);
        if let SessionState::Unlocked(unlocked) = previous {
            info!(username = %unlocked.username, "Locker locked");
        }
    }

    /// Encrypts `plaintext` and stores it as `name`, replacing any existing
    /// document with that name.
    pub fn upload(&self, name: &str, plaintext: &[u8]) -> LockerResult<()> {
        let state = self.state();
        let unlocked = state.unlocked()?;

        let aad = document_aad(&unlocked.username, name);
        let sealed = encrypt_with_aad(&unlocked.key, plaintext, &aad)?;
        self.locker
            .documents()
            .put(&unlocked.username, name, &sealed.to_bytes())?;

        debug!(username = %unlocked.username, name = %name, size = plaintext.len(), "Uploaded document");
        Ok(())
    }

    /// Re-verifies `password` for the session's user, then returns the
    /// decrypted document.
    ///
    /// The check runs on every call, whether or not the session has been
    /// unlocked for a while. Order of failures: `SessionLocked`, then
    /// `Authentication`, then `NotFound`, then `Integrity`.
    pub fn download(&self, name: &str, password: &str) -> LockerResult<Vec<u8>> {
        let username = self.state().unlocked()?.username.clone();

        self.locker.check_password(&username, password)?;

        let state = self.state();
        let unlocked = state.unlocked()?;
        if unlocked.username != username {
            // Re-unlocked as someone else while we were verifying.
            return Err(LockerError::Authentication);
        }

        let blob = self.locker.documents().get(&username, name)?;
        let encrypted = EncryptedData::from_bytes(&blob)?;
        let plaintext = decrypt_with_aad(&unlocked.key, &encrypted, &document_aad(&username, name))
            .inspect_err(|_| warn!(username = %username, name = %name, "Document failed integrity check"))?;

        debug!(username = %username, name = %name, "Downloaded document");
        Ok(plaintext)
    }

    /// Names of the session user's documents, sorted for display.
    pub fn list(&self) -> LockerResult<Vec<String>> {
        let state = self.state();
        let unlocked = state.unlocked()?;
        let mut names = self.locker.documents().list(&unlocked.username)?;
        names.sort();
        Ok(names)
    }

    /// Deletes one of the session user's documents.
    pub fn delete(&self, name: &str) -> LockerResult<()> {
        let state = self.state();
        let unlocked = state.unlocked()?;
        self.locker.documents().delete(&unlocked.username, name)?;
        info!(username = %unlocked.username, name = %name, "Deleted document");
        Ok(())
    }
}

impl std::fmt::Debug for LockerSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockerSession")
            .field("unlocked", &self.is_unlocked())
            .finish_non_exhaustive()
    }
}
