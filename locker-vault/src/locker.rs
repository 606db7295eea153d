//! The locker facade: shared stores plus session factory.

use crate::config::LockerConfig;
use crate::error::{LockerError, LockerResult};
use crate::session::{LockerSession, UnlockedState};
use locker_auth::CredentialStore;
use locker_crypto::KdfParams;
use locker_docstore::{DocumentStore, FsDocumentStore, MemoryDocumentStore};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

struct LockerInner {
    credentials: CredentialStore,
    documents: Arc<dyn DocumentStore>,
    unlock_timeout: Duration,
}

/// Entry point for the document locker. Cheap to clone.
#[derive(Clone)]
pub struct Locker {
    inner: Arc<LockerInner>,
}

impl Locker {
    /// Builds a locker over the given stores.
    pub fn new(credentials: CredentialStore, documents: Arc<dyn DocumentStore>) -> Self {
        Self {
            inner: Arc::new(LockerInner {
                credentials,
                documents,
                unlock_timeout: LockerConfig::default().unlock_timeout(),
            }),
        }
    }

    /// Opens the file-backed locker described by `config`.
    pub fn open(config: &LockerConfig) -> LockerResult<Self> {
        let credentials = CredentialStore::open(config.credentials_path(), config.kdf.clone());
        let documents = FsDocumentStore::open(config.documents_dir())?;
        info!(data_dir = %config.data_dir.display(), "Opened document locker");

        Ok(Self {
            inner: Arc::new(LockerInner {
                credentials,
                documents: Arc::new(documents),
                unlock_timeout: config.unlock_timeout(),
            }),
        })
    }

    /// Opens an in-memory locker (for testing).
    pub fn open_in_memory(kdf: KdfParams) -> Self {
        Self::new(
            CredentialStore::open_in_memory(kdf),
            Arc::new(MemoryDocumentStore::new()),
        )
    }

    /// Registers a new user.
    pub fn signup(&self, username: &str, password: &str) -> LockerResult<()> {
        self.inner.credentials.register(username, password)?;
        Ok(())
    }

    /// Starts a new, locked session.
    pub fn session(&self) -> LockerSession {
        LockerSession::new(self.clone())
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.inner.credentials
    }

    pub fn documents(&self) -> &Arc<dyn DocumentStore> {
        &self.inner.documents
    }

    /// Default bound for [`LockerSession::unlock_with_timeout`].
    pub fn unlock_timeout(&self) -> Duration {
        self.inner.unlock_timeout
    }

    /// Verifies a credential without deriving anything.
    ///
    /// A store that cannot be read is `Storage`, not `Authentication`.
    pub(crate) fn check_password(&self, username: &str, password: &str) -> LockerResult<()> {
        match self.inner.credentials.authenticate(username, password)? {
            Some(_) => Ok(()),
            None => {
                warn!(username = %username.trim(), "Password verification failed");
                Err(LockerError::Authentication)
            }
        }
    }

    /// Verifies a credential and derives the user's document key.
    ///
    /// Blocking: runs two Argon2id computations on success.
    pub(crate) fn authorize(&self, username: &str, password: &str) -> LockerResult<UnlockedState> {
        let Some(verified) = self.inner.credentials.authenticate(username, password)? else {
            warn!(username = %username.trim(), "Unlock rejected");
            return Err(LockerError::Authentication);
        };

        let key = verified.derive_key(password)?;
        Ok(UnlockedState::new(verified.username().to_string(), key))
    }
}

impl std::fmt::Debug for Locker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Locker")
            .field("unlock_timeout", &self.inner.unlock_timeout)
            .finish_non_exhaustive()
    }
}
