//! The credential store: signup and password verification.

use crate::backend::{CredentialBackend, CredentialMap, JsonFileBackend, MemoryBackend};
use crate::error::{AuthError, AuthResult};
use crate::record::{validate_username, CredentialRecord};
use locker_crypto::{
    derive_key, hash_password, CryptoResult, DerivedKey, KdfParams, Salt, SALT_SIZE,
};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::{debug, info, warn};

/// Proof that a password matched, carrying what key derivation needs.
#[derive(Clone, Debug)]
pub struct VerifiedCredential {
    username: String,
    key_salt: Salt,
    kdf: KdfParams,
}

impl VerifiedCredential {
    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn key_salt(&self) -> &Salt {
        &self.key_salt
    }

    pub fn kdf(&self) -> &KdfParams {
        &self.kdf
    }

    /// Derives the user's document key from the password just verified.
    pub fn derive_key(&self, password: &str) -> CryptoResult<DerivedKey> {
        derive_key(password, &self.key_salt, &self.kdf)
    }
}

/// Username → password-digest store.
pub struct CredentialStore {
    backend: Box<dyn CredentialBackend>,
    kdf: KdfParams,
    // Serializes `register` within this process. Backends guard against
    // other processes in `update`.
    write_lock: Mutex<()>,
}

impl CredentialStore {
    /// Creates a store over an arbitrary backend. New records use `kdf`.
    pub fn new(backend: Box<dyn CredentialBackend>, kdf: KdfParams) -> Self {
        Self {
            backend,
            kdf,
            write_lock: Mutex::new(()),
        }
    }

    /// Opens a store backed by a JSON file. The file is created on first signup.
    pub fn open(path: impl Into<PathBuf>, kdf: KdfParams) -> Self {
        Self::new(Box::new(JsonFileBackend::new(path)), kdf)
    }

    /// Opens an in-memory store (for testing).
    pub fn open_in_memory(kdf: KdfParams) -> Self {
        Self::new(Box::new(MemoryBackend::new()), kdf)
    }

    /// Parameters applied to new records.
    pub fn kdf(&self) -> &KdfParams {
        &self.kdf
    }

    /// Creates a credential for a new user.
    ///
    /// The username is trimmed before use. A name that differs from an
    /// existing one only in case is taken.
    pub fn register(&self, username: &str, password: &str) -> AuthResult<()> {
        let username = username.trim();
        validate_username(username)?;
        if password.is_empty() {
            return Err(AuthError::EmptyPassword);
        }

        // Reject early, before paying for the digest.
        ensure_available(&self.backend.load()?, username)?;
        let record = CredentialRecord::new(password, &self.kdf)?;

        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        self.backend.update(&mut |map: &mut CredentialMap| {
            ensure_available(map, username)?;
            map.insert(username.to_string(), record.clone());
            Ok(())
        })?;

        info!(username = %username, "Registered new user");
        Ok(())
    }

    /// Checks `password` against the stored record for `username`.
    ///
    /// Returns `Ok(None)` for an unknown user or a wrong password; the two
    /// are indistinguishable, and both pay for one digest computation.
    /// `Err` is reserved for a backing store that cannot be read.
    pub fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> AuthResult<Option<VerifiedCredential>> {
        let username = username.trim();
        if password.is_empty() {
            return Ok(None);
        }

        let map = self.backend.load()?;
        let Some(record) = map.get(username) else {
            // Pay what a known user would, at the costliest parameters on file.
            let kdf = strongest_kdf(&map).unwrap_or(&self.kdf);
            let _ = hash_password(password, &Salt::from_bytes([0; SALT_SIZE]), kdf);
            debug!(username = %username, "Credential check failed");
            return Ok(None);
        };

        let matched = record
            .check(password)
            .map_err(|e| AuthError::Corrupt(format!("record for {username}: {e}")))?;
        if !matched {
            debug!(username = %username, "Credential check failed");
            return Ok(None);
        }

        Ok(Some(VerifiedCredential {
            username: username.to_string(),
            key_salt: record.key_salt.clone(),
            kdf: record.kdf.clone(),
        }))
    }

    /// Fail-closed boolean form of [`authenticate`](Self::authenticate).
    pub fn verify(&self, username: &str, password: &str) -> bool {
        match self.authenticate(username, password) {
            Ok(verified) => verified.is_some(),
            Err(e) => {
                warn!(error = %e, "Credential store unavailable, denying access");
                false
            }
        }
    }

    /// All registered usernames, sorted.
    pub fn usernames(&self) -> AuthResult<Vec<String>> {
        Ok(self.backend.load()?.into_keys().collect())
    }
}

/// Usernames name document directories, and some filesystems fold case.
fn ensure_available(map: &CredentialMap, username: &str) -> AuthResult<()> {
    if map.keys().any(|existing| existing.eq_ignore_ascii_case(username)) {
        return Err(AuthError::UsernameTaken(username.to_string()));
    }
    Ok(())
}

/// The most expensive parameters any stored record uses.
fn strongest_kdf(map: &CredentialMap) -> Option<&KdfParams> {
    map.values().map(|record| &record.kdf).max_by_key(|kdf| {
        (
            u64::from(kdf.memory_cost) * u64::from(kdf.time_cost),
            kdf.parallelism,
        )
    })
}
