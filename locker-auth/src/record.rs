//! The persisted credential record.

use crate::error::{AuthError, AuthResult};
use chrono::{DateTime, Utc};
use locker_crypto::{hash_password, KdfParams, PasswordDigest, Salt};
use serde::{Deserialize, Serialize};

/// Longest accepted username, in bytes.
pub const MAX_USERNAME_LEN: usize = 64;

/// Everything stored about one user.
///
/// `hash_salt` feeds the password digest and `key_salt` feeds the document
/// key, so the two never coincide.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CredentialRecord {
    pub password_hash: PasswordDigest,
    pub hash_salt: Salt,
    pub key_salt: Salt,
    pub kdf: KdfParams,
    pub created_at: DateTime<Utc>,
}

impl CredentialRecord {
    /// Creates a record for `password` with fresh random salts.
    pub fn new(password: &str, kdf: &KdfParams) -> AuthResult<Self> {
        if password.is_empty() {
            return Err(AuthError::EmptyPassword);
        }

        let hash_salt = Salt::random();
        let password_hash = hash_password(password, &hash_salt, kdf)?;

        Ok(Self {
            password_hash,
            hash_salt,
            key_salt: Salt::random(),
            kdf: kdf.clone(),
            created_at: Utc::now(),
        })
    }

    /// Re-hashes `password` and compares digests in constant time.
    pub fn check(&self, password: &str) -> AuthResult<bool> {
        let candidate = hash_password(password, &self.hash_salt, &self.kdf)?;
        Ok(self.password_hash.matches(&candidate))
    }
}

/// Checks that a username can double as a storage namespace.
///
/// Accepts 1 to [`MAX_USERNAME_LEN`] characters from `[A-Za-z0-9_.-]`,
/// not starting with `.`.
pub fn validate_username(username: &str) -> AuthResult<()> {
    if username.is_empty() {
        return Err(AuthError::InvalidUsername("username is empty".to_string()));
    }
    if username.len() > MAX_USERNAME_LEN {
        return Err(AuthError::InvalidUsername(format!(
            "username longer than {MAX_USERNAME_LEN} bytes"
        )));
    }
    if username.starts_with('.') {
        return Err(AuthError::InvalidUsername(format!(
            "{username:?} starts with '.'"
        )));
    }
    if let Some(c) = username
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')))
    {
        return Err(AuthError::InvalidUsername(format!(
            "{username:?} contains {c:?}"
        )));
    }
    Ok(())
}
