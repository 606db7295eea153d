//! Error types for the credential store.

use locker_crypto::CryptoError;
use thiserror::Error;

/// Result type for credential operations.
pub type AuthResult<T> = Result<T, AuthError>;

/// Errors from the credential store.
///
/// A password mismatch is not an error: [`crate::CredentialStore::authenticate`]
/// reports it as `Ok(None)`.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Username is empty or not usable as a storage namespace.
    #[error("invalid username: {0}")]
    InvalidUsername(String),

    /// Password was empty.
    #[error("password must not be empty")]
    EmptyPassword,

    /// Signup with a username that already has a record.
    #[error("username already exists: {0}")]
    UsernameTaken(String),

    /// The backing store could not be read or written.
    #[error("credential storage error: {0}")]
    Storage(String),

    /// The backing store exists but cannot be parsed.
    #[error("credential store is corrupt: {0}")]
    Corrupt(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Hashing failed.
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),
}
