//! Caller-facing error taxonomy.

use locker_auth::AuthError;
use locker_crypto::CryptoError;
use locker_docstore::DocStoreError;
use thiserror::Error;

/// Result type for locker operations.
pub type LockerResult<T> = Result<T, LockerError>;

/// Errors returned by [`crate::Locker`] and [`crate::LockerSession`].
///
/// All variants are recoverable. Storage problems never render as an
/// authentication failure, and vice versa.
#[derive(Debug, Error)]
pub enum LockerError {
    /// Wrong or missing credential, including unknown usernames.
    #[error("authentication failed: incorrect username or password")]
    Authentication,

    /// Operation attempted on a locked session.
    #[error("locker session is locked")]
    SessionLocked,

    /// Key derivation rejected its input.
    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    /// Encryption failed.
    #[error("encryption failed: {0}")]
    Encryption(String),

    /// Stored document failed its integrity check (tampered, truncated,
    /// moved, or sealed under another key).
    #[error("document integrity check failed: {0}")]
    Integrity(String),

    /// No such document for this user.
    #[error("document not found: {0}")]
    NotFound(String),

    /// Username or document name is not acceptable.
    #[error("invalid name: {0}")]
    InvalidName(String),

    /// Signup was rejected.
    #[error("registration failed: {0}")]
    Registration(String),

    /// Credential or document storage failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// Configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(String),

    /// Unlock did not finish within the allowed time.
    #[error("unlock timed out")]
    Timeout,
}

impl From<CryptoError> for LockerError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::KeyDerivation(msg) => Self::KeyDerivation(msg),
            CryptoError::Encryption(msg) => Self::Encryption(msg),
            CryptoError::Integrity
            | CryptoError::MalformedEnvelope(_)
            | CryptoError::UnsupportedVersion(_) => Self::Integrity(err.to_string()),
        }
    }
}

impl From<DocStoreError> for LockerError {
    fn from(err: DocStoreError) -> Self {
        match err {
            DocStoreError::NotFound { name, .. } => Self::NotFound(name),
            DocStoreError::InvalidName(msg) => Self::InvalidName(msg),
            DocStoreError::Storage(msg) => Self::Storage(msg),
        }
    }
}

impl From<AuthError> for LockerError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidUsername(_)
            | AuthError::EmptyPassword
            | AuthError::UsernameTaken(_) => Self::Registration(err.to_string()),
            AuthError::Storage(_) | AuthError::Corrupt(_) | AuthError::Serialization(_) => {
                Self::Storage(err.to_string())
            }
            AuthError::Crypto(e) => e.into(),
        }
    }
}
