//! Error types for the crypto layer.

use thiserror::Error;

/// Result type for crypto operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors that can occur in cryptographic operations.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Key derivation rejected its input (empty password, bad parameters).
    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    /// Encryption failed.
    #[error("encryption failed: {0}")]
    Encryption(String),

    /// The authentication tag did not verify: the data was tampered with,
    /// truncated, or sealed under a different key.
    #[error("integrity check failed (wrong key or tampered data)")]
    Integrity,

    /// The envelope is too short or otherwise not parseable.
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),

    /// The envelope was written by an unknown format version.
    #[error("unsupported envelope version: {0}")]
    UnsupportedVersion(u8),
}
