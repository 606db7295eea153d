//! Password digests for the credential store.
//!
//! A digest is Argon2id over the password with the record's own hash salt.
//! The hash salt is independent of the key salt, so the stored digest never
//! equals the encryption key.

use crate::error::{CryptoError, CryptoResult};
use crate::key::{KdfParams, Salt};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Size of a password digest in bytes.
pub const DIGEST_SIZE: usize = 32;

/// A fixed-length password digest.
#[derive(Clone)]
pub struct PasswordDigest {
    bytes: [u8; DIGEST_SIZE],
}

impl PasswordDigest {
    /// Creates a digest from raw bytes.
    pub fn from_bytes(bytes: [u8; DIGEST_SIZE]) -> Self {
        Self { bytes }
    }

    /// Returns the digest bytes.
    pub fn as_bytes(&self) -> &[u8; DIGEST_SIZE] {
        &self.bytes
    }

    /// Compares two digests without short-circuiting on the first
    /// differing byte.
    pub fn matches(&self, other: &PasswordDigest) -> bool {
        let mut diff = 0u8;
        for (a, b) in self.bytes.iter().zip(other.bytes.iter()) {
            diff |= a ^ b;
        }
        diff == 0
    }

    /// Encodes to base64.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.bytes)
    }

    /// Decodes from base64.
    pub fn from_base64(encoded: &str) -> CryptoResult<Self> {
        let bytes = STANDARD
            .decode(encoded)
            .map_err(|e| CryptoError::MalformedEnvelope(format!("invalid digest encoding: {e}")))?;
        let bytes: [u8; DIGEST_SIZE] = bytes.as_slice().try_into().map_err(|_| {
            CryptoError::MalformedEnvelope(format!(
                "invalid digest length: expected {DIGEST_SIZE}, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self { bytes })
    }
}

impl std::fmt::Debug for PasswordDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordDigest")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

impl Serialize for PasswordDigest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base64())
    }
}

impl<'de> Deserialize<'de> for PasswordDigest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        Self::from_base64(&encoded).map_err(serde::de::Error::custom)
    }
}

/// Hashes a password for storage and later comparison.
///
/// Deterministic for a given `(password, salt, params)`. Empty passwords are
/// rejected with [`CryptoError::KeyDerivation`].
pub fn hash_password(
    password: &str,
    salt: &Salt,
    params: &KdfParams,
) -> CryptoResult<PasswordDigest> {
    if password.is_empty() {
        return Err(CryptoError::KeyDerivation("empty password".to_string()));
    }

    let mut bytes = [0u8; DIGEST_SIZE];
    params
        .argon2()?
        .hash_password_into(password.as_bytes(), salt.as_bytes(), &mut bytes)
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;

    Ok(PasswordDigest::from_bytes(bytes))
}
