//! Blob encryption using ChaCha20-Poly1305.
//!
//! Provides authenticated encryption with associated data (AEAD). Every
//! call to [`encrypt`] draws a fresh nonce from the OS RNG; keys derived from
//! a password are deterministic, so the nonce is the only thing keeping two
//! encryptions of one document apart.

use crate::error::{CryptoError, CryptoResult};
use crate::key::DerivedKey;
use chacha20poly1305::{
    aead::{Aead, KeyInit, Payload},
    ChaCha20Poly1305, Nonce,
};
use rand::RngCore;

/// Size of nonce in bytes (96 bits for ChaCha20-Poly1305).
pub const NONCE_SIZE: usize = 12;

/// Size of authentication tag in bytes.
pub const TAG_SIZE: usize = 16;

/// Current envelope format version.
pub const ENVELOPE_VERSION: u8 = 1;

/// Bytes preceding the ciphertext in a serialized envelope.
pub const HEADER_SIZE: usize = 1 + NONCE_SIZE;

/// Encrypted data with the nonce needed for decryption.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncryptedData {
    /// Envelope format version.
    pub version: u8,
    /// The nonce used for encryption (unique per encryption).
    pub nonce: [u8; NONCE_SIZE],
    /// The encrypted ciphertext (includes auth tag).
    pub ciphertext: Vec<u8>,
}

impl EncryptedData {
    /// Returns the serialized size of the envelope.
    pub fn len(&self) -> usize {
        HEADER_SIZE + self.ciphertext.len()
    }

    /// Returns true if the ciphertext is empty.
    pub fn is_empty(&self) -> bool {
        self.ciphertext.is_empty()
    }

    /// Serializes to the on-disk layout: version, nonce, ciphertext.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.len());
        bytes.push(self.version);
        bytes.extend_from_slice(&self.nonce);
        bytes.extend_from_slice(&self.ciphertext);
        bytes
    }

    /// Parses the on-disk layout. Does not authenticate anything.
    pub fn from_bytes(bytes: &[u8]) -> CryptoResult<Self> {
        if bytes.len() < HEADER_SIZE + TAG_SIZE {
            return Err(CryptoError::MalformedEnvelope(format!(
                "data too short: {} bytes",
                bytes.len()
            )));
        }

        let version = bytes[0];
        if version != ENVELOPE_VERSION {
            return Err(CryptoError::UnsupportedVersion(version));
        }

        let mut nonce = [0u8; NONCE_SIZE];
        nonce.copy_from_slice(&bytes[1..HEADER_SIZE]);
        let ciphertext = bytes[HEADER_SIZE..].to_vec();

        Ok(Self {
            version,
            nonce,
            ciphertext,
        })
    }
}

/// The version byte is always authenticated in front of the caller's data.
fn associated_data(version: u8, aad: &[u8]) -> Vec<u8> {
    let mut bound = Vec::with_capacity(1 + aad.len());
    bound.push(version);
    bound.extend_from_slice(aad);
    bound
}

/// Encrypts plaintext using ChaCha20-Poly1305.
pub fn encrypt(key: &DerivedKey, plaintext: &[u8]) -> CryptoResult<EncryptedData> {
    encrypt_with_aad(key, plaintext, &[])
}

/// Encrypts plaintext, binding `aad` into the authentication tag.
///
/// The same `aad` must be supplied to [`decrypt_with_aad`].
pub fn encrypt_with_aad(
    key: &DerivedKey,
    plaintext: &[u8],
    aad: &[u8],
) -> CryptoResult<EncryptedData> {
    let cipher = ChaCha20Poly1305::new(key.as_bytes().into());

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    rand::rngs::OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let aad = associated_data(ENVELOPE_VERSION, aad);
    let ciphertext = cipher
        .encrypt(
            nonce,
            Payload {
                msg: plaintext,
                aad: &aad,
            },
        )
        .map_err(|e| CryptoError::Encryption(e.to_string()))?;

    Ok(EncryptedData {
        version: ENVELOPE_VERSION,
        nonce: nonce_bytes,
        ciphertext,
    })
}

/// Decrypts ciphertext using ChaCha20-Poly1305.
///
/// Returns [`CryptoError::Integrity`] if the key is wrong or the data was
/// modified.
pub fn decrypt(key: &DerivedKey, encrypted: &EncryptedData) -> CryptoResult<Vec<u8>> {
    decrypt_with_aad(key, encrypted, &[])
}

/// Decrypts ciphertext sealed by [`encrypt_with_aad`] with the same `aad`.
pub fn decrypt_with_aad(
    key: &DerivedKey,
    encrypted: &EncryptedData,
    aad: &[u8],
) -> CryptoResult<Vec<u8>> {
    if encrypted.version != ENVELOPE_VERSION {
        return Err(CryptoError::UnsupportedVersion(encrypted.version));
    }

    let cipher = ChaCha20Poly1305::new(key.as_bytes().into());
    let nonce = Nonce::from_slice(&encrypted.nonce);
    let aad = associated_data(encrypted.version, aad);

    cipher
        .decrypt(
            nonce,
            Payload {
                msg: encrypted.ciphertext.as_ref(),
                aad: &aad,
            },
        )
        .map_err(|_| CryptoError::Integrity)
}
