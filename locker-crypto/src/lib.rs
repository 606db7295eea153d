//! Cryptographic primitives for the document locker.
//!
//! - [`derive_key`] turns a password and a salt into a 32-byte [`DerivedKey`]
//!   using Argon2id. Derivation is deterministic: the same password, salt and
//!   [`KdfParams`] always give the same key, so it never has to be stored.
//! - [`hash_password`] produces the fixed-length [`PasswordDigest`] kept in the
//!   credential store. Digests are compared in constant time.
//! - [`encrypt`] / [`decrypt`] seal blobs with ChaCha20-Poly1305. Each call
//!   draws a fresh random nonce and embeds it in the [`EncryptedData`] envelope.
//!
//! # Envelope format
//!
//! ```text
//! [version: u8][nonce: 12 bytes][ciphertext || tag: 16 bytes]
//! ```
//!
//! The version byte is authenticated together with any caller-supplied
//! associated data.

mod cipher;
mod error;
mod key;
mod password;

pub use cipher::{
    decrypt, decrypt_with_aad, encrypt, encrypt_with_aad, EncryptedData, ENVELOPE_VERSION,
    HEADER_SIZE, NONCE_SIZE, TAG_SIZE,
};
pub use error::{CryptoError, CryptoResult};
pub use key::{derive_key, DerivedKey, KdfParams, Salt, KEY_SIZE, SALT_SIZE};
pub use password::{hash_password, PasswordDigest, DIGEST_SIZE};
