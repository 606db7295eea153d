//! Credential verification for the document locker.
//!
//! The [`CredentialStore`] maps usernames to [`CredentialRecord`]s and
//! answers one question: does this password belong to this user? It never
//! stores plaintext, and verification fails closed on every error path.
//!
//! Records are persisted through a [`CredentialBackend`]; the store reloads
//! on each verification so an externally managed `users.json` is always
//! read fresh.

mod backend;
mod error;
mod record;
mod store;

pub use backend::{CredentialBackend, CredentialMap, JsonFileBackend, MemoryBackend};
pub use error::{AuthError, AuthResult};
pub use record::{validate_username, CredentialRecord, MAX_USERNAME_LEN};
pub use store::{CredentialStore, VerifiedCredential};
