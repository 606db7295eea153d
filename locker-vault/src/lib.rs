//! Password-gated encrypted document locker.
//!
//! A [`Locker`] ties together the credential store, key derivation, the
//! cipher envelope and the document store. Callers work through a
//! [`LockerSession`], which is either locked or unlocked for exactly one
//! user:
//!
//! ```text
//!            verify_and_unlock ok
//!   Locked ───────────────────────▶ Unlocked { username, key }
//!     ▲                                  │
//!     └──── lock() / failed unlock ──────┘
//! ```
//!
//! - `upload`, `list`, `delete` require `Unlocked`.
//! - `download` requires `Unlocked` *and* a fresh password check for the
//!   session's user before anything is decrypted.
//! - The derived key lives only inside the `Unlocked` state and is zeroized
//!   when the session locks or is dropped.
//!
//! Documents are sealed with the user's name and the document name as
//! associated data, so a blob moved to another name fails to decrypt.

mod config;
mod error;
mod locker;
mod session;

pub use config::LockerConfig;
pub use error::{LockerError, LockerResult};
pub use locker::Locker;
pub use session::LockerSession;
