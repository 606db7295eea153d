//! Storage for encrypted documents, scoped per user.
//!
//! A [`DocumentStore`] maps `(username, name)` to an opaque blob. It knows
//! nothing about encryption: callers hand it bytes that are already sealed.
//! Both key parts are validated as single path segments, so one user's
//! namespace can never reach into another's.

mod error;
mod fs;
mod memory;
mod name;

pub use error::{DocStoreError, DocStoreResult};
pub use fs::{FsDocumentStore, ENCRYPTED_SUFFIX};
pub use memory::MemoryDocumentStore;
pub use name::{validate_segment, MAX_SEGMENT_LEN};

/// Blob storage keyed by `(username, name)`.
pub trait DocumentStore: Send + Sync {
    /// Stores `blob`, replacing any existing blob with the same name.
    ///
    /// Either fully succeeds or leaves the previous blob readable.
    fn put(&self, username: &str, name: &str, blob: &[u8]) -> DocStoreResult<()>;

    /// Reads a blob. [`DocStoreError::NotFound`] if absent.
    fn get(&self, username: &str, name: &str) -> DocStoreResult<Vec<u8>>;

    /// Names stored for `username`, in no particular order.
    fn list(&self, username: &str) -> DocStoreResult<Vec<String>>;

    /// Removes a blob. [`DocStoreError::NotFound`] if absent.
    fn delete(&self, username: &str, name: &str) -> DocStoreResult<()>;

    /// Whether a blob exists.
    fn exists(&self, username: &str, name: &str) -> DocStoreResult<bool> {
        match self.get(username, name) {
            Ok(_) => Ok(true),
            Err(DocStoreError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }
}
