//! In-memory document store for tests and ephemeral use.

use crate::error::{DocStoreError, DocStoreResult};
use crate::name::validate_segment;
use crate::DocumentStore;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

type Namespaces = HashMap<String, HashMap<String, Vec<u8>>>;

/// Keeps every blob in a nested map: username → name → blob.
#[derive(Default)]
pub struct MemoryDocumentStore {
    users: Mutex<Namespaces>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn users(&self) -> MutexGuard<'_, Namespaces> {
        self.users.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn check(username: &str, name: &str) -> DocStoreResult<()> {
    validate_segment("username", username)?;
    validate_segment("document name", name)
}

fn not_found(username: &str, name: &str) -> DocStoreError {
    DocStoreError::NotFound {
        username: username.to_string(),
        name: name.to_string(),
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn put(&self, username: &str, name: &str, blob: &[u8]) -> DocStoreResult<()> {
        check(username, name)?;
        self.users()
            .entry(username.to_string())
            .or_default()
            .insert(name.to_string(), blob.to_vec());
        Ok(())
    }

    fn get(&self, username: &str, name: &str) -> DocStoreResult<Vec<u8>> {
        check(username, name)?;
        self.users()
            .get(username)
            .and_then(|docs| docs.get(name))
            .cloned()
            .ok_or_else(|| not_found(username, name))
    }

    fn list(&self, username: &str) -> DocStoreResult<Vec<String>> {
        validate_segment("username", username)?;
        Ok(self
            .users()
            .get(username)
            .map(|docs| docs.keys().cloned().collect())
            .unwrap_or_default())
    }

    fn delete(&self, username: &str, name: &str) -> DocStoreResult<()> {
        check(username, name)?;
        self.users()
            .get_mut(username)
            .and_then(|docs| docs.remove(name))
            .map(|_| ())
            .ok_or_else(|| not_found(username, name))
    }

    fn exists(&self, username: &str, name: &str) -> DocStoreResult<bool> {
        check(username, name)?;
        Ok(self
            .users()
            .get(username)
            .is_some_and(|docs| docs.contains_key(name)))
    }
}
