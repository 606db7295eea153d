//! Filesystem-backed document store.
//!
//! Layout: `<root>/<username>/<name>.encrypted`, one file per document.

use crate::error::{DocStoreError, DocStoreResult};
use crate::name::validate_segment;
use crate::DocumentStore;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Suffix appended to every stored document file.
pub const ENCRYPTED_SUFFIX: &str = ".encrypted";

/// Stores each blob as a file under a per-user directory.
#[derive(Debug, Clone)]
pub struct FsDocumentStore {
    root: PathBuf,
}

impl FsDocumentStore {
    /// Opens (or creates) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> DocStoreResult<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|e| {
            DocStoreError::Storage(format!("failed to create {}: {e}", root.display()))
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn user_dir(&self, username: &str) -> DocStoreResult<PathBuf> {
        validate_segment("username", username)?;
        Ok(self.root.join(username))
    }

    fn document_path(&self, username: &str, name: &str) -> DocStoreResult<PathBuf> {
        let dir = self.user_dir(username)?;
        validate_segment("document name", name)?;
        Ok(dir.join(format!("{name}{ENCRYPTED_SUFFIX}")))
    }
}

fn not_found(username: &str, name: &str) -> DocStoreError {
    DocStoreError::NotFound {
        username: username.to_string(),
        name: name.to_string(),
    }
}

fn storage(action: &str, path: &Path, e: std::io::Error) -> DocStoreError {
    DocStoreError::Storage(format!("failed to {action} {}: {e}", path.display()))
}

impl DocumentStore for FsDocumentStore {
    fn put(&self, username: &str, name: &str, blob: &[u8]) -> DocStoreResult<()> {
        let path = self.document_path(username, name)?;
        let dir = self.user_dir(username)?;
        std::fs::create_dir_all(&dir).map_err(|e| storage("create", &dir, e))?;

        // Write beside the target and rename over it, so readers never see
        // a half-written blob.
        let mut tmp =
            tempfile::NamedTempFile::new_in(&dir).map_err(|e| storage("create temp file in", &dir, e))?;
        tmp.write_all(blob)
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| storage("write", tmp.path(), e))?;
        tmp.persist(&path)
            .map_err(|e| storage("replace", &path, e.error))?;

        debug!(username = %username, name = %name, size = blob.len(), "Stored document");
        Ok(())
    }

    fn get(&self, username: &str, name: &str) -> DocStoreResult<Vec<u8>> {
        let path = self.document_path(username, name)?;
        match std::fs::read(&path) {
            Ok(blob) => Ok(blob),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(not_found(username, name)),
            Err(e) => Err(storage("read", &path, e)),
        }
    }

    fn list(&self, username: &str) -> DocStoreResult<Vec<String>> {
        let dir = self.user_dir(username)?;
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(storage("list", &dir, e)),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| storage("list", &dir, e))?;
            let is_file = entry
                .file_type()
                .map_err(|e| storage("stat", &entry.path(), e))?
                .is_file();
            if !is_file {
                continue;
            }
            let file_name = entry.file_name();
            let Some(name) = file_name
                .to_str()
                .and_then(|f| f.strip_suffix(ENCRYPTED_SUFFIX))
            else {
                continue;
            };
            if validate_segment("document name", name).is_ok() {
                names.push(name.to_string());
            }
        }
        Ok(names)
    }

    fn delete(&self, username: &str, name: &str) -> DocStoreResult<()> {
        let path = self.document_path(username, name)?;
        match std::fs::remove_file(&path) {
            Ok(()) => {
                debug!(username = %username, name = %name, "Deleted document");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Err(not_found(username, name)),
            Err(e) => Err(storage("delete", &path, e)),
        }
    }

    fn exists(&self, username: &str, name: &str) -> DocStoreResult<bool> {
        Ok(self.document_path(username, name)?.is_file())
    }
}
