//! Locker configuration.

use crate::error::{LockerError, LockerResult};
use locker_crypto::KdfParams;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Where the locker keeps its files and how hard it derives keys.
///
/// Every field has a default, so a config file only needs the fields it
/// changes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockerConfig {
    /// Holds `users.json` and `user_documents/`.
    pub data_dir: PathBuf,
    /// Argon2id parameters for new credentials.
    pub kdf: KdfParams,
    /// Upper bound for an async unlock, in seconds.
    pub unlock_timeout_secs: u64,
}

impl Default for LockerConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            kdf: KdfParams::default(),
            unlock_timeout_secs: 30,
        }
    }
}

impl LockerConfig {
    pub const CREDENTIALS_FILE: &'static str = "users.json";
    pub const DOCUMENTS_DIR: &'static str = "user_documents";

    /// Config with defaults rooted at `data_dir`.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    /// Reads a JSON config file.
    pub fn load(path: &Path) -> LockerResult<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| LockerError::Config(format!("failed to read {}: {e}", path.display())))?;
        serde_json::from_str(&contents)
            .map_err(|e| LockerError::Config(format!("failed to parse {}: {e}", path.display())))
    }

    pub fn credentials_path(&self) -> PathBuf {
        self.data_dir.join(Self::CREDENTIALS_FILE)
    }

    pub fn documents_dir(&self) -> PathBuf {
        self.data_dir.join(Self::DOCUMENTS_DIR)
    }

    pub fn unlock_timeout(&self) -> Duration {
        Duration::from_secs(self.unlock_timeout_secs)
    }
}
