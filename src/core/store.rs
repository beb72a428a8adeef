//! Fixed-key JSON persistence for the workspace collections
//!
//! Each top-level collection lives under one fixed key, serialized as a
//! single JSON blob in `.atelier/data/<key>.json`. Every write replaces the
//! whole collection for that key; there is no append or partial write, and
//! writes are not atomic. Two processes writing the same workspace race on
//! read-modify-write with last-write-wins and no detection. That is the
//! documented single-writer limitation of this store, not an oversight.

use serde::{de::DeserializeOwned, Serialize};
use std::path::PathBuf;
use thiserror::Error;

use crate::core::workspace::Workspace;

/// Collection key for companies
pub const COMPANIES_KEY: &str = "companies";
/// Collection key for projects (with all embedded children)
pub const PROJECTS_KEY: &str = "projects";
/// Collection key for users
pub const USERS_KEY: &str = "users";
/// Key for the persisted login session
pub const SESSION_KEY: &str = "session";
/// Reserved key for UI settings; written by nothing in the core
pub const SETTINGS_KEY: &str = "settings";
/// Reserved key for a future sync queue; written by nothing in the core
pub const SYNC_QUEUE_KEY: &str = "sync_queue";

/// Key-value persistence over the workspace data directory
#[derive(Debug)]
pub struct Store {
    dir: PathBuf,
}

impl Store {
    /// Open the store for a workspace
    pub fn open(workspace: &Workspace) -> Self {
        Self {
            dir: workspace.data_dir(),
        }
    }

    /// Open a store over an explicit directory (used by tests)
    pub fn at(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    /// Load a collection. An absent key is an empty collection; text that
    /// fails to parse is a distinct corruption error, never a crash.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>, StoreError> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let text = std::fs::read_to_string(&path)?;
        serde_json::from_str(&text).map_err(|source| StoreError::Corrupt {
            key: key.to_string(),
            source,
        })
    }

    /// Serialize and overwrite the entire collection for a key
    pub fn save<T: Serialize>(&self, key: &str, items: &[T]) -> Result<(), StoreError> {
        std::fs::create_dir_all(&self.dir)?;
        let text = serde_json::to_string_pretty(items).map_err(StoreError::Serialize)?;
        std::fs::write(self.path_for(key), text)?;
        Ok(())
    }

    /// Read a single stored value (e.g. the session user)
    pub fn read_value<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let text = std::fs::read_to_string(&path)?;
        serde_json::from_str(&text)
            .map(Some)
            .map_err(|source| StoreError::Corrupt {
                key: key.to_string(),
                source,
            })
    }

    /// Write a single stored value under a key
    pub fn write_value<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        std::fs::create_dir_all(&self.dir)?;
        let text = serde_json::to_string_pretty(value).map_err(StoreError::Serialize)?;
        std::fs::write(self.path_for(key), text)?;
        Ok(())
    }

    /// Remove a key. Removing an absent key is a no-op.
    pub fn remove(&self, key: &str) -> Result<(), StoreError> {
        let path = self.path_for(key);
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }

    /// Raw stored bytes for a key, if present (used by tests to check
    /// byte-for-byte stability)
    pub fn raw(&self, key: &str) -> Option<Vec<u8>> {
        std::fs::read(self.path_for(key)).ok()
    }
}

/// Errors from the persistence layer
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("stored data for '{key}' is corrupt and cannot be parsed")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize collection")]
    Serialize(#[source] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
