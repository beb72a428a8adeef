//! Workspace discovery and structure

use std::path::{Path, PathBuf};
use thiserror::Error;

/// An Atelier workspace: the directory holding `.atelier/`
#[derive(Debug)]
pub struct Workspace {
    /// Root directory of the workspace (parent of .atelier/)
    root: PathBuf,
}

impl Workspace {
    /// Find workspace root by walking up from the current directory
    pub fn discover() -> Result<Self, WorkspaceError> {
        let current =
            std::env::current_dir().map_err(|e| WorkspaceError::IoError(e.to_string()))?;
        Self::discover_from(&current)
    }

    /// Find workspace root by walking up from the given directory
    pub fn discover_from(start: &Path) -> Result<Self, WorkspaceError> {
        let mut current = start
            .canonicalize()
            .map_err(|e| WorkspaceError::IoError(e.to_string()))?;

        loop {
            let atelier_dir = current.join(".atelier");
            if atelier_dir.is_dir() {
                return Ok(Self { root: current });
            }

            if !current.pop() {
                return Err(WorkspaceError::NotFound {
                    searched_from: start.to_path_buf(),
                });
            }
        }
    }

    /// Create a new workspace structure at the given path
    pub fn init(path: &Path) -> Result<Self, WorkspaceError> {
        let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());

        let atelier_dir = root.join(".atelier");
        if atelier_dir.exists() {
            return Err(WorkspaceError::AlreadyExists(root.clone()));
        }

        std::fs::create_dir_all(atelier_dir.join("data"))
            .map_err(|e| WorkspaceError::IoError(e.to_string()))?;

        let config_path = atelier_dir.join("config.yaml");
        std::fs::write(&config_path, Self::default_config())
            .map_err(|e| WorkspaceError::IoError(e.to_string()))?;

        Ok(Self { root })
    }

    /// Open a workspace rooted at the given path without discovery
    pub fn open(path: &Path) -> Result<Self, WorkspaceError> {
        let root = path
            .canonicalize()
            .map_err(|e| WorkspaceError::IoError(e.to_string()))?;
        if !root.join(".atelier").is_dir() {
            return Err(WorkspaceError::NotFound {
                searched_from: root,
            });
        }
        Ok(Self { root })
    }

    fn default_config() -> &'static str {
        r#"# Atelier workspace configuration

# Default output format (auto, table, json, yaml, csv, id)
# default_format: auto

# Default company id for `atelier project list`
# default_company: ""
"#
    }

    /// Get the workspace root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the .atelier configuration directory
    pub fn atelier_dir(&self) -> PathBuf {
        self.root.join(".atelier")
    }

    /// Get the data directory holding the stored collections
    pub fn data_dir(&self) -> PathBuf {
        self.atelier_dir().join("data")
    }
}

/// Errors that can occur during workspace operations
#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("not an Atelier workspace (searched from {searched_from:?}). Run 'atelier init' to create one.")]
    NotFound { searched_from: PathBuf },

    #[error("Atelier workspace already exists at {0:?}")]
    AlreadyExists(PathBuf),

    #[error("IO error: {0}")]
    IoError(String),
}
