//! Project discovery and structure

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Represents a Metron catalog project
#[derive(Debug)]
pub struct Project {
    /// Root directory of the project (parent of .metron/)
    root: PathBuf,
}

impl Project {
    /// Find project root by walking up from the current directory
    pub fn discover() -> Result<Self, ProjectError> {
        let current = std::env::current_dir().map_err(|e| ProjectError::IoError(e.to_string()))?;
        Self::discover_from(&current)
    }

    /// Find project root by walking up from the given directory
    pub fn discover_from(start: &Path) -> Result<Self, ProjectError> {
        let mut current = start
            .canonicalize()
            .map_err(|e| ProjectError::IoError(e.to_string()))?;

        loop {
            let metron_dir = current.join(".metron");
            if metron_dir.is_dir() {
                return Ok(Self { root: current });
            }

            if !current.pop() {
                return Err(ProjectError::NotFound {
                    searched_from: start.to_path_buf(),
                });
            }
        }
    }

    /// Create a new project structure at the given path
    pub fn init(path: &Path) -> Result<Self, ProjectError> {
        let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());

        let metron_dir = root.join(".metron");
        if metron_dir.exists() {
            return Err(ProjectError::AlreadyExists(root.clone()));
        }

        std::fs::create_dir_all(&metron_dir).map_err(|e| ProjectError::IoError(e.to_string()))?;

        let config_path = metron_dir.join("config.yaml");
        std::fs::write(&config_path, Self::default_config())
            .map_err(|e| ProjectError::IoError(e.to_string()))?;

        Ok(Self { root })
    }

    fn default_config() -> &'static str {
        r#"# Metron Catalog Configuration

# Default author for catalog edits (can be overridden by global config)
# author: ""

# Default output format (auto, yaml, json, tsv, csv)
# default_format: auto

# Default page size for listings
# per_page: 50
"#
    }

    /// Get the project root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the .metron configuration directory
    pub fn metron_dir(&self) -> PathBuf {
        self.root.join(".metron")
    }

    /// Path of the project-local config file
    pub fn config_path(&self) -> PathBuf {
        self.metron_dir().join("config.yaml")
    }

    /// Path of the catalog database
    pub fn db_path(&self) -> PathBuf {
        self.metron_dir().join("catalog.db")
    }

    /// Path of the append-only audit log
    pub fn audit_path(&self) -> PathBuf {
        self.metron_dir().join("audit.jsonl")
    }
}

/// Errors that can occur during project operations
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("not a metron project (searched from {searched_from:?}). Run 'metron init' to create one.")]
    NotFound { searched_from: PathBuf },

    #[error("metron project already exists at {0:?}")]
    AlreadyExists(PathBuf),

    #[error("IO error: {0}")]
    IoError(String),
}
