//! Error types for manifest persistence.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while writing or reading a manifest.
#[derive(Debug, Error)]
pub enum PersistError {
    /// The manifest could not be serialized.
    #[error("Failed to serialize manifest: {0}")]
    Serialize(#[source] serde_json::Error),

    /// Writing the staged temporary file failed.
    #[error("Failed to stage manifest in {dir}: {source}")]
    Stage {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Renaming the staged file over the manifest failed.
    #[error("Failed to commit manifest to {path}: {source}")]
    Commit {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reading an existing manifest failed.
    #[error("Failed to read manifest {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An existing manifest is not valid JSON for this format.
    #[error("Failed to parse manifest {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
