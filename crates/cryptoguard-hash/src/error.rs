//! Error types for hashing.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while hashing a single file.
#[derive(Debug, Error)]
pub enum DigestError {
    /// Permission denied for a path.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// The file vanished before or while it was read.
    #[error("File not found: {path}")]
    NotFound { path: PathBuf },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DigestError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Io { path, source },
        }
    }

    /// Machine-independent reason for the manifest's failure list.
    pub fn reason(&self) -> String {
        match self {
            Self::PermissionDenied { .. } => "permission denied".to_string(),
            Self::NotFound { .. } => "not found".to_string(),
            Self::Io { source, .. } => format!("I/O error: {}", source.kind()),
        }
    }
}

/// Errors that stop the scheduler from starting.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The worker pool could not be created.
    #[error("Failed to start hashing workers: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}
