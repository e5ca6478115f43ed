//! Error and failure types shared across the generator.

use serde::{Deserialize, Serialize};
use strum::Display;
use thiserror::Error;

use crate::asset::AssetPath;

/// Errors raised while resolving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The resolved configuration failed validation.
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },
}

/// Kind of fatal failure reported to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum FailureKind {
    /// The output directory is missing or not a directory.
    RootNotFound,
    /// The manifest could not be persisted.
    IoFailure,
    /// Every candidate asset failed to hash.
    AllAssetsFailed,
    /// The configuration could not be resolved.
    InvalidConfig,
}

/// A non-fatal, per-asset failure recorded in the manifest.
///
/// Reasons never contain absolute paths so that manifests stay identical
/// across machines.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AssetFailure {
    /// Path of the asset or subtree that failed.
    pub path: AssetPath,
    /// Human-readable reason.
    pub reason: String,
}

impl AssetFailure {
    /// Create a new failure.
    pub fn new(path: AssetPath, reason: impl Into<String>) -> Self {
        Self {
            path,
            reason: reason.into(),
        }
    }

    /// Create a failure from an I/O error, classified by kind.
    pub fn from_io(path: AssetPath, error: &std::io::Error) -> Self {
        let reason = match error.kind() {
            std::io::ErrorKind::PermissionDenied => "permission denied".to_string(),
            std::io::ErrorKind::NotFound => "not found".to_string(),
            kind => format!("I/O error: {kind}"),
        };
        Self { path, reason }
    }

    /// Create a permission denied failure.
    pub fn permission_denied(path: AssetPath) -> Self {
        Self::new(path, "permission denied")
    }

    /// Create a failure for a symlink whose target does not exist.
    pub fn broken_symlink(path: AssetPath) -> Self {
        Self::new(path, "broken symlink")
    }

    /// Create a failure for a symlink that leads back into its own ancestry.
    pub fn symlink_cycle(path: AssetPath) -> Self {
        Self::new(path, "symlink cycle")
    }
}
