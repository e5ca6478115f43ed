//! Errors that stop a walk before it starts.

use std::path::PathBuf;

use thiserror::Error;

/// Fatal walker errors. Everything else becomes an [`AssetFailure`](cryptoguard_core::AssetFailure).
#[derive(Debug, Error)]
pub enum WalkError {
    /// The output directory does not exist or is not a directory.
    #[error("Output directory not found: {path}")]
    RootNotFound { path: PathBuf },

    /// An exclusion pattern is not a valid glob.
    #[error("Invalid exclusion pattern {pattern:?}: {message}")]
    InvalidPattern { pattern: String, message: String },
}
