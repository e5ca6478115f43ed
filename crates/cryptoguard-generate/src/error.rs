//! Fatal generator errors.

use std::path::PathBuf;

use thiserror::Error;

use cryptoguard_core::{ConfigError, FailureKind, RunOutcome};
use cryptoguard_hash::SchedulerError;
use cryptoguard_persist::PersistError;
use cryptoguard_scan::WalkError;

/// Errors that abort a run. Each maps to a [`FailureKind`].
#[derive(Debug, Error)]
pub enum GenerateError {
    /// The output directory does not exist or is not a directory.
    #[error("Output directory not found: {path}")]
    RootNotFound { path: PathBuf },

    /// The manifest could not be written.
    #[error(transparent)]
    Io(#[from] PersistError),

    /// Every candidate asset failed.
    #[error("All {failures} assets failed; check permissions on the output directory")]
    AllAssetsFailed { failures: usize },

    /// Configuration could not be resolved.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Hashing workers could not be started.
    #[error(transparent)]
    WorkerPool(#[from] SchedulerError),
}

impl GenerateError {
    /// Failure kind reported to the host.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::RootNotFound { .. } => FailureKind::RootNotFound,
            Self::Io(_) | Self::WorkerPool(_) => FailureKind::IoFailure,
            Self::AllAssetsFailed { .. } => FailureKind::AllAssetsFailed,
            Self::InvalidConfig { .. } => FailureKind::InvalidConfig,
        }
    }

    /// Convert into the `Failed` outcome.
    pub fn into_outcome(self) -> RunOutcome {
        RunOutcome::Failed {
            kind: self.kind(),
            reason: self.to_string(),
        }
    }
}

impl From<WalkError> for GenerateError {
    fn from(err: WalkError) -> Self {
        match err {
            WalkError::RootNotFound { path } => Self::RootNotFound { path },
            err @ WalkError::InvalidPattern { .. } => Self::InvalidConfig {
                message: err.to_string(),
            },
        }
    }
}

impl From<ConfigError> for GenerateError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Invalid { message } => Self::InvalidConfig { message },
        }
    }
}
