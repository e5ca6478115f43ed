//! Core types and configuration for cryptoguard.
//!
//! This crate provides the data model shared by every stage of manifest
//! generation: asset paths and records, the manifest itself, the run outcome
//! handed back to the host build, and the layered configuration that drives
//! a run.

mod asset;
mod config;
mod error;
mod manifest;

pub use asset::{AssetPath, AssetRecord, ContentDigest, WalkedFile, content_type_for};
pub use config::{
    DEFAULT_EXCLUDE, DEFAULT_SERVER_ONLY, DigestAlgorithm, ENV_BASE_PATH, ENV_DISABLED,
    ENV_DIST_DIR, ENV_OUTPUT_MODE, ENV_SOURCE_DATE_EPOCH, ENV_VERBOSE, ManifestConfig,
    ManifestConfigBuilder, ManifestOptions, OutputMode,
};
pub use error::{AssetFailure, ConfigError, FailureKind};
pub use manifest::{
    FORMAT_VERSION, MANIFEST_FILE_NAME, MANIFEST_TEMP_PREFIX, Manifest, ManifestBuilder,
    RunOutcome,
};
