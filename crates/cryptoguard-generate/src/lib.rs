//! Build-time asset integrity manifests.
//!
//! The [`Generator`] is the only thing a host build needs to call. It
//! resolves configuration (explicit options over environment variables over
//! defaults), walks the output directory, hashes every asset on a bounded
//! worker pool, and atomically writes a sorted manifest next to the assets.
//!
//! ```rust,no_run
//! use cryptoguard_generate::{ManifestOptions, RunOutcome, generate};
//!
//! let outcome = generate(ManifestOptions::new().with_root_dir("out").with_base_path("/app"));
//! match outcome {
//!     RunOutcome::Failed { kind, reason } => eprintln!("{kind}: {reason}"),
//!     other => println!("{}", other.label()),
//! }
//! ```

mod error;
mod generator;

pub use error::GenerateError;
pub use generator::{Generator, generate};

// Re-export the types a host needs
pub use cryptoguard_core::{
    DigestAlgorithm, FailureKind, MANIFEST_FILE_NAME, Manifest, ManifestConfig, ManifestOptions,
    OutputMode, RunOutcome,
};
