//! Content hashing for cryptoguard.
//!
//! This crate turns walked files into asset records:
//!
//! - **Digest engine** - streams a file through BLAKE3 or SHA-256 in fixed
//!   size chunks, so memory use does not depend on file size
//! - **Hash scheduler** - fans files out to a bounded worker pool and
//!   collects records and failures in whatever order they complete
//!
//! ```rust,ignore
//! use cryptoguard_hash::{HashConfig, HashScheduler};
//! use cryptoguard_scan::{ManifestConfig, TreeWalker};
//!
//! let config = ManifestConfig::new("/path/to/out");
//! let walk = TreeWalker::new(&config)?.walk(&config.root_dir)?;
//!
//! let scheduler = HashScheduler::new(HashConfig::from_manifest_config(&config))?;
//! let report = scheduler.run(walk, |failure| eprintln!("{}: {}", failure.path, failure.reason));
//!
//! println!("{} hashed, {} failed", report.records.len(), report.failures.len());
//! ```

mod digest;
mod error;
mod scheduler;

pub use digest::{CHUNK_SIZE, FileDigest, digest_file, digest_reader};
pub use error::{DigestError, SchedulerError};
pub use scheduler::{HashConfig, HashConfigBuilder, HashReport, HashScheduler, HashStats};

// Re-export core types
pub use cryptoguard_core::{AssetFailure, AssetRecord, ContentDigest, DigestAlgorithm, WalkedFile};
