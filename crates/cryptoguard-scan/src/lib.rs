//! Output tree walker for cryptoguard.
//!
//! This crate enumerates the candidate assets of a build output directory
//! using jwalk for traversal.
//!
//! # Overview
//!
//! - **Lazy** iteration; candidates stream out as directories are read
//! - **Glob exclusion rules** prune bookkeeping and server-only subtrees
//!   before they are read
//! - **Symlink cycle detection** by real path; cycles become failure entries
//! - **Per-subtree failures**; an unreadable directory never stops the walk
//!
//! # Example
//!
//! ```rust,no_run
//! use cryptoguard_scan::{ManifestConfig, TreeWalker};
//!
//! let config = ManifestConfig::new("/path/to/out");
//! let walker = TreeWalker::new(&config).unwrap();
//!
//! for item in walker.walk(&config.root_dir).unwrap() {
//!     match item {
//!         Ok(file) => println!("{}", file.asset_path),
//!         Err(failure) => eprintln!("{}: {}", failure.path, failure.reason),
//!     }
//! }
//! ```

mod error;
mod rules;
mod walker;

pub use error::WalkError;
pub use rules::WalkRules;
pub use walker::{TreeWalker, Walk};

// Re-export core types for convenience
pub use cryptoguard_core::{AssetFailure, AssetPath, ManifestConfig, OutputMode, WalkedFile};
