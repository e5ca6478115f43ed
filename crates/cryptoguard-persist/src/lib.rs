//! Manifest persistence for cryptoguard.
//!
//! This crate serializes a manifest to its canonical JSON form and commits
//! it with a write-then-rename, so readers only ever see a complete old
//! manifest or a complete new one.

mod error;
mod writer;

pub use error::PersistError;
pub use writer::{ManifestWriter, StagedManifest, render_manifest};
