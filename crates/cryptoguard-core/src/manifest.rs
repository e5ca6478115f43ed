//! The manifest and the outcome of a generator run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::asset::{AssetPath, AssetRecord};
use crate::config::{DigestAlgorithm, ManifestConfig, OutputMode};
use crate::error::{AssetFailure, FailureKind};

/// Version of the manifest file format.
pub const FORMAT_VERSION: u32 = 1;

/// File name of the manifest, written at the root of the output directory.
pub const MANIFEST_FILE_NAME: &str = "cryptoguard-manifest.json";

/// Prefix of the temporary file staged next to the manifest.
pub const MANIFEST_TEMP_PREFIX: &str = ".cryptoguard-manifest";

/// Integrity manifest for one build.
///
/// Fields serialize in declaration order, which is part of the file format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub format_version: u32,
    /// Informational only; never part of ordering or digests.
    pub generated_at: DateTime<Utc>,
    pub digest_algorithm: DigestAlgorithm,
    pub base_path: String,
    pub output_mode: OutputMode,
    /// Sorted by path, no duplicates.
    pub assets: Vec<AssetRecord>,
    /// Sorted by path.
    pub failures: Vec<AssetFailure>,
}

impl Manifest {
    /// Look up an asset by path.
    pub fn asset(&self, path: &str) -> Option<&AssetRecord> {
        self.assets
            .binary_search_by(|record| record.path.as_str().cmp(path))
            .ok()
            .map(|idx| &self.assets[idx])
    }

    /// Whether any asset failed.
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Total size of all recorded assets.
    pub fn total_size(&self) -> u64 {
        self.assets.iter().map(|a| a.size_bytes).sum()
    }

    /// Public URL of an asset under the base path.
    pub fn public_url(&self, path: &AssetPath) -> String {
        format!("{}/{}", self.base_path.trim_end_matches('/'), path)
    }
}

/// Collects records and failures and folds them into a [`Manifest`].
#[derive(Debug, Clone)]
pub struct ManifestBuilder {
    base_path: String,
    output_mode: OutputMode,
    algorithm: DigestAlgorithm,
    generated_at: Option<DateTime<Utc>>,
    assets: Vec<AssetRecord>,
    failures: Vec<AssetFailure>,
}

impl ManifestBuilder {
    /// Start a manifest for the given configuration.
    pub fn new(config: &ManifestConfig) -> Self {
        Self {
            base_path: config.base_path.clone(),
            output_mode: config.output_mode,
            algorithm: config.algorithm,
            generated_at: config.generated_at,
            assets: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// Override the timestamp.
    pub fn generated_at(mut self, generated_at: DateTime<Utc>) -> Self {
        self.generated_at = Some(generated_at);
        self
    }

    /// Add asset records.
    pub fn assets(mut self, records: impl IntoIterator<Item = AssetRecord>) -> Self {
        self.assets.extend(records);
        self
    }

    /// Add failure entries.
    pub fn failures(mut self, failures: impl IntoIterator<Item = AssetFailure>) -> Self {
        self.failures.extend(failures);
        self
    }

    /// Build the manifest.
    ///
    /// Assets are sorted by path and any duplicate path keeps its first
    /// record. The timestamp is truncated to whole seconds.
    pub fn build(mut self) -> Manifest {
        self.assets.sort_by(|a, b| a.path.cmp(&b.path));
        self.assets.dedup_by(|later, earlier| {
            let duplicate = later.path == earlier.path;
            if duplicate {
                tracing::debug!(path = %later.path, "dropping duplicate asset record");
            }
            duplicate
        });
        self.failures.sort();
        self.failures.dedup();

        let now = self.generated_at.unwrap_or_else(Utc::now);
        let generated_at = DateTime::<Utc>::from_timestamp(now.timestamp(), 0).unwrap_or(now);

        Manifest {
            format_version: FORMAT_VERSION,
            generated_at,
            digest_algorithm: self.algorithm,
            base_path: self.base_path,
            output_mode: self.output_mode,
            assets: self.assets,
            failures: self.failures,
        }
    }
}

/// Result of one generator run, returned to the host build.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// The generator was disabled; nothing was read or written.
    Skipped,
    /// Every candidate asset was recorded.
    Completed(Manifest),
    /// The manifest was written, but some assets failed.
    CompletedWithFailures(Manifest),
    /// The run aborted; no manifest was written.
    Failed { kind: FailureKind, reason: String },
}

impl RunOutcome {
    /// Wrap a persisted manifest, choosing the variant from its failures.
    pub fn from_manifest(manifest: Manifest) -> Self {
        if manifest.has_failures() {
            RunOutcome::CompletedWithFailures(manifest)
        } else {
            RunOutcome::Completed(manifest)
        }
    }

    /// The manifest, if one was written.
    pub fn manifest(&self) -> Option<&Manifest> {
        match self {
            RunOutcome::Completed(m) | RunOutcome::CompletedWithFailures(m) => Some(m),
            _ => None,
        }
    }

    /// The failure kind, if the run failed.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            RunOutcome::Failed { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Whether the run failed.
    pub fn is_failed(&self) -> bool {
        matches!(self, RunOutcome::Failed { .. })
    }

    /// Short label for reporting.
    pub fn label(&self) -> &'static str {
        match self {
            RunOutcome::Skipped => "skipped",
            RunOutcome::Completed(_) => "completed",
            RunOutcome::CompletedWithFailures(_) => "completed with failures",
            RunOutcome::Failed { .. } => "failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::ContentDigest;

    fn record(path: &str, byte: u8) -> AssetRecord {
        AssetRecord::new(AssetPath::parse(path).unwrap(), ContentDigest::new([byte; 32]), 1)
    }

    #[test]
    fn test_build_sorts_assets() {
        let config = ManifestConfig::new("/out");
        let manifest = ManifestBuilder::new(&config)
            .assets([record("b/c.css", 2), record("a.js", 1), record("a/b.js", 3)])
            .build();

        let paths: Vec<&str> = manifest.assets.iter().map(|a| a.path.as_str()).collect();
        assert_eq!(paths, vec!["a.js", "a/b.js", "b/c.css"]);
        assert_eq!(manifest.format_version, FORMAT_VERSION);
        assert!(manifest.asset("a/b.js").is_some());
        assert!(manifest.asset("missing.js").is_none());
    }

    #[test]
    fn test_build_drops_duplicate_paths() {
        let config = ManifestConfig::new("/out");
        let manifest = ManifestBuilder::new(&config)
            .assets([record("a.js", 1), record("a.js", 2)])
            .build();
        assert_eq!(manifest.assets.len(), 1);
        assert_eq!(manifest.assets[0].digest, ContentDigest::new([1; 32]));
    }

    #[test]
    fn test_build_truncates_timestamp() {
        let config = ManifestConfig::new("/out");
        let stamp = DateTime::<Utc>::from_timestamp(1_700_000_000, 123_456_789).unwrap();
        let manifest = ManifestBuilder::new(&config).generated_at(stamp).build();
        assert_eq!(manifest.generated_at.timestamp(), 1_700_000_000);
        assert_eq!(manifest.generated_at.timestamp_subsec_nanos(), 0);
    }

    #[test]
    fn test_outcome_from_manifest() {
        let config = ManifestConfig::new("/out");
        let clean = ManifestBuilder::new(&config).assets([record("a.js", 1)]).build();
        assert!(matches!(
            RunOutcome::from_manifest(clean),
            RunOutcome::Completed(_)
        ));

        let failing = ManifestBuilder::new(&config)
            .failures([AssetFailure::permission_denied(
                AssetPath::parse("b.js").unwrap(),
            )])
            .build();
        let outcome = RunOutcome::from_manifest(failing);
        assert_eq!(outcome.label(), "completed with failures");
        assert!(outcome.manifest().is_some());
    }

    #[test]
    fn test_public_url() {
        let mut config = ManifestConfig::new("/out");
        config.base_path = "/app/".to_string();
        let manifest = ManifestBuilder::new(&config).build();
        let path = AssetPath::parse("static/a.js").unwrap();
        assert_eq!(manifest.public_url(&path), "/app/static/a.js");
    }
}
