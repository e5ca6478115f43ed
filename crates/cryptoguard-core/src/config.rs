//! Generator configuration.
//!
//! Configuration is resolved from three layers: options passed explicitly by
//! the host, values read from the environment, and built-in defaults. Each
//! layer is a [`ManifestOptions`] with every field optional; layers are
//! merged field by field and the result is resolved into an immutable
//! [`ManifestConfig`].

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::ConfigError;

/// URL prefix the host serves the build under.
pub const ENV_BASE_PATH: &str = "NEXT_PUBLIC_BASE_PATH";
/// Build output directory, relative to the project directory.
pub const ENV_DIST_DIR: &str = "CUSTOM_DIST_DIR";
/// Output mode selector; `export` selects a static export.
pub const ENV_OUTPUT_MODE: &str = "NEXT_OUTPUT_MODE";
/// Verbose diagnostics toggle (`true` enables).
pub const ENV_VERBOSE: &str = "MANIFEST_VERBOSE";
/// Disable toggle (`true` disables the generator entirely).
pub const ENV_DISABLED: &str = "MANIFEST_DISABLED";
/// Fixed build timestamp in seconds since the Unix epoch.
pub const ENV_SOURCE_DATE_EPOCH: &str = "SOURCE_DATE_EPOCH";

/// Bookkeeping entries excluded from every manifest.
pub const DEFAULT_EXCLUDE: &[&str] = &["cache", "trace"];

/// Subtrees that only exist for server rendering.
pub const DEFAULT_SERVER_ONLY: &[&str] = &["server"];

/// Build topology of the output directory.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "camelCase")]
#[strum(ascii_case_insensitive)]
pub enum OutputMode {
    /// Server-capable build; every subtree is in scope.
    #[default]
    #[strum(to_string = "server")]
    Server,
    /// Fully static export; server-only subtrees are excluded.
    #[strum(to_string = "static-export", serialize = "staticExport", serialize = "export")]
    StaticExport,
}

impl OutputMode {
    /// Output directory used when none is configured.
    pub fn default_dist_dir(self) -> &'static str {
        match self {
            OutputMode::Server => ".next",
            OutputMode::StaticExport => "out",
        }
    }

    /// Interpret the host's output mode variable.
    ///
    /// Only `export` selects a static export; any other value means a
    /// server build.
    pub fn from_env_value(value: &str) -> Self {
        if value.trim() == "export" {
            OutputMode::StaticExport
        } else {
            OutputMode::Server
        }
    }
}

/// Content hash algorithm. Both produce 256-bit digests.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum DigestAlgorithm {
    #[default]
    Blake3,
    Sha256,
}

/// A partial configuration layer.
///
/// `None` means "not set at this layer"; [`ManifestOptions::merge`] lets a
/// higher-priority layer override a lower one field by field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ManifestOptions {
    /// Project directory that relative output directories resolve against.
    pub project_dir: Option<PathBuf>,
    /// Output directory to scan. Takes precedence over `dist_dir`.
    pub root_dir: Option<PathBuf>,
    /// Output directory relative to `project_dir`.
    pub dist_dir: Option<PathBuf>,
    /// URL prefix recorded alongside asset paths.
    pub base_path: Option<String>,
    pub output_mode: Option<OutputMode>,
    pub verbose: Option<bool>,
    pub disabled: Option<bool>,
    /// Hashing worker count (0 = available parallelism).
    pub workers: Option<usize>,
    pub algorithm: Option<DigestAlgorithm>,
    /// Glob patterns for bookkeeping entries to skip.
    pub exclude: Option<Vec<String>>,
    /// Glob patterns for server-only subtrees, skipped in static exports.
    pub server_only: Option<Vec<String>>,
    /// Skip entries whose name starts with `.`.
    pub skip_hidden: Option<bool>,
    /// Timestamp stamped into the manifest instead of the current time.
    pub generated_at: Option<DateTime<Utc>>,
}

impl ManifestOptions {
    /// Create an empty options layer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the options layer from the process environment.
    pub fn from_process_env() -> Self {
        Self::from_env(|key| std::env::var(key).ok())
    }

    /// Read the options layer through an arbitrary variable lookup.
    ///
    /// Empty values count as unset. Boolean toggles are enabled only by the
    /// exact value `true`; any other value explicitly disables them.
    pub fn from_env<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.is_empty());

        let generated_at = get(ENV_SOURCE_DATE_EPOCH).and_then(|value| {
            let parsed = value
                .trim()
                .parse::<i64>()
                .ok()
                .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0));
            if parsed.is_none() {
                tracing::debug!(value = %value, "ignoring invalid {ENV_SOURCE_DATE_EPOCH}");
            }
            parsed
        });

        Self {
            base_path: get(ENV_BASE_PATH),
            dist_dir: get(ENV_DIST_DIR).map(PathBuf::from),
            output_mode: get(ENV_OUTPUT_MODE).map(|v| OutputMode::from_env_value(&v)),
            verbose: get(ENV_VERBOSE).map(|v| v == "true"),
            disabled: get(ENV_DISABLED).map(|v| v == "true"),
            generated_at,
            ..Self::default()
        }
    }

    /// Merge two layers. Fields set on `self` win over `lower`.
    pub fn merge(self, lower: ManifestOptions) -> ManifestOptions {
        ManifestOptions {
            project_dir: self.project_dir.or(lower.project_dir),
            root_dir: self.root_dir.or(lower.root_dir),
            dist_dir: self.dist_dir.or(lower.dist_dir),
            base_path: self.base_path.or(lower.base_path),
            output_mode: self.output_mode.or(lower.output_mode),
            verbose: self.verbose.or(lower.verbose),
            disabled: self.disabled.or(lower.disabled),
            workers: self.workers.or(lower.workers),
            algorithm: self.algorithm.or(lower.algorithm),
            exclude: self.exclude.or(lower.exclude),
            server_only: self.server_only.or(lower.server_only),
            skip_hidden: self.skip_hidden.or(lower.skip_hidden),
            generated_at: self.generated_at.or(lower.generated_at),
        }
    }

    /// Whether this layer disables the generator.
    pub fn is_disabled(&self) -> bool {
        self.disabled.unwrap_or(false)
    }

    /// Resolve into a full configuration, filling unset fields with defaults.
    pub fn resolve(self) -> Result<ManifestConfig, ConfigError> {
        let output_mode = self.output_mode.unwrap_or_default();
        let root_dir = match self.root_dir {
            Some(root) => root,
            None => {
                let project = self.project_dir.unwrap_or_else(|| PathBuf::from("."));
                let dist = self
                    .dist_dir
                    .unwrap_or_else(|| PathBuf::from(output_mode.default_dist_dir()));
                project.join(dist)
            }
        };

        let mut builder = ManifestConfig::builder();
        builder
            .root_dir(root_dir)
            .output_mode(output_mode)
            .generated_at(self.generated_at);
        if let Some(base_path) = self.base_path {
            builder.base_path(base_path);
        }
        if let Some(verbose) = self.verbose {
            builder.verbose(verbose);
        }
        if let Some(disabled) = self.disabled {
            builder.disabled(disabled);
        }
        if let Some(workers) = self.workers {
            builder.workers(workers);
        }
        if let Some(algorithm) = self.algorithm {
            builder.algorithm(algorithm);
        }
        if let Some(exclude) = self.exclude {
            builder.exclude(exclude);
        }
        if let Some(server_only) = self.server_only {
            builder.server_only(server_only);
        }
        if let Some(skip_hidden) = self.skip_hidden {
            builder.skip_hidden(skip_hidden);
        }

        builder.build().map_err(|e| ConfigError::Invalid {
            message: e.to_string(),
        })
    }

    /// Set the output directory to scan.
    pub fn with_root_dir(mut self, root: impl Into<PathBuf>) -> Self {
        self.root_dir = Some(root.into());
        self
    }

    /// Set the project directory.
    pub fn with_project_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.project_dir = Some(dir.into());
        self
    }

    /// Set the base path.
    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = Some(base_path.into());
        self
    }

    /// Set the output mode.
    pub fn with_output_mode(mut self, mode: OutputMode) -> Self {
        self.output_mode = Some(mode);
        self
    }

    /// Set verbose diagnostics.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = Some(verbose);
        self
    }

    /// Set the disable toggle.
    pub fn with_disabled(mut self, disabled: bool) -> Self {
        self.disabled = Some(disabled);
        self
    }

    /// Set the hashing worker count.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    /// Set the digest algorithm.
    pub fn with_algorithm(mut self, algorithm: DigestAlgorithm) -> Self {
        self.algorithm = Some(algorithm);
        self
    }

    /// Pin the manifest timestamp.
    pub fn with_generated_at(mut self, generated_at: DateTime<Utc>) -> Self {
        self.generated_at = Some(generated_at);
        self
    }
}

/// Fully resolved configuration for one generator run.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct ManifestConfig {
    /// Output directory to scan.
    pub root_dir: PathBuf,

    /// URL prefix recorded alongside asset paths.
    #[builder(default)]
    #[serde(default)]
    pub base_path: String,

    #[builder(default)]
    #[serde(default)]
    pub output_mode: OutputMode,

    /// Emit per-failure and summary diagnostics.
    #[builder(default = "false")]
    #[serde(default)]
    pub verbose: bool,

    /// Skip the run entirely.
    #[builder(default = "false")]
    #[serde(default)]
    pub disabled: bool,

    /// Number of hashing workers (0 = auto-detect).
    #[builder(default = "0")]
    #[serde(default)]
    pub workers: usize,

    #[builder(default)]
    #[serde(default)]
    pub algorithm: DigestAlgorithm,

    /// Patterns for bookkeeping entries to skip.
    #[builder(default = "default_exclude()")]
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,

    /// Patterns for server-only subtrees.
    #[builder(default = "default_server_only()")]
    #[serde(default = "default_server_only")]
    pub server_only: Vec<String>,

    /// Skip dotfiles and dot-directories.
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub skip_hidden: bool,

    /// Fixed manifest timestamp (None = time of the run).
    #[builder(default)]
    #[serde(default)]
    pub generated_at: Option<DateTime<Utc>>,
}

fn default_true() -> bool {
    true
}

fn default_exclude() -> Vec<String> {
    DEFAULT_EXCLUDE.iter().map(|s| s.to_string()).collect()
}

fn default_server_only() -> Vec<String> {
    DEFAULT_SERVER_ONLY.iter().map(|s| s.to_string()).collect()
}

impl ManifestConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(ref root) = self.root_dir {
            if root.as_os_str().is_empty() {
                return Err("Root directory cannot be empty".to_string());
            }
        } else {
            return Err("Root directory is required".to_string());
        }
        let mut patterns = self.exclude.iter().chain(self.server_only.iter()).flatten();
        if patterns.any(|p| p.is_empty()) {
            return Err("Exclusion patterns cannot be empty".to_string());
        }
        Ok(())
    }
}

impl ManifestConfig {
    /// Create a new config builder.
    pub fn builder() -> ManifestConfigBuilder {
        ManifestConfigBuilder::default()
    }

    /// Create a config for a root directory with every other field defaulted.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            base_path: String::new(),
            output_mode: OutputMode::default(),
            verbose: false,
            disabled: false,
            workers: 0,
            algorithm: DigestAlgorithm::default(),
            exclude: default_exclude(),
            server_only: default_server_only(),
            skip_hidden: true,
            generated_at: None,
        }
    }

    /// Worker count with auto-detection applied.
    pub fn effective_workers(&self) -> usize {
        match self.workers {
            0 => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            n => n,
        }
    }
}
