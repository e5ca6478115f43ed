//! Bounded parallel hashing.
//!
//! The coordinating thread drains the walk and spawns one task per file into
//! a dedicated rayon pool, so at most `workers` files are open at once.
//! Results travel back over a channel and are collected after every task
//! has finished. Completion order is irrelevant; the manifest builder sorts.

use std::sync::mpsc;

use derive_builder::Builder;
use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::{Deserialize, Serialize};

use cryptoguard_core::{AssetFailure, AssetRecord, DigestAlgorithm, ManifestConfig, WalkedFile};

use crate::digest::digest_file;
use crate::error::SchedulerError;

/// Configuration for the hash scheduler.
#[derive(Debug, Clone, Builder)]
#[builder(setter(into))]
pub struct HashConfig {
    /// Number of worker threads (0 = available parallelism).
    #[builder(default = "0")]
    pub workers: usize,

    /// Digest algorithm.
    #[builder(default)]
    pub algorithm: DigestAlgorithm,
}

impl Default for HashConfig {
    fn default() -> Self {
        Self {
            workers: 0,
            algorithm: DigestAlgorithm::default(),
        }
    }
}

impl HashConfig {
    /// Create a new config builder.
    pub fn builder() -> HashConfigBuilder {
        HashConfigBuilder::default()
    }

    /// Take worker count and algorithm from a manifest configuration.
    pub fn from_manifest_config(config: &ManifestConfig) -> Self {
        Self {
            workers: config.effective_workers(),
            algorithm: config.algorithm,
        }
    }
}

/// Counters for one scheduling run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashStats {
    /// Candidate files received from the walk.
    pub files_scanned: u64,
    /// Files hashed successfully.
    pub files_hashed: u64,
    /// Failures from the walk and from hashing.
    pub failures: u64,
    /// Total bytes hashed.
    pub bytes_hashed: u64,
}

/// Records and failures collected by the scheduler.
#[derive(Debug, Clone, Default)]
pub struct HashReport {
    /// Hashed assets, in completion order.
    pub records: Vec<AssetRecord>,
    /// Walk and hashing failures, in arrival order.
    pub failures: Vec<AssetFailure>,
    pub stats: HashStats,
}

impl HashReport {
    /// Whether every candidate failed. An empty walk does not count.
    pub fn all_failed(&self) -> bool {
        self.records.is_empty() && !self.failures.is_empty()
    }
}

/// Hashes walked files on a bounded worker pool.
pub struct HashScheduler {
    pool: ThreadPool,
    algorithm: DigestAlgorithm,
}

impl HashScheduler {
    /// Start a scheduler with its own worker pool.
    pub fn new(config: HashConfig) -> Result<Self, SchedulerError> {
        let mut builder = ThreadPoolBuilder::new()
            .thread_name(|index| format!("cryptoguard-hash-{index}"));
        if config.workers > 0 {
            builder = builder.num_threads(config.workers);
        }

        Ok(Self {
            pool: builder.build()?,
            algorithm: config.algorithm,
        })
    }

    /// Number of worker threads, and so the bound on open files.
    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Hash every file the walk yields.
    ///
    /// Individual failures never stop the run. `on_failure` sees each
    /// failure as it happens, from whichever thread observed it.
    pub fn run<I, F>(&self, walk: I, on_failure: F) -> HashReport
    where
        I: IntoIterator<Item = Result<WalkedFile, AssetFailure>>,
        F: Fn(&AssetFailure) + Sync,
    {
        let (tx, rx) = mpsc::channel::<Result<AssetRecord, AssetFailure>>();
        let algorithm = self.algorithm;
        let on_failure = &on_failure;
        let mut report = HashReport::default();

        self.pool.in_place_scope(|scope| {
            for item in walk {
                match item {
                    Ok(file) => {
                        report.stats.files_scanned += 1;
                        let tx = tx.clone();
                        scope.spawn(move |_| {
                            let result = hash_file(file, algorithm);
                            if let Err(failure) = &result {
                                on_failure(failure);
                            }
                            // The receiver outlives the scope
                            let _ = tx.send(result);
                        });
                    }
                    Err(failure) => {
                        on_failure(&failure);
                        report.failures.push(failure);
                    }
                }
            }
        });
        drop(tx);

        for result in rx {
            match result {
                Ok(record) => {
                    report.stats.bytes_hashed += record.size_bytes;
                    report.records.push(record);
                }
                Err(failure) => report.failures.push(failure),
            }
        }

        report.stats.files_hashed = report.records.len() as u64;
        report.stats.failures = report.failures.len() as u64;
        report
    }
}

fn hash_file(file: WalkedFile, algorithm: DigestAlgorithm) -> Result<AssetRecord, AssetFailure> {
    match digest_file(&file.path, algorithm) {
        Ok(result) => Ok(AssetRecord::new(file.asset_path, result.digest, result.size)),
        Err(err) => {
            tracing::debug!(error = %err, "hashing failed");
            Err(AssetFailure::new(file.asset_path, err.reason()))
        }
    }
}
