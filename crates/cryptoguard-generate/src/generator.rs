//! The generator facade.

use std::time::Instant;

use cryptoguard_core::{Manifest, ManifestBuilder, ManifestConfig, ManifestOptions, RunOutcome};
use cryptoguard_hash::{HashConfig, HashReport, HashScheduler};
use cryptoguard_persist::ManifestWriter;
use cryptoguard_scan::TreeWalker;

use crate::error::GenerateError;

/// Entry point the host build calls once its output tree is complete.
///
/// Holds the explicit and environment configuration layers. Each call to
/// [`Generator::run`] is an independent run; nothing carries over.
#[derive(Debug, Clone, Default)]
pub struct Generator {
    explicit: ManifestOptions,
    env: ManifestOptions,
}

impl Generator {
    /// Create a generator reading its environment layer from the process.
    pub fn new(explicit: ManifestOptions) -> Self {
        Self::with_env(explicit, ManifestOptions::from_process_env())
    }

    /// Create a generator with an explicit environment layer.
    pub fn with_env(explicit: ManifestOptions, env: ManifestOptions) -> Self {
        Self { explicit, env }
    }

    /// Merged options: explicit over environment. Defaults apply on resolve.
    pub fn options(&self) -> ManifestOptions {
        self.explicit.clone().merge(self.env.clone())
    }

    /// Run the generator. Never panics; every path yields an outcome.
    pub fn run(&self) -> RunOutcome {
        let options = self.options();
        if options.is_disabled() {
            return finish(RunOutcome::Skipped);
        }

        match options.resolve() {
            Ok(config) => Self::run_with_config(&config),
            Err(err) => finish(GenerateError::from(err).into_outcome()),
        }
    }

    /// Run with an already resolved configuration.
    pub fn run_with_config(config: &ManifestConfig) -> RunOutcome {
        if config.disabled {
            return finish(RunOutcome::Skipped);
        }

        let outcome = match execute(config) {
            Ok(manifest) => RunOutcome::from_manifest(manifest),
            Err(err) => err.into_outcome(),
        };
        finish(outcome)
    }
}

/// Resolve configuration from `explicit` and the process environment, then run.
pub fn generate(explicit: ManifestOptions) -> RunOutcome {
    Generator::new(explicit).run()
}

fn execute(config: &ManifestConfig) -> Result<Manifest, GenerateError> {
    let started = Instant::now();
    let verbose = config.verbose;

    let walk = TreeWalker::new(config)?.walk(&config.root_dir)?;
    let root = walk.root().to_path_buf();

    let scheduler = HashScheduler::new(HashConfig::from_manifest_config(config))?;
    if verbose {
        tracing::info!(
            root = %root.display(),
            mode = %config.output_mode,
            workers = scheduler.workers(),
            "generating manifest"
        );
    }

    let report = scheduler.run(walk, |failure| {
        if verbose {
            tracing::warn!(path = %failure.path, reason = %failure.reason, "asset failed");
        }
    });
    if report.all_failed() {
        return Err(GenerateError::AllAssetsFailed {
            failures: report.failures.len(),
        });
    }

    let HashReport {
        records,
        failures,
        stats,
    } = report;

    let manifest = ManifestBuilder::new(config)
        .assets(records)
        .failures(failures)
        .build();
    let path = ManifestWriter::new(&root).write(&manifest)?;

    if verbose {
        tracing::info!(
            path = %path.display(),
            scanned = stats.files_scanned,
            hashed = stats.files_hashed,
            failed = stats.failures,
            bytes = %humansize::format_size(stats.bytes_hashed, humansize::BINARY),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "manifest written"
        );
    }

    Ok(manifest)
}

/// Report the final outcome and hand it back.
fn finish(outcome: RunOutcome) -> RunOutcome {
    match &outcome {
        RunOutcome::Skipped => tracing::info!("manifest generation disabled, skipping"),
        RunOutcome::Completed(manifest) => {
            tracing::info!(assets = manifest.assets.len(), "integrity manifest complete");
        }
        RunOutcome::CompletedWithFailures(manifest) => tracing::info!(
            assets = manifest.assets.len(),
            failures = manifest.failures.len(),
            "integrity manifest complete with failures"
        ),
        RunOutcome::Failed { kind, reason } => {
            tracing::error!(%kind, "integrity manifest failed: {reason}");
        }
    }
    outcome
}
