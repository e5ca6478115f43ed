//! cryptoguard - build-time asset integrity manifests.
//!
//! Usage:
//!   cryptoguard [PROJECT_DIR]                 Manifest the default output dir
//!   cryptoguard --root-dir out                Manifest an explicit directory
//!   cryptoguard --output-mode static-export   Skip server-only subtrees
//!   cryptoguard --help                        Show help
//!
//! Flags override the environment variables a host build sets
//! (`NEXT_PUBLIC_BASE_PATH`, `CUSTOM_DIST_DIR`, `NEXT_OUTPUT_MODE`,
//! `MANIFEST_VERBOSE`, `MANIFEST_DISABLED`).

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use color_eyre::eyre::Result;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use cryptoguard_generate::{DigestAlgorithm, Generator, ManifestOptions, OutputMode, RunOutcome};

#[derive(Parser)]
#[command(
    name = "cryptoguard",
    version,
    about = "Write a content-addressed integrity manifest for a build output directory",
    long_about = "cryptoguard hashes every asset in a finished build output directory and \
                  atomically writes a sorted manifest next to them.\n\n\
                  Run it after the build has emitted its output. Options given here \
                  take precedence over environment variables, which take precedence \
                  over built-in defaults."
)]
struct Cli {
    /// Project directory the output directory is resolved against
    project_dir: Option<PathBuf>,

    /// Output directory to scan (overrides --dist-dir)
    #[arg(short, long)]
    root_dir: Option<PathBuf>,

    /// Output directory relative to the project directory
    #[arg(short, long)]
    dist_dir: Option<PathBuf>,

    /// URL prefix the build is served under
    #[arg(short, long)]
    base_path: Option<String>,

    /// Build topology
    #[arg(short = 'm', long)]
    output_mode: Option<ModeArg>,

    /// Report every failure and a run summary
    #[arg(short, long)]
    verbose: bool,

    /// Do nothing and report the run as skipped
    #[arg(long)]
    disabled: bool,

    /// Number of hashing workers (0 = one per CPU)
    #[arg(short = 'j', long)]
    workers: Option<usize>,

    /// Digest algorithm
    #[arg(short, long)]
    algorithm: Option<AlgorithmArg>,

    /// Glob pattern for bookkeeping entries to skip (repeatable)
    #[arg(short = 'x', long = "exclude", value_name = "PATTERN")]
    exclude: Vec<String>,

    /// Exit with failure if any asset could not be hashed
    #[arg(long)]
    strict: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Server,
    StaticExport,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum AlgorithmArg {
    Blake3,
    Sha256,
}

impl Cli {
    /// Flags the user actually passed, as the explicit configuration layer.
    fn options(&self) -> ManifestOptions {
        ManifestOptions {
            project_dir: self.project_dir.clone(),
            root_dir: self.root_dir.clone(),
            dist_dir: self.dist_dir.clone(),
            base_path: self.base_path.clone(),
            output_mode: self.output_mode.map(|mode| match mode {
                ModeArg::Server => OutputMode::Server,
                ModeArg::StaticExport => OutputMode::StaticExport,
            }),
            verbose: self.verbose.then_some(true),
            disabled: self.disabled.then_some(true),
            workers: self.workers,
            algorithm: self.algorithm.map(|algorithm| match algorithm {
                AlgorithmArg::Blake3 => DigestAlgorithm::Blake3,
                AlgorithmArg::Sha256 => DigestAlgorithm::Sha256,
            }),
            exclude: (!self.exclude.is_empty()).then(|| self.exclude.clone()),
            ..ManifestOptions::default()
        }
    }
}

fn main() -> Result<ExitCode> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_logging()?;

    let outcome = Generator::new(cli.options()).run();
    Ok(ExitCode::from(exit_status(&outcome, cli.strict)))
}

/// Log to stderr at `info`, or whatever `RUST_LOG` asks for.
fn init_logging() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn exit_status(outcome: &RunOutcome, strict: bool) -> u8 {
    match outcome {
        RunOutcome::Skipped | RunOutcome::Completed(_) => 0,
        RunOutcome::CompletedWithFailures(manifest) => {
            tracing::warn!(
                failures = manifest.failures.len(),
                "some assets are missing from the manifest"
            );
            u8::from(strict)
        }
        RunOutcome::Failed { .. } => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_flags_leave_layer_empty() {
        let cli = Cli::parse_from(["cryptoguard"]);
        assert_eq!(cli.options(), ManifestOptions::default());
    }

    #[test]
    fn test_flags_become_explicit_options() {
        let cli = Cli::parse_from([
            "cryptoguard",
            "site",
            "--base-path",
            "/app",
            "--output-mode",
            "static-export",
            "--algorithm",
            "sha256",
            "-x",
            "cache",
            "-x",
            "*.log",
            "--verbose",
        ]);
        let options = cli.options();

        assert_eq!(options.project_dir, Some(PathBuf::from("site")));
        assert_eq!(options.base_path.as_deref(), Some("/app"));
        assert_eq!(options.output_mode, Some(OutputMode::StaticExport));
        assert_eq!(options.algorithm, Some(DigestAlgorithm::Sha256));
        assert_eq!(
            options.exclude,
            Some(vec!["cache".to_string(), "*.log".to_string()])
        );
        assert_eq!(options.verbose, Some(true));
        assert_eq!(options.disabled, None);
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_status(&RunOutcome::Skipped, true), 0);
        let failed = RunOutcome::Failed {
            kind: cryptoguard_generate::FailureKind::RootNotFound,
            reason: "missing".to_string(),
        };
        assert_eq!(exit_status(&failed, false), 1);
    }
}
