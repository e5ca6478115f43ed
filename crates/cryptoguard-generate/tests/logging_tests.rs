use std::fs;
use std::io;
use std::sync::{Arc, Mutex};

use cryptoguard_generate::{Generator, ManifestOptions, RunOutcome};
use tempfile::TempDir;
use tracing::Level;
use tracing_subscriber::fmt::MakeWriter;

#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

struct BufferWriter(Arc<Mutex<Vec<u8>>>);

impl<'a> MakeWriter<'a> for SharedBuffer {
    type Writer = BufferWriter;

    fn make_writer(&'a self) -> Self::Writer {
        BufferWriter(Arc::clone(&self.0))
    }
}

impl io::Write for BufferWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut guard = self
            .0
            .lock()
            .map_err(|_| io::Error::other("lock poisoned"))?;
        guard.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A tree with one good file and one dangling symlink.
#[cfg(unix)]
fn tree_with_failure() -> TempDir {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("a.js"), "x").unwrap();
    std::os::unix::fs::symlink(temp.path().join("nowhere"), temp.path().join("b.js")).unwrap();
    temp
}

/// Run on this thread with an info-level subscriber and return the log lines.
fn captured_run(explicit: ManifestOptions, env: &[(&str, &str)]) -> (RunOutcome, Vec<String>) {
    let sink = SharedBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(sink.clone())
        .with_ansi(false)
        .with_max_level(Level::INFO)
        .finish();

    let outcome = tracing::subscriber::with_default(subscriber, || {
        let env = ManifestOptions::from_env(|key| {
            env.iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| value.to_string())
        });
        Generator::with_env(explicit, env).run()
    });

    let bytes = sink.0.lock().unwrap().clone();
    let lines = String::from_utf8(bytes)
        .unwrap()
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect();
    (outcome, lines)
}

#[cfg(unix)]
#[test]
fn test_quiet_run_reports_only_the_outcome() {
    let temp = tree_with_failure();

    let (outcome, lines) = captured_run(
        ManifestOptions::new().with_root_dir(temp.path()),
        &[("SOURCE_DATE_EPOCH", "yesterday")],
    );

    assert!(matches!(outcome, RunOutcome::CompletedWithFailures(_)));
    assert_eq!(lines.len(), 1, "unexpected log output: {lines:?}");
    assert!(lines[0].contains("integrity manifest complete with failures"));
    assert!(!lines[0].contains("WARN"));
}

#[cfg(unix)]
#[test]
fn test_verbose_run_reports_each_failure() {
    let temp = tree_with_failure();

    let (outcome, lines) = captured_run(
        ManifestOptions::new()
            .with_root_dir(temp.path())
            .with_verbose(true),
        &[],
    );

    assert!(matches!(outcome, RunOutcome::CompletedWithFailures(_)));
    let warnings: Vec<&String> = lines.iter().filter(|line| line.contains("WARN")).collect();
    assert_eq!(warnings.len(), 1, "unexpected log output: {lines:?}");
    assert!(warnings[0].contains("asset failed"));
    assert!(warnings[0].contains("b.js"));
    assert!(lines.iter().any(|line| line.contains("manifest written")));
}
