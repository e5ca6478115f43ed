//! Write-then-rename manifest commits.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use cryptoguard_core::{MANIFEST_FILE_NAME, MANIFEST_TEMP_PREFIX, Manifest};

use crate::error::PersistError;

/// Render a manifest in canonical form.
///
/// Two-space indented JSON with fields in declaration order and a trailing
/// newline. Equal manifests always render to identical bytes.
pub fn render_manifest(manifest: &Manifest) -> Result<String, PersistError> {
    let mut json = serde_json::to_string_pretty(manifest).map_err(PersistError::Serialize)?;
    json.push('\n');
    Ok(json)
}

/// Writes manifests into an output directory.
#[derive(Debug, Clone)]
pub struct ManifestWriter {
    dir: PathBuf,
}

impl ManifestWriter {
    /// Create a writer for the given output directory.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Canonical manifest location.
    pub fn manifest_path(&self) -> PathBuf {
        self.dir.join(MANIFEST_FILE_NAME)
    }

    /// Write the manifest to a synced temporary file next to its final path.
    ///
    /// Nothing at the canonical path changes until [`StagedManifest::commit`].
    pub fn stage(&self, manifest: &Manifest) -> Result<StagedManifest, PersistError> {
        let contents = render_manifest(manifest)?;
        let stage_err = |source| PersistError::Stage {
            dir: self.dir.clone(),
            source,
        };

        let mut temp = tempfile::Builder::new()
            .prefix(MANIFEST_TEMP_PREFIX)
            .suffix(".tmp")
            .tempfile_in(&self.dir)
            .map_err(stage_err)?;

        // Temp files start out owner-only; the manifest ships with the build
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Err(e) = fs::set_permissions(temp.path(), fs::Permissions::from_mode(0o644)) {
                tracing::debug!(path = %temp.path().display(), err = %e, "failed to set manifest permissions");
            }
        }

        temp.write_all(contents.as_bytes()).map_err(stage_err)?;
        temp.as_file().sync_all().map_err(stage_err)?;

        Ok(StagedManifest {
            temp,
            target: self.manifest_path(),
        })
    }

    /// Stage and commit in one step.
    pub fn write(&self, manifest: &Manifest) -> Result<PathBuf, PersistError> {
        self.stage(manifest)?.commit()
    }

    /// Read the manifest currently at the canonical path, if there is one.
    pub fn read_existing(&self) -> Result<Option<Manifest>, PersistError> {
        let path = self.manifest_path();
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(PersistError::Read { path, source }),
        };
        serde_json::from_str(&contents)
            .map(Some)
            .map_err(|source| PersistError::Parse { path, source })
    }
}

/// A fully written manifest waiting to be renamed into place.
///
/// Dropping it without committing deletes the temporary file and leaves any
/// previous manifest untouched.
#[derive(Debug)]
pub struct StagedManifest {
    temp: NamedTempFile,
    target: PathBuf,
}

impl StagedManifest {
    /// Location of the staged temporary file.
    pub fn temp_path(&self) -> &Path {
        self.temp.path()
    }

    /// Atomically replace the canonical manifest with the staged one.
    pub fn commit(self) -> Result<PathBuf, PersistError> {
        let target = self.target;
        // On failure the returned temp file is dropped, which removes it
        self.temp
            .persist(&target)
            .map_err(|e| PersistError::Commit {
                path: target.clone(),
                source: e.error,
            })?;

        if let Some(parent) = target.parent() {
            sync_dir(parent);
        }
        Ok(target)
    }
}

/// Make the rename durable. Best effort; not all platforms support it.
fn sync_dir(dir: &Path) {
    #[cfg(unix)]
    if let Err(e) = File::open(dir).and_then(|d| d.sync_all()) {
        tracing::debug!(dir = %dir.display(), err = %e, "directory sync failed");
    }
    #[cfg(not(unix))]
    let _ = dir;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use cryptoguard_core::{AssetPath, AssetRecord, ContentDigest, ManifestBuilder, ManifestConfig};
    use tempfile::TempDir;

    fn manifest(dir: &Path, byte: u8) -> Manifest {
        ManifestBuilder::new(&ManifestConfig::new(dir))
            .generated_at(DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap())
            .assets([AssetRecord::new(
                AssetPath::parse("a.js").unwrap(),
                ContentDigest::new([byte; 32]),
                1,
            )])
            .build()
    }

    fn leftover_temps(dir: &Path) -> usize {
        fs::read_dir(dir)
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().starts_with(MANIFEST_TEMP_PREFIX))
            .count()
    }

    #[test]
    fn test_write_and_read_back() {
        let temp = TempDir::new().unwrap();
        let writer = ManifestWriter::new(temp.path());
        assert!(writer.read_existing().unwrap().is_none());

        let manifest = manifest(temp.path(), 1);
        let path = writer.write(&manifest).unwrap();

        assert_eq!(path, temp.path().join(MANIFEST_FILE_NAME));
        assert_eq!(writer.read_existing().unwrap(), Some(manifest));
        assert_eq!(leftover_temps(temp.path()), 0);
    }

    #[test]
    fn test_render_is_canonical() {
        let temp = TempDir::new().unwrap();
        let first = render_manifest(&manifest(temp.path(), 7)).unwrap();
        let second = render_manifest(&manifest(temp.path(), 7)).unwrap();

        assert_eq!(first, second);
        assert!(first.ends_with("}\n"));
        assert!(first.starts_with("{\n  \"formatVersion\": 1,"));
    }

    #[test]
    fn test_staged_manifest_is_invisible_until_commit() {
        let temp = TempDir::new().unwrap();
        let writer = ManifestWriter::new(temp.path());
        writer.write(&manifest(temp.path(), 1)).unwrap();
        let before = fs::read(writer.manifest_path()).unwrap();

        let staged = writer.stage(&manifest(temp.path(), 2)).unwrap();
        assert!(staged.temp_path().exists());
        assert_eq!(fs::read(writer.manifest_path()).unwrap(), before);

        staged.commit().unwrap();
        let after = writer.read_existing().unwrap().unwrap();
        assert_eq!(after.assets[0].digest, ContentDigest::new([2; 32]));
    }

    #[test]
    fn test_interrupted_commit_keeps_previous_manifest() {
        let temp = TempDir::new().unwrap();
        let writer = ManifestWriter::new(temp.path());
        writer.write(&manifest(temp.path(), 1)).unwrap();
        let before = fs::read(writer.manifest_path()).unwrap();

        // Simulate a crash between the temp write and the rename
        let staged = writer.stage(&manifest(temp.path(), 2)).unwrap();
        drop(staged);

        assert_eq!(fs::read(writer.manifest_path()).unwrap(), before);
        assert_eq!(leftover_temps(temp.path()), 0);
    }

    #[test]
    fn test_failed_commit_leaves_no_partial_file() {
        let temp = TempDir::new().unwrap();
        let writer = ManifestWriter::new(temp.path());
        // A directory squatting on the manifest path makes the rename fail
        fs::create_dir(writer.manifest_path()).unwrap();
        fs::write(writer.manifest_path().join("keep"), "x").unwrap();

        let err = writer.write(&manifest(temp.path(), 1)).unwrap_err();
        assert!(matches!(err, PersistError::Commit { .. }));
        assert!(writer.manifest_path().is_dir());
        assert_eq!(leftover_temps(temp.path()), 0);
    }

    #[test]
    fn test_missing_directory_fails_to_stage() {
        let temp = TempDir::new().unwrap();
        let writer = ManifestWriter::new(temp.path().join("missing"));
        let err = writer.write(&manifest(temp.path(), 1)).unwrap_err();
        assert!(matches!(err, PersistError::Stage { .. }));
    }

    #[test]
    fn test_existing_manifest_with_escaping_path() {
        let temp = TempDir::new().unwrap();
        let writer = ManifestWriter::new(temp.path());
        let rendered = render_manifest(&manifest(temp.path(), 1)).unwrap();
        let tampered = rendered.replace("\"a.js\"", "\"../a.js\"");
        assert_ne!(rendered, tampered);
        fs::write(writer.manifest_path(), tampered).unwrap();

        assert!(matches!(
            writer.read_existing(),
            Err(PersistError::Parse { .. })
        ));
    }

    #[test]
    fn test_corrupt_existing_manifest() {
        let temp = TempDir::new().unwrap();
        let writer = ManifestWriter::new(temp.path());
        fs::write(writer.manifest_path(), "{ not json").unwrap();
        assert!(matches!(
            writer.read_existing(),
            Err(PersistError::Parse { .. })
        ));
    }
}
