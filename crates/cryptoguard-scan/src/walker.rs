//! JWalk-based lazy walker over a build output directory.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use jwalk::{DirEntry, DirEntryIter, Parallelism, WalkDir};

use cryptoguard_core::{AssetFailure, AssetPath, ManifestConfig, WalkedFile};

use crate::error::WalkError;
use crate::rules::WalkRules;

/// Enumerates candidate assets under an output directory.
pub struct TreeWalker {
    rules: Arc<WalkRules>,
}

impl TreeWalker {
    /// Create a walker for a resolved configuration.
    pub fn new(config: &ManifestConfig) -> Result<Self, WalkError> {
        Ok(Self::with_rules(WalkRules::from_config(config)?))
    }

    /// Create a walker with explicit rules.
    pub fn with_rules(rules: WalkRules) -> Self {
        Self {
            rules: Arc::new(rules),
        }
    }

    /// Start walking `root`.
    ///
    /// Fails only if `root` is missing or not a directory. The returned
    /// [`Walk`] is lazy and can be consumed once.
    pub fn walk(&self, root: &Path) -> Result<Walk, WalkError> {
        let not_found = || WalkError::RootNotFound {
            path: root.to_path_buf(),
        };
        let root_path = root.canonicalize().map_err(|_| not_found())?;
        if !root_path.is_dir() {
            return Err(not_found());
        }

        let mut pending = VecDeque::new();
        pending.push_back(PendingDir {
            real_dir: root_path.clone(),
            prefix: AssetPath::root(),
            chain: vec![root_path.clone()],
        });

        Ok(Walk {
            root: root_path,
            rules: Arc::clone(&self.rules),
            current: None,
            pending,
        })
    }
}

/// A directory waiting to be walked.
///
/// The root is the first; symlinked directories are queued behind it.
struct PendingDir {
    /// Canonical path of the directory.
    real_dir: PathBuf,
    /// Asset path the directory appears under.
    prefix: AssetPath,
    /// Real roots of every walk leading here, this one included.
    chain: Vec<PathBuf>,
}

struct Segment {
    entries: DirEntryIter<((), ())>,
    real_dir: PathBuf,
    prefix: AssetPath,
    chain: Vec<PathBuf>,
}

/// Lazy sequence of candidate files and per-path failures.
pub struct Walk {
    root: PathBuf,
    rules: Arc<WalkRules>,
    current: Option<Segment>,
    pending: VecDeque<PendingDir>,
}

impl Walk {
    /// Canonical root directory being walked.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn open(&self, dir: PendingDir) -> Segment {
        let rules = Arc::clone(&self.rules);
        let base = dir.real_dir.clone();
        let prefix = dir.prefix.clone();

        let entries = WalkDir::new(&dir.real_dir)
            .parallelism(Parallelism::RayonDefaultPool {
                busy_timeout: Duration::from_millis(100),
            })
            .sort(true)
            .skip_hidden(false)
            .follow_links(false)
            .process_read_dir(move |_depth, _parent, _state, children| {
                // Pruned directories are never read
                children.retain(|child| match child {
                    Ok(entry) => logical_path(&base, &prefix, &entry.path())
                        .is_none_or(|path| !rules.is_excluded(&path)),
                    Err(_) => true,
                });
            })
            .into_iter();

        Segment {
            entries,
            real_dir: dir.real_dir,
            prefix: dir.prefix,
            chain: dir.chain,
        }
    }

    fn visit(&mut self, entry: DirEntry<((), ())>) -> Option<Result<WalkedFile, AssetFailure>> {
        let file_type = entry.file_type();
        if file_type.is_dir() {
            return self.unreadable_dir(&entry).map(Err);
        }

        let segment = self.current.as_ref()?;
        let path = entry.path();
        let Some(asset_path) = logical_path(&segment.real_dir, &segment.prefix, &path) else {
            let lossy = lossy_path(&segment.real_dir, &segment.prefix, &path);
            return Some(Err(AssetFailure::new(lossy, "path is not valid UTF-8")));
        };

        if file_type.is_file() {
            Some(Ok(WalkedFile::new(path, asset_path)))
        } else if file_type.is_symlink() {
            self.visit_symlink(path, asset_path)
        } else {
            tracing::debug!(path = %asset_path, "skipping special file");
            None
        }
    }

    fn visit_symlink(
        &mut self,
        path: PathBuf,
        asset_path: AssetPath,
    ) -> Option<Result<WalkedFile, AssetFailure>> {
        let target = match path.canonicalize() {
            Ok(target) => target,
            Err(err) => {
                let failure = match err.kind() {
                    std::io::ErrorKind::NotFound => AssetFailure::broken_symlink(asset_path),
                    std::io::ErrorKind::PermissionDenied => {
                        AssetFailure::permission_denied(asset_path)
                    }
                    // Resolution loops surface as ELOOP
                    _ => AssetFailure::symlink_cycle(asset_path),
                };
                return Some(Err(failure));
            }
        };

        let metadata = match std::fs::metadata(&target) {
            Ok(metadata) => metadata,
            Err(err) => return Some(Err(AssetFailure::from_io(asset_path, &err))),
        };

        if metadata.is_file() {
            return Some(Ok(WalkedFile::new(path, asset_path)));
        }
        if !metadata.is_dir() {
            return None;
        }

        let segment = self.current.as_ref()?;
        let link_dir = path.parent().unwrap_or(&segment.real_dir);
        let cycles = link_dir.starts_with(&target)
            || segment.chain.iter().any(|root| root.starts_with(&target));
        if cycles {
            tracing::debug!(path = %asset_path, target = %target.display(), "symlink cycle");
            return Some(Err(AssetFailure::symlink_cycle(asset_path)));
        }

        let mut chain = segment.chain.clone();
        chain.push(target.clone());
        self.pending.push_back(PendingDir {
            real_dir: target,
            prefix: asset_path,
            chain,
        });
        None
    }

    /// Failure for a directory jwalk could not list.
    ///
    /// jwalk still yields such a directory, with the error attached. The
    /// segment root (depth 0) reports under the segment's prefix, which is
    /// `.` for the output root.
    fn unreadable_dir(&self, entry: &DirEntry<((), ())>) -> Option<AssetFailure> {
        let err = entry.read_children_error.as_ref()?;
        let segment = self.current.as_ref()?;
        let path = if entry.depth == 0 {
            segment.prefix.clone()
        } else {
            let dir = entry.path();
            logical_path(&segment.real_dir, &segment.prefix, &dir)
                .unwrap_or_else(|| lossy_path(&segment.real_dir, &segment.prefix, &dir))
        };
        tracing::debug!(path = %path, error = %err, "unreadable directory");
        Some(classify(path, err))
    }

    fn read_failure(&self, err: &jwalk::Error) -> AssetFailure {
        let path = self
            .current
            .as_ref()
            .map(|segment| {
                err.path()
                    .and_then(|p| logical_path(&segment.real_dir, &segment.prefix, p))
                    .unwrap_or_else(|| segment.prefix.clone())
            })
            .unwrap_or_else(AssetPath::root);
        classify(path, err)
    }
}

impl Iterator for Walk {
    type Item = Result<WalkedFile, AssetFailure>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let Some(segment) = self.current.as_mut() else {
                let dir = self.pending.pop_front()?;
                self.current = Some(self.open(dir));
                continue;
            };

            match segment.entries.next() {
                Some(Ok(entry)) => {
                    if let Some(item) = self.visit(entry) {
                        return Some(item);
                    }
                }
                Some(Err(err)) => return Some(Err(self.read_failure(&err))),
                None => self.current = None,
            }
        }
    }
}

fn classify(path: AssetPath, err: &jwalk::Error) -> AssetFailure {
    match err.io_error() {
        Some(io) => AssetFailure::from_io(path, io),
        None => AssetFailure::new(path, "unreadable directory"),
    }
}

/// Asset path of `path`, which lies under `base`.
fn logical_path(base: &Path, prefix: &AssetPath, path: &Path) -> Option<AssetPath> {
    let relative = path.strip_prefix(base).ok()?;
    let relative = AssetPath::from_relative(relative)?;
    Some(prefix.join(&relative))
}

fn lossy_path(base: &Path, prefix: &AssetPath, path: &Path) -> AssetPath {
    let relative = path.strip_prefix(base).unwrap_or(path);
    AssetPath::parse(&relative.to_string_lossy().replace('\\', "/"))
        .map(|relative| prefix.join(&relative))
        .unwrap_or_else(|| prefix.clone())
}
