//! Asset paths, content digests, and per-file records.

use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use compact_str::CompactString;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A normalized path relative to the output root.
///
/// Always forward-slash separated, with no leading slash, no `.` or `..`
/// segments and no empty segments. The root directory itself is written as
/// `.` and only appears in failure entries.
///
/// Ordering is byte-wise lexicographic, independent of locale.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct AssetPath(CompactString);

impl AssetPath {
    /// The output root itself.
    pub fn root() -> Self {
        Self(CompactString::const_new("."))
    }

    /// Build an asset path from a path relative to the output root.
    ///
    /// Returns `None` for empty paths, paths that escape the root, and paths
    /// that are not valid UTF-8.
    pub fn from_relative(path: &Path) -> Option<Self> {
        let mut normalized = CompactString::default();
        for component in path.components() {
            match component {
                Component::Normal(segment) => {
                    if !normalized.is_empty() {
                        normalized.push('/');
                    }
                    normalized.push_str(segment.to_str()?);
                }
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
            }
        }
        (!normalized.is_empty()).then_some(Self(normalized))
    }

    /// Parse a forward-slash relative path.
    pub fn parse(path: &str) -> Option<Self> {
        if path.contains('\\') {
            return None;
        }
        Self::from_relative(Path::new(path))
    }

    /// Append a relative path below this one.
    pub fn join(&self, relative: &AssetPath) -> AssetPath {
        if self.is_root() {
            return relative.clone();
        }
        let mut joined = self.0.clone();
        joined.push('/');
        joined.push_str(relative.as_str());
        Self(joined)
    }

    /// Whether this is the output root.
    pub fn is_root(&self) -> bool {
        self.0 == "."
    }

    /// The path as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The final segment.
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(self.0.as_str())
    }

    /// The extension of the final segment, if any.
    pub fn extension(&self) -> Option<&str> {
        let name = self.file_name();
        match name.rfind('.') {
            Some(0) | None => None,
            Some(idx) => Some(&name[idx + 1..]),
        }
    }

    /// Resolve against an absolute root directory.
    pub fn to_path(&self, root: &Path) -> PathBuf {
        if self.is_root() {
            return root.to_path_buf();
        }
        self.0.split('/').fold(root.to_path_buf(), |acc, seg| acc.join(seg))
    }
}

impl fmt::Display for AssetPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for AssetPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = CompactString::deserialize(deserializer)?;
        if raw == "." {
            return Ok(Self::root());
        }
        // Only the normalized form is accepted, so a read-back manifest
        // cannot name anything outside the root
        match Self::parse(&raw) {
            Some(path) if path.0 == raw => Ok(path),
            _ => Err(serde::de::Error::custom(format!(
                "invalid asset path {raw:?}"
            ))),
        }
    }
}

/// 256-bit content digest, rendered as lowercase hex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentDigest(pub [u8; 32]);

impl ContentDigest {
    /// Create a new digest from raw bytes.
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the digest as a hex string.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for ContentDigest {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 64 || !s.is_ascii() {
            return Err(format!("expected 64 hex characters, got {:?}", s));
        }
        let mut bytes = [0u8; 32];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&s[i * 2..i * 2 + 2], 16)
                .map_err(|e| format!("invalid hex digest: {e}"))?;
        }
        Ok(Self(bytes))
    }
}

impl Serialize for ContentDigest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ContentDigest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        hex.parse().map_err(serde::de::Error::custom)
    }
}

/// One hashed asset in the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetRecord {
    pub path: AssetPath,
    pub digest: ContentDigest,
    pub size_bytes: u64,
    pub content_type: CompactString,
}

impl AssetRecord {
    /// Create a record, inferring the content type from the path.
    pub fn new(path: AssetPath, digest: ContentDigest, size_bytes: u64) -> Self {
        let content_type = CompactString::const_new(content_type_for(&path));
        Self {
            path,
            digest,
            size_bytes,
            content_type,
        }
    }
}

/// A candidate file produced by the tree walker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkedFile {
    /// Absolute path to open for hashing.
    pub path: PathBuf,
    /// Path recorded in the manifest.
    pub asset_path: AssetPath,
}

impl WalkedFile {
    /// Create a new walked file.
    pub fn new(path: impl Into<PathBuf>, asset_path: AssetPath) -> Self {
        Self {
            path: path.into(),
            asset_path,
        }
    }
}

/// Infer a MIME type from the asset's extension.
pub fn content_type_for(path: &AssetPath) -> &'static str {
    let Some(ext) = path.extension() else {
        return "application/octet-stream";
    };
    match ext.to_ascii_lowercase().as_str() {
        "html" | "htm" => "text/html; charset=utf-8",
        "js" | "mjs" | "cjs" => "text/javascript; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "json" | "map" => "application/json",
        "webmanifest" => "application/manifest+json",
        "txt" => "text/plain; charset=utf-8",
        "xml" => "application/xml",
        "rsc" => "text/x-component",
        "wasm" => "application/wasm",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "avif" => "image/avif",
        "ico" => "image/x-icon",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "otf" => "font/otf",
        "pdf" => "application/pdf",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mp3" => "audio/mpeg",
        _ => "application/octet-stream",
    }
}
