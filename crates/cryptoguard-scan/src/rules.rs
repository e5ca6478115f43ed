//! Inclusion and exclusion rules for the walker.

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

use cryptoguard_core::{
    AssetPath, MANIFEST_FILE_NAME, MANIFEST_TEMP_PREFIX, ManifestConfig, OutputMode,
};

use crate::error::WalkError;

/// Decides which asset paths are in scope.
///
/// Patterns are globs matched against the full asset path, with `*` never
/// crossing a `/`. A matching directory is pruned along with its subtree.
#[derive(Debug, Clone)]
pub struct WalkRules {
    exclude: GlobSet,
    server_only: Option<GlobSet>,
    skip_hidden: bool,
}

impl WalkRules {
    /// Build rules from a resolved configuration.
    pub fn from_config(config: &ManifestConfig) -> Result<Self, WalkError> {
        let server_only = match config.output_mode {
            OutputMode::StaticExport => Some(build_set(&config.server_only)?),
            OutputMode::Server => None,
        };

        Ok(Self {
            exclude: build_set(&config.exclude)?,
            server_only,
            skip_hidden: config.skip_hidden,
        })
    }

    /// Whether hidden entries are skipped.
    pub fn skip_hidden(&self) -> bool {
        self.skip_hidden
    }

    /// Check if an asset path is out of scope.
    pub fn is_excluded(&self, path: &AssetPath) -> bool {
        if is_reserved(path) {
            return true;
        }
        if self.skip_hidden && path.file_name().starts_with('.') {
            return true;
        }
        if self.exclude.is_match(path.as_str()) {
            return true;
        }
        self.server_only
            .as_ref()
            .is_some_and(|set| set.is_match(path.as_str()))
    }
}

/// The manifest and its staging files never describe themselves.
fn is_reserved(path: &AssetPath) -> bool {
    let name = path.as_str();
    name == MANIFEST_FILE_NAME || (!name.contains('/') && name.starts_with(MANIFEST_TEMP_PREFIX))
}

fn build_set(patterns: &[String]) -> Result<GlobSet, WalkError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .map_err(|e| WalkError::InvalidPattern {
                pattern: pattern.clone(),
                message: e.to_string(),
            })?;
        builder.add(glob);
    }
    builder.build().map_err(|e| WalkError::InvalidPattern {
        pattern: patterns.join(", "),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(p: &str) -> AssetPath {
        AssetPath::parse(p).unwrap()
    }

    #[test]
    fn test_default_exclusions() {
        let rules = WalkRules::from_config(&ManifestConfig::new("/out")).unwrap();

        assert!(rules.is_excluded(&path("cache")));
        assert!(rules.is_excluded(&path("trace")));
        assert!(rules.is_excluded(&path(".DS_Store")));
        assert!(rules.is_excluded(&path("static/.hidden")));
        assert!(rules.is_excluded(&path(MANIFEST_FILE_NAME)));
        assert!(!rules.is_excluded(&path("static/cache")));
        assert!(!rules.is_excluded(&path("server")));
        assert!(!rules.is_excluded(&path("sub/cryptoguard-manifest.json")));
    }

    #[test]
    fn test_server_only_in_static_export() {
        let mut config = ManifestConfig::new("/out");
        config.output_mode = OutputMode::StaticExport;
        let rules = WalkRules::from_config(&config).unwrap();

        assert!(rules.is_excluded(&path("server")));
        assert!(!rules.is_excluded(&path("static/server.js")));
    }

    #[test]
    fn test_glob_patterns() {
        let mut config = ManifestConfig::new("/out");
        config.exclude = vec!["**/*.map".to_string(), "static/*.txt".to_string()];
        let rules = WalkRules::from_config(&config).unwrap();

        assert!(rules.is_excluded(&path("a.js.map")));
        assert!(rules.is_excluded(&path("static/chunks/a.js.map")));
        assert!(rules.is_excluded(&path("static/robots.txt")));
        assert!(!rules.is_excluded(&path("static/deep/robots.txt")));
        // Defaults are replaced, not extended
        assert!(!rules.is_excluded(&path("cache")));
    }

    #[test]
    fn test_hidden_entries_when_allowed() {
        let mut config = ManifestConfig::new("/out");
        config.skip_hidden = false;
        let rules = WalkRules::from_config(&config).unwrap();

        assert!(!rules.is_excluded(&path(".well-known")));
        assert!(rules.is_excluded(&path(".cryptoguard-manifest.abc123.tmp")));
    }

    #[test]
    fn test_invalid_pattern() {
        let mut config = ManifestConfig::new("/out");
        config.exclude = vec!["[unclosed".to_string()];
        assert!(matches!(
            WalkRules::from_config(&config),
            Err(WalkError::InvalidPattern { .. })
        ));
    }
}
