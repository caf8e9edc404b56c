//! Startup configuration for the resource manager.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Deserializer};

use crate::error::{AssetError, AssetResult};
use crate::scheduler::DEFAULT_TICK_BUDGET;

/// Directories, archives and scheduler settings mounted at startup.
///
/// Sources are registered in the listed order, directories before archives,
/// so earlier entries take precedence for duplicate filenames.
///
/// Read from TOML with [`from_toml`](Self::from_toml) or
/// [`load`](Self::load):
///
/// ```toml
/// tick_budget_ms = 8
///
/// [[data_dirs]]
/// path = "mods"
///
/// [[data_dirs]]
/// path = "data"
/// recursive = false
///
/// [[paks]]
/// path = "data.pak"
/// key = "secret"
/// ```
///
/// # Example
///
/// ```
/// use quarry_assets::ResourceConfig;
///
/// let config = ResourceConfig::default()
///     .with_directory("data", true)
///     .with_archive("data.pak", Some("secret"));
/// assert_eq!(config.archives.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResourceConfig {
    /// Wall-clock time spent per load screen tick.
    #[serde(rename = "tick_budget_ms", deserialize_with = "millis")]
    pub tick_budget: Duration,
    /// Loose file directories.
    #[serde(rename = "data_dirs")]
    pub directories: Vec<DirectorySource>,
    /// Archives and their decryption keys.
    #[serde(rename = "paks")]
    pub archives: Vec<ArchiveSource>,
}

/// A directory of loose files.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DirectorySource {
    pub path: PathBuf,
    /// Scan subdirectories too. Defaults to `true`.
    #[serde(default = "recursive_by_default")]
    pub recursive: bool,
}

/// A pak archive.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArchiveSource {
    pub path: PathBuf,
    #[serde(default)]
    pub key: Option<String>,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            tick_budget: DEFAULT_TICK_BUDGET,
            directories: Vec::new(),
            archives: Vec::new(),
        }
    }
}

impl ResourceConfig {
    /// Parse a TOML document. Missing keys keep their defaults.
    pub fn from_toml(text: &str) -> AssetResult<Self> {
        toml::from_str(text).map_err(|source| AssetError::Config { path: None, source })
    }

    /// Read a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> AssetResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| AssetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = toml::from_str(&text).map_err(|source| AssetError::Config {
            path: Some(path.to_path_buf()),
            source,
        })?;
        tracing::debug!("Loaded resource config '{}'", path.display());
        Ok(config)
    }

    /// Set the per-tick time budget.
    pub fn with_tick_budget(mut self, budget: Duration) -> Self {
        self.tick_budget = budget;
        self
    }

    /// Add a directory source.
    pub fn with_directory(mut self, path: impl Into<PathBuf>, recursive: bool) -> Self {
        self.directories.push(DirectorySource {
            path: path.into(),
            recursive,
        });
        self
    }

    /// Add an archive source.
    pub fn with_archive(mut self, path: impl Into<PathBuf>, key: Option<&str>) -> Self {
        self.archives.push(ArchiveSource {
            path: path.into(),
            key: key.map(str::to_string),
        });
        self
    }
}

fn recursive_by_default() -> bool {
    true
}

fn millis<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    u64::deserialize(deserializer).map(Duration::from_millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ResourceConfig::from_toml("").unwrap();
        assert_eq!(config, ResourceConfig::default());
        assert_eq!(config.tick_budget, Duration::from_millis(16));
    }

    #[test]
    fn test_from_toml() {
        let config = ResourceConfig::from_toml(
            r#"
            tick_budget_ms = 4

            [[data_dirs]]
            path = "data"
            recursive = false

            [[data_dirs]]
            path = "mods"

            [[paks]]
            path = "data.pak"
            key = "shared"

            [[paks]]
            path = "packs/music.pak"
            "#,
        )
        .unwrap();

        let expected = ResourceConfig::default()
            .with_tick_budget(Duration::from_millis(4))
            .with_directory("data", false)
            .with_directory("mods", true)
            .with_archive("data.pak", Some("shared"))
            .with_archive("packs/music.pak", None);
        assert_eq!(config, expected);
    }

    #[test]
    fn test_rejects_malformed_config() {
        assert!(matches!(
            ResourceConfig::from_toml("tick_budget_ms = -3"),
            Err(AssetError::Config { path: None, .. })
        ));
        assert!(matches!(
            ResourceConfig::from_toml("data_dir = []"),
            Err(AssetError::Config { .. })
        ));
        assert!(matches!(
            ResourceConfig::from_toml("[[paks]]\nkey = \"k\""),
            Err(AssetError::Config { .. })
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            ResourceConfig::load(dir.path().join("resources.toml")),
            Err(AssetError::Io { .. })
        ));
    }
}
