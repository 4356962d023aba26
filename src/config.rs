//! Profile configuration for PlugScan
//!
//! A [`ProfileConfig`] names the plugin root directory and the file naming
//! conventions used while scanning. Configuration can be loaded from a JSON
//! file and overridden through `PLUGSCAN_*` environment variables.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{PlugError, Result};

/// Environment variable overriding [`ProfileConfig::root_dir`].
pub const ENV_ROOT: &str = "PLUGSCAN_ROOT";
/// Environment variable overriding [`ProfileConfig::archive_extension`].
pub const ENV_ARCHIVE_EXTENSION: &str = "PLUGSCAN_ARCHIVE_EXTENSION";
/// Environment variable overriding [`ProfileConfig::unit_suffix`].
pub const ENV_UNIT_SUFFIX: &str = "PLUGSCAN_UNIT_SUFFIX";

/// Settings for a plugin profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileConfig {
    /// Directory tree scanned for plugin archives.
    pub root_dir: PathBuf,

    /// Archive file extension, without the dot. Matched case-insensitively.
    pub archive_extension: String,

    /// Suffix of archive entries that each describe one type.
    pub unit_suffix: String,

    /// Whether symlinks are followed while walking the tree.
    pub follow_links: bool,

    /// Tag every loaded type with the file stem of its archive.
    pub tag_by_archive: bool,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            root_dir: default_root_dir(),
            archive_extension: "zip".to_string(),
            unit_suffix: ".unit".to_string(),
            follow_links: true,
            tag_by_archive: false,
        }
    }
}

impl ProfileConfig {
    /// Default configuration rooted at `root_dir`.
    pub fn with_root(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            ..Self::default()
        }
    }

    /// Load configuration from a JSON file. Missing fields take defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            PlugError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config: ProfileConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `PLUGSCAN_*` environment overrides on top of this config.
    pub fn apply_env_overrides(mut self) -> Self {
        self.merge_overrides(|key| std::env::var(key).ok());
        self
    }

    fn merge_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(root) = lookup(ENV_ROOT).filter(|v| !v.trim().is_empty()) {
            self.root_dir = expand_home(&root);
        }
        if let Some(ext) = lookup(ENV_ARCHIVE_EXTENSION).filter(|v| !v.trim().is_empty()) {
            self.archive_extension = ext.trim().trim_start_matches('.').to_string();
        }
        if let Some(suffix) = lookup(ENV_UNIT_SUFFIX).filter(|v| !v.trim().is_empty()) {
            self.unit_suffix = suffix.trim().to_string();
        }
    }

    /// Check that the naming conventions are usable.
    pub fn validate(&self) -> Result<()> {
        let ext = self.archive_extension.trim();
        if ext.is_empty() || ext.contains('.') || ext.contains('/') {
            return Err(PlugError::Config(format!(
                "Invalid archive extension '{}': expected a bare extension such as 'zip'",
                self.archive_extension
            )));
        }
        if self.unit_suffix.is_empty() || self.unit_suffix.contains('/') {
            return Err(PlugError::Config(format!(
                "Invalid unit suffix '{}'",
                self.unit_suffix
            )));
        }
        Ok(())
    }
}

/// Returns the default plugin root, `~/.plugscan/plugins`.
fn default_root_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".plugscan")
        .join("plugins")
}

fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(rest),
        None => PathBuf::from(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = ProfileConfig::default();
        assert_eq!(config.archive_extension, "zip");
        assert_eq!(config.unit_suffix, ".unit");
        assert!(config.follow_links);
        assert!(!config.tag_by_archive);
        assert!(config.root_dir.ends_with(".plugscan/plugins"));
    }

    #[test]
    fn test_with_root() {
        let config = ProfileConfig::with_root("/opt/plugins");
        assert_eq!(config.root_dir, PathBuf::from("/opt/plugins"));
        assert_eq!(config.archive_extension, "zip");
    }

    #[test]
    fn test_load_partial_file_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("plugscan.json");
        fs::write(
            &path,
            r#"{"root_dir": "/srv/plugins", "archive_extension": "jar"}"#,
        )
        .unwrap();

        let config = ProfileConfig::load(&path).unwrap();
        assert_eq!(config.root_dir, PathBuf::from("/srv/plugins"));
        assert_eq!(config.archive_extension, "jar");
        assert_eq!(config.unit_suffix, ".unit");
    }

    #[test]
    fn test_load_missing_file() {
        let result = ProfileConfig::load(Path::new("/nonexistent/plugscan.json"));
        assert!(matches!(result, Err(PlugError::Config(_))));
    }

    #[test]
    fn test_load_malformed_json() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("plugscan.json");
        fs::write(&path, "{ broken").unwrap();
        assert!(matches!(
            ProfileConfig::load(&path),
            Err(PlugError::Json(_))
        ));
    }

    #[test]
    fn test_load_rejects_dotted_extension() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("plugscan.json");
        fs::write(&path, r#"{"archive_extension": "tar.gz"}"#).unwrap();
        let err = ProfileConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("Invalid archive extension"));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            (ENV_ROOT, "/data/plugins"),
            (ENV_ARCHIVE_EXTENSION, ".JAR"),
            (ENV_UNIT_SUFFIX, ".class"),
        ]
        .into_iter()
        .collect();

        let mut config = ProfileConfig::default();
        config.merge_overrides(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.root_dir, PathBuf::from("/data/plugins"));
        assert_eq!(config.archive_extension, "JAR");
        assert_eq!(config.unit_suffix, ".class");
    }

    #[test]
    fn test_blank_env_override_ignored() {
        let mut config = ProfileConfig::with_root("/keep");
        config.merge_overrides(|k| (k == ENV_ROOT).then(|| "  ".to_string()));
        assert_eq!(config.root_dir, PathBuf::from("/keep"));
    }

    #[test]
    fn test_validate_rejects_empty_suffix() {
        let mut config = ProfileConfig::default();
        config.unit_suffix = String::new();
        assert!(config.validate().is_err());
    }
}
