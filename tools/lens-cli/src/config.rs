//! CLI configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use lens_search::SearchConfig;
use serde::{Deserialize, Serialize};

/// File names looked for, in order, in each search directory.
pub const CONFIG_NAMES: [&str; 3] = ["pricelens.toml", ".pricelens.toml", "pricelens.json"];

/// CLI configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CliConfig {
    /// Where wishlist, history and preferences are stored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,

    /// Default signed-in user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    /// Provider, relay and timeout settings.
    #[serde(default)]
    pub search: SearchConfig,
}

impl CliConfig {
    /// Load config from a file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        if is_json(path) {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display()))
        } else {
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display()))
        }
    }

    /// Save config to a file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = if is_json(path) {
            serde_json::to_string_pretty(self)?
        } else {
            toml::to_string_pretty(self)?
        };

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))
    }

    /// Find the first config file in `dirs`, in order.
    pub fn find(dirs: &[PathBuf]) -> Option<PathBuf> {
        dirs.iter()
            .flat_map(|dir| CONFIG_NAMES.iter().map(move |name| dir.join(name)))
            .find(|path| path.is_file())
    }

    /// The working directory, then the user config directory.
    pub fn search_dirs(cwd: &Path) -> Vec<PathBuf> {
        let mut dirs = vec![cwd.to_path_buf()];
        if let Some(config_dir) = dirs::config_dir() {
            dirs.push(config_dir.join("pricelens"));
        }
        dirs
    }

    /// The configured data directory, or the platform default.
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(default_data_dir)
    }
}

fn is_json(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "json")
}

/// Platform data directory, falling back to the temp dir.
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("pricelens")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_toml_with_search_table() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pricelens.toml");
        std::fs::write(
            &path,
            r#"
user = "ana"
data_dir = "/var/lib/pricelens"

[search]
api_key = "k"
mock_mode = true
proxy_index = 2
"#,
        )
        .unwrap();

        let config = CliConfig::load(&path).unwrap();
        assert_eq!(config.user.as_deref(), Some("ana"));
        assert_eq!(config.data_dir(), PathBuf::from("/var/lib/pricelens"));
        assert_eq!(config.search.api_key, "k");
        assert!(config.search.mock_mode);
        assert_eq!(config.search.proxy_index, 2);
        assert_eq!(config.search.search_timeout_secs, 30);
    }

    #[test]
    fn test_load_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pricelens.json");
        std::fs::write(&path, r#"{ "search": { "default_limit": 5 } }"#).unwrap();

        let config = CliConfig::load(&path).unwrap();
        assert_eq!(config.search.default_limit, 5);
        assert!(config.user.is_none());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pricelens.toml");
        let mut config = CliConfig::default();
        config.search.gl = "gb".to_string();
        config.user = Some("sam".to_string());

        config.save(&path).unwrap();
        assert_eq!(CliConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_find_respects_directory_order() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        std::fs::write(second.path().join("pricelens.toml"), "").unwrap();

        let dirs = vec![first.path().to_path_buf(), second.path().to_path_buf()];
        assert_eq!(CliConfig::find(&dirs), Some(second.path().join("pricelens.toml")));

        std::fs::write(first.path().join(".pricelens.toml"), "").unwrap();
        assert_eq!(CliConfig::find(&dirs), Some(first.path().join(".pricelens.toml")));
    }

    #[test]
    fn test_bad_toml_has_context() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pricelens.toml");
        std::fs::write(&path, "search = 3").unwrap();

        let err = CliConfig::load(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to parse TOML config"));
    }
}
