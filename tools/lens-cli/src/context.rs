//! CLI execution context.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, Result};
use lens_cache::{Cache, FileStore, StoreScope};
use lens_commerce::LibraryStore;
use lens_observability::Diagnostics;
use lens_search::{Preferences, SearchConfig};

use crate::config::CliConfig;
use crate::output::Output;

/// Execution context for CLI commands.
pub struct Context {
    /// CLI configuration, as loaded from disk.
    pub config: CliConfig,
    /// The file the config came from, if any.
    pub config_path: Option<PathBuf>,
    /// Output handler.
    pub output: Output,
    /// Backing store for preferences and the library.
    pub cache: Cache,
    /// Wishlist and history for the active user.
    pub library: Arc<LibraryStore>,
    /// Recovered failures from this run.
    pub diagnostics: Diagnostics,
}

impl Context {
    /// Load context: config file, data store and library.
    pub fn load(config_path: Option<&str>, user: Option<&str>, output: Output) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;

        let config_path = match config_path {
            Some(path) => Some(PathBuf::from(path)),
            None => CliConfig::find(&CliConfig::search_dirs(&cwd)),
        };
        let config = match &config_path {
            Some(path) => CliConfig::load(path)?,
            None => CliConfig::default(),
        };
        if let Some(path) = &config_path {
            output.debug(&format!("Using config {}", path.display()));
        }

        let data_dir = config.data_dir();
        let user = user.map(str::to_string).or_else(|| config.user.clone());
        Self::open(config, config_path, &data_dir, user.as_deref(), output)
    }

    /// Build a context over an explicit data directory.
    pub fn open(
        config: CliConfig,
        config_path: Option<PathBuf>,
        data_dir: &Path,
        user: Option<&str>,
        output: Output,
    ) -> Result<Self> {
        let store = FileStore::open(data_dir)
            .with_context(|| format!("Failed to open data directory: {}", data_dir.display()))?;
        let cache = Cache::new(store);
        let library = Arc::new(LibraryStore::open(cache.clone(), StoreScope::from_option(user)));

        Ok(Self {
            config,
            config_path,
            output,
            cache,
            library,
            diagnostics: Diagnostics::new(),
        })
    }

    /// Persisted preferences.
    pub fn preferences(&self) -> Preferences {
        Preferences::load(&self.cache)
    }

    /// Effective search configuration: file, then environment, then preferences.
    pub fn search_config(&self) -> SearchConfig {
        self.config
            .search
            .clone()
            .apply_env()
            .apply_preferences(&self.preferences())
    }

    /// Where the config would be written: the loaded file or `pricelens.toml` in the user config dir.
    pub fn config_file(&self) -> PathBuf {
        self.config_path.clone().unwrap_or_else(|| {
            dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("pricelens")
                .join("pricelens.toml")
        })
    }

    pub fn data_dir(&self) -> PathBuf {
        self.config.data_dir()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use lens_commerce::{SearchType, WishlistItem};
    use tempfile::TempDir;

    pub(crate) fn context(dir: &TempDir, user: Option<&str>) -> Context {
        let config = CliConfig {
            data_dir: Some(dir.path().to_path_buf()),
            ..CliConfig::default()
        };
        Context::open(config, None, dir.path(), user, Output::new(false, true)).unwrap()
    }

    #[test]
    fn test_library_persists_across_contexts() {
        let dir = TempDir::new().unwrap();
        {
            let ctx = context(&dir, None);
            ctx.library.add_history("desk lamp", SearchType::Url);
            ctx.library.toggle_wishlist(WishlistItem::new("7", "Desk Lamp"));
        }

        let ctx = context(&dir, None);
        assert_eq!(ctx.library.history()[0].search_term, "desk lamp");
        assert!(ctx.library.is_in_wishlist("7"));
    }

    #[test]
    fn test_user_scopes_are_separate() {
        let dir = TempDir::new().unwrap();
        context(&dir, Some("ana"))
            .library
            .toggle_wishlist(WishlistItem::new("7", "Desk Lamp"));

        assert!(context(&dir, Some("ana")).library.is_in_wishlist("7"));
        assert!(!context(&dir, None).library.is_in_wishlist("7"));
        assert!(!context(&dir, Some("sam")).library.is_in_wishlist("7"));
    }

    #[test]
    fn test_load_falls_back_to_config_user() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pricelens.toml");
        CliConfig {
            data_dir: Some(dir.path().to_path_buf()),
            user: Some("ana".to_string()),
            ..CliConfig::default()
        }
        .save(&path)
        .unwrap();
        let path = path.to_str().unwrap();

        Context::load(Some(path), None, Output::new(false, true))
            .unwrap()
            .library
            .toggle_wishlist(WishlistItem::new("7", "Desk Lamp"));

        assert!(context(&dir, Some("ana")).library.is_in_wishlist("7"));
        assert!(!context(&dir, None).library.is_in_wishlist("7"));

        let sam = Context::load(Some(path), Some("sam"), Output::new(false, true)).unwrap();
        assert!(!sam.library.is_in_wishlist("7"));
        assert_eq!(sam.config.user.as_deref(), Some("ana"));
    }

    #[test]
    fn test_preferences_override_file_config() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir, None);
        assert!(!ctx.search_config().mock_mode);

        Preferences {
            selected_proxy_index: Some(1),
            use_mock_data: Some(true),
        }
        .save(&ctx.cache)
        .unwrap();

        let config = ctx.search_config();
        assert!(config.mock_mode);
        assert_eq!(config.proxy_index, 1);
    }
}
