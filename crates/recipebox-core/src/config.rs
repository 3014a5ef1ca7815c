//! Application configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/recipebox/config.toml)
//! 3. Environment variables (RECIPEBOX_* prefix)
//!
//! Environment variables take precedence over config file values.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::storage::validate_key;

/// Environment variable prefix
const ENV_PREFIX: &str = "RECIPEBOX";

/// Storage key the collection lives under unless configured otherwise
pub const DEFAULT_STORAGE_KEY: &str = "recipes";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory for data storage (one file per storage key)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Storage key holding the serialized recipe collection
    #[serde(default = "default_storage_key")]
    pub storage_key: String,

    /// Refuse to add a recipe whose title is already taken
    #[serde(default)]
    pub reject_duplicate_titles: bool,

    /// Log file used when RECIPEBOX_LOG is set (stderr otherwise)
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            storage_key: default_storage_key(),
            reject_duplicate_titles: false,
            log_file: None,
        }
    }
}

impl Config {
    /// Load configuration from default location and environment
    ///
    /// Order of precedence (highest to lowest):
    /// 1. Environment variables (RECIPEBOX_DATA_DIR, RECIPEBOX_STORAGE_KEY)
    /// 2. Config file (~/.config/recipebox/config.toml or RECIPEBOX_CONFIG)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load configuration, preferring a path given on the command line
    pub fn load_with_cli_override(path: Option<&PathBuf>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_path(path),
            None => Self::load(),
        }
    }

    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?
        } else {
            Self::default()
        };

        config.apply_env_overrides()?;
        config.ensure_data_dir()?;
        Ok(config)
    }

    /// Load configuration from a TOML string (useful for testing)
    pub fn load_from_str(toml_content: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(toml_content).context("Failed to parse config TOML")?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Configuration rooted at a specific data directory, without touching
    /// the config file or the environment
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    /// Check that `key` can name the stored collection
    ///
    /// The key becomes a file name inside `data_dir`, so path separators and
    /// leading dots are refused.
    pub fn validate_storage_key(key: &str) -> Result<()> {
        validate_key(key).map_err(anyhow::Error::from)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) -> Result<()> {
        // RECIPEBOX_DATA_DIR
        if let Ok(val) = std::env::var(format!("{}_DATA_DIR", ENV_PREFIX)) {
            self.data_dir = PathBuf::from(val);
        }

        // RECIPEBOX_STORAGE_KEY, empty falls back to the default key
        if let Ok(val) = std::env::var(format!("{}_STORAGE_KEY", ENV_PREFIX)) {
            self.storage_key = if val.is_empty() {
                default_storage_key()
            } else {
                Self::validate_storage_key(&val)
                    .with_context(|| format!("Invalid {}_STORAGE_KEY", ENV_PREFIX))?;
                val
            };
        }

        Ok(())
    }

    /// Ensure data directory exists
    fn ensure_data_dir(&self) -> Result<()> {
        if !self.data_dir.exists() {
            std::fs::create_dir_all(&self.data_dir)
                .with_context(|| format!("Failed to create data directory: {:?}", self.data_dir))?;
        }
        Ok(())
    }

    /// Save configuration to the default config file
    pub fn save(&self) -> Result<()> {
        self.save_to_path(&Self::config_file_path())
    }

    /// Save configuration to a specific file
    pub fn save_to_path(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(config_path, content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;
        Ok(())
    }

    /// Get the config file path
    ///
    /// Can be overridden with RECIPEBOX_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("recipebox")
            .join("config.toml")
    }

    /// Path of the file backing the recipe collection
    pub fn collection_path(&self) -> PathBuf {
        self.data_dir.join(format!("{}.json", self.storage_key))
    }
}

/// Get the default data directory
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("recipebox")
}

fn default_storage_key() -> String {
    DEFAULT_STORAGE_KEY.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;
    use tempfile::TempDir;

    // Mutex to serialize tests that touch environment variables
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// Guard that locks env access and saves/restores env vars
    struct EnvGuard<'a> {
        _lock: std::sync::MutexGuard<'a, ()>,
        saved: Vec<(String, Option<String>)>,
    }

    impl<'a> EnvGuard<'a> {
        fn new(vars: &[&str]) -> Self {
            let lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
            let saved = vars
                .iter()
                .map(|&name| (name.to_string(), env::var(name).ok()))
                .collect();
            for name in vars {
                env::remove_var(name);
            }
            Self { _lock: lock, saved }
        }
    }

    impl Drop for EnvGuard<'_> {
        fn drop(&mut self) {
            for (name, value) in &self.saved {
                match value {
                    Some(v) => env::set_var(name, v),
                    None => env::remove_var(name),
                }
            }
        }
    }

    const ENV_VARS: &[&str] = &["RECIPEBOX_DATA_DIR", "RECIPEBOX_STORAGE_KEY"];

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.storage_key, "recipes");
        assert!(!config.reject_duplicate_titles);
        assert!(config.log_file.is_none());
        assert!(config.data_dir.ends_with("recipebox"));
    }

    #[test]
    fn test_collection_path() {
        let config = Config::with_data_dir("/data/recipebox");
        assert_eq!(
            config.collection_path(),
            PathBuf::from("/data/recipebox/recipes.json")
        );
    }

    #[test]
    fn test_env_override_data_dir() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();

        env::set_var("RECIPEBOX_DATA_DIR", "/tmp/recipebox-test");
        config.apply_env_overrides().unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/tmp/recipebox-test"));
    }

    #[test]
    fn test_env_override_storage_key() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();

        env::set_var("RECIPEBOX_STORAGE_KEY", "desserts");
        config.apply_env_overrides().unwrap();
        assert_eq!(config.storage_key, "desserts");

        // Empty string restores the default
        env::set_var("RECIPEBOX_STORAGE_KEY", "");
        config.apply_env_overrides().unwrap();
        assert_eq!(config.storage_key, "recipes");
    }

    #[test]
    fn test_env_override_rejects_path_like_storage_key() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();

        env::set_var("RECIPEBOX_STORAGE_KEY", "../outside");
        assert!(config.apply_env_overrides().is_err());
        assert_eq!(config.storage_key, "recipes");
    }

    #[test]
    fn test_validate_storage_key() {
        assert!(Config::validate_storage_key("recipes").is_ok());
        assert!(Config::validate_storage_key("../x").is_err());
        assert!(Config::validate_storage_key("a/b").is_err());
        assert!(Config::validate_storage_key("").is_err());
    }

    #[test]
    fn test_load_from_str() {
        let _guard = EnvGuard::new(ENV_VARS);

        let toml = r#"
            data_dir = "/custom/data"
            storage_key = "kitchen"
            reject_duplicate_titles = true
        "#;

        let config = Config::load_from_str(toml).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/custom/data"));
        assert_eq!(config.storage_key, "kitchen");
        assert!(config.reject_duplicate_titles);
    }

    #[test]
    fn test_load_from_str_uses_defaults_for_missing_fields() {
        let _guard = EnvGuard::new(ENV_VARS);

        let config = Config::load_from_str(r#"data_dir = "/custom/data""#).unwrap();
        assert_eq!(config.storage_key, "recipes");
        assert!(!config.reject_duplicate_titles);
    }

    #[test]
    fn test_save_and_load_from_path() {
        let _guard = EnvGuard::new(ENV_VARS);
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let mut config = Config::with_data_dir(temp_dir.path().join("data"));
        config.reject_duplicate_titles = true;
        config.save_to_path(&path).unwrap();

        let loaded = Config::load_from_path(&path).unwrap();
        assert_eq!(loaded.data_dir, config.data_dir);
        assert!(loaded.reject_duplicate_titles);
        // Loading creates the data directory
        assert!(loaded.data_dir.exists());
    }

    #[test]
    fn test_load_from_path_missing_file() {
        let _guard = EnvGuard::new(ENV_VARS);
        let temp_dir = TempDir::new().unwrap();
        env::set_var("RECIPEBOX_DATA_DIR", temp_dir.path());

        let path = temp_dir.path().join("missing.toml");
        let config = Config::load_from_path(&path).unwrap();
        // Should return defaults when file doesn't exist
        assert_eq!(config.storage_key, "recipes");
        assert_eq!(config.data_dir, temp_dir.path());
    }
}
