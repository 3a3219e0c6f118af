//! core::config
//!
//! Configuration schema and loading.
//!
//! # Precedence
//!
//! The first file found wins:
//! 1. An explicit path (the CLI `--config` flag)
//! 2. `$WIKISTORE_CONFIG` if set
//! 3. `$XDG_CONFIG_HOME/wikistore/config.toml`
//! 4. `~/.wikistore/config.toml` (canonical write location)
//!
//! Missing files are not an error; defaults root everything under
//! `~/.wikistore`.
//!
//! # Example
//!
//! ```no_run
//! use wikistore::core::config::Config;
//!
//! let config = Config::load(None).unwrap();
//! let paths = config.paths().unwrap();
//! println!("stores under {}", paths.repository_root.display());
//! println!("branch {}", config.branch());
//! ```

pub mod schema;

pub use schema::{HooksConfig, WikiConfig};

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::paths::WikiPaths;
use crate::core::types::BranchName;

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("failed to write config file '{path}': {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("home directory not found")]
    NoHomeDir,
}

/// Loaded configuration with its origin.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub wiki: WikiConfig,
    /// Path of the file the configuration came from, if any.
    source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration, honoring the precedence above.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be read, parsed,
    /// or validated. An explicit path that does not exist is a read error.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let found = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => Self::discover(),
        };

        let (wiki, source_path) = match found {
            Some(path) => (Self::read_config(&path)?, Some(path)),
            None => (WikiConfig::default(), None),
        };

        wiki.validate()?;
        Ok(Self { wiki, source_path })
    }

    /// Build a config directly from a schema value (tests, embedding).
    pub fn from_wiki_config(wiki: WikiConfig) -> Result<Self, ConfigError> {
        wiki.validate()?;
        Ok(Self {
            wiki,
            source_path: None,
        })
    }

    fn discover() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("WIKISTORE_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("wikistore/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        let path = Self::default_config_path().ok()?;
        path.exists().then_some(path)
    }

    fn read_config(path: &Path) -> Result<WikiConfig, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Base directory for defaults: `~/.wikistore`.
    pub fn default_base_dir() -> Result<PathBuf, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(home.join(".wikistore"))
    }

    /// Canonical config location: `~/.wikistore/config.toml`.
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::default_base_dir()?.join("config.toml"))
    }

    /// Write a config atomically (temp file in the same directory, then rename).
    pub fn write(path: &Path, config: &WikiConfig) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
                path: path.to_path_buf(),
                source: e,
            })?;
        }

        let contents =
            toml::to_string_pretty(config).map_err(|e| ConfigError::InvalidValue(e.to_string()))?;

        let temp_path = path.with_extension("toml.tmp");
        let write_err = |source| ConfigError::WriteError {
            path: temp_path.clone(),
            source,
        };
        let mut file = fs::File::create(&temp_path).map_err(write_err)?;
        file.write_all(contents.as_bytes()).map_err(write_err)?;
        file.sync_all().map_err(write_err)?;

        fs::rename(&temp_path, path).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    // =========================================================================
    // Accessors with defaults applied
    // =========================================================================

    /// Where the configuration was loaded from.
    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }

    /// Branch pages are published to. Defaults to `master`.
    pub fn branch(&self) -> BranchName {
        self.wiki.branch.clone().unwrap_or_default()
    }

    /// Resolve storage roots.
    ///
    /// Unset roots default to `~/.wikistore/repositories` and
    /// `~/.wikistore/data`.
    pub fn paths(&self) -> Result<WikiPaths, ConfigError> {
        let repository_root = match &self.wiki.repository_root {
            Some(p) => p.clone(),
            None => Self::default_base_dir()?.join("repositories"),
        };
        let app_data_root = match &self.wiki.app_data_path {
            Some(p) => p.clone(),
            None => Self::default_base_dir()?.join("data"),
        };
        Ok(WikiPaths::new(repository_root, app_data_root))
    }

    /// Hook delegation target, if configured.
    pub fn hook_app_path(&self) -> Option<&Path> {
        self.wiki.hooks.as_ref().and_then(|h| h.app_path.as_deref())
    }

    /// Config file handed to the hook delegate, if configured.
    pub fn hook_config_path(&self) -> Option<&Path> {
        self.wiki
            .hooks
            .as_ref()
            .and_then(|h| h.config_path.as_deref())
    }
}
