//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Validation
//!
//! Config values are validated after parsing: paths must be non-empty and
//! the branch must be a valid branch name (enforced by [`BranchName`]
//! during deserialization).

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::core::types::BranchName;

/// Wiki storage configuration.
///
/// # Example
///
/// ```toml
/// repository_root = "/var/lib/wikistore/repositories"
/// app_data_path = "/var/lib/wikistore/data"
/// branch = "master"
///
/// [hooks]
/// app_path = "/usr/local/bin/forge"
/// config_path = "/etc/forge/app.ini"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct WikiConfig {
    /// Root of all owner directories and bare repositories
    pub repository_root: Option<PathBuf>,

    /// Application data root (working copies live under `tmp/local-wiki`)
    pub app_data_path: Option<PathBuf>,

    /// Branch pages are published to (default: "master")
    pub branch: Option<BranchName>,

    /// Server-side hook delegation for newly created stores
    pub hooks: Option<HooksConfig>,
}

impl WikiConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("repository_root", &self.repository_root),
            ("app_data_path", &self.app_data_path),
        ] {
            if value.as_ref().is_some_and(|p| p.as_os_str().is_empty()) {
                return Err(ConfigError::InvalidValue(format!("{name} cannot be empty")));
            }
        }

        if let Some(hooks) = &self.hooks {
            hooks.validate()?;
        }

        Ok(())
    }
}

/// Hook delegation settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct HooksConfig {
    /// Binary the installed hook scripts delegate to
    pub app_path: Option<PathBuf>,

    /// Config file passed to the delegate as `--config`
    pub config_path: Option<PathBuf>,
}

impl HooksConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        match (&self.app_path, &self.config_path) {
            (None, Some(_)) => Err(ConfigError::InvalidValue(
                "hooks.config_path requires hooks.app_path".into(),
            )),
            (Some(app), _) if app.as_os_str().is_empty() => Err(ConfigError::InvalidValue(
                "hooks.app_path cannot be empty".into(),
            )),
            _ => Ok(()),
        }
    }
}
