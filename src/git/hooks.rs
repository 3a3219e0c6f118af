//! git::hooks
//!
//! Server-side hook delegation for newly created bare stores.
//!
//! A hosting application usually wants every push into a store to reach
//! its own hook handler. [`DelegateHooks`] writes small shell scripts into
//! `<store>/hooks/` that forward to `<app> hook --config=<conf> <name>`.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Hooks installed into every new store.
pub const DELEGATED_HOOKS: [&str; 3] = ["pre-receive", "update", "post-receive"];

/// Errors from hook installation.
#[derive(Debug, Error)]
pub enum HookError {
    #[error("failed to write hook '{path}': {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Installs server-side hooks into a freshly created bare store.
pub trait HookInstaller: Send + Sync {
    fn install(&self, store_path: &Path) -> Result<(), HookError>;
}

/// Installs nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHooks;

impl HookInstaller for NoHooks {
    fn install(&self, _store_path: &Path) -> Result<(), HookError> {
        Ok(())
    }
}

/// Writes hook scripts that delegate to the hosting application binary.
#[derive(Debug, Clone)]
pub struct DelegateHooks {
    app_path: PathBuf,
    config_path: Option<PathBuf>,
}

impl DelegateHooks {
    pub fn new(app_path: impl Into<PathBuf>) -> Self {
        Self {
            app_path: app_path.into(),
            config_path: None,
        }
    }

    /// Pass `--config=<path>` to the delegate.
    pub fn with_config(mut self, config_path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(config_path.into());
        self
    }

    /// Script body for the hook called `name`.
    ///
    /// `update` receives the ref name and old/new OIDs as arguments; the
    /// receive hooks read them from stdin. Both paths are single-quoted
    /// for the shell.
    pub fn script(&self, name: &str) -> String {
        let config = match &self.config_path {
            Some(path) => format!(" --config={}", shell_quote(path)),
            None => String::new(),
        };
        let args = if name == "update" { " \"$1\" \"$2\" \"$3\"" } else { "" };
        format!(
            "#!/usr/bin/env sh\n{} hook{} {}{}\n",
            shell_quote(&self.app_path),
            config,
            name,
            args
        )
    }
}

/// Quote `path` as one POSIX shell word.
///
/// Inside single quotes nothing is special except `'` itself, which is
/// written as `'\''`.
fn shell_quote(path: &Path) -> String {
    let raw = path.display().to_string();
    format!("'{}'", raw.replace('\'', r"'\''"))
}

impl HookInstaller for DelegateHooks {
    fn install(&self, store_path: &Path) -> Result<(), HookError> {
        let hooks_dir = store_path.join("hooks");
        fs::create_dir_all(&hooks_dir).map_err(|e| HookError::Write {
            path: hooks_dir.clone(),
            source: e,
        })?;

        for name in DELEGATED_HOOKS {
            let path = hooks_dir.join(name);
            write_executable(&path, self.script(name).as_bytes())
                .map_err(|e| HookError::Write { path, source: e })?;
        }
        Ok(())
    }
}

fn write_executable(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    fs::write(path, contents)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o755))?;
    }
    Ok(())
}
