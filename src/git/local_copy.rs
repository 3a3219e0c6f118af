//! git::local_copy
//!
//! Bare store initialization and the discard/sync primitives for
//! disposable local working copies.
//!
//! The primitives take any (local path, store path, branch) triple; they
//! know nothing about wikis.
//!
//! # Invariants
//!
//! - A store created here is bare and its HEAD names the publish branch
//! - A working copy created here is non-bare with `origin` pointing at
//!   the store
//! - After [`discard_local_changes`] the working copy has no modified,
//!   staged, or untracked files
//! - An empty store (no commits yet) syncs to an empty working directory
//!   rather than failing

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use super::hooks::{HookError, HookInstaller};
use super::interface::{Git, GitError};
use crate::core::types::BranchName;

/// Name of the remote every working copy publishes to.
pub const ORIGIN: &str = "origin";

/// Errors from store and working-copy management.
#[derive(Debug, Error)]
pub enum LocalCopyError {
    #[error(transparent)]
    Git(#[from] GitError),

    #[error(transparent)]
    Hooks(#[from] HookError),

    #[error("store does not exist: {path}")]
    MissingStore { path: PathBuf },

    #[error("{path} exists but is a bare repository")]
    UnexpectedBare { path: PathBuf },
}

/// Create the bare store at `store_path` unless something is already there.
///
/// A newly created store gets its hooks from `hooks`. Returns `true` if
/// the store was created by this call.
pub fn ensure_store_initialized(
    store_path: &Path,
    branch: &BranchName,
    hooks: &dyn HookInstaller,
) -> Result<bool, LocalCopyError> {
    if store_path.is_dir() {
        return Ok(false);
    }

    Git::init_bare(store_path, branch)?;
    hooks.install(store_path)?;
    debug!(store = %store_path.display(), "created bare store");
    Ok(true)
}

/// Reset the working copy at `local_path` to exactly `origin/<branch>`.
///
/// Tracked modifications and staged changes are discarded and untracked
/// files removed. A missing working copy is left alone; one whose branch
/// was never fetched (empty store) has its index cleared instead of reset.
pub fn discard_local_changes(local_path: &Path, branch: &BranchName) -> Result<(), LocalCopyError> {
    if !local_path.exists() {
        return Ok(());
    }

    let git = open_working(local_path)?;
    match git.try_resolve_ref(&branch.remote_tracking(ORIGIN))? {
        Some(tip) => git.reset_hard(&tip)?,
        None => git.clear_index()?,
    }
    let removed = git.remove_untracked()?;
    debug!(local = %local_path.display(), removed, "discarded local changes");
    Ok(())
}

/// Bring the working copy at `local_path` up to date with `store_path`.
///
/// Clones on first use. Afterwards fetches and hard-resets the local
/// branch to `origin/<branch>`. While the store has no commits the working
/// directory stays empty with HEAD on the unborn `branch`.
pub fn sync_local(
    store_path: &Path,
    local_path: &Path,
    branch: &BranchName,
) -> Result<(), LocalCopyError> {
    if !local_path.exists() {
        return clone_local(store_path, local_path, branch);
    }

    let git = open_working(local_path)?;
    git.fetch(ORIGIN)?;
    let Some(tip) = git.try_resolve_ref(&branch.remote_tracking(ORIGIN))? else {
        debug!(local = %local_path.display(), %branch, "store has no commits yet");
        return Ok(());
    };

    if git.has_branch(branch)? {
        git.reset_hard(&tip)?;
    } else {
        git.checkout_branch_at(branch, &tip)?;
    }
    debug!(local = %local_path.display(), tip = tip.short(7), "synced working copy");
    Ok(())
}

fn clone_local(
    store_path: &Path,
    local_path: &Path,
    branch: &BranchName,
) -> Result<(), LocalCopyError> {
    if !store_path.is_dir() {
        return Err(LocalCopyError::MissingStore {
            path: store_path.to_path_buf(),
        });
    }

    let git = Git::init_working(local_path, branch)?;
    git.set_remote(ORIGIN, store_path)?;
    git.fetch(ORIGIN)?;
    if let Some(tip) = git.try_resolve_ref(&branch.remote_tracking(ORIGIN))? {
        git.checkout_branch_at(branch, &tip)?;
    }
    debug!(store = %store_path.display(), local = %local_path.display(), "cloned working copy");
    Ok(())
}

fn open_working(local_path: &Path) -> Result<Git, LocalCopyError> {
    let git = Git::open(local_path)?;
    if git.is_bare() {
        return Err(LocalCopyError::UnexpectedBare {
            path: local_path.to_path_buf(),
        });
    }
    Ok(git)
}
