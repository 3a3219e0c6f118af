//! wiki::pipeline
//!
//! The Add/Edit/Delete mutation pipeline.
//!
//! # Lifecycle
//!
//! Every mutation runs these steps in order while holding the repository's
//! slot in the service pool:
//!
//! 1. Ensure the bare store exists (Add and Edit only)
//! 2. Discard leftovers in the working copy
//! 3. Sync the working copy with the store
//! 4. Mutate the page file
//! 5. Stage everything
//! 6. Commit as the acting identity
//! 7. Push to the store
//!
//! The first failing step aborts the rest. Nothing reaches the store unless
//! all steps succeed; the working copy may keep partial edits, which the
//! next mutation discards in step 2.
//!
//! # Invariants
//!
//! - At most one mutation per repository id is past step 0 at any time
//! - Page files are written by unlink-then-create, never through an
//!   existing symlink
//! - Add and Edit that leave the tree unchanged fail in the commit step
//! - Delete of an absent page makes no commit and no push

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use tracing::{debug, info, instrument, warn};

use super::error::{Phase, WikiError};
use super::identity::ActingIdentity;
use super::page::{page_path, probe_dir, WikiPage};
use super::Wiki;
use crate::core::naming::to_page_name;
use crate::core::types::Oid;
use crate::git::local_copy::ORIGIN;
use crate::git::{discard_local_changes, sync_local, Git, GitError};

/// Result of a successful mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WikiOutcome {
    /// A commit was pushed to the store.
    Committed { oid: Oid },
    /// Delete found no page; nothing was published.
    Unchanged,
}

impl WikiOutcome {
    pub fn oid(&self) -> Option<&Oid> {
        match self {
            WikiOutcome::Committed { oid } => Some(oid),
            WikiOutcome::Unchanged => None,
        }
    }
}

/// File-level change applied in step 4.
#[derive(Debug, Clone, Copy)]
enum PageChange<'a> {
    Create {
        title: &'a str,
        content: &'a str,
    },
    Update {
        old_title: &'a str,
        title: &'a str,
        content: &'a str,
    },
    Remove {
        title: &'a str,
    },
}

impl PageChange<'_> {
    fn initializes_store(&self) -> bool {
        !matches!(self, PageChange::Remove { .. })
    }

    /// Removing an absent page is a no-op; writing a page must change the tree.
    fn allows_no_op(&self) -> bool {
        matches!(self, PageChange::Remove { .. })
    }
}

/// Pipeline progress, for tracing.
#[derive(Debug, Clone, Copy)]
enum Step {
    LockAcquired,
    StoreEnsured,
    LocalSynced,
    FileMutated,
    Staged,
    Committed,
    Published,
}

impl Wiki<'_> {
    /// Create a page. Fails with [`WikiError::PageAlreadyExists`] if a page
    /// with the same sanitized name is already present.
    ///
    /// An empty `message` commits with `Update page '<name>'`.
    #[instrument(skip_all, fields(repo = %self.repo().id, title = %title))]
    pub fn add_page(
        &self,
        doer: &dyn ActingIdentity,
        title: &str,
        content: &str,
        message: &str,
    ) -> Result<WikiOutcome, WikiError> {
        self.mutate(doer, PageChange::Create { title, content }, message)
    }

    /// Overwrite a page, renaming it when `new_title` sanitizes to a
    /// different name than `old_title`.
    ///
    /// Renaming onto another existing page fails with
    /// [`WikiError::PageAlreadyExists`].
    #[instrument(skip_all, fields(repo = %self.repo().id, old_title = %old_title, title = %new_title))]
    pub fn edit_page(
        &self,
        doer: &dyn ActingIdentity,
        old_title: &str,
        new_title: &str,
        content: &str,
        message: &str,
    ) -> Result<WikiOutcome, WikiError> {
        let change = PageChange::Update {
            old_title,
            title: new_title,
            content,
        };
        self.mutate(doer, change, message)
    }

    /// Remove a page. Removing a page that does not exist succeeds with
    /// [`WikiOutcome::Unchanged`]. Never creates the store.
    #[instrument(skip_all, fields(repo = %self.repo().id, title = %title))]
    pub fn delete_page(
        &self,
        doer: &dyn ActingIdentity,
        title: &str,
    ) -> Result<WikiOutcome, WikiError> {
        self.mutate(doer, PageChange::Remove { title }, "")
    }

    fn mutate(
        &self,
        doer: &dyn ActingIdentity,
        change: PageChange<'_>,
        message: &str,
    ) -> Result<WikiOutcome, WikiError> {
        let result = self.mutate_locked(doer, change, message);
        match &result {
            Ok(WikiOutcome::Committed { oid }) => info!(oid = oid.short(7), "published wiki change"),
            Ok(WikiOutcome::Unchanged) => info!("wiki unchanged, nothing published"),
            Err(err) => warn!(error = %err, phase = ?err.phase(), "wiki mutation failed"),
        }
        result
    }

    fn mutate_locked(
        &self,
        doer: &dyn ActingIdentity,
        change: PageChange<'_>,
        message: &str,
    ) -> Result<WikiOutcome, WikiError> {
        let repo_id = self.repo().id;
        let _slot = self.service.pool.acquire(repo_id);
        trace_step(Step::LockAcquired);

        if change.initializes_store() {
            self.init_wiki()?;
            trace_step(Step::StoreEnsured);
        }

        let store = self.wiki_path();
        let local = self.local_wiki_path();
        let branch = self.service.branch();

        discard_local_changes(&local, branch).map_err(|source| WikiError::Sync {
            phase: Phase::DiscardLocal,
            source,
        })?;
        sync_local(&store, &local, branch).map_err(|source| WikiError::Sync {
            phase: Phase::SyncLocal,
            source,
        })?;
        trace_step(Step::LocalSynced);

        let default_message = apply_change(&local, change)?;
        trace_step(Step::FileMutated);

        let message = if message.is_empty() {
            default_message
        } else {
            message.to_string()
        };

        let git = Git::open(&local).map_err(commit_error(Phase::Stage))?;
        git.stage_all().map_err(commit_error(Phase::Stage))?;
        trace_step(Step::Staged);

        let committed = git
            .commit_staged(&doer.display_name(), doer.email(), &message)
            .map_err(commit_error(Phase::Commit))?;
        let Some(oid) = committed else {
            if !change.allows_no_op() {
                return Err(WikiError::Commit {
                    phase: Phase::Commit,
                    source: GitError::NothingToCommit,
                });
            }
            return Ok(WikiOutcome::Unchanged);
        };
        trace_step(Step::Committed);

        git.push(ORIGIN, branch).map_err(|source| WikiError::Publish {
            phase: Phase::Publish,
            source,
        })?;
        trace_step(Step::Published);

        Ok(WikiOutcome::Committed { oid })
    }
}

fn commit_error(phase: Phase) -> impl Fn(GitError) -> WikiError {
    move |source| WikiError::Commit { phase, source }
}

fn trace_step(step: Step) {
    debug!(?step, "wiki pipeline");
}

/// Sanitize `title`, rejecting titles with nothing left.
fn sanitized(title: &str) -> Result<String, WikiError> {
    let name = to_page_name(title);
    if name.is_empty() {
        return Err(WikiError::InvalidTitle {
            raw: title.to_string(),
        });
    }
    Ok(name)
}

/// Apply `change` to the working directory `root`.
///
/// Returns the default commit message for the change.
fn apply_change(root: &Path, change: PageChange<'_>) -> Result<String, WikiError> {
    match change {
        PageChange::Create { title, content } => {
            let name = sanitized(title)?;
            let lookup = probe_dir(root, &name);
            if lookup.exists() {
                return Err(WikiError::PageAlreadyExists { title: name });
            }
            replace_file(&page_path(root, lookup.page()), content.as_bytes())?;
            Ok(format!("Update page '{name}'"))
        }
        PageChange::Update {
            old_title,
            title,
            content,
        } => {
            let name = sanitized(title)?;
            let old_name = to_page_name(old_title);
            if !old_name.is_empty() && old_name != name {
                if probe_dir(root, &name).exists() {
                    return Err(WikiError::PageAlreadyExists { title: name });
                }
                let old_path = page_path(root, &WikiPage::new(old_name));
                remove_if_present(&old_path, Phase::RemoveOldPage)?;
            }
            replace_file(&page_path(root, &WikiPage::new(name.as_str())), content.as_bytes())?;
            Ok(format!("Update page '{name}'"))
        }
        PageChange::Remove { title } => {
            let name = sanitized(title)?;
            remove_if_present(&page_path(root, &WikiPage::new(name.as_str())), Phase::RemovePage)?;
            Ok(format!("Delete page '{name}'"))
        }
    }
}

/// Remove whatever filesystem object sits at `path`. Symlinks are unlinked,
/// not followed; real directories are removed with their contents. A
/// missing entry is not an error.
fn remove_if_present(path: &Path, phase: Phase) -> Result<(), WikiError> {
    let removed = match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(path),
        Ok(_) => fs::remove_file(path),
        Err(err) => Err(err),
    };
    match removed {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(WikiError::FileIo {
            phase,
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Write `content` to a freshly created regular file at `path`.
fn replace_file(path: &Path, content: &[u8]) -> Result<(), WikiError> {
    remove_if_present(path, Phase::WritePage)?;
    let io_err = |source: std::io::Error| WikiError::FileIo {
        phase: Phase::WritePage,
        path: path.to_path_buf(),
        source,
    };
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(io_err)?;
    file.write_all(content).map_err(io_err)?;
    Ok(())
}
