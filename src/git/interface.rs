//! git::interface
//!
//! Git interface implementation using git2.
//!
//! This module provides the **single doorway** to all Git operations in
//! wikistore. All repository reads and writes flow through [`Git`], which
//! returns strong types and normalizes `git2` failures into typed
//! categories.
//!
//! # Error Handling
//!
//! - [`GitError::NotARepo`]: Path does not hold a repository
//! - [`GitError::RefNotFound`]: Requested ref does not exist
//! - [`GitError::PushRejected`]: The remote refused a ref update
//! - [`GitError::AccessError`]: Filesystem or lock problem
//! - [`GitError::Internal`]: Anything else reported by libgit2
//!
//! # Example
//!
//! ```no_run
//! use wikistore::git::Git;
//! use std::path::Path;
//!
//! let git = Git::open(Path::new("/srv/data/tmp/local-wiki/1"))?;
//! git.stage_all()?;
//! if let Some(oid) = git.commit_staged("Alice", "alice@example.com", "Update page 'Home'")? {
//!     println!("committed {}", oid.short(7));
//! }
//! # Ok::<(), wikistore::git::GitError>(())
//! ```

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::types::{BranchName, Oid, TypeError};

/// Errors from Git operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// Path does not hold a Git repository.
    #[error("not a git repository: {path}")]
    NotARepo {
        /// The path that was opened
        path: PathBuf,
    },

    /// Requested ref does not exist.
    #[error("ref not found: {refname}")]
    RefNotFound {
        /// The ref that was not found
        refname: String,
    },

    /// Object not found in repository.
    #[error("object not found: {oid}")]
    ObjectNotFound {
        /// The OID that was not found
        oid: String,
    },

    /// Invalid object id format.
    #[error("invalid object id: {oid}")]
    InvalidOid {
        /// The invalid OID string
        oid: String,
    },

    /// The remote refused to update a ref.
    #[error("push rejected for {refname}: {reason}")]
    PushRejected {
        /// The ref that was pushed
        refname: String,
        /// Message reported by the remote
        reason: String,
    },

    /// The index matches HEAD, so a commit would record no change.
    #[error("nothing to commit")]
    NothingToCommit,

    /// Permission or filesystem error.
    #[error("repository access error: {message}")]
    AccessError {
        /// Description of the error
        message: String,
    },

    /// Internal git2 error.
    #[error("git error: {message}")]
    Internal {
        /// The error message
        message: String,
    },
}

impl GitError {
    /// Create a GitError from a git2::Error with richer context.
    fn from_git2(err: git2::Error, context: &str) -> Self {
        match err.code() {
            git2::ErrorCode::NotFound => {
                if context.starts_with("refs/") || context.contains("ref") {
                    GitError::RefNotFound {
                        refname: context.to_string(),
                    }
                } else {
                    GitError::ObjectNotFound {
                        oid: context.to_string(),
                    }
                }
            }
            git2::ErrorCode::InvalidSpec => GitError::InvalidOid {
                oid: context.to_string(),
            },
            git2::ErrorCode::Locked => GitError::AccessError {
                message: format!("repository is locked: {}", err.message()),
            },
            _ => GitError::Internal {
                message: format!("{}: {}", context, err.message()),
            },
        }
    }

    fn io(context: &str, err: std::io::Error) -> Self {
        GitError::AccessError {
            message: format!("{}: {}", context, err),
        }
    }
}

impl From<git2::Error> for GitError {
    fn from(err: git2::Error) -> Self {
        match err.code() {
            git2::ErrorCode::NotFound => GitError::RefNotFound {
                refname: err.message().to_string(),
            },
            git2::ErrorCode::InvalidSpec => GitError::InvalidOid {
                oid: err.message().to_string(),
            },
            _ => GitError::Internal {
                message: err.message().to_string(),
            },
        }
    }
}

impl From<TypeError> for GitError {
    fn from(err: TypeError) -> Self {
        match err {
            TypeError::InvalidOid(msg) => GitError::InvalidOid { oid: msg },
            TypeError::InvalidBranchName(msg) => GitError::Internal { message: msg },
        }
    }
}

/// Summary of working tree status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorktreeStatus {
    /// Number of staged changes
    pub staged: usize,
    /// Number of unstaged changes to tracked files
    pub unstaged: usize,
    /// Number of untracked files
    pub untracked: usize,
}

impl WorktreeStatus {
    /// No staged, unstaged, or untracked changes at all.
    pub fn is_pristine(&self) -> bool {
        self.staged == 0 && self.unstaged == 0 && self.untracked == 0
    }
}

/// Information about a commit.
#[derive(Debug, Clone)]
pub struct CommitInfo {
    /// The commit OID
    pub oid: Oid,
    /// First line of the commit message
    pub summary: String,
    /// Full commit message
    pub message: String,
    /// Author name
    pub author_name: String,
    /// Author email
    pub author_email: String,
    /// Committer name
    pub committer_name: String,
    /// Committer email
    pub committer_email: String,
    /// Author timestamp
    pub author_time: chrono::DateTime<chrono::Utc>,
    /// Number of parents (0 for the root commit)
    pub parent_count: usize,
}

/// The Git interface.
///
/// This is the **single point of interaction** with Git. No other module
/// imports `git2`.
pub struct Git {
    repo: git2::Repository,
}

impl std::fmt::Debug for Git {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Git")
            .field("path", &self.repo.path())
            .field("bare", &self.repo.is_bare())
            .finish()
    }
}

impl Git {
    // =========================================================================
    // Repository Creation and Opening
    // =========================================================================

    /// Open the repository at exactly `path` (no upward discovery).
    ///
    /// # Errors
    ///
    /// Returns [`GitError::NotARepo`] if `path` does not hold a repository.
    pub fn open(path: &Path) -> Result<Self, GitError> {
        let repo = git2::Repository::open(path).map_err(|e| {
            if e.code() == git2::ErrorCode::NotFound {
                GitError::NotARepo {
                    path: path.to_path_buf(),
                }
            } else {
                GitError::from_git2(e, &path.display().to_string())
            }
        })?;
        Ok(Self { repo })
    }

    /// Create a bare repository whose HEAD points at `initial_branch`.
    ///
    /// Missing parent directories are created.
    pub fn init_bare(path: &Path, initial_branch: &BranchName) -> Result<Self, GitError> {
        Self::init_with(path, initial_branch, true)
    }

    /// Create a non-bare repository whose HEAD points at `initial_branch`.
    pub fn init_working(path: &Path, initial_branch: &BranchName) -> Result<Self, GitError> {
        Self::init_with(path, initial_branch, false)
    }

    fn init_with(path: &Path, initial_branch: &BranchName, bare: bool) -> Result<Self, GitError> {
        let mut opts = git2::RepositoryInitOptions::new();
        opts.bare(bare)
            .mkpath(true)
            .no_reinit(true)
            .initial_head(initial_branch.as_str());
        let repo = git2::Repository::init_opts(path, &opts)
            .map_err(|e| GitError::from_git2(e, &path.display().to_string()))?;
        Ok(Self { repo })
    }

    /// Whether this repository has no working directory.
    pub fn is_bare(&self) -> bool {
        self.repo.is_bare()
    }

    /// Path to the working directory, if any.
    pub fn work_dir(&self) -> Option<&Path> {
        self.repo.workdir()
    }

    fn require_work_dir(&self) -> Result<&Path, GitError> {
        self.work_dir().ok_or_else(|| GitError::AccessError {
            message: format!("{} has no working directory", self.repo.path().display()),
        })
    }

    // =========================================================================
    // Ref Queries
    // =========================================================================

    /// Resolve a ref to the commit it points at, or `None` if it does not exist.
    pub fn try_resolve_ref(&self, refname: &str) -> Result<Option<Oid>, GitError> {
        match self.repo.refname_to_id(refname) {
            Ok(oid) => Ok(Some(Oid::new(oid.to_string())?)),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(GitError::from_git2(e, refname)),
        }
    }

    /// Whether `refs/heads/<branch>` exists.
    pub fn has_branch(&self, branch: &BranchName) -> Result<bool, GitError> {
        Ok(self.try_resolve_ref(&branch.local_ref())?.is_some())
    }

    /// Commit HEAD points at, or `None` while HEAD is unborn.
    pub fn head_oid(&self) -> Result<Option<Oid>, GitError> {
        match self.repo.head() {
            Ok(head) => {
                let commit = head
                    .peel_to_commit()
                    .map_err(|e| GitError::from_git2(e, "HEAD"))?;
                Ok(Some(Oid::new(commit.id().to_string())?))
            }
            Err(e)
                if e.code() == git2::ErrorCode::UnbornBranch
                    || e.code() == git2::ErrorCode::NotFound =>
            {
                Ok(None)
            }
            Err(e) => Err(GitError::from_git2(e, "HEAD")),
        }
    }

    fn find_commit(&self, oid: &Oid) -> Result<git2::Commit<'_>, GitError> {
        let git_oid =
            git2::Oid::from_str(oid.as_str()).map_err(|e| GitError::from_git2(e, oid.as_str()))?;
        self.repo
            .find_commit(git_oid)
            .map_err(|e| GitError::from_git2(e, oid.as_str()))
    }

    // =========================================================================
    // Remotes
    // =========================================================================

    /// Point remote `name` at `url`, creating it if needed.
    pub fn set_remote(&self, name: &str, url: &Path) -> Result<(), GitError> {
        let url = url.to_str().ok_or_else(|| GitError::AccessError {
            message: format!("remote path is not valid UTF-8: {}", url.display()),
        })?;
        match self.repo.find_remote(name) {
            Ok(_) => self.repo.remote_set_url(name, url)?,
            Err(e) if e.code() == git2::ErrorCode::NotFound => {
                self.repo.remote(name, url)?;
            }
            Err(e) => return Err(GitError::from_git2(e, name)),
        }
        Ok(())
    }

    /// Fetch every branch of `remote` into `refs/remotes/<remote>/*`,
    /// pruning tracking refs whose branch disappeared.
    pub fn fetch(&self, remote: &str) -> Result<(), GitError> {
        let mut remote_handle = self
            .repo
            .find_remote(remote)
            .map_err(|e| GitError::from_git2(e, remote))?;
        let refspec = format!("+refs/heads/*:refs/remotes/{}/*", remote);
        let mut opts = git2::FetchOptions::new();
        opts.prune(git2::FetchPrune::On);
        remote_handle
            .fetch(&[refspec.as_str()], Some(&mut opts), None)
            .map_err(|e| GitError::from_git2(e, &format!("fetch {}", remote)))
    }

    /// Push `refs/heads/<branch>` to the same ref on `remote`.
    ///
    /// Non-fast-forward updates are not forced.
    ///
    /// # Errors
    ///
    /// Returns [`GitError::PushRejected`] if the remote refused the update.
    pub fn push(&self, remote: &str, branch: &BranchName) -> Result<(), GitError> {
        let mut remote_handle = self
            .repo
            .find_remote(remote)
            .map_err(|e| GitError::from_git2(e, remote))?;
        let refname = branch.local_ref();
        let refspec = format!("{0}:{0}", refname);

        let mut rejection: Option<String> = None;
        {
            let mut callbacks = git2::RemoteCallbacks::new();
            callbacks.push_update_reference(|_refname, status| {
                if let Some(reason) = status {
                    rejection = Some(reason.to_string());
                }
                Ok(())
            });
            let mut opts = git2::PushOptions::new();
            opts.remote_callbacks(callbacks);
            remote_handle
                .push(&[refspec.as_str()], Some(&mut opts))
                .map_err(|e| GitError::from_git2(e, &format!("push {}", refname)))?;
        }

        match rejection {
            Some(reason) => Err(GitError::PushRejected { refname, reason }),
            None => Ok(()),
        }
    }

    // =========================================================================
    // Working Tree Operations
    // =========================================================================

    /// Move the current branch, index, and working tree to `oid`,
    /// discarding modifications to tracked files.
    pub fn reset_hard(&self, oid: &Oid) -> Result<(), GitError> {
        let commit = self.find_commit(oid)?;
        let mut checkout = git2::build::CheckoutBuilder::new();
        checkout.force();
        self.repo
            .reset(commit.as_object(), git2::ResetType::Hard, Some(&mut checkout))
            .map_err(|e| GitError::from_git2(e, oid.as_str()))
    }

    /// Empty the index (used while HEAD is unborn and there is nothing to reset to).
    pub fn clear_index(&self) -> Result<(), GitError> {
        let mut index = self.repo.index()?;
        index.clear()?;
        index.write()?;
        Ok(())
    }

    /// Delete every untracked file in the working tree.
    ///
    /// Ignored files are left alone. Returns the number of paths removed.
    pub fn remove_untracked(&self) -> Result<usize, GitError> {
        let work_dir = self.require_work_dir()?.to_path_buf();

        let mut opts = git2::StatusOptions::new();
        opts.include_untracked(true)
            .recurse_untracked_dirs(true)
            .include_ignored(false);
        let statuses = self.repo.statuses(Some(&mut opts))?;

        let mut removed = 0;
        for entry in statuses.iter() {
            if !entry.status().contains(git2::Status::WT_NEW) {
                continue;
            }
            let Some(relative) = entry.path() else {
                continue;
            };
            let path = work_dir.join(relative);
            let result = match std::fs::symlink_metadata(&path) {
                Ok(meta) if meta.is_dir() => std::fs::remove_dir_all(&path),
                Ok(_) => std::fs::remove_file(&path),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => Err(e),
            };
            result.map_err(|e| GitError::io(&format!("remove {}", path.display()), e))?;
            removed += 1;
        }
        Ok(removed)
    }

    /// Create or move `refs/heads/<branch>` to `oid` and check it out.
    pub fn checkout_branch_at(&self, branch: &BranchName, oid: &Oid) -> Result<(), GitError> {
        let commit = self.find_commit(oid)?;
        self.repo
            .branch(branch.as_str(), &commit, true)
            .map_err(|e| GitError::from_git2(e, &branch.local_ref()))?;
        self.repo
            .set_head(&branch.local_ref())
            .map_err(|e| GitError::from_git2(e, &branch.local_ref()))?;
        let mut checkout = git2::build::CheckoutBuilder::new();
        checkout.force();
        self.repo.checkout_head(Some(&mut checkout))?;
        Ok(())
    }

    /// Stage every change in the working tree: additions, modifications,
    /// and deletions.
    pub fn stage_all(&self) -> Result<(), GitError> {
        let mut index = self.repo.index()?;
        index.add_all(["*"].iter(), git2::IndexAddOption::DEFAULT, None)?;
        index.update_all(["*"].iter(), None)?;
        index.write()?;
        Ok(())
    }

    /// Commit the index on top of HEAD with `name <email>` as author and
    /// committer.
    ///
    /// Returns `None` without committing when the staged tree equals HEAD's
    /// tree (or is empty while HEAD is unborn).
    pub fn commit_staged(
        &self,
        name: &str,
        email: &str,
        message: &str,
    ) -> Result<Option<Oid>, GitError> {
        let mut index = self.repo.index()?;
        let tree_id = index.write_tree()?;
        let tree = self.repo.find_tree(tree_id)?;

        let parent = match self.head_oid()? {
            Some(oid) => Some(self.find_commit(&oid)?),
            None => None,
        };
        let unchanged = match &parent {
            Some(commit) => commit.tree_id() == tree_id,
            None => tree.is_empty(),
        };
        if unchanged {
            return Ok(None);
        }

        let signature = git2::Signature::now(name, email)
            .map_err(|e| GitError::from_git2(e, "signature"))?;
        let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();
        let oid = self
            .repo
            .commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)
            .map_err(|e| GitError::from_git2(e, "commit"))?;

        Ok(Some(Oid::new(oid.to_string())?))
    }

    /// Count staged, unstaged, and untracked changes.
    pub fn worktree_status(&self) -> Result<WorktreeStatus, GitError> {
        let mut opts = git2::StatusOptions::new();
        opts.include_untracked(true).recurse_untracked_dirs(true);
        let statuses = self.repo.statuses(Some(&mut opts))?;

        let staged_flags = git2::Status::INDEX_NEW
            | git2::Status::INDEX_MODIFIED
            | git2::Status::INDEX_DELETED
            | git2::Status::INDEX_RENAMED
            | git2::Status::INDEX_TYPECHANGE;
        let unstaged_flags = git2::Status::WT_MODIFIED
            | git2::Status::WT_DELETED
            | git2::Status::WT_RENAMED
            | git2::Status::WT_TYPECHANGE;

        let mut status = WorktreeStatus::default();
        for entry in statuses.iter() {
            let s = entry.status();
            if s.intersects(staged_flags) {
                status.staged += 1;
            }
            if s.intersects(unstaged_flags) {
                status.unstaged += 1;
            }
            if s.contains(git2::Status::WT_NEW) {
                status.untracked += 1;
            }
        }
        Ok(status)
    }

    // =========================================================================
    // Tree and Commit Reads
    // =========================================================================

    /// Names of the regular files at the top level of `refname`'s tree.
    ///
    /// Returns an empty list when the ref does not exist. Symlinks,
    /// submodules and directories are skipped.
    pub fn list_files(&self, refname: &str) -> Result<Vec<String>, GitError> {
        let Some(tree) = self.tree_at(refname)? else {
            return Ok(Vec::new());
        };
        let mut names: Vec<String> = tree
            .iter()
            .filter(|entry| is_regular_file_mode(entry.filemode()))
            .filter_map(|entry| entry.name().map(String::from))
            .collect();
        names.sort();
        Ok(names)
    }

    /// Contents of the top-level regular file `name` in `refname`'s tree.
    pub fn read_file(&self, refname: &str, name: &str) -> Result<Option<Vec<u8>>, GitError> {
        let Some(tree) = self.tree_at(refname)? else {
            return Ok(None);
        };
        let Some(entry) = tree.get_name(name) else {
            return Ok(None);
        };
        if !is_regular_file_mode(entry.filemode()) {
            return Ok(None);
        }
        let blob = self
            .repo
            .find_blob(entry.id())
            .map_err(|e| GitError::from_git2(e, &entry.id().to_string()))?;
        Ok(Some(blob.content().to_vec()))
    }

    fn tree_at(&self, refname: &str) -> Result<Option<git2::Tree<'_>>, GitError> {
        match self.try_resolve_ref(refname)? {
            Some(oid) => Ok(Some(self.find_commit(&oid)?.tree()?)),
            None => Ok(None),
        }
    }

    /// Get information about the commit `refname` points at.
    pub fn commit_info(&self, refname: &str) -> Result<Option<CommitInfo>, GitError> {
        let Some(oid) = self.try_resolve_ref(refname)? else {
            return Ok(None);
        };
        let commit = self.find_commit(&oid)?;

        let author = commit.author();
        let committer = commit.committer();
        let author_time = chrono::DateTime::from_timestamp(author.when().seconds(), 0)
            .unwrap_or_default();

        Ok(Some(CommitInfo {
            oid,
            summary: commit.summary().unwrap_or("").to_string(),
            message: commit.message().unwrap_or("").to_string(),
            author_name: author.name().unwrap_or("").to_string(),
            author_email: author.email().unwrap_or("").to_string(),
            committer_name: committer.name().unwrap_or("").to_string(),
            committer_email: committer.email().unwrap_or("").to_string(),
            author_time,
            parent_count: commit.parent_count(),
        }))
    }

    /// Number of commits reachable from `refname` (0 if it does not exist).
    pub fn commit_count(&self, refname: &str) -> Result<usize, GitError> {
        let Some(oid) = self.try_resolve_ref(refname)? else {
            return Ok(0);
        };
        let git_oid = git2::Oid::from_str(oid.as_str())?;
        let mut revwalk = self.repo.revwalk()?;
        revwalk.push(git_oid)?;
        Ok(revwalk.count())
    }
}

/// Regular (non-executable or executable) blob, not a link or submodule.
fn is_regular_file_mode(mode: i32) -> bool {
    mode == 0o100644 || mode == 0o100755
}
