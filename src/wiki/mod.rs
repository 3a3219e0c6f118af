//! wiki
//!
//! Per-repository wiki storage.
//!
//! # Architecture
//!
//! A [`WikiService`] owns the storage roots, the publish branch, the hook
//! installer, and the exclusive pool that serializes mutations per
//! repository id. [`WikiService::wiki`] hands out a [`Wiki`] handle for one
//! repository; the handle's mutation methods live in [`pipeline`].
//!
//! # Modules
//!
//! - [`pipeline`] - Add/Edit/Delete: lock, init, sync, mutate, stage,
//!   commit, publish
//! - [`page`] - Page query types scanned from a tree
//! - [`identity`] - Acting identity used for commit attribution
//! - [`error`] - Phase-tagged error taxonomy
//!
//! # Example
//!
//! ```no_run
//! use wikistore::core::paths::WikiPaths;
//! use wikistore::core::types::RepoId;
//! use wikistore::wiki::{User, WikiRepo, WikiService};
//!
//! let service = WikiService::new(WikiPaths::new("/srv/repos", "/srv/data"));
//! let repo = WikiRepo::new(RepoId::new(1), "alice", "notes");
//! let doer = User::new("alice", "alice@example.com");
//!
//! service.wiki(&repo).add_page(&doer, "Getting Started", "# Hello", "")?;
//! # Ok::<(), wikistore::wiki::WikiError>(())
//! ```

pub mod error;
pub mod identity;
pub mod page;
pub mod pipeline;

pub use error::{Phase, WikiError};
pub use identity::{ActingIdentity, User};
pub use page::{PageLookup, WikiPage};
pub use pipeline::WikiOutcome;

use std::path::PathBuf;

use crate::core::config::{Config, ConfigError};
use crate::core::naming::{page_file_name, to_page_name};
use crate::core::ops::pool::ExclusivePool;
use crate::core::paths::WikiPaths;
use crate::core::types::{BranchName, RepoId};
use crate::git::{
    ensure_store_initialized, CommitInfo, DelegateHooks, Git, GitError, HookInstaller, NoHooks,
};

/// The hosted repository a wiki belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WikiRepo {
    pub id: RepoId,
    pub owner: String,
    pub name: String,
}

impl WikiRepo {
    pub fn new(id: RepoId, owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id,
            owner: owner.into(),
            name: name.into(),
        }
    }
}

/// Shared wiki storage state. `Send + Sync`; share it across handler threads.
pub struct WikiService {
    paths: WikiPaths,
    branch: BranchName,
    hooks: Box<dyn HookInstaller>,
    pool: ExclusivePool<RepoId>,
}

impl std::fmt::Debug for WikiService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WikiService")
            .field("paths", &self.paths)
            .field("branch", &self.branch)
            .field("active_locks", &self.pool.active_keys())
            .finish()
    }
}

impl WikiService {
    /// A service publishing to `master` without hook delegation.
    pub fn new(paths: WikiPaths) -> Self {
        Self {
            paths,
            branch: BranchName::master(),
            hooks: Box::new(NoHooks),
            pool: ExclusivePool::new(),
        }
    }

    /// Build a service from loaded configuration.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let mut service = Self::new(config.paths()?).with_branch(config.branch());
        if let Some(app_path) = config.hook_app_path() {
            let mut hooks = DelegateHooks::new(app_path);
            if let Some(config_path) = config.hook_config_path() {
                hooks = hooks.with_config(config_path);
            }
            service = service.with_hooks(hooks);
        }
        Ok(service)
    }

    pub fn with_hooks(mut self, hooks: impl HookInstaller + 'static) -> Self {
        self.hooks = Box::new(hooks);
        self
    }

    pub fn with_branch(mut self, branch: BranchName) -> Self {
        self.branch = branch;
        self
    }

    pub fn paths(&self) -> &WikiPaths {
        &self.paths
    }

    pub fn branch(&self) -> &BranchName {
        &self.branch
    }

    /// Handle for the wiki of `repo`.
    pub fn wiki<'a>(&'a self, repo: &'a WikiRepo) -> Wiki<'a> {
        Wiki {
            service: self,
            repo,
        }
    }
}

/// The wiki of one repository.
#[derive(Debug, Clone, Copy)]
pub struct Wiki<'a> {
    service: &'a WikiService,
    repo: &'a WikiRepo,
}

impl<'a> Wiki<'a> {
    pub fn repo(&self) -> &'a WikiRepo {
        self.repo
    }

    /// Path of the bare store.
    pub fn wiki_path(&self) -> PathBuf {
        self.service.paths.wiki_path(&self.repo.owner, &self.repo.name)
    }

    /// Path of the disposable working copy.
    pub fn local_wiki_path(&self) -> PathBuf {
        self.service.paths.local_wiki_path(self.repo.id)
    }

    /// Whether the bare store exists.
    pub fn has_wiki(&self) -> bool {
        self.wiki_path().is_dir()
    }

    /// Create the bare store (and its hooks) if it does not exist yet.
    ///
    /// Returns `true` if this call created it.
    pub fn init_wiki(&self) -> Result<bool, WikiError> {
        ensure_store_initialized(&self.wiki_path(), &self.service.branch, &*self.service.hooks)
            .map_err(|source| WikiError::Initialization {
                phase: Phase::InitStore,
                source,
            })
    }

    // =========================================================================
    // Read-side queries against the store's publish branch (no locking)
    // =========================================================================

    fn open_store(&self) -> Result<Option<Git>, GitError> {
        if !self.has_wiki() {
            return Ok(None);
        }
        Git::open(&self.wiki_path()).map(Some)
    }

    /// All published pages, sorted by name.
    pub fn pages(&self) -> Result<Vec<WikiPage>, GitError> {
        let Some(git) = self.open_store()? else {
            return Ok(Vec::new());
        };
        let names = git.list_files(&self.service.branch.local_ref())?;
        Ok(page::pages_from_file_names(names))
    }

    /// Look up the published page for a title or URL token.
    pub fn lookup_page(&self, title: &str) -> Result<PageLookup, GitError> {
        let page = WikiPage::new(to_page_name(title));
        let found = self
            .pages()?
            .into_iter()
            .any(|candidate| candidate == page);
        Ok(if found {
            PageLookup::Found(page)
        } else {
            PageLookup::Missing(page)
        })
    }

    /// Published content of a page, if it exists.
    ///
    /// Invalid UTF-8 is replaced rather than rejected.
    pub fn page_content(&self, title: &str) -> Result<Option<String>, GitError> {
        let Some(git) = self.open_store()? else {
            return Ok(None);
        };
        let file_name = page_file_name(&to_page_name(title));
        let bytes = git.read_file(&self.service.branch.local_ref(), &file_name)?;
        Ok(bytes.map(|b| String::from_utf8_lossy(&b).into_owned()))
    }

    /// The commit at the tip of the publish branch.
    pub fn last_commit(&self) -> Result<Option<CommitInfo>, GitError> {
        match self.open_store()? {
            Some(git) => git.commit_info(&self.service.branch.local_ref()),
            None => Ok(None),
        }
    }

    /// Number of commits on the publish branch.
    pub fn commit_count(&self) -> Result<usize, GitError> {
        match self.open_store()? {
            Some(git) => git.commit_count(&self.service.branch.local_ref()),
            None => Ok(0),
        }
    }
}
