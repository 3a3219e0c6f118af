//! core::paths
//!
//! Centralized path routing for wiki storage locations.
//!
//! # Storage Layout
//!
//! - `<repository_root>/<owner>/` - Owner root, one per user or organization
//! - `<repository_root>/<owner>/<repo>.wiki.git` - Bare wiki store
//! - `<app_data_root>/tmp/local-wiki/<repo_id>` - Disposable working copy
//!
//! Owner and repository names are lowercased.
//!
//! **Hard rule:** no code outside this module joins `.wiki.git` or
//! `local-wiki` onto a path.
//!
//! # Example
//!
//! ```
//! use wikistore::core::paths::WikiPaths;
//! use wikistore::core::types::RepoId;
//! use std::path::PathBuf;
//!
//! let paths = WikiPaths::new("/data/repositories", "/data/app");
//!
//! assert_eq!(
//!     paths.wiki_path("Alice", "Notes"),
//!     PathBuf::from("/data/repositories/alice/notes.wiki.git")
//! );
//! assert_eq!(
//!     paths.local_wiki_path(RepoId::new(12)),
//!     PathBuf::from("/data/app/tmp/local-wiki/12")
//! );
//! ```

use std::path::{Path, PathBuf};

use crate::core::types::RepoId;

/// Suffix of every bare wiki store directory.
pub const WIKI_STORE_SUFFIX: &str = ".wiki.git";

/// Path routing for wiki stores and their working copies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WikiPaths {
    /// Root under which owner directories and bare repositories live.
    pub repository_root: PathBuf,

    /// Application data root; scratch working copies live below it.
    pub app_data_root: PathBuf,
}

impl WikiPaths {
    pub fn new(repository_root: impl Into<PathBuf>, app_data_root: impl Into<PathBuf>) -> Self {
        Self {
            repository_root: repository_root.into(),
            app_data_root: app_data_root.into(),
        }
    }

    /// The directory holding all repositories of `owner`.
    pub fn owner_root(&self, owner: &str) -> PathBuf {
        self.repository_root.join(owner.to_lowercase())
    }

    /// The bare wiki store of `owner/repo`.
    pub fn wiki_path(&self, owner: &str, repo: &str) -> PathBuf {
        self.owner_root(owner)
            .join(format!("{}{}", repo.to_lowercase(), WIKI_STORE_SUFFIX))
    }

    /// Parent of every local wiki working copy.
    pub fn local_wiki_root(&self) -> PathBuf {
        self.app_data_root.join("tmp").join("local-wiki")
    }

    /// The working copy for the repository with the given id.
    pub fn local_wiki_path(&self, id: RepoId) -> PathBuf {
        self.local_wiki_root().join(id.to_string())
    }

    pub fn repository_root(&self) -> &Path {
        &self.repository_root
    }

    pub fn app_data_root(&self) -> &Path {
        &self.app_data_root
    }
}
