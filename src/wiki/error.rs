//! wiki::error
//!
//! Error taxonomy of the mutation pipeline.
//!
//! Every variant except [`WikiError::PageAlreadyExists`] and
//! [`WikiError::InvalidTitle`] carries the [`Phase`] that failed and the
//! underlying cause as its `source`.

use std::path::PathBuf;

use thiserror::Error;

use crate::git::{GitError, LocalCopyError};

/// Pipeline step an error is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    InitStore,
    DiscardLocal,
    SyncLocal,
    RemoveOldPage,
    RemovePage,
    WritePage,
    Stage,
    Commit,
    Publish,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::InitStore => "init wiki",
            Phase::DiscardLocal => "discard local wiki changes",
            Phase::SyncLocal => "update local wiki",
            Phase::RemoveOldPage => "remove old page",
            Phase::RemovePage => "remove page",
            Phase::WritePage => "write page",
            Phase::Stage => "add all changes",
            Phase::Commit => "commit changes",
            Phase::Publish => "push",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors from wiki mutations.
#[derive(Debug, Error)]
pub enum WikiError {
    /// Store creation or hook installation failed.
    #[error("{phase}: {source}")]
    Initialization {
        phase: Phase,
        source: LocalCopyError,
    },

    /// Discarding or refreshing the local working copy failed.
    #[error("{phase}: {source}")]
    Sync {
        phase: Phase,
        source: LocalCopyError,
    },

    /// A create targeted a title whose page file already exists.
    #[error("wiki page already exists: {title}")]
    PageAlreadyExists { title: String },

    /// The title sanitized to an empty page name.
    #[error("invalid wiki page title: {raw:?}")]
    InvalidTitle { raw: String },

    /// Writing or removing a page file failed.
    #[error("{phase} '{path}': {source}")]
    FileIo {
        phase: Phase,
        path: PathBuf,
        source: std::io::Error,
    },

    /// Staging or committing failed.
    #[error("{phase}: {source}")]
    Commit { phase: Phase, source: GitError },

    /// Publishing to the store failed or was rejected.
    #[error("{phase}: {source}")]
    Publish { phase: Phase, source: GitError },
}

impl WikiError {
    /// Whether this maps to a "title already taken" response.
    pub fn is_page_already_exists(&self) -> bool {
        matches!(self, WikiError::PageAlreadyExists { .. })
    }

    /// The failed phase, if the error came from a pipeline step.
    pub fn phase(&self) -> Option<Phase> {
        match self {
            WikiError::Initialization { phase, .. }
            | WikiError::Sync { phase, .. }
            | WikiError::FileIo { phase, .. }
            | WikiError::Commit { phase, .. }
            | WikiError::Publish { phase, .. } => Some(*phase),
            WikiError::PageAlreadyExists { .. } | WikiError::InvalidTitle { .. } => None,
        }
    }
}
