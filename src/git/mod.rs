//! git
//!
//! Single interface for all Git operations.
//!
//! # Architecture
//!
//! This module is the **ONLY doorway** to Git. No other module imports
//! `git2`, and nothing shells out to the git CLI. Stores and working copies
//! talk to each other over libgit2's local filesystem transport.
//!
//! - `interface` - The [`Git`] handle: init, open, fetch, push, stage,
//!   commit, reset, tree reads
//! - [`local_copy`] - Store initialization plus the generic discard/sync
//!   primitives for disposable working copies
//! - [`hooks`] - Server-side hook delegation for new stores
//!
//! # Invariants
//!
//! - Every operation blocks until libgit2 returns; none has a timeout
//! - All operations return strong types (Oid, BranchName)

pub mod hooks;
mod interface;
pub mod local_copy;

pub use hooks::{DelegateHooks, HookError, HookInstaller, NoHooks};
pub use interface::{CommitInfo, Git, GitError, WorktreeStatus};
pub use local_copy::{discard_local_changes, ensure_store_initialized, sync_local, LocalCopyError};
