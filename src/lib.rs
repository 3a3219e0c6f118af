//! Wikistore - Git-backed wiki storage
//!
//! Every hosted repository may carry a wiki: a bare Git store of Markdown
//! pages, one file per page. Pages are never edited in the store directly.
//! Each mutation refreshes a disposable working copy, edits a file there,
//! commits as the acting user, and pushes back to the store.
//!
//! # Architecture
//!
//! The codebase follows a strict layered architecture:
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to wiki)
//! - [`wiki`] - Add/Edit/Delete pipeline and read-side page queries
//! - [`core`] - Domain types, page naming, paths, config, and the exclusive pool
//! - [`git`] - Single interface for all Git operations
//!
//! # Correctness Invariants
//!
//! 1. Mutations of one repository's wiki never interleave
//! 2. A page title never resolves to a path outside the working copy
//! 3. The store only ever receives complete, committed changes
//! 4. Page files are written as fresh regular files, never through symlinks

pub mod cli;
pub mod core;
pub mod git;
pub mod wiki;
