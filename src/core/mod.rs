//! core
//!
//! Core domain types, schemas, and operations for wikistore.
//!
//! # Modules
//!
//! - [`types`] - Strong types: BranchName, Oid, RepoId
//! - [`naming`] - Page title sanitization and URL encoding
//! - [`ops`] - Per-repository mutual exclusion
//! - [`config`] - Configuration schema and loading
//! - [`paths`] - Centralized path routing for stores and working copies
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - Schemas are strict and self-describing
//! - Naming is pure and deterministic

pub mod config;
pub mod naming;
pub mod ops;
pub mod paths;
pub mod types;
