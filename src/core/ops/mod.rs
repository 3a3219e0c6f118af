//! core::ops
//!
//! Per-key mutual exclusion for mutating operations.
//!
//! # Modules
//!
//! - [`pool`] - Exclusive pool keyed by repository id
//!
//! # Architecture
//!
//! Every wiki mutation:
//! 1. Checks out the repository's slot from the shared pool
//! 2. Runs its whole pipeline while holding the guard
//! 3. Releases the slot on every exit path when the guard drops
//!
//! # Example
//!
//! ```
//! use wikistore::core::ops::ExclusivePool;
//!
//! let pool = ExclusivePool::new();
//! {
//!     let _guard = pool.acquire(42);
//!     assert!(pool.try_acquire(42).is_none());
//! }
//! assert!(pool.try_acquire(42).is_some());
//! ```

pub mod pool;

pub use pool::{ExclusivePool, PoolGuard};
