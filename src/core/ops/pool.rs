//! core::ops::pool
//!
//! Keyed exclusive pool: one in-process mutual-exclusion slot per key.
//!
//! # Architecture
//!
//! The pool serializes wiki mutations per repository. Callers with the same
//! key run strictly one at a time; callers with different keys never touch
//! each other's slot.
//!
//! Bookkeeping (the key to slot map) lives behind its own short-held mutex.
//! A slot is only ever waited on after that mutex has been released, so a
//! long-running holder of one key never delays lookups for another.
//!
//! # Invariants
//!
//! - At most one [`PoolGuard`] per key exists at any instant
//! - The guard releases on drop, including during unwinding
//! - A slot is reference counted by its holder and waiters and removed from
//!   the map when that count reaches zero, so the map only grows with the
//!   number of keys in active use
//! - Waiters are woken in no particular order
//!
//! # Example
//!
//! ```
//! use wikistore::core::ops::pool::ExclusivePool;
//!
//! let pool = ExclusivePool::new();
//!
//! let guard = pool.acquire(1_i64);
//! assert!(pool.try_acquire(1).is_none());
//! assert!(pool.try_acquire(2).is_some());
//!
//! drop(guard);
//! assert!(pool.try_acquire(1).is_some());
//! ```

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

#[derive(Debug, Default)]
struct Slot {
    held: Mutex<bool>,
    released: Condvar,
}

#[derive(Debug)]
struct Entry {
    slot: Arc<Slot>,
    /// Holder plus waiters currently referencing the slot.
    users: usize,
}

/// A keyed mutual-exclusion manager.
#[derive(Debug)]
pub struct ExclusivePool<K> {
    entries: Mutex<HashMap<K, Entry>>,
}

impl<K> Default for ExclusivePool<K> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl<K> ExclusivePool<K>
where
    K: Hash + Eq + Clone,
{
    /// Create an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until `key` is free, then hold it.
    ///
    /// The slot for an unused key is created lazily. The returned guard
    /// releases the key when dropped.
    pub fn acquire(&self, key: K) -> PoolGuard<'_, K> {
        let slot = self.check_in(&key);

        let mut held = slot.held.lock();
        while *held {
            slot.released.wait(&mut held);
        }
        *held = true;
        drop(held);

        PoolGuard {
            pool: self,
            key,
            slot,
        }
    }

    /// Hold `key` if nobody else does, without blocking.
    pub fn try_acquire(&self, key: K) -> Option<PoolGuard<'_, K>> {
        let slot = self.check_in(&key);

        let acquired = {
            let mut held = slot.held.lock();
            !std::mem::replace(&mut *held, true)
        };

        if acquired {
            Some(PoolGuard {
                pool: self,
                key,
                slot,
            })
        } else {
            self.check_out(&key);
            None
        }
    }

    /// Number of keys that currently have a holder or a waiter.
    pub fn active_keys(&self) -> usize {
        self.entries.lock().len()
    }

    fn check_in(&self, key: &K) -> Arc<Slot> {
        let mut entries = self.entries.lock();
        let entry = entries.entry(key.clone()).or_insert_with(|| Entry {
            slot: Arc::new(Slot::default()),
            users: 0,
        });
        entry.users += 1;
        Arc::clone(&entry.slot)
    }

    fn check_out(&self, key: &K) {
        let mut entries = self.entries.lock();
        let evict = match entries.get_mut(key) {
            Some(entry) => {
                entry.users -= 1;
                entry.users == 0
            }
            None => false,
        };
        if evict {
            entries.remove(key);
        }
    }
}

/// Proof of holding a key in an [`ExclusivePool`].
///
/// Dropping the guard releases the key and wakes one waiter.
#[derive(Debug)]
pub struct PoolGuard<'a, K>
where
    K: Hash + Eq + Clone,
{
    pool: &'a ExclusivePool<K>,
    key: K,
    slot: Arc<Slot>,
}

impl<K> PoolGuard<'_, K>
where
    K: Hash + Eq + Clone,
{
    /// The key this guard holds.
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Release the key explicitly.
    pub fn release(self) {
        drop(self);
    }
}

impl<K> Drop for PoolGuard<'_, K>
where
    K: Hash + Eq + Clone,
{
    fn drop(&mut self) {
        *self.slot.held.lock() = false;
        self.slot.released.notify_one();

        self.pool.check_out(&self.key);
    }
}
