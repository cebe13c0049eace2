//! Whole-table lock backend.
//!
//! ## Architecture
//! - An [`UnsyncCache`] delegate behind one `parking_lot::ReentrantMutex`.
//! - Every operation holds the lock for its full duration; in
//!   `read_and_transform` that includes the callback.
//! - The lock is re-entrant so the callback may call back into the cache
//!   (`save_value`, `forget`, even `reset`) from the same thread.
//! - `reset` swaps in a fresh delegate while holding the lock.
//!
//! All operations across all keys are totally ordered. Simple to reason
//! about, but unrelated keys serialize behind each other; see
//! [`PerKeyCache`](crate::store::PerKeyCache) for the fine-grained variant.
//!
//! ## Example Usage
//! ```rust
//! use std::sync::Arc;
//! use std::thread;
//!
//! use memokit::store::LockedCache;
//! use memokit::traits::Cache;
//!
//! let cache: Arc<LockedCache<u32, u32, ()>> = Arc::new(LockedCache::new());
//! let writer = Arc::clone(&cache);
//! thread::spawn(move || writer.save_value(&1, 10)).join().unwrap();
//! assert_eq!(cache.get_value(&1).unwrap(), 10);
//! ```

use std::cell::RefCell;
use std::fmt;
use std::hash::Hash;

use parking_lot::ReentrantMutex;

use crate::state::ResultState;
use crate::store::unsync::UnsyncCache;
use crate::traits::Cache;

/// Thread-safe cache serializing every operation behind one lock.
pub struct LockedCache<K, V, E> {
    delegate: ReentrantMutex<RefCell<UnsyncCache<K, V, E>>>,
}

impl<K, V, E> LockedCache<K, V, E> {
    pub fn new() -> Self {
        Self {
            delegate: ReentrantMutex::new(RefCell::new(UnsyncCache::new())),
        }
    }

    /// Number of keys with a recorded state.
    pub fn len(&self) -> usize {
        let guard = self.delegate.lock();
        let len = guard.borrow().len();
        len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K, V, E> Default for LockedCache<K, V, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, E> fmt::Debug for LockedCache<K, V, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockedCache")
            .field("len", &self.len())
            .finish()
    }
}

impl<K, V, E> Cache<K, V, E> for LockedCache<K, V, E>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn reset(&self) {
        let guard = self.delegate.lock();
        let detached = guard.replace(UnsyncCache::new());
        tracing::debug!(dropped = detached.len(), "locked cache reset");
    }

    fn write_state(&self, key: &K, state: ResultState<V, E>) {
        let guard = self.delegate.lock();
        guard.borrow().write_state(key, state);
    }

    fn read_state(&self, key: &K) -> ResultState<V, E> {
        let guard = self.delegate.lock();
        let state = guard.borrow().read_state(key);
        state
    }

    fn read_and_transform<R, F>(&self, key: &K, f: F) -> R
    where
        F: FnOnce(ResultState<V, E>) -> R,
    {
        let guard = self.delegate.lock();
        let state = guard.borrow().read_state(key);
        let out = f(state);
        drop(guard);
        out
    }
}
