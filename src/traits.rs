//! # Cache Contract
//!
//! This module defines the [`Cache`] trait every backend implements. A cache
//! owns one [`ResultState`] per key; the trait is expressed over `&self` so a
//! single instance can be shared behind an `Arc` by many memoizers and
//! threads, with each backend choosing its own interior-mutability strategy.
//!
//! ## Architecture
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────────┐
//!   │                       Cache<K, V, E>                         │
//!   │                                                              │
//!   │  required:  reset(&)                                         │
//!   │             write_state(&, &K, ResultState)                  │
//!   │             read_state(&, &K) → ResultState                  │
//!   │                                                              │
//!   │  provided:  read_and_transform(&, &K, FnOnce) → R            │
//!   │             forget / save_value / save_error                 │
//!   │             has_value / get_value                            │
//!   └──────────────────────────────┬───────────────────────────────┘
//!                                  │
//!    ┌───────────────┬─────────────┼──────────────┬────────────────┐
//!    ▼               ▼             ▼              ▼                ▼
//!  Unsync       ThreadLocal     Locked         PerKey          Expiring<C>
//!  (RefCell)    (per thread)    (one RLock)    (RLock per key) (decorator)
//! ```
//!
//! ## Atomicity of `read_and_transform`
//!
//! | Backend       | Guarantee while `f` runs                        |
//! |---------------|-------------------------------------------------|
//! | `Unsync`      | none (single-threaded by construction)          |
//! | `ThreadLocal` | none needed (table private to the thread)       |
//! | `Locked`      | whole table locked                              |
//! | `PerKey`      | that key's slot locked, other keys free         |
//! | `Expiring`    | whatever the inner backend guarantees           |
//!
//! Locks held during `f` are re-entrant: `f` may call back into the same
//! cache (for instance `save_value` on the key being held).

use std::sync::Arc;

use crate::error::CacheError;
use crate::state::ResultState;

/// Storage of per-key [`ResultState`]s.
///
/// # Example
///
/// ```
/// use memokit::store::PerKeyCache;
/// use memokit::traits::Cache;
///
/// let cache: PerKeyCache<&str, u32, ()> = PerKeyCache::new();
/// assert!(!cache.has_value(&"answer"));
///
/// cache.save_value(&"answer", 42);
/// assert_eq!(cache.get_value(&"answer").unwrap(), 42);
///
/// cache.forget(&"answer");
/// assert!(cache.get_value(&"answer").unwrap_err().is_not_found());
/// ```
pub trait Cache<K, V, E> {
    /// Drops every recorded state.
    fn reset(&self);

    /// Installs `state` for `key`, replacing whatever was there.
    ///
    /// Writing [`ResultState::Absent`] may delete the entry instead.
    fn write_state(&self, key: &K, state: ResultState<V, E>);

    /// Returns the current state for `key`, or Absent if never written.
    fn read_state(&self, key: &K) -> ResultState<V, E>;

    /// Reads the state for `key` and applies `f` to it under whatever
    /// per-key exclusion the backend offers.
    ///
    /// The default has no locking at all.
    fn read_and_transform<R, F>(&self, key: &K, f: F) -> R
    where
        F: FnOnce(ResultState<V, E>) -> R,
    {
        f(self.read_state(key))
    }

    /// Removes any recorded state for `key`.
    fn forget(&self, key: &K) {
        self.write_state(key, ResultState::absent());
    }

    /// Records a successful result for `key`.
    fn save_value(&self, key: &K, value: V) {
        self.write_state(key, ResultState::success(value));
    }

    /// Records a failure for `key`.
    fn save_error(&self, key: &K, error: Arc<E>) {
        self.write_state(key, ResultState::failure(error));
    }

    /// Whether `key` has a recorded success or failure.
    fn has_value(&self, key: &K) -> bool {
        !self.read_state(key).is_absent()
    }

    /// The recorded value for `key`.
    ///
    /// Fails with [`CacheError::NotFound`] if nothing is recorded and with
    /// [`CacheError::Cached`] if a failure is recorded.
    fn get_value(&self, key: &K) -> Result<V, CacheError<E>> {
        self.read_state(key).into_value()
    }
}

impl<K, V, E, C> Cache<K, V, E> for Arc<C>
where
    C: Cache<K, V, E> + ?Sized,
{
    fn reset(&self) {
        (**self).reset()
    }

    fn write_state(&self, key: &K, state: ResultState<V, E>) {
        (**self).write_state(key, state)
    }

    fn read_state(&self, key: &K) -> ResultState<V, E> {
        (**self).read_state(key)
    }

    fn read_and_transform<R, F>(&self, key: &K, f: F) -> R
    where
        F: FnOnce(ResultState<V, E>) -> R,
    {
        (**self).read_and_transform(key, f)
    }
}
