//! Time-based expiration decorator.
//!
//! Wraps any [`Cache`] and treats states older than a fixed duration as
//! absent. Expiration is evaluated lazily on read: an expired state is
//! forgotten on the inner cache the first time it is read, and until then it
//! keeps occupying memory. There is no background sweep.
//!
//! `read_and_transform` runs the expiry check inside the inner cache's own
//! `read_and_transform`, so the check, the forget and the callback all share
//! whatever per-key exclusion the inner backend provides.
//!
//! ## Example Usage
//! ```rust
//! use std::time::Duration;
//!
//! use memokit::store::{ExpiringCache, UnsyncCache};
//! use memokit::traits::Cache;
//!
//! let cache = ExpiringCache::new(UnsyncCache::<u32, u32, ()>::new(), Duration::from_secs(60));
//! cache.save_value(&1, 1);
//! assert!(cache.has_value(&1));
//! ```

use std::time::Duration;

use crate::state::ResultState;
use crate::traits::Cache;

/// Cache decorator that expires entries after a fixed duration.
#[derive(Debug)]
pub struct ExpiringCache<C> {
    inner: C,
    expiration: Duration,
}

impl<C> ExpiringCache<C> {
    pub fn new(inner: C, expiration: Duration) -> Self {
        Self { inner, expiration }
    }

    pub fn expiration(&self) -> Duration {
        self.expiration
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }

    pub fn into_inner(self) -> C {
        self.inner
    }

    fn is_expired<V, E>(&self, state: &ResultState<V, E>) -> bool {
        state
            .timestamp()
            .is_some_and(|at| at.elapsed() > self.expiration)
    }

    /// Forgets `state` on the inner cache and reports Absent if it expired.
    fn screen<K, V, E>(&self, key: &K, state: ResultState<V, E>) -> ResultState<V, E>
    where
        C: Cache<K, V, E>,
    {
        if !self.is_expired(&state) {
            return state;
        }
        tracing::trace!(expiration = ?self.expiration, "dropping expired entry");
        self.inner.forget(key);
        ResultState::Absent
    }
}

impl<K, V, E, C> Cache<K, V, E> for ExpiringCache<C>
where
    C: Cache<K, V, E>,
{
    fn reset(&self) {
        self.inner.reset();
    }

    fn write_state(&self, key: &K, state: ResultState<V, E>) {
        self.inner.write_state(key, state);
    }

    fn read_state(&self, key: &K) -> ResultState<V, E> {
        let state = self.inner.read_state(key);
        if !self.is_expired(&state) {
            return state;
        }
        // re-check under the inner exclusion so a concurrent rewrite survives
        self.inner
            .read_and_transform(key, |state| self.screen(key, state))
    }

    fn read_and_transform<R, F>(&self, key: &K, f: F) -> R
    where
        F: FnOnce(ResultState<V, E>) -> R,
    {
        self.inner
            .read_and_transform(key, |state| f(self.screen(key, state)))
    }
}
