//! Memoization options and the unified cache they build.
//!
//! Provides a simple API to pick a backend, the error-memoization policy and
//! an optional expiration, while hiding which concrete backend type sits
//! underneath.
//!
//! ## Example
//!
//! ```rust
//! use std::time::Duration;
//!
//! use memokit::builder::{Backend, MemoizeOptions};
//! use memokit::traits::Cache;
//!
//! let cache = MemoizeOptions::new()
//!     .backend(Backend::Locked)
//!     .expire_after(Duration::from_secs(30))
//!     .try_build_cache::<u64, String, ()>()
//!     .unwrap();
//! cache.save_value(&1, "hello".to_string());
//! assert_eq!(cache.get_value(&1).unwrap(), "hello");
//! ```
//!
//! ## Defaults
//!
//! | Option           | Default            |
//! |------------------|--------------------|
//! | `backend`        | `Backend::PerKey`  |
//! | `memoize_errors` | `true`             |
//! | `expiration`     | `None`             |

use std::fmt;
use std::hash::Hash;
use std::time::Duration;

use crate::error::ConfigError;
use crate::state::ResultState;
use crate::store::{ExpiringCache, LockedCache, PerKeyCache, ThreadLocalCache};
use crate::traits::Cache;

/// Thread-safe backends selectable through [`MemoizeOptions`].
///
/// [`UnsyncCache`](crate::store::UnsyncCache) is not listed: it is not
/// `Sync`, so it is plugged in explicitly with
/// [`Memoizer::with_cache`](crate::memo::Memoizer::with_cache).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Backend {
    /// One private table per thread.
    ThreadLocal,
    /// One re-entrant lock for the whole table.
    Locked,
    /// One re-entrant lock per key.
    #[default]
    PerKey,
}

/// Construction-time configuration for a memoizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoizeOptions {
    pub backend: Backend,
    pub memoize_errors: bool,
    pub expiration: Option<Duration>,
}

impl Default for MemoizeOptions {
    fn default() -> Self {
        Self {
            backend: Backend::PerKey,
            memoize_errors: true,
            expiration: None,
        }
    }
}

impl MemoizeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }

    /// Whether failures are cached like successful results.
    ///
    /// When disabled, a failing recomputation serves the last recorded result
    /// for the key instead of the new error, if there is one.
    pub fn memoize_errors(mut self, enabled: bool) -> Self {
        self.memoize_errors = enabled;
        self
    }

    /// Treat entries older than `expiration` as absent.
    pub fn expire_after(mut self, expiration: Duration) -> Self {
        self.expiration = Some(expiration);
        self
    }

    /// Checks the options for consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.expiration == Some(Duration::ZERO) {
            return Err(ConfigError::new("expiration must be greater than zero"));
        }
        Ok(())
    }

    /// Builds the configured cache.
    pub fn try_build_cache<K, V, E>(&self) -> Result<MemoCache<K, V, E>, ConfigError>
    where
        K: Send,
        V: Send,
        E: Send + Sync,
    {
        self.validate()?;
        let base = match self.backend {
            Backend::ThreadLocal => CacheInner::ThreadLocal(ThreadLocalCache::new()),
            Backend::Locked => CacheInner::Locked(LockedCache::new()),
            Backend::PerKey => CacheInner::PerKey(PerKeyCache::new()),
        };
        let inner = match self.expiration {
            Some(expiration) => CacheInner::Expiring(Box::new(ExpiringCache::new(base, expiration))),
            None => base,
        };
        Ok(MemoCache {
            inner,
            backend: self.backend,
            expiration: self.expiration,
        })
    }
}

/// Unified cache wrapper built from [`MemoizeOptions`].
pub struct MemoCache<K, V, E>
where
    K: Send,
    V: Send,
    E: Send + Sync,
{
    inner: CacheInner<K, V, E>,
    backend: Backend,
    expiration: Option<Duration>,
}

enum CacheInner<K, V, E>
where
    K: Send,
    V: Send,
    E: Send + Sync,
{
    ThreadLocal(ThreadLocalCache<K, V, E>),
    Locked(LockedCache<K, V, E>),
    PerKey(PerKeyCache<K, V, E>),
    Expiring(Box<ExpiringCache<CacheInner<K, V, E>>>),
}

impl<K, V, E> MemoCache<K, V, E>
where
    K: Send,
    V: Send,
    E: Send + Sync,
{
    pub fn backend(&self) -> Backend {
        self.backend
    }

    pub fn expiration(&self) -> Option<Duration> {
        self.expiration
    }
}

impl<K, V, E> Default for MemoCache<K, V, E>
where
    K: Send,
    V: Send,
    E: Send + Sync,
{
    fn default() -> Self {
        Self {
            inner: CacheInner::PerKey(PerKeyCache::new()),
            backend: Backend::PerKey,
            expiration: None,
        }
    }
}

impl<K, V, E> fmt::Debug for MemoCache<K, V, E>
where
    K: Send,
    V: Send,
    E: Send + Sync,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoCache")
            .field("backend", &self.backend)
            .field("expiration", &self.expiration)
            .finish()
    }
}

impl<K, V, E> Cache<K, V, E> for CacheInner<K, V, E>
where
    K: Eq + Hash + Clone + Send,
    V: Clone + Send,
    E: Send + Sync,
{
    fn reset(&self) {
        match self {
            CacheInner::ThreadLocal(cache) => cache.reset(),
            CacheInner::Locked(cache) => cache.reset(),
            CacheInner::PerKey(cache) => cache.reset(),
            CacheInner::Expiring(cache) => Cache::<K, V, E>::reset(&**cache),
        }
    }

    fn write_state(&self, key: &K, state: ResultState<V, E>) {
        match self {
            CacheInner::ThreadLocal(cache) => cache.write_state(key, state),
            CacheInner::Locked(cache) => cache.write_state(key, state),
            CacheInner::PerKey(cache) => cache.write_state(key, state),
            CacheInner::Expiring(cache) => cache.write_state(key, state),
        }
    }

    fn read_state(&self, key: &K) -> ResultState<V, E> {
        match self {
            CacheInner::ThreadLocal(cache) => cache.read_state(key),
            CacheInner::Locked(cache) => cache.read_state(key),
            CacheInner::PerKey(cache) => cache.read_state(key),
            CacheInner::Expiring(cache) => cache.read_state(key),
        }
    }

    fn read_and_transform<R, F>(&self, key: &K, f: F) -> R
    where
        F: FnOnce(ResultState<V, E>) -> R,
    {
        match self {
            CacheInner::ThreadLocal(cache) => cache.read_and_transform(key, f),
            CacheInner::Locked(cache) => cache.read_and_transform(key, f),
            CacheInner::PerKey(cache) => cache.read_and_transform(key, f),
            CacheInner::Expiring(cache) => cache.read_and_transform(key, f),
        }
    }
}

impl<K, V, E> Cache<K, V, E> for MemoCache<K, V, E>
where
    K: Eq + Hash + Clone + Send,
    V: Clone + Send,
    E: Send + Sync,
{
    fn reset(&self) {
        self.inner.reset();
    }

    fn write_state(&self, key: &K, state: ResultState<V, E>) {
        self.inner.write_state(key, state);
    }

    fn read_state(&self, key: &K) -> ResultState<V, E> {
        self.inner.read_state(key)
    }

    fn read_and_transform<R, F>(&self, key: &K, f: F) -> R
    where
        F: FnOnce(ResultState<V, E>) -> R,
    {
        self.inner.read_and_transform(key, f)
    }
}
