//! Memoized callables.
//!
//! ## Architecture
//!
//! ```text
//!   cached(args) ──► CallKey ──► cache.read_and_transform(key, |state| …)
//!                                   │
//!                 state present ────┤──► state.into_value()  (hit)
//!                                   │
//!                 state absent  ────┴──► forced path          (miss)
//!
//!   forced(args) ──► CallKey ──► cache.read_and_transform(key, |prior| …)
//!                                   │
//!                           Ok(v) ──┤──► save_value(key, v), return v
//!                                   │
//!                          Err(e) ──┴──► memoize_errors ? save_error, Err(e)
//!                                        prior recorded ? serve prior
//!                                        otherwise      Err(e)
//!
//!   raw(args)    ──► callable(args)   (cache untouched)
//! ```
//!
//! The forced path runs inside the backend's `read_and_transform`, so with
//! [`PerKeyCache`](crate::store::PerKeyCache) (the default) concurrent cached
//! calls with equal arguments run the callable once: the second caller waits
//! on the key's lock and then finds the recorded state.
//!
//! ## Error Masking
//!
//! With `memoize_errors` disabled a failure is never recorded. If the key
//! already had a recorded result when the failing recomputation started,
//! that result is returned instead of the new error ("last known good"), so
//! results can go stale while the callable keeps failing.
//!
//! ## Receivers
//!
//! [`MethodMemoizer`] is the unbound template for callables that take a
//! receiver. [`MethodMemoizer::bind`] produces a [`BoundMemoizer`] that
//! shares the template's cache but mixes the receiver's identity into every
//! key, so two receivers never collide on one entry.
//!
//! ## Example
//!
//! ```
//! use std::convert::Infallible;
//! use std::sync::atomic::{AtomicU64, Ordering};
//!
//! use memokit::memo::Memoizer;
//!
//! let calls = AtomicU64::new(0);
//! let square = Memoizer::new(|&(n,): &(u64,)| {
//!     calls.fetch_add(1, Ordering::SeqCst);
//!     Ok::<_, Infallible>(n * n)
//! });
//!
//! assert_eq!(square.cached(&(12,)).unwrap(), 144);
//! assert_eq!(square.cached(&(12,)).unwrap(), 144);
//! assert_eq!(calls.load(Ordering::SeqCst), 1);
//! ```

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::builder::{MemoCache, MemoizeOptions};
use crate::error::{CacheError, ConfigError};
use crate::key::{CallArgs, CallKey, Receiver};
#[cfg(feature = "metrics")]
use crate::metrics::{MemoMetrics, MemoMetricsSnapshot};
use crate::state::ResultState;
use crate::traits::Cache;

// ---------------------------------------------------------------------------
// Invocation
// ---------------------------------------------------------------------------

/// One call's key plus the policy it runs under.
struct Invocation<'a, C> {
    cache: &'a C,
    key: CallKey,
    memoize_errors: bool,
    #[cfg(feature = "metrics")]
    metrics: &'a MemoMetrics,
}

impl<C> Invocation<'_, C> {
    fn cached<V, E, I>(&self, invoke: I) -> Result<V, CacheError<E>>
    where
        C: Cache<CallKey, V, E>,
        V: Clone,
        I: FnOnce() -> Result<V, E>,
    {
        self.cache.read_and_transform(&self.key, |state| {
            if state.is_absent() {
                #[cfg(feature = "metrics")]
                self.metrics.inc_miss();
                tracing::trace!("memoized call missed, computing");
                self.forced(invoke)
            } else {
                #[cfg(feature = "metrics")]
                self.metrics.inc_hit();
                state.into_value()
            }
        })
    }

    fn forced<V, E, I>(&self, invoke: I) -> Result<V, CacheError<E>>
    where
        C: Cache<CallKey, V, E>,
        V: Clone,
        I: FnOnce() -> Result<V, E>,
    {
        self.cache.read_and_transform(&self.key, |prior| {
            tracing::trace!(had_prior = !prior.is_absent(), "recomputing memoized call");
            self.compute(prior, invoke)
        })
    }

    fn compute<V, E, I>(&self, prior: ResultState<V, E>, invoke: I) -> Result<V, CacheError<E>>
    where
        C: Cache<CallKey, V, E>,
        V: Clone,
        I: FnOnce() -> Result<V, E>,
    {
        match invoke() {
            Ok(value) => {
                self.cache.save_value(&self.key, value.clone());
                Ok(value)
            },
            Err(error) => {
                if !self.memoize_errors && !prior.is_absent() {
                    #[cfg(feature = "metrics")]
                    self.metrics.inc_stale_served();
                    tracing::debug!("memoized call failed, serving previous result");
                    return prior.into_value();
                }
                let error = Arc::new(error);
                if self.memoize_errors {
                    self.cache.save_error(&self.key, Arc::clone(&error));
                    #[cfg(feature = "metrics")]
                    self.metrics.inc_error_cached();
                    tracing::debug!("memoized call failed, failure recorded");
                }
                Err(CacheError::Call(error))
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Memoizer
// ---------------------------------------------------------------------------

/// A callable bound to a cache, with cached, forced and raw entry points.
pub struct Memoizer<A: ?Sized, V, E, F, C = MemoCache<CallKey, V, E>> {
    func: F,
    cache: Arc<C>,
    memoize_errors: bool,
    #[cfg(feature = "metrics")]
    metrics: MemoMetrics,
    _marker: PhantomData<fn(&A) -> (V, E)>,
}

/// Shorthand for [`Memoizer::new`].
pub fn memoize<A, V, E, F>(func: F) -> Memoizer<A, V, E, F>
where
    A: CallArgs + ?Sized,
    V: Clone + Send,
    E: Send + Sync,
    F: Fn(&A) -> Result<V, E>,
{
    Memoizer::new(func)
}

impl<A, V, E, F> Memoizer<A, V, E, F>
where
    A: CallArgs + ?Sized,
    V: Clone + Send,
    E: Send + Sync,
    F: Fn(&A) -> Result<V, E>,
{
    /// Memoizes `func` with default options: per-key locking, failures
    /// memoized, no expiration.
    pub fn new(func: F) -> Self {
        Self::with_cache(func, Arc::new(MemoCache::default()), true)
    }

    /// Memoizes `func` with the given options.
    pub fn with_options(func: F, options: &MemoizeOptions) -> Result<Self, ConfigError> {
        let cache = options.try_build_cache()?;
        Ok(Self::with_cache(func, Arc::new(cache), options.memoize_errors))
    }
}

impl<A, V, E, F, C> Memoizer<A, V, E, F, C>
where
    A: CallArgs + ?Sized,
    V: Clone,
    F: Fn(&A) -> Result<V, E>,
    C: Cache<CallKey, V, E>,
{
    /// Memoizes `func` over an explicit cache, which may be shared.
    pub fn with_cache(func: F, cache: Arc<C>, memoize_errors: bool) -> Self {
        Self {
            func,
            cache,
            memoize_errors,
            #[cfg(feature = "metrics")]
            metrics: MemoMetrics::default(),
            _marker: PhantomData,
        }
    }

    /// The cache holding this memoizer's results.
    pub fn cache(&self) -> &Arc<C> {
        &self.cache
    }

    pub fn memoize_errors(&self) -> bool {
        self.memoize_errors
    }

    #[cfg(feature = "metrics")]
    pub fn metrics(&self) -> MemoMetricsSnapshot {
        self.metrics.snapshot()
    }

    /// The key `args` are recorded under.
    pub fn key_for(&self, args: &A) -> CallKey {
        CallKey::unbound(args)
    }

    fn invocation(&self, args: &A) -> Invocation<'_, C> {
        Invocation {
            cache: &*self.cache,
            key: self.key_for(args),
            memoize_errors: self.memoize_errors,
            #[cfg(feature = "metrics")]
            metrics: &self.metrics,
        }
    }

    /// Returns the recorded result for `args`, computing it on first use.
    pub fn cached(&self, args: &A) -> Result<V, CacheError<E>> {
        self.invocation(args).cached(|| (self.func)(args))
    }

    /// Always runs the callable and overwrites the recorded result.
    pub fn forced(&self, args: &A) -> Result<V, CacheError<E>> {
        #[cfg(feature = "metrics")]
        self.metrics.inc_forced();
        self.invocation(args).forced(|| (self.func)(args))
    }

    /// Runs the callable without reading or writing the cache.
    pub fn raw(&self, args: &A) -> Result<V, E> {
        #[cfg(feature = "metrics")]
        self.metrics.inc_raw();
        (self.func)(args)
    }
}

impl<A: ?Sized, V, E, F, C> fmt::Debug for Memoizer<A, V, E, F, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct("Memoizer");
        out.field("memoize_errors", &self.memoize_errors);
        #[cfg(feature = "metrics")]
        out.field("metrics", &self.metrics.snapshot());
        out.finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// MethodMemoizer
// ---------------------------------------------------------------------------

/// Unbound template for a memoized callable taking a receiver.
///
/// ```
/// use std::convert::Infallible;
/// use std::sync::Arc;
///
/// use memokit::memo::MethodMemoizer;
///
/// struct Account {
///     balance: u64,
/// }
///
/// let interest = MethodMemoizer::new(|acct: &Account, &(rate,): &(u64,)| {
///     Ok::<_, Infallible>(acct.balance * rate / 100)
/// });
///
/// let a = Arc::new(Account { balance: 1_000 });
/// let b = Arc::new(Account { balance: 50 });
/// assert_eq!(interest.bind(&a).cached(&(5,)).unwrap(), 50);
/// assert_eq!(interest.bind(&b).cached(&(5,)).unwrap(), 2);
/// ```
pub struct MethodMemoizer<T, A: ?Sized, V, E, F, C = MemoCache<CallKey, V, E>> {
    func: F,
    cache: Arc<C>,
    memoize_errors: bool,
    #[cfg(feature = "metrics")]
    metrics: MemoMetrics,
    _marker: PhantomData<fn(&T, &A) -> (V, E)>,
}

impl<T, A, V, E, F> MethodMemoizer<T, A, V, E, F>
where
    T: Any + Send + Sync,
    A: CallArgs + ?Sized,
    V: Clone + Send,
    E: Send + Sync,
    F: Fn(&T, &A) -> Result<V, E>,
{
    /// Memoizes `func` with default options.
    pub fn new(func: F) -> Self {
        Self::with_cache(func, Arc::new(MemoCache::default()), true)
    }

    /// Memoizes `func` with the given options.
    pub fn with_options(func: F, options: &MemoizeOptions) -> Result<Self, ConfigError> {
        let cache = options.try_build_cache()?;
        Ok(Self::with_cache(func, Arc::new(cache), options.memoize_errors))
    }
}

impl<T, A, V, E, F, C> MethodMemoizer<T, A, V, E, F, C>
where
    T: Any + Send + Sync,
    A: CallArgs + ?Sized,
    V: Clone,
    F: Fn(&T, &A) -> Result<V, E>,
    C: Cache<CallKey, V, E>,
{
    /// Memoizes `func` over an explicit cache, which may be shared.
    pub fn with_cache(func: F, cache: Arc<C>, memoize_errors: bool) -> Self {
        Self {
            func,
            cache,
            memoize_errors,
            #[cfg(feature = "metrics")]
            metrics: MemoMetrics::default(),
            _marker: PhantomData,
        }
    }

    /// Scopes the memoizer to `receiver`.
    ///
    /// The returned view shares this template's cache and counters.
    pub fn bind(&self, receiver: &Arc<T>) -> BoundMemoizer<'_, T, A, V, E, F, C> {
        BoundMemoizer {
            template: self,
            identity: Receiver::new(receiver),
            receiver: Arc::clone(receiver),
        }
    }

    /// The cache shared by every bound view.
    pub fn cache(&self) -> &Arc<C> {
        &self.cache
    }

    pub fn memoize_errors(&self) -> bool {
        self.memoize_errors
    }

    /// Counters aggregated over every bound view.
    #[cfg(feature = "metrics")]
    pub fn metrics(&self) -> MemoMetricsSnapshot {
        self.metrics.snapshot()
    }
}

impl<T, A: ?Sized, V, E, F, C> fmt::Debug for MethodMemoizer<T, A, V, E, F, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct("MethodMemoizer");
        out.field("memoize_errors", &self.memoize_errors);
        #[cfg(feature = "metrics")]
        out.field("metrics", &self.metrics.snapshot());
        out.finish_non_exhaustive()
    }
}

/// A [`MethodMemoizer`] scoped to one receiver.
pub struct BoundMemoizer<'a, T, A: ?Sized, V, E, F, C> {
    template: &'a MethodMemoizer<T, A, V, E, F, C>,
    identity: Receiver,
    receiver: Arc<T>,
}

impl<T, A, V, E, F, C> BoundMemoizer<'_, T, A, V, E, F, C>
where
    T: Any + Send + Sync,
    A: CallArgs + ?Sized,
    V: Clone,
    F: Fn(&T, &A) -> Result<V, E>,
    C: Cache<CallKey, V, E>,
{
    pub fn receiver(&self) -> &Arc<T> {
        &self.receiver
    }

    pub fn cache(&self) -> &Arc<C> {
        &self.template.cache
    }

    /// The key `args` are recorded under for this receiver.
    pub fn key_for(&self, args: &A) -> CallKey {
        CallKey::bound(self.identity.clone(), args)
    }

    fn invocation(&self, args: &A) -> Invocation<'_, C> {
        Invocation {
            cache: &*self.template.cache,
            key: self.key_for(args),
            memoize_errors: self.template.memoize_errors,
            #[cfg(feature = "metrics")]
            metrics: &self.template.metrics,
        }
    }

    fn call(&self, args: &A) -> Result<V, E> {
        (self.template.func)(&self.receiver, args)
    }

    /// Returns the recorded result for `args`, computing it on first use.
    pub fn cached(&self, args: &A) -> Result<V, CacheError<E>> {
        self.invocation(args).cached(|| self.call(args))
    }

    /// Always runs the callable and overwrites the recorded result.
    pub fn forced(&self, args: &A) -> Result<V, CacheError<E>> {
        #[cfg(feature = "metrics")]
        self.template.metrics.inc_forced();
        self.invocation(args).forced(|| self.call(args))
    }

    /// Runs the callable without reading or writing the cache.
    pub fn raw(&self, args: &A) -> Result<V, E> {
        #[cfg(feature = "metrics")]
        self.template.metrics.inc_raw();
        self.call(args)
    }
}

impl<T, A: ?Sized, V, E, F, C> fmt::Debug for BoundMemoizer<'_, T, A, V, E, F, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundMemoizer")
            .field("receiver", &self.identity)
            .finish_non_exhaustive()
    }
}
