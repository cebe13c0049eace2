//! Error types for the memokit library.
//!
//! ## Key Components
//!
//! - [`CacheError`]: Returned when reading a result out of a cache or a
//!   memoized call. Distinguishes "nothing recorded" from a stored failure
//!   and from a fresh failure of the underlying callable.
//! - [`ConfigError`]: Returned when memoization options are invalid
//!   (e.g. a zero expiration).
//!
//! ## Example Usage
//!
//! ```
//! use std::sync::Arc;
//!
//! use memokit::error::CacheError;
//! use memokit::store::UnsyncCache;
//! use memokit::traits::Cache;
//!
//! let cache: UnsyncCache<u32, String, std::io::Error> = UnsyncCache::new();
//! assert!(matches!(cache.get_value(&1), Err(CacheError::NotFound)));
//!
//! let err = Arc::new(std::io::Error::other("boom"));
//! cache.save_error(&1, err.clone());
//! let stored = cache.get_value(&1).unwrap_err();
//! assert!(Arc::ptr_eq(stored.error().unwrap(), &err));
//! ```

use std::sync::Arc;

// ---------------------------------------------------------------------------
// CacheError
// ---------------------------------------------------------------------------

/// Error returned when a cached result cannot be produced as a value.
///
/// Failures are carried as `Arc<E>` so that re-raising a stored failure hands
/// back the very same error object that was recorded.
#[derive(Debug, thiserror::Error)]
pub enum CacheError<E> {
    /// No result has been recorded for the key (or it was forgotten/expired).
    #[error("no result recorded for key")]
    NotFound,

    /// A previously stored failure, re-raised unchanged.
    #[error("cached failure: {0}")]
    Cached(Arc<E>),

    /// A fresh failure returned by the underlying callable.
    #[error("call failed: {0}")]
    Call(Arc<E>),
}

impl<E> CacheError<E> {
    /// Returns `true` for [`CacheError::NotFound`].
    #[inline]
    pub fn is_not_found(&self) -> bool {
        matches!(self, CacheError::NotFound)
    }

    /// Returns the underlying failure, if any.
    #[inline]
    pub fn error(&self) -> Option<&Arc<E>> {
        match self {
            CacheError::NotFound => None,
            CacheError::Cached(err) | CacheError::Call(err) => Some(err),
        }
    }

    /// Consumes the error, returning the underlying failure, if any.
    pub fn into_error(self) -> Option<Arc<E>> {
        match self {
            CacheError::NotFound => None,
            CacheError::Cached(err) | CacheError::Call(err) => Some(err),
        }
    }
}

impl<E> Clone for CacheError<E> {
    fn clone(&self) -> Self {
        match self {
            CacheError::NotFound => CacheError::NotFound,
            CacheError::Cached(err) => CacheError::Cached(Arc::clone(err)),
            CacheError::Call(err) => CacheError::Call(Arc::clone(err)),
        }
    }
}

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Error returned when memoization options are invalid.
///
/// Produced by [`MemoizeOptions::validate`](crate::builder::MemoizeOptions::validate)
/// and the fallible constructors built on it. Carries a human-readable
/// description of which option failed validation.
///
/// # Example
///
/// ```
/// use std::time::Duration;
///
/// use memokit::builder::MemoizeOptions;
///
/// let err = MemoizeOptions::new()
///     .expire_after(Duration::ZERO)
///     .validate()
///     .unwrap_err();
/// assert!(err.to_string().contains("expiration"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ConfigError(String);

impl ConfigError {
    /// Creates a new `ConfigError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error, PartialEq)]
    #[error("disk on fire")]
    struct DiskError;

    // -- CacheError -------------------------------------------------------

    #[test]
    fn not_found_display() {
        let err: CacheError<DiskError> = CacheError::NotFound;
        assert_eq!(err.to_string(), "no result recorded for key");
        assert!(err.is_not_found());
        assert!(err.error().is_none());
    }

    #[test]
    fn cached_and_call_expose_same_arc() {
        let inner = Arc::new(DiskError);
        let cached = CacheError::Cached(inner.clone());
        let call = CacheError::Call(inner.clone());

        assert!(Arc::ptr_eq(cached.error().unwrap(), &inner));
        assert!(Arc::ptr_eq(&call.into_error().unwrap(), &inner));
        assert_eq!(cached.to_string(), "cached failure: disk on fire");
    }

    #[test]
    fn clone_keeps_identity() {
        let inner = Arc::new(DiskError);
        let err = CacheError::Cached(inner.clone());
        let copy = err.clone();
        assert!(Arc::ptr_eq(copy.error().unwrap(), &inner));
    }

    #[test]
    fn cache_error_implements_std_error() {
        fn assert_error<T: std::error::Error>() {}
        assert_error::<CacheError<DiskError>>();
    }

    // -- ConfigError ------------------------------------------------------

    #[test]
    fn config_display_shows_message() {
        let err = ConfigError::new("expiration must be > 0");
        assert_eq!(err.to_string(), "expiration must be > 0");
        assert_eq!(err.message(), "expiration must be > 0");
    }

    #[test]
    fn config_clone_and_eq() {
        let a = ConfigError::new("x");
        let b = a.clone();
        assert_eq!(a, b);
    }
}
