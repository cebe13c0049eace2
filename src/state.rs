//! Recorded outcome of a computation for one cache key.
//!
//! A [`ResultState`] is either absent, a successful return value, or a
//! failure. Success and failure are stamped with the [`Instant`] they were
//! created, which the expiring backend uses to decide staleness.
//!
//! ```text
//!            save_value / save_error
//!   Absent ─────────────────────────────► Success | Failure
//!     ▲                                         │
//!     └─────────── forget / reset / expiry ─────┘
//! ```
//!
//! States are immutable once built; backends hand out clones, never
//! references into their tables.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use crate::error::CacheError;

/// Outcome stored for a key.
pub enum ResultState<V, E> {
    /// Nothing recorded.
    Absent,
    /// A completed computation's return value.
    Success { value: V, at: Instant },
    /// A completed computation's failure.
    Failure { error: Arc<E>, at: Instant },
}

impl<V, E> ResultState<V, E> {
    /// The empty state. Has no side effects.
    #[inline]
    pub fn absent() -> Self {
        ResultState::Absent
    }

    /// A successful result stamped with the current time.
    pub fn success(value: V) -> Self {
        ResultState::Success {
            value,
            at: Instant::now(),
        }
    }

    /// A failed result stamped with the current time.
    pub fn failure(error: Arc<E>) -> Self {
        ResultState::Failure {
            error,
            at: Instant::now(),
        }
    }

    #[inline]
    pub fn is_absent(&self) -> bool {
        matches!(self, ResultState::Absent)
    }

    #[inline]
    pub fn is_failure(&self) -> bool {
        matches!(self, ResultState::Failure { .. })
    }

    /// When the state was recorded; `None` for [`ResultState::Absent`].
    #[inline]
    pub fn timestamp(&self) -> Option<Instant> {
        match self {
            ResultState::Absent => None,
            ResultState::Success { at, .. } | ResultState::Failure { at, .. } => Some(*at),
        }
    }

    /// Converts the state into the stored value.
    ///
    /// Absent yields [`CacheError::NotFound`]; a failure re-raises the stored
    /// error as [`CacheError::Cached`] with its identity preserved.
    pub fn into_value(self) -> Result<V, CacheError<E>> {
        match self {
            ResultState::Absent => Err(CacheError::NotFound),
            ResultState::Success { value, .. } => Ok(value),
            ResultState::Failure { error, .. } => Err(CacheError::Cached(error)),
        }
    }
}

impl<V: Clone, E> ResultState<V, E> {
    /// Like [`into_value`](Self::into_value) but clones the stored value.
    pub fn value(&self) -> Result<V, CacheError<E>> {
        self.clone().into_value()
    }
}

impl<V, E> Default for ResultState<V, E> {
    fn default() -> Self {
        ResultState::Absent
    }
}

impl<V: Clone, E> Clone for ResultState<V, E> {
    fn clone(&self) -> Self {
        match self {
            ResultState::Absent => ResultState::Absent,
            ResultState::Success { value, at } => ResultState::Success {
                value: value.clone(),
                at: *at,
            },
            ResultState::Failure { error, at } => ResultState::Failure {
                error: Arc::clone(error),
                at: *at,
            },
        }
    }
}

/// Failures compare by error identity, not by error value.
impl<V: PartialEq, E> PartialEq for ResultState<V, E> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ResultState::Absent, ResultState::Absent) => true,
            (
                ResultState::Success { value: a, at: ta },
                ResultState::Success { value: b, at: tb },
            ) => ta == tb && a == b,
            (
                ResultState::Failure { error: a, at: ta },
                ResultState::Failure { error: b, at: tb },
            ) => ta == tb && Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl<V: fmt::Debug, E: fmt::Debug> fmt::Debug for ResultState<V, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultState::Absent => f.write_str("Absent"),
            ResultState::Success { value, at } => f
                .debug_struct("Success")
                .field("value", value)
                .field("at", at)
                .finish(),
            ResultState::Failure { error, at } => f
                .debug_struct("Failure")
                .field("error", error)
                .field("at", at)
                .finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Boom;

    #[test]
    fn absent_has_no_timestamp_and_no_value() {
        let state: ResultState<u32, Boom> = ResultState::absent();
        assert!(state.is_absent());
        assert_eq!(state.timestamp(), None);
        assert!(state.value().unwrap_err().is_not_found());
    }

    #[test]
    fn absent_states_are_equal() {
        let a: ResultState<u32, Boom> = ResultState::absent();
        let b: ResultState<u32, Boom> = ResultState::default();
        assert_eq!(a, b);
    }

    #[test]
    fn success_returns_value_and_timestamp() {
        let before = Instant::now();
        let state: ResultState<&str, Boom> = ResultState::success("hi");
        assert!(!state.is_absent());
        assert!(state.timestamp().unwrap() >= before);
        assert_eq!(state.value().unwrap(), "hi");
        assert_eq!(state.into_value().unwrap(), "hi");
    }

    #[test]
    fn failure_reraises_same_error() {
        let err = Arc::new(Boom);
        let state: ResultState<u32, Boom> = ResultState::failure(err.clone());
        assert!(state.is_failure());
        match state.value() {
            Err(CacheError::Cached(got)) => assert!(Arc::ptr_eq(&got, &err)),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn equality_uses_timestamp_and_payload() {
        let a: ResultState<u32, Boom> = ResultState::success(7);
        let b = a.clone();
        assert_eq!(a, b);

        let at = a.timestamp().unwrap();
        let other_value: ResultState<u32, Boom> = ResultState::Success { value: 8, at };
        assert_ne!(a, other_value);

        let err = Arc::new(Boom);
        let f1: ResultState<u32, Boom> = ResultState::Failure {
            error: err.clone(),
            at,
        };
        let f2: ResultState<u32, Boom> = ResultState::Failure { error: err, at };
        let f3: ResultState<u32, Boom> = ResultState::Failure {
            error: Arc::new(Boom),
            at,
        };
        assert_eq!(f1, f2);
        assert_ne!(f1, f3);
        assert_ne!(a, f1);
    }
}
