//! memokit: memoization of fallible callables over pluggable result caches.
//!
//! A [`Memoizer`](memo::Memoizer) wraps a callable returning `Result<V, E>`
//! and records each call's outcome, success or failure, in a
//! [`Cache`](traits::Cache) keyed by the normalized call arguments. Backends
//! differ only in how they share state between threads: see [`store`].

pub mod builder;
pub mod error;
pub mod key;
pub mod memo;
#[cfg(feature = "metrics")]
pub mod metrics;
pub mod prelude;
pub mod state;
pub mod store;
pub mod traits;
