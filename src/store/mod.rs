//! Cache backends.
//!
//! Each backend implements [`Cache`](crate::traits::Cache) with a different
//! sharing and locking model. Backends own their tables; callers only ever
//! receive cloned [`ResultState`](crate::state::ResultState) snapshots.
//!
//! ## Key Components
//! - [`UnsyncCache`]: single `RefCell` map; `!Sync`, single-threaded only.
//! - [`ThreadLocalCache`]: one private map per thread.
//! - [`LockedCache`]: one re-entrant lock around an `UnsyncCache`.
//! - [`PerKeyCache`]: one re-entrant lock per key; the default for memoizers.
//! - [`ExpiringCache`]: decorator treating old entries as absent.
//!
//! ## Choosing a Backend
//!
//! | Backend       | Shared across threads | Serializes unrelated keys |
//! |---------------|-----------------------|---------------------------|
//! | `Unsync`      | no (not `Sync`)       | n/a                       |
//! | `ThreadLocal` | no (isolated views)   | no                        |
//! | `Locked`      | yes                   | yes                       |
//! | `PerKey`      | yes                   | no                        |

pub mod expiring;
pub mod locked;
pub mod per_key;
pub mod per_thread;
pub mod unsync;

pub use expiring::ExpiringCache;
pub use locked::LockedCache;
pub use per_key::PerKeyCache;
pub use per_thread::ThreadLocalCache;
pub use unsync::UnsyncCache;
