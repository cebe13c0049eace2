pub use crate::builder::{Backend, MemoCache, MemoizeOptions};
pub use crate::error::{CacheError, ConfigError};
pub use crate::key::{Args, CallArgs, CallKey, Freeze, Frozen, Receiver};
pub use crate::memo::{memoize, BoundMemoizer, Memoizer, MethodMemoizer};
#[cfg(feature = "metrics")]
pub use crate::metrics::MemoMetricsSnapshot;
pub use crate::state::ResultState;
pub use crate::store::{ExpiringCache, LockedCache, PerKeyCache, ThreadLocalCache, UnsyncCache};
pub use crate::traits::Cache;
