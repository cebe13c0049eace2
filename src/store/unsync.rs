//! Unsynchronized single-map backend.
//!
//! ## Architecture
//! - States live in a `RefCell<FxHashMap<K, ResultState<V, E>>>`.
//! - Writing Absent deletes the entry; reading an unknown key returns Absent
//!   without inserting anything.
//! - `read_and_transform` is the trait default: read, release the borrow,
//!   then call `f`. Nothing prevents another write between the two, which is
//!   fine because the type is not `Sync` and can only be reached from one
//!   thread.
//!
//! ## Example Usage
//! ```rust
//! use memokit::store::UnsyncCache;
//! use memokit::traits::Cache;
//!
//! let cache: UnsyncCache<u64, String, ()> = UnsyncCache::new();
//! cache.save_value(&1, "a".to_string());
//! assert!(cache.has_value(&1));
//! assert_eq!(cache.len(), 1);
//! ```

use std::cell::RefCell;
use std::fmt;
use std::hash::Hash;

use rustc_hash::FxHashMap;

use crate::state::ResultState;
use crate::traits::Cache;

/// Single-threaded key → state table.
pub struct UnsyncCache<K, V, E> {
    table: RefCell<FxHashMap<K, ResultState<V, E>>>,
}

impl<K, V, E> UnsyncCache<K, V, E> {
    pub fn new() -> Self {
        Self {
            table: RefCell::new(FxHashMap::default()),
        }
    }

    /// Number of keys with a recorded state.
    pub fn len(&self) -> usize {
        self.table.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn clear(&self) {
        self.table.borrow_mut().clear();
    }
}

impl<K, V, E> Default for UnsyncCache<K, V, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, E> fmt::Debug for UnsyncCache<K, V, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnsyncCache")
            .field("len", &self.len())
            .finish()
    }
}

impl<K, V, E> Cache<K, V, E> for UnsyncCache<K, V, E>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn reset(&self) {
        self.clear();
    }

    fn write_state(&self, key: &K, state: ResultState<V, E>) {
        let mut table = self.table.borrow_mut();
        if state.is_absent() {
            table.remove(key);
        } else {
            table.insert(key.clone(), state);
        }
    }

    fn read_state(&self, key: &K) -> ResultState<V, E> {
        self.table.borrow().get(key).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn unsync_basic_ops() {
        let cache: UnsyncCache<&str, u32, String> = UnsyncCache::new();
        assert!(!cache.has_value(&"k"));
        cache.save_value(&"k", 1);
        assert_eq!(cache.get_value(&"k").unwrap(), 1);
        cache.save_value(&"k", 2);
        assert_eq!(cache.get_value(&"k").unwrap(), 2);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn reading_does_not_grow_the_table() {
        let cache: UnsyncCache<u32, u32, ()> = UnsyncCache::new();
        assert!(cache.read_state(&5).is_absent());
        assert!(!cache.has_value(&6));
        assert!(cache.is_empty());
    }

    #[test]
    fn forget_deletes_entry() {
        let cache: UnsyncCache<u32, u32, ()> = UnsyncCache::new();
        cache.save_value(&1, 10);
        cache.forget(&1);
        assert!(cache.is_empty());
        cache.forget(&1);
        assert!(cache.is_empty());
    }

    #[test]
    fn callback_may_write_same_key() {
        let cache: UnsyncCache<u32, u32, ()> = UnsyncCache::new();
        let got = cache.read_and_transform(&1, |state| {
            assert!(state.is_absent());
            cache.save_value(&1, 99);
            7
        });
        assert_eq!(got, 7);
        assert_eq!(cache.get_value(&1).unwrap(), 99);
    }

    #[test]
    fn reset_clears_everything() {
        let cache: UnsyncCache<u32, u32, &str> = UnsyncCache::new();
        cache.save_value(&1, 1);
        cache.save_error(&2, Arc::new("x"));
        cache.reset();
        assert!(!cache.has_value(&1));
        assert!(!cache.has_value(&2));
    }
}
