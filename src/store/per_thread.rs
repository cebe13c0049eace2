//! Per-thread isolated backend.
//!
//! Every thread that touches a [`ThreadLocalCache`] gets its own
//! [`UnsyncCache`], created lazily on first access. No thread ever observes
//! another thread's writes, so no locking is involved; `reset` clears only
//! the calling thread's table.
//!
//! Tables are owned by the cache instance (via `thread_local::ThreadLocal`),
//! not by a process-wide `thread_local!`, so two `ThreadLocalCache`s never
//! share state and a table is freed when its cache is dropped.
//!
//! `ThreadLocal` hands the slot of an exited thread to the next thread that
//! receives the same internal id. Each table therefore records the
//! [`ThreadId`] of its owner (never reused by std) and is cleared before a
//! different thread adopts it.

use std::cell::Cell;
use std::fmt;
use std::hash::Hash;
use std::thread::{self, ThreadId};

use thread_local::ThreadLocal;

use crate::state::ResultState;
use crate::store::unsync::UnsyncCache;
use crate::traits::Cache;

/// One thread's table, tagged with the thread that owns it.
struct OwnedTable<K, V, E> {
    owner: Cell<ThreadId>,
    cache: UnsyncCache<K, V, E>,
}

/// Cache whose contents are private to each thread.
pub struct ThreadLocalCache<K, V, E>
where
    K: Send,
    V: Send,
    E: Send + Sync,
{
    tables: ThreadLocal<OwnedTable<K, V, E>>,
}

impl<K, V, E> ThreadLocalCache<K, V, E>
where
    K: Send,
    V: Send,
    E: Send + Sync,
{
    pub fn new() -> Self {
        Self {
            tables: ThreadLocal::new(),
        }
    }

    /// The calling thread's table, if one exists and belongs to it.
    fn owned(&self) -> Option<&UnsyncCache<K, V, E>> {
        let table = self.tables.get()?;
        (table.owner.get() == thread::current().id()).then_some(&table.cache)
    }

    /// The calling thread's table, created or taken over as needed.
    fn local(&self) -> &UnsyncCache<K, V, E> {
        let me = thread::current().id();
        let table = self.tables.get_or(|| OwnedTable {
            owner: Cell::new(me),
            cache: UnsyncCache::new(),
        });
        if table.owner.get() != me {
            tracing::trace!(stale = table.cache.len(), "clearing table left by exited thread");
            table.cache.clear();
            table.owner.set(me);
        }
        &table.cache
    }

    /// Number of keys recorded by the calling thread.
    pub fn local_len(&self) -> usize {
        self.owned().map_or(0, UnsyncCache::len)
    }
}

impl<K, V, E> Default for ThreadLocalCache<K, V, E>
where
    K: Send,
    V: Send,
    E: Send + Sync,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, E> fmt::Debug for ThreadLocalCache<K, V, E>
where
    K: Send,
    V: Send,
    E: Send + Sync,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadLocalCache")
            .field("local_len", &self.local_len())
            .finish()
    }
}

impl<K, V, E> Cache<K, V, E> for ThreadLocalCache<K, V, E>
where
    K: Eq + Hash + Clone + Send,
    V: Clone + Send,
    E: Send + Sync,
{
    fn reset(&self) {
        if let Some(table) = self.tables.get() {
            table.cache.clear();
        }
    }

    fn write_state(&self, key: &K, state: ResultState<V, E>) {
        self.local().write_state(key, state);
    }

    fn read_state(&self, key: &K) -> ResultState<V, E> {
        self.local().read_state(key)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    #[test]
    fn thread_local_basic_ops() {
        let cache: ThreadLocalCache<u32, String, ()> = ThreadLocalCache::new();
        assert!(!cache.has_value(&1));
        cache.save_value(&1, "a".to_string());
        assert_eq!(cache.get_value(&1).unwrap(), "a");
        assert_eq!(cache.local_len(), 1);
    }

    #[test]
    fn other_thread_sees_nothing() {
        let cache: Arc<ThreadLocalCache<u32, u32, ()>> = Arc::new(ThreadLocalCache::new());
        cache.save_value(&1, 10);

        let remote = Arc::clone(&cache);
        let seen = thread::spawn(move || remote.has_value(&1)).join().unwrap();

        assert!(!seen);
        assert!(cache.has_value(&1));
    }

    #[test]
    fn reset_only_affects_calling_thread() {
        let cache: Arc<ThreadLocalCache<u32, u32, ()>> = Arc::new(ThreadLocalCache::new());
        cache.save_value(&1, 10);

        let remote = Arc::clone(&cache);
        thread::spawn(move || {
            remote.save_value(&1, 20);
            remote.reset();
            assert!(!remote.has_value(&1));
        })
        .join()
        .unwrap();

        assert_eq!(cache.get_value(&1).unwrap(), 10);
    }

    #[test]
    fn later_thread_does_not_inherit_exited_thread_table() {
        let cache: Arc<ThreadLocalCache<u32, u32, ()>> = Arc::new(ThreadLocalCache::new());

        for round in 0..8 {
            let writer = Arc::clone(&cache);
            thread::spawn(move || writer.save_value(&1, round))
                .join()
                .unwrap();

            let reader = Arc::clone(&cache);
            let seen = thread::spawn(move || (reader.local_len(), reader.get_value(&1).ok()))
                .join()
                .unwrap();
            assert_eq!(seen, (0, None), "round {round}");
        }
    }

    #[test]
    fn separate_instances_do_not_share() {
        let a: ThreadLocalCache<u32, u32, ()> = ThreadLocalCache::new();
        let b: ThreadLocalCache<u32, u32, ()> = ThreadLocalCache::new();
        a.save_value(&1, 1);
        assert!(!b.has_value(&1));
    }
}
