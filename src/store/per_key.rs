//! Per-key lock backend.
//!
//! ## Architecture
//!
//! ```text
//!   slots: Mutex<FxHashMap<K, Arc<Slot>>>      (held only to find/create)
//!                 │
//!       ┌─────────┼─────────┐
//!       ▼         ▼         ▼
//!     Slot      Slot      Slot                  Slot = ReentrantMutex<
//!    (key a)   (key b)   (key c)                         RefCell<ResultState>>
//! ```
//!
//! - The table mutex guards only lookup and insertion of slots; it is never
//!   held while a slot is locked or while a callback runs.
//! - `read_state`, `write_state` and `read_and_transform` lock only the slot
//!   of their key, so operations on different keys never block each other.
//! - Slot locks are re-entrant: a `read_and_transform` callback may write the
//!   key it is holding.
//! - Reads of unknown keys and Absent writes to unknown keys do not create
//!   slots. Once created, a slot stays in the table until `reset`, even when
//!   its state goes back to Absent.
//!
//! ## Reset Contract
//!
//! `reset` detaches every slot from the table in one step. An operation that
//! already holds (or has looked up) a detached slot completes against that
//! orphaned slot: its effects are not visible afterwards, and it does not
//! observe the reset. Operations started after `reset` see fresh slots.

use std::cell::RefCell;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::{Mutex, ReentrantMutex};
use rustc_hash::FxHashMap;

use crate::state::ResultState;
use crate::traits::Cache;

type Slot<V, E> = ReentrantMutex<RefCell<ResultState<V, E>>>;

/// Thread-safe cache with an independent lock per key.
pub struct PerKeyCache<K, V, E> {
    slots: Mutex<FxHashMap<K, Arc<Slot<V, E>>>>,
}

impl<K, V, E> PerKeyCache<K, V, E> {
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(FxHashMap::default()),
        }
    }

    /// Number of slots currently attached to the table.
    ///
    /// Includes slots whose state went back to Absent.
    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K, V, E> PerKeyCache<K, V, E>
where
    K: Eq + Hash + Clone,
{
    /// Looks up the slot for `key` without creating it.
    fn existing_slot(&self, key: &K) -> Option<Arc<Slot<V, E>>> {
        self.slots.lock().get(key).cloned()
    }

    /// Looks up the slot for `key`, creating an Absent one if needed.
    fn slot(&self, key: &K) -> Arc<Slot<V, E>> {
        let mut slots = self.slots.lock();
        if let Some(slot) = slots.get(key) {
            return Arc::clone(slot);
        }
        let slot = Arc::new(ReentrantMutex::new(RefCell::new(ResultState::Absent)));
        slots.insert(key.clone(), Arc::clone(&slot));
        slot
    }
}

impl<K, V, E> Default for PerKeyCache<K, V, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, E> fmt::Debug for PerKeyCache<K, V, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PerKeyCache")
            .field("slots", &self.len())
            .finish()
    }
}

impl<K, V, E> Cache<K, V, E> for PerKeyCache<K, V, E>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn reset(&self) {
        let detached = std::mem::take(&mut *self.slots.lock());
        tracing::debug!(dropped = detached.len(), "per-key cache reset");
    }

    fn write_state(&self, key: &K, state: ResultState<V, E>) {
        let slot = if state.is_absent() {
            match self.existing_slot(key) {
                Some(slot) => slot,
                None => return,
            }
        } else {
            self.slot(key)
        };
        let guard = slot.lock();
        guard.replace(state);
    }

    fn read_state(&self, key: &K) -> ResultState<V, E> {
        let Some(slot) = self.existing_slot(key) else {
            return ResultState::Absent;
        };
        let guard = slot.lock();
        let state = guard.borrow().clone();
        state
    }

    fn read_and_transform<R, F>(&self, key: &K, f: F) -> R
    where
        F: FnOnce(ResultState<V, E>) -> R,
    {
        let slot = self.slot(key);
        let guard = slot.lock();
        let state = guard.borrow().clone();
        let out = f(state);
        drop(guard);
        out
    }
}
