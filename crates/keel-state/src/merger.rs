use std::ops::Deref;
use std::sync::Mutex;

use tracing::trace;

use keel_types::{ContentHash, Height};

use crate::entry::StateEntry;
use crate::error::StateError;
use crate::value::StateValue;

/// A transient accumulator combining concurrent contributions for one key
/// within one height into a single [`StateEntry`] transition.
///
/// All mutation goes through the instance's own lock, so arbitrarily many
/// contributors may call [`merge`](Self::merge) and
/// [`add_operation`](Self::add_operation) concurrently. The value is
/// last-writer-wins (callers supply fully-resolved values, not deltas);
/// operation hashes are deduplicated on insert and sorted into canonical
/// lexicographic order when the entry is closed, so the closed entry's
/// hash is independent of contribution order.
pub struct StateMerger {
    core: Mutex<MergerCore>,
}

#[derive(Default)]
struct MergerCore {
    height: Height,
    key: String,
    base: Option<StateEntry>,
    value: Option<StateValue>,
    operations: Vec<ContentHash>,
}

impl StateMerger {
    fn empty() -> Self {
        Self {
            core: Mutex::new(MergerCore::default()),
        }
    }

    fn reset(&self, height: Height, key: String, base: Option<StateEntry>) {
        let mut core = self.core.lock().expect("merger lock poisoned");
        core.height = height;
        core.key = key;
        core.base = base;
        core.value = None;
        core.operations.clear();
    }

    fn clear(&self) {
        self.reset(Height::GENESIS, String::new(), None);
    }

    pub fn height(&self) -> Height {
        self.core.lock().expect("merger lock poisoned").height
    }

    pub fn key(&self) -> String {
        self.core.lock().expect("merger lock poisoned").key.clone()
    }

    /// Replace the pending value and record the contributing operation.
    pub fn merge(&self, value: StateValue, operation: ContentHash) -> Result<(), StateError> {
        operation.ensure_valid()?;
        let mut core = self.core.lock().expect("merger lock poisoned");
        core.value = Some(value);
        if !core.operations.contains(&operation) {
            core.operations.push(operation);
        }
        Ok(())
    }

    /// Record a contributing operation without changing the pending value.
    ///
    /// Used when an operation touches the key without altering it, e.g. a
    /// no-op authorization check.
    pub fn add_operation(&self, operation: ContentHash) {
        let mut core = self.core.lock().expect("merger lock poisoned");
        if !core.operations.contains(&operation) {
            core.operations.push(operation);
        }
    }

    /// Close the accumulated contributions into a new [`StateEntry`].
    ///
    /// Fails with the ignorable [`StateError::NothingToCommit`] when no
    /// value was ever set or no operation contributed; callers treat that
    /// as "nothing to commit for this key".
    pub fn close_value(&self) -> Result<StateEntry, StateError> {
        let core = self.core.lock().expect("merger lock poisoned");
        if core.value.is_none() || core.operations.is_empty() {
            return Err(StateError::NothingToCommit);
        }

        let mut operations = core.operations.clone();
        operations.sort_unstable_by(|a, b| a.as_bytes().cmp(b.as_bytes()));

        let previous = core.base.as_ref().map(|base| *base.hash());
        let entry = StateEntry::new(
            core.height,
            core.key.clone(),
            core.value.clone(),
            previous,
            operations,
        );
        trace!(key = %entry.key(), height = %entry.height(), "state transition closed");
        Ok(entry)
    }
}

/// A pool of reusable [`StateMerger`] instances.
///
/// The pool is an explicit instance owned by the processing context and
/// threaded through calls; there is no process-wide singleton. Acquisition
/// resets the merger to the `(height, key, base)` triple; closing clears
/// every field before the instance rejoins the free list.
#[derive(Default)]
pub struct MergerPool {
    free: Mutex<Vec<StateMerger>>,
}

impl MergerPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take a merger from the pool (or allocate one), pre-initialized to
    /// the given height, key, and base state.
    pub fn acquire(
        &self,
        height: Height,
        key: impl Into<String>,
        base: Option<StateEntry>,
    ) -> PooledMerger<'_> {
        let merger = self
            .free
            .lock()
            .expect("pool lock poisoned")
            .pop()
            .unwrap_or_else(StateMerger::empty);
        merger.reset(height, key.into(), base);
        PooledMerger {
            merger: Some(merger),
            pool: self,
        }
    }

    /// Number of idle mergers in the free list.
    pub fn idle(&self) -> usize {
        self.free.lock().expect("pool lock poisoned").len()
    }

    fn release(&self, merger: StateMerger) {
        self.free.lock().expect("pool lock poisoned").push(merger);
    }
}

/// Owning guard for a pooled [`StateMerger`].
///
/// [`close`](Self::close) is the terminal call of every merge: it clears
/// the merger's fields and returns the instance to the pool. Dropping the
/// guard does the same, so a merger can never be reused without going
/// through the pool.
pub struct PooledMerger<'p> {
    merger: Option<StateMerger>,
    pool: &'p MergerPool,
}

impl PooledMerger<'_> {
    /// Clear the merger and return it to the pool.
    pub fn close(self) {
        // Drop does the work.
    }
}

impl Deref for PooledMerger<'_> {
    type Target = StateMerger;

    fn deref(&self) -> &StateMerger {
        self.merger.as_ref().expect("merger already released")
    }
}

impl Drop for PooledMerger<'_> {
    fn drop(&mut self) {
        if let Some(merger) = self.merger.take() {
            merger.clear();
            self.pool.release(merger);
        }
    }
}
