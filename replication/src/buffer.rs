//! Newest-first history of received states.

use std::collections::VecDeque;
use std::num::NonZeroUsize;

use crate::config::SyncConfig;
use crate::state::TransformState;

/// Identifies one buffered entry for as long as it stays in the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(u64);

/// Result of [`StateBuffer::add_state`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// Stored at the head.
    Inserted,
    /// Not newer than the head; the buffer is unchanged.
    Stale,
}

#[derive(Debug, Clone)]
struct Entry {
    id: EntryId,
    state: TransformState,
}

/// Fixed-capacity, newest-first buffer of received states.
///
/// Index 0 is the newest state. When full, inserting drops the oldest entry.
#[derive(Debug, Clone)]
pub struct StateBuffer {
    entries: VecDeque<Entry>,
    capacity: NonZeroUsize,
    next_id: u64,
}

impl StateBuffer {
    #[must_use]
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.get()),
            capacity,
            next_id: 0,
        }
    }

    /// Buffer sized by [`SyncConfig::buffer_capacity`].
    #[must_use]
    pub fn with_config(config: &SyncConfig) -> Self {
        Self::new(config.buffer_capacity())
    }

    /// Adds a regular state at the head.
    ///
    /// Once two or more states are buffered, a state whose timestamp is not
    /// newer than the head is rejected.
    pub fn add_state(&mut self, state: TransformState) -> AddOutcome {
        if let Some(head) = self.newest() {
            if self.entries.len() > 1 && state.owner_timestamp <= head.owner_timestamp {
                return AddOutcome::Stale;
            }
        }
        self.evict_if_full();
        let entry = self.entry(state);
        self.entries.push_front(entry);
        AddOutcome::Inserted
    }

    /// Adds a teleport state at its sorted position. Returns its index.
    ///
    /// Teleports are never rejected. A teleport into an empty buffer is stored
    /// twice so interpolation always has a pair to work with.
    pub fn add_teleport_state(&mut self, state: TransformState) -> usize {
        let was_empty = self.entries.is_empty();
        let newest = self
            .newest()
            .map_or(true, |head| state.owner_timestamp >= head.owner_timestamp);
        if newest {
            self.evict_if_full();
            let entry = self.entry(state);
            self.entries.push_front(entry);
            if was_empty {
                let copy = self.entry(state);
                self.entries.push_front(copy);
            }
            return 0;
        }

        // Newest-first, so everything up to the last newer entry stays ahead.
        let newer = self
            .entries
            .iter()
            .rposition(|entry| entry.state.owner_timestamp > state.owner_timestamp)
            .map_or(0, |index| index + 1);
        self.evict_if_full();
        let index = newer.min(self.entries.len());
        let entry = self.entry(state);
        self.entries.insert(index, entry);
        index
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub const fn capacity(&self) -> NonZeroUsize {
        self.capacity
    }

    #[must_use]
    pub fn newest(&self) -> Option<&TransformState> {
        self.get(0)
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&TransformState> {
        self.entries.get(index).map(|entry| &entry.state)
    }

    /// Identity of the entry at `index`.
    #[must_use]
    pub fn id_at(&self, index: usize) -> Option<EntryId> {
        self.entries.get(index).map(|entry| entry.id)
    }

    /// Current index of a previously observed entry, if still buffered.
    #[must_use]
    pub fn index_of(&self, id: EntryId) -> Option<usize> {
        self.entries.iter().position(|entry| entry.id == id)
    }

    /// States from newest to oldest.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &TransformState> + '_ {
        self.entries.iter().map(|entry| &entry.state)
    }

    fn evict_if_full(&mut self) {
        if self.entries.len() >= self.capacity.get() {
            self.entries.pop_back();
        }
    }

    fn entry(&mut self, state: TransformState) -> Entry {
        let id = EntryId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        Entry { id, state }
    }
}
