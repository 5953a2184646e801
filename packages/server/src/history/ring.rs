//! Fixed-capacity circular buffer of chat messages.
//!
//! Invariants, for capacity `N`:
//!
//! - `count <= N`
//! - `idx == (head + count) % N`
//! - the `count` slots starting at `head` (wrapping) are populated, all others are empty

use std::num::NonZeroUsize;

use ringchat_shared::Message;

use crate::storage::PersistedHistory;

/// Circular message buffer, oldest entry at `head`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRing {
    slots: Vec<Option<Message>>,
    head: usize,
    idx: usize,
    count: usize,
}

impl MessageRing {
    /// Empty ring with room for `capacity` messages.
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            slots: vec![None; capacity.get()],
            head: 0,
            idx: 0,
            count: 0,
        }
    }

    /// Rebuild a ring from its persisted image.
    ///
    /// A consistent image of the same capacity is restored slot for slot, with
    /// `count` recomputed from the populated slots. Anything else is replayed
    /// oldest → newest into a fresh ring, which keeps the newest `capacity` messages.
    pub fn restore(state: PersistedHistory, capacity: NonZeroUsize) -> Self {
        if is_consistent(&state, capacity) {
            let count = state.populated();
            return Self {
                slots: state.slots,
                head: state.head,
                idx: state.idx,
                count,
            };
        }

        tracing::warn!(
            "Persisted history is inconsistent with capacity {} (head={}, idx={}, slots={}); re-linearising",
            capacity,
            state.head,
            state.idx,
            state.slots.len()
        );
        let mut ring = Self::new(capacity);
        for message in state.ordered_messages() {
            ring.push(message);
        }
        ring
    }

    /// Append `message`, evicting the oldest entry when full.
    pub fn push(&mut self, message: Message) {
        let capacity = self.capacity();
        if self.count == capacity {
            self.head = (self.head + 1) % capacity;
        }
        self.slots[self.idx] = Some(message);
        self.idx = (self.idx + 1) % capacity;
        if self.count < capacity {
            self.count += 1;
        }
    }

    /// Valid messages in insertion order, oldest first.
    pub fn snapshot(&self) -> Vec<Message> {
        self.iter().cloned().collect()
    }

    /// Iterate valid messages in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Message> + '_ {
        let capacity = self.capacity();
        (0..self.count).filter_map(move |offset| self.slots[(self.head + offset) % capacity].as_ref())
    }

    /// Image of the ring for persistence.
    pub fn to_persisted(&self) -> PersistedHistory {
        PersistedHistory {
            head: self.head,
            idx: self.idx,
            slots: self.slots.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn is_full(&self) -> bool {
        self.count == self.capacity()
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn head(&self) -> usize {
        self.head
    }

    pub fn idx(&self) -> usize {
        self.idx
    }
}

fn is_consistent(state: &PersistedHistory, capacity: NonZeroUsize) -> bool {
    let capacity = capacity.get();
    if state.slots.len() != capacity || state.head >= capacity || state.idx >= capacity {
        return false;
    }
    let count = state.populated();
    state.idx == (state.head + count) % capacity
        && (0..count).all(|offset| state.slots[(state.head + offset) % capacity].is_some())
}
