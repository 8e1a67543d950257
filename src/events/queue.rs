//! # Bounded, tier-ordered queue of deferred events.
//!
//! One FIFO per tier; `pop_highest` drains `Critical` first, oldest first
//! within a tier.
//!
//! ```text
//! push (len == capacity)
//!   └─► evict front of the lowest non-empty tier ─► push_back new entry
//!
//! purge_stale(now, max_age)
//!   └─► drop every entry with now - enqueued > max_age
//! ```

use std::collections::VecDeque;

use crate::events::BusEvent;

/// An event waiting in the queue.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct QueuedEvent {
    pub(crate) event: BusEvent,
    pub(crate) enqueued: u64,
}

impl QueuedEvent {
    #[inline]
    pub(crate) fn age(&self, now: u64) -> u64 {
        now.saturating_sub(self.enqueued)
    }
}

#[derive(Debug, Default)]
pub(crate) struct DeferredQueue {
    tiers: [VecDeque<QueuedEvent>; 5],
    len: usize,
}

impl DeferredQueue {
    /// Appends `entry`; when full, first evicts and returns the oldest entry of the
    /// lowest non-empty tier.
    pub(crate) fn push(&mut self, entry: QueuedEvent, capacity: usize) -> Option<QueuedEvent> {
        let evicted = if self.len >= capacity {
            self.evict_lowest()
        } else {
            None
        };
        self.tiers[entry.event.priority.index()].push_back(entry);
        self.len += 1;
        evicted
    }

    /// Removes the oldest entry of the highest non-empty tier.
    pub(crate) fn pop_highest(&mut self) -> Option<QueuedEvent> {
        let entry = self.tiers.iter_mut().find_map(|tier| tier.pop_front())?;
        self.len -= 1;
        Some(entry)
    }

    /// Drops entries older than `max_age` cycles; returns how many were dropped.
    pub(crate) fn purge_stale(&mut self, now: u64, max_age: u64) -> usize {
        let before = self.len;
        for tier in &mut self.tiers {
            tier.retain(|e| e.age(now) <= max_age);
        }
        self.len = self.tiers.iter().map(VecDeque::len).sum();
        before - self.len
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn clear(&mut self) {
        self.tiers.iter_mut().for_each(|tier| tier.clear());
        self.len = 0;
    }

    fn evict_lowest(&mut self) -> Option<QueuedEvent> {
        let entry = self.tiers.iter_mut().rev().find_map(|tier| tier.pop_front())?;
        self.len -= 1;
        Some(entry)
    }
}
