//! # Task registry keyed by id, ordered by registration.
//!
//! ## Rules
//! - Every new id receives a monotonically increasing sequence number; iteration
//!   follows that sequence, which is the scheduler's tie-break inside a tier.
//! - Re-registering an existing id replaces the definition **in place** (same
//!   sequence number) and resets its timing state.
//! - Every insert, new or replacing, stamps the entry with a fresh generation;
//!   a pass holding an older generation must not run or time the new definition.
//! - Removing a missing id is a no-op.

use std::collections::{BTreeMap, HashMap};

use crate::policies::Priority;
use crate::tasks::TaskSpec;

/// One registered task and its timing state.
#[derive(Clone, Debug)]
pub(crate) struct Entry {
    pub(crate) generation: u64,
    pub(crate) spec: TaskSpec,
    pub(crate) last_run: Option<u64>,
}

impl Entry {
    /// A task that never ran is due; otherwise it is due once `interval` cycles passed.
    pub(crate) fn is_due(&self, cycle: u64) -> bool {
        match self.last_run {
            None => true,
            Some(last) => cycle.saturating_sub(last) >= self.spec.interval(),
        }
    }
}

/// A due task captured at the start of a scheduler pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct DueTask {
    pub(crate) id: String,
    pub(crate) generation: u64,
    pub(crate) priority: Priority,
}

#[derive(Debug, Default)]
pub(crate) struct TaskRegistry {
    entries: BTreeMap<u64, Entry>,
    index: HashMap<String, u64>,
    next_seq: u64,
    next_generation: u64,
}

impl TaskRegistry {
    /// Inserts or replaces by id. Returns `true` if an existing definition was replaced.
    pub(crate) fn insert(&mut self, spec: TaskSpec) -> bool {
        let generation = self.next_generation;
        self.next_generation += 1;
        if let Some(seq) = self.index.get(spec.name()).copied() {
            if let Some(entry) = self.entries.get_mut(&seq) {
                entry.generation = generation;
                entry.spec = spec;
                entry.last_run = None;
                return true;
            }
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.index.insert(spec.name().to_string(), seq);
        self.entries.insert(
            seq,
            Entry {
                generation,
                spec,
                last_run: None,
            },
        );
        false
    }

    pub(crate) fn remove(&mut self, id: &str) -> bool {
        match self.index.remove(id) {
            Some(seq) => self.entries.remove(&seq).is_some(),
            None => false,
        }
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
    }

    pub(crate) fn get(&self, id: &str) -> Option<&Entry> {
        self.index.get(id).and_then(|seq| self.entries.get(seq))
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut Entry> {
        let seq = self.index.get(id)?;
        self.entries.get_mut(seq)
    }

    pub(crate) fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Entries in registration order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.entries.values()
    }

    /// Due tasks in execution order: tier descending, then registration order.
    pub(crate) fn due(&self, cycle: u64) -> Vec<DueTask> {
        let mut due: Vec<DueTask> = self
            .entries
            .values()
            .filter(|e| e.is_due(cycle))
            .map(|e| DueTask {
                id: e.spec.name().to_string(),
                generation: e.generation,
                priority: e.spec.priority(),
            })
            .collect();
        // stable: keeps registration order inside a tier
        due.sort_by_key(|d| d.priority.index());
        due
    }
}
