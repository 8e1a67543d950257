//! # SubscriberSet: per-event handler lists in delivery order.
//!
//! [`SubscriberSet`] keeps, for every event name, the subscriptions sorted by tier
//! (descending) and then by registration order, plus an id index so a single
//! subscription can be removed without knowing its event name.
//!
//! ## Rules
//! - Ids are never reused within a set.
//! - `snapshot` clones the list; delivery iterates the clone and re-checks
//!   membership with `contains` before each invocation.

use std::collections::HashMap;

use crate::policies::Priority;
use crate::subscribers::subscriber::HandlerRef;
use crate::subscribers::subscription::{SubscribeOptions, SubscriptionId};

/// One registered handler.
#[derive(Clone)]
pub(crate) struct Subscription {
    pub(crate) id: SubscriptionId,
    pub(crate) priority: Priority,
    pub(crate) min_reserve: Option<u32>,
    pub(crate) once: bool,
    pub(crate) handler: HandlerRef,
}

#[derive(Default)]
pub(crate) struct SubscriberSet {
    by_name: HashMap<String, Vec<Subscription>>,
    names: HashMap<SubscriptionId, String>,
    next_id: u64,
}

impl SubscriberSet {
    pub(crate) fn insert(
        &mut self,
        name: &str,
        handler: HandlerRef,
        opts: SubscribeOptions,
    ) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        let list = self.by_name.entry(name.to_string()).or_default();
        // after every handler of the same or a higher tier
        let at = list.partition_point(|s| s.priority.index() <= opts.priority.index());
        list.insert(
            at,
            Subscription {
                id,
                priority: opts.priority,
                min_reserve: opts.min_reserve,
                once: opts.once,
                handler,
            },
        );
        self.names.insert(id, name.to_string());
        id
    }

    pub(crate) fn remove(&mut self, id: SubscriptionId) -> bool {
        let Some(name) = self.names.remove(&id) else {
            return false;
        };
        if let Some(list) = self.by_name.get_mut(&name) {
            list.retain(|s| s.id != id);
            if list.is_empty() {
                self.by_name.remove(&name);
            }
        }
        true
    }

    /// Removes every handler of `name`; returns how many were removed.
    pub(crate) fn remove_all(&mut self, name: &str) -> usize {
        let Some(list) = self.by_name.remove(name) else {
            return 0;
        };
        for s in &list {
            self.names.remove(&s.id);
        }
        list.len()
    }

    pub(crate) fn snapshot(&self, name: &str) -> Vec<Subscription> {
        self.by_name.get(name).cloned().unwrap_or_default()
    }

    pub(crate) fn contains(&self, id: SubscriptionId) -> bool {
        self.names.contains_key(&id)
    }

    pub(crate) fn count(&self, name: &str) -> usize {
        self.by_name.get(name).map_or(0, Vec::len)
    }

    pub(crate) fn total(&self) -> usize {
        self.names.len()
    }

    pub(crate) fn clear(&mut self) {
        self.by_name.clear();
        self.names.clear();
    }
}
