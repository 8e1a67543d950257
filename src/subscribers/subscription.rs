//! Subscription options, ids and the unsubscribe capability.

use std::cell::RefCell;
use std::fmt;
use std::rc::Weak;

use crate::events::bus::BusState;
use crate::policies::Priority;

/// Identifier of one subscription, unique within a bus.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub(crate) u64);

impl SubscriptionId {
    /// Raw numeric id.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Options for [`EventBus::on`](crate::EventBus::on).
///
/// ## Field semantics
/// - `priority`: delivery order among handlers of one event (tier desc, then registration)
/// - `min_reserve`: the handler is skipped while the reserve is below this level
/// - `once`: the subscription is removed right before its first invocation
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SubscribeOptions {
    /// Delivery tier.
    pub priority: Priority,
    /// Optional reserve gate for this handler.
    pub min_reserve: Option<u32>,
    /// One-shot subscription.
    pub once: bool,
}

impl SubscribeOptions {
    /// `Normal`, ungated, persistent.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns options with updated priority.
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Returns options gated on `min_reserve`.
    pub fn with_min_reserve(mut self, min_reserve: u32) -> Self {
        self.min_reserve = Some(min_reserve);
        self
    }

    /// Returns one-shot options.
    pub fn one_shot(mut self) -> Self {
        self.once = true;
        self
    }
}

/// Removes its subscription when [`unsubscribe`](Unsubscribe::unsubscribe) is called.
///
/// Dropping the handle does **not** unsubscribe. Calling `unsubscribe` more than
/// once, after the subscription fired as `once`, or after the bus was dropped is a no-op.
#[derive(Clone)]
pub struct Unsubscribe {
    id: SubscriptionId,
    state: Weak<RefCell<BusState>>,
}

impl Unsubscribe {
    pub(crate) fn new(id: SubscriptionId, state: Weak<RefCell<BusState>>) -> Self {
        Self { id, state }
    }

    /// Id of the subscription this handle controls.
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Removes the subscription; returns `false` if it was already gone.
    pub fn unsubscribe(&self) -> bool {
        let Some(state) = self.state.upgrade() else {
            return false;
        };
        let removed = state.borrow_mut().subscribers.remove(self.id);
        removed
    }
}

impl fmt::Debug for Unsubscribe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Unsubscribe").field("id", &self.id).finish()
    }
}
