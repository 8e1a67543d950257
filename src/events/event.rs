//! # Bus events and emit options.
//!
//! A [`BusEvent`] has a fixed core (`name`, `priority`, `cycle`) and a separate
//! `metadata` value owned by the caller. The cycle stamp is filled in by
//! [`EventBus::emit`](crate::EventBus::emit), so caller data can never shadow it.
//!
//! ## Example
//! ```rust
//! use cyclevisor::{EmitOptions, Priority};
//!
//! let opts = EmitOptions::new().with_priority(Priority::Low);
//! assert!(!opts.immediate);
//!
//! let urgent = EmitOptions::new().immediate();
//! assert!(urgent.immediate);
//! assert_eq!(urgent.priority, Priority::Normal);
//! ```

use std::rc::Rc;

use serde_json::Value;

use crate::policies::Priority;

/// Event as seen by handlers.
#[derive(Clone, Debug, PartialEq)]
pub struct BusEvent {
    /// Event name handlers subscribe to.
    pub name: Rc<str>,
    /// Tier used for routing and queue order.
    pub priority: Priority,
    /// Cycle in which the event was emitted.
    pub cycle: u64,
    /// Caller-supplied data (`Value::Null` when none).
    pub metadata: Value,
}

impl BusEvent {
    pub(crate) fn new(name: &str, priority: Priority, cycle: u64, metadata: Value) -> Self {
        Self {
            name: Rc::from(name),
            priority,
            cycle,
            metadata,
        }
    }

    /// Looks up a top-level metadata field.
    #[inline]
    pub fn meta(&self, key: &str) -> Option<&Value> {
        self.metadata.get(key)
    }
}

/// Options for [`EventBus::emit`](crate::EventBus::emit).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EmitOptions {
    /// Deliver now regardless of reserve.
    pub immediate: bool,
    /// Event tier.
    pub priority: Priority,
}

impl EmitOptions {
    /// `Normal`, not immediate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns options that bypass reserve-based routing.
    pub fn immediate(mut self) -> Self {
        self.immediate = true;
        self
    }

    /// Returns options with updated priority.
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }
}

/// What [`EventBus::emit`](crate::EventBus::emit) did with an event.
#[derive(Clone, Debug, PartialEq)]
pub enum EmitOutcome {
    /// Delivered synchronously.
    Delivered {
        /// Handlers invoked, failing ones included; reserve-gated ones are not.
        invoked: usize,
    },
    /// Stored in the deferred queue.
    Queued,
    /// Stored in the deferred queue after evicting an older event.
    QueuedWithEviction {
        /// The event that made room.
        evicted: BusEvent,
    },
}

impl EmitOutcome {
    /// Returns `true` if the event reached its handlers during `emit`.
    #[inline]
    pub fn is_delivered(&self) -> bool {
        matches!(self, EmitOutcome::Delivered { .. })
    }

    /// Returns `true` if the event waits in the queue.
    #[inline]
    pub fn is_queued(&self) -> bool {
        !self.is_delivered()
    }
}
