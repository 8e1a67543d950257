//! # Emit-time routing for the event bus
//!
//! [`DeliveryPolicy`] decides whether an emitted event is delivered synchronously or
//! parked in the deferred queue, based on the reserve level sampled for the cycle.
//!
//! ```text
//! immediate flag set            ─► Deliver
//! reserve >= healthy            ─► Deliver
//! reserve <  critical           ─► Deliver only Critical, Queue the rest
//! critical <= reserve < healthy ─► Deliver Normal and above, Queue Low/Background
//! ```

use crate::policies::Priority;

/// Where an emitted event goes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route {
    /// Invoke subscribers now.
    Deliver,
    /// Park in the deferred queue until the next drain.
    Queue,
}

/// Reserve thresholds used to route emitted events.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeliveryPolicy {
    /// At or above this level everything is delivered immediately.
    pub healthy: u32,
    /// Below this level only `Critical` events are delivered immediately.
    pub critical: u32,
}

impl DeliveryPolicy {
    /// Routes an event of `priority` emitted at `reserve`.
    pub fn route(&self, priority: Priority, immediate: bool, reserve: u32) -> Route {
        if immediate || reserve >= self.healthy {
            return Route::Deliver;
        }
        let floor = if reserve < self.critical {
            Priority::Critical
        } else {
            Priority::Normal
        };
        if priority >= floor {
            Route::Deliver
        } else {
            Route::Queue
        }
    }
}
