//! Bus events and the reserve-aware event bus.
//!
//! ## Contents
//! - [`BusEvent`], [`EmitOptions`], [`EmitOutcome`] event record and routing result
//! - [`EventBus`] subscriber registry, immediate delivery and the deferred queue
//! - [`BusStats`], [`DrainReport`] cumulative counters and per-drain results
//!
//! ## Quick reference
//! - **Publishers**: task bodies, handlers, host code (`EventBus::emit`)
//! - **Consumers**: handlers registered with `EventBus::on` / `EventBus::once`
//! - **Drain**: `EventBus::process_queue`, once per cycle (done by `Kernel::run_cycle`)

pub(crate) mod bus;
mod event;
mod queue;
mod stats;

pub use bus::EventBus;
pub use event::{BusEvent, EmitOptions, EmitOutcome};
pub use stats::{BusStats, DrainReport};
