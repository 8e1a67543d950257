//! Priority and admission policies.
//!
//! This module groups the knobs that decide **whether** a unit of work may start
//! this cycle and **in which order** work is considered.
//!
//! ## Contents
//! - [`Priority`], [`TierThresholds`], [`TierCounts`] the tier model shared by both subsystems
//! - [`AdmissionWindow`] reserve and budget gates for scheduled tasks
//! - [`DeliveryPolicy`] immediate-vs-queued routing for emitted events
//!
//! ## Quick wiring
//! ```text
//! Scheduler::run(budget)
//!      └─► AdmissionWindow::evaluate(task) → Admit | Skip | Defer
//! EventBus::emit(event)
//!      └─► DeliveryPolicy::route(priority, immediate, reserve) → Deliver | Queue
//! ```

mod admission;
mod delivery;
mod priority;

pub use admission::{Admission, AdmissionRequest, AdmissionWindow};
pub use delivery::{DeliveryPolicy, Route};
pub use priority::{Priority, TierCounts, TierThresholds};
