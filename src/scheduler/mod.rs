//! Periodic task scheduler.
//!
//! - [`Scheduler`] registry handle and the per-cycle pass
//! - [`TickReport`] what one pass executed, skipped, deferred or saw fail
//! - [`TaskInfo`] read-only task descriptor

mod registry;
mod report;
#[allow(clippy::module_inception)]
mod scheduler;

pub use report::{TaskInfo, TickReport};
pub use scheduler::Scheduler;
