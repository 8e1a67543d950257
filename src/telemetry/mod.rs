//! Telemetry: kernel snapshots and the built-in log reporter.
//!
//! - [`TelemetrySnapshot`] combines the last scheduler pass with the bus counters
//! - `LogReporter` logs snapshots periodically (feature `logging`)

#[cfg(feature = "logging")]
mod log;
mod snapshot;

#[cfg(feature = "logging")]
pub use log::{LOG_REPORTER_TASK, LogReporter};
pub use snapshot::{TelemetrySnapshot, TickSummary};
