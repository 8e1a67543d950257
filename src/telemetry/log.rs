//! # LogReporter: periodic telemetry logger.
//!
//! Registers a `Background` task that logs the kernel's [`TelemetrySnapshot`]
//! with `tracing::info!` every `interval` cycles. Being `Background`, it only runs
//! while the reserve is healthy, and it stops by itself once the kernel is dropped.
//!
//! ## Example output
//! ```text
//! INFO cyclevisor::telemetry::log: telemetry cycle=40 reserve=9100 tasks=6 executed=4 skipped=0 deferred=1 failed=1 events_emitted=12 events_processed=11 queued=1 dropped=0 handlers=3
//! ```

use tracing::info;

use crate::core::{Kernel, WeakKernel};
use crate::error::{RegistrationError, WorkError};
use crate::policies::Priority;
use crate::tasks::{TaskFn, TaskSpec};
use crate::telemetry::TelemetrySnapshot;

/// Task id used by [`LogReporter::install`].
pub const LOG_REPORTER_TASK: &str = "telemetry.log";

/// Telemetry log writer.
#[derive(Debug, Default)]
pub struct LogReporter;

impl LogReporter {
    /// Registers the reporter task on `kernel`, replacing a previous installation.
    ///
    /// ### Errors
    /// [`RegistrationError::InvalidInterval`] if `interval` is `0`.
    pub fn install(kernel: &Kernel, interval: u64) -> Result<(), RegistrationError> {
        let weak = kernel.downgrade();
        let task = TaskFn::rc(LOG_REPORTER_TASK, move || report(&weak));
        kernel
            .scheduler()
            .register(TaskSpec::new(task, Priority::Background, interval))
    }

    /// Logs one snapshot.
    pub fn log(snapshot: &TelemetrySnapshot) {
        info!(
            cycle = snapshot.cycle,
            reserve = snapshot.reading.reserve,
            tasks = snapshot.registered_tasks,
            executed = snapshot.tasks.executed,
            skipped = snapshot.tasks.skipped,
            deferred = snapshot.tasks.deferred,
            failed = snapshot.tasks.failed,
            events_emitted = snapshot.bus.events_emitted,
            events_processed = snapshot.bus.events_processed,
            queued = snapshot.bus.queue_size,
            dropped = snapshot.bus.events_dropped,
            handlers = snapshot.bus.handler_count,
            "telemetry"
        );
    }
}

fn report(kernel: &WeakKernel) -> Result<(), WorkError> {
    match kernel.upgrade() {
        Some(kernel) => {
            LogReporter::log(&kernel.telemetry());
            Ok(())
        }
        None => Err(WorkError::fail("kernel dropped")),
    }
}
