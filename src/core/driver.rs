//! # CycleDriver: async host loop for a kernel.
//!
//! Runs [`Kernel::run_cycle`] on a [`tokio::time::interval`] until a
//! [`CancellationToken`] fires or an optional cycle limit is reached.
//!
//! ```text
//! loop
//!   ├─ max_cycles reached?   ─► stop
//!   ├─ select! (biased)
//!   │    ├─ token.cancelled() ─► stop
//!   │    └─ interval.tick()
//!   └─► kernel.run_cycle(source)
//! ```
//!
//! The kernel is `!Send`, so the driver future must run on a current-thread
//! runtime (or a `LocalSet`); it is never spawned onto a multi-thread pool.
//! Cancellation is observed between cycles only.

use std::time::Duration;

use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::core::Kernel;
use crate::core::budget::BudgetSource;

/// Drives a kernel at a fixed period.
pub struct CycleDriver<S> {
    kernel: Kernel,
    source: S,
    period: Duration,
    max_cycles: Option<u64>,
}

impl<S: BudgetSource> CycleDriver<S> {
    /// Creates a driver that runs one cycle every `period`.
    ///
    /// A zero period is raised to one millisecond.
    pub fn new(kernel: Kernel, source: S, period: Duration) -> Self {
        Self {
            kernel,
            source,
            period: period.max(Duration::from_millis(1)),
            max_cycles: None,
        }
    }

    /// Stops the driver after `n` cycles.
    pub fn with_max_cycles(mut self, n: u64) -> Self {
        self.max_cycles = Some(n);
        self
    }

    /// Kernel being driven.
    pub fn kernel(&self) -> &Kernel {
        &self.kernel
    }

    /// Tick period.
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Runs cycles until `token` is cancelled or the limit is hit; returns the
    /// number of cycles run.
    pub async fn run(&self, token: CancellationToken) -> u64 {
        let mut ticker = time::interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut cycles = 0_u64;

        info!(period = ?self.period, max_cycles = ?self.max_cycles, "cycle driver started");
        loop {
            if self.max_cycles.is_some_and(|max| cycles >= max) {
                break;
            }
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let report = self.kernel.run_cycle(&self.source);
            cycles += 1;
            debug!(
                cycle = report.cycle,
                reserve = report.reading.reserve,
                executed = report.tasks.executed_count(),
                skipped = report.tasks.skipped_count(),
                deferred = report.tasks.deferred_count(),
                failed = report.tasks.failed_count(),
                delivered = report.queue.delivered,
                "cycle complete"
            );
        }
        info!(cycles, cancelled = token.is_cancelled(), "cycle driver stopped");
        cycles
    }
}

impl<S> std::fmt::Debug for CycleDriver<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CycleDriver")
            .field("kernel", &self.kernel)
            .field("period", &self.period)
            .field("max_cycles", &self.max_cycles)
            .finish()
    }
}
