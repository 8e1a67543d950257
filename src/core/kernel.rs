//! # Kernel: the per-agent context object.
//!
//! A [`Kernel`] owns one [`Scheduler`], one [`EventBus`] and the cycle clock they
//! share. Several kernels may coexist (each test builds its own).
//!
//! ## Cycle
//! ```text
//! run_cycle(source)
//!   ├─► source.read()                  once
//!   ├─► begin_cycle(reading)           cycle += 1, reserve clamped to capacity
//!   ├─► scheduler.run(budget)          budget from Config::cycle_budget
//!   └─► bus.process_queue()
//! ```
//!
//! Hosts that need finer control call `begin_cycle`, `scheduler().run(..)` and
//! `bus().process_queue()` themselves, in that order, once per cycle.

use std::rc::{Rc, Weak};

use tracing::trace;

use crate::core::Config;
use crate::core::budget::{BudgetReading, BudgetSource};
use crate::core::builder::KernelBuilder;
use crate::core::clock::Clock;
use crate::error::ConfigError;
use crate::events::{DrainReport, EventBus};
use crate::scheduler::{Scheduler, TickReport};
use crate::telemetry::TelemetrySnapshot;

struct KernelInner {
    config: Rc<Config>,
    clock: Clock,
    scheduler: Scheduler,
    bus: EventBus,
}

/// Cheap-clone handle to one scheduling kernel.
///
/// ## Example
/// ```
/// use cyclevisor::{BudgetReading, Kernel, Priority, TaskFn, TaskSpec, WorkError};
///
/// let kernel = Kernel::default();
/// kernel
///     .scheduler()
///     .register(TaskSpec::new(TaskFn::rc("census", || Ok::<(), WorkError>(())), Priority::High, 5))
///     .unwrap();
///
/// let report = kernel.run_cycle(&BudgetReading::new(20.0, 4_000));
/// assert_eq!(report.cycle, 1);
/// assert_eq!(report.tasks.executed, vec!["census"]);
/// ```
#[derive(Clone)]
pub struct Kernel {
    inner: Rc<KernelInner>,
}

/// Non-owning kernel handle, for work units that must not keep their kernel alive.
#[derive(Clone)]
pub struct WeakKernel {
    inner: Weak<KernelInner>,
}

impl WeakKernel {
    /// Returns the kernel if it is still alive.
    pub fn upgrade(&self) -> Option<Kernel> {
        self.inner.upgrade().map(|inner| Kernel { inner })
    }
}

/// Result of one [`Kernel::run_cycle`].
#[derive(Clone, Debug, PartialEq)]
pub struct CycleReport {
    /// Cycle number.
    pub cycle: u64,
    /// Reading the cycle ran against (reserve already clamped).
    pub reading: BudgetReading,
    /// Budget handed to the scheduler.
    pub budget: Option<f64>,
    /// Scheduler pass.
    pub tasks: TickReport,
    /// Queue drain.
    pub queue: DrainReport,
}

impl Kernel {
    /// Creates a kernel after validating `config`.
    ///
    /// ### Errors
    /// [`ConfigError`] if the configuration is unusable.
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::from_valid(config))
    }

    /// Returns a builder starting from [`Config::default`].
    pub fn builder() -> KernelBuilder {
        KernelBuilder::default()
    }

    fn from_valid(config: Config) -> Self {
        let config = Rc::new(config);
        let clock = Clock::new();
        Self {
            inner: Rc::new(KernelInner {
                scheduler: Scheduler::new(clock.clone(), config.clone()),
                bus: EventBus::new(clock.clone(), config.clone()),
                clock,
                config,
            }),
        }
    }

    /// Kernel configuration.
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Task scheduler handle; clone it to capture in work units.
    pub fn scheduler(&self) -> &Scheduler {
        &self.inner.scheduler
    }

    /// Event bus handle; clone it to capture in work units.
    pub fn bus(&self) -> &EventBus {
        &self.inner.bus
    }

    /// Returns a handle that does not keep the kernel alive.
    pub fn downgrade(&self) -> WeakKernel {
        WeakKernel {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Current cycle number (`0` before the first cycle).
    pub fn cycle(&self) -> u64 {
        self.inner.clock.cycle()
    }

    /// Reading of the current cycle.
    pub fn reading(&self) -> BudgetReading {
        self.inner.clock.reading()
    }

    /// Starts the next cycle with `reading`; returns the new cycle number.
    ///
    /// The reserve is clamped to `reserve_capacity`.
    pub fn begin_cycle(&self, reading: BudgetReading) -> u64 {
        let reading = BudgetReading::new(
            reading.remaining_quota,
            self.inner.config.clamp_reserve(reading.reserve),
        );
        let cycle = self.inner.clock.advance(reading);
        trace!(cycle, reserve = reading.reserve, quota = reading.remaining_quota, "cycle started");
        cycle
    }

    /// Runs one full cycle: read the source, begin the cycle, run the scheduler,
    /// then drain the event queue. Never fails.
    pub fn run_cycle<S>(&self, source: &S) -> CycleReport
    where
        S: BudgetSource + ?Sized,
    {
        let cycle = self.begin_cycle(source.read());
        let reading = self.reading();
        let budget = self
            .inner
            .config
            .cycle_budget
            .resolve(reading.remaining_quota);

        let tasks = self.inner.scheduler.run(budget);
        let queue = self.inner.bus.process_queue();
        trace!(
            cycle,
            executed = tasks.executed_count(),
            failed = tasks.failed_count(),
            delivered = queue.delivered,
            queued = queue.remaining,
            "cycle finished"
        );
        CycleReport {
            cycle,
            reading,
            budget,
            tasks,
            queue,
        }
    }

    /// Combined view of the last scheduler pass and the bus counters.
    pub fn telemetry(&self) -> TelemetrySnapshot {
        TelemetrySnapshot {
            cycle: self.cycle(),
            reading: self.reading(),
            tasks: (&self.inner.scheduler.last_report()).into(),
            bus: self.inner.bus.stats(),
            registered_tasks: self.inner.scheduler.len(),
        }
    }
}

impl Default for Kernel {
    /// Kernel with [`Config::default`], which is always valid.
    fn default() -> Self {
        Self::from_valid(Config::default())
    }
}

impl std::fmt::Debug for Kernel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Kernel")
            .field("cycle", &self.cycle())
            .field("scheduler", &self.inner.scheduler)
            .field("bus", &self.inner.bus)
            .finish()
    }
}
