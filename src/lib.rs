//! # cyclevisor
//!
//! **Cyclevisor** is a scheduling kernel for agents that are re-invoked once per
//! discrete execution slice ("cycle") by a host enforcing a hard compute quota,
//! with banked unused quota exposed as a slowly replenishing **reserve**.
//!
//! Within each cycle the kernel decides which units of work run and in what order,
//! uses the reserve to throttle low-value work when resources are scarce, and never
//! lets one failing unit abort the cycle.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │   TaskSpec   │   │   TaskSpec   │   │  on(name, f) │
//!     │ (periodic #1)│   │ (periodic #2)│   │  (handler)   │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Kernel (context object)                                          │
//! │  - Clock (cycle number + BudgetReading, shared)                   │
//! │  - Scheduler (task registry, reserve and budget gates)            │
//! │  - EventBus (subscribers, routing, deferred priority queue)       │
//! └──────┬──────────────────────────────────────────────┬─────────────┘
//!        ▼                                              ▼
//! ┌──────────────────────────────┐     ┌──────────────────────────────┐
//! │ Scheduler::run(budget)       │     │ EventBus::emit / process_queue│
//! │  tier desc, registration asc │     │  Deliver now or Queue         │
//! │  Skip / Defer / Admit        │     │  stale purge, per-cycle cap   │
//! │  run_guarded(task.run())     │     │  run_guarded(handler.handle())│
//! └──────────────────────────────┘     └──────────────────────────────┘
//! ```
//!
//! ### Cycle
//! ```text
//! host ──► BudgetSource::read() ──► Kernel::run_cycle(source)
//!                                      ├─► begin_cycle(reading)
//!                                      ├─► scheduler.run(cycle budget)
//!                                      └─► bus.process_queue()
//! ```
//!
//! ### Priority tiers
//! `Critical > High > Normal > Low > Background`. `Critical` is exempt from every
//! admission gate; the other tiers need a minimum reserve (configurable, see
//! [`TierThresholds`]).
//!
//! ## Features
//! | Area              | Description                                                     | Key types / traits                          |
//! |-------------------|-----------------------------------------------------------------|---------------------------------------------|
//! | **Kernel**        | Context object owning one scheduler and one bus.                | [`Kernel`], [`KernelBuilder`]               |
//! | **Tasks**         | Periodic work with tier, interval, cost and reserve override.   | [`Task`], [`TaskFn`], [`TaskSpec`]          |
//! | **Scheduler**     | Reserve- and budget-gated execution with per-pass reports.      | [`Scheduler`], [`TickReport`]               |
//! | **Events**        | Reserve-aware pub/sub with a bounded deferred queue.            | [`EventBus`], [`BusEvent`], [`Handler`]     |
//! | **Budget**        | Host seam supplying quota and reserve once per cycle.           | [`BudgetSource`], [`BudgetReading`]         |
//! | **Errors**        | Typed errors for work units, registration and configuration.    | [`WorkError`], [`RegistrationError`]        |
//! | **Configuration** | Centralize thresholds, queue limits and the cycle budget.       | [`Config`], [`CycleBudget`]                 |
//!
//! ## Optional features
//! - `driver`: async host loop [`CycleDriver`] and shutdown signal helpers (tokio).
//! - `logging`: built-in [`LogReporter`] that logs telemetry snapshots.
//!
//! ## Example
//! ```rust
//! use serde_json::json;
//! use cyclevisor::{
//!     BudgetReading, EmitOptions, Kernel, Priority, SubscribeOptions, TaskFn, TaskSpec, WorkError,
//! };
//!
//! let kernel = Kernel::default();
//!
//! let bus = kernel.bus().clone();
//! let census = TaskFn::rc("census", move || -> Result<(), WorkError> {
//!     bus.emit("census.done", json!({"count": 3}), EmitOptions::new().with_priority(Priority::Low));
//!     Ok(())
//! });
//! kernel.scheduler().register(TaskSpec::new(census, Priority::High, 10))?;
//!
//! kernel.bus().on(
//!     "census.done",
//!     |ev| {
//!         assert_eq!(ev.meta("count"), Some(&json!(3)));
//!         Ok(())
//!     },
//!     SubscribeOptions::new(),
//! );
//!
//! // Scarce reserve: the HIGH task still runs, its LOW event is queued and drained.
//! let report = kernel.run_cycle(&BudgetReading::new(20.0, 1_500));
//! assert_eq!(report.tasks.executed, vec!["census"]);
//! assert_eq!(report.queue.delivered, 1);
//! # Ok::<(), cyclevisor::RegistrationError>(())
//! ```

mod core;
mod error;
mod events;
mod policies;
mod scheduler;
mod subscribers;
mod tasks;
mod telemetry;

// ---- Public re-exports ----

pub use crate::core::{
    BudgetReading, BudgetSource, Config, CycleBudget, CycleReport, Kernel, KernelBuilder,
    WeakKernel,
};
pub use error::{ConfigError, RegistrationError, WorkError};
pub use events::{BusEvent, BusStats, DrainReport, EmitOptions, EmitOutcome, EventBus};
pub use policies::{
    Admission, AdmissionRequest, AdmissionWindow, DeliveryPolicy, Priority, Route, TierCounts,
    TierThresholds,
};
pub use scheduler::{Scheduler, TaskInfo, TickReport};
pub use subscribers::{
    Handler, HandlerFn, HandlerRef, SubscribeOptions, SubscriptionId, Unsubscribe,
};
pub use tasks::{Task, TaskFn, TaskRef, TaskSpec};
pub use telemetry::{TelemetrySnapshot, TickSummary};

// Optional: async host loop and shutdown signal helpers.
// Enable with: `--features driver`
#[cfg(feature = "driver")]
pub use crate::core::CycleDriver;
#[cfg(feature = "driver")]
pub use crate::core::shutdown::{cancel_on_shutdown_signal, wait_for_shutdown_signal};

// Optional: built-in telemetry log reporter.
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use telemetry::{LOG_REPORTER_TASK, LogReporter};
