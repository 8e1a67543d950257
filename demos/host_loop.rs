//! # Example: Host Loop
//!
//! Drives a kernel with a simulated host whose reserve drains while expensive
//! work runs and recovers while it is throttled.
//!
//! Shows:
//! - tier-ordered periodic tasks with costs and a per-task reserve override
//! - events queued while the reserve is scarce and drained once it recovers
//! - a one-shot handler and a failing handler that does not disturb the others
//! - `LogReporter` telemetry and Ctrl-C / SIGTERM shutdown
//!
//! Run with:
//! ```text
//! RUST_LOG=cyclevisor=debug,host_loop=info cargo run --example host_loop
//! ```

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cyclevisor::{
    BudgetReading, CycleDriver, EmitOptions, Kernel, LogReporter, Priority, SubscribeOptions,
    TaskFn, TaskSpec, WorkError, cancel_on_shutdown_signal,
};

/// Reserve that drains by the declared cost of executed work and refills slowly.
struct SimulatedHost {
    reserve: Cell<u32>,
}

impl SimulatedHost {
    fn read(&self) -> BudgetReading {
        BudgetReading::new(20.0, self.reserve.get())
    }

    fn spend(&self, amount: u32) {
        self.reserve.set(self.reserve.get().saturating_sub(amount));
    }

    fn refill(&self) {
        self.reserve.set((self.reserve.get() + 350).min(10_000));
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let kernel = Kernel::builder().max_event_age(20).build()?;
    let host = Rc::new(SimulatedHost {
        reserve: Cell::new(2_000),
    });

    // CRITICAL: always runs, refills the simulated reserve.
    let h = host.clone();
    kernel.scheduler().register(TaskSpec::new(
        TaskFn::rc("host.refill", move || -> Result<(), WorkError> {
            h.refill();
            Ok(())
        }),
        Priority::Critical,
        1,
    ))?;

    // HIGH: cheap defence check that reports through the bus.
    let bus = kernel.bus().clone();
    let tick = Rc::new(Cell::new(0_u64));
    let t = tick.clone();
    kernel.scheduler().register(
        TaskSpec::new(
            TaskFn::rc("defence.scan", move || -> Result<(), WorkError> {
                t.set(t.get() + 1);
                bus.emit(
                    "defence.report",
                    json!({"scan": t.get(), "hostiles": t.get() % 4 == 0}),
                    EmitOptions::new().with_priority(Priority::Low),
                );
                Ok(())
            }),
            Priority::High,
            2,
        )
        .with_cost(2.0),
    )?;

    // LOW: expensive planner that burns reserve.
    let h = host.clone();
    kernel.scheduler().register(
        TaskSpec::new(
            TaskFn::rc("planner", move || -> Result<(), WorkError> {
                h.spend(1_500);
                Ok(())
            }),
            Priority::Low,
            3,
        )
        .with_cost(12.0),
    )?;

    // BACKGROUND with a stricter gate than its tier default; fails every time.
    kernel.scheduler().register(
        TaskSpec::new(
            TaskFn::rc("archive", || Err::<(), _>(WorkError::fail("archive offline"))),
            Priority::Background,
            5,
        )
        .with_min_reserve(9_500),
    )?;

    kernel.bus().on(
        "defence.report",
        |ev| {
            info!(cycle = ev.cycle, scan = ?ev.meta("scan"), "defence report");
            Ok(())
        },
        SubscribeOptions::new().with_priority(Priority::High),
    );
    kernel.bus().on(
        "defence.report",
        |ev| match ev.meta("hostiles").and_then(|v| v.as_bool()) {
            Some(true) => Err(WorkError::fail("hostiles sighted, no responder wired")),
            _ => Ok(()),
        },
        SubscribeOptions::new(),
    );
    kernel.bus().once(
        "defence.report",
        |ev| {
            info!(cycle = ev.cycle, "first defence report received");
            Ok(())
        },
        SubscribeOptions::new().with_priority(Priority::Critical),
    );

    LogReporter::install(&kernel, 10)?;

    let token = CancellationToken::new();
    tokio::spawn(cancel_on_shutdown_signal(token.clone()));

    let source = {
        let host = host.clone();
        move || host.read()
    };
    let driver = CycleDriver::new(kernel.clone(), source, Duration::from_millis(200))
        .with_max_cycles(60);
    let cycles = driver.run(token).await;

    let snapshot = kernel.telemetry();
    info!(
        cycles,
        reserve = snapshot.reading.reserve,
        events_processed = snapshot.bus.events_processed,
        events_dropped = snapshot.bus.events_dropped,
        handler_errors = snapshot.bus.handler_errors,
        "host loop finished"
    );
    Ok(())
}
