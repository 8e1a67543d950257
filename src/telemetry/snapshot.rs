use crate::core::BudgetReading;
use crate::events::BusStats;
use crate::policies::TierCounts;
use crate::scheduler::TickReport;

/// Counts from the most recent scheduler pass.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TickSummary {
    /// Cycle of the pass (`0` if the scheduler never ran).
    pub cycle: u64,
    /// Successful executions.
    pub executed: usize,
    /// Reserve-gate refusals.
    pub skipped: usize,
    /// Budget-gate refusals.
    pub deferred: usize,
    /// Failed executions.
    pub failed: usize,
    /// Successful executions per tier.
    pub executed_by_priority: TierCounts,
    /// Declared cost consumed.
    pub cost_spent: f64,
}

impl From<&TickReport> for TickSummary {
    fn from(r: &TickReport) -> Self {
        Self {
            cycle: r.cycle,
            executed: r.executed_count(),
            skipped: r.skipped_count(),
            deferred: r.deferred_count(),
            failed: r.failed_count(),
            executed_by_priority: r.executed_by_priority,
            cost_spent: r.cost_spent,
        }
    }
}

/// Point-in-time view of a kernel, built by [`Kernel::telemetry`](crate::Kernel::telemetry).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TelemetrySnapshot {
    /// Current cycle.
    pub cycle: u64,
    /// Reading of the current cycle.
    pub reading: BudgetReading,
    /// Last scheduler pass.
    pub tasks: TickSummary,
    /// Cumulative bus counters.
    pub bus: BusStats,
    /// Tasks currently registered.
    pub registered_tasks: usize,
}
