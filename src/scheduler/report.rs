//! Per-pass results of the scheduler and public task descriptors.

use crate::policies::{Priority, TierCounts};

/// Outcome of one [`Scheduler::run`](crate::Scheduler::run) call.
///
/// Id lists are in evaluation order (tier descending, registration order).
/// The counters describe this pass only; the next `run` starts from zero.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickReport {
    /// Cycle the pass ran in.
    pub cycle: u64,
    /// Reserve level the gates were evaluated against.
    pub reserve: u32,
    /// Budget supplied to the pass, if any.
    pub budget: Option<f64>,
    /// Registered tasks when the pass finished.
    pub total_tasks: usize,
    /// Tasks that ran successfully.
    pub executed: Vec<String>,
    /// Tasks held back by the reserve gate.
    pub skipped: Vec<String>,
    /// Tasks held back by the budget gate.
    pub deferred: Vec<String>,
    /// Tasks that ran and failed (error or panic).
    pub failed: Vec<String>,
    /// Successful executions per tier.
    pub executed_by_priority: TierCounts,
    /// Sum of declared costs of successful executions.
    pub cost_spent: f64,
}

impl TickReport {
    pub(crate) fn new(cycle: u64, reserve: u32, budget: Option<f64>) -> Self {
        Self {
            cycle,
            reserve,
            budget,
            ..Self::default()
        }
    }

    /// Number of successful executions.
    pub fn executed_count(&self) -> usize {
        self.executed.len()
    }

    /// Number of reserve-gate refusals.
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    /// Number of budget-gate refusals.
    pub fn deferred_count(&self) -> usize {
        self.deferred.len()
    }

    /// Number of failed executions.
    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }
}

/// Read-only description of a registered task.
#[derive(Clone, Debug, PartialEq)]
pub struct TaskInfo {
    /// Task id.
    pub id: String,
    /// Tier.
    pub priority: Priority,
    /// Cycles between runs.
    pub interval: u64,
    /// Declared cost estimate.
    pub cost: f64,
    /// Per-task reserve override.
    pub min_reserve: Option<u32>,
    /// Cycle of the last run, `None` if the task is due immediately.
    pub last_run: Option<u64>,
}
