//! # Task specification for periodic scheduling.
//!
//! Defines [`TaskSpec`] a bundle describing how a task is scheduled: tier,
//! interval in cycles, declared cost and an optional reserve override.
//!
//! A spec can be created:
//! - **Explicitly** with [`TaskSpec::new`] (priority and interval up front)
//! - **With defaults** with [`TaskSpec::from_task`] (`Normal`, every cycle, cost 0)
//!
//! ## Rules
//! - The spec is passed to [`Scheduler::register`](crate::Scheduler::register),
//!   which validates it and fails fast on an invalid interval or cost.

use std::fmt;

use crate::error::RegistrationError;
use crate::policies::Priority;
use crate::tasks::task::TaskRef;

/// Specification for running a task periodically.
///
/// ## Example
/// ```rust
/// use cyclevisor::{Priority, TaskFn, TaskRef, TaskSpec, WorkError};
///
/// let census: TaskRef = TaskFn::rc("census", || Ok::<(), WorkError>(()));
///
/// let spec = TaskSpec::new(census.clone(), Priority::Low, 10).with_cost(2.5);
/// assert_eq!(spec.interval(), 10);
///
/// let spec2 = TaskSpec::from_task(census);
/// assert_eq!(spec2.priority(), Priority::Normal);
/// ```
#[derive(Clone)]
pub struct TaskSpec {
    task: TaskRef,
    priority: Priority,
    interval: u64,
    cost: f64,
    min_reserve: Option<u32>,
}

impl TaskSpec {
    /// Creates a new specification.
    ///
    /// ### Parameters
    /// - `task`: Task to execute; its name is the registry id
    /// - `priority`: Tier used for ordering and reserve gating
    /// - `interval`: Cycles between runs (must be `>= 1`)
    pub fn new(task: TaskRef, priority: Priority, interval: u64) -> Self {
        Self {
            task,
            priority,
            interval,
            cost: 0.0,
            min_reserve: None,
        }
    }

    /// Creates a `Normal`, every-cycle, zero-cost specification.
    pub fn from_task(task: TaskRef) -> Self {
        Self::new(task, Priority::default(), 1)
    }

    /// Returns reference to the task.
    pub fn task(&self) -> &TaskRef {
        &self.task
    }

    /// Convenience: returns the task name (registry id).
    pub fn name(&self) -> &str {
        self.task.name()
    }

    /// Returns the tier.
    pub fn priority(&self) -> Priority {
        self.priority
    }

    /// Returns the interval in cycles.
    pub fn interval(&self) -> u64 {
        self.interval
    }

    /// Returns the declared cost estimate.
    pub fn cost(&self) -> f64 {
        self.cost
    }

    /// Returns the per-task reserve override, if any.
    pub fn min_reserve(&self) -> Option<u32> {
        self.min_reserve
    }

    /// Returns a new spec with updated priority.
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Returns a new spec with updated interval.
    pub fn every(mut self, interval: u64) -> Self {
        self.interval = interval;
        self
    }

    /// Returns a new spec with updated cost estimate.
    pub fn with_cost(mut self, cost: f64) -> Self {
        self.cost = cost;
        self
    }

    /// Returns a new spec whose reserve gate uses `min_reserve` instead of the tier default.
    pub fn with_min_reserve(mut self, min_reserve: u32) -> Self {
        self.min_reserve = Some(min_reserve);
        self
    }

    /// Checks the invariants enforced at registration.
    pub(crate) fn validate(&self) -> Result<(), RegistrationError> {
        let name = self.name();
        if name.trim().is_empty() {
            return Err(RegistrationError::EmptyId);
        }
        if self.interval < 1 {
            return Err(RegistrationError::InvalidInterval {
                task: name.to_string(),
                interval: self.interval,
            });
        }
        if !self.cost.is_finite() || self.cost < 0.0 {
            return Err(RegistrationError::InvalidCost {
                task: name.to_string(),
                cost: self.cost,
            });
        }
        Ok(())
    }
}

impl fmt::Debug for TaskSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskSpec")
            .field("name", &self.name())
            .field("priority", &self.priority)
            .field("interval", &self.interval)
            .field("cost", &self.cost)
            .field("min_reserve", &self.min_reserve)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WorkError;
    use crate::tasks::TaskFn;

    fn noop(name: &'static str) -> TaskRef {
        TaskFn::rc(name, || Ok::<(), WorkError>(()))
    }

    #[test]
    fn defaults() {
        let spec = TaskSpec::from_task(noop("a"));
        assert_eq!(spec.priority(), Priority::Normal);
        assert_eq!(spec.interval(), 1);
        assert_eq!(spec.cost(), 0.0);
        assert_eq!(spec.min_reserve(), None);
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn zero_interval_is_rejected() {
        let err = TaskSpec::new(noop("a"), Priority::Low, 0)
            .validate()
            .unwrap_err();
        assert_eq!(
            err,
            RegistrationError::InvalidInterval {
                task: "a".into(),
                interval: 0
            }
        );
    }

    #[test]
    fn bad_cost_and_empty_id_are_rejected() {
        assert!(matches!(
            TaskSpec::from_task(noop("a")).with_cost(-0.5).validate(),
            Err(RegistrationError::InvalidCost { .. })
        ));
        assert!(matches!(
            TaskSpec::from_task(noop("a")).with_cost(f64::NAN).validate(),
            Err(RegistrationError::InvalidCost { .. })
        ));
        assert_eq!(
            TaskSpec::from_task(noop("  ")).validate(),
            Err(RegistrationError::EmptyId)
        );
    }
}
