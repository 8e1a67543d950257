//! # Task admission gates
//!
//! Before a due task starts, the scheduler asks whether it may run **this cycle**.
//! Two gates are evaluated in order; `Critical` bypasses both.
//!
//! ```text
//! due task
//!   ├─► reserve gate: reserve < min_reserve        ─► Skip   (stays due, no budget used)
//!   ├─► budget gate:  spent + cost > total_budget  ─► Defer  (stays due, next task evaluated)
//!   └─► Admit
//! ```
//!
//! ## Invariants
//! - A refused task is never half-run: admission happens strictly before the work unit starts.
//! - The budget gate has no head-of-line blocking; a cheaper task behind a deferred one
//!   is still evaluated.

use crate::policies::Priority;

/// Outcome of the admission gates for one task.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Admission {
    /// The task may run now.
    Admit,

    /// Reserve below the required level.
    Skip {
        /// Reserve level that would have admitted the task.
        required: u32,
    },

    /// Running the task would exceed the cycle budget.
    Defer {
        /// Budget the task would need (`spent + cost`).
        needed: f64,
        /// Total budget for this run.
        budget: f64,
    },
}

impl Admission {
    /// Returns `true` if the task may run.
    #[inline]
    pub fn is_admitted(&self) -> bool {
        matches!(self, Admission::Admit)
    }
}

/// Inputs for one admission decision.
#[derive(Clone, Copy, Debug)]
pub struct AdmissionRequest {
    /// Tier of the task.
    pub priority: Priority,
    /// Effective minimum reserve (task override or tier default).
    pub min_reserve: u32,
    /// Declared cost estimate.
    pub cost: f64,
}

/// Running state of one scheduler pass.
#[derive(Clone, Copy, Debug)]
pub struct AdmissionWindow {
    /// Reserve level sampled for this cycle.
    pub reserve: u32,
    /// Optional cumulative cost budget for this pass.
    pub budget: Option<f64>,
    /// Cost consumed by tasks that already ran in this pass.
    pub spent: f64,
}

impl AdmissionWindow {
    /// Opens a window for one pass.
    pub fn new(reserve: u32, budget: Option<f64>) -> Self {
        Self {
            reserve,
            budget,
            spent: 0.0,
        }
    }

    /// Evaluates both gates for `req`.
    pub fn evaluate(&self, req: &AdmissionRequest) -> Admission {
        if req.priority.is_critical() {
            return Admission::Admit;
        }
        if self.reserve < req.min_reserve {
            return Admission::Skip {
                required: req.min_reserve,
            };
        }
        if let Some(budget) = self.budget {
            let needed = self.spent + req.cost;
            if needed > budget {
                return Admission::Defer { needed, budget };
            }
        }
        Admission::Admit
    }

    /// Records a successful execution.
    pub fn charge(&mut self, cost: f64) {
        self.spent += cost;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(priority: Priority, min_reserve: u32, cost: f64) -> AdmissionRequest {
        AdmissionRequest {
            priority,
            min_reserve,
            cost,
        }
    }

    #[test]
    fn critical_bypasses_both_gates() {
        let mut window = AdmissionWindow::new(0, Some(1.0));
        window.charge(5.0);
        assert_eq!(
            window.evaluate(&req(Priority::Critical, 9_000, 10.0)),
            Admission::Admit
        );
    }

    #[test]
    fn reserve_gate_runs_before_budget_gate() {
        let window = AdmissionWindow::new(100, Some(0.0));
        assert_eq!(
            window.evaluate(&req(Priority::Low, 6_000, 5.0)),
            Admission::Skip { required: 6_000 }
        );
    }

    #[test]
    fn reserve_equal_to_threshold_is_admitted() {
        let window = AdmissionWindow::new(3_000, None);
        assert!(window.evaluate(&req(Priority::Normal, 3_000, 0.0)).is_admitted());
    }

    #[test]
    fn budget_gate_compares_cumulative_cost() {
        let mut window = AdmissionWindow::new(10_000, Some(10.0));
        assert!(window.evaluate(&req(Priority::Normal, 0, 4.0)).is_admitted());
        window.charge(4.0);
        window.charge(4.0);
        assert_eq!(
            window.evaluate(&req(Priority::Normal, 0, 4.0)),
            Admission::Defer {
                needed: 12.0,
                budget: 10.0
            }
        );
        assert!(window.evaluate(&req(Priority::Normal, 0, 2.0)).is_admitted());
    }

    #[test]
    fn no_budget_means_no_budget_gate() {
        let mut window = AdmissionWindow::new(10_000, None);
        window.charge(1_000_000.0);
        assert!(window.evaluate(&req(Priority::Background, 0, 1.0)).is_admitted());
    }
}
