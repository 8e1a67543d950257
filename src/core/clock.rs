//! Cycle counter and budget reading shared by the scheduler and the bus.
//!
//! Both subsystems must decide against the **same** cycle and reserve sample, so
//! the kernel hands each of them a clone of one [`Clock`].

use std::cell::Cell;
use std::rc::Rc;

use crate::core::budget::BudgetReading;

#[derive(Clone, Copy, Debug, Default)]
struct ClockState {
    cycle: u64,
    reading: BudgetReading,
}

/// Shared, single-threaded view of the current cycle.
#[derive(Clone, Debug, Default)]
pub(crate) struct Clock {
    state: Rc<Cell<ClockState>>,
}

impl Clock {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Current cycle number (`0` before the first cycle begins).
    #[inline]
    pub(crate) fn cycle(&self) -> u64 {
        self.state.get().cycle
    }

    /// Reading sampled when the current cycle began.
    #[inline]
    pub(crate) fn reading(&self) -> BudgetReading {
        self.state.get().reading
    }

    #[inline]
    pub(crate) fn reserve(&self) -> u32 {
        self.state.get().reading.reserve
    }

    /// Starts the next cycle with `reading`; returns the new cycle number.
    pub(crate) fn advance(&self, reading: BudgetReading) -> u64 {
        let cycle = self.state.get().cycle.saturating_add(1);
        self.state.set(ClockState { cycle, reading });
        cycle
    }
}
