//! # Budget readings and sources.
//!
//! The host grants a hard compute quota per cycle and banks unused quota into a
//! slowly replenishing reserve. The kernel only **reads** both values, once per
//! cycle, through a [`BudgetSource`].
//!
//! ```text
//! host ──► BudgetSource::read() ──► BudgetReading { remaining_quota, reserve }
//!                                        │
//!                                        └─► Kernel::begin_cycle(reading)
//! ```

/// One sample of the host's budget, taken at the start of a cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BudgetReading {
    /// Quota left in the current cycle, in the same unit as task cost estimates.
    pub remaining_quota: f64,
    /// Reserve gauge level.
    pub reserve: u32,
}

impl BudgetReading {
    /// Creates a reading; a negative or non-finite quota is treated as `0`.
    pub fn new(remaining_quota: f64, reserve: u32) -> Self {
        let remaining_quota = if remaining_quota.is_finite() && remaining_quota > 0.0 {
            remaining_quota
        } else {
            0.0
        };
        Self {
            remaining_quota,
            reserve,
        }
    }
}

/// Supplies the budget reading for a cycle.
///
/// Implemented for [`BudgetReading`] itself (a fixed reading) and for any
/// `Fn() -> BudgetReading` closure.
///
/// ## Example
/// ```
/// use std::cell::Cell;
/// use cyclevisor::{BudgetReading, BudgetSource};
///
/// let reserve = Cell::new(500);
/// let source = || BudgetReading::new(20.0, reserve.get());
/// assert_eq!(source.read().reserve, 500);
/// reserve.set(9_000);
/// assert_eq!(source.read().reserve, 9_000);
/// ```
pub trait BudgetSource {
    /// Returns the reading for the cycle about to start.
    fn read(&self) -> BudgetReading;
}

impl BudgetSource for BudgetReading {
    fn read(&self) -> BudgetReading {
        *self
    }
}

impl<F> BudgetSource for F
where
    F: Fn() -> BudgetReading,
{
    fn read(&self) -> BudgetReading {
        self()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_quota_is_zeroed() {
        assert_eq!(BudgetReading::new(-3.0, 10).remaining_quota, 0.0);
        assert_eq!(BudgetReading::new(f64::INFINITY, 10).remaining_quota, 0.0);
        assert_eq!(BudgetReading::new(f64::NAN, 10).remaining_quota, 0.0);
        assert_eq!(BudgetReading::new(12.5, 10).remaining_quota, 12.5);
    }

    #[test]
    fn fixed_reading_is_its_own_source() {
        let reading = BudgetReading::new(5.0, 7_000);
        assert_eq!(reading.read(), reading);
    }
}
