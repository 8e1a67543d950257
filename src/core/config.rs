//! # Kernel configuration.
//!
//! Provides [`Config`] centralized settings for the scheduler and the event bus.
//!
//! Config is used in two ways:
//! 1. **Kernel creation**: `Kernel::new(config)` / `Kernel::builder().with_config(config)`
//! 2. **Per-cycle decisions**: tier thresholds, bus routing, queue limits, cycle budget
//!
//! ## Example
//! ```
//! use cyclevisor::{Config, CycleBudget};
//!
//! let mut cfg = Config::default();
//! cfg.queue_capacity = 64;
//! cfg.cycle_budget = CycleBudget::Share(0.8);
//! assert!(cfg.validate().is_ok());
//! ```

use crate::error::ConfigError;
use crate::policies::{DeliveryPolicy, TierThresholds};

/// How much of the cycle's remaining quota the scheduler may spend on declared task costs.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum CycleBudget {
    /// No budget gate: only the reserve gate applies.
    Unbounded,
    /// The whole remaining quota reported by the budget source (default).
    #[default]
    RemainingQuota,
    /// A fraction in `(0, 1]` of the remaining quota; the rest is left for event handlers.
    Share(f64),
}

impl CycleBudget {
    /// Resolves the scheduler budget for a cycle with `remaining_quota` left.
    #[inline]
    pub fn resolve(&self, remaining_quota: f64) -> Option<f64> {
        match self {
            CycleBudget::Unbounded => None,
            CycleBudget::RemainingQuota => Some(remaining_quota),
            CycleBudget::Share(share) => Some(remaining_quota * share),
        }
    }
}

/// Global configuration for one kernel.
///
/// ## Field semantics
/// - `reserve_capacity`: upper bound of the reserve gauge; readings are clamped to it
/// - `thresholds`: default minimum reserve per tier (tasks may override)
/// - `bus_healthy_reserve`: at or above, every emitted event is delivered immediately
/// - `bus_critical_reserve`: below, only `Critical` events are delivered immediately
/// - `queue_capacity`: deferred queue bound; overflow evicts the oldest lowest-tier entry
/// - `max_events_per_cycle`: deliveries per `process_queue` call
/// - `max_event_age`: queued events older than this many cycles are dropped
/// - `cycle_budget`: scheduler budget derived from the reading in `Kernel::run_cycle`
///
/// ## Notes
/// All fields are public. [`Config::validate`] runs when a kernel is built.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Upper bound of the reserve gauge.
    pub reserve_capacity: u32,
    /// Default minimum reserve per tier.
    pub thresholds: TierThresholds,
    /// Reserve at or above which the bus delivers everything immediately.
    pub bus_healthy_reserve: u32,
    /// Reserve below which the bus delivers only `Critical` immediately.
    pub bus_critical_reserve: u32,
    /// Maximum number of queued events.
    pub queue_capacity: usize,
    /// Maximum deliveries per queue drain.
    pub max_events_per_cycle: usize,
    /// Maximum age in cycles of a queued event.
    pub max_event_age: u64,
    /// Scheduler budget derivation.
    pub cycle_budget: CycleBudget,
}

impl Config {
    /// Returns the bus routing policy.
    #[inline]
    pub fn delivery_policy(&self) -> DeliveryPolicy {
        DeliveryPolicy {
            healthy: self.bus_healthy_reserve,
            critical: self.bus_critical_reserve,
        }
    }

    /// Clamps a raw reserve reading to the gauge.
    #[inline]
    pub fn clamp_reserve(&self, reserve: u32) -> u32 {
        reserve.min(self.reserve_capacity)
    }

    /// Checks that the settings describe a usable kernel.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reserve_capacity == 0 {
            return Err(ConfigError::ZeroCapacity {
                name: "reserve_capacity",
            });
        }
        if self.queue_capacity == 0 {
            return Err(ConfigError::ZeroCapacity {
                name: "queue_capacity",
            });
        }
        if self.max_events_per_cycle == 0 {
            return Err(ConfigError::ZeroCapacity {
                name: "max_events_per_cycle",
            });
        }
        if self.bus_critical_reserve > self.bus_healthy_reserve {
            return Err(ConfigError::InvertedBusThresholds {
                critical: self.bus_critical_reserve,
                healthy: self.bus_healthy_reserve,
            });
        }
        for (name, value) in [
            ("bus_healthy_reserve", self.bus_healthy_reserve),
            ("tier", self.thresholds.max()),
        ] {
            if value > self.reserve_capacity {
                return Err(ConfigError::ThresholdAboveCapacity {
                    name,
                    value,
                    capacity: self.reserve_capacity,
                });
            }
        }
        if let CycleBudget::Share(share) = self.cycle_budget {
            if !(share > 0.0 && share <= 1.0) {
                return Err(ConfigError::InvalidBudgetShare { share });
            }
        }
        Ok(())
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `reserve_capacity = 10_000`
    /// - `thresholds = TierThresholds::default()`
    /// - `bus_healthy_reserve = 5_000`, `bus_critical_reserve = 1_000`
    /// - `queue_capacity = 500`, `max_events_per_cycle = 50`, `max_event_age = 50`
    /// - `cycle_budget = CycleBudget::RemainingQuota`
    fn default() -> Self {
        Self {
            reserve_capacity: 10_000,
            thresholds: TierThresholds::default(),
            bus_healthy_reserve: 5_000,
            bus_critical_reserve: 1_000,
            queue_capacity: 500,
            max_events_per_cycle: 50,
            max_event_age: 50,
            cycle_budget: CycleBudget::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(Config::default().validate(), Ok(()));
    }

    #[test]
    fn inverted_bus_thresholds_are_rejected() {
        let cfg = Config {
            bus_critical_reserve: 6_000,
            bus_healthy_reserve: 2_000,
            ..Config::default()
        };
        let err = cfg.validate().unwrap_err();
        assert_eq!(err.as_label(), "config_inverted_bus_thresholds");
    }

    #[test]
    fn thresholds_must_fit_the_gauge() {
        let mut cfg = Config::default();
        cfg.reserve_capacity = 5_000;
        cfg.bus_healthy_reserve = 4_000;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::ThresholdAboveCapacity { name: "tier", .. })
        ));
    }

    #[test]
    fn zero_capacities_are_rejected() {
        let mut cfg = Config::default();
        cfg.max_events_per_cycle = 0;
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::ZeroCapacity {
                name: "max_events_per_cycle"
            })
        );
    }

    #[test]
    fn budget_share_is_bounded() {
        let mut cfg = Config::default();
        cfg.cycle_budget = CycleBudget::Share(1.5);
        assert!(cfg.validate().is_err());
        cfg.cycle_budget = CycleBudget::Share(f64::NAN);
        assert!(cfg.validate().is_err());
        cfg.cycle_budget = CycleBudget::Share(0.5);
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.cycle_budget.resolve(20.0), Some(10.0));
        assert_eq!(CycleBudget::Unbounded.resolve(20.0), None);
    }

    #[test]
    fn readings_are_clamped_to_capacity() {
        let cfg = Config::default();
        assert_eq!(cfg.clamp_reserve(12_000), 10_000);
        assert_eq!(cfg.clamp_reserve(42), 42);
    }
}
