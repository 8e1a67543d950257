use crate::core::{Config, CycleBudget, Kernel};
use crate::error::ConfigError;
use crate::policies::TierThresholds;

/// Builder for constructing a [`Kernel`] with fluent configuration overrides.
///
/// ## Example
/// ```
/// use cyclevisor::{CycleBudget, Kernel};
///
/// let kernel = Kernel::builder()
///     .queue_capacity(64)
///     .bus_thresholds(500, 4_000)
///     .cycle_budget(CycleBudget::Share(0.8))
///     .build()
///     .unwrap();
/// assert_eq!(kernel.config().queue_capacity, 64);
/// ```
#[derive(Clone, Debug, Default)]
pub struct KernelBuilder {
    cfg: Config,
}

impl KernelBuilder {
    /// Creates a builder starting from `cfg`.
    pub fn new(cfg: Config) -> Self {
        Self { cfg }
    }

    /// Replaces the whole configuration.
    pub fn with_config(mut self, cfg: Config) -> Self {
        self.cfg = cfg;
        self
    }

    /// Sets the upper bound of the reserve gauge.
    pub fn reserve_capacity(mut self, capacity: u32) -> Self {
        self.cfg.reserve_capacity = capacity;
        self
    }

    /// Sets the default minimum reserve per tier.
    pub fn tier_thresholds(mut self, thresholds: TierThresholds) -> Self {
        self.cfg.thresholds = thresholds;
        self
    }

    /// Sets the bus routing levels: below `critical` only `Critical` is delivered
    /// immediately, at or above `healthy` everything is.
    pub fn bus_thresholds(mut self, critical: u32, healthy: u32) -> Self {
        self.cfg.bus_critical_reserve = critical;
        self.cfg.bus_healthy_reserve = healthy;
        self
    }

    /// Sets the deferred queue bound.
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.cfg.queue_capacity = capacity;
        self
    }

    /// Sets the number of queued events delivered per drain.
    pub fn max_events_per_cycle(mut self, max: usize) -> Self {
        self.cfg.max_events_per_cycle = max;
        self
    }

    /// Sets the age in cycles after which a queued event is dropped.
    pub fn max_event_age(mut self, cycles: u64) -> Self {
        self.cfg.max_event_age = cycles;
        self
    }

    /// Sets how the scheduler budget is derived from each reading.
    pub fn cycle_budget(mut self, budget: CycleBudget) -> Self {
        self.cfg.cycle_budget = budget;
        self
    }

    /// Validates the configuration and builds the kernel.
    ///
    /// ### Errors
    /// [`ConfigError`] if the configuration is unusable.
    pub fn build(self) -> Result<Kernel, ConfigError> {
        Kernel::new(self.cfg)
    }
}
