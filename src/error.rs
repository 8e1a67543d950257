//! Error types used by the cyclevisor kernel and its work units.
//!
//! This module defines three enums:
//!
//! - [`WorkError`] outcome of a single failing work unit (task body or event handler).
//! - [`RegistrationError`] a task definition rejected at [`Scheduler::register`](crate::Scheduler::register).
//! - [`ConfigError`] a kernel configuration rejected at build time.
//!
//! All of them provide `as_label` / `as_message` helpers for logs and telemetry.
//! None of them ever escape a per-cycle entry point: work faults are recovered at
//! the call site and only surface through logs and statistics.

use thiserror::Error;

/// # Errors produced by a work unit.
///
/// Task bodies and event handlers return `Result<(), WorkError>`. The kernel also
/// converts a caught panic into [`WorkError::Panicked`] so both failure shapes are
/// counted and logged the same way.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkError {
    /// The unit reported a failure.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// The unit panicked; the panic was caught by the kernel's failure boundary.
    #[error("panicked: {info}")]
    Panicked {
        /// Panic payload rendered as text.
        info: String,
    },
}

impl WorkError {
    /// Shorthand for [`WorkError::Fail`].
    ///
    /// # Example
    /// ```
    /// use cyclevisor::WorkError;
    ///
    /// let err = WorkError::fail("no path to target");
    /// assert_eq!(err.as_label(), "work_failed");
    /// ```
    pub fn fail(error: impl Into<String>) -> Self {
        WorkError::Fail {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            WorkError::Fail { .. } => "work_failed",
            WorkError::Panicked { .. } => "work_panicked",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            WorkError::Fail { error } => format!("error: {error}"),
            WorkError::Panicked { info } => format!("panic: {info}"),
        }
    }

    /// Builds a [`WorkError::Panicked`] from a `catch_unwind` payload.
    pub(crate) fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let info = if let Some(msg) = payload.downcast_ref::<&'static str>() {
            (*msg).to_string()
        } else if let Some(msg) = payload.downcast_ref::<String>() {
            msg.clone()
        } else {
            "unknown panic".to_string()
        };
        WorkError::Panicked { info }
    }
}

/// # Errors produced by task registration.
///
/// Invalid definitions fail fast instead of being coerced into something runnable.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistrationError {
    /// Task id was empty or whitespace only.
    #[error("task id must not be empty")]
    EmptyId,

    /// Interval was below one cycle.
    #[error("task {task:?}: interval must be >= 1 cycle, got {interval}")]
    InvalidInterval {
        /// Offending task id.
        task: String,
        /// Rejected interval.
        interval: u64,
    },

    /// Cost estimate was negative or not finite.
    #[error("task {task:?}: cost must be a finite, non-negative number, got {cost}")]
    InvalidCost {
        /// Offending task id.
        task: String,
        /// Rejected cost.
        cost: f64,
    },
}

impl RegistrationError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use cyclevisor::RegistrationError;
    ///
    /// let err = RegistrationError::InvalidInterval { task: "haul".into(), interval: 0 };
    /// assert_eq!(err.as_label(), "registration_invalid_interval");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RegistrationError::EmptyId => "registration_empty_id",
            RegistrationError::InvalidInterval { .. } => "registration_invalid_interval",
            RegistrationError::InvalidCost { .. } => "registration_invalid_cost",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        self.to_string()
    }
}

/// # Errors produced by configuration validation.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// The bus critical threshold sits above its healthy threshold.
    #[error("bus critical reserve {critical} exceeds healthy reserve {healthy}")]
    InvertedBusThresholds {
        /// Configured critical threshold.
        critical: u32,
        /// Configured healthy threshold.
        healthy: u32,
    },

    /// A threshold lies outside the reserve gauge.
    #[error("{name} threshold {value} exceeds reserve capacity {capacity}")]
    ThresholdAboveCapacity {
        /// Which threshold.
        name: &'static str,
        /// Configured value.
        value: u32,
        /// Configured reserve capacity.
        capacity: u32,
    },

    /// A capacity-like setting was zero.
    #[error("{name} must be greater than zero")]
    ZeroCapacity {
        /// Which setting.
        name: &'static str,
    },

    /// Budget share outside `(0, 1]`.
    #[error("cycle budget share must be in (0, 1], got {share}")]
    InvalidBudgetShare {
        /// Configured share.
        share: f64,
    },
}

impl ConfigError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::InvertedBusThresholds { .. } => "config_inverted_bus_thresholds",
            ConfigError::ThresholdAboveCapacity { .. } => "config_threshold_above_capacity",
            ConfigError::ZeroCapacity { .. } => "config_zero_capacity",
            ConfigError::InvalidBudgetShare { .. } => "config_invalid_budget_share",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        self.to_string()
    }
}
