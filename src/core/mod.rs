//! Runtime core: configuration, cycle clock and the kernel.
//!
//! Internal modules:
//! - [`budget`]: budget readings and the [`BudgetSource`] seam to the host;
//! - [`clock`]: cycle counter and reading shared by scheduler and bus;
//! - [`runner`]: failure boundary around one work unit;
//! - [`kernel`]: the context object tying scheduler, bus and clock together;
//! - `driver`: async host loop (feature `driver`);
//! - `shutdown`: cross-platform shutdown signal handling (feature `driver`).

pub(crate) mod budget;
mod builder;
pub(crate) mod clock;
mod config;
#[cfg(feature = "driver")]
mod driver;
mod kernel;
pub(crate) mod runner;
#[cfg(feature = "driver")]
pub(crate) mod shutdown;

pub use budget::{BudgetReading, BudgetSource};
pub use builder::KernelBuilder;
pub use config::{Config, CycleBudget};
#[cfg(feature = "driver")]
pub use driver::CycleDriver;
pub use kernel::{CycleReport, Kernel, WeakKernel};
