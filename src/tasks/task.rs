//! # Task abstraction.
//!
//! This module defines the [`Task`] trait: a named, synchronous, fallible unit of
//! work the scheduler invokes at most once per cycle. The common handle type is
//! [`TaskRef`], an `Rc<dyn Task>` shared between the registry and the running pass.
//!
//! Tasks run to completion once started; the kernel has no way to suspend or
//! interrupt them, so an expensive body should declare its cost and let the
//! admission gates decide whether it starts.

use std::rc::Rc;

use crate::error::WorkError;

/// Shared handle to a task.
pub type TaskRef = Rc<dyn Task>;

/// # Synchronous unit of scheduled work.
///
/// A `Task` has a stable [`name`](Task::name), used as its registry id, and a
/// [`run`](Task::run) method invoked by the scheduler.
///
/// # Example
/// ```
/// use cyclevisor::{Task, WorkError};
///
/// struct Census;
///
/// impl Task for Census {
///     fn name(&self) -> &str { "census" }
///
///     fn run(&self) -> Result<(), WorkError> {
///         // count things...
///         Ok(())
///     }
/// }
/// ```
pub trait Task: 'static {
    /// Returns the stable task id.
    fn name(&self) -> &str;

    /// Executes one run of the task.
    ///
    /// Errors and panics are caught by the scheduler, logged with the task id and
    /// counted; they never abort the cycle or remove the registration.
    fn run(&self) -> Result<(), WorkError>;
}
