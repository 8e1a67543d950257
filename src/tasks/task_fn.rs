//! # Function-backed task (`TaskFn`)
//!
//! [`TaskFn`] wraps a closure `F: Fn() -> Result<(), WorkError>`. The closure is
//! called once per run; state that must survive between runs lives in captured
//! `Cell`/`RefCell` values or in kernel handles captured by clone.
//!
//! ## Example
//! ```rust
//! use cyclevisor::{TaskFn, TaskRef, WorkError};
//!
//! let t: TaskRef = TaskFn::rc("census", || Ok::<_, WorkError>(()));
//! assert_eq!(t.name(), "census");
//! ```

use std::borrow::Cow;
use std::fmt;
use std::rc::Rc;

use crate::error::WorkError;
use crate::tasks::task::Task;

/// Function-backed task implementation.
pub struct TaskFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> TaskFn<F> {
    /// Creates a new function-backed task.
    ///
    /// Prefer [`TaskFn::rc`] when you immediately need a [`TaskRef`](crate::TaskRef).
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Creates the task and returns it as a shared handle.
    pub fn rc(name: impl Into<Cow<'static, str>>, f: F) -> Rc<Self> {
        Rc::new(Self::new(name, f))
    }
}

impl<F> fmt::Debug for TaskFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskFn").field("name", &self.name).finish()
    }
}

impl<F> Task for TaskFn<F>
where
    F: Fn() -> Result<(), WorkError> + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self) -> Result<(), WorkError> {
        (self.f)()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[test]
    fn closure_is_called_per_run() {
        let calls = Rc::new(Cell::new(0));
        let task = {
            let calls = calls.clone();
            TaskFn::new("counter", move || -> Result<(), WorkError> {
                calls.set(calls.get() + 1);
                Ok(())
            })
        };
        assert_eq!(task.run(), Ok(()));
        assert_eq!(task.run(), Ok(()));
        assert_eq!(calls.get(), 2);
        assert_eq!(format!("{task:?}"), "TaskFn { name: \"counter\" }");
    }

    #[test]
    fn errors_pass_through() {
        let task = TaskFn::new("broken", || Err::<(), _>(WorkError::fail("no spawn")));
        assert_eq!(task.run(), Err(WorkError::fail("no spawn")));
    }
}
