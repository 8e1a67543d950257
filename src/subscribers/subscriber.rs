//! # Event handler trait.
//!
//! Provides [`Handler`] the extension point for reacting to [`BusEvent`]s, and
//! [`HandlerFn`] a closure-backed implementation used by
//! [`EventBus::on`](crate::EventBus::on).
//!
//! ## Rules
//! - Handlers run synchronously inside `emit` or `process_queue`.
//! - Errors and panics are caught per invocation, logged with the event name and
//!   subscription id, and counted; the remaining handlers still run.
//! - A handler may subscribe, unsubscribe or emit through a cloned bus handle.
//!
//! ## Example
//! ```rust
//! use cyclevisor::{BusEvent, Handler, WorkError};
//!
//! struct Tally;
//!
//! impl Handler for Tally {
//!     fn handle(&self, event: &BusEvent) -> Result<(), WorkError> {
//!         if event.meta("amount").is_none() {
//!             return Err(WorkError::fail("amount missing"));
//!         }
//!         Ok(())
//!     }
//!
//!     fn name(&self) -> &str { "tally" }
//! }
//! ```

use std::borrow::Cow;
use std::fmt;
use std::rc::Rc;

use crate::error::WorkError;
use crate::events::BusEvent;

/// Shared handle to a handler.
pub type HandlerRef = Rc<dyn Handler>;

/// Reacts to bus events.
pub trait Handler: 'static {
    /// Processes one event.
    fn handle(&self, event: &BusEvent) -> Result<(), WorkError>;

    /// Returns the handler name used in logs.
    ///
    /// The default uses `type_name::<Self>()`, which can be verbose; override it when possible.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Closure-backed handler.
pub struct HandlerFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> HandlerFn<F> {
    /// Creates a named closure handler.
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Creates the handler and returns it as a shared handle.
    pub fn rc(name: impl Into<Cow<'static, str>>, f: F) -> Rc<Self> {
        Rc::new(Self::new(name, f))
    }
}

impl<F> fmt::Debug for HandlerFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerFn").field("name", &self.name).finish()
    }
}

impl<F> Handler for HandlerFn<F>
where
    F: Fn(&BusEvent) -> Result<(), WorkError> + 'static,
{
    fn handle(&self, event: &BusEvent) -> Result<(), WorkError> {
        (self.f)(event)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
