//! # Failure boundary around a single work unit.
//!
//! Every task body and every handler invocation goes through [`run_guarded`]:
//!
//! ```text
//! run_guarded(f)
//!   ├─ f() → Ok(())        ─► Ok(())
//!   ├─ f() → Err(e)        ─► Err(e)
//!   └─ f() panics          ─► Err(WorkError::Panicked { info })
//! ```
//!
//! ## Rules
//! - A fault never propagates past the boundary; callers log and count it.
//! - The kernel holds no internal borrow while `f` runs, so a panicking unit
//!   cannot leave registry state half-updated.
//! - The process panic hook still runs (the message reaches stderr); the
//!   boundary only prevents unwinding into the caller.

use std::panic::{AssertUnwindSafe, catch_unwind};

use crate::error::WorkError;

/// Runs one work unit, converting panics into [`WorkError::Panicked`].
pub(crate) fn run_guarded<F>(f: F) -> Result<(), WorkError>
where
    F: FnOnce() -> Result<(), WorkError>,
{
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => Err(WorkError::from_panic(payload)),
    }
}
