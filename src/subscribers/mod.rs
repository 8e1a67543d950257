//! # Event handlers and subscriptions.
//!
//! ```text
//! EventBus::on(name, f, opts) ──► SubscriberSet[name] (tier desc, registration order)
//!                                      │
//! emit / process_queue ──► deliver ───┼──► Handler::handle(&BusEvent)
//!                                      ├──► Handler::handle(&BusEvent)
//!                                      └──► ...
//! ```
//!
//! - [`Handler`] / [`HandlerFn`] the handler abstraction and its closure form
//! - [`SubscribeOptions`] tier, reserve gate and one-shot flag
//! - [`Unsubscribe`] idempotent removal capability returned by `on`/`once`

mod set;
mod subscriber;
mod subscription;

pub(crate) use set::{SubscriberSet, Subscription};
pub use subscriber::{Handler, HandlerFn, HandlerRef};
pub use subscription::{SubscribeOptions, SubscriptionId, Unsubscribe};
