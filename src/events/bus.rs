//! # EventBus: reserve-aware synchronous pub/sub with a deferred queue.
//!
//! ```text
//! emit(name, metadata, opts)
//!   └─► DeliveryPolicy::route(priority, immediate, reserve)
//!         ├─ Deliver ─► deliver(event)                     (now, in emit)
//!         └─ Queue   ─► DeferredQueue::push                (may evict)
//!
//! process_queue()                                          (once per cycle)
//!   ├─► purge_stale(cycle, max_event_age)                  (dropped_stale)
//!   └─► up to max_events_per_cycle × pop_highest ─► deliver(event)
//!
//! deliver(event)
//!   snapshot subscribers[name]
//!   for each subscription:
//!     ├─ removed earlier in this delivery?       ─► ignore
//!     ├─ min_reserve above current reserve?      ─► ignore (not an invocation)
//!     ├─ once?                                   ─► remove before invoking
//!     └─ run_guarded(handler.handle(event))      ─► handlers_invoked / handler_errors
//! ```
//!
//! ## Rules
//! - No internal borrow is held while a handler runs: handlers may subscribe,
//!   unsubscribe or emit through a cloned bus handle.
//! - Events emitted during a drain may be delivered by that same drain while
//!   the per-cycle cap allows.
//! - A delivered event is final even if every handler failed.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::core::Config;
use crate::core::clock::Clock;
use crate::core::runner::run_guarded;
use crate::error::WorkError;
use crate::events::queue::{DeferredQueue, QueuedEvent};
use crate::events::{BusEvent, BusStats, DrainReport, EmitOptions, EmitOutcome};
use crate::policies::Route;
use crate::subscribers::{
    HandlerFn, HandlerRef, SubscribeOptions, SubscriberSet, Subscription, SubscriptionId,
    Unsubscribe,
};

#[derive(Default)]
pub(crate) struct BusState {
    pub(crate) subscribers: SubscriberSet,
    queue: DeferredQueue,
    stats: BusStats,
}

/// Cheap-clone handle to a kernel's event bus.
///
/// All clones share one subscriber registry, queue and counters. Obtain it from
/// [`Kernel::bus`](crate::Kernel::bus).
#[derive(Clone)]
pub struct EventBus {
    state: Rc<RefCell<BusState>>,
    draining: Rc<Cell<bool>>,
    clock: Clock,
    config: Rc<Config>,
}

/// Clears the draining flag when a drain ends, including by unwinding.
struct DrainGuard<'a>(&'a Cell<bool>);

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl EventBus {
    pub(crate) fn new(clock: Clock, config: Rc<Config>) -> Self {
        Self {
            state: Rc::new(RefCell::new(BusState::default())),
            draining: Rc::new(Cell::new(false)),
            clock,
            config,
        }
    }

    /// Subscribes a closure to `name`.
    ///
    /// Returns a capability that removes the subscription; dropping it does not.
    pub fn on<F>(&self, name: &str, f: F, opts: SubscribeOptions) -> Unsubscribe
    where
        F: Fn(&BusEvent) -> Result<(), WorkError> + 'static,
    {
        let handler: HandlerRef = HandlerFn::rc(name.to_string(), f);
        self.subscribe(name, handler, opts)
    }

    /// Like [`on`](Self::on), but the subscription is removed before its first invocation.
    pub fn once<F>(&self, name: &str, f: F, opts: SubscribeOptions) -> Unsubscribe
    where
        F: Fn(&BusEvent) -> Result<(), WorkError> + 'static,
    {
        self.on(name, f, opts.one_shot())
    }

    /// Subscribes an existing handler to `name`.
    pub fn subscribe(&self, name: &str, handler: HandlerRef, opts: SubscribeOptions) -> Unsubscribe {
        let handler_name = handler.name().to_string();
        let id = self
            .state
            .borrow_mut()
            .subscribers
            .insert(name, handler, opts);
        debug!(event = %name, subscription = %id, handler = %handler_name, priority = %opts.priority, once = opts.once, "handler subscribed");
        Unsubscribe::new(id, Rc::downgrade(&self.state))
    }

    /// Removes one subscription. Returns `false` if it was already gone.
    pub fn off(&self, id: SubscriptionId) -> bool {
        self.state.borrow_mut().subscribers.remove(id)
    }

    /// Removes every handler of `name`; returns how many were removed.
    pub fn off_all(&self, name: &str) -> usize {
        self.state.borrow_mut().subscribers.remove_all(name)
    }

    /// Number of handlers subscribed to `name`.
    pub fn handler_count(&self, name: &str) -> usize {
        self.state.borrow().subscribers.count(name)
    }

    /// Returns `true` if `name` has at least one handler.
    pub fn has_handlers(&self, name: &str) -> bool {
        self.handler_count(name) > 0
    }

    /// Number of queued events.
    pub fn queue_len(&self) -> usize {
        self.state.borrow().queue.len()
    }

    /// Removes every subscription and every queued event. Counters are kept.
    pub fn clear(&self) {
        let mut state = self.state.borrow_mut();
        state.subscribers.clear();
        state.queue.clear();
    }

    /// Current counters with live queue and handler gauges.
    pub fn stats(&self) -> BusStats {
        let state = self.state.borrow();
        BusStats {
            queue_size: state.queue.len(),
            handler_count: state.subscribers.total(),
            ..state.stats
        }
    }

    /// Zeroes the cumulative counters.
    pub fn reset_stats(&self) {
        self.state.borrow_mut().stats.reset_counters();
    }

    /// Emits an event stamped with the current cycle.
    ///
    /// Routing depends on `opts` and the current reserve:
    /// - `immediate`, or reserve at or above the healthy level: delivered now
    /// - reserve below the critical level: only `Critical` is delivered now
    /// - otherwise `Normal` and above are delivered now
    ///
    /// Everything else is queued for [`process_queue`](Self::process_queue).
    pub fn emit(&self, name: &str, metadata: Value, opts: EmitOptions) -> EmitOutcome {
        let cycle = self.clock.cycle();
        let reserve = self.clock.reserve();
        let event = BusEvent::new(name, opts.priority, cycle, metadata);
        self.state.borrow_mut().stats.events_emitted += 1;

        match self
            .config
            .delivery_policy()
            .route(opts.priority, opts.immediate, reserve)
        {
            Route::Deliver => EmitOutcome::Delivered {
                invoked: self.deliver(&event),
            },
            Route::Queue => {
                let evicted = {
                    let mut state = self.state.borrow_mut();
                    state.stats.events_deferred += 1;
                    let evicted = state.queue.push(
                        QueuedEvent {
                            event,
                            enqueued: cycle,
                        },
                        self.config.queue_capacity,
                    );
                    if evicted.is_some() {
                        state.stats.record_capacity_drop();
                    }
                    evicted
                };
                trace!(event = %name, priority = %opts.priority, reserve, "event queued");
                match evicted {
                    Some(old) => {
                        debug!(
                            event = %name,
                            evicted = %old.event.name,
                            evicted_priority = %old.event.priority,
                            "queue full; evicted oldest lowest-tier event"
                        );
                        EmitOutcome::QueuedWithEviction { evicted: old.event }
                    }
                    None => EmitOutcome::Queued,
                }
            }
        }
    }

    /// Drains the deferred queue for the current cycle.
    ///
    /// Stale entries are dropped first and do not count against
    /// `max_events_per_cycle`. A nested call from inside a handler is refused.
    pub fn process_queue(&self) -> DrainReport {
        let cycle = self.clock.cycle();
        if self.draining.replace(true) {
            warn!(cycle, "queue drain already in progress; nested drain ignored");
            return DrainReport {
                cycle,
                remaining: self.queue_len(),
                ..DrainReport::default()
            };
        }
        let _guard = DrainGuard(&self.draining);

        let dropped_stale = {
            let mut state = self.state.borrow_mut();
            let n = state.queue.purge_stale(cycle, self.config.max_event_age);
            state.stats.record_stale_drops(n);
            n
        };
        if dropped_stale > 0 {
            debug!(cycle, dropped = dropped_stale, max_age = self.config.max_event_age, "stale events dropped");
        }

        let mut delivered = 0;
        while delivered < self.config.max_events_per_cycle {
            let next = self.state.borrow_mut().queue.pop_highest();
            let Some(entry) = next else {
                break;
            };
            trace!(event = %entry.event.name, age = entry.age(cycle), "delivering queued event");
            self.deliver(&entry.event);
            delivered += 1;
        }

        let report = DrainReport {
            cycle,
            delivered,
            dropped_stale,
            remaining: self.queue_len(),
        };
        trace!(cycle, delivered, dropped_stale, remaining = report.remaining, "queue drained");
        report
    }

    /// Delivers one event to a snapshot of its subscribers; returns invocations.
    fn deliver(&self, event: &BusEvent) -> usize {
        let subscribers = self.state.borrow().subscribers.snapshot(&event.name);
        let reserve = self.clock.reserve();
        let mut invoked = 0;

        for sub in subscribers {
            if !self.admit(&sub, reserve) {
                continue;
            }
            let outcome = run_guarded(|| sub.handler.handle(event));
            invoked += 1;
            {
                let mut state = self.state.borrow_mut();
                state.stats.handlers_invoked += 1;
                if outcome.is_err() {
                    state.stats.handler_errors += 1;
                }
            }
            if let Err(error) = outcome {
                warn!(
                    event = %event.name,
                    subscription = %sub.id,
                    handler = sub.handler.name(),
                    label = error.as_label(),
                    %error,
                    "event handler failed"
                );
            }
        }

        self.state.borrow_mut().stats.events_processed += 1;
        invoked
    }

    /// Decides whether `sub` is invoked now; a `once` subscription is consumed here.
    fn admit(&self, sub: &Subscription, reserve: u32) -> bool {
        let mut state = self.state.borrow_mut();
        if !state.subscribers.contains(sub.id) {
            return false;
        }
        if let Some(min) = sub.min_reserve {
            if reserve < min {
                drop(state);
                debug!(subscription = %sub.id, reserve, required = min, "handler skipped by reserve gate");
                return false;
            }
        }
        if sub.once {
            state.subscribers.remove(sub.id);
        }
        true
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let stats = self.stats();
        f.debug_struct("EventBus")
            .field("handlers", &stats.handler_count)
            .field("queued", &stats.queue_size)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::core::budget::BudgetReading;
    use crate::policies::Priority;

    type Log = Rc<RefCell<Vec<String>>>;

    fn setup(config: Config) -> (EventBus, Clock) {
        let clock = Clock::new();
        let bus = EventBus::new(clock.clone(), Rc::new(config));
        (bus, clock)
    }

    fn at_reserve(clock: &Clock, reserve: u32) {
        clock.advance(BudgetReading::new(10.0, reserve));
    }

    fn record(log: &Log, tag: &'static str) -> impl Fn(&BusEvent) -> Result<(), WorkError> + 'static {
        let log = log.clone();
        move |ev: &BusEvent| -> Result<(), WorkError> {
            log.borrow_mut().push(format!("{tag}:{}", ev.name));
            Ok(())
        }
    }

    #[test]
    fn handlers_run_in_tier_then_registration_order() {
        let (bus, clock) = setup(Config::default());
        let log: Log = Rc::default();
        bus.on("x", record(&log, "low"), SubscribeOptions::new().with_priority(Priority::Low));
        bus.on("x", record(&log, "n1"), SubscribeOptions::new());
        bus.on("x", record(&log, "crit"), SubscribeOptions::new().with_priority(Priority::Critical));
        bus.on("x", record(&log, "n2"), SubscribeOptions::new());

        at_reserve(&clock, 10_000);
        let outcome = bus.emit("x", Value::Null, EmitOptions::new());
        assert_eq!(outcome, EmitOutcome::Delivered { invoked: 4 });
        assert_eq!(*log.borrow(), vec!["crit:x", "n1:x", "n2:x", "low:x"]);
    }

    #[test]
    fn routing_follows_reserve_bands() {
        let (bus, clock) = setup(Config::default());

        at_reserve(&clock, 500);
        assert!(bus.emit("a", Value::Null, EmitOptions::new().with_priority(Priority::High)).is_queued());
        assert!(bus.emit("a", Value::Null, EmitOptions::new().with_priority(Priority::Critical)).is_delivered());
        assert!(bus.emit("a", Value::Null, EmitOptions::new().immediate()).is_delivered());

        at_reserve(&clock, 2_000);
        assert!(bus.emit("a", Value::Null, EmitOptions::new()).is_delivered());
        assert!(bus.emit("a", Value::Null, EmitOptions::new().with_priority(Priority::Low)).is_queued());

        at_reserve(&clock, 5_000);
        assert!(bus.emit("a", Value::Null, EmitOptions::new().with_priority(Priority::Background)).is_delivered());

        let stats = bus.stats();
        assert_eq!(stats.events_emitted, 6);
        assert_eq!(stats.events_deferred, 2);
        assert_eq!(stats.events_processed, 4);
        assert_eq!(stats.queue_size, 2);
    }

    #[test]
    fn once_is_removed_before_invocation_even_on_failure() {
        let (bus, clock) = setup(Config::default());
        let calls = Rc::new(Cell::new(0));
        let seen = calls.clone();
        bus.once(
            "boom",
            move |_: &BusEvent| {
                seen.set(seen.get() + 1);
                Err(WorkError::fail("first and last"))
            },
            SubscribeOptions::new(),
        );

        at_reserve(&clock, 10_000);
        assert_eq!(bus.handler_count("boom"), 1);
        bus.emit("boom", Value::Null, EmitOptions::new());
        bus.emit("boom", Value::Null, EmitOptions::new());
        assert_eq!(calls.get(), 1);
        assert!(!bus.has_handlers("boom"));
        assert_eq!(bus.stats().handler_errors, 1);
    }

    #[test]
    fn min_reserve_skip_keeps_once_subscription() {
        let (bus, clock) = setup(Config::default());
        let calls = Rc::new(Cell::new(0));
        let seen = calls.clone();
        bus.once(
            "x",
            move |_: &BusEvent| {
                seen.set(seen.get() + 1);
                Ok(())
            },
            SubscribeOptions::new().with_min_reserve(7_000),
        );

        at_reserve(&clock, 6_000);
        assert_eq!(
            bus.emit("x", Value::Null, EmitOptions::new()),
            EmitOutcome::Delivered { invoked: 0 }
        );
        assert_eq!(bus.handler_count("x"), 1);

        at_reserve(&clock, 7_000);
        bus.emit("x", Value::Null, EmitOptions::new());
        assert_eq!(calls.get(), 1);
        assert_eq!(bus.handler_count("x"), 0);
        assert_eq!(bus.stats().events_processed, 2);
    }

    #[test]
    fn handler_unsubscribing_a_later_one_prevents_its_call() {
        let (bus, clock) = setup(Config::default());
        let log: Log = Rc::default();
        let victim: Rc<RefCell<Option<Unsubscribe>>> = Rc::default();
        let slot = victim.clone();
        bus.on(
            "x",
            move |_: &BusEvent| {
                if let Some(handle) = slot.borrow().as_ref() {
                    handle.unsubscribe();
                }
                Ok(())
            },
            SubscribeOptions::new().with_priority(Priority::High),
        );
        *victim.borrow_mut() = Some(bus.on("x", record(&log, "victim"), SubscribeOptions::new()));

        at_reserve(&clock, 10_000);
        assert_eq!(
            bus.emit("x", Value::Null, EmitOptions::new()),
            EmitOutcome::Delivered { invoked: 1 }
        );
        assert!(log.borrow().is_empty());
        let handle = victim.borrow_mut().take().unwrap();
        assert!(!handle.unsubscribe());
    }

    #[test]
    fn failing_handlers_are_isolated() {
        let (bus, clock) = setup(Config::default());
        let log: Log = Rc::default();
        bus.on(
            "x",
            |_: &BusEvent| -> Result<(), WorkError> { panic!("handler blew up") },
            SubscribeOptions::new().with_priority(Priority::High),
        );
        bus.on("x", |_: &BusEvent| Err(WorkError::fail("bad")), SubscribeOptions::new());
        bus.on("x", record(&log, "ok"), SubscribeOptions::new());

        at_reserve(&clock, 10_000);
        let outcome = bus.emit("x", json!({"k": 1}), EmitOptions::new());
        assert_eq!(outcome, EmitOutcome::Delivered { invoked: 3 });
        assert_eq!(*log.borrow(), vec!["ok:x"]);
        let stats = bus.stats();
        assert_eq!(stats.handlers_invoked, 3);
        assert_eq!(stats.handler_errors, 2);
        assert_eq!(stats.events_processed, 1);
    }

    #[test]
    fn drain_purges_stale_then_delivers_up_to_cap() {
        let config = Config {
            max_events_per_cycle: 2,
            max_event_age: 3,
            ..Config::default()
        };
        let (bus, clock) = setup(config);
        let log: Log = Rc::default();
        bus.on("e", record(&log, "h"), SubscribeOptions::new());

        at_reserve(&clock, 0);
        bus.emit("e", json!({"n": "old"}), EmitOptions::new().with_priority(Priority::Low));
        for _ in 0..3 {
            at_reserve(&clock, 0);
        }
        for _ in 0..3 {
            bus.emit("e", Value::Null, EmitOptions::new().with_priority(Priority::Low));
        }
        at_reserve(&clock, 0);

        // cycle 5: the entry from cycle 1 is 4 cycles old
        let report = bus.process_queue();
        assert_eq!(report.dropped_stale, 1);
        assert_eq!(report.delivered, 2);
        assert_eq!(report.remaining, 1);
        assert_eq!(log.borrow().len(), 2);

        let stats = bus.stats();
        assert_eq!(stats.dropped_stale, 1);
        assert_eq!(stats.events_dropped, 1);
    }

    #[test]
    fn overflow_reports_eviction() {
        let config = Config {
            queue_capacity: 2,
            ..Config::default()
        };
        let (bus, clock) = setup(config);
        at_reserve(&clock, 0);

        bus.emit("bg", Value::Null, EmitOptions::new().with_priority(Priority::Background));
        bus.emit("low", Value::Null, EmitOptions::new().with_priority(Priority::Low));
        let outcome = bus.emit("high", Value::Null, EmitOptions::new().with_priority(Priority::High));
        match outcome {
            EmitOutcome::QueuedWithEviction { evicted } => assert_eq!(&*evicted.name, "bg"),
            other => panic!("unexpected outcome: {other:?}"),
        }
        let stats = bus.stats();
        assert_eq!(stats.dropped_capacity, 1);
        assert_eq!(stats.queue_size, 2);
    }

    #[test]
    fn handler_emits_during_drain() {
        let (bus, clock) = setup(Config::default());
        let log: Log = Rc::default();
        let inner = bus.clone();
        bus.on(
            "first",
            move |_: &BusEvent| {
                inner.emit("second", Value::Null, EmitOptions::new().with_priority(Priority::Low));
                Ok(())
            },
            SubscribeOptions::new(),
        );
        bus.on("second", record(&log, "h"), SubscribeOptions::new());

        at_reserve(&clock, 0);
        bus.emit("first", Value::Null, EmitOptions::new().with_priority(Priority::Low));
        let report = bus.process_queue();
        assert_eq!(report.delivered, 2);
        assert_eq!(*log.borrow(), vec!["h:second"]);
    }

    #[test]
    fn reset_stats_and_clear() {
        let (bus, clock) = setup(Config::default());
        bus.on("x", |_: &BusEvent| Ok(()), SubscribeOptions::new());
        at_reserve(&clock, 0);
        bus.emit("x", Value::Null, EmitOptions::new());

        bus.reset_stats();
        let stats = bus.stats();
        assert_eq!(stats.events_emitted, 0);
        assert_eq!(stats.queue_size, 1);
        assert_eq!(stats.handler_count, 1);

        bus.clear();
        assert_eq!(bus.queue_len(), 0);
        assert!(!bus.has_handlers("x"));
        assert_eq!(bus.off_all("x"), 0);
    }
}
