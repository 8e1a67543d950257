//! Bus counters and per-drain reports.

/// Cumulative bus statistics.
///
/// Counters accumulate until [`EventBus::reset_stats`](crate::EventBus::reset_stats);
/// `queue_size` and `handler_count` are live values sampled by
/// [`EventBus::stats`](crate::EventBus::stats).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BusStats {
    /// Calls to `emit`.
    pub events_emitted: u64,
    /// Events delivered, immediately or from the queue.
    pub events_processed: u64,
    /// Events routed into the queue.
    pub events_deferred: u64,
    /// Queued events discarded for any reason.
    pub events_dropped: u64,
    /// Queued events evicted by overflow.
    pub dropped_capacity: u64,
    /// Queued events discarded for exceeding the maximum age.
    pub dropped_stale: u64,
    /// Handler invocations, failing ones included.
    pub handlers_invoked: u64,
    /// Handler invocations that returned an error or panicked.
    pub handler_errors: u64,
    /// Events currently queued.
    pub queue_size: usize,
    /// Live subscriptions across all event names.
    pub handler_count: usize,
}

impl BusStats {
    pub(crate) fn record_capacity_drop(&mut self) {
        self.events_dropped += 1;
        self.dropped_capacity += 1;
    }

    pub(crate) fn record_stale_drops(&mut self, n: usize) {
        self.events_dropped += n as u64;
        self.dropped_stale += n as u64;
    }

    /// Zeroes the counters; live gauges are left as they are.
    pub(crate) fn reset_counters(&mut self) {
        *self = BusStats {
            queue_size: self.queue_size,
            handler_count: self.handler_count,
            ..BusStats::default()
        };
    }
}

/// Outcome of one [`EventBus::process_queue`](crate::EventBus::process_queue) call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Cycle the drain ran in.
    pub cycle: u64,
    /// Events delivered by this drain.
    pub delivered: usize,
    /// Events discarded as stale by this drain.
    pub dropped_stale: usize,
    /// Events still queued afterwards.
    pub remaining: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_feed_the_total() {
        let mut stats = BusStats::default();
        stats.record_capacity_drop();
        stats.record_stale_drops(3);
        assert_eq!(stats.events_dropped, 4);
        assert_eq!(stats.dropped_capacity, 1);
        assert_eq!(stats.dropped_stale, 3);
    }

    #[test]
    fn reset_keeps_gauges() {
        let mut stats = BusStats {
            events_emitted: 9,
            queue_size: 2,
            handler_count: 5,
            ..BusStats::default()
        };
        stats.reset_counters();
        assert_eq!(stats.events_emitted, 0);
        assert_eq!(stats.queue_size, 2);
        assert_eq!(stats.handler_count, 5);
    }
}
