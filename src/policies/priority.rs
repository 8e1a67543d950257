//! # Priority tiers shared by the scheduler and the event bus.
//!
//! [`Priority`] is a fixed, ordered set of importance classes:
//!
//! ```text
//! Critical > High > Normal > Low > Background
//! ```
//!
//! Tiers govern two things:
//! - **Order**: the scheduler walks tiers from `Critical` down to `Background`;
//!   the bus delivers to subscribers in the same order.
//! - **Admission**: every tier except `Critical` carries a minimum reserve level
//!   ([`TierThresholds`]) below which its work is held back.
//!
//! `Ord` follows importance, so `Priority::Critical > Priority::Low`.

use std::cmp::Ordering;
use std::fmt;

/// Importance class of a task, subscription or event.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Priority {
    /// Never gated. Runs even with an empty reserve.
    Critical,
    /// Important work, gated only when the reserve is nearly drained.
    High,
    /// Regular work (default).
    #[default]
    Normal,
    /// Nice-to-have work.
    Low,
    /// Work that only runs when the reserve is close to full.
    Background,
}

impl Priority {
    /// All tiers in traversal order, highest first.
    pub const ALL: [Priority; 5] = [
        Priority::Critical,
        Priority::High,
        Priority::Normal,
        Priority::Low,
        Priority::Background,
    ];

    /// Position in [`Priority::ALL`] (0 = `Critical`).
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Priority::Critical => 0,
            Priority::High => 1,
            Priority::Normal => 2,
            Priority::Low => 3,
            Priority::Background => 4,
        }
    }

    /// Returns `true` for the tier exempt from every admission gate.
    #[inline]
    pub const fn is_critical(self) -> bool {
        matches!(self, Priority::Critical)
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub const fn as_label(self) -> &'static str {
        match self {
            Priority::Critical => "critical",
            Priority::High => "high",
            Priority::Normal => "normal",
            Priority::Low => "low",
            Priority::Background => "background",
        }
    }
}

impl Ord for Priority {
    fn cmp(&self, other: &Self) -> Ordering {
        other.index().cmp(&self.index())
    }
}

impl PartialOrd for Priority {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// Default minimum reserve per tier.
///
/// `Critical` has no threshold; its slot exists only so the table can be indexed
/// by [`Priority::index`] and is always reported as `0`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TierThresholds {
    /// Minimum reserve for [`Priority::High`].
    pub high: u32,
    /// Minimum reserve for [`Priority::Normal`].
    pub normal: u32,
    /// Minimum reserve for [`Priority::Low`].
    pub low: u32,
    /// Minimum reserve for [`Priority::Background`].
    pub background: u32,
}

impl TierThresholds {
    /// Returns the minimum reserve required by `priority` (`0` for `Critical`).
    #[inline]
    pub fn min_reserve(&self, priority: Priority) -> u32 {
        match priority {
            Priority::Critical => 0,
            Priority::High => self.high,
            Priority::Normal => self.normal,
            Priority::Low => self.low,
            Priority::Background => self.background,
        }
    }

    /// Largest configured threshold.
    pub(crate) fn max(&self) -> u32 {
        self.high.max(self.normal).max(self.low).max(self.background)
    }
}

impl Default for TierThresholds {
    /// Defaults sized for a reserve gauge of 10 000:
    ///
    /// - `high = 1000`
    /// - `normal = 3000`
    /// - `low = 6000`
    /// - `background = 8500`
    fn default() -> Self {
        Self {
            high: 1_000,
            normal: 3_000,
            low: 6_000,
            background: 8_500,
        }
    }
}

/// Per-tier counters, indexed by [`Priority`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TierCounts([u32; 5]);

impl TierCounts {
    /// Returns the count for one tier.
    #[inline]
    pub fn get(&self, priority: Priority) -> u32 {
        self.0[priority.index()]
    }

    /// Sum across all tiers.
    pub fn total(&self) -> u32 {
        self.0.iter().sum()
    }

    pub(crate) fn bump(&mut self, priority: Priority) {
        let slot = &mut self.0[priority.index()];
        *slot = slot.saturating_add(1);
    }

    /// Iterates `(tier, count)` pairs, highest tier first.
    pub fn iter(&self) -> impl Iterator<Item = (Priority, u32)> + '_ {
        Priority::ALL.iter().map(move |p| (*p, self.get(*p)))
    }
}
