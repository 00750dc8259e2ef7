//! Simulation cadence.
//!
//! # Design
//!
//! Every agent ticks on its own wall-clock interval.  A *day* is not a global
//! event: each agent counts its own ticks with a [`FrameCounter`] and runs
//! its daily disease progression when the counter reaches
//! [`FRAMES_PER_DAY`].  Because every agent uses the same interval the days
//! line up approximately, never exactly.
//!
//! [`SimDay`] is the controller's day number.  Agents read it only to stamp
//! history records; it never drives any agent logic.

use std::fmt;
use std::time::Duration;

/// Ticks per simulated day.
pub const FRAMES_PER_DAY: u32 = 5;

/// Wall-clock length of one simulated day for a given tick interval.
#[inline]
pub fn day_length(tick_interval: Duration) -> Duration {
    tick_interval * FRAMES_PER_DAY
}

// ── FrameCounter ──────────────────────────────────────────────────────────────

/// Per-agent tick counter that reports day boundaries.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameCounter(u32);

impl FrameCounter {
    pub const ZERO: FrameCounter = FrameCounter(0);

    /// Count one tick.  Returns `true` (and rewinds to zero) on the tick that
    /// completes a day.
    #[inline]
    pub fn advance(&mut self) -> bool {
        self.0 += 1;
        if self.0 >= FRAMES_PER_DAY {
            self.0 = 0;
            true
        } else {
            false
        }
    }

    /// Ticks counted since the last day boundary.
    #[inline]
    pub fn frames(self) -> u32 {
        self.0
    }

    #[inline]
    pub fn reset(&mut self) {
        self.0 = 0;
    }
}

// ── SimDay ────────────────────────────────────────────────────────────────────

/// Day number since the simulation (re)started.  Day 0 is the first day.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimDay(pub u64);

impl SimDay {
    pub const ZERO: SimDay = SimDay(0);

    #[inline]
    pub fn next(self) -> SimDay {
        SimDay(self.0 + 1)
    }
}

impl fmt::Display for SimDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Day {}", self.0)
    }
}
