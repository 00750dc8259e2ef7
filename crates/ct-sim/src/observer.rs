//! Simulation observer trait for progress reporting and data collection.

use ct_agent::TransitionRecord;
use ct_core::SimDay;

use crate::BucketCounts;

/// Callbacks invoked by the day clock, the history log, and shutdown.
///
/// All methods have default no-op implementations so implementors only need
/// to override what they care about.  Calls arrive from many agent tasks at
/// once, so implementations synchronise internally.
///
/// # Example: progress printer
///
/// ```rust,ignore
/// struct ProgressPrinter;
///
/// impl SimObserver for ProgressPrinter {
///     fn on_day_end(&self, day: SimDay, counts: &BucketCounts) {
///         println!("{day}: {} sick, {} dead", counts.sick, counts.dead);
///     }
/// }
/// ```
pub trait SimObserver: Send + Sync {
    /// Called once per simulated day, after the day counter has moved past
    /// `day`.  `counts` is a snapshot taken at that moment.
    fn on_day_end(&self, _day: SimDay, _counts: &BucketCounts) {}

    /// Called for every applied state transition, from the agent's own task.
    fn on_transition(&self, _record: &TransitionRecord) {}

    /// Called once when the run ends.
    fn on_shutdown(&self, _final_day: SimDay) {}
}

/// A [`SimObserver`] that does nothing.
pub struct NoopObserver;

impl SimObserver for NoopObserver {}
