//! The `OutputWriter` trait implemented by all backend writers.

use crate::{DailyStatsRow, OutputResult, TransitionRow};

/// Trait implemented by output backends.
///
/// Errors are returned here but stored by [`CsvObserver`](crate::CsvObserver),
/// whose observer callbacks cannot fail; retrieve them with
/// [`take_error`](crate::CsvObserver::take_error).
pub trait OutputWriter: Send {
    /// Write one end-of-day bucket row.
    fn write_daily_stats(&mut self, row: &DailyStatsRow) -> OutputResult<()>;

    /// Write one transition row.
    fn write_transition(&mut self, row: &TransitionRow) -> OutputResult<()>;

    /// Flush and close all underlying file handles.
    ///
    /// Idempotent: safe to call more than once.
    fn finish(&mut self) -> OutputResult<()>;
}
