//! `CsvObserver<W>` — bridges `SimObserver` to an `OutputWriter`.

use parking_lot::Mutex;

use ct_agent::TransitionRecord;
use ct_core::SimDay;
use ct_sim::{BucketCounts, SimObserver};

use crate::row::{DailyStatsRow, TransitionRow};
use crate::writer::OutputWriter;
use crate::{OutputError, OutputResult};

/// A [`SimObserver`] that writes daily bucket rows and transitions to any
/// [`OutputWriter`] backend.
///
/// Errors from the writer are stored internally because `SimObserver`
/// methods have no return value.  After the run, check for errors with
/// [`take_error`][Self::take_error].
pub struct CsvObserver<W: OutputWriter> {
    inner: Mutex<Inner<W>>,
}

struct Inner<W> {
    writer:     W,
    last_error: Option<OutputError>,
}

impl<W: OutputWriter> Inner<W> {
    fn store_err(&mut self, result: OutputResult<()>) {
        if let Err(e) = result {
            // Keep only the first error.
            if self.last_error.is_none() {
                self.last_error = Some(e);
            }
        }
    }
}

impl<W: OutputWriter> CsvObserver<W> {
    pub fn new(writer: W) -> Self {
        Self { inner: Mutex::new(Inner { writer, last_error: None }) }
    }

    /// Take the stored write error (if any).
    ///
    /// Returns `None` if all writes succeeded.
    pub fn take_error(&self) -> Option<OutputError> {
        self.inner.lock().last_error.take()
    }

    /// Unwrap the inner writer (e.g. to inspect files after the run).
    pub fn into_writer(self) -> W {
        self.inner.into_inner().writer
    }
}

impl<W: OutputWriter> SimObserver for CsvObserver<W> {
    fn on_day_end(&self, day: SimDay, counts: &BucketCounts) {
        let mut inner = self.inner.lock();
        let result = inner.writer.write_daily_stats(&DailyStatsRow::new(day, counts));
        inner.store_err(result);
    }

    fn on_transition(&self, record: &TransitionRecord) {
        let mut inner = self.inner.lock();
        let result = inner.writer.write_transition(&TransitionRow::from(record));
        inner.store_err(result);
    }

    fn on_shutdown(&self, _final_day: SimDay) {
        let mut inner = self.inner.lock();
        let result = inner.writer.finish();
        inner.store_err(result);
    }
}
