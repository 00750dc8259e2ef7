//! The transition history log and the controller's day counter.
//!
//! Only the most recent `capacity` transitions are kept, newest first.  The
//! day counter lives here because it exists only to stamp history records:
//! agents never read it for any decision.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Mutex, RwLock};

use ct_agent::{HistorySink, TransitionRecord};
use ct_core::SimDay;

use crate::{NoopObserver, SimObserver};

pub const DEFAULT_HISTORY_CAPACITY: usize = 5;

pub struct HistoryLog {
    capacity: usize,
    entries:  Mutex<VecDeque<TransitionRecord>>,
    day:      AtomicU64,
    observer: RwLock<Arc<dyn SimObserver>>,
}

impl HistoryLog {
    /// A log keeping the `capacity` most recent records (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries:  Mutex::new(VecDeque::with_capacity(capacity)),
            day:      AtomicU64::new(0),
            observer: RwLock::new(Arc::new(NoopObserver)),
        }
    }

    /// Forward every future record to `observer` as well.
    pub fn set_observer(&self, observer: Arc<dyn SimObserver>) {
        *self.observer.write() = observer;
    }

    pub fn observer(&self) -> Arc<dyn SimObserver> {
        self.observer.read().clone()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Retained records, newest first.
    pub fn entries(&self) -> Vec<TransitionRecord> {
        self.entries.lock().iter().copied().collect()
    }

    /// Retained records rendered as display lines, newest first.
    pub fn lines(&self) -> Vec<String> {
        self.entries.lock().iter().map(ToString::to_string).collect()
    }

    /// Move to the next day and return it.
    pub fn advance_day(&self) -> SimDay {
        SimDay(self.day.fetch_add(1, Ordering::AcqRel) + 1)
    }

    /// Clear every entry and rewind to day 0.
    pub fn reset(&self) {
        self.entries.lock().clear();
        self.day.store(0, Ordering::Release);
    }
}

impl HistorySink for HistoryLog {
    fn record(&self, record: TransitionRecord) {
        {
            let mut entries = self.entries.lock();
            if entries.len() == self.capacity {
                entries.pop_back();
            }
            entries.push_front(record);
        }
        self.observer.read().on_transition(&record);
    }

    fn current_day(&self) -> SimDay {
        SimDay(self.day.load(Ordering::Acquire))
    }
}

impl Default for HistoryLog {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}
