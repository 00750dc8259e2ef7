//! Outbound reporting interfaces.
//!
//! Agents report two things while they run: population-metric adjustments
//! (consumed by the bar chart / stats aggregate) and transition records
//! (consumed by the history log).  Both sinks are called from many agent
//! tasks at once, so implementations must do their own synchronisation.

use std::fmt;
use std::sync::Arc;

use ct_core::{AgentId, SimDay};

use crate::DiseaseState;

/// Population-metric bucket.
///
/// There is no `Infected` bucket: an infected agent still counts as
/// `Vulnerable` until its symptoms are decided.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Bucket {
    Vulnerable,
    Sick,
    Asymptomatic,
    Immune,
    Dead,
}

/// One signed adjustment to one bucket.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MetricDelta {
    pub bucket: Bucket,
    pub delta:  i64,
}

impl MetricDelta {
    pub const fn new(bucket: Bucket, delta: i64) -> Self {
        Self { bucket, delta }
    }
}

/// Receives population-metric adjustments.
pub trait MetricsSink: Send + Sync {
    fn adjust(&self, bucket: Bucket, delta: i64);
}

/// One applied transition: who, into what, on which day.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TransitionRecord {
    pub agent: AgentId,
    pub state: DiseaseState,
    pub day:   SimDay,
}

impl fmt::Display for TransitionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Agent {} became {} on Day {}", self.agent.0, self.state.label(), self.day.0)
    }
}

/// Receives transition records and supplies the current day used to stamp
/// them.
pub trait HistorySink: Send + Sync {
    fn record(&self, record: TransitionRecord);

    /// The controller's current day.  Only used for reporting.
    fn current_day(&self) -> SimDay;
}

/// A [`MetricsSink`] that discards everything.
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {
    fn adjust(&self, _bucket: Bucket, _delta: i64) {}
}

/// A [`HistorySink`] that discards everything and always reports day 0.
pub struct NoopHistory;

impl HistorySink for NoopHistory {
    fn record(&self, _record: TransitionRecord) {}

    fn current_day(&self) -> SimDay {
        SimDay::ZERO
    }
}

/// The pair of sinks every agent reports to.  Cheap to clone.
#[derive(Clone)]
pub struct Sinks {
    pub metrics: Arc<dyn MetricsSink>,
    pub history: Arc<dyn HistorySink>,
}

impl Sinks {
    pub fn new(metrics: Arc<dyn MetricsSink>, history: Arc<dyn HistorySink>) -> Self {
        Self { metrics, history }
    }

    pub fn noop() -> Self {
        Self { metrics: Arc::new(NoopMetrics), history: Arc::new(NoopHistory) }
    }
}
