//! Plain data row types written by output backends.

use ct_agent::TransitionRecord;
use ct_core::SimDay;
use ct_sim::BucketCounts;

/// Population buckets at the end of one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyStatsRow {
    pub day:          u64,
    /// Includes infected agents whose symptoms are not decided yet.
    pub vulnerable:   i64,
    pub sick:         i64,
    pub asymptomatic: i64,
    pub immune:       i64,
    pub dead:         i64,
}

impl DailyStatsRow {
    pub fn new(day: SimDay, counts: &BucketCounts) -> Self {
        Self {
            day:          day.0,
            vulnerable:   counts.vulnerable,
            sick:         counts.sick,
            asymptomatic: counts.asymptomatic,
            immune:       counts.immune,
            dead:         counts.dead,
        }
    }
}

/// One applied state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionRow {
    pub agent_id: u32,
    /// Lowercase state label, e.g. `"sick"`.
    pub state:    &'static str,
    pub day:      u64,
}

impl From<&TransitionRecord> for TransitionRow {
    fn from(record: &TransitionRecord) -> Self {
        Self { agent_id: record.agent.0, state: record.state.label(), day: record.day.0 }
    }
}
