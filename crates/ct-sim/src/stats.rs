//! Population counters.
//!
//! Two views of the same population:
//!
//! | Type              | Source                         | Buckets                     |
//! |-------------------|--------------------------------|-----------------------------|
//! | `PopulationStats` | deltas reported by agents      | 5 (infected count as vulnerable) |
//! | `Census`          | a scan of every agent's state  | all 6 states                |
//!
//! `PopulationStats` is what the day clock reports and what output writers
//! record.  Its buckets are adjusted at two different points of a tick (the
//! bucket an agent leaves is decremented when the outcome is decided, the
//! bucket it enters is incremented when the message is applied), so the
//! buckets only sum to the population size at quiescent points.  `Census`
//! always sums to the population size.

use std::fmt;

use parking_lot::Mutex;
use serde::Serialize;

use ct_agent::{Bucket, DiseaseState, MetricsSink};

// ── BucketCounts ──────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BucketCounts {
    pub vulnerable:   i64,
    pub sick:         i64,
    pub asymptomatic: i64,
    pub immune:       i64,
    pub dead:         i64,
}

impl BucketCounts {
    /// A fresh population: everyone vulnerable.
    pub fn initial(total: usize) -> Self {
        Self { vulnerable: total as i64, ..Self::default() }
    }

    pub fn get(&self, bucket: Bucket) -> i64 {
        match bucket {
            Bucket::Vulnerable   => self.vulnerable,
            Bucket::Sick         => self.sick,
            Bucket::Asymptomatic => self.asymptomatic,
            Bucket::Immune       => self.immune,
            Bucket::Dead         => self.dead,
        }
    }

    fn slot(&mut self, bucket: Bucket) -> &mut i64 {
        match bucket {
            Bucket::Vulnerable   => &mut self.vulnerable,
            Bucket::Sick         => &mut self.sick,
            Bucket::Asymptomatic => &mut self.asymptomatic,
            Bucket::Immune       => &mut self.immune,
            Bucket::Dead         => &mut self.dead,
        }
    }

    pub fn total(&self) -> i64 {
        self.vulnerable + self.sick + self.asymptomatic + self.immune + self.dead
    }
}

// ── PopulationStats ───────────────────────────────────────────────────────────

/// Running bucket counts.  Implements [`MetricsSink`].
#[derive(Debug)]
pub struct PopulationStats {
    total:  usize,
    counts: Mutex<BucketCounts>,
}

impl PopulationStats {
    pub fn new(total: usize) -> Self {
        Self { total, counts: Mutex::new(BucketCounts::initial(total)) }
    }

    pub fn snapshot(&self) -> BucketCounts {
        *self.counts.lock()
    }

    /// Back to everyone vulnerable.
    pub fn reset(&self) {
        *self.counts.lock() = BucketCounts::initial(self.total);
    }

    /// Population size.
    pub fn total(&self) -> usize {
        self.total
    }
}

impl MetricsSink for PopulationStats {
    fn adjust(&self, bucket: Bucket, delta: i64) {
        *self.counts.lock().slot(bucket) += delta;
    }
}

// ── Census ────────────────────────────────────────────────────────────────────

/// Exact count of agents per [`DiseaseState`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Census {
    pub vulnerable:   usize,
    pub infected:     usize,
    pub asymptomatic: usize,
    pub sick:         usize,
    pub immune:       usize,
    pub dead:         usize,
}

impl Census {
    pub fn of<I>(states: I) -> Self
    where
        I: IntoIterator<Item = DiseaseState>,
    {
        let mut census = Census::default();
        for state in states {
            *census.slot(state) += 1;
        }
        census
    }

    fn slot(&mut self, state: DiseaseState) -> &mut usize {
        match state {
            DiseaseState::Vulnerable   => &mut self.vulnerable,
            DiseaseState::Infected     => &mut self.infected,
            DiseaseState::Asymptomatic => &mut self.asymptomatic,
            DiseaseState::Sick         => &mut self.sick,
            DiseaseState::Immune       => &mut self.immune,
            DiseaseState::Dead         => &mut self.dead,
        }
    }

    pub fn count(&self, state: DiseaseState) -> usize {
        match state {
            DiseaseState::Vulnerable   => self.vulnerable,
            DiseaseState::Infected     => self.infected,
            DiseaseState::Asymptomatic => self.asymptomatic,
            DiseaseState::Sick         => self.sick,
            DiseaseState::Immune       => self.immune,
            DiseaseState::Dead         => self.dead,
        }
    }

    pub fn total(&self) -> usize {
        DiseaseState::ALL.iter().map(|&s| self.count(s)).sum()
    }

    /// Agents that are infected or contagious.
    pub fn active(&self) -> usize {
        self.infected + self.asymptomatic + self.sick
    }

    /// No agent can change state any more without outside intervention.
    pub fn is_settled(&self) -> bool {
        self.active() == 0
    }
}

impl fmt::Display for Census {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for state in DiseaseState::ALL {
            writeln!(f, "{:<13} {:>7}", state.label(), self.count(state))?;
        }
        write!(f, "{:<13} {:>7}", "total", self.total())
    }
}
