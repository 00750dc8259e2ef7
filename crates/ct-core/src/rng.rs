//! Seeded random sources for agents and for the controller.
//!
//! # Seeding
//!
//! | Source     | Seed                                           | Drawn from               |
//! |------------|------------------------------------------------|--------------------------|
//! | `AgentRng` | `global_seed ^ (agent_id * GOLDEN_GAMMA)`      | the agent's own tick     |
//! | `SimRng`   | `global_seed`                                  | builder, layout, reset   |
//!
//! Multiplying the ID by the 64-bit golden-ratio gamma scatters consecutive
//! agents across the seed space, so neighbouring IDs do not get correlated
//! streams.
//!
//! A live run interleaves agent tasks differently every time and is not
//! reproducible as a whole.  Each agent's own stream of draws is still
//! fixed, and the virtual scheduler ticks agents in ID order, so a virtual
//! run with a given seed always ends the same way.

use rand::distributions::uniform::{SampleRange, SampleUniform};
use rand::distributions::{Distribution, Standard};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::AgentId;

const GOLDEN_GAMMA: u64 = 0x9e37_79b9_7f4a_7c15;

// ── AgentRng ──────────────────────────────────────────────────────────────────

/// An agent's private stream.  Lives inside the agent's locked core and is
/// only drawn from during that agent's tick.
pub struct AgentRng(SmallRng);

impl AgentRng {
    pub fn new(global_seed: u64, agent: AgentId) -> Self {
        let seed = global_seed ^ u64::from(agent.0).wrapping_mul(GOLDEN_GAMMA);
        AgentRng(SmallRng::seed_from_u64(seed))
    }

    /// A `Standard` draw; for `f64` that is uniform in `[0, 1)`.
    #[inline]
    pub fn random<T>(&mut self) -> T
    where
        Standard: Distribution<T>,
    {
        self.0.r#gen()
    }

    #[inline]
    pub fn gen_range<T: SampleUniform, R: SampleRange<T>>(&mut self, range: R) -> T {
        self.0.gen_range(range)
    }

    /// One uniform draw `u`, `true` when `u < p`.
    ///
    /// Exactly one draw per call whatever `p` is, so `0.0` never fires,
    /// `1.0` always fires, and later draws are unaffected by the value.
    #[inline]
    pub fn chance(&mut self, p: f64) -> bool {
        self.random::<f64>() < p
    }
}

// ── SimRng ────────────────────────────────────────────────────────────────────

/// The controller's stream: initial placement and picking who starts
/// infected.  Never handed to agent tasks.
pub struct SimRng(SmallRng);

impl SimRng {
    pub fn new(seed: u64) -> Self {
        SimRng(SmallRng::seed_from_u64(seed))
    }

    #[inline]
    pub fn random<T>(&mut self) -> T
    where
        Standard: Distribution<T>,
    {
        self.0.r#gen()
    }

    /// `amount` distinct indices from `0..length` in ascending order.  Asking
    /// for more than `length` yields all of them.
    pub fn sample_indices(&mut self, length: usize, amount: usize) -> Vec<usize> {
        let mut picked = rand::seq::index::sample(&mut self.0, length, amount.min(length)).into_vec();
        picked.sort_unstable();
        picked
    }
}
