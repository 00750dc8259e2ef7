//! Shared simulation parameters.
//!
//! # Model
//!
//! There is exactly one writer (the controller) and one reader per agent.
//! The controller mutates a single [`SharedParams`] handle; every agent tick
//! starts by taking a [`SimParams`] snapshot from it and uses that snapshot
//! for the whole tick.  Readers see the latest completed write, never a
//! half-written one, but two agents ticking at the same moment may see
//! different generations of the numeric values.  That is acceptable: the
//! numbers are tuning knobs, not coordination state.
//!
//! The `paused` and `movement_enabled` flags are atomics so toggling them
//! never waits on a tick that happens to be reading the numeric block.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::RwLock;

use crate::time::day_length;
use crate::{Arena, CoreError, CoreResult};

// ── DiseaseParams ─────────────────────────────────────────────────────────────

/// Probabilities and durations of the disease.
///
/// Day thresholds are stored as real numbers and compared with `>=` against
/// an integer count of elapsed day boundaries, so `2.5` behaves like `3`.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DiseaseParams {
    /// Chance, per contagious agent per neighbor per day, of passing germs.
    pub spread_probability:   f64,
    /// Chance that an infected agent becomes sick rather than asymptomatic.
    pub sickness_probability: f64,
    /// Chance that a sick agent dies rather than becoming immune.
    pub death_probability:    f64,
    /// Days spent `Infected` before symptoms are decided.
    pub incubation_days:      f64,
    /// Days spent `Sick` / `Asymptomatic` before the outcome is decided.
    pub illness_days:         f64,
}

impl Default for DiseaseParams {
    fn default() -> Self {
        Self {
            spread_probability:   0.5,
            sickness_probability: 0.75,
            death_probability:    0.1,
            incubation_days:      5.0,
            illness_days:         10.0,
        }
    }
}

impl DiseaseParams {
    pub fn validate(&self) -> CoreResult<()> {
        check_probability("spread_probability", self.spread_probability)?;
        check_probability("sickness_probability", self.sickness_probability)?;
        check_probability("death_probability", self.death_probability)?;
        check_days("incubation_days", self.incubation_days)?;
        check_days("illness_days", self.illness_days)?;
        Ok(())
    }
}

fn check_probability(name: &'static str, value: f64) -> CoreResult<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(CoreError::InvalidProbability { name, value })
    }
}

fn check_days(name: &'static str, value: f64) -> CoreResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(CoreError::InvalidDuration { name, value })
    }
}

fn check_arena(arena: Arena) -> CoreResult<()> {
    let ok = arena.width.is_finite() && arena.height.is_finite() && arena.width > 0.0 && arena.height > 0.0;
    if ok {
        Ok(())
    } else {
        Err(CoreError::InvalidArena { width: arena.width, height: arena.height })
    }
}

// ── SimParams ─────────────────────────────────────────────────────────────────

/// Immutable snapshot of every parameter an agent tick reads.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SimParams {
    pub disease:          DiseaseParams,
    pub arena:            Arena,
    /// Wall-clock wait between two ticks of the same agent.
    pub tick_interval:    Duration,
    pub paused:           bool,
    pub movement_enabled: bool,
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            disease:          DiseaseParams::default(),
            arena:            Arena::default(),
            tick_interval:    Duration::from_millis(100),
            paused:           false,
            movement_enabled: true,
        }
    }
}

impl SimParams {
    /// Wall-clock length of one simulated day.
    #[inline]
    pub fn day_length(&self) -> Duration {
        day_length(self.tick_interval)
    }

    pub fn validate(&self) -> CoreResult<()> {
        self.disease.validate()?;
        check_arena(self.arena)?;
        if self.tick_interval.is_zero() {
            return Err(CoreError::ZeroTickInterval);
        }
        Ok(())
    }
}

// ── SharedParams ──────────────────────────────────────────────────────────────

/// The numeric block guarded by one lock so a snapshot never mixes two writes
/// of the same field group.
#[derive(Copy, Clone, Debug)]
struct Numeric {
    disease:       DiseaseParams,
    arena:         Arena,
    tick_interval: Duration,
}

/// Process-wide parameter handle.  Share it as `Arc<SharedParams>`.
///
/// Every setter validates its input and leaves the current value untouched
/// on error.
#[derive(Debug)]
pub struct SharedParams {
    numeric:          RwLock<Numeric>,
    paused:           AtomicBool,
    movement_enabled: AtomicBool,
}

impl SharedParams {
    /// Validate `initial` and wrap it.
    pub fn new(initial: SimParams) -> CoreResult<Self> {
        initial.validate()?;
        Ok(Self::wrap(initial))
    }

    fn wrap(initial: SimParams) -> Self {
        Self {
            numeric: RwLock::new(Numeric {
                disease:       initial.disease,
                arena:         initial.arena,
                tick_interval: initial.tick_interval,
            }),
            paused:           AtomicBool::new(initial.paused),
            movement_enabled: AtomicBool::new(initial.movement_enabled),
        }
    }

    /// Copy out the current values.
    pub fn snapshot(&self) -> SimParams {
        let numeric = *self.numeric.read();
        SimParams {
            disease:          numeric.disease,
            arena:            numeric.arena,
            tick_interval:    numeric.tick_interval,
            paused:           self.paused.load(Ordering::Acquire),
            movement_enabled: self.movement_enabled.load(Ordering::Acquire),
        }
    }

    // ── Flags ─────────────────────────────────────────────────────────────

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    /// Set the pause flag, returning the previous value.
    pub fn set_paused(&self, paused: bool) -> bool {
        self.paused.swap(paused, Ordering::AcqRel)
    }

    #[inline]
    pub fn movement_enabled(&self) -> bool {
        self.movement_enabled.load(Ordering::Acquire)
    }

    pub fn set_movement_enabled(&self, enabled: bool) {
        self.movement_enabled.store(enabled, Ordering::Release);
    }

    // ── Numeric setters ───────────────────────────────────────────────────

    pub fn set_spread_probability(&self, p: f64) -> CoreResult<()> {
        check_probability("spread_probability", p)?;
        self.numeric.write().disease.spread_probability = p;
        Ok(())
    }

    pub fn set_sickness_probability(&self, p: f64) -> CoreResult<()> {
        check_probability("sickness_probability", p)?;
        self.numeric.write().disease.sickness_probability = p;
        Ok(())
    }

    pub fn set_death_probability(&self, p: f64) -> CoreResult<()> {
        check_probability("death_probability", p)?;
        self.numeric.write().disease.death_probability = p;
        Ok(())
    }

    pub fn set_incubation_days(&self, days: f64) -> CoreResult<()> {
        check_days("incubation_days", days)?;
        self.numeric.write().disease.incubation_days = days;
        Ok(())
    }

    pub fn set_illness_days(&self, days: f64) -> CoreResult<()> {
        check_days("illness_days", days)?;
        self.numeric.write().disease.illness_days = days;
        Ok(())
    }

    /// Replace every disease parameter at once.
    pub fn set_disease(&self, disease: DiseaseParams) -> CoreResult<()> {
        disease.validate()?;
        self.numeric.write().disease = disease;
        Ok(())
    }

    pub fn set_arena(&self, width: f64, height: f64) -> CoreResult<()> {
        let arena = Arena::new(width, height);
        check_arena(arena)?;
        self.numeric.write().arena = arena;
        Ok(())
    }

    pub fn set_tick_interval(&self, interval: Duration) -> CoreResult<()> {
        if interval.is_zero() {
            return Err(CoreError::ZeroTickInterval);
        }
        self.numeric.write().tick_interval = interval;
        Ok(())
    }
}

impl Default for SharedParams {
    /// The defaults always validate.
    fn default() -> Self {
        Self::wrap(SimParams::default())
    }
}
