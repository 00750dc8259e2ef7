//! Run configuration, loadable from TOML.
//!
//! Every field has a default, so an empty file (or no file) is a valid
//! configuration:
//!
//! ```toml
//! agent_count        = 400
//! initially_infected = 3
//! seed               = 7
//! contact_radius     = 12.0
//! layout             = "jittered"
//!
//! [params]
//! tick_interval_ms   = 50
//! spread_probability = 0.3
//! illness_days       = 8.0
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use ct_core::{Arena, DiseaseParams, SimParams};

use crate::{SimError, SimResult};

/// Initial placement strategy.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    /// Cell centres of the squarest grid that fits the arena.
    Grid,
    /// Grid cells, each agent placed randomly within its own cell.
    #[default]
    Jittered,
    /// Uniformly random over the whole arena.
    Random,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimConfig {
    pub agent_count:         usize,
    /// Agents that start `Infected`, chosen at random with `seed`.
    pub initially_infected:  usize,
    pub seed:                u64,
    /// Agents within this distance of each other are neighbors.
    pub contact_radius:      f64,
    /// Wall-clock period of the live runtime's adjacency recomputation.
    pub neighbor_refresh_ms: u64,
    /// Tokio worker threads for the live runtime.  `None` uses tokio's
    /// default.
    pub worker_threads:      Option<usize>,
    /// Entries kept by the history log.
    pub history_capacity:    usize,
    pub layout:              Layout,
    pub params:              ParamsConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            agent_count:         100,
            initially_infected:  1,
            seed:                42,
            contact_radius:      20.0,
            neighbor_refresh_ms: 100,
            worker_threads:      None,
            history_capacity:    crate::history::DEFAULT_HISTORY_CAPACITY,
            layout:              Layout::default(),
            params:              ParamsConfig::default(),
        }
    }
}

/// The `[params]` table: initial values of the runtime-adjustable parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParamsConfig {
    pub tick_interval_ms:     u64,
    pub arena_width:          f64,
    pub arena_height:         f64,
    pub spread_probability:   f64,
    pub sickness_probability: f64,
    pub death_probability:    f64,
    pub incubation_days:      f64,
    pub illness_days:         f64,
    pub movement_enabled:     bool,
    pub start_paused:         bool,
}

impl Default for ParamsConfig {
    fn default() -> Self {
        let disease = DiseaseParams::default();
        let arena = Arena::default();
        Self {
            tick_interval_ms:     100,
            arena_width:          arena.width,
            arena_height:         arena.height,
            spread_probability:   disease.spread_probability,
            sickness_probability: disease.sickness_probability,
            death_probability:    disease.death_probability,
            incubation_days:      disease.incubation_days,
            illness_days:         disease.illness_days,
            movement_enabled:     true,
            start_paused:         false,
        }
    }
}

impl ParamsConfig {
    pub fn to_params(&self) -> SimParams {
        SimParams {
            disease: DiseaseParams {
                spread_probability:   self.spread_probability,
                sickness_probability: self.sickness_probability,
                death_probability:    self.death_probability,
                incubation_days:      self.incubation_days,
                illness_days:         self.illness_days,
            },
            arena:            Arena::new(self.arena_width, self.arena_height),
            tick_interval:    Duration::from_millis(self.tick_interval_ms),
            paused:           self.start_paused,
            movement_enabled: self.movement_enabled,
        }
    }
}

impl SimConfig {
    pub fn from_toml_str(text: &str) -> SimResult<Self> {
        let config: SimConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> SimResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    #[inline]
    pub fn sim_params(&self) -> SimParams {
        self.params.to_params()
    }

    #[inline]
    pub fn neighbor_refresh(&self) -> Duration {
        Duration::from_millis(self.neighbor_refresh_ms)
    }

    pub fn validate(&self) -> SimResult<()> {
        self.sim_params().validate()?;

        if self.initially_infected > self.agent_count {
            return Err(SimError::Config(format!(
                "initially_infected ({}) exceeds agent_count ({})",
                self.initially_infected, self.agent_count
            )));
        }
        if u32::try_from(self.agent_count).is_err() {
            return Err(SimError::Config(format!("agent_count {} is too large", self.agent_count)));
        }
        if !(self.contact_radius.is_finite() && self.contact_radius >= 0.0) {
            return Err(SimError::Config(format!(
                "contact_radius must be finite and non-negative, got {}",
                self.contact_radius
            )));
        }
        if self.neighbor_refresh_ms == 0 {
            return Err(SimError::Config("neighbor_refresh_ms must be non-zero".to_string()));
        }
        if self.history_capacity == 0 {
            return Err(SimError::Config("history_capacity must be non-zero".to_string()));
        }
        if self.worker_threads == Some(0) {
            return Err(SimError::Config("worker_threads must be non-zero".to_string()));
        }
        Ok(())
    }
}
