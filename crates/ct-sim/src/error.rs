use thiserror::Error;

use ct_core::{AgentId, CoreError};
use ct_spatial::SpatialError;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("simulation configuration error: {0}")]
    Config(String),

    #[error("{what} length {got} does not match agent count {expected}")]
    AgentCountMismatch {
        expected: usize,
        got:      usize,
        what:     &'static str,
    },

    #[error("{0} is not part of this population")]
    AgentNotFound(AgentId),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("spatial error: {0}")]
    Spatial(#[from] SpatialError),

    #[error("could not parse configuration: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("agent task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

pub type SimResult<T> = Result<T, SimError>;
