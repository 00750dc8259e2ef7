//! Spatial-subsystem error type.

use thiserror::Error;

use ct_core::AgentId;

/// Errors produced by `ct-spatial`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SpatialError {
    #[error("{agent} has a non-finite position ({x}, {y})")]
    NonFinitePosition { agent: AgentId, x: f64, y: f64 },

    #[error("contact radius must be finite and non-negative, got {0}")]
    InvalidRadius(f64),

    #[error("{0} is not in the proximity index")]
    AgentNotFound(AgentId),

    #[error("grid of {capacity} cells cannot hold {count} agents")]
    LayoutTooSmall { count: usize, capacity: usize },
}

pub type SpatialResult<T> = Result<T, SpatialError>;
