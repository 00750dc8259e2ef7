//! Core error type.
//!
//! Sub-crates define their own error enums and wrap `CoreError` as one
//! variant via `#[from]`, so parameter validation failures surface unchanged
//! at the controller.

use thiserror::Error;

/// Errors raised while validating or updating simulation parameters.
///
/// Nothing on the per-tick path returns this type: a running agent never
/// fails, it only reads an already-validated parameter snapshot.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CoreError {
    #[error("{name} must be a probability in [0, 1], got {value}")]
    InvalidProbability { name: &'static str, value: f64 },

    #[error("{name} must be a finite, non-negative day count, got {value}")]
    InvalidDuration { name: &'static str, value: f64 },

    #[error("arena must have finite, positive dimensions, got {width} x {height}")]
    InvalidArena { width: f64, height: f64 },

    #[error("tick interval must be non-zero")]
    ZeroTickInterval,
}

/// Shorthand result type for `ct-core`.
pub type CoreResult<T> = Result<T, CoreError>;
