//! Error types for sightline integration

use nemod_core::SplineError;
use nemod_model::ModelError;
use thiserror::Error;

/// Result type for integration operations
pub type IntegrateResult<T> = Result<T, LosError>;

#[derive(Error, Debug)]
pub enum LosError {
    #[error("Direction must be +1 (distance to DM) or -1 (DM to distance), got {0}")]
    InvalidDirection(i32),

    #[error("Non-finite {name}: {value}")]
    NonFinite { name: &'static str, value: f64 },

    #[error("Target must be non-negative, got {0}")]
    NegativeTarget(f64),

    #[error("Path profile columns differ in length: s={s}, ne={ne}, dsm={dsm}")]
    ProfileLength { s: usize, ne: usize, dsm: usize },

    #[error("Invalid integration config: {0}")]
    InvalidConfig(String),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Spline error: {0}")]
    Spline(#[from] SplineError),
}
