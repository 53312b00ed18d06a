//! Error types for parameter validation and model construction

use nemod_core::SplineError;
use thiserror::Error;

/// Result type for model operations
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised while loading, validating or evaluating a model
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("{field}: expected {expected} entries, got {actual}")]
    LengthMismatch {
        field: String,
        expected: usize,
        actual: usize,
    },

    #[error("Arm map is not a bijection onto 1..={arms}: {detail}")]
    ArmMap { arms: usize, detail: String },

    #[error("Degenerate geometry: {0}")]
    DegenerateGeometry(String),

    #[error("Invalid parameter {name} = {value}")]
    InvalidParameter { name: String, value: f64 },

    #[error("Unknown model preset: {0}")]
    UnknownPreset(String),

    #[error("Non-finite coordinate ({x}, {y}, {z})")]
    NonFiniteCoordinate { x: f64, y: f64, z: f64 },

    #[error("Spline error: {0}")]
    Spline(#[from] SplineError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ModelError {
    pub(crate) fn invalid(name: impl Into<String>, value: f64) -> Self {
        ModelError::InvalidParameter { name: name.into(), value }
    }

    pub(crate) fn degenerate(what: impl Into<String>) -> Self {
        ModelError::DegenerateGeometry(what.into())
    }
}
