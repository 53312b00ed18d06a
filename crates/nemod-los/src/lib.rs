//! Line-of-sight integration for the electron-density model
//!
//! Converts between distance and dispersion measure along a sightline and
//! reports the accumulated scattering measures.

pub mod error;
pub mod integrator;
pub mod profile;
pub mod regression;
pub mod sightline;

pub use error::{IntegrateResult, LosError};
pub use integrator::{dm_distance, Direction, IntegrationConfig, LineOfSightIntegrator, LosResult, PathLimit};
pub use profile::{Moments, PathProfile, ScatteringMeasures};
pub use sightline::Sightline;
