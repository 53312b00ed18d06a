//! Geometry, units and numerics shared by the electron-density model and
//! the line-of-sight integrator.

pub mod constants;
pub mod coordinates;
pub mod grid;
pub mod spline;

pub use coordinates::{GalacticDirection, GalactocentricPosition};
pub use grid::{GridConfig, SampleGrid};
pub use spline::{CubicSpline, SplineError};
