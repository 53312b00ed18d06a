//! Galactic free-electron density model (NE2001 family)
//!
//! A [`GalaxyModel`] is built once from a validated [`GalaxyParameters`]
//! bundle and evaluated at Galactocentric points, one at a time or in
//! parallel batches through [`BatchEvaluator`].

pub mod arms;
pub mod batch;
pub mod clumps;
pub mod components;
pub mod density;
pub mod error;
pub mod lism;
pub mod model;
pub mod params;
pub mod presets;
pub mod voids;

pub use arms::{ArmApproach, ArmDensity, ArmFluctuation, ArmSearch, SpiralArmModel};
pub use batch::{BatchConfig, BatchEvaluator};
pub use density::{DensityBreakdown, ElectronDensity, PathSample, SmallScaleComponents, SmoothComponents};
pub use error::{ModelError, ModelResult};
pub use model::{ActiveModel, GalaxyModel, ModelOptions};
pub use params::{load_parameters_json, GalaxyParameters};
pub use presets::ModelPreset;
