//! nemod: Galactic free-electron density and pulsar DM/distance
//!
//! ```no_run
//! use nemod::{GalacticDirection, GalaxyModel, LineOfSightIntegrator, ModelPreset};
//!
//! let model = GalaxyModel::from_preset(ModelPreset::Ne2001)?;
//! let los = LineOfSightIntegrator::with_defaults(&model);
//! let result = los.dm_to_distance(GalacticDirection::from_degrees(200.0, -6.5), 100.0)?;
//! println!("{:.3} kpc {}", result.distance, result.limit);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use anyhow::{Context, Result};
use std::path::Path;

pub use nemod_core;
pub use nemod_los;
pub use nemod_model;

pub use nemod_core::{GalacticDirection, GalactocentricPosition};

pub use nemod_los::{dm_distance, Direction, IntegrationConfig, LineOfSightIntegrator, LosResult, PathLimit};
pub use nemod_model::{
    ActiveModel, BatchEvaluator, ElectronDensity, GalaxyModel, GalaxyParameters, ModelOptions, ModelPreset,
};

/// Build a model from a JSON parameter bundle
pub fn load_model(path: &Path, options: ModelOptions) -> Result<GalaxyModel> {
    let params = nemod_model::load_parameters_json(path)?;
    GalaxyModel::with_options(params, options)
        .with_context(|| format!("Failed to build model from {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_preset_round_trip_through_facade() {
        let active = ActiveModel::from_preset(ModelPreset::Ne2001).unwrap();
        let model = active.current();
        let here = model.density_at(0.0, model.rsun(), 0.0).unwrap();
        assert!(here.ne > 0.0);

        let l = 200.0f64.to_radians();
        let b = (-6.5f64).to_radians();
        let inv = dm_distance(&model, l, b, 100.0, -1, 0.1, 0.01, 20).unwrap();
        let fwd = dm_distance(&model, l, b, inv.distance, 1, 0.1, 0.01, 20).unwrap();
        assert!((fwd.dm - 100.0).abs() < 0.1);

        active.switch_preset(ModelPreset::Ne2025).unwrap();
        assert!(!Arc::ptr_eq(&model, &active.current()));
        assert_eq!(active.current().name(), ModelPreset::Ne2025.builtin_label());
    }

    #[test]
    fn test_load_model_from_written_bundle() {
        let path = std::env::temp_dir().join("nemod-facade-bundle.json");
        let params = ModelPreset::Ne2025.parameters();
        std::fs::write(&path, serde_json::to_string(&params).unwrap()).unwrap();
        let model = load_model(&path, ModelOptions::default()).unwrap();
        assert_eq!(model.name(), ModelPreset::Ne2025.builtin_label());
        let _ = std::fs::remove_file(&path);
    }
}
