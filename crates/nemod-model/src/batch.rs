//! Parallel density evaluation over many points

use crate::density::{DensityBreakdown, ElectronDensity, PathSample};
use crate::error::ModelResult;
use crate::model::GalaxyModel;
use nemod_core::GalactocentricPosition;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Batch configuration
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Points handed to one worker at a time
    pub chunk_size: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self { chunk_size: 512 }
    }
}

/// Evaluates a model over slices of positions
///
/// Chunks run in parallel. Every point goes through the same arithmetic as
/// [`GalaxyModel::density_at`], so results do not depend on the chunking.
pub struct BatchEvaluator {
    model: Arc<GalaxyModel>,
    config: BatchConfig,
}

impl BatchEvaluator {
    pub fn new(model: Arc<GalaxyModel>, config: BatchConfig) -> Self {
        Self {
            model,
            config: BatchConfig {
                chunk_size: config.chunk_size.max(1),
            },
        }
    }

    pub fn with_defaults(model: Arc<GalaxyModel>) -> Self {
        Self::new(model, BatchConfig::default())
    }

    pub fn model(&self) -> &GalaxyModel {
        &self.model
    }

    fn par_map<T, F>(&self, positions: &[GalactocentricPosition], f: F) -> ModelResult<Vec<T>>
    where
        T: Send,
        F: Fn(&GalaxyModel, &[GalactocentricPosition]) -> ModelResult<Vec<T>> + Sync,
    {
        let chunks = positions
            .par_chunks(self.config.chunk_size)
            .map(|chunk| f(&*self.model, chunk))
            .collect::<ModelResult<Vec<Vec<T>>>>()?;
        Ok(chunks.into_iter().flatten().collect())
    }

    /// Smooth-component integrands (disks, arms, Galactic center)
    pub fn smooth(&self, positions: &[GalactocentricPosition]) -> ModelResult<Vec<PathSample>> {
        self.par_map(positions, |model, chunk| {
            let w = &model.parameters().weights;
            Ok(model
                .smooth_components_many(chunk)?
                .iter()
                .map(|s| s.sum(w))
                .collect())
        })
    }

    pub fn breakdown(&self, positions: &[GalactocentricPosition]) -> ModelResult<Vec<DensityBreakdown>> {
        self.par_map(positions, |model, chunk| {
            let smooth = model.smooth_components_many(chunk)?;
            let small = model.small_scale_components_many(chunk)?;
            Ok(smooth
                .into_iter()
                .zip(small)
                .map(|(smooth, small_scale)| DensityBreakdown {
                    total: model.combine(&smooth, &small_scale).into_density(),
                    smooth,
                    small_scale,
                })
                .collect())
        })
    }

    /// Total density at every position
    pub fn density(&self, positions: &[GalactocentricPosition]) -> ModelResult<Vec<ElectronDensity>> {
        Ok(self.breakdown(positions)?.into_iter().map(|b| b.total).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModelError;
    use crate::params::{ClumpEdge, ClumpRecord, VoidEdge, VoidRecord};
    use crate::presets::ModelPreset;

    fn model_with_catalogs() -> Arc<GalaxyModel> {
        let mut params = ModelPreset::Ne2001.parameters();
        params.voids.push(VoidRecord {
            longitude_deg: 40.0,
            latitude_deg: 1.0,
            distance: 1.2,
            density: 0.001,
            fluctuation: 0.2,
            axes: [0.4, 0.3, 0.2],
            rotation_y_deg: 15.0,
            rotation_z_deg: -30.0,
            edge: VoidEdge::Gaussian,
        });
        params.clumps.push(ClumpRecord {
            longitude_deg: 40.0,
            latitude_deg: 1.0,
            distance: 2.5,
            density: 0.8,
            fluctuation: 3.0,
            radius: 0.05,
            edge: ClumpEdge::Exponential,
        });
        Arc::new(GalaxyModel::new(params).unwrap())
    }

    fn sightline(n: usize) -> Vec<GalactocentricPosition> {
        (0..n)
            .map(|i| GalactocentricPosition::from_galactic_degrees(40.0, 1.0, i as f64 * 0.01, 8.5))
            .collect()
    }

    #[test]
    fn test_batch_matches_scalar() {
        let model = model_with_catalogs();
        let positions = sightline(700);
        let batch = BatchEvaluator::new(Arc::clone(&model), BatchConfig { chunk_size: 64 });
        let values = batch.density(&positions).unwrap();
        for (p, v) in positions.iter().zip(&values) {
            let s = model.density_at_position(p).unwrap();
            assert!((s.ne - v.ne).abs() <= 1e-7 * s.ne.abs(), "{:?} vs {:?}", s, v);
            assert!((s.f - v.f).abs() <= 1e-7 * s.f.abs());
        }
        let breakdown = batch.breakdown(&positions).unwrap();
        assert!(breakdown.iter().any(|b| b.which_void() == 1));
        assert!(breakdown.iter().any(|b| b.which_clump() == 1));
    }

    #[test]
    fn test_chunking_does_not_change_results() {
        let model = model_with_catalogs();
        let positions = sightline(333);
        let small = BatchEvaluator::new(Arc::clone(&model), BatchConfig { chunk_size: 7 });
        let large = BatchEvaluator::new(model, BatchConfig { chunk_size: 1000 });
        assert_eq!(small.smooth(&positions).unwrap(), large.smooth(&positions).unwrap());
        assert_eq!(small.density(&positions).unwrap(), large.density(&positions).unwrap());
    }

    #[test]
    fn test_non_finite_point_fails() {
        let batch = BatchEvaluator::with_defaults(model_with_catalogs());
        let mut positions = sightline(10);
        positions[4].z = f64::NAN;
        assert!(matches!(
            batch.density(&positions),
            Err(ModelError::NonFiniteCoordinate { .. })
        ));
    }
}
