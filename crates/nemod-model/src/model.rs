//! Model bundle: parameters plus every derived structure, and the
//! swappable "current model"

use crate::arms::{ArmFluctuation, ArmSearch, SpiralArmModel};
use crate::clumps::ClumpSet;
use crate::density::{DensityBreakdown, ElectronDensity, PathSample, SmallScaleComponents, SmoothComponents};
use crate::error::{ModelError, ModelResult};
use crate::lism::{LismHit, LocalIsmModel};
use crate::params::GalaxyParameters;
use crate::presets::ModelPreset;
use crate::voids::VoidSet;
use nemod_core::GalactocentricPosition;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Build-time options that shape the derived arm model
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelOptions {
    pub arm_search: ArmSearch,
    pub arm_fluctuation: ArmFluctuation,
}

/// Validated parameters with their arm splines and catalogs, immutable once built
pub struct GalaxyModel {
    params: GalaxyParameters,
    options: ModelOptions,
    arms: SpiralArmModel,
    voids: VoidSet,
    clumps: ClumpSet,
    lism: Option<LocalIsmModel>,
}

impl GalaxyModel {
    pub fn new(params: GalaxyParameters) -> ModelResult<Self> {
        Self::with_options(params, ModelOptions::default())
    }

    pub fn with_options(params: GalaxyParameters, options: ModelOptions) -> ModelResult<Self> {
        params.validate()?;

        let arms = SpiralArmModel::new(&params.arms, options.arm_search, options.arm_fluctuation)?;
        let voids = VoidSet::new(&params.voids, params.rsun);
        let clumps = ClumpSet::new(&params.clumps, params.rsun);
        let lism = params.lism.as_ref().map(LocalIsmModel::new);

        tracing::info!(
            "Built {} model: {} arms, {} voids, {} clumps",
            params.name,
            arms.count(),
            voids.len(),
            clumps.len()
        );

        Ok(Self {
            params,
            options,
            arms,
            voids,
            clumps,
            lism,
        })
    }

    pub fn from_preset(preset: ModelPreset) -> ModelResult<Self> {
        Self::new(preset.parameters())
    }

    pub fn name(&self) -> &str {
        &self.params.name
    }

    pub fn parameters(&self) -> &GalaxyParameters {
        &self.params
    }

    pub fn options(&self) -> ModelOptions {
        self.options
    }

    pub fn rsun(&self) -> f64 {
        self.params.rsun
    }

    pub fn arms(&self) -> &SpiralArmModel {
        &self.arms
    }

    pub fn voids(&self) -> &VoidSet {
        &self.voids
    }

    pub fn clumps(&self) -> &ClumpSet {
        &self.clumps
    }

    fn check(pos: &GalactocentricPosition) -> ModelResult<()> {
        if pos.is_finite() {
            Ok(())
        } else {
            Err(ModelError::NonFiniteCoordinate { x: pos.x, y: pos.y, z: pos.z })
        }
    }

    pub fn smooth_components(&self, pos: &GalactocentricPosition) -> ModelResult<SmoothComponents> {
        Self::check(pos)?;
        let p = &self.params;
        Ok(SmoothComponents {
            thick_disk: p.thick_disk.density(pos, p.rsun),
            thin_disk: p.thin_disk.density(pos),
            arms: self.arms.density(pos)?,
            galactic_center: p.galactic_center.density(pos),
        })
    }

    /// Batched [`smooth_components`](Self::smooth_components); arms use the grouped search
    pub fn smooth_components_many(&self, positions: &[GalactocentricPosition]) -> ModelResult<Vec<SmoothComponents>> {
        positions.iter().try_for_each(Self::check)?;
        let p = &self.params;
        let thick = p.thick_disk.density_many(positions, p.rsun);
        let thin = p.thin_disk.density_many(positions);
        let gc = p.galactic_center.density_many(positions);
        let arms = self.arms.density_many(positions)?;
        Ok((0..positions.len())
            .map(|i| SmoothComponents {
                thick_disk: thick[i],
                thin_disk: thin[i],
                arms: arms[i],
                galactic_center: gc[i],
            })
            .collect())
    }

    pub fn small_scale_components(&self, pos: &GalactocentricPosition) -> ModelResult<SmallScaleComponents> {
        Self::check(pos)?;
        Ok(SmallScaleComponents {
            lism: self.lism.as_ref().map(|l| l.evaluate(pos)).unwrap_or_default(),
            void: self.voids.evaluate(pos),
            clump: self.clumps.evaluate(pos),
        })
    }

    pub fn small_scale_components_many(
        &self,
        positions: &[GalactocentricPosition],
    ) -> ModelResult<Vec<SmallScaleComponents>> {
        positions.iter().try_for_each(Self::check)?;
        let lism = match &self.lism {
            Some(l) => l.evaluate_many(positions),
            None => vec![LismHit::default(); positions.len()],
        };
        let voids = self.voids.evaluate_many(positions);
        let clumps = self.clumps.evaluate_many(positions);
        Ok((0..positions.len())
            .map(|i| SmallScaleComponents {
                lism: lism[i],
                void: voids[i],
                clump: clumps[i],
            })
            .collect())
    }

    pub fn density_breakdown(&self, pos: &GalactocentricPosition) -> ModelResult<DensityBreakdown> {
        let smooth = self.smooth_components(pos)?;
        let small_scale = self.small_scale_components(pos)?;
        let total = self.combine(&smooth, &small_scale).into_density();
        Ok(DensityBreakdown { smooth, small_scale, total })
    }

    /// Weighted sum of every component
    pub fn combine(&self, smooth: &SmoothComponents, small_scale: &SmallScaleComponents) -> PathSample {
        let w = &self.params.weights;
        small_scale.apply(smooth.sum(w), w)
    }

    /// Total electron density (cm^-3) and effective F at a Galactocentric point (kpc)
    pub fn density_at(&self, x: f64, y: f64, z: f64) -> ModelResult<ElectronDensity> {
        self.density_at_position(&GalactocentricPosition::new(x, y, z))
    }

    pub fn density_at_position(&self, pos: &GalactocentricPosition) -> ModelResult<ElectronDensity> {
        Ok(self.density_breakdown(pos)?.total)
    }
}

/// Shared handle to the model in use
///
/// Readers take an `Arc` snapshot and keep using it for a whole
/// computation. A switch builds the replacement completely before
/// publishing it, so no reader sees a half-built model.
pub struct ActiveModel {
    current: RwLock<Arc<GalaxyModel>>,
}

impl ActiveModel {
    pub fn new(model: GalaxyModel) -> Self {
        Self {
            current: RwLock::new(Arc::new(model)),
        }
    }

    pub fn from_preset(preset: ModelPreset) -> ModelResult<Self> {
        Ok(Self::new(GalaxyModel::from_preset(preset)?))
    }

    pub fn current(&self) -> Arc<GalaxyModel> {
        self.current.read().clone()
    }

    /// Publishes `model` and returns the one it replaced
    pub fn replace(&self, model: GalaxyModel) -> Arc<GalaxyModel> {
        let next = Arc::new(model);
        tracing::info!("Switching active model to {}", next.name());
        std::mem::replace(&mut *self.current.write(), next)
    }

    pub fn switch_preset(&self, preset: ModelPreset) -> ModelResult<Arc<GalaxyModel>> {
        let model = GalaxyModel::from_preset(preset)?;
        Ok(self.replace(model))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_density_positive_near_sun() {
        let model = GalaxyModel::from_preset(ModelPreset::Ne2001).unwrap();
        let d = model.density_at(0.3, 8.0, 0.05).unwrap();
        assert!(d.ne > 0.0);
        assert!(d.f > 0.0);
    }

    #[test]
    fn test_non_finite_rejected() {
        let model = GalaxyModel::from_preset(ModelPreset::Ne2001).unwrap();
        assert!(matches!(
            model.density_at(f64::NAN, 8.0, 0.0),
            Err(ModelError::NonFiniteCoordinate { .. })
        ));
        assert!(model.density_at(0.0, f64::INFINITY, 0.0).is_err());
    }

    #[test]
    fn test_invalid_parameters_fail_at_build() {
        let mut params = ModelPreset::Ne2001.parameters();
        params.arms.harm.truncate(3);
        assert!(matches!(GalaxyModel::new(params), Err(ModelError::LengthMismatch { .. })));
    }

    #[test]
    fn test_breakdown_reports_components() {
        let model = GalaxyModel::from_preset(ModelPreset::Ne2001).unwrap();
        let gc = model.parameters().galactic_center;
        let b = model.density_breakdown(&GalactocentricPosition::new(gc.x, gc.y, gc.z)).unwrap();
        assert_eq!(b.smooth.galactic_center.ne, 10.0);
        assert_eq!(b.which_void(), 0);
        assert!(b.total.ne >= 10.0);
    }

    #[test]
    fn test_weights_disable_component() {
        let mut params = ModelPreset::Ne2001.parameters();
        params.weights.galactic_center = 0.0;
        let gc = params.galactic_center;
        let with = GalaxyModel::from_preset(ModelPreset::Ne2001).unwrap();
        let without = GalaxyModel::new(params).unwrap();
        let a = with.density_at(gc.x, gc.y, gc.z).unwrap();
        let b = without.density_at(gc.x, gc.y, gc.z).unwrap();
        assert!((a.ne - b.ne - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_switch_preset_is_visible_immediately() {
        let active = ActiveModel::from_preset(ModelPreset::Ne2001).unwrap();
        let before = active.current();
        assert_eq!(before.parameters().thick_disk.n1h1, 0.033);

        let previous = active.switch_preset(ModelPreset::Ne2025).unwrap();
        assert!(Arc::ptr_eq(&previous, &before));
        assert_eq!(active.current().parameters().thick_disk.n1h1, 0.0275);
        // A snapshot taken before the switch is unaffected
        assert_eq!(before.parameters().thick_disk.n1h1, 0.033);
    }

    #[test]
    fn test_readers_never_see_mixed_coefficients() {
        let active = Arc::new(ActiveModel::from_preset(ModelPreset::Ne2001).unwrap());
        let reader = {
            let active = Arc::clone(&active);
            std::thread::spawn(move || {
                for _ in 0..2000 {
                    let model = active.current();
                    let p = model.parameters();
                    let consistent = (p.name == ModelPreset::Ne2001.builtin_label()
                        && p.thick_disk.n1h1 == 0.033
                        && p.thick_disk.h1 == 0.97)
                        || (p.name == ModelPreset::Ne2025.builtin_label()
                            && p.thick_disk.n1h1 == 0.0275
                            && p.thick_disk.h1 == 1.67);
                    assert!(consistent, "torn model {} {}", p.name, p.thick_disk.n1h1);
                }
            })
        };
        for i in 0..20 {
            let preset = if i % 2 == 0 { ModelPreset::Ne2025 } else { ModelPreset::Ne2001 };
            active.switch_preset(preset).unwrap();
        }
        reader.join().unwrap();
    }
}
