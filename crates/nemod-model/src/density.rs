//! Density results and the rules that combine components

use crate::arms::ArmDensity;
use crate::clumps::ClumpHit;
use crate::lism::LismHit;
use crate::params::ComponentWeights;
use crate::voids::VoidHit;
use serde::{Deserialize, Serialize};

/// Electron density (cm^-3) and fluctuation parameter
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ElectronDensity {
    pub ne: f64,
    pub f: f64,
}

impl ElectronDensity {
    pub const ZERO: Self = Self { ne: 0.0, f: 0.0 };

    /// Scattering weight F ne^2
    pub fn dsm(&self) -> f64 {
        self.f * self.ne * self.ne
    }
}

/// Density and F-weighted squared density, the two integrands of a sightline
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PathSample {
    pub ne: f64,
    pub dsm: f64,
}

impl PathSample {
    /// Effective fluctuation parameter dsm / ne^2
    pub fn into_density(self) -> ElectronDensity {
        let f = if self.ne > 0.0 { self.dsm / (self.ne * self.ne) } else { 0.0 };
        ElectronDensity { ne: self.ne, f }
    }
}

/// Large-scale components at one point
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SmoothComponents {
    pub thick_disk: ElectronDensity,
    pub thin_disk: ElectronDensity,
    pub arms: ArmDensity,
    pub galactic_center: ElectronDensity,
}

impl SmoothComponents {
    pub fn sum(&self, w: &ComponentWeights) -> PathSample {
        let arms = ElectronDensity { ne: self.arms.ne, f: self.arms.f };
        PathSample {
            ne: w.thick_disk * self.thick_disk.ne
                + w.thin_disk * self.thin_disk.ne
                + w.arms * arms.ne
                + w.galactic_center * self.galactic_center.ne,
            dsm: w.thick_disk * self.thick_disk.dsm()
                + w.thin_disk * self.thin_disk.dsm()
                + w.arms * arms.dsm()
                + w.galactic_center * self.galactic_center.dsm(),
        }
    }
}

/// Localised components at one point
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SmallScaleComponents {
    pub lism: LismHit,
    pub void: VoidHit,
    pub clump: ClumpHit,
}

impl SmallScaleComponents {
    /// Blends the local components into a smooth-component sum
    ///
    /// The LISM and voids replace the smooth density where they apply;
    /// clumps add on top.
    pub fn apply(&self, smooth: PathSample, w: &ComponentWeights) -> PathSample {
        let wl = w.lism * self.lism.weight;
        let lism = ElectronDensity { ne: self.lism.ne, f: self.lism.f };
        let ne = (1.0 - wl) * smooth.ne + wl * lism.ne;
        let dsm = (1.0 - wl) * smooth.dsm + wl * lism.dsm();

        let wv = w.voids * self.void.weight();
        let void = ElectronDensity { ne: self.void.ne, f: self.void.f };
        let clump = ElectronDensity { ne: self.clump.ne, f: self.clump.f };
        PathSample {
            ne: (1.0 - wv) * ne + wv * void.ne + w.clumps * clump.ne,
            dsm: (1.0 - wv) * dsm + wv * void.dsm() + w.clumps * clump.dsm(),
        }
    }
}

/// Every component's contribution at a point
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DensityBreakdown {
    pub smooth: SmoothComponents,
    pub small_scale: SmallScaleComponents,
    pub total: ElectronDensity,
}

impl DensityBreakdown {
    /// Legacy number of the nearest arm, 0 when none
    pub fn which_arm(&self) -> usize {
        self.smooth.arms.which_arm
    }

    /// 1-based void index, 0 when none
    pub fn which_void(&self) -> usize {
        self.small_scale.void.index
    }

    pub fn which_clump(&self) -> usize {
        self.small_scale.clump.index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn smooth() -> SmoothComponents {
        SmoothComponents {
            thick_disk: ElectronDensity { ne: 0.03, f: 0.2 },
            thin_disk: ElectronDensity { ne: 0.01, f: 100.0 },
            arms: ArmDensity { ne: 0.02, f: 5.0, which_arm: 1 },
            galactic_center: ElectronDensity::ZERO,
        }
    }

    #[test]
    fn test_weights_switch_components() {
        let mut w = ComponentWeights::default();
        let all = smooth().sum(&w);
        assert!((all.ne - 0.06).abs() < 1e-15);
        let expected_dsm = 0.2 * 0.03 * 0.03 + 100.0 * 0.01 * 0.01 + 5.0 * 0.02 * 0.02;
        assert!((all.dsm - expected_dsm).abs() < 1e-15);

        w.thin_disk = 0.0;
        w.arms = 0.0;
        let disk_only = smooth().sum(&w);
        assert!((disk_only.ne - 0.03).abs() < 1e-15);
    }

    #[test]
    fn test_void_replaces_and_clump_adds() {
        let w = ComponentWeights::default();
        let base = smooth().sum(&w);
        let small = SmallScaleComponents {
            void: VoidHit { ne: 0.001, f: 1.0, index: 3 },
            clump: ClumpHit { ne: 0.5, f: 2.0, index: 1 },
            ..Default::default()
        };
        let out = small.apply(base, &w);
        assert!((out.ne - 0.501).abs() < 1e-15);
        assert!((out.dsm - (1e-6 + 2.0 * 0.25)).abs() < 1e-15);
    }

    #[test]
    fn test_untouched_without_small_scale_hits() {
        let w = ComponentWeights::default();
        let base = smooth().sum(&w);
        assert_eq!(SmallScaleComponents::default().apply(base, &w), base);
    }

    #[test]
    fn test_effective_fluctuation() {
        let sample = PathSample { ne: 0.1, dsm: 0.003 };
        assert!((sample.into_density().f - 0.3).abs() < 1e-12);
        assert_eq!(PathSample::default().into_density(), ElectronDensity::ZERO);
    }
}
