//! Smooth large-scale components: thick disk, thin disk and Galactic center

use crate::density::ElectronDensity;
use crate::params::{GalacticCenter, ThickDisk, ThinDisk};
use nemod_core::GalactocentricPosition;
use std::f64::consts::FRAC_PI_2;

/// Thin-disk radial Gaussian width (kpc)
const THIN_DISK_WIDTH: f64 = 1.8;

/// sech^2(u) written to stay finite for any |u|
pub fn sech2(u: f64) -> f64 {
    let e = (-2.0 * u.abs()).exp();
    4.0 * e / ((1.0 + e) * (1.0 + e))
}

impl ThickDisk {
    /// Cosine radial taper normalised at the Sun, sech^2 in z
    pub fn density(&self, pos: &GalactocentricPosition, rsun: f64) -> ElectronDensity {
        let rr = pos.cylindrical_radius();
        let g1 = if rr > self.a1 {
            0.0
        } else {
            (FRAC_PI_2 * rr / self.a1).cos() / (FRAC_PI_2 * rsun / self.a1).cos()
        };
        ElectronDensity {
            ne: (self.n1h1 / self.h1) * g1 * sech2(pos.z / self.h1),
            f: self.f1,
        }
    }

    pub fn density_many(&self, positions: &[GalactocentricPosition], rsun: f64) -> Vec<ElectronDensity> {
        positions.iter().map(|p| self.density(p, rsun)).collect()
    }
}

impl ThinDisk {
    /// Gaussian annulus around a2, sech^2 in z
    pub fn density(&self, pos: &GalactocentricPosition) -> ElectronDensity {
        let rr = pos.cylindrical_radius();
        let arg = ((rr - self.a2) / THIN_DISK_WIDTH).powi(2);
        let g2 = if arg < 10.0 { (-arg).exp() } else { 0.0 };
        ElectronDensity {
            ne: self.n2 * g2 * sech2(pos.z / self.h2),
            f: self.f2,
        }
    }

    pub fn density_many(&self, positions: &[GalactocentricPosition]) -> Vec<ElectronDensity> {
        positions.iter().map(|p| self.density(p)).collect()
    }
}

impl GalacticCenter {
    /// |y| beyond which the region is skipped without further tests
    pub fn y_cutoff(&self) -> f64 {
        2.0 * self.radius
    }

    /// Uniform density inside the centre ellipsoid, zero outside
    pub fn density(&self, pos: &GalactocentricPosition) -> ElectronDensity {
        if pos.y.abs() > self.y_cutoff() {
            return ElectronDensity::ZERO;
        }

        let rr = ((pos.x - self.x).powi(2) + (pos.y - self.y).powi(2)).sqrt();
        let zz = (pos.z - self.z).abs();
        if rr > self.radius || zz > self.height {
            return ElectronDensity::ZERO;
        }

        if (rr / self.radius).powi(2) + (zz / self.height).powi(2) <= 1.0 {
            ElectronDensity {
                ne: self.density,
                f: self.fluctuation,
            }
        } else {
            ElectronDensity::ZERO
        }
    }

    pub fn density_many(&self, positions: &[GalactocentricPosition]) -> Vec<ElectronDensity> {
        positions.iter().map(|p| self.density(p)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets::ModelPreset;

    #[test]
    fn test_sech2_stable() {
        assert_eq!(sech2(0.0), 1.0);
        for u in [0.1_f64, -0.7, 2.5, 12.0] {
            let direct = 1.0 / u.cosh().powi(2);
            assert!((sech2(u) - direct).abs() < 1e-14 * direct.max(1e-300) + 1e-300);
        }
        assert_eq!(sech2(1e6), 0.0);
        assert!(sech2(-800.0).is_finite());
    }

    #[test]
    fn test_thick_disk_at_sun() {
        let params = ModelPreset::Ne2001.parameters();
        let sun = GalactocentricPosition::new(0.0, params.rsun, 0.0);
        let d = params.thick_disk.density(&sun, params.rsun);
        assert!((d.ne - 0.033 / 0.97).abs() < 1e-15);
        assert_eq!(d.f, 0.18);

        let outside = GalactocentricPosition::new(0.0, 18.0, 0.0);
        assert_eq!(params.thick_disk.density(&outside, params.rsun).ne, 0.0);
    }

    #[test]
    fn test_thin_disk_peak_and_cutoff() {
        let disk = ModelPreset::Ne2001.parameters().thin_disk;
        let peak = disk.density(&GalactocentricPosition::new(3.8, 0.0, 0.0));
        assert_eq!(peak.ne, 0.08);
        // ((r - 3.8) / 1.8)^2 >= 10 beyond r = 3.8 + 1.8 sqrt(10)
        let far = disk.density(&GalactocentricPosition::new(0.0, 9.5, 0.0));
        assert_eq!(far.ne, 0.0);
        assert_eq!(far.f, 120.0);
    }

    #[test]
    fn test_galactic_center_inside() {
        let gc = ModelPreset::Ne2001.parameters().galactic_center;
        let d = gc.density(&GalactocentricPosition::new(gc.x, gc.y, gc.z));
        assert_eq!(d, ElectronDensity { ne: 10.0, f: 0.6e5 });
    }

    #[test]
    fn test_galactic_center_outside_ellipsoid() {
        let gc = ModelPreset::Ne2001.parameters().galactic_center;
        // Inside the bounding cylinder, outside the ellipsoid
        let pos = GalactocentricPosition::new(gc.x + 0.9 * gc.radius, gc.y, gc.z + 0.9 * gc.height);
        assert_eq!(gc.density(&pos), ElectronDensity::ZERO);
    }

    #[test]
    fn test_galactic_center_early_exit() {
        let mut gc = ModelPreset::Ne2001.parameters().galactic_center;
        // Ellipsoid moved onto the sample point: still zero, the |y| test comes first
        gc.y = 1.0;
        gc.radius = 0.2;
        let pos = GalactocentricPosition::new(gc.x, 1.0, gc.z);
        assert!(pos.y.abs() > gc.y_cutoff());
        assert_eq!(gc.density(&pos), ElectronDensity::ZERO);
    }

    #[test]
    fn test_batch_forms_match() {
        let params = ModelPreset::Ne2025.parameters();
        let positions: Vec<_> = (0..50)
            .map(|i| GalactocentricPosition::new(-0.2 + 0.01 * i as f64, 0.3 * i as f64, 0.004 * i as f64 - 0.1))
            .collect();
        let thick = params.thick_disk.density_many(&positions, params.rsun);
        let thin = params.thin_disk.density_many(&positions);
        let gc = params.galactic_center.density_many(&positions);
        for (i, p) in positions.iter().enumerate() {
            assert_eq!(thick[i], params.thick_disk.density(p, params.rsun));
            assert_eq!(thin[i], params.thin_disk.density(p));
            assert_eq!(gc[i], params.galactic_center.density(p));
        }
    }
}
