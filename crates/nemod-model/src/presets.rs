//! Built-in parameter sets

use crate::error::ModelError;
use crate::params::*;
use nemod_core::constants::RSUN_KPC;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

/// Coarse samples generated per arm
pub const COARSE_ARM_SAMPLES: usize = 20;

/// Legacy number of each sequential arm
const ARM_MAP: [usize; 5] = [1, 3, 4, 2, 5];

/// Log-spiral arm shapes, sequential order: (pitch a, rmin, theta_min, extent)
const ARM_SPIRALS: [(f64, f64, f64, f64); 5] = [
    (4.25, 3.48, 0.000, 6.0),
    (4.25, 3.48, 3.141, 6.0),
    (4.89, 4.90, 2.525, 6.0),
    (4.89, 3.76, 4.240, 6.0),
    (4.57, 8.10, 5.847, 0.55),
];

/// Named model presets
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelPreset {
    Ne2001,
    Ne2025,
}

impl ModelPreset {
    pub fn name(&self) -> &'static str {
        match self {
            ModelPreset::Ne2001 => "NE2001",
            ModelPreset::Ne2025 => "NE2025",
        }
    }

    /// Name carried by the built-in bundle
    ///
    /// Built-in bundles hold the analytic components with empty void and
    /// clump catalogs. For NE2025 only the thick-disk revision is built in;
    /// its other refits and both catalogs come from a full JSON bundle
    /// (see [`load_parameters_json`](crate::params::load_parameters_json)).
    pub fn builtin_label(&self) -> &'static str {
        match self {
            ModelPreset::Ne2001 => "NE2001 (no catalogs)",
            ModelPreset::Ne2025 => "NE2025 thick disk on NE2001",
        }
    }

    /// File name of the full bundle inside a bundle directory
    pub fn bundle_file(&self) -> &'static str {
        match self {
            ModelPreset::Ne2001 => "ne2001.json",
            ModelPreset::Ne2025 => "ne2025.json",
        }
    }

    /// Built-in parameter bundle, labelled with [`builtin_label`](Self::builtin_label)
    pub fn parameters(&self) -> GalaxyParameters {
        let thick_disk = match self {
            ModelPreset::Ne2001 => ThickDisk { n1h1: 0.033, h1: 0.97, a1: 17.5, f1: 0.18 },
            ModelPreset::Ne2025 => ThickDisk { n1h1: 0.0275, h1: 1.67, a1: 17.5, f1: 0.18 },
        };

        GalaxyParameters {
            name: self.builtin_label().to_string(),
            rsun: RSUN_KPC,
            weights: ComponentWeights::default(),
            thick_disk,
            thin_disk: ThinDisk { n2: 0.08, h2: 0.15, a2: 3.8, f2: 120.0 },
            arms: ne2001_arms(),
            galactic_center: GalacticCenter {
                x: -0.01,
                y: 0.0,
                z: -0.020,
                radius: 0.145,
                height: 0.026,
                density: 10.0,
                fluctuation: 0.6e5,
            },
            lism: Some(ne2001_lism()),
            voids: Vec::new(),
            clumps: Vec::new(),
        }
    }
}

impl fmt::Display for ModelPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ModelPreset {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ne2001" => Ok(ModelPreset::Ne2001),
            "ne2025" => Ok(ModelPreset::Ne2025),
            _ => Err(ModelError::UnknownPreset(s.to_string())),
        }
    }
}

fn ne2001_arms() -> SpiralArms {
    let samples = ARM_SPIRALS
        .iter()
        .zip(ARM_MAP)
        .map(|(&(a, rmin, thmin, extent), legacy)| log_spiral(a, rmin, thmin, extent, legacy))
        .collect();

    SpiralArms {
        na: 0.028,
        ha: 0.23,
        wa: 0.65,
        aa: 10.5,
        fa: 5.0,
        arm_map: ARM_MAP.to_vec(),
        narm: vec![0.5, 1.2, 1.3, 1.0, 0.25],
        warm: vec![1.0, 1.5, 1.0, 0.8, 1.0],
        harm: vec![1.0, 0.8, 1.3, 1.5, 1.0],
        farm: vec![1.1, 0.3, 0.4, 1.5, 0.3],
        samples,
    }
}

/// Samples r = rmin exp((theta - thmin) / a) over [thmin, thmin + extent]
fn log_spiral(a: f64, rmin: f64, thmin: f64, extent: f64, legacy: usize) -> ArmSamples {
    let n = COARSE_ARM_SAMPLES;
    let dth = extent / (n - 1) as f64;
    let theta: Vec<f64> = (0..n).map(|i| thmin + i as f64 * dth).collect();
    let radius = theta
        .iter()
        .map(|&th| sculpt(legacy, th.to_degrees(), rmin * ((th - thmin) / a).exp()))
        .collect();
    ArmSamples { theta, radius }
}

/// Local radial adjustments of legacy arms 2 and 3 (angle unwrapped, degrees)
fn sculpt(legacy: usize, th: f64, r: f64) -> f64 {
    match legacy {
        3 if th > 370.0 && th <= 410.0 => r * (1.0 + 0.04 * (PI * (th - 390.0) / 40.0).cos()),
        3 if th > 315.0 && th <= 370.0 => r * (1.0 - 0.07 * (PI * (th - 345.0) / 55.0).cos()),
        3 if th > 180.0 && th <= 315.0 => r * (1.0 + 0.16 * (PI * (th - 260.0) / 135.0).cos()),
        2 if th > 290.0 && th <= 395.0 => r * (1.0 - 0.11 * (PI * (th - 350.0) / 105.0).cos()),
        _ => r,
    }
}

fn ne2001_lism() -> LocalIsm {
    LocalIsm {
        ldr: EllipsoidRegion {
            a: 1.50,
            b: 0.75,
            c: 0.50,
            x: 1.36,
            y: 8.06,
            z: 0.0,
            theta_deg: -24.2,
            density: 0.012,
            fluctuation: 0.1,
        },
        lsb: EllipsoidRegion {
            a: 1.050,
            b: 0.425,
            c: 0.325,
            x: -0.75,
            y: 9.0,
            z: -0.05,
            theta_deg: 139.0,
            density: 0.016,
            fluctuation: 0.01,
        },
        lhb: HotBubble {
            a: 0.085,
            b: 0.100,
            c: 0.330,
            x: 0.01,
            y: 8.45,
            z: 0.17,
            theta_deg: 15.0,
            density: 0.005,
            fluctuation: 0.01,
        },
        loop_i: LoopI {
            x: -0.045,
            y: 8.40,
            z: 0.07,
            radius: 0.120,
            shell_width: 0.060,
            density: 0.0125,
            shell_density: 0.0125,
            fluctuation: 0.2,
            shell_fluctuation: 0.01,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!("ne2001".parse::<ModelPreset>().unwrap(), ModelPreset::Ne2001);
        assert_eq!("NE2025".parse::<ModelPreset>().unwrap(), ModelPreset::Ne2025);
        assert!(matches!("ne2000".parse::<ModelPreset>(), Err(ModelError::UnknownPreset(_))));
    }

    #[test]
    fn test_presets_differ_in_thick_disk() {
        let a = ModelPreset::Ne2001.parameters();
        let b = ModelPreset::Ne2025.parameters();
        assert_eq!(a.thick_disk.n1h1, 0.033);
        assert_eq!(b.thick_disk.n1h1, 0.0275);
        assert_eq!(a.arms, b.arms);
    }

    #[test]
    fn test_builtin_bundles_are_labelled_as_partial() {
        assert_eq!(ModelPreset::Ne2025.parameters().name, "NE2025 thick disk on NE2001");
        assert_ne!(ModelPreset::Ne2025.parameters().name, ModelPreset::Ne2025.name());
        assert!(ModelPreset::Ne2001.parameters().voids.is_empty());
        assert_eq!(ModelPreset::Ne2025.bundle_file(), "ne2025.json");
    }

    #[test]
    fn test_arm_samples_follow_log_spiral() {
        let arms = ne2001_arms();
        // Arm 0 (legacy 1) is never sculpted
        let s = &arms.samples[0];
        assert_eq!(s.theta.len(), COARSE_ARM_SAMPLES);
        assert!((s.radius[0] - 3.48).abs() < 1e-12);
        let last = s.theta[COARSE_ARM_SAMPLES - 1];
        assert!((last - 6.0).abs() < 1e-12);
        assert!((s.radius[COARSE_ARM_SAMPLES - 1] - 3.48 * (6.0f64 / 4.25).exp()).abs() < 1e-9);
    }

    #[test]
    fn test_sculpting_windows() {
        assert_eq!(sculpt(1, 300.0, 5.0), 5.0);
        assert_eq!(sculpt(3, 100.0, 5.0), 5.0);
        // Window centres
        assert!((sculpt(3, 260.0, 5.0) - 5.0 * 1.16).abs() < 1e-12);
        assert!((sculpt(3, 345.0, 5.0) - 5.0 * 0.93).abs() < 1e-12);
        assert!((sculpt(3, 390.0, 5.0) - 5.0 * 1.04).abs() < 1e-12);
        assert!((sculpt(2, 350.0, 5.0) - 5.0 * 0.89).abs() < 1e-12);
    }
}
