//! Parameter bundle for the Galactic electron-density model
//!
//! Distances are kpc, densities cm^-3, fluctuation parameters pc^-2/3.
//! Catalog angles (voids, clumps, LISM rotations) are degrees as tabulated;
//! arm sample angles are radians.

use crate::error::{ModelError, ModelResult};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Multipliers that switch individual components on (1) or off (0)
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComponentWeights {
    pub thick_disk: f64,
    pub thin_disk: f64,
    pub arms: f64,
    pub galactic_center: f64,
    pub lism: f64,
    pub clumps: f64,
    pub voids: f64,
}

impl Default for ComponentWeights {
    fn default() -> Self {
        Self {
            thick_disk: 1.0,
            thin_disk: 1.0,
            arms: 1.0,
            galactic_center: 1.0,
            lism: 1.0,
            clumps: 1.0,
            voids: 1.0,
        }
    }
}

/// Thick (warm ionised) disk
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ThickDisk {
    /// Midplane density times scale height (cm^-3 kpc)
    pub n1h1: f64,
    pub h1: f64,
    /// Radial cutoff of the cosine taper
    pub a1: f64,
    pub f1: f64,
}

/// Thin inner-Galaxy annulus
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ThinDisk {
    pub n2: f64,
    pub h2: f64,
    /// Radius of peak density
    pub a2: f64,
    pub f2: f64,
}

/// Coarse (angle, radius) samples of one arm, angle increasing
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ArmSamples {
    pub theta: Vec<f64>,
    pub radius: Vec<f64>,
}

/// Spiral-arm globals, per-arm multipliers and arm geometry
///
/// Arms are stored in sequential order. `arm_map[j]` is the legacy number of
/// sequential arm `j`; the multiplier arrays are indexed by legacy number - 1.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpiralArms {
    pub na: f64,
    pub ha: f64,
    pub wa: f64,
    /// Radius beyond which arm density tapers off
    pub aa: f64,
    pub fa: f64,
    pub arm_map: Vec<usize>,
    pub narm: Vec<f64>,
    pub warm: Vec<f64>,
    pub harm: Vec<f64>,
    pub farm: Vec<f64>,
    pub samples: Vec<ArmSamples>,
}

impl SpiralArms {
    pub fn count(&self) -> usize {
        self.arm_map.len()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GalacticCenter {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub radius: f64,
    pub height: f64,
    pub density: f64,
    pub fluctuation: f64,
}

/// Ellipsoid rotated about the z axis (Local Dense Region, Local Superbubble)
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EllipsoidRegion {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub theta_deg: f64,
    pub density: f64,
    pub fluctuation: f64,
}

/// Local Hot Bubble: elliptic cylinder whose axis tilts with height
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HotBubble {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub theta_deg: f64,
    pub density: f64,
    pub fluctuation: f64,
}

/// Loop I: a sphere with a denser shell, above the plane only
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LoopI {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub radius: f64,
    pub shell_width: f64,
    pub density: f64,
    pub shell_density: f64,
    pub fluctuation: f64,
    pub shell_fluctuation: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LocalIsm {
    pub ldr: EllipsoidRegion,
    pub lsb: EllipsoidRegion,
    pub lhb: HotBubble,
    pub loop_i: LoopI,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoidEdge {
    Gaussian,
    Hard,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct VoidRecord {
    pub longitude_deg: f64,
    pub latitude_deg: f64,
    /// Heliocentric distance of the centre
    pub distance: f64,
    pub density: f64,
    pub fluctuation: f64,
    /// Semi-axes (a, b, c)
    pub axes: [f64; 3],
    pub rotation_y_deg: f64,
    pub rotation_z_deg: f64,
    pub edge: VoidEdge,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClumpEdge {
    Exponential,
    Hard,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClumpRecord {
    pub longitude_deg: f64,
    pub latitude_deg: f64,
    pub distance: f64,
    pub density: f64,
    pub fluctuation: f64,
    pub radius: f64,
    pub edge: ClumpEdge,
}

/// Complete, immutable parameter set of one model
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GalaxyParameters {
    pub name: String,
    pub rsun: f64,
    #[serde(default)]
    pub weights: ComponentWeights,
    pub thick_disk: ThickDisk,
    pub thin_disk: ThinDisk,
    pub arms: SpiralArms,
    pub galactic_center: GalacticCenter,
    #[serde(default)]
    pub lism: Option<LocalIsm>,
    #[serde(default)]
    pub voids: Vec<VoidRecord>,
    #[serde(default)]
    pub clumps: Vec<ClumpRecord>,
}

fn finite(name: &str, value: f64) -> ModelResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ModelError::invalid(name, value))
    }
}

fn positive(name: &str, value: f64) -> ModelResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ModelError::invalid(name, value))
    }
}

fn same_len(field: &str, expected: usize, actual: usize) -> ModelResult<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(ModelError::LengthMismatch {
            field: field.to_string(),
            expected,
            actual,
        })
    }
}

impl GalaxyParameters {
    /// Rejects malformed bundles before any derived structure is built
    pub fn validate(&self) -> ModelResult<()> {
        positive("rsun", self.rsun)?;

        let w = &self.weights;
        for (name, v) in [
            ("weights.thick_disk", w.thick_disk),
            ("weights.thin_disk", w.thin_disk),
            ("weights.arms", w.arms),
            ("weights.galactic_center", w.galactic_center),
            ("weights.lism", w.lism),
            ("weights.clumps", w.clumps),
            ("weights.voids", w.voids),
        ] {
            finite(name, v)?;
        }

        let d1 = &self.thick_disk;
        finite("thick_disk.n1h1", d1.n1h1)?;
        positive("thick_disk.h1", d1.h1)?;
        positive("thick_disk.a1", d1.a1)?;
        finite("thick_disk.f1", d1.f1)?;

        let d2 = &self.thin_disk;
        finite("thin_disk.n2", d2.n2)?;
        positive("thin_disk.h2", d2.h2)?;
        positive("thin_disk.a2", d2.a2)?;
        finite("thin_disk.f2", d2.f2)?;

        self.validate_arms()?;

        let gc = &self.galactic_center;
        finite("galactic_center.x", gc.x)?;
        finite("galactic_center.y", gc.y)?;
        finite("galactic_center.z", gc.z)?;
        positive("galactic_center.radius", gc.radius)?;
        positive("galactic_center.height", gc.height)?;
        finite("galactic_center.density", gc.density)?;
        finite("galactic_center.fluctuation", gc.fluctuation)?;

        if let Some(lism) = &self.lism {
            for (label, region) in [("lism.ldr", &lism.ldr), ("lism.lsb", &lism.lsb)] {
                for (axis, v) in [("a", region.a), ("b", region.b), ("c", region.c)] {
                    positive(&format!("{label}.{axis}"), v)?;
                }
            }
            let lhb = &lism.lhb;
            for (axis, v) in [("a", lhb.a), ("b", lhb.b), ("c", lhb.c)] {
                positive(&format!("lism.lhb.{axis}"), v)?;
            }
            positive("lism.loop_i.radius", lism.loop_i.radius)?;
            finite("lism.loop_i.shell_width", lism.loop_i.shell_width)?;
        }

        for (i, void) in self.voids.iter().enumerate() {
            if void.axes.iter().any(|a| !a.is_finite() || *a <= 0.0) {
                return Err(ModelError::degenerate(format!(
                    "void {} has axes {:?}",
                    i + 1,
                    void.axes
                )));
            }
            finite("void.distance", void.distance)?;
            finite("void.longitude_deg", void.longitude_deg)?;
            finite("void.latitude_deg", void.latitude_deg)?;
            finite("void.density", void.density)?;
        }

        for (i, clump) in self.clumps.iter().enumerate() {
            if !clump.radius.is_finite() || clump.radius <= 0.0 {
                return Err(ModelError::degenerate(format!(
                    "clump {} has radius {}",
                    i + 1,
                    clump.radius
                )));
            }
            finite("clump.distance", clump.distance)?;
            finite("clump.longitude_deg", clump.longitude_deg)?;
            finite("clump.latitude_deg", clump.latitude_deg)?;
            finite("clump.density", clump.density)?;
        }

        Ok(())
    }

    fn validate_arms(&self) -> ModelResult<()> {
        let arms = &self.arms;
        let n = arms.count();
        if n == 0 {
            return Err(ModelError::ArmMap {
                arms: 0,
                detail: "no arms configured".to_string(),
            });
        }

        same_len("arms.narm", n, arms.narm.len())?;
        same_len("arms.warm", n, arms.warm.len())?;
        same_len("arms.harm", n, arms.harm.len())?;
        same_len("arms.farm", n, arms.farm.len())?;
        same_len("arms.samples", n, arms.samples.len())?;

        let mut seen = HashSet::new();
        for &legacy in &arms.arm_map {
            if legacy == 0 || legacy > n || !seen.insert(legacy) {
                return Err(ModelError::ArmMap {
                    arms: n,
                    detail: format!("{:?}", arms.arm_map),
                });
            }
        }

        finite("arms.na", arms.na)?;
        positive("arms.ha", arms.ha)?;
        positive("arms.wa", arms.wa)?;
        positive("arms.aa", arms.aa)?;
        finite("arms.fa", arms.fa)?;
        for k in 0..n {
            finite("arms.narm", arms.narm[k])?;
            positive("arms.warm", arms.warm[k])?;
            positive("arms.harm", arms.harm[k])?;
            finite("arms.farm", arms.farm[k])?;
        }

        let per_arm = arms.samples[0].theta.len();
        for (j, samples) in arms.samples.iter().enumerate() {
            same_len(&format!("arms.samples[{j}].theta"), per_arm, samples.theta.len())?;
            same_len(&format!("arms.samples[{j}].radius"), per_arm, samples.radius.len())?;
            if per_arm < 3 {
                return Err(ModelError::degenerate(format!(
                    "arm {j} has {per_arm} samples, need at least 3"
                )));
            }
            if samples.theta.iter().chain(&samples.radius).any(|v| !v.is_finite()) {
                return Err(ModelError::degenerate(format!("arm {j} has non-finite samples")));
            }
            if samples.theta.windows(2).any(|w| w[1] <= w[0]) {
                return Err(ModelError::degenerate(format!(
                    "arm {j} angles are not strictly increasing"
                )));
            }
        }

        Ok(())
    }
}

/// Load and validate a parameter bundle from a JSON file
pub fn load_parameters_json(path: &Path) -> Result<GalaxyParameters> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read parameter file: {}", path.display()))?;

    let params: GalaxyParameters = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse parameter JSON: {}", path.display()))?;

    params
        .validate()
        .with_context(|| format!("Invalid parameters in {}", path.display()))?;

    Ok(params)
}
