//! Regression checks against published reference sightlines
//!
//! The reference values were produced with the full NE2001/NE2025 parameter
//! bundles, including the void and clump catalogs. The bundles are read as
//! JSON from the directory named by `NEMOD_REFERENCE_DIR`. The built-in
//! presets lack the catalogs, so their own values are pinned separately in
//! the tests below.

use crate::error::IntegrateResult;
use crate::integrator::{dm_distance, LosResult};
use anyhow::{Context, Result};
use nemod_core::constants::{DEFAULT_MIN_SAMPLES, DEFAULT_STEP_COARSE, DEFAULT_STEP_FINE};
use nemod_model::{load_parameters_json, GalaxyModel, ModelPreset};
use std::env;
use std::path::PathBuf;

/// Directory holding `ne2001.json` / `ne2025.json`
pub const REFERENCE_DIR_ENV: &str = "NEMOD_REFERENCE_DIR";

/// Relative tolerance for the reference comparisons
pub const REFERENCE_REL_TOL: f64 = 1e-6;

/// Forward integration with known DM and scattering measures
#[derive(Clone, Copy, Debug)]
pub struct SightlineCase {
    pub name: &'static str,
    pub l_deg: f64,
    pub b_deg: f64,
    /// kpc
    pub distance: f64,
    pub dm: f64,
    pub sm: f64,
    pub sm_tau: f64,
    pub sm_theta: f64,
    pub sm_iso: f64,
}

/// Model the sightline references were produced with
pub const SIGHTLINE_PRESET: ModelPreset = ModelPreset::Ne2025;

/// [`SIGHTLINE_PRESET`] sightlines at the default step sizes
pub const SIGHTLINE_CASES: [SightlineCase; 4] = [
    SightlineCase {
        name: "inner-disk",
        l_deg: 30.0,
        b_deg: 0.0,
        distance: 50.0,
        dm: 1446.7678216162012,
        sm: 8.5444257036687414,
        sm_tau: 6.6315500476504612,
        sm_theta: 18.3433973830609,
        sm_iso: 269.37267702696971,
    },
    SightlineCase {
        name: "first-quadrant-halo",
        l_deg: 65.0,
        b_deg: 10.0,
        distance: 50.0,
        dm: 134.00308115340957,
        sm: 4.5439124029864395e-4,
        sm_tau: 2.2440369029998707e-4,
        sm_theta: 1.1232530653137534e-3,
        sm_iso: 6.9248055402793629e-3,
    },
    SightlineCase {
        name: "outer-disk",
        l_deg: 120.0,
        b_deg: 25.0,
        distance: 1.5,
        dm: 20.954337826482909,
        sm: 8.6709283724333442e-5,
        sm_tau: 9.5814025238290896e-5,
        sm_theta: 5.2655340157769143e-5,
        sm_iso: 8.1582771369937196e-5,
    },
    SightlineCase {
        name: "anticentre-nearby",
        l_deg: 152.18,
        b_deg: -14.338,
        distance: 0.95,
        dm: 16.240964985748889,
        sm: 1.3802585031930291e-4,
        sm_tau: 1.5670789856281705e-4,
        sm_theta: 6.3477819939699418e-5,
        sm_iso: 6.5942541166867747e-5,
    },
];

/// DM -> distance -> DM with known intermediate distance
#[derive(Clone, Copy, Debug)]
pub struct RoundTripCase {
    pub preset: ModelPreset,
    pub l_deg: f64,
    pub b_deg: f64,
    pub dm: f64,
    pub distance: f64,
    pub round_trip_dm: f64,
}

pub const ROUND_TRIP_CASES: [RoundTripCase; 2] = [
    RoundTripCase {
        preset: ModelPreset::Ne2001,
        l_deg: 200.0,
        b_deg: -6.5,
        dm: 100.0,
        distance: 3.2587940591703823,
        round_trip_dm: 99.99330830834366,
    },
    RoundTripCase {
        preset: ModelPreset::Ne2025,
        l_deg: 200.0,
        b_deg: -6.5,
        dm: 100.0,
        distance: 2.6198777416235903,
        round_trip_dm: 100.00400417623374,
    },
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Quantity {
    Distance,
    Dm,
    Sm,
    SmTau,
    SmTheta,
    SmIso,
}

/// One computed value next to its reference
#[derive(Clone, Copy, Debug)]
pub struct RegressionPoint {
    pub case: &'static str,
    pub quantity: Quantity,
    pub computed: f64,
    pub expected: f64,
    pub rel_error: f64,
}

impl RegressionPoint {
    pub fn new(case: &'static str, quantity: Quantity, computed: f64, expected: f64) -> Self {
        let rel_error = if expected != 0.0 {
            ((computed - expected) / expected).abs()
        } else {
            computed.abs()
        };
        Self {
            case,
            quantity,
            computed,
            expected,
            rel_error,
        }
    }

    pub fn within(&self, tol: f64) -> bool {
        self.rel_error <= tol
    }
}

fn integrate(model: &GalaxyModel, l_deg: f64, b_deg: f64, target: f64, direction: i32) -> IntegrateResult<LosResult> {
    dm_distance(
        model,
        l_deg.to_radians(),
        b_deg.to_radians(),
        target,
        direction,
        DEFAULT_STEP_COARSE,
        DEFAULT_STEP_FINE,
        DEFAULT_MIN_SAMPLES,
    )
}

/// Compare a forward integration against its reference values
pub fn check_sightline(model: &GalaxyModel, case: &SightlineCase) -> IntegrateResult<Vec<RegressionPoint>> {
    let r = integrate(model, case.l_deg, case.b_deg, case.distance, 1)?;
    Ok(vec![
        RegressionPoint::new(case.name, Quantity::Dm, r.dm, case.dm),
        RegressionPoint::new(case.name, Quantity::Sm, r.sm, case.sm),
        RegressionPoint::new(case.name, Quantity::SmTau, r.sm_tau, case.sm_tau),
        RegressionPoint::new(case.name, Quantity::SmTheta, r.sm_theta, case.sm_theta),
        RegressionPoint::new(case.name, Quantity::SmIso, r.sm_iso, case.sm_iso),
    ])
}

/// Invert the case DM, then integrate forward to the distance found
pub fn check_round_trip(model: &GalaxyModel, case: &RoundTripCase) -> IntegrateResult<Vec<RegressionPoint>> {
    let inverse = integrate(model, case.l_deg, case.b_deg, case.dm, -1)?;
    let forward = integrate(model, case.l_deg, case.b_deg, inverse.distance, 1)?;
    let name = case.preset.name();
    Ok(vec![
        RegressionPoint::new(name, Quantity::Distance, inverse.distance, case.distance),
        RegressionPoint::new(name, Quantity::Dm, forward.dm, case.round_trip_dm),
    ])
}

/// Error statistics for one quantity
#[derive(Debug)]
pub struct RegressionSummary {
    pub quantity: Quantity,
    pub num_points: usize,
    pub mean_rel_error: f64,
    pub max_rel_error: f64,
}

/// Per-quantity statistics, ordered by quantity
pub fn summarize(points: &[RegressionPoint]) -> Vec<RegressionSummary> {
    use std::collections::BTreeMap;

    let mut by_quantity: BTreeMap<Quantity, Vec<&RegressionPoint>> = BTreeMap::new();
    for point in points {
        by_quantity.entry(point.quantity).or_default().push(point);
    }

    by_quantity
        .into_iter()
        .map(|(quantity, points)| {
            let n = points.len();
            RegressionSummary {
                quantity,
                num_points: n,
                mean_rel_error: points.iter().map(|p| p.rel_error).sum::<f64>() / n as f64,
                max_rel_error: points.iter().map(|p| p.rel_error).fold(0.0, f64::max),
            }
        })
        .collect()
}

/// Location of a preset's reference bundle, if the directory is configured
pub fn reference_bundle_path(preset: ModelPreset) -> Option<PathBuf> {
    let dir = env::var_os(REFERENCE_DIR_ENV)?;
    Some(PathBuf::from(dir).join(preset.bundle_file()))
}

/// Build a model from a preset's reference bundle
pub fn load_reference_model(preset: ModelPreset) -> Result<GalaxyModel> {
    let path = reference_bundle_path(preset)
        .with_context(|| format!("{} is not set", REFERENCE_DIR_ENV))?;
    let params = load_parameters_json(&path)?;
    let model = GalaxyModel::new(params)
        .with_context(|| format!("Failed to build model from {}", path.display()))?;
    tracing::info!("Loaded reference model {} from {}", model.name(), path.display());
    Ok(model)
}
