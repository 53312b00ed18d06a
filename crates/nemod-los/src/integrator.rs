//! DM <-> distance integration along a sightline
//!
//! Smooth components are sampled on a coarse grid and splined onto a fine
//! grid; localised components are evaluated on the fine grid directly.
//! Forward mode integrates to the requested distance. Inverse mode
//! integrates to the distance ceiling once and inverts the cumulative DM.

use crate::error::{IntegrateResult, LosError};
use crate::profile::{Moments, PathProfile};
use crate::sightline::Sightline;
use nemod_core::constants::{
    DEFAULT_MAX_DISTANCE, DEFAULT_MIN_SAMPLES, DEFAULT_STEP_COARSE, DEFAULT_STEP_FINE,
};
use nemod_core::{CubicSpline, GalacticDirection, GridConfig};
use nemod_model::{GalaxyModel, PathSample};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Integration configuration
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegrationConfig {
    /// Largest step for the smooth components (kpc)
    pub step_coarse: f64,
    /// Largest step for the localised components (kpc)
    pub step_fine: f64,
    /// Minimum number of intervals on either grid
    pub min_samples: usize,
    /// Path-length ceiling (kpc)
    pub max_distance: f64,
    /// Optional DM ceiling (pc cm^-3)
    pub max_dm: Option<f64>,
}

impl Default for IntegrationConfig {
    fn default() -> Self {
        Self {
            step_coarse: DEFAULT_STEP_COARSE,
            step_fine: DEFAULT_STEP_FINE,
            min_samples: DEFAULT_MIN_SAMPLES,
            max_distance: DEFAULT_MAX_DISTANCE,
            max_dm: None,
        }
    }
}

impl IntegrationConfig {
    pub fn validate(&self) -> IntegrateResult<()> {
        let positive = |name: &str, v: f64| {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(LosError::InvalidConfig(format!("{name} must be positive, got {v}")))
            }
        };
        positive("step_coarse", self.step_coarse)?;
        positive("step_fine", self.step_fine)?;
        positive("max_distance", self.max_distance)?;
        if let Some(max_dm) = self.max_dm {
            positive("max_dm", max_dm)?;
        }
        if self.min_samples < 2 {
            return Err(LosError::InvalidConfig(format!(
                "min_samples must be at least 2, got {}",
                self.min_samples
            )));
        }
        Ok(())
    }
}

/// What the target of an integration is
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Target is a distance; compute its DM (+1)
    DistanceToDm,
    /// Target is a DM; find its distance (-1)
    DmToDistance,
}

impl TryFrom<i32> for Direction {
    type Error = LosError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Direction::DistanceToDm),
            -1 => Ok(Direction::DmToDistance),
            other => Err(LosError::InvalidDirection(other)),
        }
    }
}

/// How an integration terminated
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PathLimit {
    #[default]
    Unconstrained,
    /// Stopped at the distance ceiling
    DistanceLimited,
    /// Stopped at the DM ceiling
    DmLimited,
}

impl PathLimit {
    /// Single-character status: blank, '>' or '<'
    pub fn code(&self) -> char {
        match self {
            PathLimit::Unconstrained => ' ',
            PathLimit::DistanceLimited => '>',
            PathLimit::DmLimited => '<',
        }
    }
}

impl fmt::Display for PathLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Result of one sightline integration
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LosResult {
    pub limit: PathLimit,
    /// kpc
    pub distance: f64,
    /// pc cm^-3
    pub dm: f64,
    /// kpc m^-20/3
    pub sm: f64,
    pub sm_tau: f64,
    pub sm_theta: f64,
    pub sm_iso: f64,
}

impl LosResult {
    fn from_moments(limit: PathLimit, distance: f64, dm: f64, moments: &Moments) -> Self {
        let sm = moments.scattering(distance);
        Self {
            limit,
            distance,
            dm,
            sm: sm.sm,
            sm_tau: sm.sm_tau,
            sm_theta: sm.sm_theta,
            sm_iso: sm.sm_iso,
        }
    }
}

/// Integrates a model along sightlines
pub struct LineOfSightIntegrator<'m> {
    model: &'m GalaxyModel,
    config: IntegrationConfig,
}

impl<'m> LineOfSightIntegrator<'m> {
    pub fn new(model: &'m GalaxyModel, config: IntegrationConfig) -> IntegrateResult<Self> {
        config.validate()?;
        Ok(Self { model, config })
    }

    pub fn with_defaults(model: &'m GalaxyModel) -> Self {
        Self {
            model,
            config: IntegrationConfig::default(),
        }
    }

    pub fn config(&self) -> &IntegrationConfig {
        &self.config
    }

    /// Samples the combined density from the observer out to `end`
    pub fn profile(&self, direction: GalacticDirection, end: f64) -> IntegrateResult<PathProfile> {
        let line = Sightline::new(direction, self.model.rsun());
        let coarse = GridConfig::new(self.config.step_coarse, self.config.min_samples).spanning(end);
        let fine = GridConfig::new(self.config.step_fine, self.config.min_samples).spanning(end);
        tracing::debug!(
            "Sampling {:.4} kpc: {} coarse, {} fine samples",
            end,
            coarse.len(),
            fine.len()
        );

        let weights = &self.model.parameters().weights;
        let smooth: Vec<PathSample> = self
            .model
            .smooth_components_many(&line.positions(&coarse))?
            .iter()
            .map(|c| c.sum(weights))
            .collect();
        let ne_coarse: Vec<f64> = smooth.iter().map(|p| p.ne).collect();
        let dsm_coarse: Vec<f64> = smooth.iter().map(|p| p.dsm).collect();
        let splines = CubicSpline::fit_columns(&coarse.points(), &[ne_coarse, dsm_coarse])?;

        let s_fine = fine.points();
        let small = self.model.small_scale_components_many(&line.positions(&fine))?;
        let (ne, dsm): (Vec<f64>, Vec<f64>) = s_fine
            .iter()
            .zip(&small)
            .map(|(&s, small)| {
                let smooth = PathSample {
                    ne: splines[0].eval(s).max(0.0),
                    dsm: splines[1].eval(s).max(0.0),
                };
                let combined = small.apply(smooth, weights);
                (combined.ne, combined.dsm)
            })
            .unzip();

        PathProfile::new(s_fine, ne, dsm)
    }

    pub fn integrate(&self, direction: GalacticDirection, target: f64, mode: Direction) -> IntegrateResult<LosResult> {
        for (name, value) in [
            ("longitude", direction.longitude),
            ("latitude", direction.latitude),
            ("target", target),
        ] {
            if !value.is_finite() {
                return Err(LosError::NonFinite { name, value });
            }
        }
        if target < 0.0 {
            return Err(LosError::NegativeTarget(target));
        }
        if target == 0.0 {
            return Ok(LosResult::default());
        }

        match mode {
            Direction::DistanceToDm => self.forward(direction, target),
            Direction::DmToDistance => self.inverse(direction, target),
        }
    }

    pub fn distance_to_dm(&self, direction: GalacticDirection, distance: f64) -> IntegrateResult<LosResult> {
        self.integrate(direction, distance, Direction::DistanceToDm)
    }

    pub fn dm_to_distance(&self, direction: GalacticDirection, dm: f64) -> IntegrateResult<LosResult> {
        self.integrate(direction, dm, Direction::DmToDistance)
    }

    /// Independent sightlines integrated in parallel, in input order
    pub fn integrate_many(
        &self,
        requests: &[(GalacticDirection, f64)],
        mode: Direction,
    ) -> IntegrateResult<Vec<LosResult>> {
        tracing::debug!("Integrating {} sightlines", requests.len());
        requests
            .par_iter()
            .map(|&(direction, target)| self.integrate(direction, target, mode))
            .collect()
    }

    fn forward(&self, direction: GalacticDirection, distance: f64) -> IntegrateResult<LosResult> {
        let (end, limit) = if distance > self.config.max_distance {
            tracing::warn!(
                "Requested distance {} kpc beyond ceiling {} kpc",
                distance,
                self.config.max_distance
            );
            (self.config.max_distance, PathLimit::DistanceLimited)
        } else {
            (distance, PathLimit::Unconstrained)
        };

        let profile = self.profile(direction, end)?;
        let total = profile.total();

        if let Some(max_dm) = self.config.max_dm {
            if total.dm > max_dm {
                if let Some(d) = profile.distance_at_dm(max_dm) {
                    tracing::warn!("DM ceiling {} reached at {:.4} kpc", max_dm, d);
                    let moments = profile.moments_at(d);
                    return Ok(LosResult::from_moments(PathLimit::DmLimited, d, max_dm, &moments));
                }
            }
        }

        Ok(LosResult::from_moments(limit, end, total.dm, &total))
    }

    fn inverse(&self, direction: GalacticDirection, dm: f64) -> IntegrateResult<LosResult> {
        let (goal, goal_limit) = match self.config.max_dm {
            Some(max_dm) if dm > max_dm => (max_dm, PathLimit::DmLimited),
            _ => (dm, PathLimit::Unconstrained),
        };

        let profile = self.profile(direction, self.config.max_distance)?;
        match profile.distance_at_dm(goal) {
            Some(d) => {
                if goal_limit == PathLimit::DmLimited {
                    tracing::warn!("Target DM {} above ceiling {}", dm, goal);
                }
                Ok(LosResult::from_moments(goal_limit, d, goal, &profile.moments_at(d)))
            }
            None => {
                let total = profile.total();
                tracing::warn!(
                    "DM {} not reached within {} kpc (total {:.3})",
                    goal,
                    self.config.max_distance,
                    total.dm
                );
                Ok(LosResult::from_moments(
                    PathLimit::DistanceLimited,
                    profile.end(),
                    total.dm,
                    &total,
                ))
            }
        }
    }
}

/// DM/distance integration with explicit steps
///
/// `direction` is +1 when `target` is a distance (kpc) and -1 when it is a
/// DM (pc cm^-3). Angles are radians.
#[allow(clippy::too_many_arguments)]
pub fn dm_distance(
    model: &GalaxyModel,
    longitude: f64,
    latitude: f64,
    target: f64,
    direction: i32,
    step_coarse: f64,
    step_fine: f64,
    min_samples: usize,
) -> IntegrateResult<LosResult> {
    let mode = Direction::try_from(direction)?;
    let config = IntegrationConfig {
        step_coarse,
        step_fine,
        min_samples,
        ..IntegrationConfig::default()
    };
    LineOfSightIntegrator::new(model, config)?.integrate(GalacticDirection::new(longitude, latitude), target, mode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nemod_model::ModelPreset;

    fn ne2001() -> GalaxyModel {
        GalaxyModel::from_preset(ModelPreset::Ne2001).unwrap()
    }

    fn anticentre() -> GalacticDirection {
        GalacticDirection::from_degrees(200.0, -6.5)
    }

    #[test]
    fn test_direction_from_sign() {
        assert_eq!(Direction::try_from(1).unwrap(), Direction::DistanceToDm);
        assert_eq!(Direction::try_from(-1).unwrap(), Direction::DmToDistance);
        assert!(matches!(Direction::try_from(0), Err(LosError::InvalidDirection(0))));
        assert!(matches!(Direction::try_from(2), Err(LosError::InvalidDirection(2))));
    }

    #[test]
    fn test_limit_codes() {
        assert_eq!(PathLimit::Unconstrained.code(), ' ');
        assert_eq!(PathLimit::DistanceLimited.code(), '>');
        assert_eq!(PathLimit::DmLimited.to_string(), "<");
    }

    #[test]
    fn test_config_validation() {
        assert!(IntegrationConfig::default().validate().is_ok());
        let bad = IntegrationConfig {
            step_fine: 0.0,
            ..IntegrationConfig::default()
        };
        assert!(matches!(bad.validate(), Err(LosError::InvalidConfig(_))));
        let bad = IntegrationConfig {
            min_samples: 1,
            ..IntegrationConfig::default()
        };
        assert!(bad.validate().is_err());
        let bad = IntegrationConfig {
            max_dm: Some(-5.0),
            ..IntegrationConfig::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_round_trip_dm() {
        let model = ne2001();
        let los = LineOfSightIntegrator::with_defaults(&model);
        let inv = los.dm_to_distance(anticentre(), 100.0).unwrap();
        assert_eq!(inv.limit, PathLimit::Unconstrained);
        assert_eq!(inv.dm, 100.0);
        assert!(inv.distance > 0.0 && inv.distance < 50.0);

        let fwd = los.distance_to_dm(anticentre(), inv.distance).unwrap();
        assert_eq!(fwd.limit, PathLimit::Unconstrained);
        assert_eq!(fwd.distance, inv.distance);
        assert_relative_eq!(fwd.dm, 100.0, max_relative = 2e-4);
        assert!(fwd.sm > 0.0);
    }

    #[test]
    fn test_forward_samples_prefix_inverse_samples() {
        let model = ne2001();
        let los = LineOfSightIntegrator::with_defaults(&model);
        let d = los.dm_to_distance(anticentre(), 100.0).unwrap().distance;
        let short = los.profile(anticentre(), d).unwrap();
        let long = los.profile(anticentre(), 50.0).unwrap();

        let shared = short.len() - 1;
        assert_eq!(short.distances()[..shared], long.distances()[..shared]);
        assert_eq!(short.end(), d);
        assert!(short.end() - short.distances()[shared - 1] <= 0.01);
    }

    #[test]
    fn test_dm_grows_with_distance() {
        let model = ne2001();
        let los = LineOfSightIntegrator::with_defaults(&model);
        let mut last = 0.0;
        for d in [0.25, 0.5, 1.0, 2.0, 4.0] {
            let r = los.distance_to_dm(GalacticDirection::from_degrees(30.0, 0.0), d).unwrap();
            assert!(r.dm > last, "DM {} at {} kpc not above {}", r.dm, d, last);
            assert!(r.sm >= 0.0 && r.sm_tau >= -1e-12 && r.sm_theta >= -1e-12 && r.sm_iso >= 0.0);
            last = r.dm;
        }
    }

    #[test]
    fn test_distance_ceiling() {
        let model = ne2001();
        let config = IntegrationConfig {
            max_distance: 5.0,
            ..IntegrationConfig::default()
        };
        let los = LineOfSightIntegrator::new(&model, config).unwrap();

        let fwd = los.distance_to_dm(anticentre(), 20.0).unwrap();
        assert_eq!(fwd.limit, PathLimit::DistanceLimited);
        assert_eq!(fwd.distance, 5.0);

        let inv = los.dm_to_distance(anticentre(), 1.0e6).unwrap();
        assert_eq!(inv.limit, PathLimit::DistanceLimited);
        assert_eq!(inv.distance, 5.0);
        assert_relative_eq!(inv.dm, fwd.dm, max_relative = 1e-9);
        assert_eq!(inv.sm, fwd.sm);
    }

    #[test]
    fn test_dm_ceiling() {
        let model = ne2001();
        let config = IntegrationConfig {
            max_dm: Some(10.0),
            ..IntegrationConfig::default()
        };
        let los = LineOfSightIntegrator::new(&model, config).unwrap();

        let fwd = los.distance_to_dm(GalacticDirection::from_degrees(30.0, 0.0), 10.0).unwrap();
        assert_eq!(fwd.limit, PathLimit::DmLimited);
        assert_eq!(fwd.dm, 10.0);
        assert!(fwd.distance < 10.0);

        let inv = los.dm_to_distance(GalacticDirection::from_degrees(30.0, 0.0), 50.0).unwrap();
        assert_eq!(inv.limit, PathLimit::DmLimited);
        assert_eq!(inv.dm, 10.0);
        assert!((inv.distance - fwd.distance).abs() < 1e-3);
    }

    #[test]
    fn test_zero_and_bad_targets() {
        let model = ne2001();
        let los = LineOfSightIntegrator::with_defaults(&model);
        assert_eq!(los.distance_to_dm(anticentre(), 0.0).unwrap(), LosResult::default());
        assert_eq!(los.dm_to_distance(anticentre(), 0.0).unwrap(), LosResult::default());
        assert!(matches!(
            los.distance_to_dm(anticentre(), -1.0),
            Err(LosError::NegativeTarget(_))
        ));
        assert!(matches!(
            los.distance_to_dm(GalacticDirection::new(f64::NAN, 0.0), 1.0),
            Err(LosError::NonFinite { name: "longitude", .. })
        ));
        assert!(matches!(
            los.dm_to_distance(anticentre(), f64::INFINITY),
            Err(LosError::NonFinite { name: "target", .. })
        ));
    }

    #[test]
    fn test_dm_distance_entry_point() {
        let model = ne2001();
        let l = 200.0f64.to_radians();
        let b = (-6.5f64).to_radians();
        let r = dm_distance(&model, l, b, 100.0, -1, 0.1, 0.01, 20).unwrap();
        let los = LineOfSightIntegrator::with_defaults(&model);
        let expected = los.dm_to_distance(anticentre(), 100.0).unwrap();
        assert!((r.distance - expected.distance).abs() < 1e-12);
        assert!(matches!(
            dm_distance(&model, l, b, 100.0, 0, 0.1, 0.01, 20),
            Err(LosError::InvalidDirection(0))
        ));
        assert!(matches!(
            dm_distance(&model, l, b, 100.0, 1, -0.1, 0.01, 20),
            Err(LosError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let model = ne2001();
        let los = LineOfSightIntegrator::with_defaults(&model);
        let requests: Vec<(GalacticDirection, f64)> = [(10.0, 0.5), (120.0, -3.0), (250.0, 15.0)]
            .iter()
            .map(|&(l, b)| (GalacticDirection::from_degrees(l, b), 2.0))
            .collect();
        let batch = los.integrate_many(&requests, Direction::DistanceToDm).unwrap();
        for (&(dir, d), got) in requests.iter().zip(&batch) {
            assert_eq!(*got, los.distance_to_dm(dir, d).unwrap());
        }
    }
}
