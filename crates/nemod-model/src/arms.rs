//! Spiral-arm locator and arm density
//!
//! Each arm is a curve r(theta) given by coarse samples. The closest
//! approach of a point to an arm is found in two stages: the nearest coarse
//! sample, then a local spline of squared distance against angle resampled
//! on a fine angular grid. Angles are Galactocentric, counter-clockwise from
//! +y, so a sample (theta, r) sits at (-r sin theta, r cos theta).

use crate::components::sech2;
use crate::error::{ModelError, ModelResult};
use crate::params::SpiralArms;
use nemod_core::{CubicSpline, GalactocentricPosition};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::ops::Range;

/// Arms further than this many global widths do not contribute
const ARM_REACH: f64 = 3.0;

/// Fine-search configuration
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArmSearch {
    /// Angular step of the fine resampling (rad)
    pub fine_step: f64,
    /// Odd number of coarse samples around the coarse minimum fed to the local spline
    pub spline_window: usize,
}

impl Default for ArmSearch {
    fn default() -> Self {
        Self {
            fine_step: 0.01,
            spline_window: 5,
        }
    }
}

/// Which fluctuation parameter the arm component reports
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArmFluctuation {
    /// Global Fa whenever any arm is in range (NE2001 behaviour)
    #[default]
    Legacy,
    /// Fa scaled by the nearest arm's farm multiplier
    PerArm,
}

/// Closest approach of a point to one arm
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ArmApproach {
    pub theta: f64,
    pub radius: f64,
    /// In-plane distance from the point to the arm
    pub distance: f64,
    /// Index of the nearest coarse sample
    pub coarse_index: usize,
}

/// Arm contribution at a point
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ArmDensity {
    pub ne: f64,
    pub f: f64,
    /// Legacy number of the nearest in-range arm, 0 when none
    pub which_arm: usize,
}

struct Arm {
    legacy: usize,
    theta: Vec<f64>,
    x: Vec<f64>,
    y: Vec<f64>,
    radius: CubicSpline,
    width: f64,
    height: f64,
    amplitude: f64,
    fluctuation: f64,
}

/// Per-arm geometry and scale factors, built once per model
pub struct SpiralArmModel {
    arms: Vec<Arm>,
    na: f64,
    wa: f64,
    aa: f64,
    fa: f64,
    search: ArmSearch,
    fluctuation: ArmFluctuation,
}

impl SpiralArmModel {
    /// Expects parameters that already passed validation
    pub fn new(params: &SpiralArms, search: ArmSearch, fluctuation: ArmFluctuation) -> ModelResult<Self> {
        if !search.fine_step.is_finite() || search.fine_step <= 0.0 {
            return Err(ModelError::invalid("arm_search.fine_step", search.fine_step));
        }
        if search.spline_window < 3 || search.spline_window % 2 == 0 {
            return Err(ModelError::invalid(
                "arm_search.spline_window",
                search.spline_window as f64,
            ));
        }

        let mut arms = Vec::with_capacity(params.count());
        for (samples, &legacy) in params.samples.iter().zip(&params.arm_map) {
            let k = legacy - 1;
            let (x, y): (Vec<f64>, Vec<f64>) = samples
                .theta
                .iter()
                .zip(&samples.radius)
                .map(|(&th, &r)| (-r * th.sin(), r * th.cos()))
                .unzip();
            arms.push(Arm {
                legacy,
                theta: samples.theta.clone(),
                x,
                y,
                radius: CubicSpline::new(&samples.theta, &samples.radius)?,
                width: params.wa * params.warm[k],
                height: params.ha * params.harm[k],
                amplitude: params.narm[k],
                fluctuation: params.farm[k],
            });
        }

        Ok(Self {
            arms,
            na: params.na,
            wa: params.wa,
            aa: params.aa,
            fa: params.fa,
            search,
            fluctuation,
        })
    }

    pub fn count(&self) -> usize {
        self.arms.len()
    }

    fn arm(&self, arm: usize) -> ModelResult<&Arm> {
        self.arms
            .get(arm)
            .ok_or_else(|| ModelError::invalid("arm index", arm as f64))
    }

    pub fn legacy_number(&self, arm: usize) -> ModelResult<usize> {
        Ok(self.arm(arm)?.legacy)
    }

    pub fn search(&self) -> ArmSearch {
        self.search
    }

    /// Interpolated arm radius at `theta`
    pub fn radius_at(&self, arm: usize, theta: f64) -> ModelResult<f64> {
        Ok(self.arm(arm)?.radius.eval(theta))
    }

    fn coarse_dsq(arm: &Arm, x: f64, y: f64) -> Vec<f64> {
        arm.x
            .iter()
            .zip(&arm.y)
            .map(|(&ax, &ay)| (ax - x).powi(2) + (ay - y).powi(2))
            .collect()
    }

    /// Coarse indices feeding the local spline; clipped, never wrapped
    fn window(&self, k: usize, n: usize) -> Range<usize> {
        let half = (self.search.spline_window - 1) / 2;
        k.saturating_sub(half + 1)..(k + half + 1).min(n)
    }

    /// First angle of the fine grid over [lo, hi) minimising the spline
    fn fine_minimum(&self, spline: &CubicSpline, lo: f64, hi: f64) -> f64 {
        let step = self.search.fine_step;
        let count = ((hi - lo) / step).ceil().max(1.0) as usize;
        let mut best_theta = lo;
        let mut best = spline.eval(lo);
        for i in 1..count {
            let theta = lo + i as f64 * step;
            let value = spline.eval(theta);
            if value < best {
                best = value;
                best_theta = theta;
            }
        }
        best_theta
    }

    fn approach(&self, arm: &Arm, theta: f64, coarse_index: usize, x: f64, y: f64) -> ArmApproach {
        let radius = arm.radius.eval(theta);
        let (ax, ay) = (-radius * theta.sin(), radius * theta.cos());
        ArmApproach {
            theta,
            radius,
            distance: ((x - ax).powi(2) + (y - ay).powi(2)).sqrt(),
            coarse_index,
        }
    }

    /// Closest approach of the in-plane point (x, y) to arm `arm`
    pub fn nearest_point(&self, arm: usize, x: f64, y: f64) -> ModelResult<ArmApproach> {
        let a = self.arm(arm)?;
        let dsq = Self::coarse_dsq(a, x, y);
        let k = first_argmin(&dsq);
        let window = self.window(k, dsq.len());
        let spline = CubicSpline::new(&a.theta[window.clone()], &dsq[window.clone()])?;
        let theta = self.fine_minimum(&spline, a.theta[window.start], a.theta[window.end - 1]);
        Ok(self.approach(a, theta, k, x, y))
    }

    /// Batched [`nearest_point`](Self::nearest_point)
    ///
    /// Points sharing a coarse minimum share the spline knots, so each group
    /// is fitted as one multi-column spline.
    pub fn nearest_points(&self, arm: usize, positions: &[GalactocentricPosition]) -> ModelResult<Vec<ArmApproach>> {
        let a = self.arm(arm)?;
        let n = a.theta.len();
        let dsq: Vec<Vec<f64>> = positions.iter().map(|p| Self::coarse_dsq(a, p.x, p.y)).collect();

        let mut groups: Vec<Vec<usize>> = vec![Vec::new(); n];
        for (i, d) in dsq.iter().enumerate() {
            groups[first_argmin(d)].push(i);
        }

        let mut theta = vec![0.0; positions.len()];
        for (k, members) in groups.iter().enumerate().filter(|(_, m)| !m.is_empty()) {
            let window = self.window(k, n);
            let knots = &a.theta[window.clone()];
            let columns: Vec<&[f64]> = members.iter().map(|&i| &dsq[i][window.clone()]).collect();
            let splines = CubicSpline::fit_columns(knots, &columns)?;
            for (&i, spline) in members.iter().zip(&splines) {
                theta[i] = self.fine_minimum(spline, knots[0], knots[knots.len() - 1]);
            }
        }

        Ok(positions
            .iter()
            .zip(&dsq)
            .zip(theta)
            .map(|((p, d), th)| self.approach(a, th, first_argmin(d), p.x, p.y))
            .collect())
    }

    /// Arm density with every arm's approach already located
    fn combine(&self, pos: &GalactocentricPosition, approaches: impl Iterator<Item = ArmApproach>) -> ArmDensity {
        let rr = pos.cylindrical_radius();
        let azimuth = pos.azimuth_deg();

        let mut ne = 0.0;
        let mut nearest = None;
        let mut dmin_min = f64::INFINITY;
        for (j, approach) in approaches.enumerate() {
            let arm = &self.arms[j];
            let dmin = approach.distance;
            if j == 0 {
                dmin_min = dmin;
            }
            if dmin >= ARM_REACH * self.wa {
                continue;
            }
            if dmin <= dmin_min {
                dmin_min = dmin;
                nearest = Some(j);
            }

            let mut ga = (-(dmin / arm.width).powi(2)).exp();
            if rr > self.aa {
                ga *= sech2((rr - self.aa) / 2.0);
            }
            ga *= sech2(pos.z / arm.height);
            ga *= angular_taper(arm.legacy, azimuth);
            ne += ga * arm.amplitude * self.na;
        }

        match nearest {
            None => ArmDensity::default(),
            Some(j) => ArmDensity {
                ne,
                f: match self.fluctuation {
                    ArmFluctuation::Legacy => self.fa,
                    ArmFluctuation::PerArm => self.fa * self.arms[j].fluctuation,
                },
                which_arm: self.arms[j].legacy,
            },
        }
    }

    pub fn density(&self, pos: &GalactocentricPosition) -> ModelResult<ArmDensity> {
        let approaches = (0..self.count())
            .map(|j| self.nearest_point(j, pos.x, pos.y))
            .collect::<ModelResult<Vec<_>>>()?;
        Ok(self.combine(pos, approaches.into_iter()))
    }

    pub fn density_many(&self, positions: &[GalactocentricPosition]) -> ModelResult<Vec<ArmDensity>> {
        let per_arm = (0..self.count())
            .map(|j| self.nearest_points(j, positions))
            .collect::<ModelResult<Vec<_>>>()?;
        Ok(positions
            .iter()
            .enumerate()
            .map(|(i, pos)| self.combine(pos, per_arm.iter().map(|a| a[i])))
            .collect())
    }
}

fn first_argmin(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate().skip(1) {
        if v < values[best] {
            best = i;
        }
    }
    best
}

/// Angle past `start` (wrapped into [0, 360)) when inside [start, end)
fn past_start(azimuth: f64, start: f64, end: f64) -> Option<f64> {
    let mut t = azimuth - start;
    if t < 0.0 {
        t += 360.0;
    }
    (t >= 0.0 && t < end - start).then_some(t)
}

/// Amplitude corrections of legacy arms 2 and 3
fn angular_taper(legacy: usize, azimuth: f64) -> f64 {
    match legacy {
        3 => past_start(azimuth, 290.0, 363.0)
            .map(|t| ((1.0 + (2.0 * PI * t / 73.0).cos()) / 2.0).powi(4))
            .unwrap_or(1.0),
        2 => {
            let floor = 0.1;
            past_start(azimuth, 340.0, 370.0)
                .map(|t| ((1.0 + floor + (1.0 - floor) * (2.0 * PI * t / 30.0).cos()) / 2.0).powf(3.5))
                .unwrap_or(1.0)
        }
        _ => 1.0,
    }
}
