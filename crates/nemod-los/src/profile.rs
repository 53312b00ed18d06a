//! Sampled sightline with cumulative DM and scattering moments
//!
//! Integrals use the trapezoid rule between samples. Between two samples
//! the integrands are treated as linear, which makes partial segments and
//! the DM inversion exact with respect to the tabulated rule.

use crate::error::{IntegrateResult, LosError};
use nemod_core::constants::{sm_factor, PC_PER_KPC};
use serde::{Deserialize, Serialize};

const FIVE_THIRDS: f64 = 5.0 / 3.0;

/// Running path integrals from the observer
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Moments {
    /// Dispersion measure (pc cm^-3)
    pub dm: f64,
    /// Integral of F ne^2 ds
    pub i0: f64,
    /// Integral of F ne^2 s ds
    pub i1: f64,
    /// Integral of F ne^2 s^2 ds
    pub i2: f64,
    /// Integral of F ne^2 s^(5/3) ds
    pub i53: f64,
}

/// Scattering measures (kpc m^-20/3)
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ScatteringMeasures {
    pub sm: f64,
    /// Weighted for temporal broadening
    pub sm_tau: f64,
    /// Weighted for angular broadening
    pub sm_theta: f64,
    pub sm_iso: f64,
}

impl Moments {
    /// Scattering measures of a path of length `distance`
    pub fn scattering(&self, distance: f64) -> ScatteringMeasures {
        if distance <= 0.0 {
            return ScatteringMeasures::default();
        }
        let c = sm_factor();
        let d = distance;
        ScatteringMeasures {
            sm: c * self.i0,
            sm_tau: 6.0 * c * (self.i1 / d - self.i2 / (d * d)),
            sm_theta: 3.0 * c * (self.i0 - 2.0 * self.i1 / d + self.i2 / (d * d)),
            sm_iso: c * self.i53,
        }
    }
}

/// Integrands at one sample
#[derive(Clone, Copy, Debug)]
struct Integrands {
    ne: f64,
    g0: f64,
    g1: f64,
    g2: f64,
    g53: f64,
}

impl Integrands {
    fn at(s: f64, ne: f64, dsm: f64) -> Self {
        Self {
            ne,
            g0: dsm,
            g1: dsm * s,
            g2: dsm * s * s,
            g53: dsm * s.powf(FIVE_THIRDS),
        }
    }

    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        let mix = |x: f64, y: f64| x + (y - x) * t;
        Self {
            ne: mix(a.ne, b.ne),
            g0: mix(a.g0, b.g0),
            g1: mix(a.g1, b.g1),
            g2: mix(a.g2, b.g2),
            g53: mix(a.g53, b.g53),
        }
    }
}

fn trapezoid(ds: f64, a: f64, b: f64) -> f64 {
    ds * (a + b) / 2.0
}

impl Moments {
    fn extend(&self, ds: f64, a: &Integrands, b: &Integrands) -> Self {
        Self {
            dm: self.dm + PC_PER_KPC * trapezoid(ds, a.ne, b.ne),
            i0: self.i0 + trapezoid(ds, a.g0, b.g0),
            i1: self.i1 + trapezoid(ds, a.g1, b.g1),
            i2: self.i2 + trapezoid(ds, a.g2, b.g2),
            i53: self.i53 + trapezoid(ds, a.g53, b.g53),
        }
    }
}

/// Density samples along a path starting at the observer, with running integrals
#[derive(Clone, Debug)]
pub struct PathProfile {
    s: Vec<f64>,
    ne: Vec<f64>,
    dsm: Vec<f64>,
    integrands: Vec<Integrands>,
    cumulative: Vec<Moments>,
}

impl PathProfile {
    /// `s` must start at 0 and increase; all three columns have equal length
    pub fn new(s: Vec<f64>, ne: Vec<f64>, dsm: Vec<f64>) -> IntegrateResult<Self> {
        if s.len() != ne.len() || s.len() != dsm.len() {
            return Err(LosError::ProfileLength {
                s: s.len(),
                ne: ne.len(),
                dsm: dsm.len(),
            });
        }
        let integrands: Vec<Integrands> = s
            .iter()
            .zip(ne.iter().zip(&dsm))
            .map(|(&s, (&ne, &dsm))| Integrands::at(s, ne, dsm))
            .collect();

        let mut cumulative = Vec::with_capacity(s.len());
        let mut running = Moments::default();
        cumulative.push(running);
        for i in 1..s.len() {
            running = running.extend(s[i] - s[i - 1], &integrands[i - 1], &integrands[i]);
            cumulative.push(running);
        }

        Ok(Self {
            s,
            ne,
            dsm,
            integrands,
            cumulative,
        })
    }

    pub fn len(&self) -> usize {
        self.s.len()
    }

    pub fn is_empty(&self) -> bool {
        self.s.is_empty()
    }

    /// Path length of the last sample
    pub fn end(&self) -> f64 {
        self.s.last().copied().unwrap_or(0.0)
    }

    pub fn distances(&self) -> &[f64] {
        &self.s
    }

    pub fn densities(&self) -> &[f64] {
        &self.ne
    }

    /// F ne^2 at each sample
    pub fn scattering_weights(&self) -> &[f64] {
        &self.dsm
    }

    pub fn cumulative(&self) -> &[Moments] {
        &self.cumulative
    }

    pub fn total(&self) -> Moments {
        self.cumulative.last().copied().unwrap_or_default()
    }

    /// Integrals from the observer to `distance`, clamped to the sampled path
    pub fn moments_at(&self, distance: f64) -> Moments {
        if distance <= 0.0 || self.s.len() < 2 {
            return Moments::default();
        }
        if distance >= self.end() {
            return self.total();
        }
        let b = self.s.partition_point(|&s| s <= distance);
        let a = b - 1;
        let h = distance - self.s[a];
        if h == 0.0 {
            return self.cumulative[a];
        }
        let t = h / (self.s[b] - self.s[a]);
        let mid = Integrands::lerp(&self.integrands[a], &self.integrands[b], t);
        self.cumulative[a].extend(h, &self.integrands[a], &mid)
    }

    /// Path length where the cumulative DM first reaches `dm`
    ///
    /// Inside the bracketing segment the density is linear, so the
    /// trapezoid area is quadratic in the partial length and is solved in
    /// closed form. Returns None when the path never reaches `dm`.
    pub fn distance_at_dm(&self, dm: f64) -> Option<f64> {
        if dm <= 0.0 {
            return Some(0.0);
        }
        let b = self.cumulative.partition_point(|m| m.dm < dm);
        if b == self.cumulative.len() {
            return None;
        }
        // cumulative[0].dm == 0 < dm, so b >= 1
        let a = b - 1;
        let width = self.s[b] - self.s[a];
        let remaining = (dm - self.cumulative[a].dm) / PC_PER_KPC;
        let alpha = (self.ne[b] - self.ne[a]) / (2.0 * width);
        let beta = self.ne[a];
        let disc = (beta * beta + 4.0 * alpha * remaining).max(0.0);
        let denom = beta + disc.sqrt();
        let h = if denom > 0.0 { 2.0 * remaining / denom } else { width };
        Some(self.s[a] + h.clamp(0.0, width))
    }
}
