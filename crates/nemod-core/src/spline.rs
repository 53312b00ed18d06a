//! Piecewise-cubic interpolation with not-a-knot end conditions
//!
//! Knot slopes come from a tridiagonal system that depends only on the knot
//! vector, so it is factorised once and reused for every value column. A
//! column fitted alone and the same column fitted as part of a batch go
//! through identical arithmetic and give bit-identical splines.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SplineError {
    #[error("need at least 2 knots, got {0}")]
    TooFewKnots(usize),

    #[error("knot and value lengths differ ({knots} vs {values})")]
    LengthMismatch { knots: usize, values: usize },

    #[error("knots must be strictly increasing (violated at index {0})")]
    NotIncreasing(usize),

    #[error("non-finite knot or value at index {0}")]
    NonFinite(usize),
}

/// Factorised slope system for one knot vector (Thomas algorithm)
struct KnotSystem {
    x: Vec<f64>,
    dx: Vec<f64>,
    lower: Vec<f64>,
    denom: Vec<f64>,
    upper_prime: Vec<f64>,
}

impl KnotSystem {
    fn new(x: &[f64]) -> Result<Self, SplineError> {
        let n = x.len();
        if n < 2 {
            return Err(SplineError::TooFewKnots(n));
        }
        if let Some(i) = x.iter().position(|v| !v.is_finite()) {
            return Err(SplineError::NonFinite(i));
        }
        let dx: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();
        if let Some(i) = dx.iter().position(|&d| d <= 0.0) {
            return Err(SplineError::NotIncreasing(i + 1));
        }

        // Banded rows: lower[i] couples s[i-1], upper[i] couples s[i+1]
        let mut lower = vec![0.0; n];
        let mut diag = vec![0.0; n];
        let mut upper = vec![0.0; n];
        match n {
            2 => {
                diag[0] = 1.0;
                diag[1] = 1.0;
            }
            3 => {
                diag[0] = 1.0;
                upper[0] = 1.0;
                lower[1] = dx[1];
                diag[1] = 2.0 * (dx[0] + dx[1]);
                upper[1] = dx[0];
                lower[2] = 1.0;
                diag[2] = 1.0;
            }
            _ => {
                diag[0] = dx[1];
                upper[0] = x[2] - x[0];
                for i in 1..n - 1 {
                    lower[i] = dx[i];
                    diag[i] = 2.0 * (dx[i - 1] + dx[i]);
                    upper[i] = dx[i - 1];
                }
                lower[n - 1] = x[n - 1] - x[n - 3];
                diag[n - 1] = dx[n - 2];
            }
        }

        let mut denom = vec![0.0; n];
        let mut upper_prime = vec![0.0; n];
        denom[0] = diag[0];
        upper_prime[0] = upper[0] / denom[0];
        for i in 1..n {
            denom[i] = diag[i] - lower[i] * upper_prime[i - 1];
            upper_prime[i] = upper[i] / denom[i];
        }

        Ok(Self { x: x.to_vec(), dx, lower, denom, upper_prime })
    }

    fn rhs(&self, slope: &[f64]) -> Vec<f64> {
        let n = self.x.len();
        let dx = &self.dx;
        let mut b = vec![0.0; n];
        match n {
            2 => {
                b[0] = slope[0];
                b[1] = slope[0];
            }
            3 => {
                b[0] = 2.0 * slope[0];
                b[1] = 3.0 * (dx[0] * slope[1] + dx[1] * slope[0]);
                b[2] = 2.0 * slope[1];
            }
            _ => {
                let d = self.x[2] - self.x[0];
                b[0] = ((dx[0] + 2.0 * d) * dx[1] * slope[0] + dx[0] * dx[0] * slope[1]) / d;
                for i in 1..n - 1 {
                    b[i] = 3.0 * (dx[i] * slope[i - 1] + dx[i - 1] * slope[i]);
                }
                let d = self.x[n - 1] - self.x[n - 3];
                b[n - 1] = (dx[n - 2] * dx[n - 2] * slope[n - 3]
                    + (2.0 * d + dx[n - 2]) * dx[n - 3] * slope[n - 2])
                    / d;
            }
        }
        b
    }

    fn fit(&self, y: &[f64]) -> Result<CubicSpline, SplineError> {
        let n = self.x.len();
        if y.len() != n {
            return Err(SplineError::LengthMismatch { knots: n, values: y.len() });
        }
        if let Some(i) = y.iter().position(|v| !v.is_finite()) {
            return Err(SplineError::NonFinite(i));
        }

        let slope: Vec<f64> = (0..n - 1).map(|i| (y[i + 1] - y[i]) / self.dx[i]).collect();

        let mut s = self.rhs(&slope);
        s[0] /= self.denom[0];
        for i in 1..n {
            s[i] = (s[i] - self.lower[i] * s[i - 1]) / self.denom[i];
        }
        for i in (0..n - 1).rev() {
            s[i] -= self.upper_prime[i] * s[i + 1];
        }

        let coeffs = (0..n - 1)
            .map(|i| {
                let h = self.dx[i];
                let t = (s[i] + s[i + 1] - 2.0 * slope[i]) / h;
                [t / h, (slope[i] - s[i]) / h - t, s[i], y[i]]
            })
            .collect();

        Ok(CubicSpline { knots: self.x.clone(), coeffs })
    }
}

/// Not-a-knot cubic spline; extrapolates with the end polynomials
#[derive(Clone, Debug)]
pub struct CubicSpline {
    knots: Vec<f64>,
    /// Per interval: [c3, c2, c1, c0] in powers of (x - knot)
    coeffs: Vec<[f64; 4]>,
}

impl CubicSpline {
    pub fn new(x: &[f64], y: &[f64]) -> Result<Self, SplineError> {
        KnotSystem::new(x)?.fit(y)
    }

    /// Fits several value columns over the same knots with one factorisation
    pub fn fit_columns<C: AsRef<[f64]>>(x: &[f64], columns: &[C]) -> Result<Vec<Self>, SplineError> {
        let system = KnotSystem::new(x)?;
        columns.iter().map(|c| system.fit(c.as_ref())).collect()
    }

    pub fn knots(&self) -> &[f64] {
        &self.knots
    }

    /// Domain covered by the knots
    pub fn domain(&self) -> (f64, f64) {
        (self.knots[0], self.knots[self.knots.len() - 1])
    }

    fn interval(&self, x: f64) -> usize {
        let last = self.coeffs.len() - 1;
        self.knots.partition_point(|&k| k <= x).saturating_sub(1).min(last)
    }

    pub fn eval(&self, x: f64) -> f64 {
        let i = self.interval(x);
        let h = x - self.knots[i];
        let [c3, c2, c1, c0] = self.coeffs[i];
        ((c3 * h + c2) * h + c1) * h + c0
    }

    pub fn eval_many(&self, xs: &[f64]) -> Vec<f64> {
        xs.iter().map(|&x| self.eval(x)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reproduces_cubic_exactly() {
        let f = |x: f64| 0.5 * x * x * x - 2.0 * x * x + x - 3.0;
        let x = [0.0, 0.7, 1.1, 2.0, 2.4, 3.5];
        let y: Vec<f64> = x.iter().map(|&v| f(v)).collect();
        let spline = CubicSpline::new(&x, &y).unwrap();
        for at in [0.0, 0.3, 1.05, 1.9, 2.2, 3.5, 4.0, -0.5] {
            assert!((spline.eval(at) - f(at)).abs() < 1e-9, "x = {}", at);
        }
    }

    #[test]
    fn test_three_knots_give_parabola() {
        let f = |x: f64| 2.0 * x * x - x + 1.0;
        let x = [0.0, 0.4, 1.0];
        let y: Vec<f64> = x.iter().map(|&v| f(v)).collect();
        let spline = CubicSpline::new(&x, &y).unwrap();
        for at in [0.1, 0.5, 0.9] {
            assert!((spline.eval(at) - f(at)).abs() < 1e-12);
        }
    }

    #[test]
    fn test_two_knots_are_linear() {
        let spline = CubicSpline::new(&[1.0, 3.0], &[2.0, 6.0]).unwrap();
        assert!((spline.eval(2.0) - 4.0).abs() < 1e-15);
        assert!((spline.eval(4.0) - 8.0).abs() < 1e-15);
    }

    #[test]
    fn test_interpolates_knots() {
        let x = [0.0, 1.0, 2.5, 3.0, 4.2, 5.0];
        let y = [1.0, -2.0, 0.5, 0.25, 3.0, 2.0];
        let spline = CubicSpline::new(&x, &y).unwrap();
        for (xi, yi) in x.iter().zip(y.iter()) {
            assert!((spline.eval(*xi) - yi).abs() < 1e-12);
        }
    }

    #[test]
    fn test_columns_match_single_fits_bitwise() {
        let x = [0.0, 0.3, 0.6, 0.9, 1.2, 1.5];
        let a = [4.0, 2.0, 1.0, 1.5, 3.0, 6.0];
        let b = [0.0, 1.0, 0.0, -1.0, 0.0, 1.0];
        let batch = CubicSpline::fit_columns(&x, &[a.as_slice(), b.as_slice()]).unwrap();
        let single_a = CubicSpline::new(&x, &a).unwrap();
        let single_b = CubicSpline::new(&x, &b).unwrap();
        for at in [0.05, 0.44, 0.81, 1.37] {
            assert_eq!(batch[0].eval(at), single_a.eval(at));
            assert_eq!(batch[1].eval(at), single_b.eval(at));
        }
    }

    #[test]
    fn test_rejects_bad_knots() {
        assert_eq!(CubicSpline::new(&[0.0], &[1.0]).unwrap_err(), SplineError::TooFewKnots(1));
        assert_eq!(
            CubicSpline::new(&[0.0, 1.0, 1.0], &[1.0, 2.0, 3.0]).unwrap_err(),
            SplineError::NotIncreasing(2)
        );
        assert!(matches!(
            CubicSpline::new(&[0.0, 1.0], &[1.0]),
            Err(SplineError::LengthMismatch { .. })
        ));
        assert_eq!(
            CubicSpline::new(&[0.0, 1.0], &[1.0, f64::NAN]).unwrap_err(),
            SplineError::NonFinite(1)
        );
    }
}
