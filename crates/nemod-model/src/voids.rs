//! Discrete voids: rotated ellipsoids of depleted density

use crate::params::{VoidEdge, VoidRecord};
use nalgebra::{Matrix3, Vector3};
use nemod_core::GalactocentricPosition;

/// Gaussian voids are truncated where the quadratic form reaches this value
const GAUSSIAN_VOID_CUTOFF: f64 = 3.0;

/// Void contribution at a point
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct VoidHit {
    pub ne: f64,
    pub f: f64,
    /// 1-based catalog index of the void that set the density, 0 when none
    pub index: usize,
}

impl VoidHit {
    /// 1 inside a void, 0 elsewhere
    pub fn weight(&self) -> f64 {
        if self.index > 0 { 1.0 } else { 0.0 }
    }
}

struct Void {
    center: Vector3<f64>,
    /// Rows project an offset onto the a, b and c axes
    rotation: Matrix3<f64>,
    axes: [f64; 3],
    density: f64,
    fluctuation: f64,
    edge: VoidEdge,
}

impl Void {
    fn from_record(record: &VoidRecord, rsun: f64) -> Self {
        let center = GalactocentricPosition::from_galactic_degrees(
            record.longitude_deg,
            record.latitude_deg,
            record.distance,
            rsun,
        )
        .to_vector();
        let (s1, c1) = record.rotation_y_deg.to_radians().sin_cos();
        let (s2, c2) = record.rotation_z_deg.to_radians().sin_cos();
        let rotation = Matrix3::new(
            c1 * c2, s2, c2 * s1,
            -c1 * s2, c2, -s1 * s2,
            -s1, 0.0, c1,
        );
        Self {
            center,
            rotation,
            axes: record.axes,
            density: record.density,
            fluctuation: record.fluctuation,
            edge: record.edge,
        }
    }

    fn quadratic_form(&self, pos: &Vector3<f64>) -> f64 {
        let r = self.rotation * (pos - self.center);
        let [a, b, c] = self.axes;
        r.x * r.x / (a * a) + r.y * r.y / (b * b) + r.z * r.z / (c * c)
    }

    /// Density if the point is inside this void
    fn hit(&self, pos: &Vector3<f64>) -> Option<f64> {
        let q = self.quadratic_form(pos);
        match self.edge {
            VoidEdge::Gaussian if q < GAUSSIAN_VOID_CUTOFF => Some(self.density * (-q).exp()),
            VoidEdge::Hard if q <= 1.0 => Some(self.density),
            _ => None,
        }
    }
}

/// Void catalog in Galactocentric form
///
/// Overlapping voids resolve to the last match in catalog order.
pub struct VoidSet {
    voids: Vec<Void>,
}

impl VoidSet {
    pub fn new(records: &[VoidRecord], rsun: f64) -> Self {
        Self {
            voids: records.iter().map(|r| Void::from_record(r, rsun)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.voids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voids.is_empty()
    }

    pub fn evaluate(&self, pos: &GalactocentricPosition) -> VoidHit {
        let mut result = VoidHit::default();
        if self.voids.is_empty() {
            return result;
        }
        let p = pos.to_vector();
        for (j, void) in self.voids.iter().enumerate() {
            if let Some(ne) = void.hit(&p) {
                result = VoidHit { ne, f: void.fluctuation, index: j + 1 };
            }
        }
        result
    }

    /// Void-major sweep over many points
    pub fn evaluate_many(&self, positions: &[GalactocentricPosition]) -> Vec<VoidHit> {
        let mut results = vec![VoidHit::default(); positions.len()];
        if self.voids.is_empty() {
            return results;
        }
        let points: Vec<Vector3<f64>> = positions.iter().map(|p| p.to_vector()).collect();
        for (j, void) in self.voids.iter().enumerate() {
            for (p, result) in points.iter().zip(results.iter_mut()) {
                if let Some(ne) = void.hit(p) {
                    *result = VoidHit { ne, f: void.fluctuation, index: j + 1 };
                }
            }
        }
        results
    }
}
