//! Small-scale spherical clumps

use crate::params::{ClumpEdge, ClumpRecord};
use nalgebra::Vector3;
use nemod_core::GalactocentricPosition;

/// Exponential clumps are truncated at this many squared radii
const EXPONENTIAL_CLUMP_CUTOFF: f64 = 5.0;

/// Clump contribution at a point; densities of overlapping clumps add
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ClumpHit {
    pub ne: f64,
    /// Fluctuation parameter of the last clump hit
    pub f: f64,
    /// 1-based index of the last clump hit, 0 when none
    pub index: usize,
}

struct Clump {
    center: Vector3<f64>,
    radius_sq: f64,
    density: f64,
    fluctuation: f64,
    edge: ClumpEdge,
}

impl Clump {
    fn hit(&self, pos: &Vector3<f64>) -> Option<f64> {
        let arg = (pos - self.center).norm_squared() / self.radius_sq;
        match self.edge {
            ClumpEdge::Exponential if arg < EXPONENTIAL_CLUMP_CUTOFF => Some(self.density * (-arg).exp()),
            ClumpEdge::Hard if arg <= 1.0 => Some(self.density),
            _ => None,
        }
    }
}

pub struct ClumpSet {
    clumps: Vec<Clump>,
}

impl ClumpSet {
    pub fn new(records: &[ClumpRecord], rsun: f64) -> Self {
        let clumps = records
            .iter()
            .map(|r| Clump {
                center: GalactocentricPosition::from_galactic_degrees(
                    r.longitude_deg,
                    r.latitude_deg,
                    r.distance,
                    rsun,
                )
                .to_vector(),
                radius_sq: r.radius * r.radius,
                density: r.density,
                fluctuation: r.fluctuation,
                edge: r.edge,
            })
            .collect();
        Self { clumps }
    }

    pub fn len(&self) -> usize {
        self.clumps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clumps.is_empty()
    }

    pub fn evaluate(&self, pos: &GalactocentricPosition) -> ClumpHit {
        let p = pos.to_vector();
        let mut result = ClumpHit::default();
        for (j, clump) in self.clumps.iter().enumerate() {
            if let Some(ne) = clump.hit(&p) {
                result.ne += ne;
                result.f = clump.fluctuation;
                result.index = j + 1;
            }
        }
        result
    }

    /// Clump-major sweep over many points
    pub fn evaluate_many(&self, positions: &[GalactocentricPosition]) -> Vec<ClumpHit> {
        let mut results = vec![ClumpHit::default(); positions.len()];
        let points: Vec<Vector3<f64>> = positions.iter().map(|p| p.to_vector()).collect();
        for (j, clump) in self.clumps.iter().enumerate() {
            for (p, result) in points.iter().zip(results.iter_mut()) {
                if let Some(ne) = clump.hit(p) {
                    result.ne += ne;
                    result.f = clump.fluctuation;
                    result.index = j + 1;
                }
            }
        }
        results
    }
}
