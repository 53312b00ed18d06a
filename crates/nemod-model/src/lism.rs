//! Local interstellar medium: Local Dense Region, Local Superbubble,
//! Local Hot Bubble and Loop I
//!
//! Regions are uniform inside and empty outside. Where they overlap the
//! hot bubble wins, then Loop I, then the superbubble, then the dense region.

use crate::params::{EllipsoidRegion, HotBubble, LocalIsm, LoopI};
use nemod_core::GalactocentricPosition;

/// Semi-axis the hot bubble narrows to at its lower tip (kpc)
const LHB_TIP_AXIS: f64 = 0.001;

/// Which regions contain a point
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LismRegions {
    pub ldr: bool,
    pub lsb: bool,
    pub lhb: bool,
    pub loop_i: bool,
}

impl LismRegions {
    pub fn any(&self) -> bool {
        self.ldr || self.lsb || self.lhb || self.loop_i
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LismHit {
    pub ne: f64,
    pub f: f64,
    /// 1 inside any region, 0 elsewhere
    pub weight: f64,
    pub regions: LismRegions,
}

/// Ellipsoid with its z rotation folded into quadratic-form coefficients
struct RotatedEllipsoid {
    center: [f64; 3],
    ap: f64,
    bp: f64,
    cp: f64,
    dp: f64,
    density: f64,
    fluctuation: f64,
}

impl RotatedEllipsoid {
    fn new(region: &EllipsoidRegion) -> Self {
        let (s, c) = region.theta_deg.to_radians().sin_cos();
        let (a, b) = (region.a, region.b);
        Self {
            center: [region.x, region.y, region.z],
            ap: (c / a).powi(2) + (s / b).powi(2),
            bp: (s / a).powi(2) + (c / b).powi(2),
            cp: 1.0 / region.c.powi(2),
            dp: 2.0 * c * s * (1.0 / a.powi(2) - 1.0 / b.powi(2)),
            density: region.density,
            fluctuation: region.fluctuation,
        }
    }

    fn contains(&self, pos: &GalactocentricPosition) -> bool {
        let dx = pos.x - self.center[0];
        let dy = pos.y - self.center[1];
        let dz = pos.z - self.center[2];
        let q = dx * dx * self.ap + dy * dy * self.bp + dz * dz * self.cp + dx * dy * self.dp;
        q <= 1.0
    }
}

impl HotBubble {
    /// Elliptic cylinder whose axis leans with z and which tapers below the plane
    fn contains(&self, pos: &GalactocentricPosition) -> bool {
        let y_axis = self.y + self.theta_deg.to_radians().tan() * pos.z;
        let bottom = self.z - self.c;
        let aa = if pos.z <= 0.0 && pos.z >= bottom {
            LHB_TIP_AXIS + (self.a - LHB_TIP_AXIS) * (1.0 - pos.z / bottom)
        } else {
            self.a
        };
        let qxy = ((pos.x - self.x) / aa).powi(2) + ((pos.y - y_axis) / self.b).powi(2);
        let qz = (pos.z - self.z).abs() / self.c;
        qxy <= 1.0 && qz <= 1.0
    }
}

impl LoopI {
    /// (ne, F) of the interior or the shell; nothing below the plane
    fn evaluate(&self, pos: &GalactocentricPosition) -> Option<(f64, f64)> {
        if pos.z < 0.0 {
            return None;
        }
        let r = ((pos.x - self.x).powi(2) + (pos.y - self.y).powi(2) + (pos.z - self.z).powi(2)).sqrt();
        if r <= self.radius {
            Some((self.density, self.fluctuation))
        } else if r <= self.radius + self.shell_width {
            Some((self.shell_density, self.shell_fluctuation))
        } else {
            None
        }
    }
}

pub struct LocalIsmModel {
    ldr: RotatedEllipsoid,
    lsb: RotatedEllipsoid,
    lhb: HotBubble,
    loop_i: LoopI,
}

impl LocalIsmModel {
    pub fn new(params: &LocalIsm) -> Self {
        Self {
            ldr: RotatedEllipsoid::new(&params.ldr),
            lsb: RotatedEllipsoid::new(&params.lsb),
            lhb: params.lhb,
            loop_i: params.loop_i,
        }
    }

    pub fn evaluate(&self, pos: &GalactocentricPosition) -> LismHit {
        let indicator = |inside: bool| if inside { 1.0 } else { 0.0 };

        let in_ldr = self.ldr.contains(pos);
        let in_lsb = self.lsb.contains(pos);
        let in_lhb = self.lhb.contains(pos);
        let loop_i = self.loop_i.evaluate(pos);

        let (w_ldr, w_lsb, w_lhb, w_loop) = (
            indicator(in_ldr),
            indicator(in_lsb),
            indicator(in_lhb),
            indicator(loop_i.is_some()),
        );
        let (ne_loop, f_loop) = loop_i.unwrap_or((0.0, 0.0));
        let (ne_ldr, f_ldr) = if in_ldr { (self.ldr.density, self.ldr.fluctuation) } else { (0.0, 0.0) };
        let (ne_lsb, f_lsb) = if in_lsb { (self.lsb.density, self.lsb.fluctuation) } else { (0.0, 0.0) };
        let (ne_lhb, f_lhb) = if in_lhb { (self.lhb.density, self.lhb.fluctuation) } else { (0.0, 0.0) };

        let blend = |ldr: f64, lsb: f64, lhb: f64, lp: f64| {
            (1.0 - w_lhb) * ((1.0 - w_loop) * (w_lsb * lsb + (1.0 - w_lsb) * ldr) + w_loop * lp) + w_lhb * lhb
        };

        LismHit {
            ne: blend(ne_ldr, ne_lsb, ne_lhb, ne_loop),
            f: blend(f_ldr, f_lsb, f_lhb, f_loop),
            weight: w_ldr.max(w_lsb).max(w_lhb).max(w_loop),
            regions: LismRegions {
                ldr: in_ldr,
                lsb: in_lsb,
                lhb: in_lhb,
                loop_i: loop_i.is_some(),
            },
        }
    }

    pub fn evaluate_many(&self, positions: &[GalactocentricPosition]) -> Vec<LismHit> {
        positions.iter().map(|p| self.evaluate(p)).collect()
    }
}
