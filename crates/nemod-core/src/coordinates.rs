use serde::{Deserialize, Serialize};
use nalgebra::Vector3;

/// Galactocentric Cartesian position (kpc).
///
/// The Galactic center is the origin, the Sun sits at (0, rsun, 0) and
/// +x points toward l = 90 deg.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GalactocentricPosition {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl GalactocentricPosition {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Position of an object at heliocentric distance `distance` (kpc)
    pub fn from_galactic(direction: GalacticDirection, distance: f64, rsun: f64) -> Self {
        let (sl, cl) = direction.longitude.sin_cos();
        let (sb, cb) = direction.latitude.sin_cos();
        Self {
            x: distance * cb * sl,
            y: rsun - distance * cb * cl,
            z: distance * sb,
        }
    }

    /// Same as [`from_galactic`](Self::from_galactic) for catalog entries given in degrees
    pub fn from_galactic_degrees(l_deg: f64, b_deg: f64, distance: f64, rsun: f64) -> Self {
        Self::from_galactic(GalacticDirection::from_degrees(l_deg, b_deg), distance, rsun)
    }

    /// Cylindrical Galactocentric radius
    pub fn cylindrical_radius(&self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// Galactocentric azimuth in degrees, counter-clockwise from +y, in [0, 360)
    pub fn azimuth_deg(&self) -> f64 {
        let theta = (-self.x).atan2(self.y).to_degrees();
        if theta < 0.0 { theta + 360.0 } else { theta }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    pub fn to_vector(&self) -> Vector3<f64> {
        Vector3::new(self.x, self.y, self.z)
    }
}

/// Direction on the sky in Galactic coordinates (radians)
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GalacticDirection {
    pub longitude: f64,
    pub latitude: f64,
}

impl GalacticDirection {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self { longitude, latitude }
    }

    pub fn from_degrees(l_deg: f64, b_deg: f64) -> Self {
        Self::new(l_deg.to_radians(), b_deg.to_radians())
    }

    /// Unit step per kpc of path length, in Galactocentric axes
    pub fn unit_step(&self) -> Vector3<f64> {
        let (sl, cl) = self.longitude.sin_cos();
        let (sb, cb) = self.latitude.sin_cos();
        Vector3::new(cb * sl, -cb * cl, sb)
    }

    pub fn is_finite(&self) -> bool {
        self.longitude.is_finite() && self.latitude.is_finite()
    }
}
