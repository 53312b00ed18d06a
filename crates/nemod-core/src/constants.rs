/// Parsec in meters
pub const PARSEC: f64 = 3.0856775814913673e16;

/// Parsecs per kiloparsec (path lengths are kpc, DM is pc cm^-3)
pub const PC_PER_KPC: f64 = 1000.0;

/// Sun's Galactocentric radius used by the NE2001 family (kpc)
pub const RSUN_KPC: f64 = 8.5;

/// Kolmogorov spectral index of the electron-density fluctuations
pub const KOLMOGOROV_ALPHA: f64 = 11.0 / 3.0;

/// Default coarse step for smooth components along a sightline (kpc)
pub const DEFAULT_STEP_COARSE: f64 = 0.1;

/// Default fine step for small-scale components along a sightline (kpc)
pub const DEFAULT_STEP_FINE: f64 = 0.01;

/// Minimum number of intervals on either sampling grid
pub const DEFAULT_MIN_SAMPLES: usize = 20;

/// Integration ceiling on path length (kpc)
pub const DEFAULT_MAX_DISTANCE: f64 = 50.0;

/// C_SM = (alpha - 3) / [2 (2 pi)^(4 - alpha)]
pub fn c_sm() -> f64 {
    (KOLMOGOROV_ALPHA - 3.0) / (2.0 * (2.0 * std::f64::consts::PI).powf(4.0 - KOLMOGOROV_ALPHA))
}

/// Converts F n_e^2 (F in pc^-2/3, n_e in cm^-3) to C_n^2 in m^-20/3
pub fn c_u() -> f64 {
    1.0e12 * PARSEC.powf(-2.0 / 3.0)
}

/// Prefactor turning the path integral of F n_e^2 (kpc) into SM (kpc m^-20/3)
pub fn sm_factor() -> f64 {
    c_sm() * c_u()
}
