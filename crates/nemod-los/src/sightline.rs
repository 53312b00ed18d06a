use nemod_core::{GalacticDirection, GalactocentricPosition, SampleGrid};

/// Ray from the Sun in a fixed Galactic direction
#[derive(Clone, Copy, Debug)]
pub struct Sightline {
    direction: GalacticDirection,
    rsun: f64,
}

impl Sightline {
    pub fn new(direction: GalacticDirection, rsun: f64) -> Self {
        Self { direction, rsun }
    }

    pub fn direction(&self) -> GalacticDirection {
        self.direction
    }

    /// Galactocentric position after path length `s` (kpc)
    pub fn position_at(&self, s: f64) -> GalactocentricPosition {
        GalactocentricPosition::from_galactic(self.direction, s, self.rsun)
    }

    pub fn positions(&self, grid: &SampleGrid) -> Vec<GalactocentricPosition> {
        (0..grid.len()).map(|i| self.position_at(grid.point(i))).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_at_sun() {
        let line = Sightline::new(GalacticDirection::from_degrees(75.0, 20.0), 8.5);
        assert_eq!(line.position_at(0.0), GalactocentricPosition::new(0.0, 8.5, 0.0));
    }

    #[test]
    fn test_samples_are_equally_spaced() {
        let line = Sightline::new(GalacticDirection::from_degrees(200.0, -6.5), 8.5);
        let grid = SampleGrid::spanning(2.0, 0.1, 20);
        let positions = line.positions(&grid);
        assert_eq!(positions.len(), 21);
        for pair in positions.windows(2) {
            let step = (pair[1].to_vector() - pair[0].to_vector()).norm();
            assert!((step - 0.1).abs() < 1e-12);
        }
    }
}
