use serde::{Deserialize, Serialize};

/// Relative slack when turning `end / max_step` into an interval count, so
/// that e.g. 50 / 0.1 does not round up to 501 intervals.
const INTERVAL_SLACK: f64 = 1e-9;

/// Configuration for a uniform path grid
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    /// Largest allowed spacing between samples (kpc)
    pub max_step: f64,
    /// Lower bound on the number of intervals, regardless of path length
    pub min_intervals: usize,
}

impl GridConfig {
    pub fn new(max_step: f64, min_intervals: usize) -> Self {
        Self { max_step, min_intervals }
    }

    pub fn spanning(&self, end: f64) -> SampleGrid {
        SampleGrid::spanning(end, self.max_step, self.min_intervals)
    }
}

/// Sampling of the path [0, end] anchored at the observer
///
/// Samples sit at `i * max_step` with one final, possibly shorter, interval
/// ending exactly at `end`. Paths too short for `min_intervals` steps of
/// `max_step` are split into `min_intervals` equal intervals instead. Two
/// grids with the same step therefore share every sample up to the shorter end.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SampleGrid {
    end: f64,
    step: f64,
    intervals: usize,
}

impl SampleGrid {
    /// Uses ceil(end / max_step) intervals, but never fewer than `min_intervals` (or 1)
    pub fn spanning(end: f64, max_step: f64, min_intervals: usize) -> Self {
        let wanted = (end / max_step * (1.0 - INTERVAL_SLACK)).ceil().max(0.0) as usize;
        let min_intervals = min_intervals.max(1);
        if wanted >= min_intervals {
            Self {
                end,
                step: max_step,
                intervals: wanted,
            }
        } else {
            Self {
                end,
                step: end / min_intervals as f64,
                intervals: min_intervals,
            }
        }
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    /// Spacing of every interval but the last
    pub fn step(&self) -> f64 {
        self.step
    }

    pub fn intervals(&self) -> usize {
        self.intervals
    }

    /// Number of samples (intervals + 1)
    pub fn len(&self) -> usize {
        self.intervals + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Path length of sample `i`
    pub fn point(&self, i: usize) -> f64 {
        if i >= self.intervals {
            self.end
        } else {
            i as f64 * self.step
        }
    }

    pub fn points(&self) -> Vec<f64> {
        (0..self.len()).map(|i| self.point(i)).collect()
    }
}
