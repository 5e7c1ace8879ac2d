//! Cell representation for the Self-Organizing Map.

use crate::matrix::Profile;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// A cell in the Self-Organizing Map.
///
/// Each cell has a position on the 2D grid and a reference vector that
/// represents the points mapped onto it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    /// Position along the x axis.
    pub x: usize,
    /// Position along the y axis.
    pub y: usize,
    /// Reference vector.
    pub reference: Vec<f64>,
    /// Dimensions of `reference` that carry data.
    pub mask: Vec<bool>,
}

impl Cell {
    /// Creates a cell with a random reference vector.
    ///
    /// `ranges[d]` is the observed `(min, max)` of dimension `d`; each value
    /// is drawn uniformly from it. Dimensions without a range are masked.
    pub fn new_random<R: Rng + ?Sized>(
        x: usize,
        y: usize,
        ranges: &[Option<(f64, f64)>],
        rng: &mut R,
    ) -> Self {
        let reference = ranges
            .iter()
            .map(|range| match *range {
                Some((lo, hi)) if lo == hi => lo,
                // Interpolated so that a span wider than f64::MAX stays finite.
                Some((lo, hi)) => {
                    let u: f64 = rng.gen();
                    lo * (1.0 - u) + hi * u
                }
                None => 0.0,
            })
            .collect();
        let mask = ranges.iter().map(Option::is_some).collect();

        Self { x, y, reference, mask }
    }

    /// Profile of the reference vector, for distance computations.
    #[inline]
    pub fn profile(&self) -> Profile<'_> {
        Profile::new(&self.reference, &self.mask)
    }

    /// Computes the grid distance to another cell on an `nx x ny` grid.
    ///
    /// If `toroidal` is true, opposite edges are adjacent.
    pub fn grid_distance(&self, other: &Cell, nx: usize, ny: usize, toroidal: bool) -> f64 {
        let dx = self.x.abs_diff(other.x);
        let dy = self.y.abs_diff(other.y);
        let (dx, dy) = if toroidal {
            (dx.min(nx - dx), dy.min(ny - dy))
        } else {
            (dx, dy)
        };

        let (dx, dy) = (dx as f64, dy as f64);
        (dx * dx + dy * dy).sqrt()
    }

    /// Moves the reference vector towards `point` on the point's valid
    /// dimensions.
    pub fn update_towards(&mut self, point: Profile<'_>, learning_rate: f64) {
        for (d, v) in point.valid() {
            self.reference[d] += learning_rate * (v - self.reference[d]);
            self.mask[d] = true;
        }
    }
}
