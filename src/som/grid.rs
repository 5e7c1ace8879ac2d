//! Rectangular grid of SOM cells.

use crate::distance::Metric;
use crate::matrix::{DataView, Profile};
use crate::som::Cell;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// An `nx x ny` grid of cells.
///
/// Through training, nearby cells come to represent similar points, so the
/// grid preserves the topology of the data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SomGrid {
    /// Grid size along x.
    pub nx: usize,
    /// Grid size along y.
    pub ny: usize,
    /// Use toroidal boundary conditions.
    pub toroidal: bool,
    /// The cells, indexed by `x * ny + y`.
    pub cells: Vec<Cell>,
}

impl SomGrid {
    /// Creates a grid whose cells are drawn uniformly from the observed range
    /// of each dimension of `view`.
    pub fn new_random<R: Rng + ?Sized>(
        nx: usize,
        ny: usize,
        toroidal: bool,
        view: &DataView<'_>,
        rng: &mut R,
    ) -> Self {
        let ranges = value_ranges(view);
        let cells = (0..nx * ny)
            .map(|i| Cell::new_random(i / ny, i % ny, &ranges, rng))
            .collect();

        Self {
            nx,
            ny,
            toroidal,
            cells,
        }
    }

    /// Returns the total number of cells.
    #[inline]
    pub fn total_cells(&self) -> usize {
        self.cells.len()
    }

    /// Gets a cell by its 2D position.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<&Cell> {
        if x < self.nx && y < self.ny {
            Some(&self.cells[self.coords_to_index(x, y)])
        } else {
            None
        }
    }

    /// Converts a 1D index to 2D coordinates.
    #[inline]
    pub fn index_to_coords(&self, index: usize) -> (usize, usize) {
        (index / self.ny, index % self.ny)
    }

    /// Converts 2D coordinates to a 1D index.
    #[inline]
    pub fn coords_to_index(&self, x: usize, y: usize) -> usize {
        x * self.ny + y
    }

    /// Finds the Best Matching Unit (BMU) for a point.
    ///
    /// The BMU is the cell whose reference is closest to the point; the
    /// lowest index wins ties. Returns the index of the BMU.
    pub fn find_bmu(&self, point: Profile<'_>, metric: Metric, weights: &[f64]) -> usize {
        let mut best = (0, f64::INFINITY);
        for (i, cell) in self.cells.iter().enumerate() {
            let d = metric.compute(point, cell.profile(), weights);
            if d < best.1 {
                best = (i, d);
            }
        }
        best.0
    }

    /// Moves the BMU and every cell closer than `radius` to it on the grid
    /// towards `point`.
    pub fn update(&mut self, point: Profile<'_>, bmu_idx: usize, learning_rate: f64, radius: f64) {
        let (nx, ny, toroidal) = (self.nx, self.ny, self.toroidal);
        let bmu = self.cells[bmu_idx].clone();

        for (i, cell) in self.cells.iter_mut().enumerate() {
            if i == bmu_idx || bmu.grid_distance(cell, nx, ny, toroidal) < radius {
                cell.update_towards(point, learning_rate);
            }
        }
    }
}

/// Observed `(min, max)` of every dimension over the valid values of `view`.
fn value_ranges(view: &DataView<'_>) -> Vec<Option<(f64, f64)>> {
    let mut ranges: Vec<Option<(f64, f64)>> = vec![None; view.ndim()];
    for point in 0..view.npoints() {
        for (d, v) in view.profile(point).valid() {
            ranges[d] = Some(match ranges[d] {
                Some((lo, hi)) => (lo.min(v), hi.max(v)),
                None => (v, v),
            });
        }
    }
    ranges
}
