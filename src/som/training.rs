//! SOM training.
//!
//! Training presents one point per step, in a random order that is
//! reshuffled every epoch. Both the neighbourhood radius and the learning
//! rate decay linearly to zero over the configured number of steps.

use crate::cancel::CancelToken;
use crate::config::SomConfig;
use crate::error::Result;
use crate::kcluster::{CentroidSet, Method};
use crate::distance::Metric;
use crate::matrix::{DataView, Matrix};
use crate::som::SomGrid;
use log::{debug, info};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Outcome of training a map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SomResult {
    /// The trained grid.
    pub grid: SomGrid,
    /// Grid coordinates `(x, y)` of every point's cell.
    pub assignment: Vec<(usize, usize)>,
    /// Mean distance from each point to its cell.
    pub quantization_error: f64,
}

/// SOM trainer with configurable hyperparameters.
#[derive(Debug, Clone)]
pub struct SomTrainer {
    config: SomConfig,
    cancel: CancelToken,
}

impl SomTrainer {
    /// Creates a new trainer with the given configuration.
    pub fn new(config: SomConfig) -> Self {
        Self {
            config,
            cancel: CancelToken::new(),
        }
    }

    /// Uses `token` to allow cancelling between training steps.
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// The trainer's configuration.
    pub fn config(&self) -> &SomConfig {
        &self.config
    }

    /// Computes the learning rate at a given iteration.
    #[inline]
    pub fn learning_rate(&self, iteration: usize) -> f64 {
        self.config.tau * self.remaining(iteration)
    }

    /// Computes the neighborhood radius at a given iteration.
    #[inline]
    pub fn radius(&self, iteration: usize) -> f64 {
        let (nx, ny) = (self.config.nx as f64, self.config.ny as f64);
        (nx * nx + ny * ny).sqrt() * self.remaining(iteration)
    }

    #[inline]
    fn remaining(&self, iteration: usize) -> f64 {
        1.0 - iteration as f64 / self.config.iterations as f64
    }

    /// Trains a map on the points of `matrix` and assigns every point to a
    /// cell.
    ///
    /// After training, each cell that is the best match of some points is
    /// replaced by the masked mean of those points; cells without points keep
    /// their trained reference. Points are then assigned to their nearest
    /// cell of the settled grid.
    pub fn train(&self, matrix: &Matrix) -> Result<SomResult> {
        self.config.validate()?;
        let view = matrix.view(self.config.transpose)?;
        let n = view.npoints();
        let metric = self.config.metric;
        let weights = view.weights();

        let mut rng = match self.config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        let mut grid = SomGrid::new_random(
            self.config.nx,
            self.config.ny,
            self.config.toroidal,
            &view,
            &mut rng,
        );

        info!(
            "Training {}x{} SOM: {} points, {} dims, {} iterations",
            self.config.nx,
            self.config.ny,
            n,
            view.ndim(),
            self.config.iterations
        );

        let mut order: Vec<usize> = (0..n).collect();
        for iteration in 0..self.config.iterations {
            self.cancel.check()?;

            if iteration % n == 0 {
                order.shuffle(&mut rng);
            }

            let point = view.profile(order[iteration % n]);
            let bmu_idx = grid.find_bmu(point, metric, weights);
            grid.update(
                point,
                bmu_idx,
                self.learning_rate(iteration),
                self.radius(iteration),
            );
        }

        // Find all BMUs in parallel
        let bmus = best_matching_cells(&grid, &view, metric);

        let total = grid.total_cells();
        let means = CentroidSet::compute(&view, &bmus, total, Method::Average);
        let mut occupied = vec![false; total];
        for &cell in &bmus {
            occupied[cell] = true;
        }
        for (i, cell) in grid.cells.iter_mut().enumerate() {
            if occupied[i] {
                cell.reference.copy_from_slice(means.values(i));
                cell.mask.copy_from_slice(means.mask(i));
            }
        }
        debug!(
            "Settled {} of {} cells on their points",
            occupied.iter().filter(|&&o| o).count(),
            total
        );

        // Settling moves cells, so points are matched again against the
        // final grid.
        let bmus = best_matching_cells(&grid, &view, metric);

        let quantization_error = bmus
            .iter()
            .enumerate()
            .map(|(p, &cell)| metric.compute(view.profile(p), grid.cells[cell].profile(), weights))
            .sum::<f64>()
            / n as f64;

        let assignment = bmus.iter().map(|&cell| grid.index_to_coords(cell)).collect();

        info!("Training completed. Quantization error {:.6}", quantization_error);
        Ok(SomResult {
            grid,
            assignment,
            quantization_error,
        })
    }
}

/// Index of the best-matching cell of every point.
fn best_matching_cells(grid: &SomGrid, view: &DataView<'_>, metric: Metric) -> Vec<usize> {
    let weights = view.weights();
    (0..view.npoints())
        .into_par_iter()
        .map(|p| grid.find_bmu(view.profile(p), metric, weights))
        .collect()
}

/// Trains a map on `matrix` with the given configuration.
pub fn somcluster(matrix: &Matrix, config: &SomConfig) -> Result<SomResult> {
    SomTrainer::new(config.clone()).train(matrix)
}
