//! Self-Organizing Map (SOM) module.
//!
//! A SOM is an `nx x ny` grid of cells, each holding a reference vector.
//! Training pulls the best-matching cell and its grid neighbours towards
//! each presented point, so nearby cells end up representing similar
//! points.

mod cell;
mod grid;
pub mod training;

pub use cell::Cell;
pub use grid::SomGrid;
pub use training::{somcluster, SomResult, SomTrainer};
