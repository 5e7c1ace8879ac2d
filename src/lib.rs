//! # Flock - Numeric Clustering Engine
//!
//! Flock groups numeric observations into clusters. Observations are rows
//! (or, transposed, columns) of a dense matrix that may have missing values
//! and per-dimension weights.
//!
//! ## Key Features
//!
//! - **k-means / k-medians** with multiple random restarts, best-of-N
//!   selection and a repeat count as a confidence signal
//! - **Seeding strategies**: uniform random, k-means++ and deterministic
//!   spread-out selection
//! - **Hierarchical clustering** with single, complete, average and
//!   centroid linkage, cut into any number of clusters
//! - **Self-Organizing Maps** on a rectangular, optionally toroidal grid
//! - **Eight distance metrics**, all honouring masks and weights
//! - **Sparse input** densified from token sets or keyed values
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use flock::{KClusterConfig, Matrix, SeedStrategy, kcluster};
//!
//! let data = Matrix::from_rows(&[
//!     vec![0.0, 0.0],
//!     vec![0.0, 1.0],
//!     vec![10.0, 0.0],
//!     vec![10.0, 1.0],
//! ])?;
//!
//! let config = KClusterConfig {
//!     nclusters: 2,
//!     seed_strategy: SeedStrategy::KMeansPlusPlus,
//!     seed: Some(42),
//!     ..Default::default()
//! };
//! let result = kcluster(&data, &config)?;
//! println!("{:?} error={} repeated={}", result.assignment, result.error, result.repeated);
//! ```
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`matrix`] - Data matrix, mask, weights and transpose views
//! - [`distance`] - Distance metrics and pairwise distance matrices
//! - [`kcluster`] - k-means / k-medians, seeding and centroids
//! - [`tree`] - Hierarchical clustering and dendrogram cuts
//! - [`som`] - Self-Organizing Maps
//! - [`sparse`] - Sparse input densification
//! - [`cancel`] - Cooperative cancellation
//!
//! ## Sparse Data
//!
//! ```rust,ignore
//! use flock::{SparseData, TreeConfig, treecluster};
//!
//! let sparse = SparseData::from_sets(vec![
//!     vec!["apple", "orange"],
//!     vec!["black", "white"],
//!     vec!["white", "cyan"],
//! ]);
//! let dense = sparse.densify(None)?;
//! let labels = treecluster(&dense.matrix, &TreeConfig::default())?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::needless_return)]

pub mod cancel;
pub mod config;
pub mod distance;
pub mod error;
pub mod kcluster;
pub mod matrix;
pub mod som;
pub mod sparse;
pub mod tree;

// Re-export commonly used types
pub use cancel::CancelToken;
pub use config::{Config, KClusterConfig, SomConfig, TreeConfig};
pub use distance::{DistanceMatrix, DistanceMeasure, Metric};
pub use error::{FlockError, Result};
pub use kcluster::{kcluster, CentroidSet, KClusterResult, KMeans, Method, SeedStrategy};
pub use matrix::{DataView, Matrix, Profile};
pub use som::{somcluster, Cell, SomGrid, SomResult, SomTrainer};
pub use sparse::{Densified, SparseData};
pub use tree::{treecluster, Dendrogram, Linkage, Merge, NodeId, TreeBuilder};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
