//! Configuration for the clustering engines.

use crate::distance::Metric;
use crate::error::{FlockError, Result};
use crate::kcluster::{Method, SeedStrategy};
use crate::tree::Linkage;
use serde::{Deserialize, Serialize};

/// Configuration for all clustering engines.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// k-means / k-medians configuration.
    pub kcluster: KClusterConfig,

    /// Hierarchical clustering configuration.
    pub tree: TreeConfig,

    /// Self-organizing map configuration.
    pub som: SomConfig,
}

/// k-means / k-medians configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KClusterConfig {
    /// Number of clusters.
    /// Default: 2.
    pub nclusters: usize,

    /// Number of independent restarts; the best result is kept.
    /// Default: 100.
    pub passes: usize,

    /// Cap on reassignment rounds within one pass.
    /// Default: 1000.
    pub max_iterations: usize,

    /// Centroid method.
    /// Default: average (k-means).
    pub method: Method,

    /// Distance metric.
    /// Default: euclidean.
    pub metric: Metric,

    /// Initial assignment strategy for each pass.
    /// Default: random.
    pub seed_strategy: SeedStrategy,

    /// Cluster columns instead of rows.
    /// Default: false.
    pub transpose: bool,

    /// Random seed for reproducibility.
    /// Default: None (random).
    pub seed: Option<u64>,
}

impl Default for KClusterConfig {
    fn default() -> Self {
        Self {
            nclusters: 2,
            passes: 100,
            max_iterations: 1000,
            method: Method::Average,
            metric: Metric::Euclidean,
            seed_strategy: SeedStrategy::Random,
            transpose: false,
            seed: None,
        }
    }
}

impl KClusterConfig {
    /// Checks the settings that do not depend on the data.
    pub fn validate(&self) -> Result<()> {
        if self.nclusters == 0 {
            return Err(FlockError::Config("nclusters must be > 0".to_string()));
        }
        if self.passes == 0 {
            return Err(FlockError::Config("passes must be > 0".to_string()));
        }
        if self.max_iterations == 0 {
            return Err(FlockError::Config("max_iterations must be > 0".to_string()));
        }
        Ok(())
    }
}

/// Hierarchical clustering configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Number of clusters the tree is cut into.
    /// Default: 2.
    pub nclusters: usize,

    /// Linkage rule.
    /// Default: average.
    pub linkage: Linkage,

    /// Distance metric.
    /// Default: euclidean.
    pub metric: Metric,

    /// Cluster columns instead of rows.
    /// Default: false.
    pub transpose: bool,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            nclusters: 2,
            linkage: Linkage::Average,
            metric: Metric::Euclidean,
            transpose: false,
        }
    }
}

impl TreeConfig {
    /// Checks the settings that do not depend on the data.
    pub fn validate(&self) -> Result<()> {
        if self.nclusters == 0 {
            return Err(FlockError::Config("nclusters must be > 0".to_string()));
        }
        Ok(())
    }
}

/// Self-organizing map configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SomConfig {
    /// Grid size along x.
    /// Default: 2.
    pub nx: usize,

    /// Grid size along y.
    /// Default: 2.
    pub ny: usize,

    /// Number of training steps, one point per step.
    /// Default: 1000.
    pub iterations: usize,

    /// Initial learning rate; decays linearly to zero.
    /// Default: 1.0.
    pub tau: f64,

    /// Distance metric used to find the best-matching cell.
    /// Default: euclidean.
    pub metric: Metric,

    /// Cluster columns instead of rows.
    /// Default: false.
    pub transpose: bool,

    /// Use toroidal boundary conditions (wrapping edges).
    /// Default: false.
    pub toroidal: bool,

    /// Random seed for reproducibility.
    /// Default: None (random).
    pub seed: Option<u64>,
}

impl Default for SomConfig {
    fn default() -> Self {
        Self {
            nx: 2,
            ny: 2,
            iterations: 1000,
            tau: 1.0,
            metric: Metric::Euclidean,
            transpose: false,
            toroidal: false,
            seed: None,
        }
    }
}

impl SomConfig {
    /// Returns the total number of cells in the grid.
    #[inline]
    pub fn total_cells(&self) -> usize {
        self.nx * self.ny
    }

    /// Checks the settings that do not depend on the data.
    pub fn validate(&self) -> Result<()> {
        if self.nx == 0 || self.ny == 0 {
            return Err(FlockError::Config(format!(
                "grid size must be > 0, got {}x{}",
                self.nx, self.ny
            )));
        }
        if self.iterations == 0 {
            return Err(FlockError::Config("iterations must be > 0".to_string()));
        }
        if !(self.tau > 0.0 && self.tau.is_finite()) {
            return Err(FlockError::Config(format!("tau must be > 0, got {}", self.tau)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.kcluster.passes, 100);
        assert_eq!(config.kcluster.metric, Metric::Euclidean);
        assert_eq!(config.kcluster.seed_strategy, SeedStrategy::Random);
        assert_eq!(config.tree.linkage, Linkage::Average);
        assert_eq!(config.som.tau, 1.0);
        assert_eq!(config.som.total_cells(), 4);
    }

    #[test]
    fn test_partial_json() {
        let config: Config = serde_json::from_str(
            r#"{"kcluster": {"nclusters": 3, "metric": "kendall", "seed_strategy": "kmeans_plusplus"},
                "som": {"nx": 4, "tau": 0.5}}"#,
        )
        .unwrap();
        assert_eq!(config.kcluster.nclusters, 3);
        assert_eq!(config.kcluster.metric, Metric::Kendall);
        assert_eq!(config.kcluster.seed_strategy, SeedStrategy::KMeansPlusPlus);
        assert_eq!(config.kcluster.passes, 100);
        assert_eq!(config.som.nx, 4);
        assert_eq!(config.som.ny, 2);
        assert_eq!(config.tree, TreeConfig::default());
    }

    #[test]
    fn test_validate() {
        assert!(KClusterConfig::default().validate().is_ok());
        let bad = KClusterConfig {
            nclusters: 0,
            ..Default::default()
        };
        assert!(matches!(bad.validate(), Err(FlockError::Config(_))));

        let bad_grid = SomConfig {
            ny: 0,
            ..Default::default()
        };
        assert!(bad_grid.validate().is_err());

        let bad_tau = SomConfig {
            tau: 0.0,
            ..Default::default()
        };
        assert!(bad_tau.validate().is_err());
    }
}
