//! Sparse input: rows of tokens, or rows of `token -> value` pairs, turned
//! into a dense [`Matrix`] over the combined vocabulary.

use crate::error::{FlockError, Result};
use crate::matrix::Matrix;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Sparse rows keyed by token.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseData {
    rows: Vec<Vec<(String, f64)>>,
}

/// A dense matrix built from [`SparseData`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Densified {
    /// One row per sparse row, one column per vocabulary entry.
    pub matrix: Matrix,
    /// Token of every column, in order of first appearance.
    pub vocabulary: Vec<String>,
}

impl SparseData {
    /// Rows of tokens; a present token has value `1.0`.
    pub fn from_sets<R, T>(rows: impl IntoIterator<Item = R>) -> Self
    where
        R: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let rows = rows
            .into_iter()
            .map(|row| row.into_iter().map(|token| (token.into(), 1.0)).collect())
            .collect();
        Self { rows }
    }

    /// Rows of `(token, value)` pairs. A token repeated within a row keeps
    /// its last value.
    ///
    /// Column order follows the iteration order of the rows, so pass ordered
    /// maps for a stable vocabulary.
    pub fn from_maps<R, T>(rows: impl IntoIterator<Item = R>) -> Self
    where
        R: IntoIterator<Item = (T, f64)>,
        T: Into<String>,
    {
        let rows = rows
            .into_iter()
            .map(|row| row.into_iter().map(|(token, v)| (token.into(), v)).collect())
            .collect();
        Self { rows }
    }

    /// Number of rows.
    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when there are no rows.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Builds the dense matrix.
    ///
    /// Absent tokens read `0.0`. Every column gets weight `1.0` unless
    /// `weights` names its token; names outside the vocabulary are ignored.
    pub fn densify(&self, weights: Option<&HashMap<String, f64>>) -> Result<Densified> {
        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut vocabulary: Vec<String> = Vec::new();
        for (token, _) in self.rows.iter().flatten() {
            if !index.contains_key(token.as_str()) {
                index.insert(token.as_str(), vocabulary.len());
                vocabulary.push(token.clone());
            }
        }

        if self.rows.is_empty() || vocabulary.is_empty() {
            return Err(FlockError::EmptyInput(
                "sparse data has no rows or no tokens".to_string(),
            ));
        }

        let ncols = vocabulary.len();
        let mut data = vec![0.0; self.rows.len() * ncols];
        for (r, row) in self.rows.iter().enumerate() {
            for (token, v) in row {
                data[r * ncols + index[token.as_str()]] = *v;
            }
        }

        let mut matrix = Matrix::new(self.rows.len(), ncols, data)?;
        if let Some(named) = weights {
            let mut resampled = vec![1.0; ncols];
            for (token, &w) in named {
                match index.get(token.as_str()) {
                    Some(&col) => resampled[col] = w,
                    None => warn!("Ignoring weight for unknown token {:?}", token),
                }
            }
            matrix = matrix.with_weights(resampled);
        }

        debug!(
            "Densified {} sparse rows into {} columns",
            self.rows.len(),
            ncols
        );
        Ok(Densified { matrix, vocabulary })
    }
}
