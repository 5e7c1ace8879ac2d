//! Contiguous data matrix with validity mask, feature weights and a
//! logical transpose view.

use crate::error::{FlockError, Result};
use serde::{Deserialize, Serialize};

/// A dense `nrows x ncols` matrix of observations stored row-major.
///
/// Every cell has a validity flag; invalid (missing) cells are ignored by
/// all distance metrics and centroid computations. The weight vector runs
/// along the feature axis of the view being clustered, so its length is
/// `ncols` when clustering rows and `nrows` when clustering columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawMatrix")]
pub struct Matrix {
    nrows: usize,
    ncols: usize,
    data: Vec<f64>,
    mask: Vec<bool>,
    weights: Option<Vec<f64>>,
}

/// Unchecked serialized form of a [`Matrix`].
#[derive(Deserialize)]
struct RawMatrix {
    nrows: usize,
    ncols: usize,
    data: Vec<f64>,
    mask: Vec<bool>,
    weights: Option<Vec<f64>>,
}

impl TryFrom<RawMatrix> for Matrix {
    type Error = FlockError;

    fn try_from(raw: RawMatrix) -> Result<Self> {
        let matrix = Matrix::new(raw.nrows, raw.ncols, raw.data)?.with_mask(raw.mask)?;
        Ok(match raw.weights {
            Some(weights) => matrix.with_weights(weights),
            None => matrix,
        })
    }
}

impl Matrix {
    /// Creates a fully valid matrix from row-major data.
    pub fn new(nrows: usize, ncols: usize, data: Vec<f64>) -> Result<Self> {
        if nrows == 0 || ncols == 0 {
            return Err(FlockError::EmptyInput(format!(
                "matrix must have at least one row and one column, got {}x{}",
                nrows, ncols
            )));
        }
        if data.len() != nrows * ncols {
            return Err(FlockError::DimensionMismatch {
                what: "data".to_string(),
                expected: nrows * ncols,
                found: data.len(),
            });
        }

        Ok(Self {
            nrows,
            ncols,
            mask: vec![true; data.len()],
            data,
            weights: None,
        })
    }

    /// Creates a matrix from a slice of rows. All rows must have equal length.
    pub fn from_rows<R: AsRef<[f64]>>(rows: &[R]) -> Result<Self> {
        let nrows = rows.len();
        let ncols = rows.first().map(|r| r.as_ref().len()).unwrap_or(0);
        let mut data = Vec::with_capacity(nrows * ncols);

        for row in rows {
            let row = row.as_ref();
            if row.len() != ncols {
                return Err(FlockError::DimensionMismatch {
                    what: "row".to_string(),
                    expected: ncols,
                    found: row.len(),
                });
            }
            data.extend_from_slice(row);
        }

        Self::new(nrows, ncols, data)
    }

    /// Attaches a row-major validity mask of the same shape.
    pub fn with_mask(mut self, mask: Vec<bool>) -> Result<Self> {
        if mask.len() != self.data.len() {
            return Err(FlockError::DimensionMismatch {
                what: "mask".to_string(),
                expected: self.data.len(),
                found: mask.len(),
            });
        }
        self.mask = mask;
        Ok(self)
    }

    /// Attaches a mask given as rows of flags.
    pub fn with_mask_rows<R: AsRef<[bool]>>(self, rows: &[R]) -> Result<Self> {
        if rows.len() != self.nrows {
            return Err(FlockError::DimensionMismatch {
                what: "mask rows".to_string(),
                expected: self.nrows,
                found: rows.len(),
            });
        }
        let mut mask = Vec::with_capacity(self.data.len());
        for row in rows {
            let row = row.as_ref();
            if row.len() != self.ncols {
                return Err(FlockError::DimensionMismatch {
                    what: "mask row".to_string(),
                    expected: self.ncols,
                    found: row.len(),
                });
            }
            mask.extend_from_slice(row);
        }
        self.with_mask(mask)
    }

    /// Attaches feature weights.
    ///
    /// The length is checked against the clustered view when a [`DataView`]
    /// is created, since it depends on the transpose flag.
    pub fn with_weights(mut self, weights: Vec<f64>) -> Self {
        self.weights = Some(weights);
        self
    }

    /// Number of rows.
    #[inline]
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    /// Number of columns.
    #[inline]
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// Value at `(row, col)`, or `None` when masked out.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        let k = row * self.ncols + col;
        if self.mask[k] {
            Some(self.data[k])
        } else {
            None
        }
    }

    /// Creates a view clustering rows (`transpose == false`) or columns.
    pub fn view(&self, transpose: bool) -> Result<DataView<'_>> {
        let ndim = if transpose { self.nrows } else { self.ncols };

        let weights = match &self.weights {
            Some(w) if w.len() != ndim => {
                return Err(FlockError::DimensionMismatch {
                    what: "weights".to_string(),
                    expected: ndim,
                    found: w.len(),
                });
            }
            Some(w) => w.clone(),
            None => vec![1.0; ndim],
        };

        Ok(DataView {
            matrix: self,
            transpose,
            weights,
        })
    }
}

/// A read-only view over a [`Matrix`] that fixes which axis holds the
/// points being clustered.
#[derive(Debug, Clone)]
pub struct DataView<'a> {
    matrix: &'a Matrix,
    transpose: bool,
    weights: Vec<f64>,
}

impl<'a> DataView<'a> {
    /// Number of points (rows, or columns under transpose).
    #[inline]
    pub fn npoints(&self) -> usize {
        if self.transpose {
            self.matrix.ncols
        } else {
            self.matrix.nrows
        }
    }

    /// Number of dimensions per point.
    #[inline]
    pub fn ndim(&self) -> usize {
        if self.transpose {
            self.matrix.nrows
        } else {
            self.matrix.ncols
        }
    }

    /// Whether this view clusters columns.
    #[inline]
    pub fn is_transposed(&self) -> bool {
        self.transpose
    }

    /// Feature weights, one per dimension.
    #[inline]
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Returns the strided profile of one point.
    #[inline]
    pub fn profile(&self, point: usize) -> Profile<'a> {
        debug_assert!(point < self.npoints());
        let (offset, stride) = if self.transpose {
            (point, self.matrix.ncols)
        } else {
            (point * self.matrix.ncols, 1)
        };

        Profile {
            data: &self.matrix.data,
            mask: &self.matrix.mask,
            offset,
            stride,
            len: self.ndim(),
        }
    }
}

/// One point's values and validity flags, possibly strided.
#[derive(Debug, Clone, Copy)]
pub struct Profile<'a> {
    data: &'a [f64],
    mask: &'a [bool],
    offset: usize,
    stride: usize,
    len: usize,
}

impl<'a> Profile<'a> {
    /// Creates a contiguous profile from parallel value and mask slices.
    pub fn new(values: &'a [f64], mask: &'a [bool]) -> Self {
        debug_assert_eq!(values.len(), mask.len());
        Self {
            data: values,
            mask,
            offset: 0,
            stride: 1,
            len: values.len(),
        }
    }

    /// Number of dimensions.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when the profile has no dimensions.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Value at dimension `i`, or `None` when masked out.
    #[inline]
    pub fn get(&self, i: usize) -> Option<f64> {
        let k = self.offset + i * self.stride;
        if self.mask[k] {
            Some(self.data[k])
        } else {
            None
        }
    }

    /// Iterates over `(dimension, value)` for valid dimensions.
    pub fn valid(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        (0..self.len).filter_map(move |i| self.get(i).map(|v| (i, v)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Matrix {
        Matrix::from_rows(&[vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]).unwrap()
    }

    #[test]
    fn test_deserialize_checks_shape() {
        let json = r#"{"nrows":2,"ncols":2,"data":[1,2,3,4],"mask":[true],"weights":null}"#;
        let err = serde_json::from_str::<Matrix>(json).unwrap_err();
        assert!(err.to_string().contains("mask"));

        let json = r#"{"nrows":2,"ncols":2,"data":[1,2,3],"mask":[true,true,true],"weights":null}"#;
        assert!(serde_json::from_str::<Matrix>(json).is_err());

        let json = r#"{"nrows":0,"ncols":2,"data":[],"mask":[],"weights":null}"#;
        assert!(serde_json::from_str::<Matrix>(json).is_err());
    }

    #[test]
    fn test_serde_round_trip() {
        let m = sample()
            .with_mask(vec![true, false, true, true, true, true])
            .unwrap()
            .with_weights(vec![1.0, 2.0, 0.5]);
        let json = serde_json::to_string(&m).unwrap();
        assert_eq!(serde_json::from_str::<Matrix>(&json).unwrap(), m);
    }

    #[test]
    fn test_from_rows() {
        let m = sample();
        assert_eq!(m.nrows(), 2);
        assert_eq!(m.ncols(), 3);
        assert_eq!(m.get(1, 2), Some(6.0));
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let err = Matrix::from_rows(&[vec![1.0, 2.0], vec![3.0]]).unwrap_err();
        assert!(matches!(err, FlockError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_empty_rejected() {
        let rows: Vec<Vec<f64>> = vec![];
        assert!(matches!(
            Matrix::from_rows(&rows),
            Err(FlockError::EmptyInput(_))
        ));
    }

    #[test]
    fn test_mask_shape_checked() {
        assert!(sample().with_mask(vec![true; 5]).is_err());
        assert!(sample().with_mask_rows(&[vec![true; 3]]).is_err());
    }

    #[test]
    fn test_masked_value_hidden() {
        let m = sample()
            .with_mask_rows(&[vec![true, false, true], vec![true; 3]])
            .unwrap();
        assert_eq!(m.get(0, 1), None);
        let p = m.view(false).unwrap().profile(0);
        let valid: Vec<_> = p.valid().collect();
        assert_eq!(valid, vec![(0, 1.0), (2, 3.0)]);
    }

    #[test]
    fn test_transposed_profile() {
        let m = sample();
        let view = m.view(true).unwrap();
        assert_eq!(view.npoints(), 3);
        assert_eq!(view.ndim(), 2);
        let p = view.profile(1);
        assert_eq!(p.get(0), Some(2.0));
        assert_eq!(p.get(1), Some(5.0));
    }

    #[test]
    fn test_weight_length_depends_on_transpose() {
        let m = sample().with_weights(vec![1.0, 2.0]);
        assert!(m.view(false).is_err());
        let view = m.view(true).unwrap();
        assert_eq!(view.weights(), &[1.0, 2.0]);
    }

    #[test]
    fn test_default_weights() {
        let m = sample();
        assert_eq!(m.view(false).unwrap().weights(), &[1.0, 1.0, 1.0]);
    }
}
