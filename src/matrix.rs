//! Sparse cell-map matrices and their synthesis specs
//!
//! `MatrixPayload` is the exchange type for every matrix the harness touches:
//! a `(row, col) -> value` map with declared bounds, where absent cells read
//! as zero. The map keeps cells in row-major order, so serialization and
//! mismatch enumeration are deterministic across runs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{HarnessError, Result};

/// Full description of a synthesized matrix
///
/// Identical specs produce bit-identical matrices; the seed determines both
/// the non-zero positions (for `density < 1`) and the cell values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatrixSpec {
    /// Row count (must be > 0)
    pub rows: usize,
    /// Column count (must be > 0)
    pub cols: usize,
    /// Lower bound of the uniform value range
    pub min_value: f64,
    /// Upper bound of the uniform value range
    pub max_value: f64,
    /// Fraction of cells that are non-zero, in `[0, 1]`
    pub density: f64,
    /// Seed for the deterministic generator
    pub seed: u64,
}

impl MatrixSpec {
    /// Validate the spec before synthesis
    ///
    /// # Errors
    ///
    /// Returns `HarnessError::InvalidSpec` if either dimension is zero,
    /// the density is outside `[0, 1]`, or the value range is inverted.
    pub fn validate(&self) -> Result<()> {
        if self.rows == 0 {
            return Err(HarnessError::InvalidSpec {
                reason: "rows must be > 0".to_string(),
            });
        }
        if self.cols == 0 {
            return Err(HarnessError::InvalidSpec {
                reason: "cols must be > 0".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.density) {
            return Err(HarnessError::InvalidSpec {
                reason: format!("density {} outside [0, 1]", self.density),
            });
        }
        if self.min_value > self.max_value {
            return Err(HarnessError::InvalidSpec {
                reason: format!(
                    "min_value {} greater than max_value {}",
                    self.min_value, self.max_value
                ),
            });
        }
        Ok(())
    }
}

/// Sparse-or-dense numeric matrix keyed by `(row, col)`
///
/// Values outside stored keys are implicitly zero. Indices are validated
/// against the declared bounds on insert; the map keying rules out
/// duplicate cells.
///
/// # Examples
///
/// ```
/// use cotejar::matrix::MatrixPayload;
///
/// let mut m = MatrixPayload::new(2, 2);
/// m.set(0, 1, 3.5).unwrap();
/// assert_eq!(m.get(0, 1), 3.5);
/// assert_eq!(m.get(1, 0), 0.0);
/// assert_eq!(m.nnz(), 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixPayload {
    rows: usize,
    cols: usize,
    cells: BTreeMap<(usize, usize), f64>,
}

impl MatrixPayload {
    /// Create an empty (all-zero) matrix with the given bounds
    #[must_use]
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: BTreeMap::new(),
        }
    }

    /// Row count
    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Column count
    #[must_use]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// `(rows, cols)` pair, for shape checks
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Number of explicitly stored cells
    #[must_use]
    pub fn nnz(&self) -> usize {
        self.cells.len()
    }

    /// Read a cell, zero for absent keys
    ///
    /// Out-of-bounds reads also return zero; only writes are bounds-checked.
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.cells.get(&(row, col)).copied().unwrap_or(0.0)
    }

    /// Store a cell value
    ///
    /// # Errors
    ///
    /// Returns `HarnessError::IndexOutOfBounds` when the index is outside
    /// the declared bounds.
    pub fn set(&mut self, row: usize, col: usize, value: f64) -> Result<()> {
        if row >= self.rows || col >= self.cols {
            return Err(HarnessError::IndexOutOfBounds {
                row,
                col,
                rows: self.rows,
                cols: self.cols,
            });
        }
        self.cells.insert((row, col), value);
        Ok(())
    }

    /// Iterate stored cells in row-major order
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        self.cells.iter().map(|(&(r, c), &v)| (r, c, v))
    }

    /// Stored keys in row-major order, for union-style cell walks
    pub fn keys(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.cells.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(rows: usize, cols: usize, density: f64) -> MatrixSpec {
        MatrixSpec {
            rows,
            cols,
            min_value: 0.0,
            max_value: 1.0,
            density,
            seed: 7,
        }
    }

    #[test]
    fn test_spec_validate_accepts_well_formed() {
        assert!(spec(4, 3, 0.5).validate().is_ok());
        assert!(spec(1, 1, 0.0).validate().is_ok());
        assert!(spec(1, 1, 1.0).validate().is_ok());
    }

    #[test]
    fn test_spec_validate_rejects_zero_rows() {
        let err = spec(0, 3, 0.5).validate().unwrap_err();
        assert!(matches!(err, HarnessError::InvalidSpec { .. }));
    }

    #[test]
    fn test_spec_validate_rejects_zero_cols() {
        assert!(spec(3, 0, 0.5).validate().is_err());
    }

    #[test]
    fn test_spec_validate_rejects_density_outside_unit_interval() {
        assert!(spec(3, 3, -0.1).validate().is_err());
        assert!(spec(3, 3, 1.1).validate().is_err());
    }

    #[test]
    fn test_spec_validate_rejects_inverted_range() {
        let mut s = spec(3, 3, 0.5);
        s.min_value = 2.0;
        s.max_value = 1.0;
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_payload_absent_cells_read_zero() {
        let m = MatrixPayload::new(3, 3);
        assert_eq!(m.get(2, 2), 0.0);
        assert_eq!(m.nnz(), 0);
    }

    #[test]
    fn test_payload_set_rejects_out_of_bounds() {
        let mut m = MatrixPayload::new(2, 2);
        let err = m.set(2, 0, 1.0).unwrap_err();
        assert!(matches!(err, HarnessError::IndexOutOfBounds { row: 2, .. }));
        assert!(m.set(0, 5, 1.0).is_err());
    }

    #[test]
    fn test_payload_overwrite_keeps_single_key() {
        let mut m = MatrixPayload::new(2, 2);
        m.set(1, 1, 1.0).unwrap();
        m.set(1, 1, 2.0).unwrap();
        assert_eq!(m.nnz(), 1);
        assert_eq!(m.get(1, 1), 2.0);
    }

    #[test]
    fn test_payload_cells_iterate_row_major() {
        let mut m = MatrixPayload::new(3, 3);
        m.set(2, 0, 3.0).unwrap();
        m.set(0, 1, 1.0).unwrap();
        m.set(1, 2, 2.0).unwrap();
        let order: Vec<(usize, usize)> = m.cells().map(|(r, c, _)| (r, c)).collect();
        assert_eq!(order, vec![(0, 1), (1, 2), (2, 0)]);
    }
}
