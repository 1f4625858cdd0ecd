//! Element-wise approximate-equality comparison
//!
//! Candidate and oracle outputs are compared over the union of their
//! occupied cells, zero-filled where absent, against an absolute tolerance.
//! The tolerance is intentionally absolute rather than relative: outputs of
//! the fixed algorithm reach the 1e12 scale, where a relative bound is
//! meaningless at near-zero cells and an absolute bound tracks the actual
//! drift budget. Shape mismatches are a hard error, never a tolerated
//! verdict.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::error::{HarnessError, Result};
use crate::matrix::MatrixPayload;

/// How many offending cells a verdict carries for diagnosis
pub const MISMATCH_SAMPLE_LIMIT: usize = 16;

/// One cell where the difference exceeded the tolerance
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CellMismatch {
    /// Row index
    pub row: usize,
    /// Column index
    pub col: usize,
    /// Oracle value
    pub expected: f64,
    /// Candidate value
    pub actual: f64,
}

/// Outcome of one comparison
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonVerdict {
    /// Whether every cell difference stayed within tolerance
    pub passed: bool,
    /// Largest absolute difference observed
    pub max_abs_diff: f64,
    /// Total number of cells over tolerance
    pub mismatch_count: usize,
    /// First offending cells in row-major order, capped at
    /// [`MISMATCH_SAMPLE_LIMIT`]
    pub mismatches: Vec<CellMismatch>,
}

/// Compare candidate against oracle within an absolute tolerance
///
/// A non-finite difference (NaN or infinity on either side) always fails,
/// regardless of tolerance.
///
/// # Errors
///
/// Returns `HarnessError::ShapeMismatch` when the two matrices disagree on
/// dimensions.
pub fn compare(
    candidate: &MatrixPayload,
    oracle: &MatrixPayload,
    abs_tolerance: f64,
) -> Result<ComparisonVerdict> {
    if candidate.shape() != oracle.shape() {
        return Err(HarnessError::ShapeMismatch {
            context: "candidate vs oracle output".to_string(),
            expected_rows: oracle.rows(),
            expected_cols: oracle.cols(),
            actual_rows: candidate.rows(),
            actual_cols: candidate.cols(),
        });
    }

    let keys: BTreeSet<(usize, usize)> = candidate.keys().chain(oracle.keys()).collect();
    let mut max_abs_diff = 0.0f64;
    let mut mismatches = Vec::new();
    let mut mismatch_count = 0;
    let mut finite = true;
    for (row, col) in keys {
        let actual = candidate.get(row, col);
        let expected = oracle.get(row, col);
        let diff = (actual - expected).abs();
        if diff.is_finite() {
            max_abs_diff = max_abs_diff.max(diff);
        } else {
            finite = false;
        }
        if !diff.is_finite() || diff > abs_tolerance {
            mismatch_count += 1;
            if mismatches.len() < MISMATCH_SAMPLE_LIMIT {
                mismatches.push(CellMismatch {
                    row,
                    col,
                    expected,
                    actual,
                });
            }
        }
    }
    if !finite {
        max_abs_diff = f64::INFINITY;
    }

    Ok(ComparisonVerdict {
        passed: finite && max_abs_diff <= abs_tolerance,
        max_abs_diff,
        mismatch_count,
        mismatches,
    })
}
