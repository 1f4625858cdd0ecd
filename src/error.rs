//! Error types for the differential test harness
//!
//! Every failure the harness can hit is an explicit, typed variant with
//! enough context to diagnose the scenario from the report alone. Failures
//! are caught at the scenario boundary and folded into the scenario outcome;
//! nothing here aborts a suite.

use std::fmt;

use thiserror::Error;

/// Which side of the differential run failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionPhase {
    /// The optimized, code-generated path under test
    Candidate,
    /// The trusted reference implementation
    Oracle,
}

impl fmt::Display for ExecutionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionPhase::Candidate => write!(f, "candidate"),
            ExecutionPhase::Oracle => write!(f, "oracle"),
        }
    }
}

/// Harness errors with detailed context for diagnosis
#[derive(Debug, Error)]
pub enum HarnessError {
    /// Matrix spec rejected before synthesis
    #[error("invalid matrix spec: {reason}")]
    InvalidSpec {
        /// Why the spec was rejected
        reason: String,
    },

    /// Candidate or oracle program terminated abnormally
    #[error("{phase} execution failed: {cause}")]
    ExecutionFailed {
        /// Which side failed
        phase: ExecutionPhase,
        /// Underlying cause (exit status, missing binary, engine error)
        cause: String,
    },

    /// Structural incompatibility between two matrices
    ///
    /// Highest-severity failure: a shape mismatch between candidate and
    /// oracle outputs is a contract violation, not numeric drift.
    #[error(
        "shape mismatch ({context}): expected {expected_rows}x{expected_cols}, \
         got {actual_rows}x{actual_cols}"
    )]
    ShapeMismatch {
        /// Where the mismatch was detected
        context: String,
        /// Expected row count
        expected_rows: usize,
        /// Expected column count
        expected_cols: usize,
        /// Actual row count
        actual_rows: usize,
        /// Actual column count
        actual_cols: usize,
    },

    /// Cell index outside the declared matrix bounds
    #[error("cell ({row},{col}) outside {rows}x{cols} bounds")]
    IndexOutOfBounds {
        /// Offending row index
        row: usize,
        /// Offending column index
        col: usize,
        /// Declared row count
        rows: usize,
        /// Declared column count
        cols: usize,
    },

    /// Filesystem failure while persisting or loading a matrix
    #[error("I/O failure at {path}: {reason}")]
    Io {
        /// Path involved in the failure
        path: String,
        /// Underlying I/O error text
        reason: String,
    },

    /// Persisted matrix data or metadata did not parse
    #[error("malformed matrix data in {path}: {reason}")]
    Format {
        /// Path of the offending file
        path: String,
        /// What failed to parse
        reason: String,
    },
}

/// Result type for harness operations
pub type Result<T> = std::result::Result<T, HarnessError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execution_phase_display() {
        assert_eq!(ExecutionPhase::Candidate.to_string(), "candidate");
        assert_eq!(ExecutionPhase::Oracle.to_string(), "oracle");
    }

    #[test]
    fn test_execution_failed_message_names_phase() {
        let err = HarnessError::ExecutionFailed {
            phase: ExecutionPhase::Oracle,
            cause: "exit status 1".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("oracle"));
        assert!(msg.contains("exit status 1"));
    }

    #[test]
    fn test_shape_mismatch_message_carries_both_shapes() {
        let err = HarnessError::ShapeMismatch {
            context: "comparator".to_string(),
            expected_rows: 4,
            expected_cols: 1,
            actual_rows: 3,
            actual_cols: 1,
        };
        let msg = err.to_string();
        assert!(msg.contains("4x1"));
        assert!(msg.contains("3x1"));
    }
}
