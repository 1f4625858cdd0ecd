//! Persisted tabular matrix format
//!
//! Matrices cross the candidate/oracle process boundary as text cell
//! triplets (`row col value`, 1-based indices) next to a JSON metadata
//! sidecar `<name>.mtd` carrying the declared dimensions and a sparsity
//! hint. Reads validate every cell against the sidecar, and the stored cell
//! count must match, so truncated or duplicated cell files never load
//! silently.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{HarnessError, Result};
use crate::matrix::MatrixPayload;

/// Metadata sidecar for a persisted matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixMetadata {
    /// Declared row count
    pub rows: usize,
    /// Declared column count
    pub cols: usize,
    /// Number of persisted cells
    pub nnz: usize,
    /// Sparsity hint for the loading runtime
    pub sparse: bool,
}

fn io_err(path: &Path, err: &std::io::Error) -> HarnessError {
    HarnessError::Io {
        path: path.display().to_string(),
        reason: err.to_string(),
    }
}

fn format_err(path: &Path, reason: impl Into<String>) -> HarnessError {
    HarnessError::Format {
        path: path.display().to_string(),
        reason: reason.into(),
    }
}

/// Persist a matrix with its metadata sidecar under `dir/name`
///
/// # Errors
///
/// Returns `HarnessError::Io` when the files cannot be written.
pub fn write_matrix(dir: &Path, name: &str, matrix: &MatrixPayload) -> Result<()> {
    let data_path = dir.join(name);
    let file = File::create(&data_path).map_err(|e| io_err(&data_path, &e))?;
    let mut writer = BufWriter::new(file);
    for (row, col, value) in matrix.cells() {
        writeln!(writer, "{} {} {}", row + 1, col + 1, value)
            .map_err(|e| io_err(&data_path, &e))?;
    }
    writer.flush().map_err(|e| io_err(&data_path, &e))?;

    let meta = MatrixMetadata {
        rows: matrix.rows(),
        cols: matrix.cols(),
        nnz: matrix.nnz(),
        sparse: matrix.nnz() < matrix.rows() * matrix.cols(),
    };
    let meta_path = dir.join(format!("{name}.mtd"));
    let body = serde_json::to_string_pretty(&meta)
        .map_err(|e| format_err(&meta_path, e.to_string()))?;
    std::fs::write(&meta_path, body).map_err(|e| io_err(&meta_path, &e))?;
    Ok(())
}

/// Load a matrix persisted by [`write_matrix`]
///
/// # Errors
///
/// Returns `HarnessError::Io` for unreadable files and
/// `HarnessError::Format` for malformed triplets, out-of-range indices,
/// duplicate cells, or a cell count disagreeing with the sidecar.
pub fn read_matrix(dir: &Path, name: &str) -> Result<MatrixPayload> {
    let meta_path = dir.join(format!("{name}.mtd"));
    let meta_body = std::fs::read_to_string(&meta_path).map_err(|e| io_err(&meta_path, &e))?;
    let meta: MatrixMetadata = serde_json::from_str(&meta_body)
        .map_err(|e| format_err(&meta_path, e.to_string()))?;

    let data_path = dir.join(name);
    let file = File::open(&data_path).map_err(|e| io_err(&data_path, &e))?;
    let mut matrix = MatrixPayload::new(meta.rows, meta.cols);
    for (line_no, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|e| io_err(&data_path, &e))?;
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        let (row, col, value) = match fields.as_slice() {
            [r, c, v] => (*r, *c, *v),
            _ => {
                return Err(format_err(
                    &data_path,
                    format!("line {}: expected `row col value`", line_no + 1),
                ))
            }
        };
        let row: usize = row
            .parse()
            .map_err(|_| format_err(&data_path, format!("line {}: bad row index", line_no + 1)))?;
        let col: usize = col
            .parse()
            .map_err(|_| format_err(&data_path, format!("line {}: bad col index", line_no + 1)))?;
        let value: f64 = value
            .parse()
            .map_err(|_| format_err(&data_path, format!("line {}: bad value", line_no + 1)))?;
        if row == 0 || col == 0 {
            return Err(format_err(
                &data_path,
                format!("line {}: indices are 1-based", line_no + 1),
            ));
        }
        let (r, c) = (row - 1, col - 1);
        if r >= meta.rows || c >= meta.cols {
            return Err(format_err(
                &data_path,
                format!(
                    "line {}: cell ({row},{col}) outside {}x{}",
                    line_no + 1,
                    meta.rows,
                    meta.cols
                ),
            ));
        }
        let before = matrix.nnz();
        matrix.set(r, c, value)?;
        if matrix.nnz() == before {
            return Err(format_err(
                &data_path,
                format!("line {}: duplicate cell ({row},{col})", line_no + 1),
            ));
        }
    }
    if matrix.nnz() != meta.nnz {
        return Err(format_err(
            &data_path,
            format!("cell count {} disagrees with sidecar nnz {}", matrix.nnz(), meta.nnz),
        ));
    }
    Ok(matrix)
}
