//! Execution engines for the fixed power-iteration program
//!
//! The harness talks to runtimes through the `KernelBackend` seam. Two
//! in-process engines ship with the crate: the fused engine stands in for
//! the numeric compiler's code-generated path and reports operator
//! invocation statistics; the reference engine evaluates the identical
//! program with general-purpose, un-fused operators and reports nothing.
//! An external process can substitute for either side via the adapter's
//! program runner.
//!
//! The program is fixed:
//!
//! ```text
//! repeat maxiter times:
//!     p <- alpha * (G %*% p) + (1 - alpha) * (e %*% (u %*% p))
//! ```
//!
//! where `u %*% p` is the dangling-mass correction scalar.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{HarnessError, Result};
use crate::flags::OptimizerFlags;
use crate::matrix::MatrixPayload;
use crate::scenario::Backend;
use crate::synth::PageRankInputs;

/// Scalar hyperparameters of the fixed algorithm
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerIterationProgram {
    /// Damping factor
    pub alpha: f64,
    /// Iteration count
    pub maxiter: u32,
}

/// Everything a backend needs for one run
#[derive(Debug)]
pub struct ExecutionRequest<'a> {
    /// Scalar hyperparameters
    pub program: PowerIterationProgram,
    /// Named input matrices
    pub inputs: &'a PageRankInputs,
    /// Optimizer configuration, passed by value rather than read from globals
    pub flags: OptimizerFlags,
    /// Execution backend (affects operator naming only)
    pub backend: Backend,
    /// Whether to collect operator invocation statistics
    pub collect_statistics: bool,
    /// Scenario-scoped directory holding the persisted inputs
    pub data_dir: &'a Path,
}

/// Output matrix plus runtime statistics
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    /// The final rank vector
    pub output: MatrixPayload,
    /// Operator name -> invocation count; empty unless statistics were
    /// requested and the backend collects them
    pub statistics: BTreeMap<String, u64>,
}

/// Seam between the harness and a runtime that can execute the program
pub trait KernelBackend {
    /// Identifier for logs and failure reports
    fn name(&self) -> &'static str;

    /// Execute the program to completion, blocking
    ///
    /// # Errors
    ///
    /// Returns an error when inputs are structurally incompatible with the
    /// program or the runtime terminates abnormally.
    fn execute(&self, request: &ExecutionRequest<'_>) -> Result<ExecutionResult>;
}

// ============================================================================
// Shared input validation and vector views
// ============================================================================

struct ProgramInputs {
    rows: usize,
    links: Vec<(usize, usize, f64)>,
    p: Vec<f64>,
    e: Vec<f64>,
    u: Vec<f64>,
}

/// Validate shapes and lower the cell maps to iteration-friendly vectors.
///
/// The link triplets keep row-major order so both engines accumulate dot
/// products in the same sequence; differential diffs then reflect operator
/// structure, not summation order.
fn lower_inputs(inputs: &PageRankInputs, maxiter: u32) -> Result<ProgramInputs> {
    let (rows, cols) = inputs.g.shape();
    if maxiter > 1 && rows != cols {
        return Err(HarnessError::ShapeMismatch {
            context: "iterated link matrix must be square".to_string(),
            expected_rows: rows,
            expected_cols: rows,
            actual_rows: rows,
            actual_cols: cols,
        });
    }
    check_shape("rank vector p", &inputs.p, cols, 1)?;
    check_shape("teleportation vector e", &inputs.e, rows, 1)?;
    check_shape("dangling-mass vector u", &inputs.u, 1, cols)?;

    let mut p = vec![0.0; cols];
    for (r, _, v) in inputs.p.cells() {
        p[r] = v;
    }
    let mut e = vec![0.0; rows];
    for (r, _, v) in inputs.e.cells() {
        e[r] = v;
    }
    let mut u = vec![0.0; cols];
    for (_, c, v) in inputs.u.cells() {
        u[c] = v;
    }
    Ok(ProgramInputs {
        rows,
        links: inputs.g.cells().collect(),
        p,
        e,
        u,
    })
}

fn check_shape(context: &str, m: &MatrixPayload, rows: usize, cols: usize) -> Result<()> {
    if m.shape() != (rows, cols) {
        return Err(HarnessError::ShapeMismatch {
            context: context.to_string(),
            expected_rows: rows,
            expected_cols: cols,
            actual_rows: m.rows(),
            actual_cols: m.cols(),
        });
    }
    Ok(())
}

fn to_payload(values: &[f64]) -> Result<MatrixPayload> {
    let mut out = MatrixPayload::new(values.len(), 1);
    for (i, &v) in values.iter().enumerate() {
        out.set(i, 0, v)?;
    }
    Ok(out)
}

fn op_name(backend: Backend, base: &str) -> String {
    match backend {
        Backend::Local => base.to_string(),
        Backend::Distributed => format!("sp_{base}"),
    }
}

fn bump(stats: &mut BTreeMap<String, u64>, name: String, by: u64) {
    *stats.entry(name).or_insert(0) += by;
}

// ============================================================================
// Fused engine (candidate)
// ============================================================================

/// Candidate engine: the code-generated, auto-fused execution path
///
/// With `operator_fusion` enabled the whole update runs as a single
/// row-aggregate kernel per iteration, reported as `spoofRA` (or
/// `sp_spoofRA` on the distributed backend). With fusion disabled it falls
/// back to the elementary operators and reports those instead, so the
/// signature verifier can observe that fusion did not engage.
#[derive(Debug, Default)]
pub struct FusedKernelEngine;

impl KernelBackend for FusedKernelEngine {
    fn name(&self) -> &'static str {
        "fused-codegen"
    }

    fn execute(&self, request: &ExecutionRequest<'_>) -> Result<ExecutionResult> {
        let program = request.program;
        let mut inputs = lower_inputs(request.inputs, program.maxiter)?;
        let mut stats = BTreeMap::new();

        for _ in 0..program.maxiter {
            let mut gp = vec![0.0; inputs.rows];
            for &(r, c, v) in &inputs.links {
                gp[r] += v * inputs.p[c];
            }
            let mut up = 0.0;
            for (c, &uv) in inputs.u.iter().enumerate() {
                up += uv * inputs.p[c];
            }
            // One fused pass over the output rows: scale, correct, combine.
            let mut next = vec![0.0; inputs.rows];
            for i in 0..inputs.rows {
                next[i] = program.alpha * gp[i] + (1.0 - program.alpha) * (inputs.e[i] * up);
            }
            inputs.p = next;
            if request.collect_statistics {
                if request.flags.operator_fusion {
                    bump(&mut stats, op_name(request.backend, "spoofRA"), 1);
                } else {
                    bump(&mut stats, op_name(request.backend, "ba+*"), 3);
                    bump(&mut stats, op_name(request.backend, "*"), 2);
                    bump(&mut stats, op_name(request.backend, "+"), 1);
                }
            }
        }

        Ok(ExecutionResult {
            output: to_payload(&inputs.p)?,
            statistics: stats,
        })
    }
}

// ============================================================================
// Reference engine (oracle)
// ============================================================================

/// Oracle engine: general-purpose, un-fused evaluation of the same program
///
/// Every intermediate is materialized the way a straightforward interpreter
/// would. No statistics are collected; the oracle's only contribution is the
/// trusted output matrix.
#[derive(Debug, Default)]
pub struct ReferenceEngine;

impl KernelBackend for ReferenceEngine {
    fn name(&self) -> &'static str {
        "reference"
    }

    fn execute(&self, request: &ExecutionRequest<'_>) -> Result<ExecutionResult> {
        let program = request.program;
        let mut inputs = lower_inputs(request.inputs, program.maxiter)?;

        for _ in 0..program.maxiter {
            // t1 = G %*% p
            let mut t1 = vec![0.0; inputs.rows];
            for &(r, c, v) in &inputs.links {
                t1[r] += v * inputs.p[c];
            }
            // t2 = alpha * t1
            let t2: Vec<f64> = t1.iter().map(|&x| program.alpha * x).collect();
            // s = u %*% p
            let mut s = 0.0;
            for (c, &uv) in inputs.u.iter().enumerate() {
                s += uv * inputs.p[c];
            }
            // t3 = e %*% s, t4 = (1 - alpha) * t3
            let t3: Vec<f64> = inputs.e.iter().map(|&ev| ev * s).collect();
            let t4: Vec<f64> = t3.iter().map(|&x| (1.0 - program.alpha) * x).collect();
            // p = t2 + t4
            inputs.p = t2.iter().zip(&t4).map(|(&a, &b)| a + b).collect();
        }

        Ok(ExecutionResult {
            output: to_payload(&inputs.p)?,
            statistics: BTreeMap::new(),
        })
    }
}
