//! # Cotejar
//!
//! Cotejar (Spanish: "to collate, to check against") is a differential
//! correctness harness for a code-generating numeric compiler. It validates
//! that the optimized, auto-fused execution path of an iterative matrix
//! algorithm, a PageRank-style power iteration, produces numerically
//! equivalent results to a trusted reference implementation, across the
//! full cross-product of optimizer configurations, and that the fusion
//! under test actually fired.
//!
//! ## What a scenario checks
//!
//! 1. Deterministic input synthesis from fixed seeds
//! 2. Candidate execution (fused kernels, operator statistics collected)
//! 3. Oracle execution (general-purpose reference evaluation)
//! 4. Element-wise comparison within an absolute tolerance
//! 5. Fused-operator signature verification over the statistics
//!
//! Matching outputs alone are not enough: a scenario only passes when the
//! expected fused operator shows up in the runtime statistics, protecting
//! against results that are correct because fusion silently never engaged.
//!
//! ## Example
//!
//! ```rust
//! use cotejar::scenario::SuiteOptions;
//! use cotejar::suite::Harness;
//!
//! let options = SuiteOptions {
//!     rows: 32,
//!     cols: 32,
//!     ..SuiteOptions::default()
//! };
//! let report = Harness::new(options).run();
//! assert_eq!(report.outcomes.len(), 12);
//! assert!(report.all_passed(), "{}", report.summary());
//! ```
//!
//! ## Flag discipline
//!
//! Optimizer flags flow by value into the execution adapter; the
//! process-wide registry exists only for runtimes that read ambient state,
//! and every scenario applies it through a scoped guard that restores the
//! snapshot on every exit path, including panics. Scenarios therefore run
//! strictly sequentially; the registry lock is the mutual exclusion.

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
// Clippy allows (MUST come after deny/warn to override them)
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)] // Not all methods need #[must_use]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::cast_precision_loss)] // usize -> f64 for densities is fine
#![allow(clippy::float_cmp)] // Exact comparisons are deliberate in tests
#![allow(clippy::uninlined_format_args)] // Prefer explicit format args

/// Execution adapter: dual candidate/oracle runs over persisted inputs
pub mod adapter;
/// CLI command implementations (extracted for testability)
pub mod cli;
/// Element-wise approximate-equality comparison
pub mod compare;
/// Execution engines for the fixed power-iteration program
pub mod engine;
pub mod error;
/// Optimizer flag configuration and the process-wide flag registry
pub mod flags;
/// Persisted tabular matrix format with JSON metadata sidecars
pub mod io;
/// Sparse cell-map matrices and their synthesis specs
pub mod matrix;
/// Scenario model and configuration-matrix enumeration
pub mod scenario;
/// Optimization-signature verification over runtime statistics
pub mod signature;
/// Scenario orchestration and suite reporting
pub mod suite;
/// Deterministic test-matrix synthesis
pub mod synth;

// Re-exports for convenience
pub use error::{ExecutionPhase, HarnessError, Result};
pub use matrix::{MatrixPayload, MatrixSpec};
pub use scenario::{Backend, FusionProfile, Scenario, SuiteOptions};
pub use suite::{Harness, SuiteReport};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(VERSION.starts_with("0."));
        assert!(VERSION.contains('.'));
    }
}
