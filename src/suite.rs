//! Scenario orchestration and suite reporting
//!
//! Drives every scenario of the configuration matrix to completion: apply
//! optimizer flags through the restoring guard, synthesize inputs, execute
//! candidate and oracle, compare, verify the optimization signature, and
//! fold any failure into the scenario's outcome record. One scenario's
//! failure never aborts the suite; only the flag registry itself is
//! unrecoverable.

use std::fmt;

use serde::Serialize;

use crate::adapter::ExecutionAdapter;
use crate::compare::{compare, CellMismatch, ComparisonVerdict};
use crate::engine::PowerIterationProgram;
use crate::error::HarnessError;
use crate::flags::GlobalFlags;
use crate::scenario::{enumerate, Scenario, SuiteOptions};
use crate::signature::{signature_fired, FUSED_ROWAGG_SIGNATURES};
use crate::synth::PageRankInputs;

// ============================================================================
// Scenario lifecycle
// ============================================================================

/// Lifecycle of one scenario run
///
/// Flags are restored on every exit path, so `FlagsRestored` is the
/// terminal state of every completed record regardless of verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScenarioState {
    /// Not started
    Pending,
    /// Optimizer flags applied via the scoped guard
    FlagsApplied,
    /// Synthesizing input matrices
    Synthesizing,
    /// Candidate path executing
    ExecutingCandidate,
    /// Oracle path executing
    ExecutingOracle,
    /// Comparing outputs
    Comparing,
    /// Checking the fused-operator signature
    VerifyingSignature,
    /// All checks passed
    Passed,
    /// At least one check failed
    Failed,
    /// Flag snapshot written back
    FlagsRestored,
}

/// Why a scenario failed
#[derive(Debug, Clone, Serialize)]
pub enum FailureReason {
    /// The input spec was rejected before synthesis
    InvalidSpec {
        /// Rejection detail
        reason: String,
    },
    /// Candidate or oracle terminated abnormally
    ExecutionFailed {
        /// `candidate` or `oracle`
        phase: String,
        /// Underlying cause
        cause: String,
    },
    /// Candidate and oracle outputs are structurally incompatible.
    /// Reported with highest severity: a contract violation rather than
    /// numeric drift
    ShapeMismatch {
        /// Mismatch detail
        detail: String,
    },
    /// Outputs differ beyond the absolute tolerance
    ToleranceExceeded {
        /// Largest observed difference
        max_abs_diff: f64,
        /// The tolerance that was exceeded
        tolerance: f64,
        /// Total offending cells
        mismatch_count: usize,
        /// First offending cells for diagnosis
        sample: Vec<CellMismatch>,
    },
    /// The expected fused operator never appeared in the statistics
    SignatureMissing {
        /// Substrings that were searched for
        expected: Vec<String>,
        /// Operator names that were actually observed
        observed: Vec<String>,
    },
    /// Harness-side fault (scratch I/O, persisted-format corruption)
    Internal {
        /// Fault detail
        detail: String,
    },
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::InvalidSpec { reason } => write!(f, "invalid spec: {reason}"),
            FailureReason::ExecutionFailed { phase, cause } => {
                write!(f, "{phase} execution failed: {cause}")
            }
            FailureReason::ShapeMismatch { detail } => {
                write!(f, "CONTRACT VIOLATION, {detail}")
            }
            FailureReason::ToleranceExceeded {
                max_abs_diff,
                tolerance,
                mismatch_count,
                ..
            } => write!(
                f,
                "max abs diff {max_abs_diff:e} exceeds tolerance {tolerance} \
                 ({mismatch_count} cells over)"
            ),
            FailureReason::SignatureMissing { expected, observed } => write!(
                f,
                "no operator matching {expected:?} in statistics (observed: {observed:?})"
            ),
            FailureReason::Internal { detail } => write!(f, "harness fault: {detail}"),
        }
    }
}

impl From<HarnessError> for FailureReason {
    fn from(err: HarnessError) -> Self {
        match err {
            HarnessError::InvalidSpec { reason } => FailureReason::InvalidSpec { reason },
            HarnessError::ExecutionFailed { phase, cause } => FailureReason::ExecutionFailed {
                phase: phase.to_string(),
                cause,
            },
            HarnessError::ShapeMismatch { .. } => FailureReason::ShapeMismatch {
                detail: err.to_string(),
            },
            other => FailureReason::Internal {
                detail: other.to_string(),
            },
        }
    }
}

/// One scenario plus the input geometry it runs at
///
/// Geometry normally comes from the suite options; tests inject malformed
/// geometry here to exercise per-scenario isolation.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioCase {
    /// The scenario configuration
    pub scenario: Scenario,
    /// Link matrix rows
    pub rows: usize,
    /// Link matrix columns
    pub cols: usize,
}

/// Completed record of one scenario
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioOutcome {
    /// The scenario that ran
    pub scenario: Scenario,
    /// Overall verdict
    pub passed: bool,
    /// Populated when `passed` is false
    pub failure: Option<FailureReason>,
    /// Verdict state: `Passed` or `Failed`
    pub state: ScenarioState,
    /// States traversed, ending `... -> Passed|Failed -> FlagsRestored`;
    /// an aborted run's trace stops at the stage that failed
    pub trace: Vec<ScenarioState>,
    /// Comparison detail, when the run got that far
    pub verdict: Option<ComparisonVerdict>,
    /// Whether this scenario required the fused-operator signature
    pub signature_expected: bool,
    /// Whether the signature was observed, when the run got that far
    pub signature_fired: Option<bool>,
    /// Whether the flag snapshot was verified restored after the run
    pub flags_restored: bool,
}

// ============================================================================
// Harness
// ============================================================================

struct Evaluation {
    failure: Option<FailureReason>,
    verdict: Option<ComparisonVerdict>,
    signature_fired: Option<bool>,
}

impl Evaluation {
    fn failed(reason: FailureReason) -> Self {
        Self {
            failure: Some(reason),
            verdict: None,
            signature_fired: None,
        }
    }
}

/// Drives the scenario matrix and aggregates outcomes
#[derive(Debug, Clone)]
pub struct Harness {
    options: SuiteOptions,
}

impl Harness {
    /// Harness over the given suite options
    #[must_use]
    pub fn new(options: SuiteOptions) -> Self {
        Self { options }
    }

    /// The suite options in effect
    #[must_use]
    pub fn options(&self) -> &SuiteOptions {
        &self.options
    }

    /// Scalar hyperparameters handed to both execution paths
    #[must_use]
    pub fn program(&self) -> PowerIterationProgram {
        PowerIterationProgram {
            alpha: self.options.alpha,
            maxiter: self.options.maxiter,
        }
    }

    /// The enumerated configuration matrix at the suite geometry
    #[must_use]
    pub fn default_cases(&self) -> Vec<ScenarioCase> {
        enumerate(&self.options)
            .into_iter()
            .map(|scenario| ScenarioCase {
                scenario,
                rows: self.options.rows,
                cols: self.options.cols,
            })
            .collect()
    }

    /// Run the full configuration matrix
    #[must_use]
    pub fn run(&self) -> SuiteReport {
        self.run_cases(&self.default_cases())
    }

    /// Run an explicit list of cases, strictly sequentially
    ///
    /// Scenarios share the process-wide flag registry, so they are never
    /// run concurrently; each case's outcome is independent of the others.
    #[must_use]
    pub fn run_cases(&self, cases: &[ScenarioCase]) -> SuiteReport {
        let adapter = ExecutionAdapter::new(self.program());
        let outcomes = cases
            .iter()
            .map(|case| self.run_case_with_adapter(case, &adapter))
            .collect();
        SuiteReport { outcomes }
    }

    /// Run one case with the default engines
    #[must_use]
    pub fn run_case(&self, case: &ScenarioCase) -> ScenarioOutcome {
        self.run_case_with_adapter(case, &ExecutionAdapter::new(self.program()))
    }

    /// Run one case over a caller-supplied adapter
    ///
    /// Flags are applied before any other work and verifiably restored
    /// afterward on every exit path, including panics.
    #[must_use]
    pub fn run_case_with_adapter(
        &self,
        case: &ScenarioCase,
        adapter: &ExecutionAdapter,
    ) -> ScenarioOutcome {
        let mut trace = vec![ScenarioState::Pending];
        let flags_before = GlobalFlags::current();
        let evaluation = {
            let _guard = GlobalFlags::apply(case.scenario.optimizer_flags());
            trace.push(ScenarioState::FlagsApplied);
            self.evaluate(case, adapter, &mut trace)
        };
        let state = if evaluation.failure.is_none() {
            ScenarioState::Passed
        } else {
            ScenarioState::Failed
        };
        trace.push(state);
        let flags_restored = GlobalFlags::current() == flags_before;
        trace.push(ScenarioState::FlagsRestored);
        ScenarioOutcome {
            scenario: case.scenario.clone(),
            passed: evaluation.failure.is_none(),
            failure: evaluation.failure,
            state,
            trace,
            verdict: evaluation.verdict,
            signature_expected: case.scenario.requires_signature(),
            signature_fired: evaluation.signature_fired,
            flags_restored,
        }
    }

    fn evaluate(
        &self,
        case: &ScenarioCase,
        adapter: &ExecutionAdapter,
        trace: &mut Vec<ScenarioState>,
    ) -> Evaluation {
        let scenario = &case.scenario;

        trace.push(ScenarioState::Synthesizing);
        let inputs = match PageRankInputs::synthesize(
            case.rows,
            case.cols,
            self.options.density(scenario.sparse),
        ) {
            Ok(inputs) => inputs,
            Err(err) => return Evaluation::failed(err.into()),
        };

        trace.push(ScenarioState::ExecutingCandidate);
        let run = match adapter.execute_pair(scenario, &inputs) {
            Ok(run) => {
                trace.push(ScenarioState::ExecutingOracle);
                run
            }
            Err(err) => {
                if matches!(
                    &err,
                    HarnessError::ExecutionFailed {
                        phase: crate::error::ExecutionPhase::Oracle,
                        ..
                    }
                ) {
                    trace.push(ScenarioState::ExecutingOracle);
                }
                return Evaluation::failed(err.into());
            }
        };

        trace.push(ScenarioState::Comparing);
        let verdict = match compare(
            &run.candidate.output,
            &run.oracle.output,
            self.options.abs_tolerance,
        ) {
            Ok(verdict) => verdict,
            Err(err) => return Evaluation::failed(err.into()),
        };
        if !verdict.passed {
            let reason = FailureReason::ToleranceExceeded {
                max_abs_diff: verdict.max_abs_diff,
                tolerance: self.options.abs_tolerance,
                mismatch_count: verdict.mismatch_count,
                sample: verdict.mismatches.clone(),
            };
            return Evaluation {
                failure: Some(reason),
                verdict: Some(verdict),
                signature_fired: None,
            };
        }

        trace.push(ScenarioState::VerifyingSignature);
        let fired = signature_fired(&run.candidate.statistics, FUSED_ROWAGG_SIGNATURES);
        if scenario.requires_signature() && !fired {
            let reason = FailureReason::SignatureMissing {
                expected: FUSED_ROWAGG_SIGNATURES
                    .iter()
                    .map(ToString::to_string)
                    .collect(),
                observed: run.candidate.statistics.keys().cloned().collect(),
            };
            return Evaluation {
                failure: Some(reason),
                verdict: Some(verdict),
                signature_fired: Some(fired),
            };
        }

        Evaluation {
            failure: None,
            verdict: Some(verdict),
            signature_fired: Some(fired),
        }
    }
}

// ============================================================================
// Suite report
// ============================================================================

/// Aggregated outcomes of one suite run
#[derive(Debug, Clone, Serialize)]
pub struct SuiteReport {
    /// Per-scenario records, in execution order
    pub outcomes: Vec<ScenarioOutcome>,
}

impl SuiteReport {
    /// Whether every scenario passed
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.outcomes.iter().all(|o| o.passed)
    }

    /// Number of passed scenarios
    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.passed).count()
    }

    /// Number of failed scenarios
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.outcomes.len() - self.passed_count()
    }

    /// One-line summary for logs and exit messages
    #[must_use]
    pub fn summary(&self) -> String {
        if self.all_passed() {
            format!("{}/{} scenarios passed", self.passed_count(), self.outcomes.len())
        } else {
            let failed: Vec<&str> = self
                .outcomes
                .iter()
                .filter(|o| !o.passed)
                .map(|o| o.scenario.name.as_str())
                .collect();
            format!(
                "{}/{} failed: {}",
                self.failed_count(),
                self.outcomes.len(),
                failed.join(", ")
            )
        }
    }
}
