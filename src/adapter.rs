//! Execution adapter: dual candidate/oracle runs over persisted inputs
//!
//! The adapter owns the scenario-scoped scratch directory: inputs are
//! persisted once, read back through the tabular format, fed to both
//! engines, and each engine's output matrix round-trips through the same
//! format before comparison. The scratch directory is dropped when the run
//! finishes, so nothing leaks into the next scenario.
//!
//! The module also carries the external program boundary: a flat ordered
//! argument list around a spawned process, with non-zero exit mapped to a
//! typed execution failure.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

use crate::engine::{
    ExecutionRequest, ExecutionResult, FusedKernelEngine, KernelBackend, PowerIterationProgram,
    ReferenceEngine,
};
use crate::error::{ExecutionPhase, HarnessError, Result};
use crate::io::{read_matrix, write_matrix};
use crate::scenario::{Backend, Scenario};
use crate::synth::PageRankInputs;

/// Candidate and oracle outputs of one scenario
#[derive(Debug)]
pub struct DifferentialRun {
    /// Result of the optimized path under test
    pub candidate: ExecutionResult,
    /// Result of the trusted reference path
    pub oracle: ExecutionResult,
}

/// Runs the candidate and oracle paths for a scenario
pub struct ExecutionAdapter {
    program: PowerIterationProgram,
    candidate: Box<dyn KernelBackend>,
    oracle: Box<dyn KernelBackend>,
}

impl ExecutionAdapter {
    /// Adapter over the built-in fused and reference engines
    #[must_use]
    pub fn new(program: PowerIterationProgram) -> Self {
        Self::with_backends(
            program,
            Box::new(FusedKernelEngine),
            Box::new(ReferenceEngine),
        )
    }

    /// Adapter over caller-supplied backends (e.g. external processes)
    #[must_use]
    pub fn with_backends(
        program: PowerIterationProgram,
        candidate: Box<dyn KernelBackend>,
        oracle: Box<dyn KernelBackend>,
    ) -> Self {
        Self {
            program,
            candidate,
            oracle,
        }
    }

    /// Execute candidate then oracle over identical persisted inputs
    ///
    /// Both executions are blocking; the oracle starts only after the
    /// candidate has run to completion, and comparison input is only
    /// available once both are done.
    ///
    /// # Errors
    ///
    /// Returns `HarnessError::ExecutionFailed` tagged with the failing
    /// phase, or an I/O error when the scratch space cannot be prepared.
    pub fn execute_pair(
        &self,
        scenario: &Scenario,
        inputs: &PageRankInputs,
    ) -> Result<DifferentialRun> {
        let scratch = TempDir::new().map_err(|e| HarnessError::Io {
            path: "scenario scratch".to_string(),
            reason: e.to_string(),
        })?;
        let input_dir = scratch.path().join("input");
        std::fs::create_dir_all(&input_dir).map_err(|e| HarnessError::Io {
            path: input_dir.display().to_string(),
            reason: e.to_string(),
        })?;
        for (name, matrix) in inputs.named() {
            write_matrix(&input_dir, name, matrix)?;
        }
        // Both paths consume the persisted copies, not the in-memory
        // originals; the tabular format is genuinely on the data path.
        let loaded = PageRankInputs {
            g: read_matrix(&input_dir, "G")?,
            p: read_matrix(&input_dir, "p")?,
            e: read_matrix(&input_dir, "e")?,
            u: read_matrix(&input_dir, "u")?,
        };

        let candidate = self.run_phase(
            ExecutionPhase::Candidate,
            self.candidate.as_ref(),
            &ExecutionRequest {
                program: self.program,
                inputs: &loaded,
                flags: scenario.optimizer_flags(),
                backend: scenario.backend,
                collect_statistics: true,
                data_dir: &input_dir,
            },
            scratch.path(),
        )?;
        let oracle = self.run_phase(
            ExecutionPhase::Oracle,
            self.oracle.as_ref(),
            &ExecutionRequest {
                program: self.program,
                inputs: &loaded,
                flags: crate::flags::OptimizerFlags::ENABLED,
                backend: Backend::Local,
                collect_statistics: false,
                data_dir: &input_dir,
            },
            scratch.path(),
        )?;
        Ok(DifferentialRun { candidate, oracle })
    }

    fn run_phase(
        &self,
        phase: ExecutionPhase,
        backend: &dyn KernelBackend,
        request: &ExecutionRequest<'_>,
        scratch: &Path,
    ) -> Result<ExecutionResult> {
        let result = backend.execute(request).map_err(|e| {
            HarnessError::ExecutionFailed {
                phase,
                cause: format!("{}: {e}", backend.name()),
            }
        })?;
        // Round-trip the output through the persisted format, the same way
        // the real runtimes hand results back.
        let out_dir = scratch.join(phase.to_string());
        std::fs::create_dir_all(&out_dir).map_err(|e| HarnessError::Io {
            path: out_dir.display().to_string(),
            reason: e.to_string(),
        })?;
        write_matrix(&out_dir, "p", &result.output)?;
        let output = read_matrix(&out_dir, "p")?;
        Ok(ExecutionResult {
            output,
            statistics: result.statistics,
        })
    }
}

// ============================================================================
// External program boundary
// ============================================================================

/// A program identity plus its flat ordered argument list
///
/// Argument order is the fixed contract of the algorithm script: the four
/// input matrix locations, `alpha`, `maxiter`, the output location, then
/// the statistics switch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramInvocation {
    /// Path of the program to spawn
    pub program: PathBuf,
    /// Ordered argument list
    pub args: Vec<String>,
}

impl ProgramInvocation {
    /// Invocation for the fixed power-iteration script
    #[must_use]
    pub fn power_iteration(
        program: PathBuf,
        input_dir: &Path,
        params: PowerIterationProgram,
        output_dir: &Path,
        collect_statistics: bool,
    ) -> Self {
        let mut args = vec![
            input_dir.join("G").display().to_string(),
            input_dir.join("p").display().to_string(),
            input_dir.join("e").display().to_string(),
            input_dir.join("u").display().to_string(),
            params.alpha.to_string(),
            params.maxiter.to_string(),
            output_dir.join("p").display().to_string(),
        ];
        if collect_statistics {
            args.push("-stats".to_string());
        }
        Self { program, args }
    }

    /// Spawn the program and wait for it, returning captured stdout
    ///
    /// # Errors
    ///
    /// Returns `HarnessError::ExecutionFailed` (tagged with `phase`) when
    /// the program cannot be spawned or exits non-zero; stderr is folded
    /// into the cause.
    pub fn run(&self, phase: ExecutionPhase) -> Result<String> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .output()
            .map_err(|e| HarnessError::ExecutionFailed {
                phase,
                cause: format!("failed to spawn {}: {e}", self.program.display()),
            })?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(HarnessError::ExecutionFailed {
                phase,
                cause: format!("{} ({})", output.status, stderr.trim()),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Parse operator statistics from a runtime's stdout
///
/// The runtime prints `<operator> <count>` pairs in its statistics block;
/// any line that is exactly two fields with an integer second field counts.
/// Deliberately loose: this mirrors the runtime's free-text statistics
/// surface rather than a stable machine contract.
#[must_use]
pub fn parse_statistics(stdout: &str) -> BTreeMap<String, u64> {
    let mut stats = BTreeMap::new();
    for line in stdout.lines() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if let [name, count] = fields.as_slice() {
            if let Ok(count) = count.parse::<u64>() {
                *stats.entry((*name).to_string()).or_insert(0) += count;
            }
        }
    }
    stats
}

/// Backend that delegates to an external program over the persisted format
///
/// Inputs are expected at the request's data directory (the adapter puts
/// them there); the program writes its output matrix next to them and the
/// backend loads it back.
#[derive(Debug)]
pub struct ExternalProgramBackend {
    /// Program to spawn for each execution
    pub program_path: PathBuf,
    /// Phase this backend plays, for failure tagging
    pub phase: ExecutionPhase,
}

impl KernelBackend for ExternalProgramBackend {
    fn name(&self) -> &'static str {
        "external-program"
    }

    fn execute(&self, request: &ExecutionRequest<'_>) -> Result<ExecutionResult> {
        let out_dir = request.data_dir.join("external-out");
        std::fs::create_dir_all(&out_dir).map_err(|e| HarnessError::Io {
            path: out_dir.display().to_string(),
            reason: e.to_string(),
        })?;
        let invocation = ProgramInvocation::power_iteration(
            self.program_path.clone(),
            request.data_dir,
            request.program,
            &out_dir,
            request.collect_statistics,
        );
        let stdout = invocation.run(self.phase)?;
        let statistics = if request.collect_statistics {
            parse_statistics(&stdout)
        } else {
            BTreeMap::new()
        };
        Ok(ExecutionResult {
            output: read_matrix(&out_dir, "p")?,
            statistics,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::scenario::FusionProfile;

    use super::*;

    fn program() -> PowerIterationProgram {
        PowerIterationProgram {
            alpha: 0.85,
            maxiter: 3,
        }
    }

    #[test]
    fn test_execute_pair_runs_both_paths() {
        let scenario = Scenario::new(true, false, Backend::Local, FusionProfile::Default);
        let inputs = PageRankInputs::synthesize(8, 8, 0.5).unwrap();
        let run = ExecutionAdapter::new(program())
            .execute_pair(&scenario, &inputs)
            .unwrap();
        assert_eq!(run.candidate.output.shape(), (8, 1));
        assert_eq!(run.oracle.output.shape(), (8, 1));
        assert!(run.candidate.statistics.contains_key("spoofRA"));
        assert!(run.oracle.statistics.is_empty());
    }

    #[test]
    fn test_candidate_failure_is_tagged_with_phase() {
        struct Failing;
        impl KernelBackend for Failing {
            fn name(&self) -> &'static str {
                "failing"
            }
            fn execute(&self, _request: &ExecutionRequest<'_>) -> Result<ExecutionResult> {
                Err(HarnessError::ExecutionFailed {
                    phase: ExecutionPhase::Candidate,
                    cause: "synthetic crash".to_string(),
                })
            }
        }
        let scenario = Scenario::new(true, false, Backend::Local, FusionProfile::Default);
        let inputs = PageRankInputs::synthesize(4, 4, 1.0).unwrap();
        let adapter = ExecutionAdapter::with_backends(
            program(),
            Box::new(Failing),
            Box::new(ReferenceEngine),
        );
        let err = adapter.execute_pair(&scenario, &inputs).unwrap_err();
        match err {
            HarnessError::ExecutionFailed { phase, cause } => {
                assert_eq!(phase, ExecutionPhase::Candidate);
                assert!(cause.contains("failing"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invocation_argument_order() {
        let inv = ProgramInvocation::power_iteration(
            PathBuf::from("/opt/runtime"),
            Path::new("/tmp/in"),
            program(),
            Path::new("/tmp/out"),
            true,
        );
        assert_eq!(inv.args.len(), 8);
        assert!(inv.args[0].ends_with("G"));
        assert!(inv.args[3].ends_with("u"));
        assert_eq!(inv.args[4], "0.85");
        assert_eq!(inv.args[5], "3");
        assert!(inv.args[6].ends_with("p"));
        assert_eq!(inv.args[7], "-stats");
    }

    #[test]
    fn test_invocation_without_stats_flag() {
        let inv = ProgramInvocation::power_iteration(
            PathBuf::from("/opt/runtime"),
            Path::new("/tmp/in"),
            program(),
            Path::new("/tmp/out"),
            false,
        );
        assert_eq!(inv.args.len(), 7);
    }

    #[test]
    fn test_missing_program_maps_to_execution_failed() {
        let inv = ProgramInvocation {
            program: PathBuf::from("/nonexistent/candidate-runtime"),
            args: vec![],
        };
        let err = inv.run(ExecutionPhase::Oracle).unwrap_err();
        assert!(matches!(
            err,
            HarnessError::ExecutionFailed {
                phase: ExecutionPhase::Oracle,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_statistics_extracts_counter_lines() {
        let stdout = "\
compiling program\n\
statistics:\n\
spoofRA 10\n\
ba+* 4\n\
done in 1.2s\n";
        let stats = parse_statistics(stdout);
        assert_eq!(stats.get("spoofRA"), Some(&10));
        assert_eq!(stats.get("ba+*"), Some(&4));
        assert!(!stats.contains_key("done"));
    }
}
