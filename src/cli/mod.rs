//! CLI command implementations
//!
//! Business logic for the `cotejar` commands, extracted from `main.rs` for
//! testability: report rendering is pure string building, and the handlers
//! return the suite verdict instead of exiting.

use std::fmt::Write as _;

use crate::scenario::{enumerate, SuiteOptions};
use crate::signature::top_operators;
use crate::suite::{Harness, ScenarioOutcome, SuiteReport};

/// Report output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// Machine-readable JSON
    Json,
}

impl OutputFormat {
    /// Parse a `--format` argument
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "table" => Some(Self::Table),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Run the full scenario matrix and print the report
///
/// Returns whether every scenario passed, so `main` can map the verdict to
/// the process exit status.
#[must_use]
pub fn handle_run(options: SuiteOptions, format: OutputFormat) -> bool {
    let report = Harness::new(options).run();
    match format {
        OutputFormat::Table => print!("{}", render_table(&report)),
        OutputFormat::Json => match serde_json::to_string_pretty(&report) {
            Ok(body) => println!("{body}"),
            Err(err) => eprintln!("report serialization failed: {err}"),
        },
    }
    report.all_passed()
}

/// Print the enumerated scenario matrix
pub fn handle_list(options: &SuiteOptions) {
    for (index, scenario) in enumerate(options).iter().enumerate() {
        println!("{:>2}  {}", index + 1, scenario.name);
    }
}

/// Print the version banner
pub fn handle_info() {
    println!("cotejar {}", crate::VERSION);
    println!("differential correctness harness for fused numeric kernels");
}

/// Render the suite report as an aligned table with failure detail
#[must_use]
pub fn render_table(report: &SuiteReport) -> String {
    let name_width = report
        .outcomes
        .iter()
        .map(|o| o.scenario.name.len())
        .max()
        .unwrap_or(8)
        .max("scenario".len());
    let mut out = String::new();
    let _ = writeln!(out, "{:<name_width$}  verdict  detail", "scenario");
    for outcome in &report.outcomes {
        let verdict = if outcome.passed { "PASS" } else { "FAIL" };
        let _ = writeln!(
            out,
            "{:<name_width$}  {verdict:<7}  {}",
            outcome.scenario.name,
            outcome_detail(outcome)
        );
        if let Some(reason) = &outcome.failure {
            if let crate::suite::FailureReason::ToleranceExceeded { sample, .. } = reason {
                for cell in sample {
                    let _ = writeln!(
                        out,
                        "{:name_width$}           cell ({},{}): expected {:e}, got {:e}",
                        "", cell.row, cell.col, cell.expected, cell.actual
                    );
                }
            }
        }
    }
    let _ = writeln!(out, "{}", report.summary());
    out
}

fn outcome_detail(outcome: &ScenarioOutcome) -> String {
    if let Some(reason) = &outcome.failure {
        return reason.to_string();
    }
    let mut detail = match &outcome.verdict {
        Some(v) => format!("max abs diff {:e}", v.max_abs_diff),
        None => String::new(),
    };
    match outcome.signature_fired {
        Some(true) => detail.push_str(", fused operator fired"),
        Some(false) if !outcome.signature_expected => {
            detail.push_str(", correctness-only (no fusion expected)");
        }
        _ => {}
    }
    detail
}

/// Render a statistics map as a heavy-hitters listing
#[must_use]
pub fn render_top_operators(statistics: &std::collections::BTreeMap<String, u64>) -> String {
    let mut out = String::new();
    for (rank, (name, count)) in top_operators(statistics, 10).into_iter().enumerate() {
        let _ = writeln!(out, "{:>2}. {name:<24} {count}", rank + 1);
    }
    out
}
