//! Scenario isolation: one failure never takes the suite down
//!
//! A malformed input spec in the middle of a suite must fail exactly that
//! scenario, with the invalid-spec reason recorded, while every other
//! scenario runs and reports independently, and every scenario, failed or
//! not, must leave the flag registry as it found it.

use serial_test::serial;

use cotejar::flags::GlobalFlags;
use cotejar::scenario::{Backend, FusionProfile, Scenario, SuiteOptions};
use cotejar::suite::{FailureReason, Harness, ScenarioCase};

fn small_options() -> SuiteOptions {
    SuiteOptions {
        rows: 12,
        cols: 12,
        ..SuiteOptions::default()
    }
}

#[test]
#[serial(optimizer_flags)]
fn test_malformed_spec_fails_only_its_own_scenario() {
    let before = GlobalFlags::current();
    let options = small_options();
    let harness = Harness::new(options);

    let mut cases: Vec<ScenarioCase> = vec![
        Scenario::new(true, false, Backend::Local, FusionProfile::Default),
        Scenario::new(true, true, Backend::Local, FusionProfile::FuseAll),
        Scenario::new(false, false, Backend::Local, FusionProfile::Default),
    ]
    .into_iter()
    .map(|scenario| ScenarioCase {
        scenario,
        rows: options.rows,
        cols: options.cols,
    })
    .collect();
    // Malform the middle scenario only.
    cases[1].rows = 0;

    let report = harness.run_cases(&cases);
    assert_eq!(report.outcomes.len(), 3);
    assert!(report.outcomes[0].passed, "{:?}", report.outcomes[0].failure);
    assert!(!report.outcomes[1].passed);
    assert!(report.outcomes[2].passed, "{:?}", report.outcomes[2].failure);

    match report.outcomes[1].failure.as_ref().expect("recorded reason") {
        FailureReason::InvalidSpec { reason } => {
            assert!(reason.contains("rows"), "reason: {reason}");
        }
        other => panic!("expected InvalidSpec, got {other}"),
    }

    for outcome in &report.outcomes {
        assert!(outcome.flags_restored, "{} leaked flags", outcome.scenario.name);
    }
    assert_eq!(GlobalFlags::current(), before);
}

#[test]
#[serial(optimizer_flags)]
fn test_report_summary_reflects_partial_failure() {
    let options = small_options();
    let harness = Harness::new(options);
    let good = ScenarioCase {
        scenario: Scenario::new(true, false, Backend::Local, FusionProfile::Default),
        rows: options.rows,
        cols: options.cols,
    };
    let mut bad = good.clone();
    bad.scenario = Scenario::new(true, true, Backend::Local, FusionProfile::Default);
    bad.cols = 0;

    let report = harness.run_cases(&[good, bad]);
    assert!(!report.all_passed());
    assert_eq!(report.passed_count(), 1);
    assert_eq!(report.failed_count(), 1);
    assert!(report.summary().contains("pagerank_sparse_rewrites_default_local"));
}
