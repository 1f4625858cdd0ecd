//! Property-based tests using proptest
//!
//! Mathematical invariants of the comparator and the synthesizer:
//! - Tolerance verdicts are symmetric in their arguments
//! - Shape mismatches always error, never silently pass
//! - Synthesis is a pure function of its spec

use proptest::prelude::*;

use cotejar::compare::compare;
use cotejar::matrix::{MatrixPayload, MatrixSpec};
use cotejar::synth::generate;

fn build(rows: usize, cols: usize, cells: &[(usize, usize, f64)]) -> MatrixPayload {
    let mut m = MatrixPayload::new(rows, cols);
    for &(r, c, v) in cells {
        m.set(r % rows, c % cols, v).expect("index wrapped in range");
    }
    m
}

proptest! {
    /// compare(A, B, t).passed == compare(B, A, t).passed for same-shaped matrices
    #[test]
    fn prop_comparator_verdict_is_symmetric(
        cells_a in prop::collection::vec((0usize..6, 0usize..6, -10.0f64..10.0), 0..24),
        cells_b in prop::collection::vec((0usize..6, 0usize..6, -10.0f64..10.0), 0..24),
        tolerance in 0.0f64..5.0,
    ) {
        let a = build(6, 6, &cells_a);
        let b = build(6, 6, &cells_b);
        let ab = compare(&a, &b, tolerance).expect("same shape");
        let ba = compare(&b, &a, tolerance).expect("same shape");
        prop_assert_eq!(ab.passed, ba.passed);
        prop_assert_eq!(ab.max_abs_diff, ba.max_abs_diff);
        prop_assert_eq!(ab.mismatch_count, ba.mismatch_count);
    }

    /// Any pair of differently-shaped matrices is a hard error
    #[test]
    fn prop_shape_mismatch_always_errors(
        rows_a in 1usize..8, cols_a in 1usize..8,
        rows_b in 1usize..8, cols_b in 1usize..8,
    ) {
        prop_assume!((rows_a, cols_a) != (rows_b, cols_b));
        let a = MatrixPayload::new(rows_a, cols_a);
        let b = MatrixPayload::new(rows_b, cols_b);
        prop_assert!(compare(&a, &b, f64::MAX).is_err());
    }

    /// A matrix always compares equal to itself at zero tolerance
    #[test]
    fn prop_comparator_is_reflexive(
        cells in prop::collection::vec((0usize..6, 0usize..6, -10.0f64..10.0), 0..24),
    ) {
        let a = build(6, 6, &cells);
        let verdict = compare(&a, &a.clone(), 0.0).expect("same shape");
        prop_assert!(verdict.passed);
        prop_assert_eq!(verdict.max_abs_diff, 0.0);
    }

    /// generate(s) == generate(s): synthesis is a pure function of the spec
    #[test]
    fn prop_generate_is_deterministic(
        rows in 1usize..12,
        cols in 1usize..12,
        density in 0.0f64..=1.0,
        seed in any::<u64>(),
    ) {
        let spec = MatrixSpec {
            rows,
            cols,
            min_value: -1.0,
            max_value: 1.0,
            density,
            seed,
        };
        prop_assert_eq!(generate(&spec).expect("valid spec"), generate(&spec).expect("valid spec"));
    }

    /// Synthesized values stay within the declared range
    #[test]
    fn prop_generate_respects_value_range(
        seed in any::<u64>(),
        density in 0.1f64..=1.0,
    ) {
        let spec = MatrixSpec {
            rows: 10,
            cols: 10,
            min_value: 2.0,
            max_value: 5.0,
            density,
            seed,
        };
        let m = generate(&spec).expect("valid spec");
        for (_, _, v) in m.cells() {
            prop_assert!((2.0..=5.0).contains(&v));
        }
    }
}
