//! Optimization-signature verification over runtime statistics
//!
//! Matching outputs alone cannot prove the optimization under test ran;
//! results can be correct because the runtime silently fell back to an
//! un-fused path. The verifier inspects the post-run operator statistics
//! for the fused operator's name instead.
//!
//! The substring set is matched to the current runtime's operator naming
//! (single-node and distributed variants) and is a compatibility shim, not
//! a stable contract; callers can pass their own expected set.

use std::collections::BTreeMap;

/// Operator-name fragments that prove the fused row-aggregate kernel ran
pub const FUSED_ROWAGG_SIGNATURES: &[&str] = &["spoofRA", "sp_spoofRA"];

/// Whether any statistic key contains any expected fragment
#[must_use]
pub fn signature_fired(statistics: &BTreeMap<String, u64>, expected: &[&str]) -> bool {
    statistics
        .keys()
        .any(|name| expected.iter().any(|fragment| name.contains(fragment)))
}

/// The `n` most-invoked operators, descending by count
///
/// Ties break on operator name so report output is deterministic.
#[must_use]
pub fn top_operators(statistics: &BTreeMap<String, u64>, n: usize) -> Vec<(String, u64)> {
    let mut entries: Vec<(String, u64)> = statistics
        .iter()
        .map(|(name, &count)| (name.clone(), count))
        .collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    entries.truncate(n);
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(pairs: &[(&str, u64)]) -> BTreeMap<String, u64> {
        pairs.iter().map(|&(k, v)| (k.to_string(), v)).collect()
    }

    #[test]
    fn test_signature_found_by_substring() {
        let s = stats(&[("spoofRA7", 10), ("ba+*", 3)]);
        assert!(signature_fired(&s, FUSED_ROWAGG_SIGNATURES));
    }

    #[test]
    fn test_distributed_variant_matches() {
        let s = stats(&[("sp_spoofRA2", 4)]);
        assert!(signature_fired(&s, FUSED_ROWAGG_SIGNATURES));
    }

    #[test]
    fn test_absent_signature_reports_false() {
        let s = stats(&[("ba+*", 30), ("+", 10), ("*", 20)]);
        assert!(!signature_fired(&s, FUSED_ROWAGG_SIGNATURES));
    }

    #[test]
    fn test_empty_statistics_report_false() {
        assert!(!signature_fired(&BTreeMap::new(), FUSED_ROWAGG_SIGNATURES));
    }

    #[test]
    fn test_top_operators_sorted_and_truncated() {
        let s = stats(&[("a", 5), ("b", 20), ("c", 20), ("d", 1)]);
        let top = top_operators(&s, 3);
        assert_eq!(
            top,
            vec![
                ("b".to_string(), 20),
                ("c".to_string(), 20),
                ("a".to_string(), 5)
            ]
        );
    }
}
