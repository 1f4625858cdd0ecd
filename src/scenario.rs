//! Scenario model and configuration-matrix enumeration
//!
//! One `Scenario` identifies a single differential run: rewrite switches,
//! input sparsity, execution backend, and fusion profile. The enumeration
//! walks the full cross-product in insertion order, so a failure is
//! reproducibly reportable by position across runs.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::flags::OptimizerFlags;

/// Execution backend for the candidate runtime
///
/// Distributed execution is an opaque mode switch from the harness's point
/// of view; it changes the fused operator's reported name and nothing else
/// the harness observes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Backend {
    /// Single-node execution
    Local,
    /// Cluster execution mode
    Distributed,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Local => write!(f, "local"),
            Backend::Distributed => write!(f, "distributed"),
        }
    }
}

/// Optimizer fusion profile under which the candidate compiles the program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FusionProfile {
    /// Cost-based fusion heuristics
    Default,
    /// Fuse every fusible operator
    FuseAll,
    /// Fuse only where no redundant compute is introduced
    FuseNoRedundancy,
}

impl fmt::Display for FusionProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FusionProfile::Default => write!(f, "default"),
            FusionProfile::FuseAll => write!(f, "fuse_all"),
            FusionProfile::FuseNoRedundancy => write!(f, "fuse_no_redundancy"),
        }
    }
}

/// One fully-specified test configuration, immutable once constructed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Human-readable name for reporting
    pub name: String,
    /// Whether algebraic rewrites and fusion are enabled
    pub rewrites_enabled: bool,
    /// Whether the link matrix uses the sparse density profile
    pub sparse: bool,
    /// Execution backend
    pub backend: Backend,
    /// Fusion profile
    pub fusion_profile: FusionProfile,
}

impl Scenario {
    /// Build a scenario with its generated report name
    #[must_use]
    pub fn new(
        rewrites_enabled: bool,
        sparse: bool,
        backend: Backend,
        fusion_profile: FusionProfile,
    ) -> Self {
        let name = format!(
            "pagerank_{}_{}_{}_{}",
            if sparse { "sparse" } else { "dense" },
            if rewrites_enabled { "rewrites" } else { "norewrites" },
            fusion_profile,
            backend,
        );
        Self {
            name,
            rewrites_enabled,
            sparse,
            backend,
            fusion_profile,
        }
    }

    /// Optimizer flags this scenario requires while executing
    ///
    /// Rewrites drive both simplification and fusion; vectorization stays at
    /// its production default.
    #[must_use]
    pub fn optimizer_flags(&self) -> OptimizerFlags {
        OptimizerFlags {
            algebraic_simplification: self.rewrites_enabled,
            operator_fusion: self.rewrites_enabled,
            auto_vectorization: true,
        }
    }

    /// Whether the fused-operator signature must appear in the statistics
    ///
    /// With rewrites disabled the fused operator legitimately never fires;
    /// such scenarios are correctness-only checks.
    #[must_use]
    pub fn requires_signature(&self) -> bool {
        self.rewrites_enabled
    }
}

/// Suite-level configuration surface
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SuiteOptions {
    /// Link matrix row count
    pub rows: usize,
    /// Link matrix column count
    pub cols: usize,
    /// Density of the dense input profile
    pub sparsity_dense: f64,
    /// Density of the sparse input profile
    pub sparsity_sparse: f64,
    /// Damping factor of the power iteration
    pub alpha: f64,
    /// Number of iterations
    pub maxiter: u32,
    /// Absolute comparison tolerance
    pub abs_tolerance: f64,
    /// Backend every enumerated scenario runs on
    pub backend: Backend,
}

impl SuiteOptions {
    /// Input density for a scenario's sparsity profile
    #[must_use]
    pub fn density(&self, sparse: bool) -> f64 {
        if sparse {
            self.sparsity_sparse
        } else {
            self.sparsity_dense
        }
    }
}

impl Default for SuiteOptions {
    /// The recorded regression geometry: 1468x1468 links, absolute
    /// tolerance 0.1 against outputs that reach the 1e12 scale.
    fn default() -> Self {
        Self {
            rows: 1468,
            cols: 1468,
            sparsity_dense: 0.41,
            sparsity_sparse: 0.05,
            alpha: 0.85,
            maxiter: 10,
            abs_tolerance: 0.1,
            backend: Backend::Local,
        }
    }
}

/// Enumerate the full scenario cross-product for a suite
///
/// Order is the insertion order of the generation loops (rewrites outer,
/// fusion profile middle, sparsity inner) and is stable across runs.
#[must_use]
pub fn enumerate(options: &SuiteOptions) -> Vec<Scenario> {
    let mut scenarios = Vec::new();
    for rewrites in [true, false] {
        for profile in [
            FusionProfile::Default,
            FusionProfile::FuseAll,
            FusionProfile::FuseNoRedundancy,
        ] {
            for sparse in [false, true] {
                scenarios.push(Scenario::new(rewrites, sparse, options.backend, profile));
            }
        }
    }
    scenarios
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enumerate_covers_full_cross_product() {
        let scenarios = enumerate(&SuiteOptions::default());
        assert_eq!(scenarios.len(), 12);
        let unique: std::collections::BTreeSet<&str> =
            scenarios.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(unique.len(), 12, "scenario names must be distinct");
    }

    #[test]
    fn test_enumerate_order_is_stable() {
        let a = enumerate(&SuiteOptions::default());
        let b = enumerate(&SuiteOptions::default());
        assert_eq!(a, b);
        assert_eq!(a[0].name, "pagerank_dense_rewrites_default_local");
        assert_eq!(a[1].name, "pagerank_sparse_rewrites_default_local");
    }

    #[test]
    fn test_scenario_name_reflects_dimensions() {
        let s = Scenario::new(false, true, Backend::Distributed, FusionProfile::FuseAll);
        assert_eq!(s.name, "pagerank_sparse_norewrites_fuse_all_distributed");
    }

    #[test]
    fn test_optimizer_flags_follow_rewrites() {
        let on = Scenario::new(true, false, Backend::Local, FusionProfile::Default);
        assert!(on.optimizer_flags().operator_fusion);
        assert!(on.optimizer_flags().algebraic_simplification);

        let off = Scenario::new(false, false, Backend::Local, FusionProfile::Default);
        assert!(!off.optimizer_flags().operator_fusion);
        assert!(!off.optimizer_flags().algebraic_simplification);
        assert!(off.optimizer_flags().auto_vectorization);
    }

    #[test]
    fn test_signature_required_only_with_rewrites() {
        assert!(Scenario::new(true, false, Backend::Local, FusionProfile::Default)
            .requires_signature());
        assert!(!Scenario::new(false, false, Backend::Local, FusionProfile::Default)
            .requires_signature());
    }

    #[test]
    fn test_density_selection() {
        let options = SuiteOptions::default();
        assert_eq!(options.density(false), 0.41);
        assert_eq!(options.density(true), 0.05);
    }
}
