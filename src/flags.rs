//! Optimizer flag configuration and the process-wide flag registry
//!
//! Engines take `OptimizerFlags` by value, so a scenario can never corrupt
//! another scenario's configuration through them. The process-wide
//! `GlobalFlags` registry remains as the ambient-state surface for runtimes
//! that read flags globally: a scenario applies its flags through a scoped
//! guard that snapshots the previous state and restores it on every exit
//! path, including panics. The registry lock doubles as the mutual-exclusion
//! point between scenarios: while one guard is live, no other scenario can
//! observe or mutate the shared state.

use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

/// Process-wide optimizer switches applied per scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizerFlags {
    /// Allow algebraic simplification rewrites
    pub algebraic_simplification: bool,
    /// Allow operator fusion (the optimization under test)
    pub operator_fusion: bool,
    /// Allow auto-vectorization of generated kernels
    pub auto_vectorization: bool,
}

impl OptimizerFlags {
    /// Production defaults: everything enabled
    pub const ENABLED: Self = Self {
        algebraic_simplification: true,
        operator_fusion: true,
        auto_vectorization: true,
    };
}

impl Default for OptimizerFlags {
    fn default() -> Self {
        Self::ENABLED
    }
}

static REGISTRY: Mutex<OptimizerFlags> = Mutex::new(OptimizerFlags::ENABLED);

/// Handle to the process-wide flag state
///
/// A panic while a guard is live poisons the registry lock, but the guard
/// has already restored the snapshot by then, so later scenarios recover the
/// restored value rather than failing.
pub struct GlobalFlags;

impl GlobalFlags {
    /// Read the current process-wide flags
    ///
    /// Blocks while a scenario holds the flag scope; call it outside guard
    /// lifetimes (e.g. to snapshot before and after a scenario).
    #[must_use]
    pub fn current() -> OptimizerFlags {
        *REGISTRY.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply flags for a scenario, returning the restoring guard
    ///
    /// The previous state is snapshotted and written back when the guard
    /// drops, whether the scenario succeeds, fails, or unwinds.
    #[must_use]
    pub fn apply(flags: OptimizerFlags) -> FlagGuard {
        let mut slot = REGISTRY.lock().unwrap_or_else(PoisonError::into_inner);
        let saved = *slot;
        *slot = flags;
        FlagGuard { saved, slot }
    }
}

/// Scoped flag application with guaranteed restoration
pub struct FlagGuard {
    saved: OptimizerFlags,
    slot: MutexGuard<'static, OptimizerFlags>,
}

impl FlagGuard {
    /// The flags in effect while this guard is live
    #[must_use]
    pub fn applied(&self) -> OptimizerFlags {
        *self.slot
    }

    /// The snapshot that will be restored on drop
    #[must_use]
    pub fn saved(&self) -> OptimizerFlags {
        self.saved
    }
}

impl Drop for FlagGuard {
    fn drop(&mut self) {
        *self.slot = self.saved;
    }
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use super::*;

    fn rewrites_off() -> OptimizerFlags {
        OptimizerFlags {
            algebraic_simplification: false,
            operator_fusion: false,
            auto_vectorization: true,
        }
    }

    #[test]
    #[serial(optimizer_flags)]
    fn test_guard_applies_and_restores() {
        let before = GlobalFlags::current();
        {
            let guard = GlobalFlags::apply(rewrites_off());
            assert_eq!(guard.applied(), rewrites_off());
            assert_eq!(guard.saved(), before);
        }
        assert_eq!(GlobalFlags::current(), before);
    }

    #[test]
    #[serial(optimizer_flags)]
    fn test_sequential_scopes_each_restore() {
        let before = GlobalFlags::current();
        drop(GlobalFlags::apply(rewrites_off()));
        assert_eq!(GlobalFlags::current(), before);
        drop(GlobalFlags::apply(OptimizerFlags {
            algebraic_simplification: true,
            operator_fusion: false,
            auto_vectorization: false,
        }));
        assert_eq!(GlobalFlags::current(), before);
    }

    #[test]
    fn test_default_is_fully_enabled() {
        let flags = OptimizerFlags::default();
        assert!(flags.algebraic_simplification);
        assert!(flags.operator_fusion);
        assert!(flags.auto_vectorization);
    }
}
