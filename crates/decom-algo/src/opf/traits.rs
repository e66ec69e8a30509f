//! Backend trait the decommitment controller drives.
//!
//! The controller only needs a dispatch, a convergence flag, the objective and the
//! Pmin multipliers. Anything that can produce those (a full AC-OPF, a DC-OPF, the
//! bundled [`EconomicDispatch`](super::EconomicDispatch), a scripted test double) can
//! sit behind [`OpfBackend`].

use decom_core::Network;
use serde::{Deserialize, Serialize};

use super::{OpfError, OpfSolution};

/// Configuration passed to backend solvers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Maximum iterations
    pub max_iterations: usize,
    /// Convergence tolerance
    pub tolerance: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            tolerance: 1e-6,
        }
    }
}

/// Solves one network snapshot.
///
/// Implementations must be callable repeatedly, and concurrently, on distinct
/// snapshots without carrying state from one call to the next.
pub trait OpfBackend: Send + Sync {
    /// Unique identifier (e.g., "economic-dispatch", "ac-opf")
    fn id(&self) -> &str;

    /// Solve the snapshot.
    ///
    /// Return `Ok` with `converged = false` when the problem was attempted but not
    /// solved; reserve `Err` for inputs the backend cannot handle at all.
    fn solve(&self, network: &Network, config: &SolverConfig) -> Result<OpfSolution, OpfError>;
}

impl<B: OpfBackend + ?Sized> OpfBackend for &B {
    fn id(&self) -> &str {
        (**self).id()
    }

    fn solve(&self, network: &Network, config: &SolverConfig) -> Result<OpfSolution, OpfError> {
        (**self).solve(network, config)
    }
}

impl<B: OpfBackend + ?Sized> OpfBackend for Box<B> {
    fn id(&self) -> &str {
        (**self).id()
    }

    fn solve(&self, network: &Network, config: &SolverConfig) -> Result<OpfSolution, OpfError> {
        (**self).solve(network, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test that the trait is object-safe (can be used with dyn).
    #[test]
    fn test_trait_is_object_safe() {
        fn _accepts_backend(_b: &dyn OpfBackend) {}
    }

    /// Test that trait objects can be Send + Sync (required for parallel trials).
    #[test]
    fn test_trait_is_send_sync() {
        fn _assert_send<T: Send>() {}
        fn _assert_sync<T: Sync>() {}

        _assert_send::<Box<dyn OpfBackend>>();
        _assert_sync::<Box<dyn OpfBackend>>();
    }

    #[test]
    fn test_solver_config_defaults() {
        let config = SolverConfig::default();
        assert_eq!(config.max_iterations, 100);
        assert_eq!(config.tolerance, 1e-6);
    }

    #[test]
    fn test_solver_config_partial_deserialisation() {
        let config: SolverConfig = serde_json::from_str(r#"{"tolerance": 1e-9}"#).unwrap();
        assert_eq!(config.max_iterations, 100);
        assert_eq!(config.tolerance, 1e-9);
    }
}
