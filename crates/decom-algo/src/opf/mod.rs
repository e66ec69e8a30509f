//! Optimal power flow backends
//!
//! The decommitment controller treats the OPF as a black box behind [`OpfBackend`].
//! This module defines that seam and ships one implementation:
//! - [`EconomicDispatch`]: lambda-iteration dispatch on a copper plate

mod economic;
mod error;
mod traits;
mod types;

pub use economic::EconomicDispatch;
pub use error::OpfError;
pub use traits::{OpfBackend, SolverConfig};
pub use types::{ConstraintInfo, ConstraintType, GenMultipliers, OpfSolution};
