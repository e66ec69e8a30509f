//! # decom-algo: Unit decommitment over a pluggable OPF
//!
//! Decides which generating units to take offline so that the remaining units can
//! be dispatched at least cost. The search is a staged greedy elimination layered on
//! top of an optimal power flow that is treated as a black box.
//!
//! ## Optimal Power Flow
//!
//! Any solver that implements [`OpfBackend`] can drive the search. It must report a
//! dispatch, a convergence flag, the objective and the multiplier on each
//! generator's Pmin limit.
//!
//! | Backend | Description |
//! |---------|-------------|
//! | [`EconomicDispatch`] | Lambda iteration on a lossless copper plate |
//! | [`test_utils::ScriptedBackend`] | Canned results keyed by the set of offline units |
//!
//! ## Decommitment
//!
//! - [`UnitDecommitment`]: the staged search, configured with [`DecommitConfig`]
//! - [`solve_uopf`]: the search with default settings
//! - [`select_stage_winner`]: the order-independent reduction over one stage's trials
//!
//! ## Example
//!
//! ```ignore
//! use decom_algo::{DecommitConfig, EconomicDispatch, UnitDecommitment};
//!
//! let search = UnitDecommitment::new(EconomicDispatch::new())
//!     .with_config(DecommitConfig { max_stages: Some(3), ..Default::default() });
//!
//! let result = search.solve(&network)?;
//! println!("Cost: ${:.2}/hr", result.total_cost());
//! println!("Shut down: {:?}", result.decommitted);
//! ```

pub mod decommit;
pub mod opf;
pub mod test_utils;

pub use decommit::{
    decommit_candidates, select_stage_winner, shed_excess_commitment, solve_uopf,
    DecommitConfig, DecommitResult, StageReport, TrialOutcome, UnitDecommitment,
};
pub use opf::{
    ConstraintInfo, ConstraintType, EconomicDispatch, GenMultipliers, OpfBackend, OpfError,
    OpfSolution, SolverConfig,
};
