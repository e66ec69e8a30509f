//! Combined unit decommitment and optimal power flow.
//!
//! The search runs in three phases:
//!
//! 1. **Feasibility repair.** If the committed units' minimum outputs already exceed
//!    what the load can absorb, the most expensive units at Pmin are shut down first
//!    ([`shed_excess_commitment`]).
//! 2. **Initial solve.** The repaired snapshot is solved once; the result is the
//!    stage-0 baseline.
//! 3. **Staged decommitment.** Stage `N` has `N` units shut down. Each stage takes the
//!    units pinned at a positive Pmin ([`decommit_candidates`]), re-solves the
//!    baseline with each one shut down, and keeps the cheapest trial that beats the
//!    baseline ([`select_stage_winner`]). The search stops when a stage has no
//!    candidates or no trial improves.
//!
//! Every trial works on its own copy of the stage baseline, so the trials of a stage
//! are independent and run on the rayon pool when the `parallel` feature is enabled.
//!
//! ```ignore
//! use decom_algo::{solve_uopf, EconomicDispatch};
//!
//! let result = solve_uopf(&network, EconomicDispatch::new())?;
//! println!("cost {:.2} $/hr, shut down {:?}", result.total_cost(), result.decommitted);
//! ```

mod feasibility;
mod stage;

use std::time::{Duration, Instant};

use decom_core::{DecomResult, Network};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::opf::{OpfBackend, OpfSolution, SolverConfig};

pub use feasibility::shed_excess_commitment;
pub use stage::{decommit_candidates, select_stage_winner, TrialOutcome};

/// Search settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecommitConfig {
    /// Solve the trials of a stage concurrently (needs the `parallel` feature)
    pub parallel: bool,
    /// Stop after this many accepted stages; `None` searches until no trial improves
    pub max_stages: Option<usize>,
    /// Passed to every OPF call
    pub solver: SolverConfig,
}

impl Default for DecommitConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            max_stages: None,
            solver: SolverConfig::default(),
        }
    }
}

/// Summary of one decommitment stage
#[derive(Debug, Clone, Serialize)]
pub struct StageReport {
    /// 1-based stage number (number of units shut down if the stage is accepted)
    pub stage: usize,
    pub baseline_cost: f64,
    pub candidates: Vec<usize>,
    pub trials_succeeded: usize,
    pub improving_trials: usize,
    /// Generator shut down by this stage, if any trial improved
    pub winner: Option<usize>,
    pub best_cost: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DecommitResult {
    /// Best dispatch found
    pub solution: OpfSolution,
    pub success: bool,
    pub elapsed: Duration,
    /// Generators shut down to make the Pmin total fit the load, in order
    pub shed_for_feasibility: Vec<usize>,
    /// Stage winners, in order
    pub decommitted: Vec<usize>,
    pub stages: Vec<StageReport>,
}

impl DecommitResult {
    pub fn total_cost(&self) -> f64 {
        self.solution.objective_value
    }

    /// Generators still committed in the final dispatch
    pub fn committed(&self) -> Vec<usize> {
        self.solution.network.in_service_generators()
    }

    /// JSON report including the per-generator dispatch
    pub fn to_json(&self) -> serde_json::Value {
        let generators: Vec<_> = self
            .solution
            .network
            .generators()
            .iter()
            .enumerate()
            .map(|(i, gen)| {
                json!({
                    "index": i,
                    "id": gen.id.value(),
                    "name": gen.name,
                    "status": gen.status,
                    "pg_mw": gen.active_power.value(),
                    "mu_pmin": self.solution.mu_pmin(i),
                })
            })
            .collect();

        json!({
            "success": self.success,
            "total_cost": self.total_cost(),
            "elapsed_ms": self.elapsed.as_secs_f64() * 1e3,
            "system_lambda": self.solution.system_lambda,
            "shed_for_feasibility": self.shed_for_feasibility,
            "decommitted": self.decommitted,
            "stages": self.stages,
            "generators": generators,
        })
    }
}

/// Staged greedy decommitment over an [`OpfBackend`]
pub struct UnitDecommitment<B> {
    backend: B,
    config: DecommitConfig,
}

impl<B: OpfBackend> UnitDecommitment<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            config: DecommitConfig::default(),
        }
    }

    pub fn with_config(mut self, config: DecommitConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &DecommitConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Run the search on a copy of `network`.
    ///
    /// A backend error on the initial solve is returned as an error. A non-converged
    /// initial solve is returned as `Ok` with `success = false` and no stages.
    pub fn solve(&self, network: &Network) -> DecomResult<DecommitResult> {
        let start = Instant::now();
        let mut network = network.clone();

        let shed_for_feasibility = shed_excess_commitment(&mut network)?;

        info!(
            backend = self.backend.id(),
            committed = network.in_service_generators().len(),
            "initial OPF solve"
        );
        let mut best = self.backend.solve(&network, &self.config.solver)?;
        if !best.converged {
            warn!("initial OPF solve did not converge; skipping decommitment");
            return Ok(DecommitResult {
                solution: best,
                success: false,
                elapsed: start.elapsed(),
                shed_for_feasibility,
                decommitted: Vec::new(),
                stages: Vec::new(),
            });
        }
        info!(cost = best.objective_value, "initial dispatch");

        let mut decommitted = Vec::new();
        let mut stages = Vec::new();
        loop {
            if let Some(max) = self.config.max_stages {
                if decommitted.len() >= max {
                    info!(max_stages = max, "stage limit reached");
                    break;
                }
            }

            let candidates = decommit_candidates(&best);
            if candidates.is_empty() {
                debug!("no generators pinned at a positive Pmin");
                break;
            }

            let baseline_cost = best.objective_value;
            let outcomes = stage::evaluate_trials(
                &self.backend,
                &best,
                &candidates,
                &self.config.solver,
                self.config.parallel,
            );
            let winner = select_stage_winner(baseline_cost, &outcomes);

            let mut report = StageReport {
                stage: stages.len() + 1,
                baseline_cost,
                candidates,
                trials_succeeded: outcomes.iter().filter(|o| o.succeeded()).count(),
                improving_trials: outcomes
                    .iter()
                    .filter(|o| o.cost().is_some_and(|c| c < baseline_cost))
                    .count(),
                winner: None,
                best_cost: baseline_cost,
            };

            let accepted = winner.and_then(|pos| {
                let outcome = outcomes.into_iter().nth(pos)?;
                Some((outcome.generator, outcome.solution?))
            });
            let Some((generator, solution)) = accepted else {
                debug!(stage = report.stage, "no trial improved on the baseline");
                stages.push(report);
                break;
            };

            if let Some(gen) = solution.network.generator(generator) {
                info!(
                    stage = report.stage,
                    generator,
                    name = %gen.name,
                    cost = solution.objective_value,
                    "shutting down generator"
                );
            }
            report.winner = Some(generator);
            report.best_cost = solution.objective_value;
            stages.push(report);
            decommitted.push(generator);
            best = solution;
        }

        info!(
            cost = best.objective_value,
            stages = decommitted.len(),
            "decommitment finished"
        );
        Ok(DecommitResult {
            success: best.converged,
            solution: best,
            elapsed: start.elapsed(),
            shed_for_feasibility,
            decommitted,
            stages,
        })
    }
}

/// Run the decommitment search with default settings
pub fn solve_uopf<B: OpfBackend>(network: &Network, backend: B) -> DecomResult<DecommitResult> {
    UnitDecommitment::new(backend).solve(network)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_searches_without_limit() {
        let config = DecommitConfig::default();
        assert!(config.parallel);
        assert_eq!(config.max_stages, None);
        assert_eq!(config.solver, SolverConfig::default());
    }

    #[test]
    fn config_deserialises_with_defaults() {
        let config: DecommitConfig =
            serde_json::from_str(r#"{"max_stages": 2, "solver": {"max_iterations": 10}}"#)
                .unwrap();
        assert!(config.parallel);
        assert_eq!(config.max_stages, Some(2));
        assert_eq!(config.solver.max_iterations, 10);
        assert_eq!(config.solver.tolerance, 1e-6);
    }
}
