//! One stage of the greedy search: candidate selection, trial fan-out and reduction.

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::opf::{OpfBackend, OpfSolution, SolverConfig};

/// Generators in `baseline` that sit on a positive Pmin the dispatch would like to undercut.
pub fn decommit_candidates(baseline: &OpfSolution) -> Vec<usize> {
    baseline
        .network
        .generators()
        .iter()
        .enumerate()
        .filter(|(i, gen)| gen.status && gen.pmin.value() > 0.0 && baseline.mu_pmin(*i) > 0.0)
        .map(|(i, _)| i)
        .collect()
}

/// Result of re-solving the stage baseline with one generator shut down.
#[derive(Debug, Clone)]
pub struct TrialOutcome {
    pub generator: usize,
    /// `None` when the backend returned an error
    pub solution: Option<OpfSolution>,
}

impl TrialOutcome {
    pub fn succeeded(&self) -> bool {
        self.solution.as_ref().is_some_and(|s| s.converged)
    }

    /// Objective of a converged trial. Failed trials have no cost.
    pub fn cost(&self) -> Option<f64> {
        self.solution
            .as_ref()
            .filter(|s| s.converged)
            .map(|s| s.objective_value)
    }
}

/// Pick the stage winner: the cheapest successful trial strictly below `baseline_cost`.
///
/// Exact cost ties go to the lowest generator index, so the result does not depend on
/// the order in which trials finished. Returns the winner's position in `outcomes`.
pub fn select_stage_winner(baseline_cost: f64, outcomes: &[TrialOutcome]) -> Option<usize> {
    outcomes
        .iter()
        .enumerate()
        .filter_map(|(pos, outcome)| {
            outcome
                .cost()
                .filter(|&cost| cost < baseline_cost)
                .map(|cost| (pos, outcome.generator, cost))
        })
        .min_by(|a, b| a.2.total_cmp(&b.2).then(a.1.cmp(&b.1)))
        .map(|(pos, _, _)| pos)
}

fn run_trial<B: OpfBackend + ?Sized>(
    backend: &B,
    baseline: &OpfSolution,
    generator: usize,
    config: &SolverConfig,
) -> TrialOutcome {
    let mut trial = baseline.network.clone();
    if let Err(err) = trial.shut_down_generator(generator) {
        warn!(generator, error = %err, "cannot build trial");
        return TrialOutcome {
            generator,
            solution: None,
        };
    }

    let solution = match backend.solve(&trial, config) {
        Ok(solution) => {
            debug!(
                generator,
                converged = solution.converged,
                cost = solution.objective_value,
                "trial solved"
            );
            Some(solution)
        }
        Err(err) => {
            warn!(generator, error = %err, "trial solve failed");
            None
        }
    };
    TrialOutcome {
        generator,
        solution,
    }
}

/// Solve one trial per candidate, returned in candidate order.
#[cfg(feature = "parallel")]
pub(crate) fn evaluate_trials<B: OpfBackend + ?Sized>(
    backend: &B,
    baseline: &OpfSolution,
    candidates: &[usize],
    config: &SolverConfig,
    parallel: bool,
) -> Vec<TrialOutcome> {
    if parallel {
        candidates
            .par_iter()
            .map(|&k| run_trial(backend, baseline, k, config))
            .collect()
    } else {
        candidates
            .iter()
            .map(|&k| run_trial(backend, baseline, k, config))
            .collect()
    }
}

/// Solve one trial per candidate, returned in candidate order.
#[cfg(not(feature = "parallel"))]
pub(crate) fn evaluate_trials<B: OpfBackend + ?Sized>(
    backend: &B,
    baseline: &OpfSolution,
    candidates: &[usize],
    config: &SolverConfig,
    _parallel: bool,
) -> Vec<TrialOutcome> {
    candidates
        .iter()
        .map(|&k| run_trial(backend, baseline, k, config))
        .collect()
}
