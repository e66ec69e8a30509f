//! Copper-plate economic dispatch
//!
//! Balances total bus demand against the in-service generators and dispatchable
//! loads by bisecting on the system lambda. Each unit runs at the highest output
//! whose marginal cost does not exceed lambda, clamped to its limits. Network
//! constraints, losses and reactive power are not modelled; bus voltages are carried
//! through unchanged so the decommitment controller's warm-start state survives.
//!
//! Pmin/Pmax multipliers are recovered from the final lambda:
//! `mu_pmin = MC(Pmin) − λ` for units at their floor and `mu_pmax = λ − MC(Pmax)` for
//! units at their ceiling, both clamped at zero.

use std::time::Instant;

use decom_core::{CostModel, Megavars, Megawatts, Network};
use tracing::debug;

use super::{
    ConstraintInfo, ConstraintType, GenMultipliers, OpfBackend, OpfError, OpfSolution,
    SolverConfig,
};

/// Distance from a limit (MW) at which a unit counts as sitting on it
const LIMIT_TOL_MW: f64 = 1e-6;
/// Bisection steps used to invert one unit's marginal cost curve
const CURVE_STEPS: usize = 64;

/// Lambda-iteration dispatch over a single copper-plate bus.
#[derive(Debug, Clone, Copy, Default)]
pub struct EconomicDispatch;

impl EconomicDispatch {
    pub fn new() -> Self {
        Self
    }
}

/// In-service unit as seen by the dispatch
struct Unit<'a> {
    index: usize,
    name: &'a str,
    pmin: f64,
    pmax: f64,
    cost: &'a CostModel,
}

impl Unit<'_> {
    fn marginal_cost(&self, p: f64) -> f64 {
        self.cost.marginal_cost(p)
    }

    /// Highest output in `[pmin, pmax]` whose marginal cost does not exceed `lambda`.
    fn output_at(&self, lambda: f64) -> f64 {
        if self.marginal_cost(self.pmin) > lambda {
            return self.pmin;
        }
        if self.marginal_cost(self.pmax) <= lambda {
            return self.pmax;
        }
        let (mut lo, mut hi) = (self.pmin, self.pmax);
        for _ in 0..CURVE_STEPS {
            let mid = 0.5 * (lo + hi);
            if self.marginal_cost(mid) <= lambda {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        lo
    }
}

fn collect_units(network: &Network) -> Result<Vec<Unit<'_>>, OpfError> {
    let mut units = Vec::new();
    for (index, gen) in network.generators().into_iter().enumerate() {
        if !gen.status {
            continue;
        }
        let (pmin, pmax) = (gen.pmin.value(), gen.pmax.value());
        if !pmin.is_finite() || !pmax.is_finite() {
            return Err(OpfError::DataValidation(format!(
                "generator {} needs finite active power limits",
                gen.name
            )));
        }
        if pmin > pmax {
            return Err(OpfError::DataValidation(format!(
                "generator {}: Pmin {} exceeds Pmax {}",
                gen.name, pmin, pmax
            )));
        }
        let unit = Unit {
            index,
            name: &gen.name,
            pmin,
            pmax,
            cost: &gen.cost_model,
        };
        if !unit.marginal_cost(pmin).is_finite() || !unit.marginal_cost(pmax).is_finite() {
            return Err(OpfError::NumericalIssue(format!(
                "generator {} has a non-finite marginal cost at its limits",
                gen.name
            )));
        }
        units.push(unit);
    }
    Ok(units)
}

impl OpfBackend for EconomicDispatch {
    fn id(&self) -> &str {
        "economic-dispatch"
    }

    fn solve(&self, network: &Network, config: &SolverConfig) -> Result<OpfSolution, OpfError> {
        let start = Instant::now();
        let units = collect_units(network)?;

        let demand = network.total_demand_mw().value();
        if !demand.is_finite() {
            return Err(OpfError::DataValidation(
                "total bus demand is not finite".to_string(),
            ));
        }
        let balance_tol = config.tolerance * demand.abs().max(1.0);
        let floor: f64 = units.iter().map(|u| u.pmin).sum();
        let ceiling: f64 = units.iter().map(|u| u.pmax).sum();

        let (dispatch, lambda, iterations, converged) = if units.is_empty() {
            (Vec::new(), 0.0, 0, demand.abs() <= balance_tol)
        } else if demand <= floor + balance_tol {
            // Every unit at its floor; the cheapest floor sets the price.
            let lambda = units
                .iter()
                .map(|u| u.marginal_cost(u.pmin))
                .fold(f64::INFINITY, f64::min);
            let dispatch = units.iter().map(|u| u.pmin).collect::<Vec<_>>();
            (dispatch, lambda, 0, demand >= floor - balance_tol)
        } else if demand >= ceiling - balance_tol {
            let lambda = units
                .iter()
                .map(|u| u.marginal_cost(u.pmax))
                .fold(f64::NEG_INFINITY, f64::max);
            let dispatch = units.iter().map(|u| u.pmax).collect::<Vec<_>>();
            (dispatch, lambda, 0, demand <= ceiling + balance_tol)
        } else {
            lambda_iteration(&units, demand, config)
        };

        if !converged {
            debug!(
                demand_mw = demand,
                floor_mw = floor,
                ceiling_mw = ceiling,
                "economic dispatch did not balance"
            );
        }

        let mut solved = network.clone();
        let mut outputs = vec![0.0; solved.generators().len()];
        for (unit, &p) in units.iter().zip(&dispatch) {
            outputs[unit.index] = p;
        }
        for (gen, &p) in solved.generators_mut().zip(&outputs) {
            gen.active_power = Megawatts(p);
            gen.reactive_power = Megavars(0.0);
        }

        let mut multipliers = vec![GenMultipliers::default(); outputs.len()];
        let mut binding_constraints = Vec::new();
        for (unit, &p) in units.iter().zip(&dispatch) {
            let m = &mut multipliers[unit.index];
            if p - unit.pmin <= LIMIT_TOL_MW {
                m.mu_pmin = (unit.marginal_cost(unit.pmin) - lambda).max(0.0);
                if m.mu_pmin > 0.0 {
                    binding_constraints.push(ConstraintInfo {
                        name: unit.name.to_string(),
                        constraint_type: ConstraintType::GeneratorPMin,
                        value: p,
                        limit: unit.pmin,
                        shadow_price: m.mu_pmin,
                    });
                }
            }
            if unit.pmax - p <= LIMIT_TOL_MW {
                m.mu_pmax = (lambda - unit.marginal_cost(unit.pmax)).max(0.0);
                if m.mu_pmax > 0.0 {
                    binding_constraints.push(ConstraintInfo {
                        name: unit.name.to_string(),
                        constraint_type: ConstraintType::GeneratorPMax,
                        value: p,
                        limit: unit.pmax,
                        shadow_price: m.mu_pmax,
                    });
                }
            }
        }
        binding_constraints.push(ConstraintInfo {
            name: "system".to_string(),
            constraint_type: ConstraintType::PowerBalance,
            value: dispatch.iter().sum(),
            limit: demand,
            shadow_price: lambda,
        });

        let objective_value: f64 = units
            .iter()
            .zip(&dispatch)
            .map(|(unit, &p)| unit.cost.evaluate(p))
            .sum();

        Ok(OpfSolution {
            converged,
            iterations,
            solve_time_ms: start.elapsed().as_millis(),
            objective_value,
            network: solved,
            system_lambda: lambda,
            multipliers,
            binding_constraints,
        })
    }
}

/// Bisect lambda until the bracket is within tolerance, then split the residual
/// demand across the units whose output changes inside the final bracket.
///
/// Requires `Σ pmin < demand < Σ pmax`.
fn lambda_iteration(
    units: &[Unit<'_>],
    demand: f64,
    config: &SolverConfig,
) -> (Vec<f64>, f64, usize, bool) {
    let total_at = |lambda: f64| units.iter().map(|u| u.output_at(lambda)).sum::<f64>();

    let mut lambda_lo = units
        .iter()
        .map(|u| u.marginal_cost(u.pmin))
        .fold(f64::INFINITY, f64::min)
        - 1.0;
    let mut lambda_hi = units
        .iter()
        .map(|u| u.marginal_cost(u.pmax))
        .fold(f64::NEG_INFINITY, f64::max)
        .max(lambda_lo + 1.0);

    let width_ok =
        |lo: f64, hi: f64| hi - lo <= config.tolerance * hi.abs().max(1.0);

    let mut iterations = 0;
    while !width_ok(lambda_lo, lambda_hi) && iterations < config.max_iterations {
        iterations += 1;
        let mid = 0.5 * (lambda_lo + lambda_hi);
        if total_at(mid) < demand {
            lambda_lo = mid;
        } else {
            lambda_hi = mid;
        }
    }

    let mut residual = demand - total_at(lambda_lo);
    let dispatch = units
        .iter()
        .map(|u| {
            let base = u.output_at(lambda_lo);
            let take = residual.min(u.output_at(lambda_hi) - base).max(0.0);
            residual -= take;
            base + take
        })
        .collect();

    (
        dispatch,
        lambda_hi,
        iterations,
        width_ok(lambda_lo, lambda_hi),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use decom_core::{Bus, BusId, Gen, GenId, PerUnit};

    fn network(demand: f64, gens: Vec<Gen>) -> Network {
        let mut network = Network::new();
        network.add_bus(Bus {
            id: BusId::new(1),
            name: "Bus 1".to_string(),
            pd: Megawatts(demand),
            voltage_pu: PerUnit(1.04),
            ..Bus::default()
        });
        for gen in gens {
            network.add_gen(gen);
        }
        network
    }

    fn gen(id: usize, pmin: f64, pmax: f64, cost: CostModel) -> Gen {
        Gen::new(GenId::new(id), format!("G{id}"), BusId::new(1))
            .with_p_limits(pmin, pmax)
            .with_cost(cost)
    }

    fn solve(network: &Network) -> OpfSolution {
        EconomicDispatch::new()
            .solve(network, &SolverConfig::default())
            .unwrap()
    }

    #[test]
    fn quadratic_units_share_equal_marginal_cost() {
        let network = network(
            200.0,
            vec![
                gen(1, 0.0, 200.0, CostModel::quadratic(0.0, 10.0, 0.01)),
                gen(2, 0.0, 200.0, CostModel::quadratic(0.0, 12.0, 0.01)),
            ],
        );
        let solution = solve(&network);
        assert!(solution.converged);
        let p = solution.generator_p();
        assert!((p[0] - 150.0).abs() < 1e-3, "p0 = {}", p[0]);
        assert!((p[1] - 50.0).abs() < 1e-3, "p1 = {}", p[1]);
        assert!((solution.system_lambda - 13.0).abs() < 1e-3);
        assert!((p.iter().sum::<f64>() - 200.0).abs() < 1e-6);
    }

    #[test]
    fn expensive_unit_pinned_at_pmin_has_positive_multiplier() {
        let network = network(
            120.0,
            vec![
                gen(1, 0.0, 300.0, CostModel::linear(0.0, 10.0)),
                gen(2, 50.0, 100.0, CostModel::linear(0.0, 30.0)),
            ],
        );
        let solution = solve(&network);
        assert!(solution.converged);
        let p = solution.generator_p();
        assert!((p[0] - 70.0).abs() < 1e-6);
        assert!((p[1] - 50.0).abs() < 1e-6);
        assert!((solution.mu_pmin(1) - 20.0).abs() < 1e-3);
        assert_eq!(solution.mu_pmin(0), 0.0);
        assert!((solution.objective_value - (700.0 + 1500.0)).abs() < 1e-6);
        assert!(solution
            .binding_constraints
            .iter()
            .any(|c| c.constraint_type == ConstraintType::GeneratorPMin && c.name == "G2"));
    }

    #[test]
    fn piecewise_units_follow_segment_slopes() {
        let pwl = CostModel::piecewise(vec![(0.0, 0.0), (100.0, 1000.0), (200.0, 3000.0)]).unwrap();
        let network = network(
            150.0,
            vec![
                gen(1, 0.0, 200.0, pwl),
                gen(2, 0.0, 100.0, CostModel::linear(0.0, 15.0)),
            ],
        );
        let solution = solve(&network);
        assert!(solution.converged);
        let p = solution.generator_p();
        assert!((p[0] - 100.0).abs() < 1e-6);
        assert!((p[1] - 50.0).abs() < 1e-6);
        assert!((solution.objective_value - 1750.0).abs() < 1e-4);
    }

    #[test]
    fn dispatchable_load_consumes_below_its_price() {
        let network = network(
            100.0,
            vec![
                gen(1, 0.0, 200.0, CostModel::linear(0.0, 10.0)),
                gen(2, -30.0, 0.0, CostModel::linear(0.0, 50.0)).as_dispatchable_load(),
            ],
        );
        let solution = solve(&network);
        assert!(solution.converged);
        let p = solution.generator_p();
        assert!((p[0] - 130.0).abs() < 1e-6);
        assert!((p[1] + 30.0).abs() < 1e-9);
        assert!((solution.objective_value + 200.0).abs() < 1e-4);
    }

    #[test]
    fn shut_down_units_are_dispatched_at_zero() {
        let mut network = network(
            80.0,
            vec![
                gen(1, 0.0, 200.0, CostModel::linear(0.0, 10.0)),
                gen(2, 20.0, 100.0, CostModel::linear(0.0, 5.0)),
            ],
        );
        network.shut_down_generator(1).unwrap();
        let solution = solve(&network);
        assert!(solution.converged);
        assert_eq!(solution.generator_p(), vec![80.0, 0.0]);
        assert_eq!(solution.multipliers[1], GenMultipliers::default());
        assert!(!solution.network.generator(1).unwrap().status);
    }

    #[test]
    fn demand_outside_limits_reports_non_convergence() {
        let units = || vec![gen(1, 10.0, 50.0, CostModel::linear(0.0, 10.0))];

        let short = solve(&network(80.0, units()));
        assert!(!short.converged);
        assert_eq!(short.generator_p(), vec![50.0]);

        let surplus = solve(&network(5.0, units()));
        assert!(!surplus.converged);
        assert_eq!(surplus.generator_p(), vec![10.0]);
    }

    #[test]
    fn demand_equal_to_floor_pins_every_unit() {
        let network = network(
            60.0,
            vec![
                gen(1, 20.0, 100.0, CostModel::linear(0.0, 10.0)),
                gen(2, 40.0, 100.0, CostModel::linear(0.0, 25.0)),
            ],
        );
        let solution = solve(&network);
        assert!(solution.converged);
        assert_eq!(solution.generator_p(), vec![20.0, 40.0]);
        assert_eq!(solution.system_lambda, 10.0);
        assert_eq!(solution.mu_pmin(0), 0.0);
        assert_eq!(solution.mu_pmin(1), 15.0);
    }

    #[test]
    fn bus_voltages_are_carried_through() {
        let network = network(10.0, vec![gen(1, 0.0, 50.0, CostModel::linear(0.0, 1.0))]);
        let solution = solve(&network);
        assert_eq!(solution.network.buses()[0].voltage_pu, PerUnit(1.04));
    }

    #[test]
    fn unbounded_limits_are_rejected() {
        let network = network(
            10.0,
            vec![Gen::new(GenId::new(1), "G1".into(), BusId::new(1))],
        );
        let result = EconomicDispatch::new().solve(&network, &SolverConfig::default());
        assert!(matches!(result, Err(OpfError::DataValidation(_))));
    }
}
