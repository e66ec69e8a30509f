use decom_core::Network;
use serde::Serialize;

/// Type of constraint for reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConstraintType {
    GeneratorPMax,
    GeneratorPMin,
    PowerBalance,
}

/// Information about a binding constraint
#[derive(Debug, Clone, Serialize)]
pub struct ConstraintInfo {
    pub name: String,
    pub constraint_type: ConstraintType,
    pub value: f64,
    pub limit: f64,
    pub shadow_price: f64,
}

/// Kuhn-Tucker multipliers on one generator's active power limits ($/MWh).
///
/// A positive `mu_pmin` means the unit is pinned at its floor and the dispatch
/// would like to run it lower.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct GenMultipliers {
    pub mu_pmin: f64,
    pub mu_pmax: f64,
}

/// OPF solution output
#[derive(Debug, Clone, Serialize)]
pub struct OpfSolution {
    // === Status ===
    pub converged: bool,
    pub iterations: usize,
    pub solve_time_ms: u128,

    // === Objective ===
    pub objective_value: f64,

    // === Primal Variables ===
    /// Solved snapshot: generator outputs written back, bus voltages kept as warm start
    #[serde(skip)]
    pub network: Network,

    // === Dual Variables ===
    /// Price of the power balance constraint ($/MWh)
    pub system_lambda: f64,
    /// Indexed like [`Network::generators`]
    pub multipliers: Vec<GenMultipliers>,

    // === Constraint Info ===
    pub binding_constraints: Vec<ConstraintInfo>,
}

impl OpfSolution {
    /// An unsolved result carrying `network` through unchanged
    pub fn unsolved(network: Network) -> Self {
        let n_gen = network.generators().len();
        Self {
            converged: false,
            iterations: 0,
            solve_time_ms: 0,
            objective_value: 0.0,
            network,
            system_lambda: 0.0,
            multipliers: vec![GenMultipliers::default(); n_gen],
            binding_constraints: Vec::new(),
        }
    }

    /// Multiplier on generator `index`'s Pmin limit (0 when unknown)
    pub fn mu_pmin(&self, index: usize) -> f64 {
        self.multipliers.get(index).map_or(0.0, |m| m.mu_pmin)
    }

    /// Active power output per generator, indexed like [`Network::generators`]
    pub fn generator_p(&self) -> Vec<f64> {
        self.network
            .generators()
            .iter()
            .map(|g| g.active_power.value())
            .collect()
    }
}
