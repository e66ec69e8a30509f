//! Fixtures and a scripted backend for exercising the decommitment search.

use std::collections::HashMap;
use std::sync::Mutex;

use decom_core::{Bus, BusId, CostModel, Gen, GenId, Megawatts, Network};

use crate::opf::{OpfBackend, OpfError, OpfSolution, SolverConfig};

pub fn bus(id: usize, pd_mw: f64) -> Bus {
    Bus {
        id: BusId::new(id),
        name: format!("Bus {id}"),
        pd: Megawatts(pd_mw),
        ..Bus::default()
    }
}

/// Generator `G{id}` on bus 1
pub fn generator(id: usize, pmin: f64, pmax: f64, cost: CostModel) -> Gen {
    Gen::new(GenId::new(id), format!("G{id}"), BusId::new(1))
        .with_p_limits(pmin, pmax)
        .with_cost(cost)
}

pub fn network_with(buses: &[Bus], generators: Vec<Gen>) -> Network {
    let mut network = Network::new();
    for bus in buses {
        network.add_bus(bus.clone());
    }
    for gen in generators {
        network.add_gen(gen);
    }
    network
}

/// Three units serving 150 MW where shutting down the dearest pinned unit pays off once.
///
/// Initial dispatch is G1 = 80, G2 = 30, G3 = 40 at $3000/hr. Shutting down G3 drops
/// the cost to $2100/hr; G2 is then still pinned, but G1 alone cannot carry the load.
pub fn decommit_case() -> Network {
    network_with(
        &[bus(1, 150.0)],
        vec![
            generator(1, 0.0, 130.0, CostModel::linear(100.0, 10.0)),
            generator(2, 30.0, 100.0, CostModel::linear(200.0, 20.0)),
            generator(3, 40.0, 100.0, CostModel::linear(300.0, 25.0)),
        ],
    )
}

#[derive(Debug, Clone)]
enum Scripted {
    Solved {
        converged: bool,
        cost: f64,
        pinned: Vec<(usize, f64)>,
    },
    Error(OpfError),
}

/// Backend that answers from a table keyed by the set of offline generators.
///
/// Unscripted configurations return [`OpfError::DataValidation`]. Every call is
/// recorded so tests can check which configurations the search visited.
#[derive(Debug, Default)]
pub struct ScriptedBackend {
    script: HashMap<Vec<usize>, Scripted>,
    calls: Mutex<Vec<Vec<usize>>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(offline: &[usize]) -> Vec<usize> {
        let mut key = offline.to_vec();
        key.sort_unstable();
        key
    }

    /// Converged result with `cost` and the given `(generator, mu_pmin)` multipliers
    pub fn with_solution(mut self, offline: &[usize], cost: f64, pinned: &[(usize, f64)]) -> Self {
        self.script.insert(
            Self::key(offline),
            Scripted::Solved {
                converged: true,
                cost,
                pinned: pinned.to_vec(),
            },
        );
        self
    }

    /// Non-converged result that still carries a cost
    pub fn with_failure(mut self, offline: &[usize], cost: f64) -> Self {
        self.script.insert(
            Self::key(offline),
            Scripted::Solved {
                converged: false,
                cost,
                pinned: Vec::new(),
            },
        );
        self
    }

    pub fn with_error(mut self, offline: &[usize], error: OpfError) -> Self {
        self.script.insert(Self::key(offline), Scripted::Error(error));
        self
    }

    /// Offline sets seen so far, in call order
    pub fn calls(&self) -> Vec<Vec<usize>> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl OpfBackend for ScriptedBackend {
    fn id(&self) -> &str {
        "scripted"
    }

    fn solve(&self, network: &Network, _config: &SolverConfig) -> Result<OpfSolution, OpfError> {
        let offline: Vec<usize> = network
            .generators()
            .iter()
            .enumerate()
            .filter(|(_, g)| !g.status)
            .map(|(i, _)| i)
            .collect();
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(offline.clone());

        match self.script.get(&offline) {
            Some(Scripted::Solved {
                converged,
                cost,
                pinned,
            }) => {
                let mut solution = OpfSolution::unsolved(network.clone());
                solution.converged = *converged;
                solution.objective_value = *cost;
                for &(gen, mu) in pinned {
                    if let Some(m) = solution.multipliers.get_mut(gen) {
                        m.mu_pmin = mu;
                    }
                }
                Ok(solution)
            }
            Some(Scripted::Error(err)) => Err(err.clone()),
            None => Err(OpfError::DataValidation(format!(
                "no scripted result for offline set {offline:?}"
            ))),
        }
    }
}
