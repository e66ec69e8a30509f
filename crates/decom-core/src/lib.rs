//! # decom-core: Network snapshots for unit decommitment
//!
//! Provides the data structures the decommitment search operates on: a network
//! snapshot (buses with demand, generators with limits and cost models, branches),
//! the generator cost evaluator, and the deterministic tie-break selector.
//!
//! ## Design Philosophy
//!
//! A [`Network`] is a petgraph undirected graph whose nodes are [`Bus`] and [`Gen`]
//! records and whose edges are [`Branch`]es. Snapshots have **value semantics**: the
//! decommitment controller clones a snapshot for every trial, so shutting a unit down
//! in a trial can never leak into the stage baseline it was derived from. Nodes are
//! never removed, which keeps generator indices (position in [`Network::generators`])
//! stable across clones.
//!
//! ## Quick Start
//!
//! ```rust
//! use decom_core::*;
//!
//! let mut network = Network::new();
//! network.add_bus(Bus {
//!     id: BusId::new(1),
//!     name: "Bus 1".to_string(),
//!     pd: Megawatts(150.0),
//!     ..Bus::default()
//! });
//! network.add_gen(
//!     Gen::new(GenId::new(1), "Gen 1".to_string(), BusId::new(1))
//!         .with_p_limits(10.0, 200.0)
//!         .with_cost(CostModel::quadratic(0.0, 12.0, 0.01)),
//! );
//!
//! assert_eq!(network.in_service_generators(), vec![0]);
//! assert_eq!(network.load_capacity_mw(), Megawatts(150.0));
//! ```
//!
//! ## Modules
//!
//! - [`cost`] - Polynomial / piecewise-linear cost models and [`total_cost`]
//! - [`selection`] - [`fairmax`] arg-max with lowest-index tie-break
//! - [`diagnostics`] - Validation issue collection
//! - [`graph_utils`] - Island detection
//! - [`units`] - MW / Mvar / per-unit / radian newtypes

use petgraph::{prelude::*, Undirected};
use serde::{Deserialize, Serialize};

pub mod cost;
pub mod diagnostics;
pub mod error;
pub mod graph_utils;
pub mod selection;
pub mod units;

pub use cost::{polycost, total_cost, CostModel, PiecewiseCost};
pub use diagnostics::{DiagnosticIssue, Diagnostics, Severity};
pub use error::{DecomError, DecomResult};
pub use graph_utils::{find_islands, Island};
pub use petgraph::graph::NodeIndex;
pub use selection::fairmax;
pub use units::{Megavars, Megawatts, PerUnit, Radians};

// Newtype wrappers for IDs for type safety
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BusId(usize);
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BranchId(usize);
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GenId(usize);

impl BusId {
    #[inline]
    pub fn new(value: usize) -> Self {
        BusId(value)
    }
    #[inline]
    pub fn value(&self) -> usize {
        self.0
    }
}

impl BranchId {
    #[inline]
    pub fn new(value: usize) -> Self {
        BranchId(value)
    }
    #[inline]
    pub fn value(&self) -> usize {
        self.0
    }
}

impl GenId {
    #[inline]
    pub fn new(value: usize) -> Self {
        GenId(value)
    }
    #[inline]
    pub fn value(&self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bus {
    pub id: BusId,
    pub name: String,
    /// Active power demand
    pub pd: Megawatts,
    /// Reactive power demand
    pub qd: Megavars,
    /// Voltage magnitude (warm-start state between OPF calls)
    pub voltage_pu: PerUnit,
    /// Voltage angle (warm-start state between OPF calls)
    pub angle_rad: Radians,
    pub vmin_pu: Option<PerUnit>,
    pub vmax_pu: Option<PerUnit>,
}

impl Default for Bus {
    fn default() -> Self {
        Self {
            id: BusId(0),
            name: String::new(),
            pd: Megawatts(0.0),
            qd: Megavars(0.0),
            voltage_pu: PerUnit(1.0),
            angle_rad: Radians(0.0),
            vmin_pu: None,
            vmax_pu: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Branch {
    pub id: BranchId,
    pub name: String,
    pub from_bus: BusId,
    pub to_bus: BusId,
    /// Series resistance (per-unit)
    pub resistance: f64,
    /// Series reactance (per-unit)
    pub reactance: f64,
    /// Long-term thermal rating (MVA)
    pub rate_a: Option<f64>,
    pub status: bool,
}

impl Default for Branch {
    fn default() -> Self {
        Self {
            id: BranchId(0),
            name: String::new(),
            from_bus: BusId(0),
            to_bus: BusId(0),
            resistance: 0.0,
            reactance: 0.0,
            rate_a: None,
            status: true,
        }
    }
}

/// Whether a generator record produces power or is a curtailable load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenRole {
    #[default]
    Generator,
    /// Negative generation with a price-responsive consumption range `[pmin, 0]`
    DispatchableLoad,
}

impl GenRole {
    /// Case files do not tag dispatchable loads; they are recognised by `pmin < 0 && pmax == 0`.
    pub fn infer(pmin: f64, pmax: f64) -> Self {
        if pmin < 0.0 && pmax == 0.0 {
            GenRole::DispatchableLoad
        } else {
            GenRole::Generator
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gen {
    pub id: GenId,
    pub name: String,
    pub bus: BusId,
    /// Active power output (Pg)
    pub active_power: Megawatts,
    /// Reactive power output (Qg)
    pub reactive_power: Megavars,
    pub pmin: Megawatts,
    pub pmax: Megawatts,
    pub qmin: Megavars,
    pub qmax: Megavars,
    /// In-service status
    pub status: bool,
    pub role: GenRole,
    pub cost_model: CostModel,
}

impl Gen {
    /// Create an in-service generator with zero output, no limits and zero cost
    pub fn new(id: GenId, name: String, bus: BusId) -> Self {
        Self {
            id,
            name,
            bus,
            active_power: Megawatts(0.0),
            reactive_power: Megavars(0.0),
            pmin: Megawatts(0.0),
            pmax: Megawatts(f64::INFINITY),
            qmin: Megavars(f64::NEG_INFINITY),
            qmax: Megavars(f64::INFINITY),
            status: true,
            role: GenRole::Generator,
            cost_model: CostModel::default(),
        }
    }

    /// Set active power limits (in MW)
    pub fn with_p_limits(mut self, pmin: f64, pmax: f64) -> Self {
        self.pmin = Megawatts(pmin);
        self.pmax = Megawatts(pmax);
        self
    }

    /// Set reactive power limits (in Mvar)
    pub fn with_q_limits(mut self, qmin: f64, qmax: f64) -> Self {
        self.qmin = Megavars(qmin);
        self.qmax = Megavars(qmax);
        self
    }

    pub fn with_cost(mut self, cost: CostModel) -> Self {
        self.cost_model = cost;
        self
    }

    pub fn as_dispatchable_load(mut self) -> Self {
        self.role = GenRole::DispatchableLoad;
        self
    }

    pub fn is_dispatchable_load(&self) -> bool {
        self.role == GenRole::DispatchableLoad
    }

    /// In service and producing (not a dispatchable load)
    pub fn is_committed(&self) -> bool {
        self.status && !self.is_dispatchable_load()
    }

    /// Take the unit offline: status cleared, `Pg = Qg = 0`.
    pub fn shut_down(&mut self) {
        self.status = false;
        self.active_power = Megawatts(0.0);
        self.reactive_power = Megavars(0.0);
    }
}

#[derive(Debug, Clone)]
pub enum Node {
    Bus(Bus),
    Gen(Gen),
}

#[derive(Debug, Clone)]
pub enum Edge {
    Branch(Branch),
}

/// One static state of the grid
///
/// Generators must be added through [`Network::add_gen`] so their positions stay
/// indexable.
#[derive(Debug, Clone, Default)]
pub struct Network {
    pub graph: Graph<Node, Edge, Undirected>,
    gen_index: Vec<NodeIndex>,
}

impl Network {
    pub fn new() -> Self {
        Self {
            graph: Graph::new_undirected(),
            gen_index: Vec::new(),
        }
    }

    pub fn add_bus(&mut self, bus: Bus) -> NodeIndex {
        self.graph.add_node(Node::Bus(bus))
    }

    pub fn add_gen(&mut self, gen: Gen) -> NodeIndex {
        let node = self.graph.add_node(Node::Gen(gen));
        self.gen_index.push(node);
        node
    }

    /// Connect two existing buses; fails if either endpoint is unknown.
    pub fn add_branch(&mut self, branch: Branch) -> DecomResult<EdgeIndex> {
        let from = self.bus_node(branch.from_bus).ok_or_else(|| {
            DecomError::Validation(format!(
                "branch {} references unknown bus {}",
                branch.name,
                branch.from_bus.value()
            ))
        })?;
        let to = self.bus_node(branch.to_bus).ok_or_else(|| {
            DecomError::Validation(format!(
                "branch {} references unknown bus {}",
                branch.name,
                branch.to_bus.value()
            ))
        })?;
        Ok(self.graph.add_edge(from, to, Edge::Branch(branch)))
    }

    fn bus_node(&self, id: BusId) -> Option<NodeIndex> {
        self.graph
            .node_indices()
            .find(|&n| matches!(&self.graph[n], Node::Bus(b) if b.id == id))
    }

    /// Get all buses as a vector
    pub fn buses(&self) -> Vec<&Bus> {
        self.graph
            .node_weights()
            .filter_map(|n| match n {
                Node::Bus(b) => Some(b),
                _ => None,
            })
            .collect()
    }

    /// Get all generators (and dispatchable loads) in index order
    pub fn generators(&self) -> Vec<&Gen> {
        self.gen_index
            .iter()
            .filter_map(|&n| match &self.graph[n] {
                Node::Gen(g) => Some(g),
                _ => None,
            })
            .collect()
    }

    pub fn num_generators(&self) -> usize {
        self.gen_index.len()
    }

    pub fn generator(&self, index: usize) -> Option<&Gen> {
        let node = *self.gen_index.get(index)?;
        match &self.graph[node] {
            Node::Gen(g) => Some(g),
            _ => None,
        }
    }

    pub fn generator_mut(&mut self, index: usize) -> Option<&mut Gen> {
        let node = *self.gen_index.get(index)?;
        match &mut self.graph[node] {
            Node::Gen(g) => Some(g),
            _ => None,
        }
    }

    /// Mutable access to every generator in index order
    pub fn generators_mut(&mut self) -> impl Iterator<Item = &mut Gen> {
        self.graph.node_weights_mut().filter_map(|n| match n {
            Node::Gen(g) => Some(g),
            _ => None,
        })
    }

    pub fn branches(&self) -> Vec<&Branch> {
        self.graph
            .edge_weights()
            .map(|e| match e {
                Edge::Branch(b) => b,
            })
            .collect()
    }

    /// Indices of in-service generators that are not dispatchable loads
    pub fn in_service_generators(&self) -> Vec<usize> {
        self.generators()
            .iter()
            .enumerate()
            .filter(|(_, g)| g.is_committed())
            .map(|(i, _)| i)
            .collect()
    }

    /// Indices of in-service dispatchable loads
    pub fn in_service_dispatchable_loads(&self) -> Vec<usize> {
        self.generators()
            .iter()
            .enumerate()
            .filter(|(_, g)| g.status && g.is_dispatchable_load())
            .map(|(i, _)| i)
            .collect()
    }

    /// Total fixed bus demand
    pub fn total_demand_mw(&self) -> Megawatts {
        self.buses().iter().map(|b| b.pd).sum()
    }

    /// Demand the committed units must cover when every dispatchable load consumes its maximum.
    ///
    /// Dispatchable-load Pmin is negative, so this is `Σ Pd − Σ Pmin(loads)`.
    pub fn load_capacity_mw(&self) -> Megawatts {
        let generators = self.generators();
        let loads_pmin: Megawatts = self
            .in_service_dispatchable_loads()
            .into_iter()
            .map(|i| generators[i].pmin)
            .sum();
        self.total_demand_mw() - loads_pmin
    }

    /// Sum of Pmin over in-service, non-load generators
    pub fn committed_pmin_mw(&self) -> Megawatts {
        let generators = self.generators();
        self.in_service_generators()
            .into_iter()
            .map(|i| generators[i].pmin)
            .sum()
    }

    /// Sum of finite Pmax over in-service, non-load generators
    pub fn committed_capacity_mw(&self) -> Megawatts {
        let generators = self.generators();
        self.in_service_generators()
            .into_iter()
            .map(|i| generators[i].pmax)
            .filter(|p| p.is_finite())
            .sum()
    }

    /// Force generator `index` offline (status cleared, `Pg = Qg = 0`).
    pub fn shut_down_generator(&mut self, index: usize) -> DecomResult<()> {
        let count = self.num_generators();
        let gen = self.generator_mut(index).ok_or_else(|| {
            DecomError::Validation(format!(
                "generator index {index} out of range ({count} generators)"
            ))
        })?;
        gen.shut_down();
        Ok(())
    }

    /// Compute basic statistics about the snapshot
    pub fn stats(&self) -> NetworkStats {
        let generators = self.generators();
        NetworkStats {
            num_buses: self.buses().len(),
            num_gens: generators.len(),
            num_committed: self.in_service_generators().len(),
            num_dispatchable_loads: generators.iter().filter(|g| g.is_dispatchable_load()).count(),
            num_branches: self.graph.edge_count(),
            total_demand_mw: self.total_demand_mw().value(),
            committed_capacity_mw: self.committed_capacity_mw().value(),
            committed_pmin_mw: self.committed_pmin_mw().value(),
        }
    }

    /// Check the snapshot for problems that make the decommitment search meaningless
    /// or that it will have to repair.
    pub fn validate_into(&self, diag: &mut Diagnostics) {
        let stats = self.stats();

        if stats.num_buses == 0 {
            diag.add_error("structure", "Network has no buses");
            return;
        }
        if stats.num_gens == 0 {
            diag.add_error("structure", "Network has no generators");
        }

        let buses = self.buses();
        for gen in self.generators() {
            let entity = format!("Gen {}", gen.id.value());
            if gen.pmin > gen.pmax {
                diag.add_error_with_entity(
                    "limits",
                    &format!("Pmin {} exceeds Pmax {}", gen.pmin, gen.pmax),
                    &entity,
                );
            }
            if !buses.iter().any(|b| b.id == gen.bus) {
                diag.add_error_with_entity(
                    "reference",
                    &format!("Generator references unknown bus {}", gen.bus.value()),
                    &entity,
                );
            }
            if let CostModel::Polynomial(coeffs) = &gen.cost_model {
                if coeffs.iter().any(|c| !c.is_finite()) {
                    diag.add_error_with_entity(
                        "cost",
                        "Polynomial cost has non-finite coefficients",
                        &entity,
                    );
                }
            }
        }

        if stats.committed_capacity_mw < self.load_capacity_mw().value() {
            diag.add_warning(
                "capacity",
                &format!(
                    "Committed capacity ({:.1} MW) is below demand ({:.1} MW)",
                    stats.committed_capacity_mw,
                    self.load_capacity_mw().value()
                ),
            );
        }
        if stats.committed_pmin_mw > self.load_capacity_mw().value() {
            diag.add_warning(
                "capacity",
                &format!(
                    "Sum of Pmin ({:.1} MW) exceeds demand ({:.1} MW); units will be shed",
                    stats.committed_pmin_mw,
                    self.load_capacity_mw().value()
                ),
            );
        }

        for edge in self.graph.edge_weights().filter(|e| !e.in_service()) {
            diag.add_warning_with_entity("topology", "Branch is out of service", edge.label());
        }

        let islands = find_islands(self);
        if islands.len() > 1 && stats.num_branches > 0 {
            diag.add_warning(
                "topology",
                &format!("Network splits into {} islands", islands.len()),
            );
        }
    }

    /// Validate and fail on the first error-level issue.
    pub fn validate(&self) -> DecomResult<Diagnostics> {
        let mut diag = Diagnostics::new();
        self.validate_into(&mut diag);
        if let Some(issue) = diag.errors().next() {
            return Err(DecomError::Validation(issue.to_string()));
        }
        Ok(diag)
    }
}

/// Statistics about a snapshot's size and commitment
#[derive(Debug, Clone, Default, Serialize)]
pub struct NetworkStats {
    pub num_buses: usize,
    pub num_gens: usize,
    pub num_committed: usize,
    pub num_dispatchable_loads: usize,
    pub num_branches: usize,
    pub total_demand_mw: f64,
    pub committed_capacity_mw: f64,
    pub committed_pmin_mw: f64,
}

impl std::fmt::Display for NetworkStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} buses, {} branches, {} gens ({} committed, {:.0} MW), {:.0} MW demand",
            self.num_buses,
            self.num_branches,
            self.num_gens,
            self.num_committed,
            self.committed_capacity_mw,
            self.total_demand_mw
        )
    }
}

impl Node {
    /// Returns a human-readable label for the node (bus/gen name).
    pub fn label(&self) -> &str {
        match self {
            Node::Bus(bus) => &bus.name,
            Node::Gen(gen) => &gen.name,
        }
    }
}

impl Edge {
    pub fn label(&self) -> &str {
        match self {
            Edge::Branch(branch) => &branch.name,
        }
    }

    pub fn in_service(&self) -> bool {
        match self {
            Edge::Branch(branch) => branch.status,
        }
    }
}
