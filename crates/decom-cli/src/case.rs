//! Case files: buses, generators and branches in JSON or TOML.
//!
//! ```json
//! {
//!   "buses": [{ "id": 1, "pd": 150.0 }],
//!   "generators": [
//!     { "bus": 1, "pmin": 10.0, "pmax": 200.0, "cost": { "polynomial": [0.01, 12.0, 0.0] } },
//!     { "bus": 1, "pmin": 0.0, "pmax": 100.0, "cost": { "piecewise": [[0, 0], [100, 1500]] } }
//!   ],
//!   "branches": []
//! }
//! ```
//!
//! Polynomial coefficients are listed highest order first. A generator with
//! `pmin < 0` and `pmax == 0` is read as a dispatchable load unless
//! `dispatchable_load` says otherwise.

use std::path::Path;

use anyhow::{Context, Result};
use decom_core::{
    Branch, BranchId, Bus, BusId, CostModel, DecomError, DecomResult, Gen, GenId, GenRole, Megavars,
    Megawatts, Network, PerUnit, Radians,
};
use serde::{Deserialize, Serialize};

fn default_vm() -> f64 {
    1.0
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseFile {
    pub buses: Vec<CaseBus>,
    pub generators: Vec<CaseGen>,
    #[serde(default)]
    pub branches: Vec<CaseBranch>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseBus {
    pub id: usize,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub pd: f64,
    #[serde(default)]
    pub qd: f64,
    #[serde(default = "default_vm")]
    pub vm: f64,
    /// Voltage angle in degrees
    #[serde(default)]
    pub va: f64,
    #[serde(default)]
    pub vmin: Option<f64>,
    #[serde(default)]
    pub vmax: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseGen {
    /// Defaults to the 1-based position in the file
    #[serde(default)]
    pub id: Option<usize>,
    #[serde(default)]
    pub name: Option<String>,
    pub bus: usize,
    #[serde(default)]
    pub pg: f64,
    #[serde(default)]
    pub qg: f64,
    pub pmin: f64,
    pub pmax: f64,
    #[serde(default)]
    pub qmin: Option<f64>,
    #[serde(default)]
    pub qmax: Option<f64>,
    #[serde(default = "default_true")]
    pub status: bool,
    #[serde(default)]
    pub dispatchable_load: Option<bool>,
    pub cost: CaseCost,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseCost {
    /// Coefficients, highest order first
    Polynomial(Vec<f64>),
    /// `(MW, $/hr)` breakpoints
    Piecewise(Vec<(f64, f64)>),
}

impl CaseCost {
    fn into_model(self) -> DecomResult<CostModel> {
        match self {
            CaseCost::Polynomial(coeffs) => Ok(CostModel::from_highest_first(&coeffs)),
            CaseCost::Piecewise(points) => CostModel::piecewise(points),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseBranch {
    #[serde(default)]
    pub name: Option<String>,
    pub from: usize,
    pub to: usize,
    #[serde(default)]
    pub r: f64,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub rate_a: Option<f64>,
    #[serde(default = "default_true")]
    pub status: bool,
}

impl CaseFile {
    /// Parse a case; `.toml` files are read as TOML, anything else as JSON.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading case {}", path.display()))?;
        let is_toml = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
        let parsed: Result<Self, DecomError> = if is_toml {
            toml::from_str(&contents).map_err(|e| DecomError::Parse(e.to_string()))
        } else {
            serde_json::from_str(&contents).map_err(|e| DecomError::Parse(e.to_string()))
        };
        parsed.with_context(|| format!("parsing case {}", path.display()))
    }

    pub fn into_network(self) -> DecomResult<Network> {
        let mut network = Network::new();

        for bus in self.buses {
            network.add_bus(Bus {
                id: BusId::new(bus.id),
                name: bus.name.unwrap_or_else(|| format!("Bus {}", bus.id)),
                pd: Megawatts(bus.pd),
                qd: Megavars(bus.qd),
                voltage_pu: PerUnit(bus.vm),
                angle_rad: Radians::from_degrees(bus.va),
                vmin_pu: bus.vmin.map(PerUnit),
                vmax_pu: bus.vmax.map(PerUnit),
            });
        }

        for (position, gen) in self.generators.into_iter().enumerate() {
            let id = gen.id.unwrap_or(position + 1);
            let role = match gen.dispatchable_load {
                Some(true) => GenRole::DispatchableLoad,
                Some(false) => GenRole::Generator,
                None => GenRole::infer(gen.pmin, gen.pmax),
            };
            let mut record = Gen::new(
                GenId::new(id),
                gen.name.unwrap_or_else(|| format!("Gen {id}")),
                BusId::new(gen.bus),
            )
            .with_p_limits(gen.pmin, gen.pmax)
            .with_q_limits(
                gen.qmin.unwrap_or(f64::NEG_INFINITY),
                gen.qmax.unwrap_or(f64::INFINITY),
            )
            .with_cost(gen.cost.into_model()?);
            record.role = role;
            record.status = gen.status;
            if gen.status {
                record.active_power = Megawatts(gen.pg);
                record.reactive_power = Megavars(gen.qg);
            }
            network.add_gen(record);
        }

        for (position, branch) in self.branches.into_iter().enumerate() {
            network.add_branch(Branch {
                id: BranchId::new(position + 1),
                name: branch
                    .name
                    .unwrap_or_else(|| format!("Branch {}-{}", branch.from, branch.to)),
                from_bus: BusId::new(branch.from),
                to_bus: BusId::new(branch.to),
                resistance: branch.r,
                reactance: branch.x,
                rate_a: branch.rate_a,
                status: branch.status,
            })?;
        }

        Ok(network)
    }
}

/// Read a case file and build its network snapshot.
pub fn load_network(path: &Path) -> Result<Network> {
    CaseFile::load(path)?
        .into_network()
        .with_context(|| format!("building network from {}", path.display()))
}
