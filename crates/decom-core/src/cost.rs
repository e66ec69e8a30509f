//! Generator cost models and the total-cost evaluator.
//!
//! Two model families are supported:
//!
//! - **Polynomial**: `cost(P) = Σ c_i · P^i`, coefficients stored lowest order first
//!   (`[c0, c1, c2]` is `c0 + c1·P + c2·P²`). Case files list coefficients highest order
//!   first; use [`CostModel::from_highest_first`] for those.
//! - **Piecewise linear**: an ordered table of `(MW, $/hr)` breakpoints with strictly
//!   increasing power. Tables with fewer than two points are rejected when the model is
//!   built, never at evaluation time.
//!
//! ## Segment selection
//!
//! Segments are scanned from the lowest. The first segment whose upper breakpoint is
//! strictly greater than the operating point supplies the line `m·P + b`. An operating
//! point exactly on an interior breakpoint therefore uses the *next* segment's line,
//! and a point at or beyond the last breakpoint extrapolates the final segment. Points
//! below the first breakpoint extrapolate the first segment.
//!
//! ```
//! use decom_core::cost::CostModel;
//!
//! let pwl = CostModel::piecewise(vec![(0.0, 0.0), (10.0, 100.0), (20.0, 300.0)]).unwrap();
//! assert_eq!(pwl.evaluate(5.0), 50.0);
//! assert_eq!(pwl.evaluate(15.0), 200.0);
//! assert_eq!(pwl.evaluate(25.0), 400.0);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{DecomError, DecomResult};

/// Validated piecewise-linear cost table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<(f64, f64)>", into = "Vec<(f64, f64)>")]
pub struct PiecewiseCost {
    points: Vec<(f64, f64)>,
}

impl PiecewiseCost {
    /// Build a table from `(MW, $/hr)` breakpoints.
    pub fn new(points: Vec<(f64, f64)>) -> DecomResult<Self> {
        if points.len() < 2 {
            return Err(DecomError::Validation(format!(
                "piecewise cost needs at least 2 breakpoints, got {}",
                points.len()
            )));
        }
        if points.iter().any(|(p, c)| !p.is_finite() || !c.is_finite()) {
            return Err(DecomError::Validation(
                "piecewise cost breakpoints must be finite".to_string(),
            ));
        }
        if let Some(w) = points.windows(2).find(|w| w[1].0 <= w[0].0) {
            return Err(DecomError::Validation(format!(
                "piecewise cost power values must be strictly increasing ({} then {})",
                w[0].0, w[1].0
            )));
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    /// Slope and intercept of the segment selected for `p_mw`.
    fn line_at(&self, p_mw: f64) -> (f64, f64) {
        let mut line = (0.0, 0.0);
        for w in self.points.windows(2) {
            let ((p1, c1), (p2, c2)) = (w[0], w[1]);
            let m = (c2 - c1) / (p2 - p1);
            line = (m, c1 - m * p1);
            if p_mw < p2 {
                break;
            }
        }
        line
    }

    pub fn evaluate(&self, p_mw: f64) -> f64 {
        let (m, b) = self.line_at(p_mw);
        m * p_mw + b
    }

    pub fn slope_at(&self, p_mw: f64) -> f64 {
        self.line_at(p_mw).0
    }
}

impl TryFrom<Vec<(f64, f64)>> for PiecewiseCost {
    type Error = DecomError;

    fn try_from(points: Vec<(f64, f64)>) -> Result<Self, Self::Error> {
        Self::new(points)
    }
}

impl From<PiecewiseCost> for Vec<(f64, f64)> {
    fn from(cost: PiecewiseCost) -> Self {
        cost.points
    }
}

/// Generator cost model for OPF and decommitment ranking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostModel {
    /// Polynomial cost, coefficients lowest order first.
    Polynomial(Vec<f64>),
    /// Piecewise linear cost over validated breakpoints.
    PiecewiseLinear(PiecewiseCost),
}

impl Default for CostModel {
    fn default() -> Self {
        CostModel::Polynomial(Vec::new())
    }
}

impl CostModel {
    /// Create quadratic cost: c0 + c1*P + c2*P^2
    pub fn quadratic(c0: f64, c1: f64, c2: f64) -> Self {
        CostModel::Polynomial(vec![c0, c1, c2])
    }

    /// Create linear cost: c0 + c1*P
    pub fn linear(c0: f64, c1: f64) -> Self {
        CostModel::Polynomial(vec![c0, c1])
    }

    /// Polynomial from coefficients listed highest order first (`[a, b, c]` is `a·P² + b·P + c`).
    pub fn from_highest_first(coeffs: &[f64]) -> Self {
        CostModel::Polynomial(coeffs.iter().rev().copied().collect())
    }

    pub fn piecewise(points: Vec<(f64, f64)>) -> DecomResult<Self> {
        PiecewiseCost::new(points).map(CostModel::PiecewiseLinear)
    }

    /// Evaluate cost at given power output ($/hr)
    pub fn evaluate(&self, p_mw: f64) -> f64 {
        match self {
            CostModel::Polynomial(coeffs) => polycost(coeffs, &[p_mw])[0],
            CostModel::PiecewiseLinear(table) => table.evaluate(p_mw),
        }
    }

    /// Marginal cost at `p_mw` ($/MWh).
    ///
    /// For piecewise tables this is the slope of the segment `evaluate` would use, i.e.
    /// the right-hand derivative at a breakpoint.
    pub fn marginal_cost(&self, p_mw: f64) -> f64 {
        match self {
            CostModel::Polynomial(coeffs) => coeffs
                .iter()
                .enumerate()
                .skip(1)
                .rev()
                .fold(0.0, |acc, (i, c)| acc * p_mw + (i as f64) * c),
            CostModel::PiecewiseLinear(table) => table.slope_at(p_mw),
        }
    }

    /// Cost per MW at `p_mw`. Not finite when `p_mw` is zero.
    pub fn average_cost(&self, p_mw: f64) -> f64 {
        self.evaluate(p_mw) / p_mw
    }

    pub fn is_piecewise(&self) -> bool {
        matches!(self, CostModel::PiecewiseLinear(_))
    }
}

/// Evaluate a polynomial (coefficients lowest order first) at each operating point.
pub fn polycost(coeffs: &[f64], points: &[f64]) -> Vec<f64> {
    points
        .iter()
        .map(|&p| coeffs.iter().rev().fold(0.0, |acc, c| acc * p + c))
        .collect()
}

/// Total cost of each generator at the matching operating point.
///
/// `models[i]` is evaluated at `pg[i]`; the result has the same length as `pg`.
/// Polynomial rows are handed to [`polycost`], piecewise rows use the segment scan
/// described in the module docs.
pub fn total_cost(models: &[CostModel], pg: &[f64]) -> DecomResult<Vec<f64>> {
    if models.len() != pg.len() {
        return Err(DecomError::Validation(format!(
            "total_cost: {} cost models but {} operating points",
            models.len(),
            pg.len()
        )));
    }

    let mut costs = vec![0.0; pg.len()];
    let (piecewise, polynomial): (Vec<usize>, Vec<usize>) =
        (0..models.len()).partition(|&i| models[i].is_piecewise());

    for i in piecewise {
        if let CostModel::PiecewiseLinear(table) = &models[i] {
            costs[i] = table.evaluate(pg[i]);
        }
    }
    for i in polynomial {
        if let CostModel::Polynomial(coeffs) = &models[i] {
            costs[i] = polycost(coeffs, &pg[i..=i])[0];
        }
    }

    Ok(costs)
}
