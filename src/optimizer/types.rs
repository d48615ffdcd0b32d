use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::Serialize;

/// Composite key for per-measure parameters (start cost, duration,
/// regeneration time). Indices are 1-based, matching the wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeasureKey {
    pub flexibility: u32,
    pub measure: u32,
}

impl fmt::Display for MeasureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.flexibility, self.measure)
    }
}

/// Composite key for the power trace of a measure: `offset` is the 1-based
/// position within the measure's duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PowerKey {
    pub flexibility: u32,
    pub measure: u32,
    pub offset: u32,
}

impl fmt::Display for PowerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{},{})", self.flexibility, self.measure, self.offset)
    }
}

/// One temporal dependency between two flexibilities: an event of `first`
/// is related to a window `[from, to]` of interval offsets around an event
/// of `second`. Window bounds may be negative (looking backwards in time).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DependencyArc {
    pub first: u32,
    pub second: u32,
    pub from: i64,
    pub to: i64,
}

/// The eight dependency families, named by the constraint they compile to:
/// `<first event> <implies|excludes> <second event>` where the second event
/// is summed over the offset window.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dependencies {
    pub start_implies_start: Vec<DependencyArc>,
    pub start_implies_end: Vec<DependencyArc>,
    pub end_implies_start: Vec<DependencyArc>,
    pub end_implies_end: Vec<DependencyArc>,
    pub start_excludes_start: Vec<DependencyArc>,
    pub start_excludes_end: Vec<DependencyArc>,
    pub end_excludes_start: Vec<DependencyArc>,
    pub end_excludes_end: Vec<DependencyArc>,
}

impl Dependencies {
    pub fn iter_all(&self) -> impl Iterator<Item = &DependencyArc> {
        self.start_implies_start
            .iter()
            .chain(&self.start_implies_end)
            .chain(&self.end_implies_start)
            .chain(&self.end_implies_end)
            .chain(&self.start_excludes_start)
            .chain(&self.start_excludes_end)
            .chain(&self.end_excludes_start)
            .chain(&self.end_excludes_end)
    }
}

/// Normalized, strongly-typed optimization parameters. Produced by the
/// payload normalizer; the model builder consumes it read-only.
#[derive(Debug, Clone, Default)]
pub struct ModelInput {
    /// Number of scheduling intervals in the horizon (`T`).
    pub horizon: u32,
    /// Duration of one interval, in hours.
    pub interval_hours: f64,
    /// Market price per interval. May contain entries beyond the horizon;
    /// they are echoed back to the client but never enter the model.
    pub prices: BTreeMap<u32, f64>,
    pub start_cost: HashMap<MeasureKey, f64>,
    pub power: HashMap<PowerKey, f64>,
    pub duration: HashMap<MeasureKey, u32>,
    pub regeneration: HashMap<MeasureKey, u32>,
    /// Per-flexibility activation count bounds, indexed by `f - 1`.
    pub usage_min: Vec<u32>,
    pub usage_max: Vec<u32>,
    /// `validity[f - 1][t - 1]` is 1 when a measure may start at `t`.
    pub validity: Vec<Vec<u8>>,
    pub times: Vec<u32>,
    pub measures: Vec<u32>,
    /// Power-trace offsets `1..=L` where `L` is the longest measure.
    pub offsets: Vec<u32>,
    pub flexibilities: Vec<u32>,
    /// How many of the global measures are registered per flexibility,
    /// indexed by `f - 1`.
    pub measures_per_flexibility: Vec<u32>,
    pub dependencies: Dependencies,
}

/// Solver outcome classification, per the solver seam contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SolverStatus {
    /// Proven optimal solution.
    Optimal,
    /// A solution exists but optimality was not proven (time budget hit).
    Feasible,
    /// Proven that no assignment satisfies the constraints.
    Infeasible,
    /// The objective can be improved without bound.
    Unbounded,
    /// The solver stopped without producing any solution.
    NotSolved,
}

impl fmt::Display for SolverStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SolverStatus::Optimal => "Optimal",
            SolverStatus::Feasible => "Feasible",
            SolverStatus::Infeasible => "Infeasible",
            SolverStatus::Unbounded => "Unbounded",
            SolverStatus::NotSolved => "NotSolved",
        };
        write!(f, "{name}")
    }
}

/// One scheduled activation: flexibility, measure, start interval.
/// Serializes as `[f, m, t]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Activation(pub u32, pub u32, pub u32);

/// Domain-level result of one optimization call, extracted from the solved
/// assignment. Field names follow the service's wire contract.
#[derive(Debug, Clone, Serialize)]
pub struct OptimizationOutcome {
    #[serde(rename = "Day_ahead_prices")]
    pub day_ahead_prices: BTreeMap<u32, f64>,
    #[serde(rename = "totalSavings")]
    pub total_savings: f64,
    #[serde(rename = "totalEnergyConsumption")]
    pub total_energy_consumption: f64,
    pub activated_measures: Vec<Activation>,
}
