//! Reads the solved assignment back into domain terms.

use itertools::iproduct;

use super::builder::FlexModel;
use super::error::OptimizeError;
use super::solver::MilpSolution;
use super::types::{Activation, ModelInput, OptimizationOutcome, SolverStatus};

/// MILP backends return binaries as floats with integrality tolerance;
/// anything above one half counts as set.
pub const BINARY_SET_THRESHOLD: f64 = 0.5;

/// Turns a solver result into the wire-level outcome, or the matching
/// error when the solve produced nothing usable.
pub fn extract(
    model: &FlexModel,
    input: &ModelInput,
    solution: &MilpSolution,
) -> Result<(SolverStatus, OptimizationOutcome), OptimizeError> {
    match solution.status {
        SolverStatus::Infeasible => return Err(OptimizeError::Infeasible),
        SolverStatus::NotSolved => return Err(OptimizeError::Unsolved),
        SolverStatus::Unbounded => {
            return Err(OptimizeError::Solver("objective is unbounded".into()))
        }
        SolverStatus::Optimal | SolverStatus::Feasible => {}
    }

    let mut activated_measures = Vec::new();
    for (&f, &m, &t) in iproduct!(&input.flexibilities, &input.measures, &input.times) {
        if solution.values[model.y(f, m, t)] > BINARY_SET_THRESHOLD {
            activated_measures.push(Activation(f, m, t));
        }
    }

    // The accounting variables carry avoided consumption as positive
    // energy; the reported total flips the sign back to consumption.
    let total_energy_consumption: f64 = -iproduct!(&input.flexibilities, &input.measures)
        .map(|(&f, &m)| solution.values[model.energy_var(f, m)])
        .sum::<f64>();

    let outcome = OptimizationOutcome {
        day_ahead_prices: input.prices.clone(),
        total_savings: solution.objective,
        total_energy_consumption,
        activated_measures,
    };
    Ok((solution.status, outcome))
}
