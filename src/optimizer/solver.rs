//! The solver seam: a backend-neutral trait plus the CBC adapter.
//!
//! CBC runs with a hard wall-clock budget. Hitting the budget with an
//! incumbent in hand is not a failure: the adapter reports `Feasible` and
//! hands the incumbent back.

use std::time::Duration;

use coin_cbc::{raw::Status, Col, Model, Sense};
use tracing::debug;

use super::error::OptimizeError;
use super::problem::{Comparison, MilpProblem, ObjectiveSense, VarKind};
use super::types::SolverStatus;

/// CBC reports `COIN_DBL_MAX`-sized objective values when it has no
/// meaningful incumbent.
const CBC_NO_SOLUTION_MAGNITUDE: f64 = 1e30;

/// A solved (or failed) assignment: one value per [`super::problem::VarId`],
/// in id order.
#[derive(Debug, Clone)]
pub struct MilpSolution {
    pub status: SolverStatus,
    pub values: Vec<f64>,
    pub objective: f64,
}

pub trait MilpSolver: Send + Sync {
    fn solve(&self, problem: &MilpProblem) -> Result<MilpSolution, OptimizeError>;
}

/// COIN-OR CBC behind the [`MilpSolver`] seam.
pub struct CbcSolver {
    time_limit: Duration,
}

impl CbcSolver {
    pub fn new(time_limit: Duration) -> Self {
        Self { time_limit }
    }
}

impl Default for CbcSolver {
    fn default() -> Self {
        Self::new(Duration::from_secs(300))
    }
}

impl MilpSolver for CbcSolver {
    fn solve(&self, problem: &MilpProblem) -> Result<MilpSolution, OptimizeError> {
        // A model with no variables has the empty assignment as its
        // optimum; CBC is not consulted.
        if problem.num_vars() == 0 {
            return Ok(MilpSolution {
                status: SolverStatus::Optimal,
                values: Vec::new(),
                objective: 0.0,
            });
        }

        let mut model = Model::default();
        let cols: Vec<Col> = problem
            .var_kinds()
            .iter()
            .map(|kind| match kind {
                VarKind::Binary => model.add_binary(),
                VarKind::Free => {
                    let col = model.add_col();
                    model.set_col_lower(col, f64::NEG_INFINITY);
                    model.set_col_upper(col, f64::INFINITY);
                    col
                }
            })
            .collect();

        for constraint in &problem.constraints {
            let row = model.add_row();
            for (var, coeff) in constraint.expr.iter() {
                model.set_weight(row, cols[var], coeff);
            }
            match constraint.cmp {
                Comparison::LessOrEqual => model.set_row_upper(row, constraint.rhs),
                Comparison::GreaterOrEqual => model.set_row_lower(row, constraint.rhs),
                Comparison::Equal => model.set_row_equal(row, constraint.rhs),
            }
        }

        for (var, coeff) in problem.objective.iter() {
            model.set_obj_coeff(cols[var], coeff);
        }
        model.set_obj_sense(match problem.sense {
            ObjectiveSense::Maximize => Sense::Maximize,
            ObjectiveSense::Minimize => Sense::Minimize,
        });

        model.set_parameter("logLevel", "0");
        model.set_parameter("seconds", &self.time_limit.as_secs_f64().to_string());

        let solution = model.solve();
        let raw = solution.raw();

        let status = match raw.status() {
            Status::Finished => {
                if raw.is_proven_infeasible() {
                    SolverStatus::Infeasible
                } else if raw.is_proven_optimal() {
                    SolverStatus::Optimal
                } else if raw.obj_value().abs() >= CBC_NO_SOLUTION_MAGNITUDE {
                    SolverStatus::Unbounded
                } else {
                    SolverStatus::Feasible
                }
            }
            Status::Stopped => {
                // Time budget hit. An incumbent shows up as a finite
                // objective; otherwise the search produced nothing.
                if raw.obj_value().abs() < CBC_NO_SOLUTION_MAGNITUDE {
                    SolverStatus::Feasible
                } else {
                    SolverStatus::NotSolved
                }
            }
            other => {
                return Err(OptimizeError::Solver(format!(
                    "CBC terminated abnormally: {other:?}"
                )));
            }
        };
        debug!(status = %status, objective = raw.obj_value(), "CBC finished");

        let values = cols.iter().map(|&col| solution.col(col)).collect();
        Ok(MilpSolution { status, values, objective: raw.obj_value() })
    }
}
