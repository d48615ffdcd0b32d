//! Flexibility scheduling as a mixed-integer linear program.
//!
//! The pipeline is normalize → build → solve → extract; [`run`] wires the
//! stages together for one request.

pub mod builder;
pub mod error;
pub mod extract;
pub mod problem;
pub mod solver;
pub mod types;

use tracing::debug;

pub use builder::FlexModel;
pub use error::OptimizeError;
pub use extract::extract;
pub use solver::{CbcSolver, MilpSolution, MilpSolver};
pub use types::{Activation, ModelInput, OptimizationOutcome, SolverStatus};

use crate::payload::OptimizationRequest;

/// Runs one optimization end to end. Blocking: the caller decides where
/// the CPU time is spent.
pub fn run(
    request: &OptimizationRequest,
    solver: &dyn MilpSolver,
) -> Result<(SolverStatus, OptimizationOutcome), OptimizeError> {
    let input = request.normalize()?;
    let model = FlexModel::build(&input)?;
    debug!(
        horizon = input.horizon,
        variables = model.problem.num_vars(),
        constraints = model.problem.constraints.len(),
        "model built"
    );
    let solution = solver.solve(&model.problem)?;
    extract(&model, &input, &solution)
}
