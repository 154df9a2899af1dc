use crate::models::{TimeStep, ValidationError};
use crate::ports::SolverError;
use thiserror::Error;

/// Why no feasible dispatch exists.
#[derive(Debug, Error, PartialEq)]
pub enum Infeasibility {
    /// Aggregate demand at a time step exceeds aggregate generation capacity
    #[error("demand of {demand} at time step {time_step} exceeds total capacity of {capacity}")]
    Shortfall {
        /// The first step found short
        time_step: TimeStep,
        /// The total load at that step
        demand: f64,
        /// The total generation capacity
        capacity: f64,
    },
    /// The solver certified that the program has no feasible point
    #[error("the solver certified the dispatch program infeasible")]
    Certified,
}

/// The failures a market clearing run can end in.
///
/// Infeasibility and solver failures both mean "unsolved" to a caller, but
/// are kept apart so diagnostics can tell a bad input from a bad solve.
#[derive(Debug, Error, PartialEq)]
pub enum DispatchError {
    /// A record was malformed
    #[error("invalid record: {0}")]
    Validation(#[from] ValidationError),
    /// The balance and capacity constraints admit no feasible point
    #[error("infeasible dispatch: {0}")]
    Infeasible(#[from] Infeasibility),
    /// The solver failed to reach a conclusive result
    #[error(transparent)]
    Solver(#[from] SolverError),
}
