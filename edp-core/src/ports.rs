mod solver;

pub use solver::{QpSolution, QpSolver, SolverError, Termination};
