use crate::models::QuadraticProgram;
use thiserror::Error;

/// How a solver run ended.
///
/// Only `Optimal` and `LocallyOptimal` carry an authoritative solution. For a
/// convex program the two coincide; the distinction exists for adapters to
/// general nonlinear solvers that only certify local optimality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Termination {
    /// A global optimum was found to the requested accuracy
    Optimal,
    /// A local optimum was found to the requested accuracy
    LocallyOptimal,
    /// The constraints admit no feasible point
    Infeasible,
    /// The objective is unbounded below on the feasible set
    Unbounded,
    /// The iteration budget ran out
    IterationLimit,
    /// The time budget ran out
    TimeLimit,
    /// The solver stopped at reduced accuracy
    Inaccurate,
    /// The solver failed for numerical reasons
    NumericalError,
}

impl Termination {
    /// Whether the primal and dual values may be trusted
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Optimal | Self::LocallyOptimal)
    }
}

impl std::fmt::Display for Termination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        (match self {
            Self::Optimal => "optimal",
            Self::LocallyOptimal => "locally optimal",
            Self::Infeasible => "infeasible",
            Self::Unbounded => "unbounded",
            Self::IterationLimit => "iteration limit reached",
            Self::TimeLimit => "time limit reached",
            Self::Inaccurate => "inaccurate",
            Self::NumericalError => "numerical error",
        })
        .fmt(f)
    }
}

/// The raw output of a solver run.
#[derive(Debug, Clone, PartialEq)]
pub struct QpSolution {
    /// How the run ended
    pub termination: Termination,
    /// The primal value of every variable (empty unless successful)
    pub primal: Vec<f64>,
    /// The shadow price of every equality row, i.e. the rate of change of the
    /// optimal objective with respect to the row's right-hand side (empty
    /// unless successful)
    pub duals: Vec<f64>,
    /// The number of iterations the solver performed
    pub iterations: u32,
}

impl QpSolution {
    /// A solution with no values, for runs that did not succeed
    pub fn failed(termination: Termination, iterations: u32) -> Self {
        Self {
            termination,
            primal: Vec::new(),
            duals: Vec::new(),
            iterations,
        }
    }
}

/// Failures that prevent a solver from reporting any termination status.
#[derive(Debug, Error, PartialEq)]
pub enum SolverError {
    /// The program could not be handed to the solver
    #[error("unable to set up the solver: {0}")]
    Setup(String),
    /// The solver reached no conclusive status
    #[error("solver terminated without a conclusive result: {0}")]
    Inconclusive(Termination),
    /// The solver reported success but the solution does not match the program
    #[error("expected {expected} {what} from the solver, got {actual}")]
    Malformed {
        /// Which vector was malformed
        what: &'static str,
        /// The length implied by the program
        expected: usize,
        /// The length the solver returned
        actual: usize,
    },
}

/// Interface for quadratic program solvers.
///
/// A solver accepts a separable convex [`QuadraticProgram`] and reports how
/// the run terminated, together with the primal values and the dual value of
/// every equality row when it succeeds. No assumption is made about the
/// algorithm; any solver meeting this contract is interchangeable.
pub trait QpSolver {
    /// The configuration type for this solver
    type Settings;

    /// Create a new instance with the provided settings
    fn new(settings: Self::Settings) -> Self;

    /// Solve the program. Blocks until the solver returns.
    ///
    /// An `Err` means the solver could not even run; an unsuccessful run
    /// (infeasible, unbounded, limits reached) is an `Ok` with the
    /// corresponding [`Termination`].
    fn solve(&self, program: &QuadraticProgram) -> Result<QpSolution, SolverError>;
}
