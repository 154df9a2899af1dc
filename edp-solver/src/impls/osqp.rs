use super::{Csc, trivial};
use edp_core::models::QuadraticProgram;
use edp_core::ports::{QpSolution, QpSolver, SolverError as PortError, Termination};
use osqp::{CscMatrix, Problem, Settings, Status};
use tracing::{Level, event};

/// A solver implementation that uses the OSQP (Operator Splitting Quadratic Program)
/// solver.
///
/// OSQP uses the Alternating Direction Method of Multipliers (ADMM) approach,
/// which can be faster than interior point methods for large-scale problems,
/// though sometimes with lower precision. Solution polishing is enabled by
/// default to recover an accurate active set.
pub struct OsqpSolver(Settings);

impl OsqpSolver {
    /// The settings behind [`OsqpSolver::default`]: quiet, polished, and with
    /// tighter tolerances than the library's defaults.
    pub fn default_settings() -> Settings {
        Settings::default()
            .verbose(false)
            .eps_abs(1e-6)
            .eps_rel(1e-6)
            .polish(true)
    }
}

impl Default for OsqpSolver {
    fn default() -> Self {
        Self(Self::default_settings())
    }
}

impl QpSolver for OsqpSolver {
    type Settings = Settings;

    fn new(settings: Self::Settings) -> Self {
        Self(settings)
    }

    fn solve(&self, program: &QuadraticProgram) -> Result<QpSolution, PortError> {
        if let Some(solution) = trivial(program) {
            return Ok(solution);
        }

        let n = program.num_variables();
        let nzero = program.equalities.len();

        // OSQP handles constraints via a box specification, e.g. lb <= Ax <= ub,
        // where equality is handled via setting lb[i] = ub[i].
        let mut lb = program
            .equalities
            .iter()
            .map(|row| row.rhs)
            .collect::<Vec<_>>();
        let mut ub = lb.clone();

        let mut a = Csc::default();

        for (idx, column) in program.equality_columns().into_iter().enumerate() {
            a.next_column();

            for (row, coef) in column {
                a.push(row, coef);
            }

            // One box row per variable covers both non-negativity and capacity
            a.push(lb.len(), 1.0);
            lb.push(0.0);
            ub.push(program.upper[idx]);
        }
        let a = a.finish();

        let m = lb.len();

        let a_matrix = CscMatrix {
            nrows: m,
            ncols: n,
            indptr: a.colptr.into(),
            indices: a.rowval.into(),
            data: a.nzval.into(),
        };

        // OSQP minimizes ½xᵀPx + qᵀx with P upper triangular; ours is diagonal
        let p = Csc::diagonal(program.quadratic.iter().map(|c| 2.0 * c).collect());
        let p_matrix = CscMatrix {
            nrows: n,
            ncols: n,
            indptr: p.colptr.into(),
            indices: p.rowval.into(),
            data: p.nzval.into(),
        };

        let mut solver = Problem::new(&p_matrix, &program.linear, &a_matrix, &lb, &ub, &self.0)
            .map_err(|e| PortError::Setup(format!("{e:?}")))?;
        solver.warm_start_x(&vec![0.0; n]);

        let status = solver.solve();
        let iterations = status.iter();

        let (termination, solution) = match status {
            Status::Solved(solution) => (Termination::Optimal, Some(solution)),
            Status::SolvedInaccurate(_) => (Termination::Inaccurate, None),
            Status::PrimalInfeasible(_) | Status::PrimalInfeasibleInaccurate(_) => {
                (Termination::Infeasible, None)
            }
            Status::DualInfeasible(_) | Status::DualInfeasibleInaccurate(_) => {
                (Termination::Unbounded, None)
            }
            Status::MaxIterationsReached(_) => (Termination::IterationLimit, None),
            Status::TimeLimitReached(_) => (Termination::TimeLimit, None),
            _ => (Termination::NumericalError, None),
        };

        event!(Level::DEBUG, %termination, iterations, "osqp finished");

        match solution {
            // The KKT conditions read Px + q + Aᵀy = 0, so the multiplier of an
            // equality row is the negated shadow price of its right-hand side.
            Some(solution) => Ok(QpSolution {
                termination,
                primal: solution.x().to_vec(),
                duals: solution.y()[..nzero].iter().map(|y| -y).collect(),
                iterations,
            }),
            None => Ok(QpSolution::failed(termination, iterations)),
        }
    }
}
