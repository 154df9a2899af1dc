use super::{Csc, trivial};
use clarabel::{algebra::*, solver::*};
use edp_core::models::QuadraticProgram;
use edp_core::ports::{QpSolution, QpSolver, SolverError as PortError, Termination};
use tracing::{Level, event};

/// A solver implementation that uses the Clarabel interior point solver.
pub struct ClarabelSolver(DefaultSettings<f64>);

impl ClarabelSolver {
    /// The settings behind [`ClarabelSolver::default`], which silence the solver log
    pub fn default_settings() -> DefaultSettings<f64> {
        let mut settings = DefaultSettings::default();
        settings.verbose = false;
        settings
    }
}

impl Default for ClarabelSolver {
    fn default() -> Self {
        Self(Self::default_settings())
    }
}

impl QpSolver for ClarabelSolver {
    type Settings = DefaultSettings<f64>;

    fn new(settings: Self::Settings) -> Self {
        Self(settings)
    }

    fn solve(&self, program: &QuadraticProgram) -> Result<QpSolution, PortError> {
        if let Some(solution) = trivial(program) {
            return Ok(solution);
        }

        let n = program.num_variables();
        let nzero = program.equalities.len();

        // Clarabel handles constraints via a cone specification, e.g. Ax + s = b, where s is a cone.
        // The first `nzero` rows are the balance equalities, so b starts out as their rhs.
        let mut b = program
            .equalities
            .iter()
            .map(|row| row.rhs)
            .collect::<Vec<_>>();
        let mut cones = vec![ZeroConeT(nzero)];

        let mut a = Csc::default();

        for (idx, column) in program.equality_columns().into_iter().enumerate() {
            a.next_column();

            // The equality rows precede every bound row, so pushing them first
            // keeps the row indices of this column ascending.
            for (row, coef) in column {
                a.push(row, coef);
            }

            // The box constraints grow b dynamically, which also tracks the row
            // index. Both are written as s = b - Ax ≥ 0, hence the sign on the
            // lower bound.
            let upper = program.upper[idx];
            if upper.is_finite() {
                a.push(b.len(), 1.0);
                b.push(upper);
            }
            a.push(b.len(), -1.0);
            b.push(0.0);
        }
        let a = a.finish();

        cones.push(NonnegativeConeT(b.len() - nzero));

        let a_matrix = CscMatrix {
            m: b.len(),
            n,
            colptr: a.colptr,
            rowval: a.rowval,
            nzval: a.nzval,
        };

        // Clarabel minimizes ½xᵀPx + qᵀx, so P carries twice the quadratic coefficient
        let p = Csc::diagonal(program.quadratic.iter().map(|c| 2.0 * c).collect());
        let p_matrix = CscMatrix {
            m: n,
            n,
            colptr: p.colptr,
            rowval: p.rowval,
            nzval: p.nzval,
        };

        let mut solver = DefaultSolver::new(
            &p_matrix,
            &program.linear,
            &a_matrix,
            &b,
            &cones,
            self.0.clone(),
        )
        .map_err(|e| PortError::Setup(format!("{e:?}")))?;
        solver.solve();

        let solution = &solver.solution;
        let termination = match solution.status {
            SolverStatus::Solved => Termination::Optimal,
            SolverStatus::AlmostSolved => Termination::Inaccurate,
            SolverStatus::PrimalInfeasible | SolverStatus::AlmostPrimalInfeasible => {
                Termination::Infeasible
            }
            SolverStatus::DualInfeasible | SolverStatus::AlmostDualInfeasible => {
                Termination::Unbounded
            }
            SolverStatus::MaxIterations => Termination::IterationLimit,
            SolverStatus::MaxTime => Termination::TimeLimit,
            _ => Termination::NumericalError,
        };

        event!(
            Level::DEBUG,
            status = ?solution.status,
            iterations = solution.iterations,
            "clarabel finished"
        );

        if !termination.is_success() {
            return Ok(QpSolution::failed(termination, solution.iterations));
        }

        // The KKT conditions read Px + q + Aᵀz = 0, so the multiplier of an
        // equality row is the negated shadow price of its right-hand side.
        Ok(QpSolution {
            termination,
            primal: solution.x.clone(),
            duals: solution.z[..nzero].iter().map(|z| -z).collect(),
            iterations: solution.iterations,
        })
    }
}
