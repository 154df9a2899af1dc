/// Implementation using the Clarabel interior point solver
#[cfg(feature = "clarabel")]
pub mod clarabel;

/// Implementation using the OSQP operator splitting solver
#[cfg(feature = "osqp")]
pub mod osqp;

/// Compressed-sparse-column storage, as consumed by both solver libraries.
#[allow(dead_code)]
#[derive(Debug, Default)]
pub(crate) struct Csc {
    pub colptr: Vec<usize>,
    pub rowval: Vec<usize>,
    pub nzval: Vec<f64>,
}

#[allow(dead_code)]
impl Csc {
    /// A diagonal matrix
    pub fn diagonal(values: Vec<f64>) -> Self {
        let n = values.len();
        Self {
            colptr: (0..=n).collect(),
            rowval: (0..n).collect(),
            nzval: values,
        }
    }

    /// Start a new column
    pub fn next_column(&mut self) {
        self.colptr.push(self.nzval.len());
    }

    /// Add an entry to the current column. Rows must be pushed in ascending order.
    pub fn push(&mut self, row: usize, value: f64) {
        self.rowval.push(row);
        self.nzval.push(value);
    }

    /// Close the final column
    pub fn finish(mut self) -> Self {
        self.colptr.push(self.nzval.len());
        self
    }
}

/// Programs without variables are settled without calling into a library:
/// they are feasible exactly when every equality reads 0 = 0.
#[allow(dead_code)]
pub(crate) fn trivial(
    program: &edp_core::models::QuadraticProgram,
) -> Option<edp_core::ports::QpSolution> {
    use edp_core::ports::{QpSolution, Termination};

    if program.num_variables() > 0 {
        None
    } else if program.equalities.iter().all(|row| row.rhs == 0.0) {
        Some(QpSolution {
            termination: Termination::Optimal,
            primal: Vec::new(),
            duals: vec![0.0; program.equalities.len()],
            iterations: 0,
        })
    } else {
        Some(QpSolution::failed(Termination::Infeasible, 0))
    }
}
