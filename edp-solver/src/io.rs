use edp_core::models::{
    Generator, GeneratorId, GeneratorRecord, Load, LoadId, LoadRecord, TimeStep, ValidationError,
};
use edp_core::{DispatchError, DispatchOutcome, DispatchProblem};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The raw input document: one row per generator and one row per load.
///
/// Ids are assigned from row positions, so the first generator is
/// generator 0 and the first load is load 0.
#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub struct RawDispatch {
    /// The generator rows
    pub generators: Vec<GeneratorRecord>,
    /// The load rows
    #[serde(default)]
    pub loads: Vec<LoadRecord>,
}

/// A row that failed validation, with its position in the input.
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    /// A generator row was malformed
    #[error("generator row {0}: {1}")]
    Generator(usize, ValidationError),
    /// A load row was malformed
    #[error("load row {0}: {1}")]
    Load(usize, ValidationError),
}

impl RawDispatch {
    /// Validate every row and register it into a fresh dispatch problem
    pub fn prepare(self) -> Result<DispatchProblem, InputError> {
        self.prepare_into(DispatchProblem::default())
    }

    /// Validate every row and register it into the provided problem
    pub fn prepare_into(self, mut problem: DispatchProblem) -> Result<DispatchProblem, InputError> {
        for (row, record) in self.generators.into_iter().enumerate() {
            Generator::from_record(GeneratorId::from(row), record)
                .and_then(|generator| problem.add_generator(generator))
                .map_err(|e| InputError::Generator(row, e))?;
        }
        for (row, record) in self.loads.into_iter().enumerate() {
            Load::from_record(LoadId::from(row), record)
                .and_then(|load| problem.add_load(load))
                .map_err(|e| InputError::Load(row, e))?;
        }
        Ok(problem)
    }
}

/// The result of a market clearing run, as presented to a reader.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Report {
    /// The solver reached optimality
    Solved {
        /// One entry per time step, ascending
        periods: Vec<PeriodReport>,
        /// The minimized cost, Σ c2·q² + c1·q
        variable_cost: f64,
        /// The fixed cost offset, Σ c0 per period
        fixed_cost: f64,
    },
    /// No authoritative dispatch exists
    Unsolved {
        /// The kind of failure
        kind: FailureKind,
        /// A human-readable explanation
        reason: String,
    },
}

/// The dispatch and clearing price of a single time step.
#[derive(Debug, Serialize, Deserialize)]
pub struct PeriodReport {
    /// The time step
    pub time_step: TimeStep,
    /// The market-clearing price
    pub price: f64,
    /// The load served
    pub demand: f64,
    /// (generator, production) pairs, ordered by generator id
    pub dispatch: Vec<(GeneratorId, f64)>,
}

/// Distinguishes the failure kinds in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// A record was malformed
    Validation,
    /// No feasible dispatch exists
    Infeasible,
    /// The solver did not reach a conclusive result
    Solver,
}

impl From<&DispatchOutcome> for Report {
    fn from(outcome: &DispatchOutcome) -> Self {
        Report::Solved {
            periods: outcome
                .periods
                .iter()
                .map(|(&time_step, period)| PeriodReport {
                    time_step,
                    price: period.price,
                    demand: period.demand,
                    dispatch: period.dispatch.iter().map(|(&id, &q)| (id, q)).collect(),
                })
                .collect(),
            variable_cost: outcome.variable_cost(),
            fixed_cost: outcome.fixed_cost(),
        }
    }
}

impl From<&DispatchError> for Report {
    fn from(error: &DispatchError) -> Self {
        let kind = match error {
            DispatchError::Validation(_) => FailureKind::Validation,
            DispatchError::Infeasible(_) => FailureKind::Infeasible,
            DispatchError::Solver(_) => FailureKind::Solver,
        };
        Report::Unsolved {
            kind,
            reason: error.to_string(),
        }
    }
}

impl Report {
    /// Whether the report carries an authoritative dispatch
    pub fn is_solved(&self) -> bool {
        matches!(self, Report::Solved { .. })
    }

    /// Whether the failure was a (detected or certified) infeasibility
    pub fn is_infeasible(&self) -> bool {
        matches!(
            self,
            Report::Unsolved {
                kind: FailureKind::Infeasible,
                ..
            }
        )
    }
}

// A console rendering in the spirit of a solver log.
impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "-".repeat(50);
        match self {
            Report::Solved {
                periods,
                variable_cost,
                fixed_cost,
            } => {
                for period in periods {
                    writeln!(f, "{rule}")?;
                    writeln!(f, "Time step {} (demand {})", period.time_step, period.demand)?;
                    writeln!(f, "{rule}")?;
                    writeln!(f, "{:>15} | {:>12} |", "Generator", "Production")?;
                    writeln!(f, "{rule}")?;
                    for (id, quantity) in period.dispatch.iter() {
                        writeln!(f, "{:>15} | {:>12.4} |", id.to_string(), quantity)?;
                    }
                    writeln!(f, "{rule}")?;
                    writeln!(f, "The market clearing price is {}.", period.price)?;
                }
                writeln!(f, "{rule}")?;
                writeln!(f, "Variable cost: {variable_cost:.4}")?;
                writeln!(f, "Fixed cost:    {fixed_cost:.4}")?;
                writeln!(f, "Total cost:    {:.4}", variable_cost + fixed_cost)?;
                writeln!(f, "Model has been solved.")
            }
            Report::Unsolved { kind, reason } => {
                writeln!(f, "Model was not solved ({kind:?}): {reason}")
            }
        }
    }
}

impl From<InputError> for Report {
    fn from(error: InputError) -> Self {
        Report::Unsolved {
            kind: FailureKind::Validation,
            reason: error.to_string(),
        }
    }
}
