use crate::models::{
    Generator, GeneratorId, Load, LoadId, Map, QuadraticProgram, TimeStep, ValidationError,
};
use crate::ports::{QpSolver, SolverError, Termination};
use tracing::{Level, event};

mod error;
pub use error::{DispatchError, Infeasibility};

mod outcome;
pub use outcome::{DispatchOutcome, PeriodOutcome};

/// The number of decimal digits results are rounded to by default
pub const DEFAULT_PRECISION: u32 = 6;

/// The largest supported precision; an f64 carries no more significant digits
pub const MAX_PRECISION: u32 = 15;

// Relative tolerance for deciding whether a unit sits on one of its bounds.
const BOUND_TOLERANCE: f64 = 1e-6;

// Relative slack on the pre-solve shortfall check. Demand and capacity are
// both float sums, so near-equal cases are left for the solver to settle.
const SHORTFALL_TOLERANCE: f64 = 1e-9;

/// An economic dispatch problem: a set of generators serving a set of loads.
///
/// Generators and loads are registered by id (last write wins). Running the
/// market clearing formulates one separable convex QP covering every time
/// step, solves it with the injected solver, and keeps the resulting
/// [`DispatchOutcome`] until the next run.
#[derive(Debug, Clone)]
pub struct DispatchProblem {
    generators: Map<GeneratorId, Generator>,
    loads: Map<LoadId, Load>,
    precision: u32,
    outcome: Option<DispatchOutcome>,
}

impl Default for DispatchProblem {
    fn default() -> Self {
        Self {
            generators: Default::default(),
            loads: Default::default(),
            precision: DEFAULT_PRECISION,
            outcome: None,
        }
    }
}

/// The dispatch QP together with the meaning of its variables and rows.
///
/// Variable `period · generators.len() + generator` is the production of the
/// `generator`-th id at the `period`-th time step. Equality row `period` is
/// that step's load balance.
#[derive(Debug, Clone)]
pub struct Formulation {
    /// The solver-neutral program
    pub program: QuadraticProgram,
    /// The generator ids, ascending
    pub generators: Vec<GeneratorId>,
    /// The time steps and their total demand, ascending
    pub periods: Vec<(TimeStep, f64)>,
}

impl Formulation {
    /// The variable index of a (generator position, period position) pair
    pub fn variable(&self, generator: usize, period: usize) -> usize {
        period * self.generators.len() + generator
    }
}

impl DispatchProblem {
    /// Sets the number of decimal digits production and prices are rounded to,
    /// capped at [`MAX_PRECISION`]
    pub fn with_precision(mut self, digits: u32) -> Self {
        self.precision = digits.min(MAX_PRECISION);
        self
    }

    /// Registers a generator, replacing any generator with the same id.
    ///
    /// Returns the replaced generator, if there was one.
    pub fn add_generator(
        &mut self,
        generator: Generator,
    ) -> Result<Option<Generator>, ValidationError> {
        generator.validate()?;
        Ok(self.generators.insert(generator.id, generator))
    }

    /// Registers a load, replacing any load with the same id.
    ///
    /// Returns the replaced load, if there was one.
    pub fn add_load(&mut self, load: Load) -> Result<Option<Load>, ValidationError> {
        load.validate()?;
        Ok(self.loads.insert(load.id, load))
    }

    /// The registered generators, in registration order
    pub fn generators(&self) -> impl Iterator<Item = &Generator> {
        self.generators.values()
    }

    /// Look up a generator by id
    pub fn generator(&self, id: GeneratorId) -> Option<&Generator> {
        self.generators.get(&id)
    }

    /// The registered loads, in registration order
    pub fn loads(&self) -> impl Iterator<Item = &Load> {
        self.loads.values()
    }

    /// The outcome of the last successful run, if the last run succeeded
    pub fn outcome(&self) -> Option<&DispatchOutcome> {
        self.outcome.as_ref()
    }

    /// The time horizon: each distinct time step with its total demand, ascending
    pub fn horizon(&self) -> Map<TimeStep, f64> {
        let mut horizon = Map::<TimeStep, f64>::default();
        for load in self.loads.values() {
            *horizon.entry(load.time_step).or_default() += load.capacity;
        }
        horizon.sort_unstable_keys();
        horizon
    }

    /// The total generation capacity available at every time step
    pub fn total_capacity(&self) -> f64 {
        self.generators.values().map(|g| g.capacity).sum()
    }

    /// Builds the dispatch QP.
    ///
    /// ```text
    /// minimize    Σ_{g,t} c2[g]·p[g,t]² + c1[g]·p[g,t]
    /// subject to  0 ≤ p[g,t] ≤ capacity[g]
    ///             Σ_g p[g,t] = Σ_{loads at t} demand      (one row per t)
    /// ```
    pub fn formulate(&self) -> Formulation {
        let mut generators = self.generators.values().collect::<Vec<_>>();
        generators.sort_unstable_by_key(|g| g.id);

        let periods = self.horizon().into_iter().collect::<Vec<_>>();

        let mut program = QuadraticProgram::default();
        for (time_step, demand) in periods.iter() {
            let columns = generators
                .iter()
                .map(|g| (program.add_variable(g.c2, g.c1, g.capacity), 1.0))
                .collect::<Vec<_>>();
            program.add_equality(format!("balance_{time_step}"), columns, *demand);
        }

        event!(
            Level::DEBUG,
            variables = program.num_variables(),
            periods = periods.len(),
            "formulated dispatch program"
        );

        Formulation {
            program,
            generators: generators.into_iter().map(|g| g.id).collect(),
            periods,
        }
    }

    /// Checks that every time step can be served by the available capacity.
    fn check_adequacy(&self, periods: &[(TimeStep, f64)]) -> Result<(), Infeasibility> {
        let capacity = self.total_capacity();
        let short = |demand: f64| {
            demand > capacity + SHORTFALL_TOLERANCE * capacity.max(demand).max(1.0)
        };
        match periods.iter().find(|(_, demand)| short(*demand)) {
            Some(&(time_step, demand)) => Err(Infeasibility::Shortfall {
                time_step,
                demand,
                capacity,
            }),
            None => Ok(()),
        }
    }

    /// Solves the dispatch problem with the provided solver.
    ///
    /// On success the production of every generator at every time step and
    /// the clearing price of every step are stored and returned. Any failure
    /// leaves no outcome behind: the previous one is discarded up front.
    pub fn run_market_clearing<S: QpSolver>(
        &mut self,
        solver: &S,
    ) -> Result<&DispatchOutcome, DispatchError> {
        self.outcome = None;

        let formulation = self.formulate();

        // Without load there is nothing to balance
        if formulation.periods.is_empty() {
            event!(Level::WARN, "no loads registered, nothing to dispatch");
            return Ok(&*self.outcome.insert(DispatchOutcome::default()));
        }

        if let Err(shortfall) = self.check_adequacy(&formulation.periods) {
            event!(Level::WARN, error = %shortfall);
            return Err(shortfall.into());
        }

        let solution = solver.solve(&formulation.program)?;

        match solution.termination {
            Termination::Optimal | Termination::LocallyOptimal => {}
            Termination::Infeasible => {
                event!(Level::WARN, "solver certified the program infeasible");
                return Err(Infeasibility::Certified.into());
            }
            termination => {
                event!(Level::WARN, %termination, "solver did not converge");
                return Err(SolverError::Inconclusive(termination).into());
            }
        }

        let program = &formulation.program;
        if solution.primal.len() != program.num_variables() {
            return Err(SolverError::Malformed {
                what: "primal values",
                expected: program.num_variables(),
                actual: solution.primal.len(),
            }
            .into());
        }
        if solution.duals.len() != program.equalities.len() {
            return Err(SolverError::Malformed {
                what: "dual values",
                expected: program.equalities.len(),
                actual: solution.duals.len(),
            }
            .into());
        }

        let generators = formulation
            .generators
            .iter()
            .filter_map(|id| self.generators.get(id))
            .collect::<Vec<_>>();

        let periods = formulation
            .periods
            .iter()
            .enumerate()
            .map(|(t, &(time_step, demand))| {
                let dispatch = generators
                    .iter()
                    .enumerate()
                    .map(|(g, generator)| {
                        let quantity = solution.primal[formulation.variable(g, t)];
                        (generator.id, round(quantity, self.precision))
                    })
                    .collect::<Map<GeneratorId, f64>>();

                let units = generators
                    .iter()
                    .copied()
                    .zip(dispatch.values().copied())
                    .collect::<Vec<_>>();

                let price = clearing_price(&units, solution.duals[t]);

                let variable_cost = units.iter().map(|(g, q)| g.variable_cost(*q)).sum();
                let fixed_cost = generators.iter().map(|g| g.c0).sum();

                (
                    time_step,
                    PeriodOutcome {
                        price: round(price, self.precision),
                        demand,
                        dispatch,
                        variable_cost,
                        fixed_cost,
                    },
                )
            })
            .collect::<Map<TimeStep, PeriodOutcome>>();

        let outcome = DispatchOutcome {
            periods,
            termination: solution.termination,
            iterations: solution.iterations,
        };

        event!(
            Level::INFO,
            periods = outcome.periods.len(),
            iterations = outcome.iterations,
            cost = outcome.total_cost(),
            "market cleared"
        );

        Ok(&*self.outcome.insert(outcome))
    }
}

/// Picks the clearing price of one period.
///
/// Every price between the highest marginal cost of a producing unit and the
/// lowest marginal cost of a unit with spare capacity balances the period.
/// A unit producing strictly inside its range collapses that interval to a
/// single point, and the solver's dual is taken as-is. Otherwise the interval
/// may be wide and solvers may return any member of it, so the price is fixed:
/// * some unit produces: the highest marginal cost among producing units,
///   the cost of the last unit served (this covers scarcity, every unit at
///   full output, as well as units split between both bounds);
/// * no production at all: the lowest marginal cost at zero output, the cost
///   of the first unit that would be served.
///
/// Units without capacity constrain nothing and are ignored.
fn clearing_price(units: &[(&Generator, f64)], dual: f64) -> f64 {
    let mut served = f64::NEG_INFINITY;
    let mut spare = f64::INFINITY;
    let mut interior = false;

    for &(generator, quantity) in units {
        let tolerance = BOUND_TOLERANCE * generator.capacity.max(1.0);
        if generator.capacity <= tolerance {
            continue;
        }
        let marginal = generator.marginal_cost(quantity);
        let producing = quantity > tolerance;
        let below_capacity = quantity < generator.capacity - tolerance;
        if producing {
            served = served.max(marginal);
        }
        if below_capacity {
            spare = spare.min(marginal);
        }
        interior |= producing && below_capacity;
    }

    if interior {
        dual
    } else if served.is_finite() {
        served
    } else if spare.is_finite() {
        spare
    } else {
        dual
    }
}

/// Rounds to a fixed number of decimal digits, normalizing -0.0 to 0.0
fn round(value: f64, digits: u32) -> f64 {
    let scale = 10f64.powi(digits.min(MAX_PRECISION) as i32);
    (value * scale).round() / scale + 0.0
}

#[cfg(test)]
mod tests;
