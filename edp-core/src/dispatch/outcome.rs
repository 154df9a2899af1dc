use crate::models::{GeneratorId, Map, TimeStep};
use crate::ports::Termination;

/// The solution of a market clearing run.
///
/// Production is keyed by (time step, generator) through the nested maps, so
/// every period keeps its own values. Periods are in ascending time-step
/// order and generators in ascending id order.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DispatchOutcome {
    /// The outcome of each period
    pub periods: Map<TimeStep, PeriodOutcome>,
    /// How the solver terminated
    pub termination: Termination,
    /// The number of solver iterations
    pub iterations: u32,
}

impl Default for DispatchOutcome {
    fn default() -> Self {
        Self {
            periods: Default::default(),
            termination: Termination::Optimal,
            iterations: 0,
        }
    }
}

/// Solution data for a single time step.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PeriodOutcome {
    /// The market-clearing price (the dual of the balance constraint)
    pub price: f64,
    /// The total load served
    pub demand: f64,
    /// The production of each generator
    pub dispatch: Map<GeneratorId, f64>,
    /// The dispatch-dependent cost, Σ c2·q² + c1·q
    pub variable_cost: f64,
    /// The fixed cost offset, Σ c0, which never influences the dispatch
    pub fixed_cost: f64,
}

impl PeriodOutcome {
    /// The variable and fixed cost together
    pub fn total_cost(&self) -> f64 {
        self.variable_cost + self.fixed_cost
    }
}

impl DispatchOutcome {
    /// The production of a generator at a time step
    pub fn production(&self, generator: GeneratorId, time_step: TimeStep) -> Option<f64> {
        self.periods
            .get(&time_step)
            .and_then(|period| period.dispatch.get(&generator))
            .copied()
    }

    /// The clearing price at a time step
    pub fn price(&self, time_step: TimeStep) -> Option<f64> {
        self.periods.get(&time_step).map(|period| period.price)
    }

    /// Iterates every (generator, time step, quantity) triple
    pub fn iter(&self) -> impl Iterator<Item = (GeneratorId, TimeStep, f64)> + '_ {
        self.periods.iter().flat_map(|(&time_step, period)| {
            period
                .dispatch
                .iter()
                .map(move |(&generator, &quantity)| (generator, time_step, quantity))
        })
    }

    /// The dispatch-dependent cost over the horizon (the minimized objective)
    pub fn variable_cost(&self) -> f64 {
        self.periods.values().map(|period| period.variable_cost).sum()
    }

    /// The fixed cost offset over the horizon
    pub fn fixed_cost(&self) -> f64 {
        self.periods.values().map(|period| period.fixed_cost).sum()
    }

    /// The total cost over the horizon
    pub fn total_cost(&self) -> f64 {
        self.variable_cost() + self.fixed_cost()
    }
}
