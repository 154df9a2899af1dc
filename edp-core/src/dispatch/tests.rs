use super::*;
use crate::ports::QpSolution;
use approx::assert_abs_diff_eq;
use rstest::*;
use std::cell::Cell;

/// Replays a fixed solution and counts how often it was asked to solve.
struct ScriptedSolver {
    solution: QpSolution,
    calls: Cell<usize>,
}

impl QpSolver for ScriptedSolver {
    type Settings = QpSolution;

    fn new(solution: Self::Settings) -> Self {
        Self {
            solution,
            calls: Cell::new(0),
        }
    }

    fn solve(&self, _: &QuadraticProgram) -> Result<QpSolution, SolverError> {
        self.calls.set(self.calls.get() + 1);
        Ok(self.solution.clone())
    }
}

/// An exact solver for the dispatch structure: every variable appears in
/// exactly one equality row with a unit coefficient and has c2 > 0. Each row
/// is cleared independently by bisecting on its price.
struct BisectionSolver;

impl QpSolver for BisectionSolver {
    type Settings = ();

    fn new(_: ()) -> Self {
        Self
    }

    fn solve(&self, program: &QuadraticProgram) -> Result<QpSolution, SolverError> {
        let supply = |i: usize, price: f64| {
            ((price - program.linear[i]) / (2.0 * program.quadratic[i])).clamp(0.0, program.upper[i])
        };

        let mut primal = vec![0.0; program.num_variables()];
        let mut duals = Vec::new();
        for row in program.equalities.iter() {
            let vars = row.terms.iter().map(|(i, _)| *i).collect::<Vec<_>>();
            let capacity = vars.iter().map(|&i| program.upper[i]).sum::<f64>();
            if capacity < row.rhs - 1e-9 * row.rhs.max(1.0) {
                return Ok(QpSolution::failed(Termination::Infeasible, 0));
            }

            let mut lo = vars.iter().map(|&i| program.linear[i]).fold(f64::INFINITY, f64::min);
            let mut hi = vars
                .iter()
                .map(|&i| 2.0 * program.quadratic[i] * program.upper[i] + program.linear[i])
                .fold(f64::NEG_INFINITY, f64::max);
            for _ in 0..200 {
                let mid = (lo + hi) / 2.0;
                if vars.iter().map(|&i| supply(i, mid)).sum::<f64>() < row.rhs {
                    lo = mid;
                } else {
                    hi = mid;
                }
            }
            for &i in vars.iter() {
                primal[i] = supply(i, hi);
            }
            duals.push(hi);
        }

        Ok(QpSolution {
            termination: Termination::Optimal,
            primal,
            duals,
            iterations: 200,
        })
    }
}

fn generator(id: usize, capacity: f64, c2: f64, c1: f64) -> Generator {
    Generator::new(GeneratorId::from(id), "zone", capacity, c2, c1, 0.0).unwrap()
}

fn load(id: usize, time_step: i64, capacity: f64) -> Load {
    Load::new(LoadId::from(id), TimeStep::from(time_step), capacity).unwrap()
}

#[fixture]
fn two_units() -> DispatchProblem {
    let mut problem = DispatchProblem::default();
    problem.add_generator(generator(1, 100.0, 0.01, 10.0)).unwrap();
    problem.add_generator(generator(2, 100.0, 0.02, 8.0)).unwrap();
    problem
}

#[rstest]
fn registration_overwrites_by_id(mut two_units: DispatchProblem) {
    let replaced = two_units
        .add_generator(generator(1, 40.0, 0.05, 1.0))
        .unwrap()
        .unwrap();
    assert_eq!(replaced.capacity, 100.0);
    assert_eq!(two_units.generators().count(), 2);
    assert_eq!(two_units.generator(GeneratorId::from(1)).unwrap().capacity, 40.0);

    assert!(two_units.add_load(load(0, 0, 10.0)).unwrap().is_none());
    assert!(two_units.add_load(load(0, 0, 20.0)).unwrap().is_some());
    assert_eq!(two_units.horizon()[&TimeStep::default()], 20.0);
}

#[rstest]
fn registration_rejects_tampered_records(mut two_units: DispatchProblem) {
    let mut bad = generator(3, 10.0, 0.01, 1.0);
    bad.c2 = -1.0;
    assert_eq!(
        two_units.add_generator(bad),
        Err(ValidationError::NegativeQuadratic(-1.0))
    );

    let mut bad = load(0, 0, 1.0);
    bad.capacity = -2.0;
    assert_eq!(
        two_units.add_load(bad),
        Err(ValidationError::NegativeCapacity(-2.0))
    );
    assert_eq!(two_units.generators().count(), 2);
    assert_eq!(two_units.loads().count(), 0);
}

#[rstest]
fn formulation_layout(mut two_units: DispatchProblem) {
    two_units.add_load(load(0, 7, 30.0)).unwrap();
    two_units.add_load(load(1, 3, 50.0)).unwrap();
    two_units.add_load(load(2, 7, 50.0)).unwrap();

    let formulation = two_units.formulate();
    assert_eq!(
        formulation.periods,
        vec![(TimeStep::from(3), 50.0), (TimeStep::from(7), 80.0)]
    );
    assert_eq!(
        formulation.generators,
        vec![GeneratorId::from(1), GeneratorId::from(2)]
    );

    let program = &formulation.program;
    assert_eq!(program.num_variables(), 4);
    assert_eq!(program.quadratic, vec![0.01, 0.02, 0.01, 0.02]);
    assert_eq!(program.linear, vec![10.0, 8.0, 10.0, 8.0]);
    assert_eq!(program.upper, vec![100.0; 4]);

    assert_eq!(program.equalities.len(), 2);
    assert_eq!(program.equalities[1].name, "balance_7");
    assert_eq!(program.equalities[1].rhs, 80.0);
    assert_eq!(
        program.equalities[1].terms,
        vec![(formulation.variable(0, 1), 1.0), (formulation.variable(1, 1), 1.0)]
    );
}

#[rstest]
fn clears_single_period(mut two_units: DispatchProblem) {
    two_units.add_load(load(0, 0, 120.0)).unwrap();
    let outcome = two_units.run_market_clearing(&BisectionSolver).unwrap();

    let step = TimeStep::default();
    let q1 = outcome.production(GeneratorId::from(1), step).unwrap();
    let q2 = outcome.production(GeneratorId::from(2), step).unwrap();
    assert_abs_diff_eq!(q1 + q2, 120.0, epsilon = 1e-5);
    assert_abs_diff_eq!(q1, 140.0 / 3.0, epsilon = 1e-5);
    assert_abs_diff_eq!(outcome.price(step).unwrap(), 820.0 / 75.0, epsilon = 1e-5);
}

#[rstest]
fn keeps_every_period_apart(mut two_units: DispatchProblem) {
    two_units.add_load(load(0, 1, 50.0)).unwrap();
    two_units.add_load(load(1, 2, 80.0)).unwrap();
    let outcome = two_units.run_market_clearing(&BisectionSolver).unwrap();

    assert_eq!(outcome.periods.len(), 2);
    assert_eq!(outcome.iter().count(), 4);

    let g1 = GeneratorId::from(1);
    assert_abs_diff_eq!(outcome.production(g1, TimeStep::from(1)).unwrap(), 0.0, epsilon = 1e-5);
    assert_abs_diff_eq!(outcome.production(g1, TimeStep::from(2)).unwrap(), 20.0, epsilon = 1e-5);
    assert_abs_diff_eq!(outcome.price(TimeStep::from(1)).unwrap(), 10.0, epsilon = 1e-5);
    assert_abs_diff_eq!(outcome.price(TimeStep::from(2)).unwrap(), 10.4, epsilon = 1e-5);

    // the generator records themselves are untouched by the solve
    assert_eq!(two_units.generator(g1).unwrap(), &generator(1, 100.0, 0.01, 10.0));
}

#[rstest]
fn shortfall_is_reported_before_solving(mut two_units: DispatchProblem) {
    two_units.add_load(load(0, 1, 50.0)).unwrap();
    two_units.add_load(load(1, 2, 250.0)).unwrap();
    let solver = ScriptedSolver::new(QpSolution::failed(Termination::Optimal, 0));

    assert_eq!(
        two_units.run_market_clearing(&solver).unwrap_err(),
        DispatchError::Infeasible(Infeasibility::Shortfall {
            time_step: TimeStep::from(2),
            demand: 250.0,
            capacity: 200.0,
        })
    );
    assert_eq!(solver.calls.get(), 0);
    assert!(two_units.outcome().is_none());
}

#[test]
fn split_load_at_exact_capacity_clears() {
    let mut problem = DispatchProblem::default();
    problem.add_generator(generator(1, 0.3, 0.01, 10.0)).unwrap();
    problem.add_load(load(0, 0, 0.1)).unwrap();
    problem.add_load(load(1, 0, 0.2)).unwrap();

    // 0.1 + 0.2 sums to slightly more than 0.3 in floating point
    assert!(problem.horizon()[&TimeStep::default()] > problem.total_capacity());

    let outcome = problem.run_market_clearing(&BisectionSolver).unwrap();
    let t = TimeStep::default();
    assert_eq!(outcome.production(GeneratorId::from(1), t), Some(0.3));
    assert_eq!(outcome.price(t), Some(10.006));
}

#[test]
fn load_without_generators_is_infeasible() {
    let mut problem = DispatchProblem::default();
    problem.add_load(load(0, 0, 1.0)).unwrap();
    assert!(matches!(
        problem.run_market_clearing(&BisectionSolver),
        Err(DispatchError::Infeasible(Infeasibility::Shortfall { .. }))
    ));
}

#[rstest]
fn empty_horizon_skips_the_solver(mut two_units: DispatchProblem) {
    let solver = ScriptedSolver::new(QpSolution::failed(Termination::NumericalError, 0));
    let outcome = two_units.run_market_clearing(&solver).unwrap();
    assert!(outcome.periods.is_empty());
    assert_eq!(solver.calls.get(), 0);
}

#[rstest]
#[case::infeasible(Termination::Infeasible, DispatchError::Infeasible(Infeasibility::Certified))]
#[case::unbounded(
    Termination::Unbounded,
    DispatchError::Solver(SolverError::Inconclusive(Termination::Unbounded))
)]
#[case::time_limit(
    Termination::TimeLimit,
    DispatchError::Solver(SolverError::Inconclusive(Termination::TimeLimit))
)]
fn failed_terminations_leave_no_outcome(
    mut two_units: DispatchProblem,
    #[case] termination: Termination,
    #[case] expected: DispatchError,
) {
    two_units.add_load(load(0, 0, 120.0)).unwrap();
    two_units.run_market_clearing(&BisectionSolver).unwrap();
    assert!(two_units.outcome().is_some());

    let solver = ScriptedSolver::new(QpSolution::failed(termination, 12));
    assert_eq!(two_units.run_market_clearing(&solver).unwrap_err(), expected);
    assert!(two_units.outcome().is_none());
}

#[rstest]
fn malformed_solution_is_a_solver_error(mut two_units: DispatchProblem) {
    two_units.add_load(load(0, 0, 120.0)).unwrap();
    let solver = ScriptedSolver::new(QpSolution {
        termination: Termination::Optimal,
        primal: vec![60.0, 60.0],
        duals: vec![],
        iterations: 1,
    });
    assert_eq!(
        two_units.run_market_clearing(&solver).unwrap_err(),
        DispatchError::Solver(SolverError::Malformed {
            what: "dual values",
            expected: 1,
            actual: 0,
        })
    );
}

#[test]
fn scarcity_price_is_marginal_cost_at_full_output() {
    let mut problem = DispatchProblem::default();
    problem.add_generator(generator(1, 100.0, 0.01, 10.0)).unwrap();
    problem.add_load(load(0, 0, 100.0)).unwrap();

    // an interior point method may return any dual at or above 12 here
    let solver = ScriptedSolver::new(QpSolution {
        termination: Termination::Optimal,
        primal: vec![100.0000001],
        duals: vec![57.3],
        iterations: 9,
    });
    let outcome = problem.run_market_clearing(&solver).unwrap();
    assert_eq!(outcome.production(GeneratorId::from(1), TimeStep::default()), Some(100.0));
    assert_eq!(outcome.price(TimeStep::default()), Some(12.0));
}

#[rstest]
fn idle_price_is_cheapest_first_unit(mut two_units: DispatchProblem) {
    two_units.add_load(load(0, 0, 0.0)).unwrap();
    let solver = ScriptedSolver::new(QpSolution {
        termination: Termination::LocallyOptimal,
        primal: vec![-1e-9, 2e-10],
        duals: vec![-3.0],
        iterations: 4,
    });
    let outcome = two_units.run_market_clearing(&solver).unwrap();
    let q1 = outcome.production(GeneratorId::from(1), TimeStep::default()).unwrap();
    assert_eq!(q1, 0.0);
    assert!(q1.is_sign_positive());
    assert_eq!(outcome.price(TimeStep::default()), Some(8.0));
    assert_eq!(outcome.termination, Termination::LocallyOptimal);
}

#[rstest]
#[case::low(11.0)]
#[case::mid(15.5)]
#[case::high(20.0)]
fn split_bounds_price_is_last_unit_served(#[case] dual: f64) {
    let mut problem = DispatchProblem::default();
    problem.add_generator(generator(1, 50.0, 0.01, 10.0)).unwrap();
    problem.add_generator(generator(2, 50.0, 0.01, 20.0)).unwrap();
    problem.add_load(load(0, 0, 50.0)).unwrap();

    // unit 1 is full at marginal cost 11, unit 2 idle at 20; any dual in
    // between balances the period
    let solver = ScriptedSolver::new(QpSolution {
        termination: Termination::Optimal,
        primal: vec![50.0, 0.0],
        duals: vec![dual],
        iterations: 7,
    });
    let outcome = problem.run_market_clearing(&solver).unwrap();
    assert_eq!(outcome.price(TimeStep::default()), Some(11.0));
}

#[rstest]
fn interior_dual_is_taken_as_is(mut two_units: DispatchProblem) {
    two_units.add_load(load(0, 0, 120.0)).unwrap();
    let solver = ScriptedSolver::new(QpSolution {
        termination: Termination::Optimal,
        primal: vec![46.66666666, 73.33333334],
        duals: vec![10.9333333349],
        iterations: 10,
    });
    let outcome = two_units.run_market_clearing(&solver).unwrap();
    assert_eq!(outcome.price(TimeStep::default()), Some(10.933333));
    assert_eq!(
        outcome.production(GeneratorId::from(2), TimeStep::default()),
        Some(73.333333)
    );
}

#[test]
fn fixed_cost_is_reported_but_does_not_move_dispatch() {
    let mut without = DispatchProblem::default();
    let mut with = DispatchProblem::default();
    for (id, c0) in [(1, 0.0), (2, 0.0)] {
        let g = Generator::new(GeneratorId::from(id), "z", 100.0, 0.01 * id as f64, 8.0, c0);
        without.add_generator(g.unwrap()).unwrap();
    }
    for (id, c0) in [(1, 250.0), (2, 40.0)] {
        let g = Generator::new(GeneratorId::from(id), "z", 100.0, 0.01 * id as f64, 8.0, c0);
        with.add_generator(g.unwrap()).unwrap();
    }
    for problem in [&mut without, &mut with] {
        problem.add_load(load(0, 0, 90.0)).unwrap();
        problem.add_load(load(1, 1, 60.0)).unwrap();
    }

    let a = without.run_market_clearing(&BisectionSolver).unwrap().clone();
    let b = with.run_market_clearing(&BisectionSolver).unwrap();

    for ((_, p), (_, q)) in a.periods.iter().zip(b.periods.iter()) {
        assert_eq!(p.dispatch, q.dispatch);
        assert_eq!(p.price, q.price);
        assert_eq!(p.variable_cost, q.variable_cost);
        assert_eq!(q.fixed_cost, 290.0);
    }
    assert_eq!(a.fixed_cost(), 0.0);
    assert_eq!(b.fixed_cost(), 580.0);
    assert_abs_diff_eq!(b.total_cost(), a.total_cost() + 580.0, epsilon = 1e-9);
}

#[test]
fn rounding_respects_precision() {
    assert_eq!(round(1.23456789, 3), 1.235);
    assert_eq!(round(-0.0000004, 6), 0.0);
    assert!(round(-0.0000004, 6).is_sign_positive());
    let problem = DispatchProblem::default().with_precision(2);
    assert_eq!(problem.precision, 2);
}

#[rstest]
#[case::at_limit(MAX_PRECISION)]
#[case::beyond_f64(400)]
#[case::beyond_i32(u32::MAX)]
fn excessive_precision_is_capped(#[case] digits: u32) {
    let mut problem = DispatchProblem::default().with_precision(digits);
    assert_eq!(problem.precision, MAX_PRECISION);
    assert!(round(1.0 / 3.0, digits).is_finite());

    problem.add_generator(generator(1, 100.0, 0.01, 10.0)).unwrap();
    problem.add_load(load(0, 0, 50.0)).unwrap();
    let outcome = problem.run_market_clearing(&BisectionSolver).unwrap();
    let t = TimeStep::default();
    assert_abs_diff_eq!(
        outcome.production(GeneratorId::from(1), t).unwrap(),
        50.0,
        epsilon = 1e-9
    );
    assert_abs_diff_eq!(outcome.price(t).unwrap(), 11.0, epsilon = 1e-9);
}
