use edp_core::DispatchProblem;
use edp_core::dispatch::Formulation;
use edp_core::models::TimeStep;
use std::io::{Error, ErrorKind, Write};

// Interchange formats restrict identifier characters, so negative time steps
// are spelled with an `m` prefix instead of a minus sign.
fn step_label(time_step: TimeStep) -> String {
    let step = i64::from(time_step);
    if step < 0 {
        format!("m{}", step.unsigned_abs())
    } else {
        step.to_string()
    }
}

// A balance row without generators has no terms to write, which neither
// format can express.
fn ensure_generators(formulation: &Formulation) -> Result<(), Error> {
    if formulation.generators.is_empty() && !formulation.periods.is_empty() {
        Err(Error::new(
            ErrorKind::InvalidInput,
            "cannot export a dispatch with loads but no generators",
        ))
    } else {
        Ok(())
    }
}

// Production variables are named `p_{generator}_{step}`, balance rows `balance_{step}`.
struct Names {
    variables: Vec<String>,
    rows: Vec<String>,
}

impl Names {
    fn new(formulation: &Formulation) -> Self {
        let mut variables = vec![String::new(); formulation.program.num_variables()];
        let mut rows = Vec::with_capacity(formulation.periods.len());
        for (t, (time_step, _)) in formulation.periods.iter().enumerate() {
            let label = step_label(*time_step);
            for (g, generator_id) in formulation.generators.iter().enumerate() {
                variables[formulation.variable(g, t)] = format!("p_{generator_id}_{label}");
            }
            rows.push(format!("balance_{label}"));
        }
        Self { variables, rows }
    }
}

/// Formulate the dispatch problem and export the program to `.mps` format.
///
/// Fails with [`ErrorKind::InvalidInput`] when loads are registered without any generator.
pub fn export_mps(problem: &DispatchProblem, buffer: &mut impl Write) -> Result<(), Error> {
    // MPS is a somewhat archaic format, but is easy enough to generate.
    // https://www.ibm.com/docs/en/icos/22.1.2?topic=standard-records-in-mps-format
    // is a good reference.
    let formulation = problem.formulate();
    ensure_generators(&formulation)?;
    let program = &formulation.program;
    let names = Names::new(&formulation);

    writeln!(buffer, "NAME economic_dispatch")?;
    writeln!(buffer, "ROWS")?;

    // The objective is total social cost
    writeln!(buffer, " N    cost")?;

    // One balance row per time step; their duals are the clearing prices
    for row in names.rows.iter() {
        writeln!(buffer, " E    {row}")?;
    }

    writeln!(buffer, "COLUMNS")?;
    let columns = program.equality_columns();
    for (idx, column) in columns.iter().enumerate() {
        let var = &names.variables[idx];
        if program.linear[idx] != 0.0 {
            writeln!(buffer, "    {var}    cost    {}", program.linear[idx])?;
        }
        for &(row, coef) in column.iter() {
            writeln!(buffer, "    {var}    {}    {coef}", names.rows[row])?;
        }
    }

    writeln!(buffer, "RHS")?;
    for (row, equality) in names.rows.iter().zip(program.equalities.iter()) {
        writeln!(buffer, "    RHS    {row}    {}", equality.rhs)?;
    }

    // Variables are non-negative by default in MPS, so only the upper bounds remain
    writeln!(buffer, "BOUNDS")?;
    for (var, upper) in names.variables.iter().zip(program.upper.iter()) {
        if upper.is_finite() {
            writeln!(buffer, " UP BND    {var}    {upper}")?;
        }
    }

    // The quadratic extension specifies ½xᵀQx, so the diagonal is doubled
    writeln!(buffer, "QUADOBJ")?;
    for (var, quad) in names.variables.iter().zip(program.quadratic.iter()) {
        if *quad != 0.0 {
            writeln!(buffer, "    {var}    {var}    {}", 2.0 * quad)?;
        }
    }

    writeln!(buffer, "ENDATA")?;
    Ok(())
}

/// Formulate the dispatch problem and export the program to CPLEX `.lp` format.
///
/// Fails with [`ErrorKind::InvalidInput`] when loads are registered without any generator.
pub fn export_lp(problem: &DispatchProblem, buffer: &mut impl Write) -> Result<(), Error> {
    let formulation = problem.formulate();
    ensure_generators(&formulation)?;
    let program = &formulation.program;
    let names = Names::new(&formulation);

    writeln!(buffer, "\\ economic dispatch")?;
    writeln!(buffer, "Minimize")?;
    write!(buffer, " cost:")?;

    let mut empty = true;
    for (var, linear) in names.variables.iter().zip(program.linear.iter()) {
        if *linear != 0.0 {
            write!(buffer, " {} {var}", signed(*linear, empty))?;
            empty = false;
        }
    }

    // The bracketed quadratic part is halved by the format, hence the factor 2
    let mut quadratic = names
        .variables
        .iter()
        .zip(program.quadratic.iter())
        .filter(|(_, quad)| **quad != 0.0)
        .peekable();
    if quadratic.peek().is_some() {
        write!(buffer, " {} [", if empty { "" } else { "+" })?;
        let mut first = true;
        for (var, quad) in quadratic {
            write!(buffer, " {} {var} ^2", signed(2.0 * quad, first))?;
            first = false;
        }
        write!(buffer, " ] / 2")?;
        empty = false;
    }
    if empty {
        write!(buffer, " 0")?;
    }
    writeln!(buffer)?;

    writeln!(buffer, "Subject To")?;
    for (row, equality) in names.rows.iter().zip(program.equalities.iter()) {
        write!(buffer, " {row}:")?;
        for (pos, &(idx, coef)) in equality.terms.iter().enumerate() {
            write!(buffer, " {} {}", signed(coef, pos == 0), names.variables[idx])?;
        }
        writeln!(buffer, " = {}", equality.rhs)?;
    }

    writeln!(buffer, "Bounds")?;
    for (var, upper) in names.variables.iter().zip(program.upper.iter()) {
        if upper.is_finite() {
            writeln!(buffer, " 0 <= {var} <= {upper}")?;
        }
    }

    writeln!(buffer, "End")?;
    Ok(())
}

// Coefficients are written with an explicit sign between terms, and only a
// minus sign on the leading term.
fn signed(value: f64, leading: bool) -> String {
    match (leading, value < 0.0) {
        (true, false) => format!("{value}"),
        (true, true) => format!("- {}", -value),
        (false, false) => format!("+ {value}"),
        (false, true) => format!("- {}", -value),
    }
}
