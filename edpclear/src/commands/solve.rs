use crate::SolverConfig;
use clap::ValueEnum;
use edp_core::{DispatchProblem, ports::QpSolver as _};
use edp_solver::{clarabel::ClarabelSolver, io::Report, osqp::OsqpSolver};
use std::io::Write;

/// The solver libraries `solve` can clear with.
#[derive(Clone, Copy, ValueEnum)]
pub enum SolverLib {
    Clarabel,
    Osqp,
}

impl SolverLib {
    /// Clears the market with this library's adapter, configured from `config`
    pub fn clear(&self, problem: &mut DispatchProblem, config: &SolverConfig) -> Report {
        let result = match self {
            SolverLib::Clarabel => {
                problem.run_market_clearing(&ClarabelSolver::new(config.clarabel()))
            }
            SolverLib::Osqp => problem.run_market_clearing(&OsqpSolver::new(config.osqp())),
        };
        match result {
            Ok(outcome) => Report::from(outcome),
            Err(error) => Report::from(&error),
        }
    }
}

/// How `solve` renders its report.
#[derive(Clone, Copy, ValueEnum)]
pub enum ReportFormat {
    Json,
    Table,
}

impl ReportFormat {
    pub fn write<W: Write>(&self, report: &Report, buffer: &mut W) -> anyhow::Result<()> {
        match self {
            Self::Json => {
                serde_json::to_writer_pretty(&mut *buffer, report)?;
                writeln!(buffer)?;
            }
            Self::Table => write!(buffer, "{report}")?,
        }
        Ok(())
    }
}
