#![doc = include_str!("../README.md")]

use clap::Parser;
use edp_core::DispatchProblem;
use edp_solver::io::{RawDispatch, Report};
use std::{io::Write as _, path::PathBuf};
use tracing::{Level, event};

mod io;
pub use io::*;

mod commands;
pub use commands::*;

mod config;
pub use config::{AppConfig, ConfigError, ReportConfig, SolverConfig};

// The top-level arguments: the configuration source and which subcommand to execute
#[derive(Parser)]
#[command(version, about, long_about = None)]
pub struct BaseArgs {
    /// Path to a TOML configuration file
    #[arg(short, long, global = true, env = "EDP_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

impl BaseArgs {
    pub fn evaluate(self) -> anyhow::Result<()> {
        let config = AppConfig::load(self.config.as_deref())?;

        match self.command {
            Commands::Solve { io, lib, format } => {
                let input = io.read()?;
                let raw = serde_json::from_reader::<_, RawDispatch>(input)?;

                let problem = DispatchProblem::default().with_precision(config.report.precision);
                let report = match raw.prepare_into(problem) {
                    Ok(mut problem) => lib.clear(&mut problem, &config.solver),
                    Err(error) => Report::from(error),
                };

                let mut output = io.write()?;
                format.write(&report, &mut output)?;
                output.flush()?;

                if let Report::Unsolved { kind, reason } = report {
                    event!(Level::ERROR, ?kind, %reason, "market not cleared");
                    return Err(CliError::Unsolved(kind))?;
                }
            }
            Commands::Export { io, format } => {
                let input = io.read()?;
                let problem = serde_json::from_reader::<_, RawDispatch>(input)?.prepare()?;

                let format = ExportFormat::resolve(format, io.extension())?;

                let mut output = io.write()?;
                format.export(&problem, &mut output)?;
                output.flush()?;
            }
            Commands::Schema { output } => {
                let schema = schemars::schema_for!(RawDispatch);
                let mut output = output.writer()?;
                serde_json::to_writer_pretty(&mut output, &schema)?;
                writeln!(output)?;
            }
        }

        Ok(())
    }
}

#[derive(thiserror::Error, Debug)]
pub enum CliError {
    #[error("The market was not cleared ({0:?})")]
    Unsolved(edp_solver::io::FailureKind),
}
