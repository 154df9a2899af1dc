use super::{IOArgs, Stream};
use clap::Subcommand;

mod export;
mod solve;

pub use export::{ExportFormat, ExportFormatError};
pub use solve::{ReportFormat, SolverLib};

#[derive(Subcommand)]
pub enum Commands {
    /// Clear the market and report the dispatch and prices
    Solve {
        #[command(flatten)]
        io: IOArgs,

        /// The QP solver library to clear with
        #[arg(short, long, default_value = "clarabel")]
        lib: SolverLib,

        /// How to render the report
        #[arg(short, long, default_value = "json")]
        format: ReportFormat,
    },

    /// Write the dispatch quadratic program for an external solver
    Export {
        #[command(flatten)]
        io: IOArgs,

        /// The interchange format (defaults to the output file's extension)
        #[arg(short, long)]
        format: Option<ExportFormat>,
    },

    /// Print the JSON schema of the input document
    Schema {
        /// Where to write the schema, or "-" for stdout
        #[arg(short, long, default_value = "-", value_parser = clap::value_parser!(Stream))]
        output: Stream,
    },
}
