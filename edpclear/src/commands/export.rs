use clap::ValueEnum;
use edp_core::DispatchProblem;
use edp_solver::export::{export_lp, export_mps};
use std::io::Write;

/// The interchange formats the dispatch program can be written in.
#[derive(Clone, Copy, Debug, PartialEq, ValueEnum)]
pub enum ExportFormat {
    /// Free MPS with a QUADOBJ section
    Mps,
    /// CPLEX LP
    Lp,
}

impl ExportFormat {
    /// The requested format, falling back to the one the output file's extension names
    pub fn resolve(
        requested: Option<Self>,
        extension: Option<&str>,
    ) -> Result<Self, ExportFormatError> {
        if let Some(format) = requested {
            return Ok(format);
        }
        let extension = extension.ok_or(ExportFormatError::Unspecified)?;
        Self::value_variants()
            .iter()
            .copied()
            .find(|format| {
                format
                    .to_possible_value()
                    .is_some_and(|value| value.get_name().eq_ignore_ascii_case(extension))
            })
            .ok_or_else(|| ExportFormatError::Extension(extension.to_owned()))
    }

    pub fn export<W: Write>(&self, problem: &DispatchProblem, buffer: &mut W) -> anyhow::Result<()> {
        match self {
            Self::Mps => export_mps(problem, buffer)?,
            Self::Lp => export_lp(problem, buffer)?,
        };
        Ok(())
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ExportFormatError {
    #[error("no export format given and none implied by the output; pass --format")]
    Unspecified,
    #[error("`.{0}` does not name an export format (expected mps or lp)")]
    Extension(String),
}
