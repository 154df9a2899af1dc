/**
 * These are the solver adapters that implement `edp_core::ports::QpSolver`.
 */
mod impls;
pub use impls::*;

/**
 * Writers for the dispatch program in standard interchange formats.
 */
pub mod export;

/**
 * JSON input and report types, for use by command-line tools.
 */
#[cfg(feature = "io")]
pub mod io;
