#![warn(missing_docs)]
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/README.md"))]

/// Core domain models for economic dispatch.
///
/// This module contains the generator and load records, their identifiers,
/// and the solver-neutral quadratic program that the dispatch problem is
/// formulated into. The models are plain data with validated constructors;
/// they carry no solve state.
pub mod models;

/// Interface traits for economic dispatch.
///
/// This module contains the "ports" in the hexagonal architecture pattern.
/// The only port presently is the quadratic program solver, which lets any
/// QP library (or a deterministic test double) be injected into a solve.
pub mod ports;

/// The dispatch problem: registration, formulation, solve and result extraction.
pub mod dispatch;
pub use dispatch::{DispatchError, DispatchOutcome, DispatchProblem, Infeasibility, PeriodOutcome};
