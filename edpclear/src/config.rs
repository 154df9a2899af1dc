//! Application configuration management.
//!
//! Settings are merged from default values, an optional configuration file,
//! and environment variables, in increasing order of precedence.

use clarabel::solver::DefaultSettings;
use config::{ConfigBuilder, Environment, builder::DefaultState};
use edp_core::dispatch::{DEFAULT_PRECISION, MAX_PRECISION};
use edp_solver::{clarabel::ClarabelSolver, osqp::OsqpSolver};
use serde::{Deserialize, Serialize};
use std::{path::Path, time::Duration};

/// Settings that parse but cannot be honored.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    /// More digits than an f64 carries
    #[error("report.precision must be at most {max}, got {0}", max = MAX_PRECISION)]
    Precision(u32),
}

/// The main application configuration that composes all component configs
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
pub struct AppConfig {
    /// Settings shared by the solver libraries
    #[serde(default)]
    pub solver: SolverConfig,

    /// Presentation of the results
    #[serde(default)]
    pub report: ReportConfig,
}

/// Solver settings. Omitted values leave the library defaults in place.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct SolverConfig {
    /// Print the solver's own progress log
    pub verbose: bool,
    /// The maximum number of iterations
    pub max_iter: Option<u32>,
    /// The wall-clock limit for a single solve
    #[serde(with = "humantime_serde::option")]
    pub time_limit: Option<Duration>,
    /// The convergence tolerance, applied to both absolute and relative criteria
    pub tolerance: Option<f64>,
}

/// Report settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ReportConfig {
    /// The number of decimal digits production and prices are rounded to
    pub precision: u32,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            precision: DEFAULT_PRECISION,
        }
    }
}

impl AppConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Environment variables (highest priority)
    /// 2. Config file given by the CLI
    /// 3. Default values (lowest priority)
    ///
    /// Environment variables are mapped using the pattern
    /// `EDP_<SECTION>__<KEY>` to `<section>.<key>`, e.g.
    ///
    /// ```bash
    /// export EDP_SOLVER__TIME_LIMIT="5s"
    /// export EDP_REPORT__PRECISION=4
    /// ```
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = Self::defaults()?;

        // Layer on config file if it is specified and exists
        if let Some(path) = path {
            if path.exists() {
                config = config.add_source(config::File::from(path));
            } else {
                return Err(anyhow::anyhow!(
                    "Config file {} does not exist",
                    path.display()
                ));
            }
        }

        config = config.add_source(Self::environment());

        Self::finish(config)
    }

    fn finish(config: ConfigBuilder<DefaultState>) -> anyhow::Result<Self> {
        let built_config = config.build()?;
        let app: Self = built_config.try_deserialize()?;
        app.validate()?;
        Ok(app)
    }

    /// Rejects values that deserialize but are out of range
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.report.precision > MAX_PRECISION {
            return Err(ConfigError::Precision(self.report.precision));
        }
        Ok(())
    }

    fn defaults() -> anyhow::Result<ConfigBuilder<DefaultState>> {
        Ok(config::Config::builder().add_source(config::Config::try_from(&Self::default())?))
    }

    // This maps EDP_SOLVER__MAX_ITER to solver.max_iter
    fn environment() -> Environment {
        Environment::with_prefix("EDP")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
    }
}

impl SolverConfig {
    /// Clarabel settings with the configured overrides applied
    pub fn clarabel(&self) -> DefaultSettings<f64> {
        let mut settings = ClarabelSolver::default_settings();
        settings.verbose = self.verbose;
        if let Some(max_iter) = self.max_iter {
            settings.max_iter = max_iter;
        }
        if let Some(limit) = self.time_limit {
            settings.time_limit = limit.as_secs_f64();
        }
        if let Some(tolerance) = self.tolerance {
            settings.tol_gap_abs = tolerance;
            settings.tol_gap_rel = tolerance;
            settings.tol_feas = tolerance;
        }
        settings
    }

    /// OSQP settings with the configured overrides applied
    pub fn osqp(&self) -> osqp::Settings {
        let mut settings = OsqpSolver::default_settings().verbose(self.verbose);
        if let Some(max_iter) = self.max_iter {
            settings = settings.max_iter(max_iter);
        }
        if self.time_limit.is_some() {
            settings = settings.time_limit(self.time_limit);
        }
        if let Some(tolerance) = self.tolerance {
            settings = settings.eps_abs(tolerance).eps_rel(tolerance);
        }
        settings
    }
}
