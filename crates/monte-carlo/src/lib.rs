//! # Vantage Monte Carlo
//!
//! Projects a portfolio's value over a multi-year horizon.
//!
//! In deterministic mode three fixed-rate paths are compounded (pessimistic, base and
//! optimistic). In stochastic mode each path draws independent lognormal yearly returns
//! from its own seeded generator, so a given config and seed always produce the same
//! percentile bands no matter how rayon schedules the paths.

pub mod config;
pub mod error;
pub mod projector;
pub mod result;

pub use config::{DETERMINISTIC_PERCENTILES, SimulationConfig, SimulationMode};
pub use error::MonteCarloError;
pub use projector::{MonteCarloProjector, path_seed};
pub use result::{PercentilePath, SimulationResult, SimulationSummary};
