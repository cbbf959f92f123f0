//! # Vantage Analytics
//!
//! This crate turns NAV histories into risk and performance metrics: annualized return,
//! volatility, Sharpe, Sortino, Alpha, Beta, historical VaR/CVaR, max drawdown and Calmar.
//!
//! ## Architectural Principles
//!
//! - **Layer 1 Logic:** This is a pure logic crate. It has no knowledge of where the data
//!   comes from. It depends only on `core-types` and `configuration`.
//! - **Stateless Calculation:** The `MetricsCalculator` takes a snapshot and series as
//!   input and produces a `RiskMetricsSnapshot` as output. Calling it twice on the same
//!   input yields the same snapshot.
//! - **Degenerate is not an error:** zero volatility or zero drawdown produce `None` ratios.
//!
//! ## Public API
//!
//! - `MetricsCalculator`: The main struct that contains the calculation logic.
//! - `RiskMetricsSnapshot`, `SeriesStatistics`: the calculator's outputs.
//! - `stats`, `linalg`: numeric helpers shared with the correlation and optimizer crates.
//! - `AnalyticsError`: The specific error types that can be returned from this crate.

pub mod calculator;
pub mod error;
pub mod linalg;
pub mod report;
pub mod stats;

pub use calculator::{MIN_PERIODS, MetricsCalculator, VAR_CONFIDENCE};
pub use error::AnalyticsError;
pub use report::{RiskMetricsSnapshot, SeriesStatistics};
