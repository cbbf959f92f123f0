use chrono::NaiveDate;
use core_types::{ReturnSeries, SamplingFrequency};
use serde::{Deserialize, Serialize};

/// A point-in-time set of risk and performance metrics for a portfolio.
///
/// This struct is the final output of the `MetricsCalculator`. It is produced fresh on
/// every request and never patched in place. Ratios whose denominator is zero are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskMetricsSnapshot {
    pub as_of: NaiveDate,
    pub portfolio_value: f64,
    pub frequency: SamplingFrequency,
    /// Number of return periods the metrics were computed from.
    pub periods: usize,

    // I. Return
    pub total_return: f64,
    pub annualized_return: f64,
    pub benchmark_annualized_return: f64,

    // II. Volatility and risk-adjusted return
    pub volatility: f64,
    pub downside_deviation: f64,
    pub sharpe_ratio: Option<f64>, // None when volatility is 0
    pub sortino_ratio: Option<f64>, // None when downside deviation is 0

    // III. Market exposure
    pub beta: Option<f64>, // None when benchmark variance is 0
    pub alpha: Option<f64>,
    pub tracking_error: f64,
    pub information_ratio: Option<f64>,

    // IV. Tail risk, in currency units and as return fractions (all <= 0)
    pub var_95: f64,
    pub cvar_95: f64,
    pub var_95_pct: f64,
    pub cvar_95_pct: f64,

    // V. Drawdown
    pub max_drawdown: f64,
    pub calmar_ratio: Option<f64>, // None when there was no drawdown
}

/// Annualized return and volatility of a single instrument or asset class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesStatistics {
    pub symbol: String,
    pub frequency: SamplingFrequency,
    pub periods: usize,
    pub annualized_return: f64,
    pub volatility: f64,
    pub returns: ReturnSeries,
}
