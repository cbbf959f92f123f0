use crate::error::AnalyticsError;
use crate::report::{RiskMetricsSnapshot, SeriesStatistics};
use crate::stats;
use chrono::NaiveDate;
use configuration::MetricsSettings;
use core_types::{CoreError, DateWindow, PortfolioSnapshot, PriceSeries, SamplingFrequency};
use rust_decimal::prelude::ToPrimitive;
use std::collections::BTreeSet;

/// Minimum number of return periods for any volatility-based metric.
pub const MIN_PERIODS: usize = 2;

/// Confidence level of the historical VaR and CVaR fields.
pub const VAR_CONFIDENCE: f64 = 0.95;

/// A stateless calculator for deriving risk and performance metrics from NAV history.
#[derive(Debug, Clone, Default)]
pub struct MetricsCalculator {
    settings: MetricsSettings,
}

impl MetricsCalculator {
    pub fn new(settings: MetricsSettings) -> Self {
        Self { settings }
    }

    /// The main entry point for calculating portfolio metrics.
    ///
    /// # Arguments
    ///
    /// * `portfolio` - Holdings and cash; its market value scales VaR and CVaR.
    /// * `nav` - The portfolio's NAV history.
    /// * `benchmark` - Price history of the benchmark, used for Beta, Alpha and tracking error.
    /// * `risk_free_rate` - Annualized risk-free rate, e.g. `0.04`.
    /// * `as_of` - Observations dated after this are ignored.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `RiskMetricsSnapshot` or an `AnalyticsError`.
    #[tracing::instrument(name = "compute_metrics", skip_all, fields(as_of = %as_of))]
    pub fn compute_metrics(
        &self,
        portfolio: &PortfolioSnapshot,
        nav: &PriceSeries,
        benchmark: &PriceSeries,
        risk_free_rate: f64,
        as_of: NaiveDate,
    ) -> Result<RiskMetricsSnapshot, AnalyticsError> {
        // --- 1. Validation ---
        portfolio.validate()?;
        if !risk_free_rate.is_finite() {
            return Err(CoreError::InvalidInput(
                "risk_free_rate".to_string(),
                risk_free_rate.to_string(),
            )
            .into());
        }
        let portfolio_value = portfolio.market_value().to_f64().ok_or_else(|| {
            AnalyticsError::Calculation("portfolio market value does not fit in f64".to_string())
        })?;

        let window = DateWindow::until(as_of);
        let nav = nav.within(&window);
        let benchmark = benchmark.within(&window);

        let returns = nav.returns();
        if returns.len() < MIN_PERIODS {
            return Err(AnalyticsError::DataInsufficient(format!(
                "portfolio NAV has {} return periods up to {}, at least {} are required",
                returns.len(),
                as_of,
                MIN_PERIODS
            )));
        }
        let frequency = self.frequency_for(&nav)?;
        let ppy = frequency.periods_per_year();
        let r = returns.values();

        tracing::debug!(periods = r.len(), ?frequency, "Computing portfolio metrics.");

        // --- 2. Return and volatility ---
        let mean = stats::mean(&r).unwrap_or(0.0);
        let annualized_return = stats::annualize_mean(mean, ppy);
        let volatility = stats::sample_std(&r).unwrap_or(0.0) * ppy.sqrt();
        let downside_deviation =
            stats::downside_deviation(&r, self.settings.sortino_target).unwrap_or(0.0) * ppy.sqrt();
        let excess = annualized_return - risk_free_rate;
        let sharpe_ratio = stats::ratio(excess, volatility);
        let sortino_ratio = stats::ratio(excess, downside_deviation);

        let values = nav.values();
        let total_return = match (values.first(), values.last()) {
            (Some(first), Some(last)) => last / first - 1.0,
            _ => 0.0,
        };

        // --- 3. Benchmark-relative metrics ---
        // Both return series are taken over the shared price dates, so every pair of
        // returns spans the same interval even when the sampling grids differ.
        let benchmark_dates: BTreeSet<NaiveDate> = benchmark.dates().into_iter().collect();
        let shared: BTreeSet<NaiveDate> = nav
            .dates()
            .into_iter()
            .filter(|d| benchmark_dates.contains(d))
            .collect();
        let shared_nav = nav.on_dates(&shared);
        let port = shared_nav.returns().values();
        let bench = benchmark.on_dates(&shared).returns().values();
        if port.len() < MIN_PERIODS {
            return Err(AnalyticsError::DataInsufficient(format!(
                "portfolio and benchmark '{}' share {} return periods, at least {} are required",
                benchmark.symbol(),
                port.len(),
                MIN_PERIODS
            )));
        }
        let shared_ppy = self.frequency_for(&shared_nav)?.periods_per_year();

        let benchmark_variance = stats::sample_variance(&bench).unwrap_or(0.0);
        let beta = stats::sample_covariance(&port, &bench)
            .and_then(|cov| stats::ratio(cov, benchmark_variance));
        let benchmark_annualized_return =
            stats::annualize_mean(stats::mean(&bench).unwrap_or(0.0), shared_ppy);
        let alpha = beta.map(|beta| {
            annualized_return - (risk_free_rate + beta * (benchmark_annualized_return - risk_free_rate))
        });

        let active: Vec<f64> = port.iter().zip(&bench).map(|(p, b)| p - b).collect();
        let tracking_error = stats::sample_std(&active).unwrap_or(0.0) * shared_ppy.sqrt();
        let information_ratio =
            stats::ratio(annualized_return - benchmark_annualized_return, tracking_error);

        // --- 4. Tail risk ---
        let (quantile, shortfall) = stats::historical_var(&r, VAR_CONFIDENCE).ok_or_else(|| {
            AnalyticsError::Calculation("historical VaR needs at least one return".to_string())
        })?;
        let var_95_pct = quantile.min(0.0);
        let cvar_95_pct = shortfall.min(0.0);

        // --- 5. Drawdown ---
        let max_drawdown = stats::max_drawdown(&values);
        let calmar_ratio = if max_drawdown < -stats::EPSILON {
            Some(annualized_return / max_drawdown.abs())
        } else {
            None
        };

        let snapshot = RiskMetricsSnapshot {
            as_of,
            portfolio_value,
            frequency,
            periods: r.len(),
            total_return,
            annualized_return,
            benchmark_annualized_return,
            volatility,
            downside_deviation,
            sharpe_ratio,
            sortino_ratio,
            beta,
            alpha,
            tracking_error,
            information_ratio,
            var_95: var_95_pct * portfolio_value,
            cvar_95: cvar_95_pct * portfolio_value,
            var_95_pct,
            cvar_95_pct,
            max_drawdown,
            calmar_ratio,
        };

        tracing::debug!(
            annualized_return,
            volatility,
            sharpe = ?sharpe_ratio,
            beta = ?beta,
            max_drawdown,
            "Portfolio metrics computed."
        );
        Ok(snapshot)
    }

    /// Annualized return and volatility of one price series.
    pub fn series_statistics(&self, series: &PriceSeries) -> Result<SeriesStatistics, AnalyticsError> {
        let returns = series.returns();
        if returns.len() < MIN_PERIODS {
            return Err(AnalyticsError::DataInsufficient(format!(
                "series '{}' has {} return periods, at least {} are required",
                series.symbol(),
                returns.len(),
                MIN_PERIODS
            )));
        }
        let frequency = self.frequency_for(series)?;
        let ppy = frequency.periods_per_year();
        let r = returns.values();

        Ok(SeriesStatistics {
            symbol: series.symbol().to_string(),
            frequency,
            periods: r.len(),
            annualized_return: stats::annualize_mean(stats::mean(&r).unwrap_or(0.0), ppy),
            volatility: stats::sample_std(&r).unwrap_or(0.0) * ppy.sqrt(),
            returns,
        })
    }

    fn frequency_for(&self, series: &PriceSeries) -> Result<SamplingFrequency, AnalyticsError> {
        if let Some(frequency) = self.settings.frequency {
            return Ok(frequency);
        }
        SamplingFrequency::infer(&series.dates()).ok_or_else(|| {
            AnalyticsError::DataInsufficient(format!(
                "cannot infer the sampling frequency of '{}' from {} dates",
                series.symbol(),
                series.len()
            ))
        })
    }
}
