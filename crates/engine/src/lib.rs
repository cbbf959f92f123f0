//! # Vantage Engine
//!
//! Wires the position store and market data providers to the metrics, correlation,
//! simulation and optimization calculators.
//!
//! ## Public API
//!
//! - `RiskEngine`: synchronous facade; every call snapshots provider data, then computes.
//! - `AnalyticsService`: async front end that runs requests on the blocking pool and
//!   discards results superseded by a newer request of the same kind.
//! - `EngineError`: wraps the errors of every calculator crate.

use analytics::{MetricsCalculator, RiskMetricsSnapshot, stats};
use chrono::NaiveDate;
use configuration::Config;
use core_types::{DateWindow, ReturnSeries, RiskProfile};
use correlation::{CorrelationEngine, CorrelationMatrix};
use monte_carlo::{MonteCarloProjector, SimulationConfig, SimulationResult};
use optimizer::evaluate::evaluate;
use optimizer::{
    AllocationScenario, EvaluatedScenario, ImprovementReport, OptimizationResult, OptimizerInputs,
    PortfolioOptimizer, SelectedScenario, compare_to_baseline, generate_grid,
};
use position_store::{BenchmarkDataProvider, PositionStore, RiskFreeRateProvider};
use rust_decimal::prelude::ToPrimitive;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub mod error;
pub mod service;

pub use error::EngineError;
pub use service::{AnalyticsService, RequestSlot};

/// A ranked optimization together with the current allocation, measured against the
/// same market inputs.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationRun {
    pub result: OptimizationResult,
    pub current: EvaluatedScenario,
    /// How the best ranked scenario compares with `current`; `None` when nothing ranked.
    pub improvement: Option<ImprovementReport>,
}

/// The central orchestrator: reads owned snapshots from the data providers and hands them
/// to the calculators.
///
/// Every operation is a pure function of its explicit arguments and the provider data
/// at call time. Nothing is cached between calls.
pub struct RiskEngine {
    // --- Configuration ---
    config: Config,

    // --- Data Sources ---
    store: Arc<dyn PositionStore>,
    benchmark: Arc<dyn BenchmarkDataProvider>,
    rates: Arc<dyn RiskFreeRateProvider>,

    // --- Calculators ---
    metrics: MetricsCalculator,
    correlation: CorrelationEngine,
    projector: MonteCarloProjector,
    optimizer: PortfolioOptimizer,
}

impl RiskEngine {
    /// Creates a new `RiskEngine` with all of its data sources.
    pub fn new(
        config: Config,
        store: Arc<dyn PositionStore>,
        benchmark: Arc<dyn BenchmarkDataProvider>,
        rates: Arc<dyn RiskFreeRateProvider>,
    ) -> Self {
        Self {
            metrics: MetricsCalculator::new(config.metrics.clone()),
            correlation: CorrelationEngine::new(config.correlation.clone()),
            projector: MonteCarloProjector::new(config.simulation.clone()),
            optimizer: PortfolioOptimizer::new(config.optimizer.clone(), config.risk_profiles.clone()),
            config,
            store,
            benchmark,
            rates,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn PositionStore> {
        &self.store
    }

    /// Risk and performance metrics of the portfolio as of `as_of`, over `window`.
    ///
    /// `cancel` is checked once the provider data is loaded, before the calculation runs.
    pub fn compute_metrics(
        &self,
        as_of: NaiveDate,
        window: &DateWindow,
        cancel: Option<&CancellationToken>,
    ) -> Result<RiskMetricsSnapshot, EngineError> {
        let window = window.clamp_end(as_of);
        let snapshot = self.store.get_portfolio_snapshot(as_of)?;
        let nav = self.store.get_nav_series(&window)?;
        let benchmark = self.benchmark.get_benchmark_series(&window)?;
        let risk_free_rate = self.rates.get_rate(as_of)?;
        if cancel.is_some_and(|c| c.is_cancelled()) {
            return Err(EngineError::Cancelled);
        }

        let metrics = self
            .metrics
            .compute_metrics(&snapshot, &nav, &benchmark, risk_free_rate, as_of)?;
        tracing::info!(%as_of, sharpe = ?metrics.sharpe_ratio, "Metrics request complete.");
        Ok(metrics)
    }

    /// Correlation matrix of the given symbols' returns within `window`.
    pub fn compute_correlation(
        &self,
        symbols: &[String],
        window: &DateWindow,
        cancel: Option<&CancellationToken>,
    ) -> Result<CorrelationMatrix, EngineError> {
        let matrix = self
            .correlation
            .compute_correlation(self.store.as_ref(), symbols, window, cancel)?;
        tracing::info!(symbols = matrix.len(), "Correlation request complete.");
        Ok(matrix)
    }

    pub fn run_simulation(
        &self,
        config: &SimulationConfig,
        cancel: Option<&CancellationToken>,
    ) -> Result<SimulationResult, EngineError> {
        let result = self.projector.run_simulation(config, cancel)?;
        tracing::info!(
            mode = ?result.mode,
            horizon = result.horizon_years,
            "Simulation request complete."
        );
        Ok(result)
    }

    /// A projection of the whole portfolio using its historical return and volatility.
    pub fn simulation_from_metrics(&self, metrics: &RiskMetricsSnapshot, horizon_years: u32) -> SimulationConfig {
        SimulationConfig::from_settings(
            &self.config.simulation,
            metrics.portfolio_value,
            horizon_years,
            metrics.annualized_return,
            metrics.volatility,
        )
    }

    /// A projection of `start_value` invested in the selected allocation.
    pub fn simulation_from_scenario(
        &self,
        scenario: &SelectedScenario,
        start_value: f64,
        horizon_years: u32,
    ) -> SimulationConfig {
        SimulationConfig::from_settings(
            &self.config.simulation,
            start_value,
            horizon_years,
            scenario.expected_return,
            scenario.volatility,
        )
    }

    /// Per-asset-class return, volatility, correlation and aligned history within `window`.
    pub fn optimizer_inputs(
        &self,
        as_of: NaiveDate,
        window: &DateWindow,
        cancel: Option<&CancellationToken>,
    ) -> Result<OptimizerInputs, EngineError> {
        let window = window.clamp_end(as_of);
        let class_series = self.store.get_asset_class_series(&window)?;
        let risk_free_rate = self.rates.get_rate(as_of)?;

        let mut classes = Vec::with_capacity(class_series.len());
        let mut expected_returns = Vec::with_capacity(class_series.len());
        let mut volatilities = Vec::with_capacity(class_series.len());
        let mut returns: Vec<ReturnSeries> = Vec::with_capacity(class_series.len());
        for (class, series) in &class_series {
            let stats = self.metrics.series_statistics(series)?;
            tracing::debug!(
                %class,
                annualized_return = stats.annualized_return,
                volatility = stats.volatility,
                "Asset class statistics."
            );
            classes.push(*class);
            expected_returns.push(stats.annualized_return);
            volatilities.push(stats.volatility);
            returns.push(stats.returns);
        }

        let correlation = self.correlation.from_series(&returns, cancel)?;
        let refs: Vec<&ReturnSeries> = returns.iter().collect();
        let history = stats::align_by_date(&refs).rows();

        let inputs = OptimizerInputs::new(classes, expected_returns, volatilities, &correlation, risk_free_rate)?
            .with_history(history)?;
        Ok(inputs)
    }

    /// The portfolio's current asset-class weights, usable as a baseline scenario.
    pub fn current_allocation(&self, as_of: NaiveDate) -> Result<AllocationScenario, EngineError> {
        let snapshot = self.store.get_portfolio_snapshot(as_of)?;
        let total = snapshot.market_value().to_f64().unwrap_or(0.0);
        let weights = snapshot
            .value_by_asset_class()
            .into_iter()
            .filter_map(|(class, value)| {
                let w = value.to_f64().unwrap_or(0.0) / total;
                (w.is_finite() && w > 0.0).then_some((class, w))
            });
        Ok(AllocationScenario::new("current", weights))
    }

    /// Ranks `candidates` for `profile` against market assumptions derived from the store.
    pub fn optimize(
        &self,
        candidates: &[AllocationScenario],
        profile: &RiskProfile,
        as_of: NaiveDate,
        window: &DateWindow,
        cancel: Option<&CancellationToken>,
    ) -> Result<OptimizationResult, EngineError> {
        let inputs = self.optimizer_inputs(as_of, window, cancel)?;
        let result = self.optimizer.optimize(candidates, profile, &inputs, cancel)?;
        Ok(result)
    }

    /// Derives the optimizer inputs once, ranks `candidates` (a grid over the held asset
    /// classes when `None`) and compares the best scenario with the current allocation.
    pub fn optimize_portfolio(
        &self,
        candidates: Option<&[AllocationScenario]>,
        profile: &RiskProfile,
        as_of: NaiveDate,
        window: &DateWindow,
        cancel: Option<&CancellationToken>,
    ) -> Result<OptimizationRun, EngineError> {
        let inputs = self.optimizer_inputs(as_of, window, cancel)?;
        let grid;
        let candidates = match candidates {
            Some(candidates) => candidates,
            None => {
                grid = generate_grid(inputs.asset_classes(), self.optimizer.settings())?;
                tracing::debug!(candidates = grid.len(), "Generated candidate grid.");
                &grid
            }
        };

        let result = self.optimizer.optimize(candidates, profile, &inputs, cancel)?;
        let current = evaluate(&self.current_allocation(as_of)?, &inputs);
        let improvement = result.best().map(|best| compare_to_baseline(&current, best));
        Ok(OptimizationRun { result, current, improvement })
    }

    /// Optimizer settings, e.g. for generating a candidate grid.
    pub fn optimizer(&self) -> &PortfolioOptimizer {
        &self.optimizer
    }
}
