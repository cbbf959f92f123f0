use crate::error::StoreError;
use crate::traits::{BenchmarkDataProvider, RiskFreeRateProvider};
use chrono::NaiveDate;
use core_types::{CoreError, DateWindow, PriceSeries};
use std::collections::BTreeMap;

/// A benchmark backed by a fixed, preloaded price series.
#[derive(Debug, Clone)]
pub struct StaticBenchmark {
    series: PriceSeries,
}

impl StaticBenchmark {
    pub fn new(series: PriceSeries) -> Self {
        Self { series }
    }
}

impl BenchmarkDataProvider for StaticBenchmark {
    fn get_benchmark_series(&self, window: &DateWindow) -> Result<PriceSeries, StoreError> {
        let series = self.series.within(window);
        if series.is_empty() {
            return Err(StoreError::NoData(format!(
                "benchmark '{}' has no observations in the requested window",
                self.series.symbol()
            )));
        }
        Ok(series)
    }
}

/// The same annualized risk-free rate at every date.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedRate(pub f64);

impl RiskFreeRateProvider for FixedRate {
    fn get_rate(&self, _as_of: NaiveDate) -> Result<f64, StoreError> {
        Ok(self.0)
    }
}

/// A step function of rates: the rate effective at a date is the latest one set on or before it.
#[derive(Debug, Clone, Default)]
pub struct RateSchedule {
    rates: BTreeMap<NaiveDate, f64>,
}

impl RateSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rate(mut self, effective: NaiveDate, rate: f64) -> Result<Self, StoreError> {
        if !rate.is_finite() {
            return Err(CoreError::InvalidInput("risk_free_rate".to_string(), rate.to_string()).into());
        }
        self.rates.insert(effective, rate);
        Ok(self)
    }
}

impl RiskFreeRateProvider for RateSchedule {
    fn get_rate(&self, as_of: NaiveDate) -> Result<f64, StoreError> {
        self.rates
            .range(..=as_of)
            .next_back()
            .map(|(_, rate)| *rate)
            .ok_or(StoreError::NoRate(as_of))
    }
}
