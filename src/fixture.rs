use anyhow::Context;
use chrono::NaiveDate;
use core_types::{Holding, PriceSeries};
use position_store::{FixedRate, InMemoryPositionStore, RateSchedule, RiskFreeRateProvider, StaticBenchmark};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

/// A risk-free rate that takes effect on a date.
#[derive(Debug, Deserialize)]
pub struct RatePoint {
    pub effective: NaiveDate,
    pub rate: f64,
}

/// A portfolio, its price history and market data, as read from a JSON file.
#[derive(Debug, Deserialize)]
pub struct PortfolioFixture {
    pub holdings: Vec<Holding>,
    #[serde(default)]
    pub cash: Decimal,
    pub prices: Vec<PriceSeries>,
    pub benchmark: PriceSeries,
    #[serde(default)]
    pub risk_free_rate: f64,
    /// When present, takes precedence over `risk_free_rate`.
    #[serde(default)]
    pub rate_schedule: Vec<RatePoint>,
}

/// The data sources the engine reads from.
pub struct DataSources {
    pub store: Arc<InMemoryPositionStore>,
    pub benchmark: Arc<StaticBenchmark>,
    pub rates: Arc<dyn RiskFreeRateProvider>,
    /// Date of the last benchmark observation; the default as-of date.
    pub last_date: Option<NaiveDate>,
}

impl PortfolioFixture {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read portfolio file {}", path.display()))?;
        let fixture = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse portfolio file {}", path.display()))?;
        Ok(fixture)
    }

    pub fn into_sources(self) -> anyhow::Result<DataSources> {
        let last_date = self.benchmark.last().map(|p| p.date);
        let store = InMemoryPositionStore::with_data(self.holdings, self.cash, self.prices)?;

        let rates: Arc<dyn RiskFreeRateProvider> = if self.rate_schedule.is_empty() {
            Arc::new(FixedRate(self.risk_free_rate))
        } else {
            let mut schedule = RateSchedule::new();
            for point in self.rate_schedule {
                schedule = schedule.with_rate(point.effective, point.rate)?;
            }
            Arc::new(schedule)
        };

        Ok(DataSources {
            store: Arc::new(store),
            benchmark: Arc::new(StaticBenchmark::new(self.benchmark)),
            rates,
            last_date,
        })
    }
}
