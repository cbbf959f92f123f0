use crate::error::StoreError;
use chrono::NaiveDate;
use core_types::{AssetClass, DateWindow, PortfolioSnapshot, PriceSeries, ReturnSeries};
use std::collections::BTreeMap;

/// Read access to holdings and their price history.
///
/// Every method returns owned data: callers compute on a private copy, so later
/// mutations of the store never leak into a computation that is already running.
pub trait PositionStore: Send + Sync {
    /// Holdings and cash, priced at the latest observation on or before `as_of`.
    fn get_portfolio_snapshot(&self, as_of: NaiveDate) -> Result<PortfolioSnapshot, StoreError>;

    /// Price history of one instrument within `window`.
    fn get_price_series(&self, symbol: &str, window: &DateWindow) -> Result<PriceSeries, StoreError>;

    /// Periodic returns of one instrument within `window`.
    fn get_return_series(&self, symbol: &str, window: &DateWindow) -> Result<ReturnSeries, StoreError> {
        Ok(self.get_price_series(symbol, window)?.returns())
    }

    /// Portfolio NAV (Σ shares × price + cash) over the dates shared by every held instrument.
    fn get_nav_series(&self, window: &DateWindow) -> Result<PriceSeries, StoreError>;

    /// Value of each asset class over the same dates as [`PositionStore::get_nav_series`].
    fn get_asset_class_series(
        &self,
        window: &DateWindow,
    ) -> Result<BTreeMap<AssetClass, PriceSeries>, StoreError>;

    /// Symbols of all current holdings.
    fn symbols(&self) -> Result<Vec<String>, StoreError>;
}

/// Supplies the price series of the benchmark index.
pub trait BenchmarkDataProvider: Send + Sync {
    fn get_benchmark_series(&self, window: &DateWindow) -> Result<PriceSeries, StoreError>;
}

/// Supplies the annualized risk-free rate effective at a date.
pub trait RiskFreeRateProvider: Send + Sync {
    fn get_rate(&self, as_of: NaiveDate) -> Result<f64, StoreError>;
}
