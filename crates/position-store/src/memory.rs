use crate::error::StoreError;
use crate::traits::PositionStore;
use chrono::NaiveDate;
use core_types::{AssetClass, DateWindow, DatedValue, Holding, PortfolioSnapshot, PriceSeries};
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

pub const NAV_SYMBOL: &str = "PORTFOLIO";

#[derive(Debug, Default)]
struct StoreState {
    holdings: BTreeMap<String, Holding>,
    cash: Decimal,
    prices: HashMap<String, PriceSeries>,
}

/// A thread-safe, in-memory implementation of [`PositionStore`].
///
/// The lock is only held while data is copied in or out; computations always run on
/// the owned values returned by the read methods.
#[derive(Debug, Default)]
pub struct InMemoryPositionStore {
    state: RwLock<StoreState>,
}

impl InMemoryPositionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store from a set of holdings, a cash balance and their price histories.
    pub fn with_data(
        holdings: Vec<Holding>,
        cash: Decimal,
        prices: Vec<PriceSeries>,
    ) -> Result<Self, StoreError> {
        let store = Self::new();
        for holding in holdings {
            store.upsert_holding(holding)?;
        }
        store.set_cash(cash)?;
        for series in prices {
            store.set_price_history(series)?;
        }
        Ok(store)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, StoreState>, StoreError> {
        self.state.read().map_err(|_| StoreError::LockPoisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, StoreState>, StoreError> {
        self.state.write().map_err(|_| StoreError::LockPoisoned)
    }

    /// Inserts or replaces a holding. Negative share counts are rejected.
    pub fn upsert_holding(&self, holding: Holding) -> Result<(), StoreError> {
        holding.validate()?;
        tracing::debug!(symbol = %holding.symbol, shares = %holding.shares, "Upserting holding.");
        self.write()?.holdings.insert(holding.symbol.clone(), holding);
        Ok(())
    }

    pub fn remove_holding(&self, symbol: &str) -> Result<Holding, StoreError> {
        self.write()?
            .holdings
            .remove(symbol)
            .ok_or_else(|| StoreError::UnknownSymbol(symbol.to_string()))
    }

    pub fn set_cash(&self, cash: Decimal) -> Result<(), StoreError> {
        if cash.is_sign_negative() && !cash.is_zero() {
            return Err(core_types::CoreError::InvalidInput(
                "cash".to_string(),
                format!("must not be negative, got {cash}"),
            )
            .into());
        }
        self.write()?.cash = cash;
        Ok(())
    }

    /// Replaces the full price history of `series.symbol()`.
    pub fn set_price_history(&self, series: PriceSeries) -> Result<(), StoreError> {
        self.write()?.prices.insert(series.symbol().to_string(), series);
        Ok(())
    }

    /// Appends one observation; it must be dated after the last stored one.
    pub fn append_price(&self, symbol: &str, point: DatedValue) -> Result<(), StoreError> {
        let mut state = self.write()?;
        let mut points = state
            .prices
            .get(symbol)
            .map(|s| s.points().to_vec())
            .unwrap_or_default();
        points.push(point);
        let series = PriceSeries::new(symbol, points)?;
        state.prices.insert(symbol.to_string(), series);
        Ok(())
    }

    /// Holdings with a positive share count, together with their windowed price history.
    fn held_series<'a>(
        state: &'a StoreState,
        window: &DateWindow,
    ) -> Result<Vec<(&'a Holding, PriceSeries)>, StoreError> {
        state
            .holdings
            .values()
            .filter(|h| h.shares > Decimal::ZERO)
            .map(|h| {
                let series = state
                    .prices
                    .get(&h.symbol)
                    .ok_or_else(|| StoreError::MissingHistory(h.symbol.clone()))?;
                Ok((h, series.within(window)))
            })
            .collect()
    }

    /// Dates present in every series.
    fn common_dates(series: &[(&Holding, PriceSeries)]) -> BTreeSet<NaiveDate> {
        let mut iter = series.iter();
        let Some((_, first)) = iter.next() else {
            return BTreeSet::new();
        };
        let mut common: BTreeSet<NaiveDate> = first.dates().into_iter().collect();
        for (_, s) in iter {
            let dates: BTreeSet<NaiveDate> = s.dates().into_iter().collect();
            common = common.intersection(&dates).copied().collect();
        }
        common
    }

    /// Sums `shares × price` per date for the given holdings, plus a constant `offset`.
    fn value_series(
        symbol: &str,
        holdings: &[&(&Holding, PriceSeries)],
        dates: &BTreeSet<NaiveDate>,
        offset: f64,
    ) -> Result<PriceSeries, StoreError> {
        let lookups: Vec<(f64, HashMap<NaiveDate, f64>)> = holdings
            .iter()
            .map(|(h, s)| {
                let shares = h.shares.to_f64().unwrap_or(0.0);
                let by_date = s.points().iter().map(|p| (p.date, p.value)).collect();
                (shares, by_date)
            })
            .collect();

        let points = dates
            .iter()
            .map(|&date| {
                let value = lookups
                    .iter()
                    .map(|(shares, by_date)| shares * by_date.get(&date).copied().unwrap_or(0.0))
                    .sum::<f64>()
                    + offset;
                DatedValue::new(date, value)
            })
            .collect();
        Ok(PriceSeries::new(symbol, points)?)
    }
}

impl PositionStore for InMemoryPositionStore {
    fn get_portfolio_snapshot(&self, as_of: NaiveDate) -> Result<PortfolioSnapshot, StoreError> {
        let state = self.read()?;
        let holdings = state
            .holdings
            .values()
            .map(|h| {
                let mut priced = h.clone();
                if let Some(price) = state
                    .prices
                    .get(&h.symbol)
                    .and_then(|s| s.value_on_or_before(as_of))
                    .and_then(Decimal::from_f64)
                {
                    priced.current_price = price;
                }
                priced
            })
            .collect();
        Ok(PortfolioSnapshot::new(as_of, holdings, state.cash)?)
    }

    fn get_price_series(&self, symbol: &str, window: &DateWindow) -> Result<PriceSeries, StoreError> {
        let state = self.read()?;
        let series = state
            .prices
            .get(symbol)
            .ok_or_else(|| StoreError::UnknownSymbol(symbol.to_string()))?;
        Ok(series.within(window))
    }

    fn get_nav_series(&self, window: &DateWindow) -> Result<PriceSeries, StoreError> {
        let state = self.read()?;
        let held = Self::held_series(&state, window)?;
        if held.is_empty() {
            return Err(StoreError::NoData("the portfolio has no open holdings".to_string()));
        }
        let dates = Self::common_dates(&held);
        let cash = state.cash.to_f64().unwrap_or(0.0);
        let all: Vec<_> = held.iter().collect();
        let nav = Self::value_series(NAV_SYMBOL, &all, &dates, cash)?;
        tracing::debug!(points = nav.len(), holdings = held.len(), "Built NAV series.");
        Ok(nav)
    }

    fn get_asset_class_series(
        &self,
        window: &DateWindow,
    ) -> Result<BTreeMap<AssetClass, PriceSeries>, StoreError> {
        let state = self.read()?;
        let held = Self::held_series(&state, window)?;
        if held.is_empty() {
            return Err(StoreError::NoData("the portfolio has no open holdings".to_string()));
        }
        let dates = Self::common_dates(&held);

        let mut by_class: BTreeMap<AssetClass, Vec<&(&Holding, PriceSeries)>> = BTreeMap::new();
        for entry in &held {
            by_class.entry(entry.0.asset_class).or_default().push(entry);
        }

        let mut result = BTreeMap::new();
        for (class, members) in by_class {
            let series = Self::value_series(class.as_str(), &members, &dates, 0.0)?;
            result.insert(class, series);
        }

        let cash = state.cash.to_f64().unwrap_or(0.0);
        if cash > 0.0 && !dates.is_empty() {
            let points = dates.iter().map(|&d| DatedValue::new(d, cash)).collect();
            let cash_series = PriceSeries::new(AssetClass::Cash.as_str(), points)?;
            match result.get(&AssetClass::Cash) {
                // Cash-like holdings and the cash balance are one class.
                Some(existing) => {
                    let merged = existing
                        .points()
                        .iter()
                        .map(|p| DatedValue::new(p.date, p.value + cash))
                        .collect();
                    result.insert(AssetClass::Cash, PriceSeries::new(AssetClass::Cash.as_str(), merged)?);
                }
                None => {
                    result.insert(AssetClass::Cash, cash_series);
                }
            }
        }
        Ok(result)
    }

    fn symbols(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.read()?.holdings.keys().cloned().collect())
    }
}
