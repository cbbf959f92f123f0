use crate::enums::AssetClass;
use crate::error::CoreError;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// A single position held in the portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub symbol: String,
    pub shares: Decimal,
    pub average_cost: Decimal,
    pub current_price: Decimal,
    pub sector: String,
    pub asset_class: AssetClass,
}

impl Holding {
    /// Market value at the current price (shares × price).
    pub fn market_value(&self) -> Decimal {
        self.shares * self.current_price
    }

    pub fn cost_basis(&self) -> Decimal {
        self.shares * self.average_cost
    }

    pub fn unrealized_pnl(&self) -> Decimal {
        self.market_value() - self.cost_basis()
    }

    /// Rejects negative share counts, negative prices and blank symbols.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.symbol.trim().is_empty() {
            return Err(CoreError::InvalidInput(
                "symbol".to_string(),
                "must not be empty".to_string(),
            ));
        }
        if self.shares.is_sign_negative() && !self.shares.is_zero() {
            return Err(CoreError::NegativeShares {
                symbol: self.symbol.clone(),
                shares: self.shares.to_string(),
            });
        }
        if self.current_price.is_sign_negative() && !self.current_price.is_zero() {
            return Err(CoreError::InvalidInput(
                format!("{}.current_price", self.symbol),
                "must not be negative".to_string(),
            ));
        }
        if self.average_cost.is_sign_negative() && !self.average_cost.is_zero() {
            return Err(CoreError::InvalidInput(
                format!("{}.average_cost", self.symbol),
                "must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// The holdings and cash of a portfolio as of a given date.
///
/// Invariant: `market_value() == Σ(shares × price) + cash`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSnapshot {
    pub as_of: NaiveDate,
    pub holdings: Vec<Holding>,
    pub cash: Decimal,
}

impl PortfolioSnapshot {
    /// Builds a validated snapshot.
    pub fn new(as_of: NaiveDate, holdings: Vec<Holding>, cash: Decimal) -> Result<Self, CoreError> {
        let snapshot = Self { as_of, holdings, cash };
        snapshot.validate()?;
        Ok(snapshot)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        let mut seen = HashSet::new();
        for holding in &self.holdings {
            holding.validate()?;
            if !seen.insert(holding.symbol.as_str()) {
                return Err(CoreError::DuplicateSymbol(holding.symbol.clone()));
            }
        }
        Ok(())
    }

    pub fn holdings_value(&self) -> Decimal {
        self.holdings.iter().map(Holding::market_value).sum()
    }

    pub fn market_value(&self) -> Decimal {
        self.holdings_value() + self.cash
    }

    /// Market value per asset class. Cash is reported under `AssetClass::Cash`.
    pub fn value_by_asset_class(&self) -> BTreeMap<AssetClass, Decimal> {
        let mut totals = BTreeMap::new();
        for holding in &self.holdings {
            *totals.entry(holding.asset_class).or_insert(Decimal::ZERO) += holding.market_value();
        }
        if !self.cash.is_zero() {
            *totals.entry(AssetClass::Cash).or_insert(Decimal::ZERO) += self.cash;
        }
        totals
    }

    /// Market value per sector tag, excluding cash.
    pub fn value_by_sector(&self) -> BTreeMap<String, Decimal> {
        let mut totals = BTreeMap::new();
        for holding in &self.holdings {
            *totals.entry(holding.sector.clone()).or_insert(Decimal::ZERO) += holding.market_value();
        }
        totals
    }

    pub fn holding(&self, symbol: &str) -> Option<&Holding> {
        self.holdings.iter().find(|h| h.symbol == symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn holding(symbol: &str, shares: Decimal, price: Decimal, class: AssetClass) -> Holding {
        Holding {
            symbol: symbol.to_string(),
            shares,
            average_cost: dec!(10),
            current_price: price,
            sector: "Technology".to_string(),
            asset_class: class,
        }
    }

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()
    }

    #[test]
    fn market_value_includes_cash() {
        let snapshot = PortfolioSnapshot::new(
            as_of(),
            vec![
                holding("AAPL", dec!(10), dec!(190.5), AssetClass::Equity),
                holding("TLT", dec!(20), dec!(92), AssetClass::FixedIncome),
            ],
            dec!(1000),
        )
        .unwrap();

        assert_eq!(snapshot.holdings_value(), dec!(3745));
        assert_eq!(snapshot.market_value(), dec!(4745));

        let by_class = snapshot.value_by_asset_class();
        assert_eq!(by_class[&AssetClass::Equity], dec!(1905));
        assert_eq!(by_class[&AssetClass::Cash], dec!(1000));
    }

    #[test]
    fn rejects_negative_shares() {
        let result = PortfolioSnapshot::new(
            as_of(),
            vec![holding("AAPL", dec!(-1), dec!(190), AssetClass::Equity)],
            Decimal::ZERO,
        );
        assert!(matches!(result, Err(CoreError::NegativeShares { .. })));
    }

    #[test]
    fn rejects_duplicate_symbols() {
        let result = PortfolioSnapshot::new(
            as_of(),
            vec![
                holding("AAPL", dec!(1), dec!(190), AssetClass::Equity),
                holding("AAPL", dec!(2), dec!(190), AssetClass::Equity),
            ],
            Decimal::ZERO,
        );
        assert_eq!(result, Err(CoreError::DuplicateSymbol("AAPL".to_string())));
    }

    #[test]
    fn unrealized_pnl_uses_average_cost() {
        let h = holding("MSFT", dec!(4), dec!(12.5), AssetClass::Equity);
        assert_eq!(h.unrealized_pnl(), dec!(10));
    }
}
