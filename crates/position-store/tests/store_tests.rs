use chrono::NaiveDate;
use core_types::{AssetClass, DateWindow, DatedValue, Holding, PriceSeries};
use position_store::{InMemoryPositionStore, PositionStore, StoreError};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn d(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
}

fn holding(symbol: &str, shares: Decimal, class: AssetClass) -> Holding {
    Holding {
        symbol: symbol.to_string(),
        shares,
        average_cost: dec!(50),
        current_price: dec!(1),
        sector: "Diversified".to_string(),
        asset_class: class,
    }
}

fn sample_store() -> InMemoryPositionStore {
    InMemoryPositionStore::with_data(
        vec![
            holding("VTI", dec!(10), AssetClass::Equity),
            holding("BND", dec!(20), AssetClass::FixedIncome),
        ],
        dec!(100),
        vec![
            PriceSeries::from_pairs("VTI", &[d(1), d(2), d(3), d(4)], &[100.0, 102.0, 101.0, 104.0]).unwrap(),
            PriceSeries::from_pairs("BND", &[d(2), d(3), d(4)], &[50.0, 50.5, 50.25]).unwrap(),
        ],
    )
    .unwrap()
}

#[test]
fn snapshot_prices_holdings_as_of_date() {
    let store = sample_store();
    let snapshot = store.get_portfolio_snapshot(d(3)).unwrap();
    assert_eq!(snapshot.holding("VTI").unwrap().current_price, dec!(101));
    assert_eq!(snapshot.holding("BND").unwrap().current_price, dec!(50.5));
    assert_eq!(snapshot.market_value(), dec!(10) * dec!(101) + dec!(20) * dec!(50.5) + dec!(100));
}

#[test]
fn nav_uses_common_dates_and_includes_cash() {
    let store = sample_store();
    let nav = store.get_nav_series(&DateWindow::all()).unwrap();
    assert_eq!(nav.dates(), vec![d(2), d(3), d(4)]);
    let values = nav.values();
    assert!((values[0] - (10.0 * 102.0 + 20.0 * 50.0 + 100.0)).abs() < 1e-9);
    assert!((values[2] - (10.0 * 104.0 + 20.0 * 50.25 + 100.0)).abs() < 1e-9);
}

#[test]
fn asset_class_series_split_holdings_and_cash() {
    let store = sample_store();
    let classes = store.get_asset_class_series(&DateWindow::all()).unwrap();
    assert_eq!(
        classes.keys().copied().collect::<Vec<_>>(),
        vec![AssetClass::Equity, AssetClass::FixedIncome, AssetClass::Cash]
    );
    assert_eq!(classes[&AssetClass::Equity].values(), vec![1020.0, 1010.0, 1040.0]);
    assert_eq!(classes[&AssetClass::Cash].values(), vec![100.0, 100.0, 100.0]);
}

#[test]
fn mutations_do_not_affect_taken_snapshots() {
    let store = sample_store();
    let before = store.get_nav_series(&DateWindow::all()).unwrap();
    store.upsert_holding(holding("VTI", dec!(1000), AssetClass::Equity)).unwrap();
    store.append_price("VTI", DatedValue::new(d(5), 110.0)).unwrap();
    assert_eq!(before.len(), 3);
    assert!((before.values()[0] - 2120.0).abs() < 1e-9);
}

#[test]
fn rejects_negative_shares_and_out_of_order_prices() {
    let store = sample_store();
    assert!(matches!(
        store.upsert_holding(holding("VTI", dec!(-5), AssetClass::Equity)),
        Err(StoreError::Invalid(_))
    ));
    assert!(matches!(
        store.append_price("VTI", DatedValue::new(d(1), 99.0)),
        Err(StoreError::Invalid(_))
    ));
}

#[test]
fn missing_history_for_held_symbol_is_reported() {
    let store = sample_store();
    store.upsert_holding(holding("GLD", dec!(1), AssetClass::Commodity)).unwrap();
    assert_eq!(
        store.get_nav_series(&DateWindow::all()),
        Err(StoreError::MissingHistory("GLD".to_string()))
    );
}

#[test]
fn return_series_comes_from_prices() {
    let store = sample_store();
    let returns = store.get_return_series("VTI", &DateWindow::all()).unwrap();
    assert_eq!(returns.len(), 3);
    assert!((returns.values()[0] - 0.02).abs() < 1e-12);
    assert!(matches!(
        store.get_return_series("QQQ", &DateWindow::all()),
        Err(StoreError::UnknownSymbol(_))
    ));
}
