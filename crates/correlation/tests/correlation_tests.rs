use chrono::NaiveDate;
use configuration::{AlignmentMode, CorrelationSettings};
use core_types::{AssetClass, DateWindow, Holding, PriceSeries, ReturnSeries};
use correlation::{CorrelationEngine, CorrelationError};
use position_store::InMemoryPositionStore;
use proptest::prelude::*;
use rust_decimal_macros::dec;
use tokio_util::sync::CancellationToken;

fn day(i: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Days::new(i as u64)
}

fn returns(symbol: &str, start: u32, values: &[f64]) -> ReturnSeries {
    let dates: Vec<NaiveDate> = (0..values.len() as u32).map(|i| day(start + i)).collect();
    ReturnSeries::from_pairs(symbol, &dates, values).unwrap()
}

const BASE: [f64; 8] = [0.01, -0.02, 0.015, 0.0, 0.03, -0.01, 0.005, -0.025];

fn negated() -> Vec<f64> {
    BASE.iter().map(|r| -r).collect()
}

fn engine(alignment: AlignmentMode) -> CorrelationEngine {
    CorrelationEngine::new(CorrelationSettings {
        alignment,
        ..CorrelationSettings::default()
    })
}

#[test]
fn identical_and_negated_series() {
    let series = vec![
        returns("A", 0, &BASE),
        returns("A_COPY", 0, &BASE),
        returns("A_NEG", 0, &negated()),
    ];
    let m = CorrelationEngine::default().from_series(&series, None).unwrap();

    assert_eq!(m.get("A", "A"), Some(1.0));
    assert!((m.get("A", "A_COPY").unwrap() - 1.0).abs() < 1e-12);
    assert!((m.get("A", "A_NEG").unwrap() + 1.0).abs() < 1e-12);
    assert!(m.is_symmetric());
    assert_eq!(m.observations(0, 2), Some(BASE.len()));
}

#[test]
fn flat_series_is_undefined_but_diagonal_is_one() {
    let series = vec![returns("A", 0, &BASE), returns("CASH", 0, &[0.0; 8])];
    let m = CorrelationEngine::default().from_series(&series, None).unwrap();

    assert_eq!(m.get("A", "CASH"), None);
    assert_eq!(m.get("CASH", "CASH"), Some(1.0));
    assert_eq!(m.undefined_pairs().len(), 1);
}

#[test]
fn common_alignment_undefines_everything_without_overlap() {
    // C overlaps A but not B, so the global intersection is empty.
    let series = vec![
        returns("A", 0, &BASE),
        returns("B", 8, &BASE),
        returns("C", 4, &BASE),
    ];

    let common = engine(AlignmentMode::Common).from_series(&series, None).unwrap();
    assert_eq!(common.get("A", "C"), None);
    assert_eq!(common.get("A", "B"), None);

    let pairwise = engine(AlignmentMode::Pairwise).from_series(&series, None).unwrap();
    assert!(pairwise.get("A", "C").is_some());
    assert_eq!(pairwise.observations(0, 2), Some(4));
    assert_eq!(pairwise.get("A", "B"), None);
}

#[test]
fn duplicate_symbols_are_rejected() {
    let series = vec![returns("A", 0, &BASE), returns("A", 0, &negated())];
    let err = CorrelationEngine::default().from_series(&series, None).unwrap_err();
    assert_eq!(err, CorrelationError::DuplicateSymbol("A".to_string()));
}

#[test]
fn cancelled_token_aborts() {
    let token = CancellationToken::new();
    token.cancel();
    let series = vec![returns("A", 0, &BASE), returns("B", 0, &negated())];
    let err = CorrelationEngine::default()
        .from_series(&series, Some(&token))
        .unwrap_err();
    assert_eq!(err, CorrelationError::Cancelled);
}

#[test]
fn reads_series_from_the_store() {
    let prices = |symbol: &str, values: &[f64]| {
        let dates: Vec<NaiveDate> = (0..values.len() as u32).map(day).collect();
        PriceSeries::from_pairs(symbol, &dates, values).unwrap()
    };
    let holding = |symbol: &str| Holding {
        symbol: symbol.to_string(),
        shares: dec!(1),
        average_cost: dec!(1),
        current_price: dec!(1),
        sector: "Index".to_string(),
        asset_class: AssetClass::Equity,
    };
    let store = InMemoryPositionStore::with_data(
        vec![holding("UP"), holding("DOWN")],
        dec!(0),
        vec![
            prices("UP", &[100.0, 110.0, 99.0, 108.9]),
            prices("DOWN", &[100.0, 90.0, 99.0, 89.1]),
        ],
    )
    .unwrap();

    let symbols = vec!["UP".to_string(), "DOWN".to_string()];
    let m = CorrelationEngine::default()
        .compute_correlation(&store, &symbols, &DateWindow::all(), None)
        .unwrap();
    assert!((m.get("UP", "DOWN").unwrap() + 1.0).abs() < 1e-9);

    let missing = vec!["UP".to_string(), "NOPE".to_string()];
    let err = CorrelationEngine::default()
        .compute_correlation(&store, &missing, &DateWindow::all(), None)
        .unwrap_err();
    assert!(matches!(err, CorrelationError::Store(_)));
}

proptest! {
    #[test]
    fn matrix_is_a_valid_correlation_matrix(
        columns in prop::collection::vec(prop::collection::vec(-0.1f64..0.1, 12), 2..6),
        pairwise in any::<bool>(),
    ) {
        let series: Vec<ReturnSeries> = columns
            .iter()
            .enumerate()
            .map(|(k, values)| returns(&format!("S{k}"), 0, values))
            .collect();
        let mode = if pairwise { AlignmentMode::Pairwise } else { AlignmentMode::Common };
        let m = engine(mode).from_series(&series, None).unwrap();

        prop_assert!(m.is_symmetric());
        for i in 0..m.len() {
            prop_assert_eq!(m.get_index(i, i), Some(1.0));
            for j in 0..m.len() {
                if let Some(rho) = m.get_index(i, j) {
                    prop_assert!((-1.0..=1.0).contains(&rho));
                }
            }
        }
    }
}
