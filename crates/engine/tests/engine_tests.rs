use chrono::NaiveDate;
use configuration::Config;
use core_types::{AssetClass, DateWindow, Holding, PriceSeries, RiskProfile};
use engine::{AnalyticsService, EngineError, RiskEngine};
use monte_carlo::SimulationMode;
use optimizer::generate_grid;
use position_store::{FixedRate, InMemoryPositionStore, PositionStore, StaticBenchmark};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

const VTI: [f64; 13] = [200.0, 204.0, 198.0, 206.0, 210.0, 205.0, 212.0, 218.0, 214.0, 220.0, 226.0, 222.0, 230.0];
const BND: [f64; 13] = [80.0, 80.2, 80.5, 80.3, 80.6, 80.9, 81.0, 80.8, 81.2, 81.5, 81.4, 81.8, 82.0];
const INDEX: [f64; 13] = [
    4000.0, 4060.0, 3980.0, 4100.0, 4150.0, 4080.0, 4190.0, 4270.0, 4220.0, 4300.0, 4380.0, 4330.0, 4450.0,
];

fn dates() -> Vec<NaiveDate> {
    (0..13)
        .map(|i| NaiveDate::from_ymd_opt(2024 + i / 12, (i % 12) as u32 + 1, 1).unwrap())
        .collect()
}

fn last_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
}

fn holding(symbol: &str, shares: Decimal, class: AssetClass) -> Holding {
    Holding {
        symbol: symbol.to_string(),
        shares,
        average_cost: dec!(100),
        current_price: dec!(0),
        sector: "Index".to_string(),
        asset_class: class,
    }
}

fn setup() -> (Arc<InMemoryPositionStore>, RiskEngine) {
    let dates = dates();
    let store = Arc::new(
        InMemoryPositionStore::with_data(
            vec![
                holding("VTI", dec!(10), AssetClass::Equity),
                holding("BND", dec!(25), AssetClass::FixedIncome),
            ],
            dec!(500),
            vec![
                PriceSeries::from_pairs("VTI", &dates, &VTI).unwrap(),
                PriceSeries::from_pairs("BND", &dates, &BND).unwrap(),
            ],
        )
        .unwrap(),
    );
    let benchmark = StaticBenchmark::new(PriceSeries::from_pairs("INDEX", &dates, &INDEX).unwrap());
    let engine = RiskEngine::new(
        Config::default(),
        store.clone(),
        Arc::new(benchmark),
        Arc::new(FixedRate(0.02)),
    );
    (store, engine)
}

#[test]
fn metrics_cover_the_full_history() {
    let (_, engine) = setup();
    let metrics = engine.compute_metrics(last_date(), &DateWindow::all(), None).unwrap();

    assert!((metrics.portfolio_value - 4850.0).abs() < 1e-6);
    assert_eq!(metrics.periods, 12);
    assert!(metrics.volatility > 0.0);
    assert!(metrics.sharpe_ratio.is_some());
    assert!(metrics.beta.is_some());
    assert!(metrics.var_95 <= 0.0);
    assert!(metrics.max_drawdown <= 0.0);
}

#[test]
fn sharpe_of_a_sixty_forty_portfolio_built_from_prices() {
    // 6 x 100 in equity and 8 x 50 in a flat bond fund: a 60/40 split of 1000.
    // Equity prices are chosen so the NAV alternates +2% and 0% for 12 months.
    let dates = dates();
    let nav: Vec<f64> = (0..13).map(|i| 1000.0 * 1.02_f64.powi((i + 1) / 2)).collect();
    let equity: Vec<f64> = nav.iter().map(|v| (v - 400.0) / 6.0).collect();
    let bond = [50.0; 13];

    let store = Arc::new(
        InMemoryPositionStore::with_data(
            vec![
                holding("VTI", dec!(6), AssetClass::Equity),
                holding("BND", dec!(8), AssetClass::FixedIncome),
            ],
            Decimal::ZERO,
            vec![
                PriceSeries::from_pairs("VTI", &dates, &equity).unwrap(),
                PriceSeries::from_pairs("BND", &dates, &bond).unwrap(),
            ],
        )
        .unwrap(),
    );
    let benchmark = StaticBenchmark::new(PriceSeries::from_pairs("INDEX", &dates, &INDEX).unwrap());
    let engine = RiskEngine::new(Config::default(), store, Arc::new(benchmark), Arc::new(FixedRate(0.02)));

    let metrics = engine.compute_metrics(last_date(), &DateWindow::all(), None).unwrap();

    assert_eq!(metrics.periods, 12);
    assert!((metrics.portfolio_value - nav[12]).abs() < 1e-6);
    // Monthly returns alternate 0.02 and 0.00: mean 0.01, sample variance 0.0012 / 11.
    let annual = 1.01_f64.powi(12) - 1.0;
    let vol = (0.0144_f64 / 11.0).sqrt();
    let expected_sharpe = (annual - 0.02) / vol;
    assert!((metrics.annualized_return - annual).abs() < 1e-9);
    assert!((metrics.volatility - vol).abs() < 1e-9);
    assert!((metrics.sharpe_ratio.unwrap() - expected_sharpe).abs() < 1e-6);
}

#[test]
fn as_of_clamps_the_window() {
    let (_, engine) = setup();
    let mid = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
    let metrics = engine.compute_metrics(mid, &DateWindow::all(), None).unwrap();
    assert_eq!(metrics.periods, 6);
    assert_eq!(metrics.as_of, mid);
}

#[test]
fn cancelled_metrics_request_stops_before_calculating() {
    let (_, engine) = setup();
    let token = CancellationToken::new();
    token.cancel();
    let err = engine
        .compute_metrics(last_date(), &DateWindow::all(), Some(&token))
        .unwrap_err();
    assert_eq!(err, EngineError::Cancelled);
}

#[test]
fn snapshots_are_owned_by_the_caller() {
    let (store, engine) = setup();
    let snapshot = store.get_portfolio_snapshot(last_date()).unwrap();
    let before = engine.compute_metrics(last_date(), &DateWindow::all(), None).unwrap();

    store.set_cash(dec!(1500)).unwrap();

    assert_eq!(snapshot.cash, dec!(500));
    let after = engine.compute_metrics(last_date(), &DateWindow::all(), None).unwrap();
    assert!((before.portfolio_value - 4850.0).abs() < 1e-6);
    assert!((after.portfolio_value - 5850.0).abs() < 1e-6);
}

#[test]
fn current_allocation_sums_to_one() {
    let (_, engine) = setup();
    let current = engine.current_allocation(last_date()).unwrap();
    assert_eq!(current.name, "current");
    assert!((current.total() - 1.0).abs() < 1e-9);
    assert!((current.weight(AssetClass::Cash) - 500.0 / 4850.0).abs() < 1e-9);
}

#[test]
fn optimizes_a_grid_over_held_asset_classes() {
    let (_, engine) = setup();
    let inputs = engine.optimizer_inputs(last_date(), &DateWindow::all(), None).unwrap();
    assert_eq!(
        inputs.asset_classes(),
        &[AssetClass::Equity, AssetClass::FixedIncome, AssetClass::Cash]
    );
    assert_eq!(inputs.volatilities()[2], 0.0);

    let grid = generate_grid(inputs.asset_classes(), engine.optimizer().settings()).unwrap();
    let result = engine
        .optimize(&grid, &RiskProfile::Moderate, last_date(), &DateWindow::all(), None)
        .unwrap();

    assert_eq!(result.ranked.len() + result.excluded.len(), grid.len());
    assert!(result.ranked.iter().all(|r| r.evaluated.volatility <= 0.15 + 1e-9));
    let best = result.best().unwrap();
    assert!((best.scenario.total() - 1.0).abs() < 1e-6);
}

#[test]
fn optimize_portfolio_compares_the_best_with_the_current_allocation() {
    let (_, engine) = setup();
    let run = engine
        .optimize_portfolio(None, &RiskProfile::Moderate, last_date(), &DateWindow::all(), None)
        .unwrap();

    let inputs = engine.optimizer_inputs(last_date(), &DateWindow::all(), None).unwrap();
    let grid = generate_grid(inputs.asset_classes(), engine.optimizer().settings()).unwrap();
    let explicit = engine
        .optimize(&grid, &RiskProfile::Moderate, last_date(), &DateWindow::all(), None)
        .unwrap();
    assert_eq!(run.result.ranked, explicit.ranked);

    assert_eq!(run.current.name(), "current");
    let best = run.result.best().unwrap();
    let report = run.improvement.unwrap();
    assert!((report.return_change - (best.expected_return - run.current.expected_return)).abs() < 1e-12);
}

#[test]
fn simulation_from_metrics_projects_portfolio_value() {
    let (_, engine) = setup();
    let metrics = engine.compute_metrics(last_date(), &DateWindow::all(), None).unwrap();
    let config = engine
        .simulation_from_metrics(&metrics, 5)
        .with_mode(SimulationMode::Deterministic);
    let result = engine.run_simulation(&config, None).unwrap();

    assert_eq!(result.paths.len(), 3);
    assert!(result.paths.iter().all(|p| p.values.len() == 6));
    assert!((result.paths[0].values[0] - metrics.portfolio_value).abs() < 1e-9);
}

#[tokio::test]
async fn service_runs_requests_off_the_runtime() {
    let (_, engine) = setup();
    let service = AnalyticsService::new(Arc::new(engine));

    let metrics = service.compute_metrics(last_date(), DateWindow::all()).await.unwrap();
    assert_eq!(metrics.periods, 12);

    let matrix = service
        .compute_correlation(vec!["VTI".to_string(), "BND".to_string()], DateWindow::all())
        .await
        .unwrap();
    assert_eq!(matrix.get("VTI", "VTI"), Some(1.0));
    assert_eq!(matrix.get("VTI", "BND"), matrix.get("BND", "VTI"));
}
