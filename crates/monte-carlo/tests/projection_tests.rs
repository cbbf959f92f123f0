use analytics::stats;
use configuration::SimulationSettings;
use monte_carlo::{MonteCarloError, MonteCarloProjector, SimulationConfig, SimulationMode};
use proptest::prelude::*;
use tokio_util::sync::CancellationToken;

fn config(horizon_years: u32, iterations: usize) -> SimulationConfig {
    SimulationConfig::from_settings(&SimulationSettings::default(), 100_000.0, horizon_years, 0.07, 0.15)
        .with_iterations(iterations)
}

#[test]
fn deterministic_base_path_compounds_the_cagr() {
    let projector = MonteCarloProjector::default();
    let config = SimulationConfig {
        start_value: 70.0,
        mean_return: 0.10,
        volatility: 0.05,
        ..config(5, 1)
    }
    .with_mode(SimulationMode::Deterministic);

    let result = projector.run_simulation(&config, None).unwrap();

    let base = result.path(50.0).unwrap();
    assert_eq!(base.values.len(), 6);
    assert!((base.terminal() - 112.7357).abs() < 0.01);
    assert!((result.path(5.0).unwrap().terminal() - 70.0 * 1.05_f64.powi(5)).abs() < 1e-9);
    assert!((result.path(95.0).unwrap().terminal() - 70.0 * 1.15_f64.powi(5)).abs() < 1e-9);
    assert_eq!(result.summary.probability_of_loss, None);
}

#[test]
fn same_seed_gives_identical_output() {
    let projector = MonteCarloProjector::default();
    let config = config(10, 2_000).with_seed(7);

    let first = projector.run_simulation(&config, None).unwrap();
    let second = projector.run_simulation(&config, None).unwrap();
    assert_eq!(first, second);

    let other = projector.run_simulation(&config.clone().with_seed(8), None).unwrap();
    assert_ne!(first.paths, other.paths);
}

#[test]
fn output_does_not_depend_on_the_thread_pool() {
    let config = config(5, 1_000).with_seed(99);
    let single = rayon::ThreadPoolBuilder::new()
        .num_threads(1)
        .build()
        .unwrap()
        .install(|| MonteCarloProjector::default().run_simulation(&config, None).unwrap());
    let many = MonteCarloProjector::default().run_simulation(&config, None).unwrap();
    assert_eq!(single, many);
}

#[test]
fn zero_horizon_returns_the_start_value() {
    let projector = MonteCarloProjector::default();
    for mode in [SimulationMode::Deterministic, SimulationMode::Stochastic] {
        let result = projector
            .run_simulation(&config(0, 500).with_mode(mode), None)
            .unwrap();
        for path in &result.paths {
            assert_eq!(path.values, vec![100_000.0]);
        }
    }
}

#[test]
fn zero_iterations_is_a_configuration_error() {
    let projector = MonteCarloProjector::default();
    for mode in [SimulationMode::Deterministic, SimulationMode::Stochastic] {
        let err = projector
            .run_simulation(&config(5, 0).with_mode(mode), None)
            .unwrap_err();
        assert!(matches!(err, MonteCarloError::Configuration(_)));
    }
}

#[test]
fn cancelled_run_returns_no_result() {
    let token = CancellationToken::new();
    token.cancel();
    let err = MonteCarloProjector::default()
        .run_simulation(&config(5, 1_000), Some(&token))
        .unwrap_err();
    assert_eq!(err, MonteCarloError::Cancelled);
}

#[test]
fn more_iterations_narrow_the_median_band() {
    let projector = MonteCarloProjector::default();
    let spread = |iterations: usize| {
        let medians: Vec<f64> = (0..20)
            .map(|seed| {
                let result = projector
                    .run_simulation(&config(5, iterations).with_seed(seed), None)
                    .unwrap();
                result.path(50.0).unwrap().terminal()
            })
            .collect();
        stats::sample_std(&medians).unwrap()
    };
    let coarse = spread(100);
    let fine = spread(10_000);
    assert!(fine < coarse * 0.5, "coarse {coarse}, fine {fine}");
}

#[test]
fn zero_volatility_paths_are_all_the_same() {
    let config = SimulationConfig { volatility: 0.0, ..config(3, 100) };
    let result = MonteCarloProjector::default().run_simulation(&config, None).unwrap();
    let expected = 100_000.0 * 1.07_f64.powi(3);
    for path in &result.paths {
        assert!((path.terminal() - expected).abs() < 1e-6);
    }
    assert_eq!(result.summary.probability_of_loss, Some(0.0));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn bands_are_ordered(
        mean in -0.2f64..0.2,
        vol in 0.01f64..0.4,
        seed in any::<u64>(),
    ) {
        let config = SimulationConfig { mean_return: mean, volatility: vol, ..config(6, 300) }.with_seed(seed);
        let result = MonteCarloProjector::default().run_simulation(&config, None).unwrap();
        let (p5, p50, p95) = (
            result.path(5.0).unwrap(),
            result.path(50.0).unwrap(),
            result.path(95.0).unwrap(),
        );
        for year in 0..=6 {
            prop_assert!(p5.values[year] <= p50.values[year]);
            prop_assert!(p50.values[year] <= p95.values[year]);
            prop_assert!(p5.values[year] > 0.0);
        }
    }
}
