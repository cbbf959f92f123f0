use crate::config::{DETERMINISTIC_PERCENTILES, SimulationConfig, SimulationMode};
use crate::error::MonteCarloError;
use crate::result::{PercentilePath, SimulationResult, SimulationSummary};
use analytics::stats;
use configuration::SimulationSettings;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, LogNormal};
use rayon::prelude::*;
use tokio_util::sync::CancellationToken;

/// SplitMix64 finalizer; decorrelates the per-path seeds derived from one base seed.
fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Seed of path `index`. Independent of the thread that happens to run it.
pub fn path_seed(seed: u64, index: u64) -> u64 {
    splitmix64(seed ^ splitmix64(index))
}

/// Yearly gross return distribution with arithmetic mean `1 + mean` and standard
/// deviation `volatility`.
#[derive(Debug, Clone, Copy)]
enum GrossReturn {
    Fixed(f64),
    LogNormal(LogNormal<f64>),
}

impl GrossReturn {
    fn new(mean: f64, volatility: f64) -> Result<Self, MonteCarloError> {
        let gross = 1.0 + mean;
        if volatility == 0.0 {
            return Ok(Self::Fixed(gross));
        }
        let sigma2 = (1.0 + (volatility / gross).powi(2)).ln();
        let mu = gross.ln() - sigma2 / 2.0;
        LogNormal::new(mu, sigma2.sqrt())
            .map(Self::LogNormal)
            .map_err(|e| MonteCarloError::Distribution(e.to_string()))
    }

    fn sample(&self, rng: &mut StdRng) -> f64 {
        match self {
            Self::Fixed(g) => *g,
            Self::LogNormal(d) => d.sample(rng),
        }
    }
}

/// Projects portfolio value forward, either along three fixed-rate paths or by
/// Monte Carlo simulation.
#[derive(Debug, Clone, Default)]
pub struct MonteCarloProjector {
    limits: SimulationSettings,
}

impl MonteCarloProjector {
    pub fn new(limits: SimulationSettings) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &SimulationSettings {
        &self.limits
    }

    #[tracing::instrument(
        name = "run_simulation",
        skip_all,
        fields(mode = ?config.mode, iterations = config.iterations, horizon = config.horizon_years)
    )]
    pub fn run_simulation(
        &self,
        config: &SimulationConfig,
        cancel: Option<&CancellationToken>,
    ) -> Result<SimulationResult, MonteCarloError> {
        config.validate(&self.limits)?;

        let result = match config.mode {
            SimulationMode::Deterministic => deterministic(config),
            SimulationMode::Stochastic => stochastic(config, cancel)?,
        };
        tracing::debug!(
            expected_terminal = result.summary.expected_terminal_value,
            median_terminal = result.summary.median_terminal_value,
            "Simulation finished."
        );
        Ok(result)
    }
}

/// Value after each year of compounding at a fixed `rate`. A rate at or below -100%
/// wipes the value out and it stays at zero.
fn compound_path(start: f64, rate: f64, years: u32) -> Vec<f64> {
    let growth = (1.0 + rate).max(0.0);
    let mut values = Vec::with_capacity(years as usize + 1);
    let mut value = start;
    values.push(value);
    for _ in 0..years {
        value *= growth;
        values.push(value);
    }
    values
}

fn deterministic(config: &SimulationConfig) -> SimulationResult {
    let rates = [
        config.mean_return - config.volatility,
        config.mean_return,
        config.mean_return + config.volatility,
    ];
    let paths: Vec<PercentilePath> = DETERMINISTIC_PERCENTILES
        .iter()
        .zip(rates)
        .map(|(&percentile, rate)| PercentilePath {
            percentile,
            values: compound_path(config.start_value, rate, config.horizon_years),
        })
        .collect();

    let base = paths[1].terminal();
    SimulationResult {
        mode: SimulationMode::Deterministic,
        start_value: config.start_value,
        horizon_years: config.horizon_years,
        iterations: config.iterations,
        seed: config.seed,
        paths,
        summary: SimulationSummary {
            expected_terminal_value: base,
            median_terminal_value: base,
            probability_of_loss: None,
        },
    }
}

fn simulate_path(config: &SimulationConfig, distribution: GrossReturn, index: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(path_seed(config.seed, index));
    let mut values = Vec::with_capacity(config.horizon_years as usize + 1);
    let mut value = config.start_value;
    values.push(value);
    for _ in 0..config.horizon_years {
        value *= distribution.sample(&mut rng);
        values.push(value);
    }
    values
}

fn stochastic(
    config: &SimulationConfig,
    cancel: Option<&CancellationToken>,
) -> Result<SimulationResult, MonteCarloError> {
    let distribution = GrossReturn::new(config.mean_return, config.volatility)?;

    // The collect is the barrier: aggregation only starts once every path is back.
    let simulated: Option<Vec<Vec<f64>>> = (0..config.iterations)
        .into_par_iter()
        .map(|i| {
            if cancel.is_some_and(CancellationToken::is_cancelled) {
                None
            } else {
                Some(simulate_path(config, distribution, i as u64))
            }
        })
        .collect();
    let paths = simulated.ok_or(MonteCarloError::Cancelled)?;

    let mut percentiles = config.percentiles.clone();
    percentiles.sort_by(f64::total_cmp);
    percentiles.dedup();

    let years = config.horizon_years as usize + 1;
    let mut bands: Vec<PercentilePath> = percentiles
        .iter()
        .map(|&percentile| PercentilePath {
            percentile,
            values: Vec::with_capacity(years),
        })
        .collect();
    let mut column = Vec::with_capacity(paths.len());
    let mut terminal = Vec::new();
    for year in 0..years {
        column.clear();
        column.extend(paths.iter().map(|p| p[year]));
        column.sort_by(f64::total_cmp);
        for band in &mut bands {
            let value = stats::percentile_linear_sorted(&column, band.percentile).ok_or_else(|| {
                MonteCarloError::Configuration(format!("percentile {} is out of range", band.percentile))
            })?;
            band.values.push(value);
        }
        if year + 1 == years {
            terminal = column.clone();
        }
    }

    let losses = terminal.iter().filter(|v| **v < config.start_value).count();
    let summary = SimulationSummary {
        expected_terminal_value: stats::mean(&terminal).unwrap_or(config.start_value),
        median_terminal_value: stats::percentile_linear_sorted(&terminal, 50.0)
            .unwrap_or(config.start_value),
        probability_of_loss: Some(losses as f64 / terminal.len() as f64),
    };

    Ok(SimulationResult {
        mode: SimulationMode::Stochastic,
        start_value: config.start_value,
        horizon_years: config.horizon_years,
        iterations: config.iterations,
        seed: config.seed,
        paths: bands,
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_seeds_differ() {
        assert_ne!(path_seed(42, 0), path_seed(42, 1));
        assert_ne!(path_seed(42, 0), path_seed(43, 0));
        assert_eq!(path_seed(7, 3), path_seed(7, 3));
    }

    #[test]
    fn lognormal_matches_requested_moments() {
        let GrossReturn::LogNormal(_) = GrossReturn::new(0.07, 0.15).unwrap() else {
            panic!("expected a lognormal distribution");
        };
        let d = GrossReturn::new(0.07, 0.15).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let draws: Vec<f64> = (0..200_000).map(|_| d.sample(&mut rng)).collect();
        let mean = stats::mean(&draws).unwrap();
        let std = stats::sample_std(&draws).unwrap();
        assert!((mean - 1.07).abs() < 0.003, "mean {mean}");
        assert!((std - 0.15).abs() < 0.003, "std {std}");
    }

    #[test]
    fn wiped_out_paths_stay_at_zero() {
        assert_eq!(compound_path(100.0, -1.5, 3), vec![100.0, 0.0, 0.0, 0.0]);
    }
}
