use crate::error::MonteCarloError;
use configuration::SimulationSettings;
use serde::{Deserialize, Serialize};

/// How future paths are generated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulationMode {
    /// Three fixed-rate paths: mean − vol, mean, mean + vol.
    Deterministic,
    /// Independent lognormal yearly returns per path.
    #[default]
    Stochastic,
}

/// Percentiles reported by the deterministic mode, in path order.
pub const DETERMINISTIC_PERCENTILES: [f64; 3] = [5.0, 50.0, 95.0];

/// Inputs of one projection. Every run is fully determined by this struct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub start_value: f64,
    pub horizon_years: u32,
    pub iterations: usize,
    /// Expected annual return, e.g. `0.07`.
    pub mean_return: f64,
    /// Annual volatility, e.g. `0.15`.
    pub volatility: f64,
    pub seed: u64,
    pub mode: SimulationMode,
    /// Bands to extract in stochastic mode, each in (0, 100).
    pub percentiles: Vec<f64>,
}

impl SimulationConfig {
    /// A stochastic config using the default iterations, seed and bands from `settings`.
    pub fn from_settings(
        settings: &SimulationSettings,
        start_value: f64,
        horizon_years: u32,
        mean_return: f64,
        volatility: f64,
    ) -> Self {
        Self {
            start_value,
            horizon_years,
            iterations: settings.default_iterations,
            mean_return,
            volatility,
            seed: settings.default_seed,
            mode: SimulationMode::Stochastic,
            percentiles: settings.percentiles.clone(),
        }
    }

    pub fn with_mode(mut self, mode: SimulationMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Checks the config against the hard caps in `limits`.
    pub fn validate(&self, limits: &SimulationSettings) -> Result<(), MonteCarloError> {
        let fail = |msg: String| Err(MonteCarloError::Configuration(msg));

        if !self.start_value.is_finite() || self.start_value <= 0.0 {
            return fail(format!("start value must be positive, got {}", self.start_value));
        }
        if self.iterations == 0 {
            return fail("iterations must be at least 1".to_string());
        }
        if self.iterations > limits.max_iterations {
            return fail(format!(
                "iterations {} exceed the limit of {}",
                self.iterations, limits.max_iterations
            ));
        }
        if self.horizon_years > limits.max_horizon_years {
            return fail(format!(
                "horizon of {} years exceeds the limit of {}",
                self.horizon_years, limits.max_horizon_years
            ));
        }
        if !self.mean_return.is_finite() || self.mean_return <= -1.0 {
            return fail(format!(
                "mean return must be finite and above -100%, got {}",
                self.mean_return
            ));
        }
        if !self.volatility.is_finite() || self.volatility < 0.0 {
            return fail(format!(
                "volatility must be finite and non-negative, got {}",
                self.volatility
            ));
        }
        if self.mode == SimulationMode::Stochastic {
            if self.percentiles.is_empty() {
                return fail("at least one percentile is required".to_string());
            }
            if let Some(p) = self.percentiles.iter().find(|p| !(**p > 0.0 && **p < 100.0)) {
                return fail(format!("percentile {p} is outside (0, 100)"));
            }
        }
        Ok(())
    }
}
