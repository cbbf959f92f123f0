use crate::error::ConfigError;
use core_types::{RiskProfile, SamplingFrequency};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The root configuration structure for the entire engine.
///
/// Every section is optional in `config.toml`; missing sections fall back to their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub metrics: MetricsSettings,
    pub correlation: CorrelationSettings,
    pub simulation: SimulationSettings,
    pub optimizer: OptimizerSettings,
    pub risk_profiles: RiskProfiles,
    pub logging: LoggingSettings,
}

impl Config {
    /// Checks cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.correlation.validate()?;
        self.simulation.validate()?;
        self.optimizer.validate()?;
        self.risk_profiles.validate()?;
        Ok(())
    }
}

/// Parameters for the risk and performance metrics calculator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsSettings {
    /// Sampling frequency of NAV series. Inferred from the dates when absent.
    pub frequency: Option<SamplingFrequency>,
    /// Minimum acceptable periodic return for the Sortino downside deviation.
    pub sortino_target: f64,
}

impl Default for MetricsSettings {
    fn default() -> Self {
        Self {
            frequency: None,
            sortino_target: 0.0,
        }
    }
}

/// How return series are aligned before pairwise correlation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum AlignmentMode {
    /// Every series is cut to the dates shared by all requested symbols.
    #[default]
    Common,
    /// Each pair is aligned on the dates shared by just those two symbols.
    Pairwise,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrelationSettings {
    pub alignment: AlignmentMode,
    /// Minimum overlapping observations for a cell to be defined.
    pub min_overlap: usize,
}

impl Default for CorrelationSettings {
    fn default() -> Self {
        Self {
            alignment: AlignmentMode::Common,
            min_overlap: 2,
        }
    }
}

impl CorrelationSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.min_overlap < 2 {
            return Err(ConfigError::ValidationError(
                "correlation.min_overlap must be at least 2".to_string(),
            ));
        }
        Ok(())
    }
}

/// Defaults and hard limits for Monte Carlo projections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    pub default_iterations: usize,
    pub default_seed: u64,
    /// Percentile bands extracted per year, each in (0, 100).
    pub percentiles: Vec<f64>,
    pub max_horizon_years: u32,
    pub max_iterations: usize,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            default_iterations: 10_000,
            default_seed: 42,
            percentiles: vec![5.0, 50.0, 95.0],
            max_horizon_years: 100,
            max_iterations: 1_000_000,
        }
    }
}

impl SimulationSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.default_iterations == 0 || self.default_iterations > self.max_iterations {
            return Err(ConfigError::ValidationError(format!(
                "simulation.default_iterations must be in 1..={}",
                self.max_iterations
            )));
        }
        if self.percentiles.is_empty() {
            return Err(ConfigError::ValidationError(
                "simulation.percentiles must not be empty".to_string(),
            ));
        }
        if let Some(p) = self.percentiles.iter().find(|p| !(**p > 0.0 && **p < 100.0)) {
            return Err(ConfigError::ValidationError(format!(
                "simulation.percentiles entry {p} is outside (0, 100)"
            )));
        }
        Ok(())
    }
}

/// Weight bounds and local-search tuning for the allocation optimizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerSettings {
    pub min_weight: f64,
    pub max_weight: f64,
    /// Allowed deviation of Σweights from 1.
    pub weight_tolerance: f64,
    /// Step of the candidate grid generator.
    pub grid_step: f64,
    pub local_search: LocalSearchSettings,
}

impl Default for OptimizerSettings {
    fn default() -> Self {
        Self {
            min_weight: 0.0,
            max_weight: 1.0,
            weight_tolerance: 1e-6,
            grid_step: 0.1,
            local_search: LocalSearchSettings::default(),
        }
    }
}

impl OptimizerSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.min_weight)
            || !(0.0..=1.0).contains(&self.max_weight)
            || self.min_weight > self.max_weight
        {
            return Err(ConfigError::ValidationError(format!(
                "optimizer weight bounds [{}, {}] must satisfy 0 <= min <= max <= 1",
                self.min_weight, self.max_weight
            )));
        }
        if !(self.weight_tolerance > 0.0) {
            return Err(ConfigError::ValidationError(
                "optimizer.weight_tolerance must be positive".to_string(),
            ));
        }
        if !(self.grid_step > 0.0 && self.grid_step <= 1.0) {
            return Err(ConfigError::ValidationError(
                "optimizer.grid_step must be in (0, 1]".to_string(),
            ));
        }
        self.local_search.validate()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalSearchSettings {
    pub enabled: bool,
    /// Iteration budget. Exhausting it yields a best-effort result flagged as not converged.
    pub max_iterations: usize,
    pub initial_step: f64,
    /// The search has converged once the step shrinks below this.
    pub min_step: f64,
    /// Minimum Sharpe improvement for a move to be accepted.
    pub tolerance: f64,
}

impl Default for LocalSearchSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            max_iterations: 200,
            initial_step: 0.05,
            min_step: 1e-4,
            tolerance: 1e-9,
        }
    }
}

impl LocalSearchSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.min_step > 0.0 && self.initial_step >= self.min_step) {
            return Err(ConfigError::ValidationError(
                "optimizer.local_search requires 0 < min_step <= initial_step".to_string(),
            ));
        }
        if self.tolerance < 0.0 {
            return Err(ConfigError::ValidationError(
                "optimizer.local_search.tolerance must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// Maximum annualized volatility accepted by each named risk profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskProfiles {
    pub conservative: f64,
    pub moderate: f64,
    pub aggressive: f64,
}

impl Default for RiskProfiles {
    fn default() -> Self {
        Self {
            conservative: 0.10,
            moderate: 0.15,
            aggressive: 0.25,
        }
    }
}

impl RiskProfiles {
    pub fn max_volatility(&self, profile: &RiskProfile) -> f64 {
        match profile {
            RiskProfile::Conservative => self.conservative,
            RiskProfile::Moderate => self.moderate,
            RiskProfile::Aggressive => self.aggressive,
            RiskProfile::Custom(max_vol) => *max_vol,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("conservative", self.conservative),
            ("moderate", self.moderate),
            ("aggressive", self.aggressive),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::ValidationError(format!(
                    "risk_profiles.{name} must be a positive volatility, got {value}"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum LogFormat {
    #[default]
    Full,
    Compact,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// An `EnvFilter` directive such as `info` or `vantage=debug,optimizer=trace`.
    /// `RUST_LOG` takes precedence when set.
    pub level: String,
    pub format: LogFormat,
    /// When set, logs go to a daily rolling file in this directory instead of stderr.
    pub directory: Option<PathBuf>,
    pub file_prefix: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Full,
            directory: None,
            file_prefix: "vantage.log".to_string(),
        }
    }
}
