use crate::config::SimulationMode;
use serde::{Deserialize, Serialize};

/// Portfolio value per year at one percentile. `values[0]` is the start value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PercentilePath {
    pub percentile: f64,
    pub values: Vec<f64>,
}

impl PercentilePath {
    pub fn terminal(&self) -> f64 {
        self.values.last().copied().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationSummary {
    pub expected_terminal_value: f64,
    pub median_terminal_value: f64,
    /// Share of paths ending below the start value. `None` in deterministic mode.
    pub probability_of_loss: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub mode: SimulationMode,
    pub start_value: f64,
    pub horizon_years: u32,
    pub iterations: usize,
    pub seed: u64,
    /// Percentile paths in ascending percentile order.
    pub paths: Vec<PercentilePath>,
    pub summary: SimulationSummary,
}

impl SimulationResult {
    pub fn path(&self, percentile: f64) -> Option<&PercentilePath> {
        self.paths.iter().find(|p| p.percentile == percentile)
    }

    pub fn years(&self) -> impl Iterator<Item = u32> {
        0..=self.horizon_years
    }
}
