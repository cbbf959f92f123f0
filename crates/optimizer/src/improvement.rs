use crate::scenario::EvaluatedScenario;
use analytics::stats;
use serde::{Deserialize, Serialize};

/// How a candidate compares to a baseline allocation, e.g. the current one.
///
/// Relative changes are fractions of the baseline's magnitude and are `None` when the
/// baseline value is zero or undefined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImprovementReport {
    pub baseline: String,
    pub candidate: String,
    pub return_change: f64,
    pub volatility_change: f64,
    pub relative_return_change: Option<f64>,
    pub relative_volatility_change: Option<f64>,
    pub sharpe_change: Option<f64>,
    pub relative_sharpe_change: Option<f64>,
}

pub fn compare_to_baseline(baseline: &EvaluatedScenario, candidate: &EvaluatedScenario) -> ImprovementReport {
    let relative = |new: f64, old: f64| stats::ratio(new - old, old.abs());
    let sharpe_change = match (candidate.sharpe_ratio, baseline.sharpe_ratio) {
        (Some(new), Some(old)) => Some(new - old),
        _ => None,
    };
    let relative_sharpe_change = match (candidate.sharpe_ratio, baseline.sharpe_ratio) {
        (Some(new), Some(old)) => relative(new, old),
        _ => None,
    };

    ImprovementReport {
        baseline: baseline.name().to_string(),
        candidate: candidate.name().to_string(),
        return_change: candidate.expected_return - baseline.expected_return,
        volatility_change: candidate.volatility - baseline.volatility,
        relative_return_change: relative(candidate.expected_return, baseline.expected_return),
        relative_volatility_change: relative(candidate.volatility, baseline.volatility),
        sharpe_change,
        relative_sharpe_change,
    }
}
