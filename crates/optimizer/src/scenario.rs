use core_types::{AssetClass, RiskProfile};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write;

pub type Weights = BTreeMap<AssetClass, f64>;

/// A named candidate allocation. Classes absent from `weights` hold weight 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationScenario {
    pub name: String,
    pub weights: Weights,
}

impl AllocationScenario {
    pub fn new(name: impl Into<String>, weights: impl IntoIterator<Item = (AssetClass, f64)>) -> Self {
        Self {
            name: name.into(),
            weights: weights.into_iter().collect(),
        }
    }

    pub fn weight(&self, class: AssetClass) -> f64 {
        self.weights.get(&class).copied().unwrap_or(0.0)
    }

    pub fn total(&self) -> f64 {
        self.weights.values().sum()
    }

    /// A compact label such as `equity:60/fixed_income:40`.
    pub fn label(weights: &Weights) -> String {
        let mut label = String::new();
        for (class, w) in weights.iter().filter(|(_, w)| **w > 0.0) {
            if !label.is_empty() {
                label.push('/');
            }
            let _ = write!(label, "{}:{}", class, (w * 100.0).round());
        }
        label
    }
}

/// A scenario with its derived risk and return attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluatedScenario {
    pub scenario: AllocationScenario,
    pub expected_return: f64,
    pub volatility: f64,
    pub sharpe_ratio: Option<f64>,
    /// Drawdown of the periodically rebalanced historical path, when history was supplied.
    pub max_drawdown: Option<f64>,
}

impl EvaluatedScenario {
    pub fn name(&self) -> &str {
        &self.scenario.name
    }
}

/// An admitted scenario with its position in the ranking, starting at 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedScenario {
    pub rank: usize,
    pub evaluated: EvaluatedScenario,
}

/// A scenario left out of the ranking because it is too volatile for the risk profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExcludedScenario {
    pub name: String,
    pub volatility: f64,
    pub max_volatility: f64,
}

/// The scenario a user picked, reduced to what a projection needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedScenario {
    pub name: String,
    pub weights: Weights,
    pub expected_return: f64,
    pub volatility: f64,
}

impl From<&EvaluatedScenario> for SelectedScenario {
    fn from(evaluated: &EvaluatedScenario) -> Self {
        Self {
            name: evaluated.scenario.name.clone(),
            weights: evaluated.scenario.weights.clone(),
            expected_return: evaluated.expected_return,
            volatility: evaluated.volatility,
        }
    }
}

/// The best scenario the local search reached from the top ranked one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalSearchOutcome {
    pub started_from: String,
    pub scenario: EvaluatedScenario,
    pub iterations: usize,
    pub final_step: f64,
    pub converged: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OptimizerWarning {
    /// The local search ran out of iterations before its step shrank below the minimum.
    NonConvergence { iterations: usize, final_step: f64 },
    /// Every candidate exceeded the volatility threshold.
    NoAdmissibleScenario { max_volatility: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub risk_profile: RiskProfile,
    pub max_volatility: f64,
    pub ranked: Vec<RankedScenario>,
    pub excluded: Vec<ExcludedScenario>,
    pub optimized: Option<LocalSearchOutcome>,
    pub warnings: Vec<OptimizerWarning>,
}

impl OptimizationResult {
    /// The refined scenario when local search ran, otherwise the top ranked one.
    pub fn best(&self) -> Option<&EvaluatedScenario> {
        self.optimized
            .as_ref()
            .map(|o| &o.scenario)
            .or_else(|| self.ranked.first().map(|r| &r.evaluated))
    }

    /// Looks a scenario up by name among the ranked and the optimized ones.
    pub fn select(&self, name: &str) -> Option<SelectedScenario> {
        self.ranked
            .iter()
            .map(|r| &r.evaluated)
            .chain(self.optimized.as_ref().map(|o| &o.scenario))
            .find(|e| e.name() == name)
            .map(SelectedScenario::from)
    }

    pub fn converged(&self) -> bool {
        self.optimized.as_ref().is_none_or(|o| o.converged)
    }
}
