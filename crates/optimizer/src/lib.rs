//! # Vantage Optimizer
//!
//! Evaluates candidate asset-class allocations, filters them by the investor's risk
//! profile, ranks the survivors by Sharpe ratio and optionally refines the best one with
//! a bounded local search.

use crate::evaluate::{evaluate, validate_weights};
use crate::ranking::{filter_by_volatility, rank};
use configuration::{OptimizerSettings, RiskProfiles};
use core_types::RiskProfile;
use rayon::prelude::*;
use tokio_util::sync::CancellationToken;

pub mod error;
pub mod evaluate;
pub mod generator;
pub mod improvement;
pub mod inputs;
pub mod ranking;
pub mod scenario;
pub mod search;

pub use error::OptimizerError;
pub use generator::generate_grid;
pub use improvement::{ImprovementReport, compare_to_baseline};
pub use inputs::OptimizerInputs;
pub use scenario::{
    AllocationScenario, EvaluatedScenario, ExcludedScenario, LocalSearchOutcome,
    OptimizationResult, OptimizerWarning, RankedScenario, SelectedScenario, Weights,
};

pub struct PortfolioOptimizer {
    settings: OptimizerSettings,
    profiles: RiskProfiles,
}

impl PortfolioOptimizer {
    pub fn new(settings: OptimizerSettings, profiles: RiskProfiles) -> Self {
        Self { settings, profiles }
    }

    pub fn settings(&self) -> &OptimizerSettings {
        &self.settings
    }

    /// Maximum annualized volatility a profile accepts.
    pub fn max_volatility(&self, profile: &RiskProfile) -> Result<f64, OptimizerError> {
        let max = self.profiles.max_volatility(profile);
        if !(max.is_finite() && max > 0.0) {
            return Err(OptimizerError::Configuration(format!(
                "risk profile {profile} maps to an invalid maximum volatility {max}"
            )));
        }
        Ok(max)
    }

    /// Validates, evaluates, filters and ranks `candidates`, then runs the local search
    /// from the top ranked scenario when it is enabled.
    #[tracing::instrument(name = "optimize", skip_all, fields(candidates = candidates.len(), profile = %profile))]
    pub fn optimize(
        &self,
        candidates: &[AllocationScenario],
        profile: &RiskProfile,
        inputs: &OptimizerInputs,
        cancel: Option<&CancellationToken>,
    ) -> Result<OptimizationResult, OptimizerError> {
        let max_volatility = self.max_volatility(profile)?;

        // 1. Validate every candidate before any work starts.
        for candidate in candidates {
            validate_weights(candidate, inputs, &self.settings)?;
        }
        if cancel.is_some_and(CancellationToken::is_cancelled) {
            return Err(OptimizerError::Cancelled);
        }

        // 2. Evaluate
        let evaluated: Vec<_> = candidates.par_iter().map(|c| evaluate(c, inputs)).collect();

        // 3. Filter
        let (admitted, excluded) = filter_by_volatility(evaluated, max_volatility);
        for e in &excluded {
            tracing::debug!(scenario = %e.name, volatility = e.volatility, "Excluded by risk profile.");
        }

        // 4. Rank
        let ranked = rank(admitted);

        let mut warnings = Vec::new();
        if ranked.is_empty() && !candidates.is_empty() {
            tracing::warn!(max_volatility, "No candidate fits the risk profile.");
            warnings.push(OptimizerWarning::NoAdmissibleScenario { max_volatility });
        }

        // 5. Refine
        let optimized = match ranked.first() {
            Some(top) if self.settings.local_search.enabled => Some(search::local_search(
                &top.evaluated,
                inputs,
                &self.settings,
                max_volatility,
                cancel,
            )?),
            _ => None,
        };
        if let Some(outcome) = optimized.as_ref().filter(|o| !o.converged) {
            warnings.push(OptimizerWarning::NonConvergence {
                iterations: outcome.iterations,
                final_step: outcome.final_step,
            });
        }

        tracing::info!(
            ranked = ranked.len(),
            excluded = excluded.len(),
            converged = optimized.as_ref().is_none_or(|o| o.converged),
            "Optimization complete."
        );

        Ok(OptimizationResult {
            risk_profile: *profile,
            max_volatility,
            ranked,
            excluded,
            optimized,
            warnings,
        })
    }
}
