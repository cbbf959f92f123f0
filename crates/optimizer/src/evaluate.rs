use crate::error::OptimizerError;
use crate::inputs::OptimizerInputs;
use crate::scenario::{AllocationScenario, EvaluatedScenario, Weights};
use analytics::{linalg, stats};
use configuration::OptimizerSettings;

/// Rejects weights that are unknown, non-finite, out of bounds or do not sum to 1.
pub fn validate_weights(
    scenario: &AllocationScenario,
    inputs: &OptimizerInputs,
    settings: &OptimizerSettings,
) -> Result<(), OptimizerError> {
    let invalid = |reason: String| {
        Err(OptimizerError::InvalidWeights {
            scenario: scenario.name.clone(),
            reason,
        })
    };

    if let Some(class) = scenario.weights.keys().find(|c| inputs.index_of(**c).is_none()) {
        return invalid(format!("asset class '{class}' has no market data"));
    }
    if let Some((class, w)) = scenario.weights.iter().find(|(_, w)| !w.is_finite()) {
        return invalid(format!("weight {w} for '{class}' is not finite"));
    }
    let total = scenario.total();
    if (total - 1.0).abs() > settings.weight_tolerance {
        return invalid(format!("weights sum to {total}, expected 1"));
    }
    // Classes missing from the scenario count as weight 0 and must respect the bounds too.
    for &class in inputs.asset_classes() {
        let w = scenario.weight(class);
        if w < settings.min_weight - settings.weight_tolerance
            || w > settings.max_weight + settings.weight_tolerance
        {
            return invalid(format!(
                "weight {w} for '{class}' is outside [{}, {}]",
                settings.min_weight, settings.max_weight
            ));
        }
    }
    Ok(())
}

/// Weights in the inputs' asset-class order.
pub fn weight_vector(scenario: &AllocationScenario, inputs: &OptimizerInputs) -> Vec<f64> {
    inputs
        .asset_classes()
        .iter()
        .map(|c| scenario.weight(*c))
        .collect()
}

pub fn weights_from_vector(weights: &[f64], inputs: &OptimizerInputs) -> Weights {
    inputs
        .asset_classes()
        .iter()
        .copied()
        .zip(weights.iter().copied())
        .collect()
}

/// Evaluates an already validated scenario.
pub fn evaluate(scenario: &AllocationScenario, inputs: &OptimizerInputs) -> EvaluatedScenario {
    let w = weight_vector(scenario, inputs);
    evaluate_vector(scenario.name.clone(), &w, inputs)
}

pub(crate) fn evaluate_vector(name: String, w: &[f64], inputs: &OptimizerInputs) -> EvaluatedScenario {
    let expected_return = linalg::dot(w, inputs.expected_returns());
    let volatility = inputs.portfolio_variance(w).max(0.0).sqrt();
    let sharpe_ratio = stats::ratio(expected_return - inputs.risk_free_rate(), volatility);
    let max_drawdown = inputs.history().map(|rows| rebalanced_drawdown(w, rows));

    EvaluatedScenario {
        scenario: AllocationScenario {
            name,
            weights: weights_from_vector(w, inputs),
        },
        expected_return,
        volatility,
        sharpe_ratio,
        max_drawdown,
    }
}

/// Max drawdown of a portfolio rebalanced to `w` every period.
fn rebalanced_drawdown(w: &[f64], rows: &[Vec<f64>]) -> f64 {
    let mut value = 1.0;
    let mut path = Vec::with_capacity(rows.len() + 1);
    path.push(value);
    for row in rows {
        value *= 1.0 + linalg::dot(w, row);
        path.push(value);
    }
    stats::max_drawdown(&path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use core_types::{AssetClass, ReturnSeries};
    use correlation::CorrelationEngine;

    fn inputs() -> OptimizerInputs {
        // Orthogonal return histories: zero correlation.
        let dates: Vec<NaiveDate> = (1..=4)
            .map(|d| NaiveDate::from_ymd_opt(2024, d, 1).unwrap())
            .collect();
        let eq = ReturnSeries::from_pairs("equity", &dates, &[0.1, -0.1, 0.1, -0.1]).unwrap();
        let fi = ReturnSeries::from_pairs("fixed_income", &dates, &[0.1, 0.1, -0.1, -0.1]).unwrap();
        let corr = CorrelationEngine::default().from_series(&[eq, fi], None).unwrap();
        OptimizerInputs::new(
            vec![AssetClass::Equity, AssetClass::FixedIncome],
            vec![0.08, 0.04],
            vec![0.2, 0.1],
            &corr,
            0.02,
        )
        .unwrap()
        .with_history(vec![vec![0.1, -0.1], vec![-0.2, 0.0]])
        .unwrap()
    }

    #[test]
    fn uncorrelated_two_asset_portfolio() {
        let inputs = inputs();
        let half = AllocationScenario::new(
            "half",
            [(AssetClass::Equity, 0.5), (AssetClass::FixedIncome, 0.5)],
        );
        let e = evaluate(&half, &inputs);
        let vol = 0.0125_f64.sqrt();
        assert!((e.expected_return - 0.06).abs() < 1e-12);
        assert!((e.volatility - vol).abs() < 1e-12);
        assert!((e.sharpe_ratio.unwrap() - 0.04 / vol).abs() < 1e-9);
        assert!((e.max_drawdown.unwrap() + 0.1).abs() < 1e-12);
    }

    #[test]
    fn missing_class_counts_as_zero_weight() {
        let inputs = inputs();
        let settings = OptimizerSettings {
            min_weight: 0.1,
            ..OptimizerSettings::default()
        };
        let all_equity = AllocationScenario::new("all-equity", [(AssetClass::Equity, 1.0)]);
        assert!(matches!(
            validate_weights(&all_equity, &inputs, &settings),
            Err(OptimizerError::InvalidWeights { .. })
        ));
        assert!(validate_weights(&all_equity, &inputs, &OptimizerSettings::default()).is_ok());
    }
}
