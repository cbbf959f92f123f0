use crate::error::OptimizerError;
use crate::scenario::{AllocationScenario, Weights};
use configuration::OptimizerSettings;
use core_types::AssetClass;
use itertools::Itertools;

/// Upper bound on the raw Cartesian product walked by the grid generator.
pub const MAX_GRID_POINTS: u128 = 5_000_000;

/// Generates every weight vector on the `grid_step` lattice that lies within the weight
/// bounds and sums to 1.
pub fn generate_grid(
    asset_classes: &[AssetClass],
    settings: &OptimizerSettings,
) -> Result<Vec<AllocationScenario>, OptimizerError> {
    if asset_classes.is_empty() {
        return Err(OptimizerError::ParameterGeneration(
            "at least one asset class is required".to_string(),
        ));
    }
    let step = settings.grid_step;
    if !(step > 0.0 && step <= 1.0) {
        return Err(OptimizerError::ParameterGeneration(format!(
            "grid step {step} must be in (0, 1]"
        )));
    }
    // Work in integer units of `step` so the Σ = 1 filter is exact.
    let units = (1.0 / step).round() as u32;
    if ((units as f64) * step - 1.0).abs() > 1e-9 {
        return Err(OptimizerError::ParameterGeneration(format!(
            "grid step {step} does not divide 1"
        )));
    }

    // 1. Convert the weight bounds into the list of admissible unit counts per class.
    let tolerance = settings.weight_tolerance;
    let levels: Vec<u32> = (0..=units)
        .filter(|k| {
            let w = *k as f64 / units as f64;
            w >= settings.min_weight - tolerance && w <= settings.max_weight + tolerance
        })
        .collect();
    let points = (levels.len() as u128).saturating_pow(asset_classes.len() as u32);
    if points > MAX_GRID_POINTS {
        return Err(OptimizerError::ParameterGeneration(format!(
            "{} classes at step {step} give {points} grid points, more than {MAX_GRID_POINTS}",
            asset_classes.len()
        )));
    }

    // 2. Use itertools::multi_cartesian_product to generate all combinations.
    let scenarios: Vec<AllocationScenario> = std::iter::repeat_n(levels, asset_classes.len())
        .multi_cartesian_product()
        .filter(|combo| combo.iter().sum::<u32>() == units)
        .map(|combo| {
            let weights: Weights = asset_classes
                .iter()
                .copied()
                .zip(combo.iter().map(|k| *k as f64 / units as f64))
                .collect();
            AllocationScenario {
                name: AllocationScenario::label(&weights),
                weights,
            }
        })
        .collect();

    tracing::debug!(count = scenarios.len(), step, "Generated candidate grid.");
    Ok(scenarios)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_classes_at_quarter_steps() {
        let settings = OptimizerSettings {
            grid_step: 0.25,
            ..OptimizerSettings::default()
        };
        let grid = generate_grid(&[AssetClass::Equity, AssetClass::FixedIncome], &settings).unwrap();
        assert_eq!(grid.len(), 5);
        assert!(grid.iter().all(|s| (s.total() - 1.0).abs() < 1e-12));
        assert!(grid.iter().any(|s| s.name == "equity:75/fixed_income:25"));
    }

    #[test]
    fn bounds_prune_the_grid() {
        let settings = OptimizerSettings {
            min_weight: 0.2,
            max_weight: 0.6,
            grid_step: 0.1,
            ..OptimizerSettings::default()
        };
        let classes = [AssetClass::Equity, AssetClass::FixedIncome, AssetClass::Cash];
        let grid = generate_grid(&classes, &settings).unwrap();
        assert!(!grid.is_empty());
        for s in &grid {
            assert!(classes.iter().all(|c| (0.2 - 1e-9..=0.6 + 1e-9).contains(&s.weight(*c))));
        }
    }

    #[test]
    fn step_must_divide_one() {
        let settings = OptimizerSettings {
            grid_step: 0.3,
            ..OptimizerSettings::default()
        };
        assert!(matches!(
            generate_grid(&[AssetClass::Equity], &settings),
            Err(OptimizerError::ParameterGeneration(_))
        ));
    }
}
