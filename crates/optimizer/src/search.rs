use crate::error::OptimizerError;
use crate::evaluate::{evaluate_vector, weight_vector};
use crate::inputs::OptimizerInputs;
use crate::ranking::compare;
use crate::scenario::{EvaluatedScenario, LocalSearchOutcome};
use analytics::stats::EPSILON;
use configuration::OptimizerSettings;
use rayon::prelude::*;
use tokio_util::sync::CancellationToken;

fn score(e: &EvaluatedScenario) -> f64 {
    e.sharpe_ratio.unwrap_or(f64::NEG_INFINITY)
}

/// Every weight vector reachable by moving up to `step` from class `i` to class `j`
/// without leaving the bounds.
fn neighbours(w: &[f64], step: f64, settings: &OptimizerSettings) -> Vec<Vec<f64>> {
    let n = w.len();
    let mut moves = Vec::with_capacity(n * n.saturating_sub(1));
    for i in 0..n {
        for j in 0..n {
            if i == j {
                continue;
            }
            let shift = step
                .min(w[i] - settings.min_weight)
                .min(settings.max_weight - w[j]);
            if shift <= EPSILON {
                continue;
            }
            let mut next = w.to_vec();
            next[i] -= shift;
            next[j] += shift;
            // Re-normalize so rounding never lets Σw drift away from 1.
            let total: f64 = next.iter().sum();
            next.iter_mut().for_each(|x| *x /= total);
            moves.push(next);
        }
    }
    moves
}

/// Pairwise weight-shift hill climbing from `start`.
///
/// Each iteration evaluates every neighbour at the current step and moves to the best one
/// that stays under `max_volatility` and beats the current Sharpe by more than the tolerance;
/// otherwise the step is halved. The search has converged once the step drops below
/// `min_step`. Running out of iterations first is reported through `converged`, not an error.
#[tracing::instrument(name = "local_search", skip_all, fields(start = %start.name()))]
pub fn local_search(
    start: &EvaluatedScenario,
    inputs: &OptimizerInputs,
    settings: &OptimizerSettings,
    max_volatility: f64,
    cancel: Option<&CancellationToken>,
) -> Result<LocalSearchOutcome, OptimizerError> {
    let tuning = &settings.local_search;
    let name = format!("{} (optimized)", start.name());

    let mut w = weight_vector(&start.scenario, inputs);
    let mut best = evaluate_vector(name.clone(), &w, inputs);
    let mut step = tuning.initial_step;
    let mut iterations = 0;

    while step >= tuning.min_step {
        if iterations == tuning.max_iterations {
            break;
        }
        if cancel.is_some_and(CancellationToken::is_cancelled) {
            return Err(OptimizerError::Cancelled);
        }
        iterations += 1;

        let candidate = neighbours(&w, step, settings)
            .into_par_iter()
            .map(|next| {
                let evaluated = evaluate_vector(name.clone(), &next, inputs);
                (next, evaluated)
            })
            .filter(|(_, e)| e.volatility <= max_volatility + EPSILON)
            .min_by(|(_, a), (_, b)| compare(a, b));

        match candidate {
            Some((next, evaluated)) if score(&evaluated) > score(&best) + tuning.tolerance => {
                tracing::trace!(step, sharpe = ?evaluated.sharpe_ratio, "Accepted move.");
                w = next;
                best = evaluated;
            }
            _ => step /= 2.0,
        }
    }

    let converged = step < tuning.min_step;
    if !converged {
        tracing::warn!(
            iterations,
            step,
            "Local search exhausted its iteration budget before converging."
        );
    }
    tracing::debug!(iterations, converged, sharpe = ?best.sharpe_ratio, "Local search finished.");

    Ok(LocalSearchOutcome {
        started_from: start.name().to_string(),
        scenario: best,
        iterations,
        final_step: step,
        converged,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neighbours_respect_bounds_and_sum() {
        let settings = OptimizerSettings {
            min_weight: 0.1,
            max_weight: 0.8,
            ..OptimizerSettings::default()
        };
        let moves = neighbours(&[0.12, 0.78, 0.1], 0.05, &settings);
        for m in &moves {
            assert!((m.iter().sum::<f64>() - 1.0).abs() < 1e-12);
            assert!(m.iter().all(|w| *w >= 0.1 - 1e-12 && *w <= 0.8 + 1e-12));
        }
        // Class 0 can give only 0.02; class 2 sits on the floor and gives nothing.
        assert!(moves.iter().any(|m| (m[1] - 0.8).abs() < 1e-12));
        assert_eq!(moves.len(), 4);
    }
}
