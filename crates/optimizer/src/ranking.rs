use crate::scenario::{EvaluatedScenario, ExcludedScenario, RankedScenario};
use analytics::stats::EPSILON;
use std::cmp::Ordering;

/// Sharpe ratios are compared on a grid of this step, so rounding noise counts as a tie.
pub const SHARPE_TIE: f64 = 1e-12;

fn sharpe_key(sharpe: f64) -> f64 {
    (sharpe / SHARPE_TIE).round()
}

/// Descending Sharpe; ties go to the lower volatility; an undefined Sharpe sorts last.
///
/// Orders by the key `(sharpe on the tie grid, volatility)`, which keeps it a total order.
pub fn compare(a: &EvaluatedScenario, b: &EvaluatedScenario) -> Ordering {
    match (a.sharpe_ratio, b.sharpe_ratio) {
        (Some(x), Some(y)) => sharpe_key(y).total_cmp(&sharpe_key(x)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| a.volatility.total_cmp(&b.volatility))
}

/// Applies the hard volatility filter. Scenarios are never adjusted to fit.
pub fn filter_by_volatility(
    evaluated: Vec<EvaluatedScenario>,
    max_volatility: f64,
) -> (Vec<EvaluatedScenario>, Vec<ExcludedScenario>) {
    let (admitted, rejected): (Vec<_>, Vec<_>) = evaluated
        .into_iter()
        .partition(|e| e.volatility <= max_volatility + EPSILON);

    let excluded = rejected
        .into_iter()
        .map(|e| ExcludedScenario {
            name: e.scenario.name,
            volatility: e.volatility,
            max_volatility,
        })
        .collect();
    (admitted, excluded)
}

/// Sorts admitted scenarios and assigns ranks starting at 1.
pub fn rank(mut admitted: Vec<EvaluatedScenario>) -> Vec<RankedScenario> {
    admitted.sort_by(compare);
    admitted
        .into_iter()
        .enumerate()
        .map(|(i, evaluated)| RankedScenario { rank: i + 1, evaluated })
        .collect()
}
