//! Descriptive statistics over plain `f64` slices.
//!
//! Functions that need a minimum sample size return `None` instead of a meaningless number.

use chrono::NaiveDate;
use core_types::ReturnSeries;
use std::collections::HashMap;

/// Below this magnitude a volatility, variance or drawdown is treated as zero.
pub const EPSILON: f64 = 1e-12;

pub fn mean(xs: &[f64]) -> Option<f64> {
    if xs.is_empty() {
        return None;
    }
    Some(xs.iter().sum::<f64>() / xs.len() as f64)
}

/// Unbiased (n − 1) sample variance. Requires at least two observations.
pub fn sample_variance(xs: &[f64]) -> Option<f64> {
    if xs.len() < 2 {
        return None;
    }
    let m = mean(xs)?;
    let ss: f64 = xs.iter().map(|x| (x - m) * (x - m)).sum();
    Some(ss / (xs.len() - 1) as f64)
}

pub fn sample_std(xs: &[f64]) -> Option<f64> {
    sample_variance(xs).map(f64::sqrt)
}

/// Unbiased sample covariance of two equally long series.
pub fn sample_covariance(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }
    let mx = mean(xs)?;
    let my = mean(ys)?;
    let s: f64 = xs.iter().zip(ys).map(|(x, y)| (x - mx) * (y - my)).sum();
    Some(s / (xs.len() - 1) as f64)
}

/// Root mean square of the shortfalls below `target`, taken over all observations.
pub fn downside_deviation(xs: &[f64], target: f64) -> Option<f64> {
    if xs.is_empty() {
        return None;
    }
    let ss: f64 = xs
        .iter()
        .map(|x| (x - target).min(0.0))
        .map(|d| d * d)
        .sum();
    Some((ss / xs.len() as f64).sqrt())
}

/// Compounds a mean periodic return to a yearly rate.
pub fn annualize_mean(periodic_mean: f64, periods_per_year: f64) -> f64 {
    (1.0 + periodic_mean).powf(periods_per_year) - 1.0
}

fn sorted(xs: &[f64]) -> Vec<f64> {
    let mut v = xs.to_vec();
    v.sort_by(f64::total_cmp);
    v
}

/// Nearest-rank percentile: the smallest observation with at least `p` of the sample at or below it.
/// `p` is a fraction in (0, 1].
pub fn percentile_nearest_rank(xs: &[f64], p: f64) -> Option<f64> {
    if xs.is_empty() || !(p > 0.0 && p <= 1.0) {
        return None;
    }
    let v = sorted(xs);
    // Absorbs representation error such as (1.0 - 0.95) * 20.0 = 1.0000000000000009.
    let rank = (p * v.len() as f64 - 1e-9).ceil() as usize;
    Some(v[rank.clamp(1, v.len()) - 1])
}

/// Percentile with linear interpolation between closest ranks, on an already sorted slice.
/// `pct` is in percent, 0..=100.
pub fn percentile_linear_sorted(sorted: &[f64], pct: f64) -> Option<f64> {
    if sorted.is_empty() || !(0.0..=100.0).contains(&pct) {
        return None;
    }
    let pos = pct / 100.0 * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Historical value at risk at `confidence` (e.g. 0.95) as a pair of raw return levels:
/// the loss quantile and the mean of all returns at or below it (expected shortfall).
///
/// The tail always contains the quantile itself, so the shortfall never exceeds it.
pub fn historical_var(returns: &[f64], confidence: f64) -> Option<(f64, f64)> {
    let quantile = percentile_nearest_rank(returns, 1.0 - confidence)?;
    let tail: Vec<f64> = returns.iter().copied().filter(|r| *r <= quantile).collect();
    let shortfall = mean(&tail)?;
    Some((quantile, shortfall))
}

/// Largest peak-to-trough decline of a value series, as a non-positive fraction.
pub fn max_drawdown(values: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut worst = 0.0_f64;
    for &v in values {
        if v > peak {
            peak = v;
        }
        if peak > 0.0 {
            worst = worst.min(v / peak - 1.0);
        }
    }
    worst
}

/// `num / den`, or `None` when the denominator is numerically zero.
pub fn ratio(num: f64, den: f64) -> Option<f64> {
    if den.abs() <= EPSILON || !num.is_finite() {
        None
    } else {
        Some(num / den)
    }
}

/// Return series cut to their common dates, one column per input series.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedReturns {
    pub dates: Vec<NaiveDate>,
    pub columns: Vec<Vec<f64>>,
}

impl AlignedReturns {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Row-major view: one vector of per-series returns per date.
    pub fn rows(&self) -> Vec<Vec<f64>> {
        (0..self.dates.len())
            .map(|t| self.columns.iter().map(|c| c[t]).collect())
            .collect()
    }
}

/// Intersects the dates of all series and returns their values on those dates.
pub fn align_by_date(series: &[&ReturnSeries]) -> AlignedReturns {
    let Some(first) = series.first() else {
        return AlignedReturns { dates: Vec::new(), columns: Vec::new() };
    };
    let lookups: Vec<HashMap<NaiveDate, f64>> = series
        .iter()
        .map(|s| s.points().iter().map(|p| (p.date, p.value)).collect())
        .collect();

    // Dates of the first series are already strictly increasing.
    let dates: Vec<NaiveDate> = first
        .points()
        .iter()
        .map(|p| p.date)
        .filter(|d| lookups.iter().all(|l| l.contains_key(d)))
        .collect();

    let columns = lookups
        .iter()
        .map(|l| dates.iter().map(|d| l[d]).collect())
        .collect();

    AlignedReturns { dates, columns }
}
