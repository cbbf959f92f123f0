use crate::error::CorrelationError;
use crate::matrix::CorrelationMatrix;
use analytics::stats::{self, EPSILON};
use configuration::{AlignmentMode, CorrelationSettings};
use core_types::{DateWindow, ReturnSeries};
use position_store::PositionStore;
use rayon::prelude::*;
use std::collections::HashSet;
use tokio_util::sync::CancellationToken;

/// A return series reduced to what Pearson needs: its deviations from the mean and their norm.
struct Centered {
    deviations: Vec<f64>,
    norm: f64,
}

impl Centered {
    fn new(xs: &[f64]) -> Self {
        let mean = stats::mean(xs).unwrap_or(0.0);
        let deviations: Vec<f64> = xs.iter().map(|x| x - mean).collect();
        let norm = deviations.iter().map(|d| d * d).sum::<f64>().sqrt();
        Self { deviations, norm }
    }

    fn correlate(&self, other: &Centered) -> Option<f64> {
        if self.norm <= EPSILON || other.norm <= EPSILON {
            return None;
        }
        let rho = analytics::linalg::dot(&self.deviations, &other.deviations) / (self.norm * other.norm);
        Some(rho.clamp(-1.0, 1.0))
    }
}

/// Pearson correlation of two equally long samples, or `None` if either has no variance.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }
    Centered::new(xs).correlate(&Centered::new(ys))
}

type Row = Vec<(Option<f64>, usize)>;

/// Computes correlation matrices over aligned return series.
#[derive(Debug, Clone, Default)]
pub struct CorrelationEngine {
    settings: CorrelationSettings,
}

impl CorrelationEngine {
    pub fn new(settings: CorrelationSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &CorrelationSettings {
        &self.settings
    }

    /// Reads each symbol's return series from the store and correlates them.
    #[tracing::instrument(name = "compute_correlation", skip_all, fields(n = symbols.len()))]
    pub fn compute_correlation(
        &self,
        store: &dyn PositionStore,
        symbols: &[String],
        window: &DateWindow,
        cancel: Option<&CancellationToken>,
    ) -> Result<CorrelationMatrix, CorrelationError> {
        check_unique(symbols.iter().map(String::as_str))?;
        let series = symbols
            .iter()
            .map(|symbol| store.get_return_series(symbol, window))
            .collect::<Result<Vec<_>, _>>()?;
        self.from_series(&series, cancel)
    }

    /// Correlates already loaded return series. Matrix order follows `series`.
    pub fn from_series(
        &self,
        series: &[ReturnSeries],
        cancel: Option<&CancellationToken>,
    ) -> Result<CorrelationMatrix, CorrelationError> {
        check_unique(series.iter().map(ReturnSeries::symbol))?;
        if series.is_empty() {
            return Ok(CorrelationMatrix::empty());
        }
        let min_overlap = self.settings.min_overlap.max(2);

        let upper = match self.settings.alignment {
            AlignmentMode::Common => upper_triangle_common(series, min_overlap, cancel),
            AlignmentMode::Pairwise => upper_triangle_pairwise(series, min_overlap, cancel),
        }
        .ok_or(CorrelationError::Cancelled)?;

        let matrix = mirror(series, upper);
        let undefined = matrix.undefined_pairs();
        if !undefined.is_empty() {
            tracing::warn!(count = undefined.len(), pairs = ?undefined, "Some correlations are undefined.");
        }
        tracing::debug!(symbols = matrix.len(), mode = ?self.settings.alignment, "Correlation matrix computed.");
        Ok(matrix)
    }
}

fn check_unique<'a>(symbols: impl Iterator<Item = &'a str>) -> Result<(), CorrelationError> {
    let mut seen = HashSet::new();
    for symbol in symbols {
        if !seen.insert(symbol) {
            return Err(CorrelationError::DuplicateSymbol(symbol.to_string()));
        }
    }
    Ok(())
}

fn is_cancelled(cancel: Option<&CancellationToken>) -> bool {
    cancel.is_some_and(CancellationToken::is_cancelled)
}

/// Every series cut to the dates they all share; per-symbol statistics computed once.
/// Row `i` holds cells `j > i`. `None` means the computation was cancelled.
fn upper_triangle_common(
    series: &[ReturnSeries],
    min_overlap: usize,
    cancel: Option<&CancellationToken>,
) -> Option<Vec<Row>> {
    let refs: Vec<&ReturnSeries> = series.iter().collect();
    let aligned = stats::align_by_date(&refs);
    let overlap = aligned.len();
    let centered: Vec<Centered> = aligned.columns.iter().map(|c| Centered::new(c)).collect();

    (0..series.len())
        .into_par_iter()
        .map(|i| {
            if is_cancelled(cancel) {
                return None;
            }
            let row = ((i + 1)..series.len())
                .map(|j| {
                    let rho = if overlap < min_overlap {
                        None
                    } else {
                        centered[i].correlate(&centered[j])
                    };
                    (rho, overlap)
                })
                .collect();
            Some(row)
        })
        .collect()
}

fn upper_triangle_pairwise(
    series: &[ReturnSeries],
    min_overlap: usize,
    cancel: Option<&CancellationToken>,
) -> Option<Vec<Row>> {
    (0..series.len())
        .into_par_iter()
        .map(|i| {
            if is_cancelled(cancel) {
                return None;
            }
            let row = ((i + 1)..series.len())
                .map(|j| {
                    let aligned = stats::align_by_date(&[&series[i], &series[j]]);
                    let rho = if aligned.len() < min_overlap {
                        None
                    } else {
                        pearson(&aligned.columns[0], &aligned.columns[1])
                    };
                    (rho, aligned.len())
                })
                .collect();
            Some(row)
        })
        .collect()
}

fn mirror(series: &[ReturnSeries], upper: Vec<Row>) -> CorrelationMatrix {
    let n = series.len();
    let mut cells = vec![vec![None; n]; n];
    let mut observations = vec![vec![0; n]; n];
    for (i, row) in upper.into_iter().enumerate() {
        cells[i][i] = Some(1.0);
        observations[i][i] = series[i].len();
        for (offset, (rho, count)) in row.into_iter().enumerate() {
            let j = i + 1 + offset;
            cells[i][j] = rho;
            cells[j][i] = rho;
            observations[i][j] = count;
            observations[j][i] = count;
        }
    }
    let symbols = series.iter().map(|s| s.symbol().to_string()).collect();
    CorrelationMatrix::from_parts(symbols, cells, observations)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pearson_of_linear_relations() {
        let xs = [0.01, -0.02, 0.03, 0.005, -0.01];
        let ys: Vec<f64> = xs.iter().map(|x| 3.0 * x + 0.1).collect();
        let zs: Vec<f64> = xs.iter().map(|x| -x).collect();
        assert!((pearson(&xs, &ys).unwrap() - 1.0).abs() < 1e-12);
        assert!((pearson(&xs, &zs).unwrap() + 1.0).abs() < 1e-12);
        assert_eq!(pearson(&xs, &[0.0; 5]), None);
        assert_eq!(pearson(&xs[..1], &ys[..1]), None);
    }
}
