use crate::error::CorrelationError;
use analytics::linalg::Matrix;
use serde::{Deserialize, Serialize};

/// A symmetric matrix of pairwise Pearson correlations.
///
/// The diagonal is exactly `1.0`. An off-diagonal cell is `None` when the pair had too
/// few overlapping observations or one of the series never moved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    symbols: Vec<String>,
    cells: Vec<Vec<Option<f64>>>,
    /// Number of aligned return observations behind each cell.
    observations: Vec<Vec<usize>>,
}

impl CorrelationMatrix {
    pub(crate) fn from_parts(
        symbols: Vec<String>,
        cells: Vec<Vec<Option<f64>>>,
        observations: Vec<Vec<usize>>,
    ) -> Self {
        Self { symbols, cells, observations }
    }

    pub fn empty() -> Self {
        Self::from_parts(Vec::new(), Vec::new(), Vec::new())
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn index_of(&self, symbol: &str) -> Option<usize> {
        self.symbols.iter().position(|s| s == symbol)
    }

    /// Correlation of two symbols; `None` when either is unknown or the cell is undefined.
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        self.get_index(self.index_of(a)?, self.index_of(b)?)
    }

    pub fn get_index(&self, i: usize, j: usize) -> Option<f64> {
        self.cells.get(i)?.get(j).copied().flatten()
    }

    pub fn observations(&self, i: usize, j: usize) -> Option<usize> {
        self.observations.get(i)?.get(j).copied()
    }

    pub fn cells(&self) -> &[Vec<Option<f64>>] {
        &self.cells
    }

    pub fn is_symmetric(&self) -> bool {
        let n = self.len();
        (0..n).all(|i| (0..n).all(|j| self.cells[i][j] == self.cells[j][i]))
    }

    /// Symbol pairs (upper triangle) whose correlation is undefined.
    pub fn undefined_pairs(&self) -> Vec<(String, String)> {
        let n = self.len();
        let mut pairs = Vec::new();
        for i in 0..n {
            for j in (i + 1)..n {
                if self.cells[i][j].is_none() {
                    pairs.push((self.symbols[i].clone(), self.symbols[j].clone()));
                }
            }
        }
        pairs
    }

    /// Builds `Σᵢⱼ = ρᵢⱼ σᵢ σⱼ` from annualized volatilities in symbol order.
    ///
    /// An undefined cell is accepted only when one of the two volatilities is zero, since the
    /// covariance is then zero whatever the correlation.
    pub fn to_covariance(&self, volatilities: &[f64]) -> Result<Matrix, CorrelationError> {
        let n = self.len();
        if volatilities.len() != n {
            return Err(CorrelationError::DimensionMismatch {
                expected: n,
                actual: volatilities.len(),
            });
        }
        if let Some((i, &v)) = volatilities
            .iter()
            .enumerate()
            .find(|(_, v)| !v.is_finite() || **v < 0.0)
        {
            return Err(CorrelationError::InvalidVolatility {
                symbol: self.symbols[i].clone(),
                value: v,
            });
        }

        let mut cov = vec![vec![0.0; n]; n];
        for i in 0..n {
            for j in 0..n {
                let scale = volatilities[i] * volatilities[j];
                cov[i][j] = match self.cells[i][j] {
                    Some(rho) => rho * scale,
                    None if scale == 0.0 => 0.0,
                    None => {
                        return Err(CorrelationError::UndefinedCell(
                            self.symbols[i].clone(),
                            self.symbols[j].clone(),
                        ));
                    }
                };
            }
        }
        Ok(cov)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_by_two(rho: Option<f64>) -> CorrelationMatrix {
        CorrelationMatrix::from_parts(
            vec!["A".to_string(), "B".to_string()],
            vec![vec![Some(1.0), rho], vec![rho, Some(1.0)]],
            vec![vec![10, 10], vec![10, 10]],
        )
    }

    #[test]
    fn covariance_scales_by_volatilities() {
        let cov = two_by_two(Some(0.5)).to_covariance(&[0.2, 0.1]).unwrap();
        assert!((cov[0][0] - 0.04).abs() < 1e-15);
        assert!((cov[0][1] - 0.01).abs() < 1e-15);
        assert_eq!(cov[0][1], cov[1][0]);
    }

    #[test]
    fn undefined_cell_needs_a_flat_leg() {
        let m = two_by_two(None);
        assert_eq!(
            m.to_covariance(&[0.2, 0.1]),
            Err(CorrelationError::UndefinedCell("A".to_string(), "B".to_string()))
        );
        let cov = m.to_covariance(&[0.2, 0.0]).unwrap();
        assert_eq!(cov[0][1], 0.0);
        assert_eq!(m.undefined_pairs(), vec![("A".to_string(), "B".to_string())]);
    }

    #[test]
    fn lookup_by_symbol() {
        let m = two_by_two(Some(-0.3));
        assert_eq!(m.get("B", "A"), Some(-0.3));
        assert_eq!(m.get("A", "C"), None);
        assert!(matches!(
            m.to_covariance(&[0.1]),
            Err(CorrelationError::DimensionMismatch { expected: 2, actual: 1 })
        ));
    }
}
