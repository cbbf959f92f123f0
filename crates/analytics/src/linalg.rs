//! A minimal dense linear-algebra helper over plain arrays.
//!
//! Matrices are row-major `Vec<Vec<f64>>`. The engine only ever needs small
//! asset-class sized systems, so nothing here is blocked or vectorized.

pub type Matrix = Vec<Vec<f64>>;

pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

pub fn mat_vec(m: &[Vec<f64>], v: &[f64]) -> Vec<f64> {
    m.iter().map(|row| dot(row, v)).collect()
}

/// `wᵗ M w`.
pub fn quadratic_form(w: &[f64], m: &[Vec<f64>]) -> f64 {
    dot(w, &mat_vec(m, w))
}

pub fn identity(n: usize) -> Matrix {
    (0..n)
        .map(|i| (0..n).map(|j| if i == j { 1.0 } else { 0.0 }).collect())
        .collect()
}

pub fn is_square(m: &[Vec<f64>]) -> bool {
    m.iter().all(|row| row.len() == m.len())
}

pub fn is_symmetric(m: &[Vec<f64>], tolerance: f64) -> bool {
    is_square(m)
        && (0..m.len()).all(|i| (0..i).all(|j| (m[i][j] - m[j][i]).abs() <= tolerance))
}

/// `Σᵢⱼ = ρᵢⱼ σᵢ σⱼ`.
pub fn covariance_from_correlation(correlation: &[Vec<f64>], volatilities: &[f64]) -> Matrix {
    correlation
        .iter()
        .enumerate()
        .map(|(i, row)| {
            row.iter()
                .enumerate()
                .map(|(j, rho)| rho * volatilities[i] * volatilities[j])
                .collect()
        })
        .collect()
}
