use crate::error::OptimizerError;
use analytics::linalg::{self, Matrix};
use core_types::AssetClass;
use correlation::CorrelationMatrix;

/// Market assumptions every candidate is evaluated against, in a fixed asset-class order.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizerInputs {
    asset_classes: Vec<AssetClass>,
    expected_returns: Vec<f64>,
    volatilities: Vec<f64>,
    covariance: Matrix,
    /// Aligned periodic class returns, one row per period in `asset_classes` order.
    history: Option<Vec<Vec<f64>>>,
    risk_free_rate: f64,
}

impl OptimizerInputs {
    /// Builds the inputs and the covariance `ρσσᵗ`.
    ///
    /// The correlation matrix must be ordered like `asset_classes`, with each class
    /// under its `as_str()` name.
    pub fn new(
        asset_classes: Vec<AssetClass>,
        expected_returns: Vec<f64>,
        volatilities: Vec<f64>,
        correlation: &CorrelationMatrix,
        risk_free_rate: f64,
    ) -> Result<Self, OptimizerError> {
        let n = asset_classes.len();
        if n == 0 {
            return Err(OptimizerError::DataInsufficient(
                "at least one asset class is required".to_string(),
            ));
        }
        if expected_returns.len() != n || volatilities.len() != n {
            return Err(OptimizerError::DataInsufficient(format!(
                "{} asset classes but {} expected returns and {} volatilities",
                n,
                expected_returns.len(),
                volatilities.len()
            )));
        }
        let names: Vec<&str> = asset_classes.iter().map(AssetClass::as_str).collect();
        if correlation.symbols() != names.as_slice() {
            return Err(OptimizerError::DataInsufficient(format!(
                "correlation matrix covers {:?}, expected {:?}",
                correlation.symbols(),
                names
            )));
        }
        if let Some(r) = expected_returns.iter().find(|r| !r.is_finite()) {
            return Err(OptimizerError::DataInsufficient(format!(
                "expected return {r} is not finite"
            )));
        }
        if !risk_free_rate.is_finite() {
            return Err(OptimizerError::Configuration(format!(
                "risk-free rate {risk_free_rate} is not finite"
            )));
        }
        let covariance = correlation.to_covariance(&volatilities)?;

        Ok(Self {
            asset_classes,
            expected_returns,
            volatilities,
            covariance,
            history: None,
            risk_free_rate,
        })
    }

    /// Attaches aligned historical class returns for drawdown estimation.
    pub fn with_history(mut self, rows: Vec<Vec<f64>>) -> Result<Self, OptimizerError> {
        let n = self.asset_classes.len();
        if let Some(row) = rows.iter().find(|row| row.len() != n) {
            return Err(OptimizerError::DataInsufficient(format!(
                "history row has {} columns, expected {}",
                row.len(),
                n
            )));
        }
        self.history = if rows.is_empty() { None } else { Some(rows) };
        Ok(self)
    }

    pub fn asset_classes(&self) -> &[AssetClass] {
        &self.asset_classes
    }

    pub fn len(&self) -> usize {
        self.asset_classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.asset_classes.is_empty()
    }

    pub fn index_of(&self, class: AssetClass) -> Option<usize> {
        self.asset_classes.iter().position(|c| *c == class)
    }

    pub fn expected_returns(&self) -> &[f64] {
        &self.expected_returns
    }

    pub fn volatilities(&self) -> &[f64] {
        &self.volatilities
    }

    pub fn covariance(&self) -> &Matrix {
        &self.covariance
    }

    pub fn history(&self) -> Option<&[Vec<f64>]> {
        self.history.as_deref()
    }

    pub fn risk_free_rate(&self) -> f64 {
        self.risk_free_rate
    }

    pub(crate) fn portfolio_variance(&self, weights: &[f64]) -> f64 {
        linalg::quadratic_form(weights, &self.covariance)
    }
}
