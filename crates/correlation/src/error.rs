use position_store::StoreError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CorrelationError {
    #[error("Symbol '{0}' was requested more than once.")]
    DuplicateSymbol(String),

    #[error("Expected {expected} volatilities, got {actual}.")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Correlation between '{0}' and '{1}' is undefined; a covariance cannot be built from it.")]
    UndefinedCell(String, String),

    #[error("Invalid volatility {value} for '{symbol}'.")]
    InvalidVolatility { symbol: String, value: f64 },

    #[error("Failed to read return series: {0}")]
    Store(#[from] StoreError),

    #[error("The correlation computation was cancelled.")]
    Cancelled,
}
