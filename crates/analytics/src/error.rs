use core_types::CoreError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalyticsError {
    #[error("Not enough data to perform calculation: {0}")]
    DataInsufficient(String),

    #[error("Invalid input rejected before calculation: {0}")]
    Validation(#[from] CoreError),

    #[error("Error in calculation: {0}")]
    Calculation(String),
}
