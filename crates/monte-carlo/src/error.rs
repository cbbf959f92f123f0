use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MonteCarloError {
    #[error("Invalid simulation configuration: {0}")]
    Configuration(String),

    #[error("Failed to build the return distribution: {0}")]
    Distribution(String),

    #[error("The simulation was cancelled.")]
    Cancelled,
}
