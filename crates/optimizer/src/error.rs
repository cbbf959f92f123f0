use analytics::AnalyticsError;
use correlation::CorrelationError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum OptimizerError {
    #[error("Scenario '{scenario}' has invalid weights: {reason}")]
    InvalidWeights { scenario: String, reason: String },

    #[error("Not enough data to evaluate scenarios: {0}")]
    DataInsufficient(String),

    #[error("Invalid optimizer configuration: {0}")]
    Configuration(String),

    #[error("Candidate grid generation failed: {0}")]
    ParameterGeneration(String),

    #[error("Correlation error: {0}")]
    Correlation(#[from] CorrelationError),

    #[error("Analytics error: {0}")]
    Analytics(#[from] AnalyticsError),

    #[error("The optimization was cancelled.")]
    Cancelled,
}
