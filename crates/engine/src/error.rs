use analytics::AnalyticsError;
use correlation::CorrelationError;
use monte_carlo::MonteCarloError;
use optimizer::OptimizerError;
use position_store::StoreError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Position store error: {0}")]
    Store(#[from] StoreError),

    #[error("Metrics error: {0}")]
    Analytics(#[from] AnalyticsError),

    #[error("Correlation error: {0}")]
    Correlation(#[from] CorrelationError),

    #[error("Simulation error: {0}")]
    MonteCarlo(#[from] MonteCarloError),

    #[error("Optimizer error: {0}")]
    Optimizer(#[from] OptimizerError),

    #[error("The request was cancelled before it completed.")]
    Cancelled,

    #[error("The {0} request was superseded by a newer one and its result discarded.")]
    Superseded(&'static str),

    #[error("A background computation failed to complete: {0}")]
    Join(String),
}
