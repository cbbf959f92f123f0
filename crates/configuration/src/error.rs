use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file or an environment override could not be read or deserialized.
    #[error("Failed to read engine configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    /// Values parsed fine but break a constraint (bounds, thresholds, percentiles).
    #[error("Invalid engine configuration: {0}")]
    ValidationError(String),

    #[error("Failed to initialize logging: {0}")]
    Logging(String),
}
