use crate::error::ConfigError;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod logging;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use logging::init_logging;
pub use settings::{
    AlignmentMode, Config, CorrelationSettings, LocalSearchSettings, LogFormat, LoggingSettings,
    MetricsSettings, OptimizerSettings, RiskProfiles, SimulationSettings,
};

/// Environment variables prefixed with this (e.g. `VANTAGE__SIMULATION__DEFAULT_SEED`)
/// override values from the file.
pub const ENV_PREFIX: &str = "VANTAGE";

/// Loads the engine configuration from `config.toml` in the working directory.
///
/// The file is optional: defaults apply to anything it does not set.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from("config.toml")
}

/// Loads and validates the configuration from an explicit file path, layering
/// `VANTAGE__*` environment variables on top.
pub fn load_config_from(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let builder = config::Config::builder()
        .add_source(config::File::from(path).required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    // Attempt to deserialize the entire configuration into our `Config` struct
    let config = builder.try_deserialize::<Config>()?;
    config.validate()?;

    tracing::debug!(path = %path.display(), "Configuration loaded.");
    Ok(config)
}
