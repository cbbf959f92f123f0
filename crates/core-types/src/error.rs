use chrono::NaiveDate;
use thiserror::Error;

/// Validation failures for malformed input data. These are fatal and are raised
/// before any computation starts.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Invalid input for {0}: {1}")]
    InvalidInput(String, String),

    #[error("Holding '{symbol}' has a negative share count ({shares}).")]
    NegativeShares { symbol: String, shares: String },

    #[error("Series '{symbol}' is not strictly increasing at {date}.")]
    NonMonotonicDates { symbol: String, date: NaiveDate },

    #[error("Series '{symbol}' has a non-positive or non-finite value ({value}) at {date}.")]
    InvalidValue {
        symbol: String,
        date: NaiveDate,
        value: f64,
    },

    #[error("Symbol '{0}' appears more than once.")]
    DuplicateSymbol(String),
}
