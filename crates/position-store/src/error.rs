use chrono::NaiveDate;
use core_types::CoreError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Invalid input rejected by the store: {0}")]
    Invalid(#[from] CoreError),

    #[error("Symbol '{0}' is not known to the store.")]
    UnknownSymbol(String),

    #[error("No price history is stored for held symbol '{0}'.")]
    MissingHistory(String),

    #[error("No data available: {0}")]
    NoData(String),

    #[error("No risk-free rate is effective on or before {0}.")]
    NoRate(NaiveDate),

    #[error("The store lock was poisoned by a panicking writer.")]
    LockPoisoned,
}
