//! # Vantage Position Store
//!
//! Holds the current holdings, their sector and asset-class tags, and the historical
//! price series per instrument. It is the only source of portfolio data for the
//! analytics engine.
//!
//! ## Public API
//!
//! - `PositionStore`, `BenchmarkDataProvider`, `RiskFreeRateProvider`: the traits the
//!   engine consumes. Any backing store (database, broker feed) plugs in here.
//! - `InMemoryPositionStore`: a validated, thread-safe implementation.
//! - `StaticBenchmark`, `FixedRate`, `RateSchedule`: simple provider implementations.
//! - `StoreError`: the specific error types that can be returned from this crate.

pub mod error;
pub mod memory;
pub mod providers;
pub mod traits;

pub use error::StoreError;
pub use memory::{InMemoryPositionStore, NAV_SYMBOL};
pub use providers::{FixedRate, RateSchedule, StaticBenchmark};
pub use traits::{BenchmarkDataProvider, PositionStore, RiskFreeRateProvider};
