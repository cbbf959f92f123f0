//! # Vantage Core Types
//!
//! The shared vocabulary of the analytics engine: holdings, portfolio snapshots,
//! dated price and return series, and the enums used to tag them.
//!
//! As a Layer 0 crate it depends on no other workspace crate. Every constructor
//! validates its input, so downstream calculators can assume well-formed data.

pub mod enums;
pub mod error;
pub mod series;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use enums::{AssetClass, RiskProfile, SamplingFrequency};
pub use error::CoreError;
pub use series::{DateWindow, DatedValue, PriceSeries, ReturnSeries};
pub use structs::{Holding, PortfolioSnapshot};
