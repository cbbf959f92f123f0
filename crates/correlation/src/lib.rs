//! # Vantage Correlation
//!
//! Pairwise Pearson correlation of asset return series over a lookback window.
//!
//! Series are aligned by date before correlating, either on the dates shared by every
//! requested symbol (`AlignmentMode::Common`) or pair by pair (`AlignmentMode::Pairwise`).
//! Only the upper triangle is computed; rows run in parallel on the rayon pool.
//!
//! ## Public API
//!
//! - `CorrelationEngine`: computes a `CorrelationMatrix` from a store or from loaded series.
//! - `CorrelationMatrix`: symmetric result with undefined cells as `None`, convertible to a
//!   covariance matrix.
//! - `CorrelationError`: The specific error types that can be returned from this crate.

pub mod engine;
pub mod error;
pub mod matrix;

pub use engine::{CorrelationEngine, pearson};
pub use error::CorrelationError;
pub use matrix::CorrelationMatrix;
