//! # Feature Engineering
//!
//! Turns a raw numeric table into the matrix consumed by the anomaly model.
//!
//! - `RatioEngine` derives technical indicator columns (price range, moving
//!   averages, RSI, volatility, ...) from whichever OHLCV columns are present.
//!   It is a pure function of its input: every undefined cell (warm-up rows of
//!   a rolling window, division by zero) comes out as `0`.
//! - `FeatureMatrixBuilder` picks raw and ratio columns according to
//!   `FeatureOptions` and stacks them side by side. Column order follows the
//!   option order, raw before ratio within a feature.

pub mod error;
pub mod matrix;
pub mod ratios;
pub mod rolling;
pub mod table;

pub use error::FeatureError;
pub use matrix::{ColumnSource, FeatureColumn, FeatureMatrix, FeatureMatrixBuilder};
pub use ratios::{RatioEngine, RatioWindows};
pub use table::{RatioTable, RawTable};
