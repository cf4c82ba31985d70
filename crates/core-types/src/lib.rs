//! # Core Types
//!
//! Shared vocabulary for the anomaly detection pipeline. This crate sits at the
//! bottom of the workspace and depends on nothing but `serde` and `thiserror`.

pub mod enums;
pub mod error;
pub mod options;

// Re-export the core types to provide a clean public API.
pub use enums::Phase;
pub use error::CoreError;
pub use options::{FeatureOptions, FeatureSelection};
