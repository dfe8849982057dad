// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

pub mod dataset;
pub mod diagnostics;
pub mod error;
pub mod execution_context;
pub mod feature;
pub mod matrix;
pub mod repro;

pub use dataset::{AttributeKind, Dataset, DatasetParts, Value};
pub use diagnostics::{DIAGNOSTICS_SCHEMA_VERSION, Diagnostics, EvaluationStats};
pub use error::McdaError;
pub use execution_context::{ExecutionContext, ProgressSink};
pub use feature::FeatureSubset;
pub use matrix::{DistanceMatrix, DistanceMatrixWire};
pub use repro::ReproMode;

/// Supported feature-subset sizes.
pub const SUPPORTED_K: [usize; 3] = [2, 4, 8];

/// Validates a requested feature count against [`SUPPORTED_K`] and the attribute count.
pub fn validate_k(k: usize, attribute_count: usize) -> Result<(), McdaError> {
    if !SUPPORTED_K.contains(&k) || k > attribute_count {
        return Err(McdaError::invalid_k(k, attribute_count));
    }
    Ok(())
}

/// Core shared types for mcda.
pub fn crate_name() -> &'static str {
    "mcda-core"
}
