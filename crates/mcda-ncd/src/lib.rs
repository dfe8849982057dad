// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

pub mod estimator;
pub mod ncd;
pub mod serialize;
pub mod zlib;

pub use estimator::{ComplexityEstimator, LengthEstimator};
pub use ncd::{
    AttributeNcdResult, ConcatOrder, NcdConfig, NcdMatrixBuilder, NcdResult,
    build_distance_matrix, normalized_compression_distance,
};
pub use serialize::{serialize_numeric_column, serialize_record, serialize_records};
pub use zlib::ZlibEstimator;

/// Complexity estimators and NCD matrices for mcda.
pub fn crate_name() -> &'static str {
    "mcda-ncd"
}

#[cfg(test)]
mod tests {
    #[test]
    fn crate_name_matches() {
        assert_eq!(super::crate_name(), "mcda-ncd");
    }
}
