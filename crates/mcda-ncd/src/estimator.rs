// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use mcda_core::McdaError;

/// Information-content estimate of a byte string (a compressed-size proxy).
///
/// Implementations must be deterministic and should satisfy
/// `estimate(x ++ y) >= max(estimate(x), estimate(y))` for the NCD to be
/// meaningful; the matrix builder clamps results to `[0, 1]` regardless.
pub trait ComplexityEstimator: Send + Sync {
    fn name(&self) -> &'static str;

    fn estimate(&self, bytes: &[u8]) -> Result<usize, McdaError>;

    /// Estimate of the concatenation `x ++ y`.
    fn estimate_concat(&self, x: &[u8], y: &[u8]) -> Result<usize, McdaError> {
        let mut joined = Vec::with_capacity(x.len() + y.len());
        joined.extend_from_slice(x);
        joined.extend_from_slice(y);
        self.estimate(&joined)
    }
}

impl<E: ComplexityEstimator + ?Sized> ComplexityEstimator for Box<E> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn estimate(&self, bytes: &[u8]) -> Result<usize, McdaError> {
        (**self).estimate(bytes)
    }

    fn estimate_concat(&self, x: &[u8], y: &[u8]) -> Result<usize, McdaError> {
        (**self).estimate_concat(x, y)
    }
}

/// Raw byte length. Deterministic stand-in for a compressor in tests.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LengthEstimator;

impl ComplexityEstimator for LengthEstimator {
    fn name(&self) -> &'static str {
        "length"
    }

    fn estimate(&self, bytes: &[u8]) -> Result<usize, McdaError> {
        Ok(bytes.len())
    }

    fn estimate_concat(&self, x: &[u8], y: &[u8]) -> Result<usize, McdaError> {
        Ok(x.len() + y.len())
    }
}
