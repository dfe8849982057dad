// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::estimator::ComplexityEstimator;
use flate2::Compression;
use flate2::write::ZlibEncoder;
use mcda_core::McdaError;
use std::io::Write;

const DEFAULT_LEVEL: u32 = 6;
const MAX_LEVEL: u32 = 9;

/// Complexity estimate as the zlib-compressed length.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ZlibEstimator {
    level: u32,
}

impl ZlibEstimator {
    pub fn new(level: u32) -> Result<Self, McdaError> {
        if level > MAX_LEVEL {
            return Err(McdaError::invalid_input(format!(
                "zlib level must be in 0..={MAX_LEVEL}; got {level}"
            )));
        }
        Ok(Self { level })
    }

    pub fn level(&self) -> u32 {
        self.level
    }
}

impl Default for ZlibEstimator {
    fn default() -> Self {
        Self {
            level: DEFAULT_LEVEL,
        }
    }
}

impl ComplexityEstimator for ZlibEstimator {
    fn name(&self) -> &'static str {
        "zlib"
    }

    fn estimate(&self, bytes: &[u8]) -> Result<usize, McdaError> {
        let mut encoder = ZlibEncoder::new(
            Vec::with_capacity(bytes.len() / 2 + 16),
            Compression::new(self.level),
        );
        encoder
            .write_all(bytes)
            .map_err(|err| McdaError::invalid_input(format!("zlib compression failed: {err}")))?;
        let compressed = encoder
            .finish()
            .map_err(|err| McdaError::invalid_input(format!("zlib compression failed: {err}")))?;
        Ok(compressed.len())
    }
}
