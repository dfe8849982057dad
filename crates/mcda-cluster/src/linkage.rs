// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use mcda_core::McdaError;
use std::fmt;
use std::str::FromStr;

/// Inter-cluster distance rule, applied through Lance–Williams updates.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Linkage {
    /// Nearest member pair.
    Single,
    /// Farthest member pair.
    Complete,
    /// Mean over member pairs (UPGMA).
    #[default]
    Average,
    /// Mean of the two merged clusters' distances (WPGMA).
    Weighted,
}

impl Linkage {
    pub const ALL: [Linkage; 4] = [
        Linkage::Single,
        Linkage::Complete,
        Linkage::Average,
        Linkage::Weighted,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Complete => "complete",
            Self::Average => "average",
            Self::Weighted => "weighted",
        }
    }

    /// Distance from the union of clusters `a` and `b` to a third cluster.
    pub fn update(self, d_ak: f64, d_bk: f64, size_a: usize, size_b: usize) -> f64 {
        match self {
            Self::Single => d_ak.min(d_bk),
            Self::Complete => d_ak.max(d_bk),
            Self::Average => {
                let na = size_a as f64;
                let nb = size_b as f64;
                (na * d_ak + nb * d_bk) / (na + nb)
            }
            Self::Weighted => 0.5 * (d_ak + d_bk),
        }
    }
}

impl fmt::Display for Linkage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Linkage {
    type Err = McdaError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "single" => Ok(Self::Single),
            "complete" => Ok(Self::Complete),
            "average" | "upgma" => Ok(Self::Average),
            "weighted" | "wpgma" => Ok(Self::Weighted),
            other => Err(McdaError::invalid_input(format!(
                "unknown linkage '{other}'; expected one of single, complete, average, weighted"
            ))),
        }
    }
}
