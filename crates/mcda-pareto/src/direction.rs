// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use mcda_core::{FeatureSubset, McdaError};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Optimization sense of one objective.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Maximize,
    Minimize,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Maximize => "maximize",
            Self::Minimize => "minimize",
        }
    }

    /// Maps a raw value so that higher is always better.
    pub fn orient(self, value: f64) -> f64 {
        match self {
            Self::Maximize => value,
            Self::Minimize => -value,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = McdaError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "max" | "maximize" => Ok(Self::Maximize),
            "min" | "minimize" => Ok(Self::Minimize),
            other => Err(McdaError::invalid_input(format!(
                "unknown direction '{other}'; expected maximize or minimize"
            ))),
        }
    }
}

/// Per-objective directions: a default plus named overrides.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ObjectiveDirections {
    pub default: Direction,
    pub overrides: BTreeMap<String, Direction>,
}

impl ObjectiveDirections {
    pub fn maximize_all() -> Self {
        Self::default()
    }

    pub fn with_override(mut self, attribute: impl Into<String>, direction: Direction) -> Self {
        self.overrides.insert(attribute.into(), direction);
        self
    }

    pub fn direction_for(&self, attribute: &str) -> Direction {
        self.overrides
            .get(attribute)
            .copied()
            .unwrap_or(self.default)
    }

    /// Rejects overrides naming attributes outside `subset`.
    pub fn validate(&self, subset: &FeatureSubset) -> Result<(), McdaError> {
        let unknown = self
            .overrides
            .keys()
            .filter(|name| !subset.contains(name))
            .cloned()
            .collect::<Vec<_>>();
        if !unknown.is_empty() {
            return Err(McdaError::invalid_input(format!(
                "direction override(s) for attribute(s) outside the feature subset: {}",
                unknown.join(", ")
            )));
        }
        Ok(())
    }

    /// Directions in subset order.
    pub fn resolve(&self, subset: &FeatureSubset) -> Result<Vec<Direction>, McdaError> {
        self.validate(subset)?;
        Ok(subset
            .names()
            .iter()
            .map(|name| self.direction_for(name))
            .collect())
    }
}
