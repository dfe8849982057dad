// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

pub mod direction;
pub mod dominance;
pub mod front;
pub mod metrics;

pub use direction::{Direction, ObjectiveDirections};
pub use dominance::{dominates, non_dominated_indices, non_dominated_ranks};
pub use front::{ParetoAnalyzer, ParetoConfig, ParetoFront, ParetoResult, pareto_front};
pub use metrics::{
    DEFAULT_EXACT_HYPERVOLUME_MAX_OBJECTIVES, DEFAULT_MONTE_CARLO_SAMPLES,
    DEFAULT_MONTE_CARLO_SEED, DEFAULT_REFERENCE_OFFSET, HypervolumeMethod, ParetoMetrics, extent,
    hypervolume, hypervolume_monte_carlo, normalize_columns, spacing,
};

/// Pareto analysis crate for mcda.
pub fn crate_name() -> &'static str {
    "mcda-pareto"
}
