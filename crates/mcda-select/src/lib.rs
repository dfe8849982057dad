// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

pub mod fs_opa;
pub mod groups;
pub mod scoring;
pub mod search;
pub mod space;

pub use fs_opa::{
    AttributeScore, FeatureSelection, FsOpa, FsOpaConfig, PartitionKind, PartitionTree,
    select_features,
};
pub use groups::{
    DispersionSummary, GroupDispersion, GroupSource, default_groups, dense_groups,
    group_dispersion,
};
pub use scoring::{Dispersion, DispersionScorer, VarianceRatio, WITHIN_FLOOR};
pub use search::{
    Candidate, ResolvedStrategy, SearchDirection, SearchOutcome, SearchStrategy, binomial, search,
};
pub use space::{AttributeSpace, Metric};

/// FS-OPA feature selection for mcda.
pub fn crate_name() -> &'static str {
    "mcda-select"
}

#[cfg(test)]
mod tests {
    #[test]
    fn crate_name_matches() {
        assert_eq!(super::crate_name(), "mcda-select");
    }
}
