// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

pub mod agglomerative;
pub mod consensus;
pub mod cut;
pub mod dendrogram;
pub mod linkage;
pub mod render;

pub use agglomerative::{Agglomerative, AgglomerativeConfig, ClusteringResult};
pub use consensus::build_consensus_tree;
pub use cut::{ClusterAssignment, CutPolicy, cut_tree};
pub use dendrogram::{ConsensusTree, Dendrogram, DendrogramWire, Merge};
pub use linkage::Linkage;
pub use render::{render_ascii, render_newick};

/// Hierarchical clustering for mcda.
pub fn crate_name() -> &'static str {
    "mcda-cluster"
}

#[cfg(test)]
mod tests {
    #[test]
    fn crate_name_matches() {
        assert_eq!(super::crate_name(), "mcda-cluster");
    }
}
