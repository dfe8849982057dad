// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::agglomerative::{Agglomerative, AgglomerativeConfig};
use crate::cut::{ClusterAssignment, CutPolicy, cut_tree};
use crate::dendrogram::ConsensusTree;
use crate::linkage::Linkage;
use mcda_core::{DistanceMatrix, McdaError};

/// Clusters `matrix` with `linkage` and cuts the tree with `cut_policy`.
pub fn build_consensus_tree(
    matrix: &DistanceMatrix,
    linkage: Linkage,
    cut_policy: CutPolicy,
) -> Result<(ConsensusTree, ClusterAssignment), McdaError> {
    cut_policy.validate(matrix.n())?;
    let result = Agglomerative::new(AgglomerativeConfig { linkage })?.fit(matrix)?;
    let assignment = cut_tree(&result.tree, cut_policy)?;
    Ok((result.tree, assignment))
}

#[cfg(test)]
mod tests {
    use super::build_consensus_tree;
    use crate::cut::CutPolicy;
    use crate::linkage::Linkage;
    use mcda_core::{DistanceMatrix, McdaError};

    #[test]
    fn identical_records_form_one_cluster_at_height_zero() {
        let matrix = DistanceMatrix::from_rows(vec![vec![0.0; 3]; 3]).expect("matrix");
        let (tree, assignment) =
            build_consensus_tree(&matrix, Linkage::Average, CutPolicy::DistanceThreshold(0.0))
                .expect("tree");
        assert_eq!(tree.leaf_count(), 3);
        assert_eq!(tree.max_height(), 0.0);
        assert_eq!(assignment.labels, vec![0, 0, 0]);
        assert_eq!(assignment.cluster_count, 1);
    }

    #[test]
    fn invalid_cut_is_rejected_before_clustering() {
        let matrix =
            DistanceMatrix::from_rows(vec![vec![0.0, 0.4], vec![0.4, 0.0]]).expect("matrix");
        let err = build_consensus_tree(&matrix, Linkage::Average, CutPolicy::ClusterCount(3))
            .expect_err("3 clusters from 2 records");
        assert!(matches!(err, McdaError::InvalidInput(_)));
    }
}
