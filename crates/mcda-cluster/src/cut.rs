// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::dendrogram::Dendrogram;
use mcda_core::McdaError;
use tracing::debug;

/// How a tree is cut into flat clusters.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CutPolicy {
    /// Undo the last merges until exactly this many clusters remain.
    ClusterCount(usize),
    /// Keep every merge whose height is at most this distance.
    DistanceThreshold(f64),
}

impl CutPolicy {
    pub fn validate(&self, leaf_count: usize) -> Result<(), McdaError> {
        match *self {
            Self::ClusterCount(count) => {
                if count == 0 || count > leaf_count {
                    return Err(McdaError::invalid_input(format!(
                        "cluster count must be in 1..={leaf_count}; got {count}"
                    )));
                }
            }
            Self::DistanceThreshold(threshold) => {
                if !threshold.is_finite() || threshold < 0.0 {
                    return Err(McdaError::invalid_input(format!(
                        "distance threshold must be finite and >= 0; got {threshold}"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Flat clustering of the tree's leaves.
///
/// Cluster ids start at 0 and are numbered in order of each cluster's
/// lowest record index.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct ClusterAssignment {
    pub labels: Vec<usize>,
    pub cluster_count: usize,
    /// The policy that produced this assignment.
    pub policy: CutPolicy,
}

impl ClusterAssignment {
    /// Record indices in `cluster`, ascending.
    pub fn members(&self, cluster: usize) -> Vec<usize> {
        self.labels
            .iter()
            .enumerate()
            .filter(|(_, label)| **label == cluster)
            .map(|(idx, _)| idx)
            .collect()
    }

    pub fn sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.cluster_count];
        for &label in &self.labels {
            sizes[label] += 1;
        }
        sizes
    }
}

fn find(parent: &mut [usize], mut node: usize) -> usize {
    while parent[node] != node {
        parent[node] = parent[parent[node]];
        node = parent[node];
    }
    node
}

/// Cuts `tree` into flat clusters.
pub fn cut_tree(tree: &Dendrogram, policy: CutPolicy) -> Result<ClusterAssignment, McdaError> {
    let n = tree.leaf_count();
    policy.validate(n)?;

    let applied = match policy {
        CutPolicy::ClusterCount(count) => n - count,
        CutPolicy::DistanceThreshold(threshold) => tree
            .merges()
            .iter()
            .take_while(|m| m.height <= threshold)
            .count(),
    };

    let mut parent = (0..tree.node_count()).collect::<Vec<_>>();
    for (step, merge) in tree.merges().iter().take(applied).enumerate() {
        let node = n + step;
        parent[merge.left] = node;
        parent[merge.right] = node;
    }

    let mut root_label = vec![usize::MAX; tree.node_count()];
    let mut labels = Vec::with_capacity(n);
    let mut cluster_count = 0usize;
    for leaf in 0..n {
        let root = find(&mut parent, leaf);
        if root_label[root] == usize::MAX {
            root_label[root] = cluster_count;
            cluster_count += 1;
        }
        labels.push(root_label[root]);
    }

    debug!(
        ?policy,
        applied_merges = applied,
        cluster_count,
        "cut tree into clusters"
    );

    Ok(ClusterAssignment {
        labels,
        cluster_count,
        policy,
    })
}

#[cfg(test)]
mod tests {
    use super::{CutPolicy, cut_tree};
    use crate::dendrogram::{Dendrogram, Merge};
    use crate::linkage::Linkage;

    fn sample() -> Dendrogram {
        // leaves 0..5: (1, 3) at 0.1, (0, 4) at 0.2, (5, 6) at 0.5, (2, 7) at 0.9
        Dendrogram::new(
            5,
            Linkage::Average,
            vec![
                Merge {
                    left: 1,
                    right: 3,
                    height: 0.1,
                    size: 2,
                },
                Merge {
                    left: 0,
                    right: 4,
                    height: 0.2,
                    size: 2,
                },
                Merge {
                    left: 5,
                    right: 6,
                    height: 0.5,
                    size: 4,
                },
                Merge {
                    left: 2,
                    right: 7,
                    height: 0.9,
                    size: 5,
                },
            ],
        )
        .expect("sample tree is valid")
    }

    #[test]
    fn count_cut_numbers_clusters_by_first_record() {
        let tree = sample();
        let two = cut_tree(&tree, CutPolicy::ClusterCount(2)).expect("cut");
        assert_eq!(two.labels, vec![0, 0, 1, 0, 0]);
        assert_eq!(two.cluster_count, 2);
        assert_eq!(two.sizes(), vec![4, 1]);

        let three = cut_tree(&tree, CutPolicy::ClusterCount(3)).expect("cut");
        assert_eq!(three.labels, vec![0, 1, 2, 1, 0]);
        assert_eq!(three.members(1), vec![1, 3]);

        let all = cut_tree(&tree, CutPolicy::ClusterCount(5)).expect("cut");
        assert_eq!(all.labels, vec![0, 1, 2, 3, 4]);
        let one = cut_tree(&tree, CutPolicy::ClusterCount(1)).expect("cut");
        assert_eq!(one.labels, vec![0; 5]);
    }

    #[test]
    fn threshold_cut_keeps_merges_at_or_below_distance() {
        let tree = sample();
        let cut = cut_tree(&tree, CutPolicy::DistanceThreshold(0.2)).expect("cut");
        assert_eq!(cut.labels, vec![0, 1, 2, 1, 0]);
        assert_eq!(cut.policy, CutPolicy::DistanceThreshold(0.2));

        let none = cut_tree(&tree, CutPolicy::DistanceThreshold(0.0)).expect("cut");
        assert_eq!(none.cluster_count, 5);
        let root = cut_tree(&tree, CutPolicy::DistanceThreshold(10.0)).expect("cut");
        assert_eq!(root.cluster_count, 1);
    }

    #[test]
    fn invalid_policies_are_rejected() {
        let tree = sample();
        assert!(cut_tree(&tree, CutPolicy::ClusterCount(0)).is_err());
        assert!(cut_tree(&tree, CutPolicy::ClusterCount(6)).is_err());
        assert!(cut_tree(&tree, CutPolicy::DistanceThreshold(-0.1)).is_err());
        assert!(cut_tree(&tree, CutPolicy::DistanceThreshold(f64::NAN)).is_err());
    }
}
