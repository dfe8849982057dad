// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::linkage::Linkage;
use mcda_core::McdaError;

/// One agglomeration step. The merged node gets id `leaf_count + step`.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Merge {
    /// Lower child node id.
    pub left: usize,
    /// Higher child node id.
    pub right: usize,
    pub height: f64,
    /// Leaf count under the merged node.
    pub size: usize,
}

/// Binary merge tree over `leaf_count` leaves.
///
/// Node ids follow the usual linkage-matrix convention: leaves are
/// `0..leaf_count` (the record indices), merge `i` creates node
/// `leaf_count + i`, and the root is the last merge. Heights are
/// non-decreasing in merge order.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(try_from = "DendrogramWire", into = "DendrogramWire")
)]
#[derive(Clone, Debug, PartialEq)]
pub struct Dendrogram {
    leaf_count: usize,
    linkage: Linkage,
    merges: Vec<Merge>,
}

/// The tree built over a dataset's distance matrix.
pub type ConsensusTree = Dendrogram;

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct DendrogramWire {
    pub leaf_count: usize,
    pub linkage: Linkage,
    pub merges: Vec<Merge>,
}

impl TryFrom<DendrogramWire> for Dendrogram {
    type Error = McdaError;

    fn try_from(wire: DendrogramWire) -> Result<Self, Self::Error> {
        Dendrogram::new(wire.leaf_count, wire.linkage, wire.merges)
    }
}

impl From<Dendrogram> for DendrogramWire {
    fn from(tree: Dendrogram) -> Self {
        Self {
            leaf_count: tree.leaf_count,
            linkage: tree.linkage,
            merges: tree.merges,
        }
    }
}

impl Dendrogram {
    /// Validates and wraps a merge sequence.
    pub fn new(leaf_count: usize, linkage: Linkage, merges: Vec<Merge>) -> Result<Self, McdaError> {
        if leaf_count == 0 {
            return Err(McdaError::invalid_input("dendrogram requires at least one leaf"));
        }
        if merges.len() != leaf_count - 1 {
            return Err(McdaError::invalid_input(format!(
                "dendrogram over {leaf_count} leaves needs {} merge(s); got {}",
                leaf_count - 1,
                merges.len()
            )));
        }

        let node_count = 2 * leaf_count - 1;
        let mut sizes = vec![1usize; node_count];
        let mut consumed = vec![false; node_count];
        let mut previous_height = 0.0f64;

        for (step, merge) in merges.iter().enumerate() {
            let node = leaf_count + step;
            if merge.left >= merge.right {
                return Err(McdaError::invalid_input(format!(
                    "merge {step}: left child {} must be below right child {}",
                    merge.left, merge.right
                )));
            }
            if merge.right >= node {
                return Err(McdaError::invalid_input(format!(
                    "merge {step}: child {} does not exist before node {node}",
                    merge.right
                )));
            }
            for child in [merge.left, merge.right] {
                if consumed[child] {
                    return Err(McdaError::invalid_input(format!(
                        "merge {step}: node {child} was already merged"
                    )));
                }
                consumed[child] = true;
            }
            if !merge.height.is_finite() || merge.height < 0.0 {
                return Err(McdaError::numerical_issue(format!(
                    "merge {step}: height must be finite and >= 0; got {}",
                    merge.height
                )));
            }
            if merge.height < previous_height {
                return Err(McdaError::invalid_input(format!(
                    "merge {step}: height {} decreases below {previous_height}",
                    merge.height
                )));
            }
            let expected = sizes[merge.left] + sizes[merge.right];
            if merge.size != expected {
                return Err(McdaError::invalid_input(format!(
                    "merge {step}: size {} does not match children ({expected})",
                    merge.size
                )));
            }
            sizes[node] = expected;
            previous_height = merge.height;
        }

        Ok(Self {
            leaf_count,
            linkage,
            merges,
        })
    }

    pub fn leaf_count(&self) -> usize {
        self.leaf_count
    }

    pub fn linkage(&self) -> Linkage {
        self.linkage
    }

    pub fn merges(&self) -> &[Merge] {
        &self.merges
    }

    pub fn node_count(&self) -> usize {
        2 * self.leaf_count - 1
    }

    pub fn root(&self) -> usize {
        self.node_count() - 1
    }

    pub fn is_leaf(&self, node: usize) -> bool {
        node < self.leaf_count
    }

    fn merge_for(&self, node: usize) -> Option<&Merge> {
        node.checked_sub(self.leaf_count)
            .and_then(|step| self.merges.get(step))
    }

    pub fn children(&self, node: usize) -> Option<(usize, usize)> {
        self.merge_for(node).map(|m| (m.left, m.right))
    }

    /// Merge height of `node`; leaves sit at 0.
    pub fn height(&self, node: usize) -> f64 {
        self.merge_for(node).map_or(0.0, |m| m.height)
    }

    pub fn size(&self, node: usize) -> usize {
        self.merge_for(node).map_or(1, |m| m.size)
    }

    /// Leaves under `node`, left subtree first.
    pub fn leaves(&self, node: usize) -> Vec<usize> {
        let mut out = Vec::with_capacity(self.size(node));
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            match self.children(current) {
                Some((left, right)) => {
                    stack.push(right);
                    stack.push(left);
                }
                None => out.push(current),
            }
        }
        out
    }

    pub fn leaf_order(&self) -> Vec<usize> {
        self.leaves(self.root())
    }

    /// `[left, right, height, size]` rows, the conventional linkage matrix.
    pub fn linkage_rows(&self) -> Vec<[f64; 4]> {
        self.merges
            .iter()
            .map(|m| [m.left as f64, m.right as f64, m.height, m.size as f64])
            .collect()
    }

    /// Parent of every node; `None` for the root.
    pub fn parent_array(&self) -> Vec<Option<usize>> {
        let mut parents = vec![None; self.node_count()];
        for (step, merge) in self.merges.iter().enumerate() {
            let node = self.leaf_count + step;
            parents[merge.left] = Some(node);
            parents[merge.right] = Some(node);
        }
        parents
    }

    pub fn max_height(&self) -> f64 {
        self.merges.last().map_or(0.0, |m| m.height)
    }
}

#[cfg(test)]
mod tests {
    use super::{Dendrogram, Merge};
    use crate::linkage::Linkage;

    fn merge(left: usize, right: usize, height: f64, size: usize) -> Merge {
        Merge {
            left,
            right,
            height,
            size,
        }
    }

    fn sample() -> Dendrogram {
        // ((0, 2), (1, 3))
        Dendrogram::new(
            4,
            Linkage::Average,
            vec![
                merge(0, 2, 0.1, 2),
                merge(1, 3, 0.2, 2),
                merge(4, 5, 0.7, 4),
            ],
        )
        .expect("sample tree is valid")
    }

    #[test]
    fn navigation_and_exports() {
        let tree = sample();
        assert_eq!(tree.node_count(), 7);
        assert_eq!(tree.root(), 6);
        assert_eq!(tree.children(6), Some((4, 5)));
        assert_eq!(tree.children(2), None);
        assert_eq!(tree.height(5), 0.2);
        assert_eq!(tree.height(3), 0.0);
        assert_eq!(tree.leaf_order(), vec![0, 2, 1, 3]);
        assert_eq!(tree.leaves(5), vec![1, 3]);
        assert_eq!(tree.linkage_rows()[2], [4.0, 5.0, 0.7, 4.0]);
        assert_eq!(
            tree.parent_array(),
            vec![Some(4), Some(5), Some(4), Some(5), Some(6), Some(6), None]
        );
        assert_eq!(tree.max_height(), 0.7);
    }

    #[test]
    fn single_leaf_tree_has_no_merges() {
        let tree = Dendrogram::new(1, Linkage::Single, vec![]).expect("one leaf is valid");
        assert_eq!(tree.root(), 0);
        assert_eq!(tree.leaf_order(), vec![0]);
        assert!(tree.linkage_rows().is_empty());
    }

    #[test]
    fn rejects_malformed_merge_sequences() {
        assert!(Dendrogram::new(0, Linkage::Average, vec![]).is_err());
        assert!(Dendrogram::new(3, Linkage::Average, vec![merge(0, 1, 0.1, 2)]).is_err());
        // reuses leaf 0
        assert!(
            Dendrogram::new(
                3,
                Linkage::Average,
                vec![merge(0, 1, 0.1, 2), merge(0, 2, 0.2, 2)]
            )
            .is_err()
        );
        // decreasing height
        assert!(
            Dendrogram::new(
                3,
                Linkage::Average,
                vec![merge(0, 1, 0.3, 2), merge(2, 3, 0.2, 3)]
            )
            .is_err()
        );
        // wrong size
        assert!(
            Dendrogram::new(
                3,
                Linkage::Average,
                vec![merge(0, 1, 0.1, 2), merge(2, 3, 0.2, 2)]
            )
            .is_err()
        );
        // forward reference
        assert!(
            Dendrogram::new(
                3,
                Linkage::Average,
                vec![merge(0, 3, 0.1, 2), merge(1, 2, 0.2, 3)]
            )
            .is_err()
        );
        assert!(Dendrogram::new(2, Linkage::Average, vec![merge(0, 1, f64::NAN, 2)]).is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_round_trip_revalidates() {
        let tree = sample();
        let encoded = serde_json::to_string(&tree).expect("tree should serialize");
        let decoded: Dendrogram = serde_json::from_str(&encoded).expect("tree should deserialize");
        assert_eq!(decoded, tree);

        let broken = r#"{"leaf_count":2,"linkage":"average","merges":[]}"#;
        assert!(serde_json::from_str::<Dendrogram>(broken).is_err());
    }
}
