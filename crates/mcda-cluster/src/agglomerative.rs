// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::dendrogram::{Dendrogram, Merge};
use crate::linkage::Linkage;
use mcda_core::{Diagnostics, DistanceMatrix, EvaluationStats, McdaError};
use std::borrow::Cow;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Instant;
use tracing::{debug, info};

/// Configuration for [`Agglomerative`].
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AgglomerativeConfig {
    pub linkage: Linkage,
}

impl AgglomerativeConfig {
    pub fn validate(&self) -> Result<(), McdaError> {
        Ok(())
    }
}

/// Tree plus run metadata.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct ClusteringResult {
    pub tree: Dendrogram,
    pub diagnostics: Diagnostics,
}

/// Sequential agglomerative clustering over a precomputed distance matrix.
#[derive(Clone, Debug)]
pub struct Agglomerative {
    config: AgglomerativeConfig,
}

#[derive(Clone, Copy, Debug)]
struct MergeCandidate {
    distance: f64,
    leaf_sum: usize,
    low_node: usize,
    high_node: usize,
    slot_a: usize,
    slot_b: usize,
    version_a: u64,
    version_b: u64,
}

impl PartialEq for MergeCandidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for MergeCandidate {}

impl PartialOrd for MergeCandidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MergeCandidate {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering so BinaryHeap pops the closest pair first.
        other
            .distance
            .total_cmp(&self.distance)
            .then_with(|| other.leaf_sum.cmp(&self.leaf_sum))
            .then_with(|| other.low_node.cmp(&self.low_node))
            .then_with(|| other.high_node.cmp(&self.high_node))
    }
}

/// Working state: one slot per original leaf, reused by the merged cluster.
struct ClusterState {
    n: usize,
    distances: Vec<f64>,
    alive: Vec<bool>,
    node: Vec<usize>,
    size: Vec<usize>,
    leaf_sum: Vec<usize>,
    version: Vec<u64>,
}

impl ClusterState {
    fn new(matrix: &DistanceMatrix) -> Self {
        let n = matrix.n();
        let mut distances = Vec::with_capacity(n * n);
        for i in 0..n {
            distances.extend_from_slice(matrix.row(i));
        }
        Self {
            n,
            distances,
            alive: vec![true; n],
            node: (0..n).collect(),
            size: vec![1; n],
            leaf_sum: (0..n).collect(),
            version: vec![0; n],
        }
    }

    fn distance(&self, a: usize, b: usize) -> f64 {
        self.distances[a * self.n + b]
    }

    fn set_distance(&mut self, a: usize, b: usize, value: f64) {
        self.distances[a * self.n + b] = value;
        self.distances[b * self.n + a] = value;
    }

    fn candidate(&self, a: usize, b: usize) -> MergeCandidate {
        let (node_a, node_b) = (self.node[a], self.node[b]);
        MergeCandidate {
            distance: self.distance(a, b),
            leaf_sum: self.leaf_sum[a] + self.leaf_sum[b],
            low_node: node_a.min(node_b),
            high_node: node_a.max(node_b),
            slot_a: a,
            slot_b: b,
            version_a: self.version[a],
            version_b: self.version[b],
        }
    }

    fn is_current(&self, candidate: &MergeCandidate) -> bool {
        self.alive[candidate.slot_a]
            && self.alive[candidate.slot_b]
            && self.version[candidate.slot_a] == candidate.version_a
            && self.version[candidate.slot_b] == candidate.version_b
    }
}

impl Agglomerative {
    pub fn new(config: AgglomerativeConfig) -> Result<Self, McdaError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AgglomerativeConfig {
        &self.config
    }

    /// Repeatedly merges the closest pair of clusters until one remains.
    ///
    /// Ties on distance go to the pair with the lower combined leaf-index
    /// sum, then to the lower node ids. Heights are clamped so they never
    /// decrease from one merge to the next.
    pub fn fit(&self, matrix: &DistanceMatrix) -> Result<ClusteringResult, McdaError> {
        let started_at = Instant::now();
        let n = matrix.n();
        if n < 2 {
            return Err(McdaError::insufficient_data(format!(
                "agglomerative clustering requires at least 2 records; got {n}"
            )));
        }

        let linkage = self.config.linkage;
        let mut state = ClusterState::new(matrix);
        let mut heap = BinaryHeap::with_capacity(n * (n - 1) / 2);
        for a in 0..n {
            for b in a + 1..n {
                heap.push(state.candidate(a, b));
            }
        }

        let mut merges = Vec::with_capacity(n - 1);
        let mut stats = EvaluationStats::default();
        let mut clamped = 0usize;
        let mut previous_height = 0.0f64;

        while merges.len() < n - 1 {
            let Some(candidate) = heap.pop() else {
                return Err(McdaError::numerical_issue(format!(
                    "merge queue exhausted after {} of {} merge(s)",
                    merges.len(),
                    n - 1
                )));
            };
            if !state.is_current(&candidate) {
                stats.skipped += 1;
                continue;
            }

            let (a, b) = (candidate.slot_a, candidate.slot_b);
            let mut height = candidate.distance;
            if height < previous_height {
                clamped += 1;
                height = previous_height;
            }
            let new_node = n + merges.len();
            let size = state.size[a] + state.size[b];
            merges.push(Merge {
                left: candidate.low_node,
                right: candidate.high_node,
                height,
                size,
            });
            debug!(
                node = new_node,
                left = candidate.low_node,
                right = candidate.high_node,
                height,
                "merged clusters"
            );
            previous_height = height;

            for k in 0..n {
                if k == a || k == b || !state.alive[k] {
                    continue;
                }
                let updated = linkage.update(
                    state.distance(a, k),
                    state.distance(b, k),
                    state.size[a],
                    state.size[b],
                );
                if !updated.is_finite() {
                    return Err(McdaError::numerical_issue(format!(
                        "non-finite {linkage} distance between node {new_node} and node {}",
                        state.node[k]
                    )));
                }
                state.set_distance(a, k, updated);
                stats.evaluations += 1;
            }

            state.alive[b] = false;
            state.version[b] += 1;
            state.version[a] += 1;
            state.node[a] = new_node;
            state.size[a] = size;
            state.leaf_sum[a] += state.leaf_sum[b];

            for k in 0..n {
                if k != a && state.alive[k] {
                    let (lo, hi) = if k < a { (k, a) } else { (a, k) };
                    heap.push(state.candidate(lo, hi));
                }
            }
        }

        let tree = Dendrogram::new(n, linkage, merges)?;
        let runtime_ms = u64::try_from(started_at.elapsed().as_millis()).unwrap_or(u64::MAX);

        info!(
            records = n,
            linkage = linkage.as_str(),
            root_height = tree.max_height(),
            runtime_ms,
            "built consensus tree"
        );

        let mut warnings = vec![];
        if clamped > 0 {
            warnings.push(format!(
                "{clamped} merge height(s) clamped to keep heights non-decreasing"
            ));
        }

        let diagnostics = Diagnostics {
            n,
            runtime_ms: Some(runtime_ms),
            notes: vec![format!(
                "linkage={linkage}, merges={}, distance_updates={}, stale_candidates={}",
                n - 1,
                stats.evaluations,
                stats.skipped
            )],
            warnings,
            algorithm: Cow::Borrowed("agglomerative"),
            thread_count: Some(1),
            #[cfg(feature = "serde")]
            params_json: serde_json::to_value(self.config).ok(),
            evaluation_stats: Some(stats),
            ..Diagnostics::default()
        };

        Ok(ClusteringResult { tree, diagnostics })
    }
}
