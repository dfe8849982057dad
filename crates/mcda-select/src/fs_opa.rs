// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::groups::{GroupSource, default_groups, dense_groups};
use crate::scoring::{Dispersion, DispersionScorer, VarianceRatio};
use crate::search::{ResolvedStrategy, SearchDirection, SearchOutcome, SearchStrategy, search};
use crate::space::{AttributeSpace, Metric};
use mcda_cluster::{ClusterAssignment, ConsensusTree, CutPolicy, Linkage, build_consensus_tree};
use mcda_core::{
    AttributeKind, Dataset, Diagnostics, EvaluationStats, ExecutionContext, FeatureSubset,
    McdaError, validate_k,
};
use std::borrow::Cow;
use std::time::Instant;
use tracing::info;

/// Configuration for [`FsOpa`].
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FsOpaConfig {
    pub strategy: SearchStrategy,
    /// Record distance used to build the partition trees.
    pub metric: Metric,
    pub linkage: Linkage,
}

impl FsOpaConfig {
    pub fn validate(&self) -> Result<(), McdaError> {
        self.strategy.validate()
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PartitionKind {
    Best,
    Worst,
}

impl PartitionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Best => "BEST",
            Self::Worst => "WORST",
        }
    }
}

/// Tree over all records built from the selected attributes only.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct PartitionTree {
    pub kind: PartitionKind,
    pub features: FeatureSubset,
    pub score: f64,
    pub tree: ConsensusTree,
    pub assignment: ClusterAssignment,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct AttributeScore {
    pub attribute: String,
    pub kind: AttributeKind,
    pub dispersion: Dispersion,
    pub ratio: f64,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct FeatureSelection {
    /// The BEST subset, in dataset attribute order.
    pub features: FeatureSubset,
    pub best: PartitionTree,
    pub worst: PartitionTree,
    /// Group id per record used for scoring.
    pub groups: Vec<usize>,
    pub group_source: GroupSource,
    pub strategy: ResolvedStrategy,
    pub candidates_evaluated: usize,
    pub attribute_scores: Vec<AttributeScore>,
    pub numeric_attributes: Vec<String>,
    pub categorical_attributes: Vec<String>,
    pub diagnostics: Diagnostics,
}

/// FS-OPA: picks the k attributes that best separate the record groups.
#[derive(Debug)]
pub struct FsOpa<S: DispersionScorer> {
    scorer: S,
    config: FsOpaConfig,
}

impl<S: DispersionScorer> FsOpa<S> {
    pub fn new(scorer: S, config: FsOpaConfig) -> Result<Self, McdaError> {
        config.validate()?;
        Ok(Self { scorer, config })
    }

    pub fn scorer(&self) -> &S {
        &self.scorer
    }

    pub fn config(&self) -> &FsOpaConfig {
        &self.config
    }

    /// Selects `k` attributes and builds the BEST and WORST partition trees.
    ///
    /// `groups` gives one label per record; when absent the records are
    /// clustered on all attributes first.
    pub fn select(
        &self,
        dataset: &Dataset,
        k: usize,
        groups: Option<&[usize]>,
        ctx: &ExecutionContext<'_>,
    ) -> Result<FeatureSelection, McdaError> {
        let started_at = Instant::now();
        validate_k(k, dataset.n_attributes())?;
        dataset.require_records(2, "feature selection")?;

        let (raw_groups, group_source) = match groups {
            Some(labels) => {
                if labels.len() != dataset.n_records() {
                    return Err(McdaError::invalid_input(format!(
                        "expected {} group label(s); got {}",
                        dataset.n_records(),
                        labels.len()
                    )));
                }
                (labels.to_vec(), GroupSource::Provided)
            }
            None => (default_groups(dataset, k)?, GroupSource::Computed),
        };
        let (dense, group_count) = dense_groups(&raw_groups);

        let mut warnings = vec![];
        if group_count < 2 {
            warnings.push(
                "all records share one group; every attribute scores zero separation".to_string(),
            );
        }

        let parts = (0..dataset.n_attributes())
            .map(|a| {
                self.scorer
                    .attribute_dispersion(dataset, a, &dense, group_count)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let parallel = ctx.parallel_enabled();
        let best = search(
            &self.scorer,
            &parts,
            k,
            self.config.strategy,
            SearchDirection::Maximize,
            parallel,
        )?;
        ctx.report_progress(0.4);
        let worst = search(
            &self.scorer,
            &parts,
            k,
            self.config.strategy,
            SearchDirection::Minimize,
            parallel,
        )?;
        ctx.report_progress(0.6);

        let best_tree = self.partition_tree(dataset, k, PartitionKind::Best, &best)?;
        ctx.report_progress(0.8);
        let worst_tree = self.partition_tree(dataset, k, PartitionKind::Worst, &worst)?;
        ctx.report_progress(1.0);

        let mut numeric_attributes = vec![];
        let mut categorical_attributes = vec![];
        let mut attribute_scores = Vec::with_capacity(parts.len());
        for (a, (name, dispersion)) in dataset.attributes().iter().zip(&parts).enumerate() {
            let kind = dataset.attribute_kind(a);
            match kind {
                AttributeKind::Numeric => numeric_attributes.push(name.clone()),
                AttributeKind::Categorical => categorical_attributes.push(name.clone()),
            }
            attribute_scores.push(AttributeScore {
                attribute: name.clone(),
                kind,
                dispersion: *dispersion,
                ratio: dispersion.ratio(),
            });
        }

        let candidates_evaluated = best.evaluated + worst.evaluated;
        let runtime_ms = u64::try_from(started_at.elapsed().as_millis()).unwrap_or(u64::MAX);

        info!(
            records = dataset.n_records(),
            attributes = dataset.n_attributes(),
            k,
            strategy = best.strategy.as_str(),
            best = ?best_tree.features.names(),
            best_score = best_tree.score,
            worst = ?worst_tree.features.names(),
            worst_score = worst_tree.score,
            runtime_ms,
            "selected features"
        );

        let diagnostics = Diagnostics {
            n: dataset.n_records(),
            d: dataset.n_attributes(),
            runtime_ms: Some(runtime_ms),
            notes: vec![format!(
                "k={k}, strategy={}, scorer={}, metric={}, linkage={}, groups={group_count} ({:?}), candidates_evaluated={candidates_evaluated}",
                best.strategy.as_str(),
                self.scorer.name(),
                self.config.metric,
                self.config.linkage,
                group_source
            )],
            warnings,
            algorithm: Cow::Borrowed("fs_opa"),
            repro_mode: ctx.repro_mode,
            #[cfg(feature = "serde")]
            params_json: serde_json::to_value(self.config).ok(),
            evaluation_stats: Some(EvaluationStats {
                evaluations: candidates_evaluated,
                skipped: 0,
            }),
            ..Diagnostics::default()
        };

        Ok(FeatureSelection {
            features: best_tree.features.clone(),
            best: best_tree,
            worst: worst_tree,
            groups: raw_groups,
            group_source,
            strategy: best.strategy,
            candidates_evaluated,
            attribute_scores,
            numeric_attributes,
            categorical_attributes,
            diagnostics,
        })
    }

    fn partition_tree(
        &self,
        dataset: &Dataset,
        k: usize,
        kind: PartitionKind,
        outcome: &SearchOutcome,
    ) -> Result<PartitionTree, McdaError> {
        let attributes = &outcome.selected.attributes;
        let features = FeatureSubset::new(
            attributes
                .iter()
                .map(|&a| dataset.attributes()[a].clone())
                .collect(),
        )?;
        let matrix = AttributeSpace::new(dataset, attributes)?.distance_matrix(self.config.metric)?;
        let clusters = k.min(dataset.n_records());
        let (tree, assignment) = build_consensus_tree(
            &matrix,
            self.config.linkage,
            CutPolicy::ClusterCount(clusters),
        )?;
        Ok(PartitionTree {
            kind,
            features,
            score: outcome.selected.score,
            tree,
            assignment,
        })
    }
}

/// FS-OPA with the default scorer and configuration.
pub fn select_features(
    dataset: &Dataset,
    k: usize,
    groups: Option<&[usize]>,
) -> Result<(FeatureSubset, PartitionTree, PartitionTree), McdaError> {
    let selection = FsOpa::new(VarianceRatio, FsOpaConfig::default())?.select(
        dataset,
        k,
        groups,
        &ExecutionContext::default(),
    )?;
    Ok((selection.features, selection.best, selection.worst))
}

#[cfg(test)]
mod tests {
    use super::{FsOpa, FsOpaConfig, PartitionKind, select_features};
    use crate::groups::GroupSource;
    use crate::scoring::{Dispersion, DispersionScorer};
    use crate::search::{ResolvedStrategy, SearchStrategy};
    use mcda_core::{Dataset, ExecutionContext, McdaError, ReproMode, Value};

    /// Two attributes track the grouping, two are noise, one is constant.
    fn separable() -> Dataset {
        Dataset::from_numeric_rows(
            vec!["noise_a", "signal_x", "flat", "signal_y", "noise_b"],
            vec![
                vec![3.0, 0.0, 1.0, 10.0, 5.0],
                vec![1.0, 0.2, 1.0, 10.5, 2.0],
                vec![2.0, 0.1, 1.0, 9.8, 4.0],
                vec![2.0, 5.0, 1.0, 20.0, 3.0],
                vec![3.0, 5.3, 1.0, 21.0, 2.0],
                vec![1.0, 4.9, 1.0, 19.5, 4.0],
            ],
        )
        .expect("dataset")
    }

    const GROUPS: [usize; 6] = [0, 0, 0, 1, 1, 1];

    #[test]
    fn best_subset_picks_signal_and_worst_picks_flat_columns() {
        let (features, best, worst) =
            select_features(&separable(), 2, Some(&GROUPS)).expect("selection");
        assert_eq!(
            features.names(),
            &["signal_x".to_string(), "signal_y".to_string()]
        );
        assert_eq!(best.kind, PartitionKind::Best);
        assert_eq!(best.tree.leaf_count(), 6);
        assert_eq!(best.assignment.labels, vec![0, 0, 0, 1, 1, 1]);
        assert_eq!(worst.kind, PartitionKind::Worst);
        assert!(worst.features.contains("flat"));
        assert!(worst.score < best.score);
        assert_eq!(worst.features.len(), 2);
    }

    #[test]
    fn invalid_k_fails_before_any_work() {
        for k in [0, 1, 3, 5, 16] {
            let err = select_features(&separable(), k, Some(&GROUPS)).expect_err("invalid k");
            assert!(matches!(err, McdaError::InvalidK { .. }));
        }
        let one_attribute =
            Dataset::from_numeric_rows(vec!["x"], vec![vec![1.0], vec![2.0]]).expect("dataset");
        let err = select_features(&one_attribute, 2, None).expect_err("k=2 over 1 attribute");
        assert_eq!(
            err,
            McdaError::InvalidK {
                k: 2,
                attribute_count: Some(1)
            }
        );
        let err = select_features(&separable(), 8, None).expect_err("k=8 over 5 attributes");
        assert_eq!(err.code(), "invalid_k");
    }

    #[test]
    fn computed_groups_are_reported() {
        let selector = FsOpa::new(
            crate::VarianceRatio,
            FsOpaConfig {
                strategy: SearchStrategy::Greedy,
                ..FsOpaConfig::default()
            },
        )
        .expect("selector");
        let selection = selector
            .select(
                &separable(),
                4,
                None,
                &ExecutionContext::new().with_repro_mode(ReproMode::Strict),
            )
            .expect("selection");
        assert_eq!(selection.group_source, GroupSource::Computed);
        assert_eq!(selection.groups.len(), 6);
        assert_eq!(selection.strategy, ResolvedStrategy::Greedy);
        assert_eq!(selection.features.len(), 4);
        assert_eq!(selection.numeric_attributes.len(), 5);
        assert!(selection.categorical_attributes.is_empty());
        assert_eq!(selection.attribute_scores.len(), 5);
        assert_eq!(selection.best.assignment.cluster_count, 4);
        assert_eq!(selection.diagnostics.algorithm, "fs_opa");
    }

    #[test]
    fn group_label_count_must_match_records() {
        let err = select_features(&separable(), 2, Some(&[0, 1])).expect_err("short groups");
        assert!(matches!(err, McdaError::InvalidInput(_)));
    }

    #[test]
    fn single_group_warns() {
        let selector =
            FsOpa::new(crate::VarianceRatio, FsOpaConfig::default()).expect("selector");
        let selection = selector
            .select(&separable(), 2, Some(&[4; 6]), &ExecutionContext::default())
            .expect("selection");
        assert_eq!(selection.diagnostics.warnings.len(), 1);
        assert_eq!(selection.best.score, 0.0);
    }

    #[test]
    fn mixed_attributes_are_supported() {
        let dataset = Dataset::new(
            vec!["kind".to_string(), "x".to_string(), "y".to_string()],
            vec![
                vec![Value::from("a"), Value::from(1.0), Value::from(7.0)],
                vec![Value::from("a"), Value::from(1.5), Value::from(3.0)],
                vec![Value::from("b"), Value::from(9.0), Value::from(5.0)],
                vec![Value::from("b"), Value::from(9.5), Value::from(4.0)],
            ],
        )
        .expect("dataset");
        let (features, _, _) =
            select_features(&dataset, 2, Some(&[0, 0, 1, 1])).expect("selection");
        assert_eq!(features.names(), &["kind".to_string(), "x".to_string()]);
    }

    struct PreferLastScorer;

    impl DispersionScorer for PreferLastScorer {
        fn name(&self) -> &'static str {
            "prefer_last"
        }

        fn attribute_dispersion(
            &self,
            _dataset: &Dataset,
            attribute: usize,
            _groups: &[usize],
            _group_count: usize,
        ) -> Result<Dispersion, McdaError> {
            Ok(Dispersion {
                between: attribute as f64,
                within: 1.0,
            })
        }
    }

    #[test]
    fn scorer_is_injectable() {
        let selector = FsOpa::new(PreferLastScorer, FsOpaConfig::default()).expect("selector");
        let selection = selector
            .select(&separable(), 2, Some(&GROUPS), &ExecutionContext::default())
            .expect("selection");
        assert_eq!(
            selection.features.names(),
            &["signal_y".to_string(), "noise_b".to_string()]
        );
        assert_eq!(
            selection.worst.features.names(),
            &["noise_a".to_string(), "signal_x".to_string()]
        );
        assert!(selection.diagnostics.notes[0].contains("scorer=prefer_last"));
    }
}
