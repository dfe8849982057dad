// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use mcda_cluster::{
    Agglomerative, AgglomerativeConfig, ClusterAssignment, ConsensusTree, CutPolicy, Linkage,
    cut_tree, render_ascii, render_newick,
};
use mcda_core::{
    AttributeKind, Dataset, Diagnostics, ExecutionContext, FeatureSubset, McdaError, ReproMode,
    SUPPORTED_K, validate_k,
};
use mcda_ncd::{
    ComplexityEstimator, LengthEstimator, NcdConfig, NcdMatrixBuilder, NcdResult, ZlibEstimator,
};
use mcda_pareto::{ObjectiveDirections, ParetoAnalyzer, ParetoConfig, ParetoResult};
use mcda_select::{
    FeatureSelection, FsOpa, FsOpaConfig, GroupDispersion, VarianceRatio, group_dispersion,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Complexity estimator used for the NCD stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EstimatorSpec {
    Zlib { level: u32 },
    Length,
}

impl Default for EstimatorSpec {
    fn default() -> Self {
        Self::Zlib {
            level: ZlibEstimator::default().level(),
        }
    }
}

impl EstimatorSpec {
    pub fn build(self) -> Result<Box<dyn ComplexityEstimator>, McdaError> {
        Ok(match self {
            Self::Zlib { level } => Box::new(ZlibEstimator::new(level)?),
            Self::Length => Box::new(LengthEstimator),
        })
    }
}

/// End-to-end configuration of one analysis run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineSpec {
    pub estimator: EstimatorSpec,
    pub ncd: NcdConfig,
    pub linkage: Linkage,
    /// Cut of the consensus tree; `None` cuts into `min(k, n)` clusters.
    pub cut: Option<CutPolicy>,
    pub k: usize,
    pub selection: FsOpaConfig,
    /// Pareto objectives; `None` uses the numeric selected features.
    pub objectives: Option<Vec<String>>,
    pub directions: ObjectiveDirections,
    pub pareto: ParetoConfig,
    pub repro_mode: ReproMode,
}

impl Default for PipelineSpec {
    fn default() -> Self {
        Self {
            estimator: EstimatorSpec::default(),
            ncd: NcdConfig::default(),
            linkage: Linkage::default(),
            cut: None,
            k: 2,
            selection: FsOpaConfig::default(),
            objectives: None,
            directions: ObjectiveDirections::maximize_all(),
            pareto: ParetoConfig::default(),
            repro_mode: ReproMode::default(),
        }
    }
}

impl PipelineSpec {
    /// Checks everything that does not depend on the dataset.
    pub fn validate(&self) -> Result<(), McdaError> {
        if !SUPPORTED_K.contains(&self.k) {
            return Err(McdaError::unsupported_k(self.k));
        }
        self.ncd.validate()?;
        self.selection.validate()?;
        self.pareto.validate()?;
        if let Some(CutPolicy::DistanceThreshold(threshold)) = self.cut
            && (!threshold.is_finite() || threshold < 0.0)
        {
            return Err(McdaError::invalid_input(format!(
                "cut threshold must be finite and >= 0; got {threshold}"
            )));
        }
        Ok(())
    }

    /// [`Self::validate`] plus the checks that need the dataset: `k` within
    /// the attribute count and at least two records to cluster.
    pub fn validate_for(&self, dataset: &Dataset) -> Result<(), McdaError> {
        self.validate()?;
        validate_k(self.k, dataset.n_attributes())?;
        dataset.require_records(2, "pipeline")
    }

    fn context(&self) -> ExecutionContext<'static> {
        ExecutionContext::new().with_repro_mode(self.repro_mode)
    }
}

/// The consensus tree with its flat cut and text exports.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TreeReport {
    pub tree: ConsensusTree,
    pub assignment: ClusterAssignment,
    pub ascii: String,
    pub newick: String,
    /// `[left, right, height, size]` per merge.
    pub linkage_rows: Vec<[f64; 4]>,
    pub diagnostics: Diagnostics,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub records: usize,
    pub numeric_attributes: Vec<String>,
    pub categorical_attributes: Vec<String>,
}

/// Everything one pipeline run produces.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PipelineReport {
    pub dataset: DatasetSummary,
    pub ncd: NcdResult,
    pub consensus: TreeReport,
    pub selection: FeatureSelection,
    pub group_dispersion: Vec<GroupDispersion>,
    /// Absent when no numeric objective is available.
    pub pareto: Option<ParetoResult>,
    /// Full front records, every attribute kept.
    pub front_records: Option<Dataset>,
    pub warnings: Vec<String>,
}

fn summarize(dataset: &Dataset) -> DatasetSummary {
    let (numeric, categorical): (Vec<_>, Vec<_>) = (0..dataset.n_attributes())
        .partition(|&a| dataset.attribute_kind(a) == AttributeKind::Numeric);
    let names = |idx: Vec<usize>| {
        idx.into_iter()
            .map(|a| dataset.attributes()[a].clone())
            .collect()
    };
    DatasetSummary {
        records: dataset.n_records(),
        numeric_attributes: names(numeric),
        categorical_attributes: names(categorical),
    }
}

/// NCD matrix over the records of `dataset`.
pub fn run_ncd(dataset: &Dataset, spec: &PipelineSpec) -> Result<NcdResult, McdaError> {
    spec.validate()?;
    NcdMatrixBuilder::new(spec.estimator.build()?, spec.ncd)?.build(dataset, &spec.context())
}

fn build_tree(
    dataset: &Dataset,
    ncd: &NcdResult,
    spec: &PipelineSpec,
) -> Result<TreeReport, McdaError> {
    let clustering = Agglomerative::new(AgglomerativeConfig {
        linkage: spec.linkage,
    })?
    .fit(&ncd.matrix)?;
    let policy = spec
        .cut
        .unwrap_or(CutPolicy::ClusterCount(spec.k.min(dataset.n_records())));
    let assignment = cut_tree(&clustering.tree, policy)?;
    Ok(TreeReport {
        ascii: render_ascii(&clustering.tree, dataset.labels())?,
        newick: render_newick(&clustering.tree, dataset.labels())?,
        linkage_rows: clustering.tree.linkage_rows(),
        tree: clustering.tree,
        assignment,
        diagnostics: clustering.diagnostics,
    })
}

/// Objectives and the directions restricted to them.
fn pareto_inputs(
    dataset: &Dataset,
    selection: &FeatureSelection,
    spec: &PipelineSpec,
    warnings: &mut Vec<String>,
) -> Result<Option<(FeatureSubset, ObjectiveDirections)>, McdaError> {
    let objectives = match &spec.objectives {
        Some(names) => FeatureSubset::new(names.clone())?,
        None => {
            let numeric = selection
                .features
                .names()
                .iter()
                .filter(|name| {
                    dataset
                        .attribute_index(name)
                        .is_some_and(|a| dataset.attribute_kind(a) == AttributeKind::Numeric)
                })
                .cloned()
                .collect::<Vec<_>>();
            if numeric.len() < selection.features.len() {
                warnings.push(format!(
                    "categorical selected feature(s) left out of pareto objectives: {}",
                    selection
                        .features
                        .names()
                        .iter()
                        .filter(|name| !numeric.contains(name))
                        .cloned()
                        .collect::<Vec<_>>()
                        .join(", ")
                ));
            }
            if numeric.is_empty() {
                return Ok(None);
            }
            FeatureSubset::new(numeric)?
        }
    };

    let mut directions = spec.directions.clone();
    let dropped = directions
        .overrides
        .keys()
        .filter(|name| !objectives.contains(name))
        .cloned()
        .collect::<Vec<_>>();
    if !dropped.is_empty() {
        directions.overrides.retain(|name, _| objectives.contains(name));
        warnings.push(format!(
            "direction override(s) ignored for non-objective attribute(s): {}",
            dropped.join(", ")
        ));
    }
    Ok(Some((objectives, directions)))
}

/// Runs every stage: NCD matrix, consensus tree, FS-OPA, Pareto front.
///
/// The consensus-tree clusters are the groups FS-OPA scores attributes against.
pub fn run_pipeline(dataset: &Dataset, spec: &PipelineSpec) -> Result<PipelineReport, McdaError> {
    spec.validate_for(dataset)?;
    let ctx = spec.context();
    let mut warnings = Vec::new();

    let ncd = NcdMatrixBuilder::new(spec.estimator.build()?, spec.ncd)?.build(dataset, &ctx)?;
    let consensus = build_tree(dataset, &ncd, spec)?;

    let selection = FsOpa::new(VarianceRatio, spec.selection)?.select(
        dataset,
        spec.k,
        Some(&consensus.assignment.labels),
        &ctx,
    )?;
    let group_dispersion = group_dispersion(dataset, &selection.groups)?;

    let (pareto, front_records) = match pareto_inputs(dataset, &selection, spec, &mut warnings)? {
        Some((objectives, directions)) => {
            let result = ParetoAnalyzer::new(spec.pareto)?.analyze(
                dataset,
                &objectives,
                &directions,
                &ctx,
            )?;
            let records = result.front.records(dataset)?;
            (Some(result), Some(records))
        }
        None => {
            warnings.push("no numeric objective available; pareto stage skipped".to_string());
            (None, None)
        }
    };

    for warning in &warnings {
        warn!("{warning}");
    }
    info!(
        records = dataset.n_records(),
        attributes = dataset.n_attributes(),
        clusters = consensus.assignment.cluster_count,
        features = ?selection.features.names(),
        front_size = pareto.as_ref().map(|p| p.metrics.front_size),
        "pipeline complete"
    );

    Ok(PipelineReport {
        dataset: summarize(dataset),
        ncd,
        consensus,
        selection,
        group_dispersion,
        pareto,
        front_records,
        warnings,
    })
}

/// Parses a JSON pipeline spec and runs it.
pub fn run_pipeline_json(
    dataset: &Dataset,
    pipeline_json: &str,
) -> Result<PipelineReport, McdaError> {
    let spec: PipelineSpec = serde_json::from_str(pipeline_json)
        .map_err(|err| McdaError::invalid_input(format!("invalid pipeline JSON: {err}")))?;
    run_pipeline(dataset, &spec)
}
