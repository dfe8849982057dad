// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::direction::{Direction, ObjectiveDirections};
use crate::dominance::{non_dominated_indices, non_dominated_ranks};
use crate::metrics::{
    DEFAULT_EXACT_HYPERVOLUME_MAX_OBJECTIVES, DEFAULT_MONTE_CARLO_SAMPLES,
    DEFAULT_MONTE_CARLO_SEED, DEFAULT_REFERENCE_OFFSET, HypervolumeMethod, ParetoMetrics, extent,
    normalize_columns, spacing,
};
use mcda_core::{
    AttributeKind, Dataset, Diagnostics, EvaluationStats, ExecutionContext, FeatureSubset,
    McdaError,
};
use std::borrow::Cow;
use std::time::Instant;
use tracing::info;

/// Configuration for [`ParetoAnalyzer`].
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParetoConfig {
    /// How far below the worst normalized value (0) the hypervolume reference sits.
    pub reference_offset: f64,
    /// Fronts with more objectives than this get a Monte Carlo hypervolume.
    pub exact_hypervolume_max_objectives: usize,
    pub monte_carlo_samples: usize,
    pub monte_carlo_seed: u64,
}

impl Default for ParetoConfig {
    fn default() -> Self {
        Self {
            reference_offset: DEFAULT_REFERENCE_OFFSET,
            exact_hypervolume_max_objectives: DEFAULT_EXACT_HYPERVOLUME_MAX_OBJECTIVES,
            monte_carlo_samples: DEFAULT_MONTE_CARLO_SAMPLES,
            monte_carlo_seed: DEFAULT_MONTE_CARLO_SEED,
        }
    }
}

impl ParetoConfig {
    pub fn validate(&self) -> Result<(), McdaError> {
        if !self.reference_offset.is_finite() || self.reference_offset <= 0.0 {
            return Err(McdaError::invalid_input(format!(
                "ParetoConfig.reference_offset must be finite and > 0; got {}",
                self.reference_offset
            )));
        }
        if self.monte_carlo_samples == 0 {
            return Err(McdaError::invalid_input(
                "ParetoConfig.monte_carlo_samples must be >= 1; got 0",
            ));
        }
        Ok(())
    }

    /// Hypervolume method used for a front over `objectives` dimensions.
    pub fn hypervolume_method(&self, objectives: usize) -> HypervolumeMethod {
        if objectives <= self.exact_hypervolume_max_objectives {
            HypervolumeMethod::Exact
        } else {
            HypervolumeMethod::MonteCarlo {
                samples: self.monte_carlo_samples,
                seed: self.monte_carlo_seed,
            }
        }
    }
}

/// Non-dominated records of a dataset over a set of objectives.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct ParetoFront {
    pub objectives: FeatureSubset,
    /// Direction of each objective, in `objectives` order.
    pub directions: Vec<Direction>,
    /// Front record indices into the analyzed dataset, ascending.
    pub members: Vec<usize>,
    pub labels: Vec<String>,
    /// Raw objective values of each member.
    pub values: Vec<Vec<f64>>,
    /// Member values scaled to `[0, 1]` with 1 as the best value on the front.
    pub normalized: Vec<Vec<f64>>,
    /// Non-dominated sorting rank of every analyzed record; members have rank 1.
    pub ranks: Vec<usize>,
}

impl ParetoFront {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, record: usize) -> bool {
        self.members.binary_search(&record).is_ok()
    }

    /// The full front records of `dataset`.
    pub fn records(&self, dataset: &Dataset) -> Result<Dataset, McdaError> {
        dataset.subset(&self.members)
    }

    /// The front records restricted to the objective attributes.
    pub fn projected(&self, dataset: &Dataset) -> Result<Dataset, McdaError> {
        self.records(dataset)?.project(self.objectives.names())
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct ParetoResult {
    pub front: ParetoFront,
    pub metrics: ParetoMetrics,
    pub diagnostics: Diagnostics,
}

/// Extracts the Pareto front and its quality metrics.
#[derive(Clone, Debug, Default)]
pub struct ParetoAnalyzer {
    config: ParetoConfig,
}

impl ParetoAnalyzer {
    pub fn new(config: ParetoConfig) -> Result<Self, McdaError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ParetoConfig {
        &self.config
    }

    pub fn analyze(
        &self,
        dataset: &Dataset,
        objectives: &FeatureSubset,
        directions: &ObjectiveDirections,
        ctx: &ExecutionContext<'_>,
    ) -> Result<ParetoResult, McdaError> {
        let started_at = Instant::now();
        dataset.require_records(1, "pareto analysis")?;
        let columns = objectives.indices_in(dataset)?;
        let resolved = directions.resolve(objectives)?;

        let non_numeric = columns
            .iter()
            .filter(|&&c| dataset.attribute_kind(c) != AttributeKind::Numeric)
            .map(|&c| dataset.attributes()[c].as_str())
            .collect::<Vec<_>>();
        if !non_numeric.is_empty() {
            return Err(McdaError::invalid_input(format!(
                "pareto objectives must be numeric; categorical: {}",
                non_numeric.join(", ")
            )));
        }

        let raw = (0..dataset.n_records())
            .map(|r| {
                columns
                    .iter()
                    .map(|&c| dataset.value(r, c).and_then(|v| v.as_f64()).unwrap_or(0.0))
                    .collect::<Vec<f64>>()
            })
            .collect::<Vec<_>>();
        let oriented = raw
            .iter()
            .map(|row| {
                row.iter()
                    .zip(&resolved)
                    .map(|(&v, dir)| dir.orient(v))
                    .collect::<Vec<f64>>()
            })
            .collect::<Vec<_>>();

        let members = non_dominated_indices(&oriented);
        ctx.report_progress(0.5);
        let ranks = non_dominated_ranks(&oriented);

        let values = members.iter().map(|&m| raw[m].clone()).collect::<Vec<_>>();
        let front_oriented = members
            .iter()
            .map(|&m| oriented[m].clone())
            .collect::<Vec<_>>();
        let normalized = normalize_columns(&front_oriented);
        let reference_point = vec![-self.config.reference_offset; columns.len()];
        let hypervolume_method = self.config.hypervolume_method(columns.len());

        let metrics = ParetoMetrics {
            front_size: members.len(),
            record_count: dataset.n_records(),
            hypervolume: hypervolume_method.compute(&normalized, &reference_point),
            hypervolume_method,
            reference_point,
            spacing: spacing(&normalized),
            extent: extent(&values),
        };

        let n = dataset.n_records();
        let runtime_ms = u64::try_from(started_at.elapsed().as_millis()).unwrap_or(u64::MAX);
        info!(
            records = n,
            objectives = columns.len(),
            front_size = metrics.front_size,
            hypervolume = metrics.hypervolume,
            hypervolume_method = hypervolume_method.as_str(),
            runtime_ms,
            "pareto analysis complete"
        );
        ctx.report_progress(1.0);

        let mut warnings = vec![];
        if let HypervolumeMethod::MonteCarlo { samples, seed } = hypervolume_method {
            warnings.push(format!(
                "hypervolume over {} objectives is a monte carlo estimate \
                 ({samples} samples, seed {seed}); exact above {} objective(s) is disabled",
                columns.len(),
                self.config.exact_hypervolume_max_objectives
            ));
        }

        let diagnostics = Diagnostics {
            n,
            d: columns.len(),
            runtime_ms: Some(runtime_ms),
            notes: vec![
                format!(
                    "objectives: {}",
                    objectives
                        .names()
                        .iter()
                        .zip(&resolved)
                        .map(|(name, dir)| format!("{name} ({dir})"))
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
                format!("hypervolume_method={}", hypervolume_method.as_str()),
            ],
            warnings,
            algorithm: Cow::Borrowed("pareto_front"),
            estimator: Cow::Borrowed("pairwise_dominance"),
            repro_mode: ctx.repro_mode,
            thread_count: Some(1),
            #[cfg(feature = "serde")]
            params_json: serde_json::to_value(self.config).ok(),
            evaluation_stats: Some(EvaluationStats {
                evaluations: n.saturating_mul(n.saturating_sub(1)),
                skipped: 0,
            }),
            ..Diagnostics::default()
        };

        Ok(ParetoResult {
            front: ParetoFront {
                objectives: objectives.clone(),
                directions: resolved,
                labels: members
                    .iter()
                    .map(|&m| dataset.labels()[m].clone())
                    .collect(),
                members,
                values,
                normalized,
                ranks,
            },
            metrics,
            diagnostics,
        })
    }
}

/// Pareto front of `dataset` over `objectives` with default settings.
pub fn pareto_front(
    dataset: &Dataset,
    objectives: &FeatureSubset,
    directions: &ObjectiveDirections,
) -> Result<(ParetoFront, ParetoMetrics), McdaError> {
    let result = ParetoAnalyzer::default().analyze(
        dataset,
        objectives,
        directions,
        &ExecutionContext::new(),
    )?;
    Ok((result.front, result.metrics))
}
