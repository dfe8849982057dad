// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::estimator::ComplexityEstimator;
use crate::serialize::{serialize_numeric_column, serialize_records};
use crate::zlib::ZlibEstimator;
use mcda_core::{
    Dataset, Diagnostics, DistanceMatrix, EvaluationStats, ExecutionContext, McdaError,
};
#[cfg(feature = "rayon")]
use rayon::prelude::*;
use std::borrow::Cow;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;
use tracing::{debug, info};

/// How the joint complexity of a pair is obtained.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConcatOrder {
    /// `C(x ++ y)` with `x` the lower record index.
    #[default]
    Forward,
    /// `min(C(x ++ y), C(y ++ x))`, two estimator calls per pair.
    Symmetric,
}

/// Configuration for [`NcdMatrixBuilder`].
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NcdConfig {
    pub concat_order: ConcatOrder,
    /// Upper bound on `n*(n-1)/2` pair evaluations; `None` is unbounded.
    pub max_pairs: Option<usize>,
}

impl NcdConfig {
    pub fn validate(&self) -> Result<(), McdaError> {
        if self.max_pairs == Some(0) {
            return Err(McdaError::invalid_input(
                "NcdConfig.max_pairs must be >= 1 when set; got 0",
            ));
        }
        Ok(())
    }
}

/// `(C(xy) - min(C(x), C(y))) / max(C(x), C(y))`, clamped to `[0, 1]`.
///
/// Returns `None` when both complexities are zero.
pub fn normalized_compression_distance(cx: usize, cy: usize, cxy: usize) -> Option<f64> {
    let hi = cx.max(cy);
    if hi == 0 {
        return None;
    }
    let lo = cx.min(cy);
    let value = cxy.saturating_sub(lo) as f64 / hi as f64;
    Some(value.min(1.0))
}

/// Record-by-record NCD matrix plus the single-record complexities it used.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct NcdResult {
    pub matrix: DistanceMatrix,
    pub complexities: Vec<usize>,
    pub diagnostics: Diagnostics,
}

/// Attribute-by-attribute NCD matrix over numeric column serializations.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct AttributeNcdResult {
    /// Attributes in matrix order.
    pub attributes: Vec<String>,
    /// Attributes left out for having fewer than two numeric cells.
    pub skipped: Vec<String>,
    pub matrix: DistanceMatrix,
    pub complexities: Vec<usize>,
    pub diagnostics: Diagnostics,
}

#[derive(Debug)]
pub struct NcdMatrixBuilder<E: ComplexityEstimator> {
    estimator: E,
    config: NcdConfig,
}

struct RowOutput {
    values: Vec<f64>,
    stats: EvaluationStats,
}

impl<E: ComplexityEstimator> NcdMatrixBuilder<E> {
    pub fn new(estimator: E, config: NcdConfig) -> Result<Self, McdaError> {
        config.validate()?;
        Ok(Self { estimator, config })
    }

    pub fn estimator(&self) -> &E {
        &self.estimator
    }

    pub fn config(&self) -> &NcdConfig {
        &self.config
    }

    /// Pairwise NCD between records, each serialized canonically.
    pub fn build(
        &self,
        dataset: &Dataset,
        ctx: &ExecutionContext<'_>,
    ) -> Result<NcdResult, McdaError> {
        dataset.require_records(2, "NCD matrix")?;
        let payloads = serialize_records(dataset);
        let mut result = self.build_from_bytes(&payloads, ctx)?;
        result.diagnostics.d = dataset.n_attributes();
        Ok(result)
    }

    /// Pairwise NCD between attribute columns.
    pub fn build_attribute_matrix(
        &self,
        dataset: &Dataset,
        ctx: &ExecutionContext<'_>,
    ) -> Result<AttributeNcdResult, McdaError> {
        let mut attributes = Vec::new();
        let mut skipped = Vec::new();
        let mut payloads = Vec::new();
        for (idx, name) in dataset.attributes().iter().enumerate() {
            match serialize_numeric_column(dataset, idx) {
                Some(bytes) => {
                    attributes.push(name.clone());
                    payloads.push(bytes);
                }
                None => skipped.push(name.clone()),
            }
        }
        if attributes.len() < 2 {
            return Err(McdaError::insufficient_data(format!(
                "attribute NCD matrix requires at least 2 attributes with two or more numeric values; got {}",
                attributes.len()
            )));
        }

        let mut result = self.build_from_bytes(&payloads, ctx)?;
        result.diagnostics.algorithm = Cow::Borrowed("ncd_attribute_matrix");
        result.diagnostics.d = dataset.n_records();
        if !skipped.is_empty() {
            result.diagnostics.warnings.push(format!(
                "skipped {} attribute(s) with fewer than two numeric values: {}",
                skipped.len(),
                skipped.join(", ")
            ));
        }

        Ok(AttributeNcdResult {
            attributes,
            skipped,
            matrix: result.matrix,
            complexities: result.complexities,
            diagnostics: result.diagnostics,
        })
    }

    /// Pairwise NCD between arbitrary byte strings.
    pub fn build_from_bytes(
        &self,
        payloads: &[Vec<u8>],
        ctx: &ExecutionContext<'_>,
    ) -> Result<NcdResult, McdaError> {
        let started_at = Instant::now();
        let n = payloads.len();
        if n < 2 {
            return Err(McdaError::insufficient_data(format!(
                "NCD matrix requires at least 2 items; got {n}"
            )));
        }

        let pair_count = n * (n - 1) / 2;
        if let Some(max_pairs) = self.config.max_pairs
            && pair_count > max_pairs
        {
            return Err(McdaError::invalid_input(format!(
                "NCD matrix needs {pair_count} pair evaluations, above max_pairs={max_pairs}"
            )));
        }

        let complexities = self.single_complexities(payloads, ctx)?;
        let degenerate = complexities
            .iter()
            .enumerate()
            .filter(|(_, c)| **c == 0)
            .map(|(idx, _)| idx)
            .collect::<Vec<_>>();
        if !degenerate.is_empty() {
            return Err(McdaError::degenerate_input(degenerate));
        }

        let rows = self.upper_rows(payloads, &complexities, ctx)?;
        let mut stats = EvaluationStats {
            evaluations: n,
            skipped: 0,
        };
        let mut upper = Vec::with_capacity(n);
        for row in rows {
            stats.evaluations += row.stats.evaluations;
            stats.skipped += row.stats.skipped;
            upper.push(row.values);
        }
        let matrix = DistanceMatrix::from_upper_rows(n, upper)?;

        let runtime_ms = u64::try_from(started_at.elapsed().as_millis()).unwrap_or(u64::MAX);
        ctx.report_progress(1.0);

        let mut notes = vec![format!(
            "pairs={pair_count}, estimator_calls={}, identical_pairs={}, concat_order={:?}",
            stats.evaluations, stats.skipped, self.config.concat_order
        )];
        if let Some(ratio) = mean_compression_ratio(payloads, &complexities) {
            notes.push(format!("mean_compression_ratio={ratio:.4}"));
        }

        info!(
            items = n,
            estimator = self.estimator.name(),
            estimator_calls = stats.evaluations,
            identical_pairs = stats.skipped,
            runtime_ms,
            "built NCD matrix"
        );

        let diagnostics = Diagnostics {
            n,
            runtime_ms: Some(runtime_ms),
            notes,
            algorithm: Cow::Borrowed("ncd_matrix"),
            estimator: Cow::Borrowed(self.estimator.name()),
            repro_mode: ctx.repro_mode,
            thread_count: Some(thread_count(ctx)),
            #[cfg(feature = "serde")]
            params_json: serde_json::to_value(self.config).ok(),
            evaluation_stats: Some(stats),
            ..Diagnostics::default()
        };

        Ok(NcdResult {
            matrix,
            complexities,
            diagnostics,
        })
    }

    fn single_complexities(
        &self,
        payloads: &[Vec<u8>],
        ctx: &ExecutionContext<'_>,
    ) -> Result<Vec<usize>, McdaError> {
        #[cfg(feature = "rayon")]
        if ctx.parallel_enabled() {
            return payloads
                .par_iter()
                .map(|bytes| self.estimator.estimate(bytes))
                .collect();
        }
        #[cfg(not(feature = "rayon"))]
        let _ = ctx;

        payloads
            .iter()
            .map(|bytes| self.estimator.estimate(bytes))
            .collect()
    }

    fn upper_rows(
        &self,
        payloads: &[Vec<u8>],
        complexities: &[usize],
        ctx: &ExecutionContext<'_>,
    ) -> Result<Vec<RowOutput>, McdaError> {
        let n = payloads.len();
        let finished = AtomicUsize::new(0);
        let task = |i: usize| -> Result<RowOutput, McdaError> {
            let row = self.upper_row(i, payloads, complexities)?;
            let done = finished.fetch_add(1, Ordering::Relaxed) + 1;
            ctx.report_progress(done as f32 / n as f32);
            Ok(row)
        };

        // Each worker owns one row of the upper triangle; collect keeps index order.
        #[cfg(feature = "rayon")]
        if ctx.parallel_enabled() {
            return (0..n).into_par_iter().map(task).collect();
        }

        (0..n).map(task).collect()
    }

    fn upper_row(
        &self,
        i: usize,
        payloads: &[Vec<u8>],
        complexities: &[usize],
    ) -> Result<RowOutput, McdaError> {
        let n = payloads.len();
        let mut values = Vec::with_capacity(n - i - 1);
        let mut stats = EvaluationStats::default();

        for j in i + 1..n {
            if payloads[i] == payloads[j] {
                debug!(i, j, "identical serializations; NCD short-circuited to 0");
                values.push(0.0);
                stats.skipped += 1;
                continue;
            }

            let cxy = match self.config.concat_order {
                ConcatOrder::Forward => {
                    stats.evaluations += 1;
                    self.estimator.estimate_concat(&payloads[i], &payloads[j])?
                }
                ConcatOrder::Symmetric => {
                    stats.evaluations += 2;
                    let forward = self.estimator.estimate_concat(&payloads[i], &payloads[j])?;
                    let backward = self.estimator.estimate_concat(&payloads[j], &payloads[i])?;
                    forward.min(backward)
                }
            };

            let value = normalized_compression_distance(complexities[i], complexities[j], cxy)
                .ok_or_else(|| McdaError::degenerate_input(vec![i, j]))?;
            values.push(value);
        }

        Ok(RowOutput { values, stats })
    }
}

fn mean_compression_ratio(payloads: &[Vec<u8>], complexities: &[usize]) -> Option<f64> {
    let ratios = payloads
        .iter()
        .zip(complexities)
        .filter(|(bytes, _)| !bytes.is_empty())
        .map(|(bytes, &c)| c as f64 / bytes.len() as f64)
        .collect::<Vec<_>>();
    if ratios.is_empty() {
        return None;
    }
    Some(ratios.iter().sum::<f64>() / ratios.len() as f64)
}

fn thread_count(ctx: &ExecutionContext<'_>) -> usize {
    #[cfg(feature = "rayon")]
    if ctx.parallel_enabled() {
        return rayon::current_num_threads();
    }
    #[cfg(not(feature = "rayon"))]
    let _ = ctx;
    1
}

/// NCD matrix over the dataset's records with the default zlib estimator.
pub fn build_distance_matrix(dataset: &Dataset) -> Result<DistanceMatrix, McdaError> {
    let builder = NcdMatrixBuilder::new(ZlibEstimator::default(), NcdConfig::default())?;
    Ok(builder.build(dataset, &ExecutionContext::default())?.matrix)
}
