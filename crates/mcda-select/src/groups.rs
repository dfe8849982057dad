// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::space::{AttributeSpace, Metric};
use mcda_cluster::{CutPolicy, Linkage, build_consensus_tree};
use mcda_core::{AttributeKind, Dataset, McdaError};
use std::collections::{BTreeMap, HashMap};

/// Where the grouping used for scoring came from.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GroupSource {
    Provided,
    Computed,
}

/// Relabels arbitrary group ids to `0..count` in order of first appearance.
pub fn dense_groups(groups: &[usize]) -> (Vec<usize>, usize) {
    let mut ids = HashMap::new();
    let dense = groups
        .iter()
        .map(|g| {
            let next = ids.len();
            *ids.entry(*g).or_insert(next)
        })
        .collect();
    (dense, ids.len())
}

/// Groups from clustering the records on every attribute (standardized,
/// Euclidean, average linkage), cut into `min(k, n)` clusters.
pub fn default_groups(dataset: &Dataset, k: usize) -> Result<Vec<usize>, McdaError> {
    dataset.require_records(2, "default grouping")?;
    let attributes = (0..dataset.n_attributes()).collect::<Vec<_>>();
    let matrix = AttributeSpace::new(dataset, &attributes)?.distance_matrix(Metric::Euclidean)?;
    let clusters = k.clamp(1, dataset.n_records());
    let (_, assignment) =
        build_consensus_tree(&matrix, Linkage::Average, CutPolicy::ClusterCount(clusters))?;
    Ok(assignment.labels)
}

/// Per-group summary of one attribute.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
#[derive(Clone, Debug, PartialEq)]
pub enum DispersionSummary {
    Numeric {
        count: usize,
        mean: f64,
        /// Sample standard deviation; `None` below two values.
        std: Option<f64>,
        /// `std / mean * 100`; `None` when the mean is zero.
        coefficient_of_variation: Option<f64>,
        median: f64,
        q1: f64,
        q3: f64,
    },
    Categorical {
        count: usize,
        mode: String,
        mode_frequency: usize,
        categories: usize,
    },
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct GroupDispersion {
    /// Group label as supplied by the caller.
    pub group: usize,
    pub attribute: String,
    pub summary: DispersionSummary,
}

/// Linear-interpolated quantile of sorted values.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = (sorted.len() - 1) as f64 * q;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

fn numeric_summary(mut values: Vec<f64>) -> DispersionSummary {
    let count = values.len();
    let mean = values.iter().sum::<f64>() / count as f64;
    let std = (count >= 2).then(|| {
        let ss = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>();
        (ss / (count - 1) as f64).sqrt()
    });
    let coefficient_of_variation = std.filter(|_| mean != 0.0).map(|s| s / mean * 100.0);
    values.sort_by(f64::total_cmp);
    DispersionSummary::Numeric {
        count,
        mean,
        std,
        coefficient_of_variation,
        median: quantile(&values, 0.5),
        q1: quantile(&values, 0.25),
        q3: quantile(&values, 0.75),
    }
}

fn categorical_summary(values: Vec<String>) -> DispersionSummary {
    let count = values.len();
    let mut counts = BTreeMap::<String, usize>::new();
    for value in values {
        *counts.entry(value).or_insert(0) += 1;
    }
    // BTreeMap order makes ties resolve to the smallest category.
    let (mode, mode_frequency) = counts
        .iter()
        .fold((String::new(), 0usize), |(best, best_count), (value, &c)| {
            if c > best_count {
                (value.clone(), c)
            } else {
                (best, best_count)
            }
        });
    DispersionSummary::Categorical {
        count,
        mode,
        mode_frequency,
        categories: counts.len(),
    }
}

/// Summaries for every group (in order of first appearance) and attribute.
pub fn group_dispersion(
    dataset: &Dataset,
    groups: &[usize],
) -> Result<Vec<GroupDispersion>, McdaError> {
    if groups.len() != dataset.n_records() {
        return Err(McdaError::invalid_input(format!(
            "expected {} group label(s); got {}",
            dataset.n_records(),
            groups.len()
        )));
    }

    let mut order = Vec::<usize>::new();
    let mut members = HashMap::<usize, Vec<usize>>::new();
    for (record, &group) in groups.iter().enumerate() {
        members
            .entry(group)
            .or_insert_with(|| {
                order.push(group);
                Vec::new()
            })
            .push(record);
    }

    let kinds = (0..dataset.n_attributes())
        .map(|a| dataset.attribute_kind(a))
        .collect::<Vec<_>>();

    let mut out = Vec::with_capacity(order.len() * dataset.n_attributes());
    for group in order {
        let records = &members[&group];
        for (attribute, name) in dataset.attributes().iter().enumerate() {
            let cells = records
                .iter()
                .filter_map(|&r| dataset.value(r, attribute));
            let summary = match kinds[attribute] {
                AttributeKind::Numeric => {
                    numeric_summary(cells.filter_map(|v| v.as_f64()).collect())
                }
                AttributeKind::Categorical => {
                    categorical_summary(cells.map(|v| v.to_string()).collect())
                }
            };
            out.push(GroupDispersion {
                group,
                attribute: name.clone(),
                summary,
            });
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::{DispersionSummary, default_groups, dense_groups, group_dispersion};
    use mcda_core::{Dataset, Value};

    #[test]
    fn dense_groups_follow_first_appearance() {
        assert_eq!(dense_groups(&[7, 3, 7, 9]), (vec![0, 1, 0, 2], 3));
        assert_eq!(dense_groups(&[]), (vec![], 0));
    }

    #[test]
    fn default_groups_split_obvious_clusters() {
        let dataset = Dataset::from_numeric_rows(
            vec!["x", "y"],
            vec![
                vec![0.0, 0.0],
                vec![0.1, 0.2],
                vec![10.0, 10.0],
                vec![10.2, 9.9],
            ],
        )
        .expect("dataset");
        assert_eq!(default_groups(&dataset, 2).expect("groups"), vec![0, 0, 1, 1]);
        assert_eq!(default_groups(&dataset, 8).expect("groups"), vec![0, 1, 2, 3]);
    }

    #[test]
    fn numeric_summary_matches_hand_values() {
        let dataset = Dataset::from_numeric_rows(
            vec!["x"],
            vec![vec![1.0], vec![2.0], vec![3.0], vec![4.0], vec![50.0]],
        )
        .expect("dataset");
        let report = group_dispersion(&dataset, &[5, 5, 5, 5, 9]).expect("report");
        assert_eq!(report.len(), 2);
        assert_eq!(report[0].group, 5);
        match &report[0].summary {
            DispersionSummary::Numeric {
                count,
                mean,
                median,
                q1,
                q3,
                std,
                coefficient_of_variation,
            } => {
                assert_eq!(*count, 4);
                assert_eq!(*mean, 2.5);
                assert_eq!(*median, 2.5);
                assert_eq!(*q1, 1.75);
                assert_eq!(*q3, 3.25);
                let s = std.expect("four values have a std");
                assert!((s - (5.0f64 / 3.0).sqrt()).abs() < 1e-12);
                assert!((coefficient_of_variation.expect("mean != 0") - s / 2.5 * 100.0).abs() < 1e-9);
            }
            other => panic!("expected numeric summary, got {other:?}"),
        }
        match &report[1].summary {
            DispersionSummary::Numeric { count, std, .. } => {
                assert_eq!(*count, 1);
                assert_eq!(*std, None);
            }
            other => panic!("expected numeric summary, got {other:?}"),
        }
    }

    #[test]
    fn categorical_summary_reports_mode() {
        let dataset = Dataset::new(
            vec!["c".to_string()],
            vec![
                vec![Value::from("b")],
                vec![Value::from("a")],
                vec![Value::from("b")],
                vec![Value::from("a")],
                vec![Value::from("c")],
            ],
        )
        .expect("dataset");
        let report = group_dispersion(&dataset, &[0, 0, 0, 0, 0]).expect("report");
        assert_eq!(
            report[0].summary,
            DispersionSummary::Categorical {
                count: 5,
                mode: "a".to_string(),
                mode_frequency: 2,
                categories: 3,
            }
        );
    }

    #[test]
    fn group_length_must_match() {
        let dataset = Dataset::from_numeric_rows(vec!["x"], vec![vec![1.0]]).expect("dataset");
        assert!(group_dispersion(&dataset, &[0, 1]).is_err());
    }
}
