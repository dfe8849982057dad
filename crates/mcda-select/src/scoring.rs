// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use mcda_core::{Dataset, McdaError, Value};
use std::collections::BTreeMap;

/// Lower bound applied to a within-group sum before dividing by it.
pub const WITHIN_FLOOR: f64 = 1e-12;

/// Between-group and within-group sums of squares for one attribute.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Dispersion {
    pub between: f64,
    pub within: f64,
}

impl Dispersion {
    pub fn ratio(self) -> f64 {
        self.between / self.within.max(WITHIN_FLOOR)
    }
}

/// Scores how well attributes separate a fixed grouping of the records.
///
/// `groups` holds dense group ids `0..group_count`, one per record.
pub trait DispersionScorer: Send + Sync {
    fn name(&self) -> &'static str;

    fn attribute_dispersion(
        &self,
        dataset: &Dataset,
        attribute: usize,
        groups: &[usize],
        group_count: usize,
    ) -> Result<Dispersion, McdaError>;

    /// Score of a combination: summed between over summed within.
    fn combine(&self, parts: &[Dispersion]) -> f64 {
        let between = parts.iter().map(|p| p.between).sum::<f64>();
        let within = parts.iter().map(|p| p.within).sum::<f64>();
        between / within.max(WITHIN_FLOOR)
    }
}

/// Variance decomposition on standardized attributes.
///
/// Numeric attributes are z-scored and split into between/within sums of
/// squares. Categorical attributes use the Gini decomposition of their
/// one-hot indicators. Both are rescaled so between + within equals the
/// record count, which weights every non-constant attribute equally.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VarianceRatio;

impl VarianceRatio {
    fn numeric(values: &[f64], groups: &[usize], group_count: usize) -> Dispersion {
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let total = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>();
        if total <= 0.0 {
            return Dispersion::default();
        }

        let mut sums = vec![0.0; group_count];
        let mut counts = vec![0usize; group_count];
        for (&v, &g) in values.iter().zip(groups) {
            sums[g] += v;
            counts[g] += 1;
        }
        let group_means = sums
            .iter()
            .zip(&counts)
            .map(|(s, &c)| if c == 0 { 0.0 } else { s / c as f64 })
            .collect::<Vec<_>>();

        let between = counts
            .iter()
            .zip(&group_means)
            .map(|(&c, gm)| c as f64 * (gm - mean).powi(2))
            .sum::<f64>();
        let within = values
            .iter()
            .zip(groups)
            .map(|(v, &g)| (v - group_means[g]).powi(2))
            .sum::<f64>();

        let scale = n / total;
        Dispersion {
            between: between * scale,
            within: within * scale,
        }
    }

    fn categorical(values: &[&Value], groups: &[usize], group_count: usize) -> Dispersion {
        let n = values.len() as f64;
        let mut codes = BTreeMap::<String, usize>::new();
        let mut encoded = Vec::with_capacity(values.len());
        for value in values {
            let next = codes.len();
            let code = *codes.entry(value.to_string()).or_insert(next);
            encoded.push(code);
        }
        let categories = codes.len();
        if categories < 2 {
            return Dispersion::default();
        }

        let mut overall = vec![0usize; categories];
        let mut per_group = vec![vec![0usize; categories]; group_count];
        let mut group_sizes = vec![0usize; group_count];
        for (&c, &g) in encoded.iter().zip(groups) {
            overall[c] += 1;
            per_group[g][c] += 1;
            group_sizes[g] += 1;
        }

        let total = overall
            .iter()
            .map(|&count| {
                let p = count as f64 / n;
                n * p * (1.0 - p)
            })
            .sum::<f64>();

        let mut between = 0.0;
        let mut within = 0.0;
        for (counts, &size) in per_group.iter().zip(&group_sizes) {
            if size == 0 {
                continue;
            }
            let size = size as f64;
            for (&count, &all) in counts.iter().zip(&overall) {
                let p_group = count as f64 / size;
                let p_all = all as f64 / n;
                between += size * (p_group - p_all).powi(2);
                within += size * p_group * (1.0 - p_group);
            }
        }

        let scale = n / total;
        Dispersion {
            between: between * scale,
            within: within * scale,
        }
    }
}

impl DispersionScorer for VarianceRatio {
    fn name(&self) -> &'static str {
        "variance_ratio"
    }

    fn attribute_dispersion(
        &self,
        dataset: &Dataset,
        attribute: usize,
        groups: &[usize],
        group_count: usize,
    ) -> Result<Dispersion, McdaError> {
        if groups.len() != dataset.n_records() {
            return Err(McdaError::invalid_input(format!(
                "expected {} group label(s); got {}",
                dataset.n_records(),
                groups.len()
            )));
        }
        if let Some(&bad) = groups.iter().find(|&&g| g >= group_count) {
            return Err(McdaError::invalid_input(format!(
                "group id {bad} out of range for {group_count} group(s)"
            )));
        }
        if dataset.n_records() == 0 {
            return Ok(Dispersion::default());
        }

        let dispersion = match dataset.numeric_column(attribute) {
            Some(values) => Self::numeric(&values, groups, group_count),
            None => Self::categorical(&dataset.column(attribute), groups, group_count),
        };
        if !dispersion.between.is_finite() || !dispersion.within.is_finite() {
            return Err(McdaError::numerical_issue(format!(
                "non-finite dispersion for attribute '{}': between={}, within={}",
                dataset.attributes()[attribute],
                dispersion.between,
                dispersion.within
            )));
        }
        Ok(dispersion)
    }
}

#[cfg(test)]
mod tests {
    use super::{Dispersion, DispersionScorer, VarianceRatio, WITHIN_FLOOR};
    use mcda_core::{Dataset, Value};

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn numeric_decomposition_sums_to_record_count() {
        let dataset = Dataset::from_numeric_rows(
            vec!["x"],
            vec![vec![1.0], vec![2.0], vec![3.0], vec![10.0], vec![11.0], vec![12.0]],
        )
        .expect("dataset");
        let groups = [0, 0, 0, 1, 1, 1];
        let d = VarianceRatio
            .attribute_dispersion(&dataset, 0, &groups, 2)
            .expect("dispersion");
        assert!(close(d.between + d.within, 6.0));
        // raw: between = 6 * 4.5^2 = 121.5, within = 4, total = 125.5
        assert!(close(d.between, 121.5 * 6.0 / 125.5));
        assert!(close(d.ratio(), 121.5 / 4.0));
    }

    #[test]
    fn constant_column_contributes_nothing() {
        let dataset =
            Dataset::from_numeric_rows(vec!["x"], vec![vec![5.0], vec![5.0], vec![5.0]])
                .expect("dataset");
        let d = VarianceRatio
            .attribute_dispersion(&dataset, 0, &[0, 1, 1], 2)
            .expect("dispersion");
        assert_eq!(d, Dispersion::default());
        assert_eq!(d.ratio(), 0.0);
    }

    #[test]
    fn categorical_perfect_split_has_no_within_dispersion() {
        let dataset = Dataset::new(
            vec!["color".to_string()],
            vec![
                vec![Value::from("red")],
                vec![Value::from("red")],
                vec![Value::from("blue")],
                vec![Value::from("blue")],
            ],
        )
        .expect("dataset");
        let d = VarianceRatio
            .attribute_dispersion(&dataset, 0, &[0, 0, 1, 1], 2)
            .expect("dispersion");
        assert!(close(d.between, 4.0));
        assert!(close(d.within, 0.0));
        assert!(d.ratio() > 1.0 / WITHIN_FLOOR / 2.0);
    }

    #[test]
    fn categorical_unrelated_to_groups_has_no_between_dispersion() {
        let dataset = Dataset::new(
            vec!["color".to_string()],
            vec![
                vec![Value::from("red")],
                vec![Value::from("blue")],
                vec![Value::from("red")],
                vec![Value::from("blue")],
            ],
        )
        .expect("dataset");
        let d = VarianceRatio
            .attribute_dispersion(&dataset, 0, &[0, 0, 1, 1], 2)
            .expect("dispersion");
        assert!(close(d.between, 0.0));
        assert!(close(d.within, 4.0));
    }

    #[test]
    fn combine_uses_trace_ratio() {
        let parts = [
            Dispersion {
                between: 3.0,
                within: 1.0,
            },
            Dispersion {
                between: 1.0,
                within: 3.0,
            },
        ];
        assert_eq!(VarianceRatio.combine(&parts), 1.0);
        assert_eq!(VarianceRatio.combine(&[]), 0.0);
    }

    #[test]
    fn group_labels_are_checked() {
        let dataset =
            Dataset::from_numeric_rows(vec!["x"], vec![vec![1.0], vec![2.0]]).expect("dataset");
        assert!(VarianceRatio.attribute_dispersion(&dataset, 0, &[0], 1).is_err());
        assert!(VarianceRatio.attribute_dispersion(&dataset, 0, &[0, 2], 2).is_err());
    }
}
