// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use mcda_core::{Dataset, DistanceMatrix, McdaError};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Record distance over a restricted attribute space.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Metric {
    #[default]
    Euclidean,
    Manhattan,
}

impl Metric {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Euclidean => "euclidean",
            Self::Manhattan => "manhattan",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = McdaError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "euclidean" => Ok(Self::Euclidean),
            "manhattan" | "cityblock" => Ok(Self::Manhattan),
            other => Err(McdaError::invalid_input(format!(
                "unknown metric '{other}'; expected euclidean or manhattan"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
enum Column {
    /// z-scores; all zero for a constant column.
    Numeric(Vec<f64>),
    /// Category codes; mismatches count as distance 1.
    Categorical(Vec<usize>),
}

impl Column {
    fn gap(&self, i: usize, j: usize) -> f64 {
        match self {
            Self::Numeric(z) => (z[i] - z[j]).abs(),
            Self::Categorical(codes) => {
                if codes[i] == codes[j] {
                    0.0
                } else {
                    1.0
                }
            }
        }
    }
}

/// Standardized view of a subset of attributes.
#[derive(Clone, Debug, PartialEq)]
pub struct AttributeSpace {
    n: usize,
    columns: Vec<Column>,
}

impl AttributeSpace {
    pub fn new(dataset: &Dataset, attributes: &[usize]) -> Result<Self, McdaError> {
        if attributes.is_empty() {
            return Err(McdaError::invalid_input(
                "attribute space needs at least one attribute",
            ));
        }
        let n = dataset.n_records();
        let mut columns = Vec::with_capacity(attributes.len());
        for &attribute in attributes {
            if attribute >= dataset.n_attributes() {
                return Err(McdaError::invalid_input(format!(
                    "attribute index {attribute} out of bounds for {} attribute(s)",
                    dataset.n_attributes()
                )));
            }
            let column = match dataset.numeric_column(attribute) {
                Some(values) => Column::Numeric(z_scores(&values)),
                None => {
                    let mut codes = HashMap::new();
                    Column::Categorical(
                        dataset
                            .column(attribute)
                            .into_iter()
                            .map(|value| {
                                let next = codes.len();
                                *codes.entry(value.to_string()).or_insert(next)
                            })
                            .collect(),
                    )
                }
            };
            columns.push(column);
        }
        Ok(Self { n, columns })
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn distance(&self, i: usize, j: usize, metric: Metric) -> f64 {
        match metric {
            Metric::Euclidean => self
                .columns
                .iter()
                .map(|c| c.gap(i, j).powi(2))
                .sum::<f64>()
                .sqrt(),
            Metric::Manhattan => self.columns.iter().map(|c| c.gap(i, j)).sum(),
        }
    }

    pub fn distance_matrix(&self, metric: Metric) -> Result<DistanceMatrix, McdaError> {
        let upper = (0..self.n)
            .map(|i| {
                (i + 1..self.n)
                    .map(|j| self.distance(i, j, metric))
                    .collect()
            })
            .collect();
        DistanceMatrix::from_upper_rows(self.n, upper)
    }
}

fn z_scores(values: &[f64]) -> Vec<f64> {
    let n = values.len() as f64;
    if values.is_empty() {
        return vec![];
    }
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let std = var.sqrt();
    if std <= 0.0 || !std.is_finite() {
        return vec![0.0; values.len()];
    }
    values.iter().map(|v| (v - mean) / std).collect()
}

#[cfg(test)]
mod tests {
    use super::{AttributeSpace, Metric};
    use mcda_core::{Dataset, Value};

    fn mixed() -> Dataset {
        Dataset::new(
            vec!["x".to_string(), "kind".to_string(), "flat".to_string()],
            vec![
                vec![Value::from(0.0), Value::from("a"), Value::from(7.0)],
                vec![Value::from(2.0), Value::from("b"), Value::from(7.0)],
            ],
        )
        .expect("dataset")
    }

    #[test]
    fn numeric_gaps_use_z_scores_and_categoricals_count_mismatches() {
        let dataset = mixed();
        let space = AttributeSpace::new(&dataset, &[0, 1, 2]).expect("space");
        // z-scores of [0, 2] are [-1, 1]; gap 2. Category mismatch adds 1.
        assert_eq!(space.distance(0, 1, Metric::Manhattan), 3.0);
        assert_eq!(space.distance(0, 1, Metric::Euclidean), 5.0f64.sqrt());
        assert_eq!(space.distance(1, 1, Metric::Euclidean), 0.0);
    }

    #[test]
    fn matrix_over_single_attribute() {
        let dataset = mixed();
        let space = AttributeSpace::new(&dataset, &[2]).expect("space");
        let matrix = space.distance_matrix(Metric::Euclidean).expect("matrix");
        assert_eq!(matrix.get(0, 1), 0.0);
    }

    #[test]
    fn rejects_empty_or_unknown_attributes() {
        let dataset = mixed();
        assert!(AttributeSpace::new(&dataset, &[]).is_err());
        assert!(AttributeSpace::new(&dataset, &[3]).is_err());
    }

    #[test]
    fn parses_metric_names() {
        assert_eq!("Euclidean".parse::<Metric>(), Ok(Metric::Euclidean));
        assert_eq!("cityblock".parse::<Metric>(), Ok(Metric::Manhattan));
        assert!("cosine".parse::<Metric>().is_err());
    }
}
