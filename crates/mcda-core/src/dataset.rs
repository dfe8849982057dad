// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::McdaError;
use std::collections::{BTreeSet, HashMap};
use std::fmt;

/// A single cell value.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Numeric(f64),
    Categorical(String),
}

impl Value {
    /// Parses a raw text cell: finite numbers become `Numeric`, anything else `Categorical`.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.parse::<f64>() {
            Ok(v) if v.is_finite() => Self::Numeric(v),
            _ => Self::Categorical(trimmed.to_string()),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Numeric(v) => Some(*v),
            Self::Categorical(_) => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Numeric(_))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(v) => write!(f, "{v}"),
            Self::Categorical(s) => f.write_str(s),
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Numeric(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Categorical(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Categorical(value)
    }
}

/// Attribute type inferred from its column: numeric only when every cell is numeric.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttributeKind {
    Numeric,
    Categorical,
}

/// Ordered, schema-validated table of records.
///
/// Every record carries exactly one value per attribute, aligned with
/// [`Dataset::attributes`]. Attribute order is fixed at construction.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(try_from = "DatasetParts", into = "DatasetParts")
)]
#[derive(Clone, Debug, PartialEq)]
pub struct Dataset {
    attributes: Vec<String>,
    records: Vec<Vec<Value>>,
    labels: Vec<String>,
}

/// Wire form of [`Dataset`]; deserialization re-runs validation.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct DatasetParts {
    pub attributes: Vec<String>,
    pub records: Vec<Vec<Value>>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub labels: Option<Vec<String>>,
}

impl TryFrom<DatasetParts> for Dataset {
    type Error = McdaError;

    fn try_from(parts: DatasetParts) -> Result<Self, Self::Error> {
        let dataset = Dataset::new(parts.attributes, parts.records)?;
        match parts.labels {
            Some(labels) => dataset.with_labels(labels),
            None => Ok(dataset),
        }
    }
}

impl From<Dataset> for DatasetParts {
    fn from(dataset: Dataset) -> Self {
        Self {
            attributes: dataset.attributes,
            records: dataset.records,
            labels: Some(dataset.labels),
        }
    }
}

impl Dataset {
    /// Builds a dataset from an attribute list and row-aligned values.
    pub fn new(attributes: Vec<String>, records: Vec<Vec<Value>>) -> Result<Self, McdaError> {
        validate_attribute_names(&attributes)?;

        for (idx, record) in records.iter().enumerate() {
            if record.len() != attributes.len() {
                return Err(McdaError::inconsistent_schema(
                    idx,
                    format!(
                        "expected {} value(s), got {}",
                        attributes.len(),
                        record.len()
                    ),
                ));
            }
            if let Some((col, value)) = record
                .iter()
                .enumerate()
                .find(|(_, v)| matches!(v, Value::Numeric(x) if !x.is_finite()))
            {
                return Err(McdaError::invalid_input(format!(
                    "record {idx}, attribute '{}' holds non-finite value {value}",
                    attributes[col]
                )));
            }
        }

        let labels = (0..records.len()).map(|idx| idx.to_string()).collect();
        Ok(Self {
            attributes,
            records,
            labels,
        })
    }

    /// Builds a dataset from name/value records.
    ///
    /// Attribute order is taken from the first record; every other record must
    /// carry exactly the same attribute set, in any order.
    pub fn from_records<S: Into<String>>(
        records: Vec<Vec<(S, Value)>>,
    ) -> Result<Self, McdaError> {
        let mut records = records.into_iter().map(|record| {
            record
                .into_iter()
                .map(|(name, value)| (name.into(), value))
                .collect::<Vec<(String, Value)>>()
        });

        let Some(first) = records.next() else {
            return Self::new(vec![], vec![]);
        };

        let (attributes, first_values): (Vec<String>, Vec<Value>) = first.into_iter().unzip();
        let mut position = HashMap::with_capacity(attributes.len());
        for (col, name) in attributes.iter().enumerate() {
            if position.insert(name.clone(), col).is_some() {
                return Err(McdaError::inconsistent_schema(
                    0,
                    format!("duplicate attribute '{name}'"),
                ));
            }
        }

        let mut rows = vec![first_values];
        for (offset, record) in records.enumerate() {
            let idx = offset + 1;
            let mut row: Vec<Option<Value>> = vec![None; attributes.len()];
            for (name, value) in record {
                let Some(&col) = position.get(&name) else {
                    return Err(McdaError::inconsistent_schema(
                        idx,
                        format!("unexpected attribute '{name}'"),
                    ));
                };
                if row[col].replace(value).is_some() {
                    return Err(McdaError::inconsistent_schema(
                        idx,
                        format!("duplicate attribute '{name}'"),
                    ));
                }
            }
            let row = row
                .into_iter()
                .enumerate()
                .map(|(col, value)| {
                    value.ok_or_else(|| {
                        McdaError::inconsistent_schema(
                            idx,
                            format!("missing attribute '{}'", attributes[col]),
                        )
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            rows.push(row);
        }

        Self::new(attributes, rows)
    }

    /// Convenience constructor for all-numeric data.
    pub fn from_numeric_rows<S: Into<String>>(
        attributes: Vec<S>,
        rows: Vec<Vec<f64>>,
    ) -> Result<Self, McdaError> {
        Self::new(
            attributes.into_iter().map(Into::into).collect(),
            rows.into_iter()
                .map(|row| row.into_iter().map(Value::Numeric).collect())
                .collect(),
        )
    }

    /// Replaces the default index labels with caller-provided record labels.
    pub fn with_labels(mut self, labels: Vec<String>) -> Result<Self, McdaError> {
        if labels.len() != self.records.len() {
            return Err(McdaError::invalid_input(format!(
                "label count mismatch: got {}, expected {}",
                labels.len(),
                self.records.len()
            )));
        }
        self.labels = labels;
        Ok(self)
    }

    pub fn n_records(&self) -> usize {
        self.records.len()
    }

    pub fn n_attributes(&self) -> usize {
        self.attributes.len()
    }

    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn records(&self) -> &[Vec<Value>] {
        &self.records
    }

    pub fn record(&self, idx: usize) -> Option<&[Value]> {
        self.records.get(idx).map(Vec::as_slice)
    }

    pub fn value(&self, record: usize, attribute: usize) -> Option<&Value> {
        self.records.get(record).and_then(|row| row.get(attribute))
    }

    pub fn attribute_index(&self, name: &str) -> Option<usize> {
        self.attributes.iter().position(|attr| attr == name)
    }

    /// Resolves attribute names to column indices, rejecting unknown names.
    pub fn attribute_indices<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<usize>, McdaError> {
        names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                self.attribute_index(name).ok_or_else(|| {
                    McdaError::invalid_input(format!("unknown attribute '{name}'"))
                })
            })
            .collect()
    }

    pub fn attribute_kind(&self, attribute: usize) -> AttributeKind {
        if self.records.iter().all(|row| row[attribute].is_numeric()) {
            AttributeKind::Numeric
        } else {
            AttributeKind::Categorical
        }
    }

    /// Returns the column as `f64` when the attribute is numeric.
    pub fn numeric_column(&self, attribute: usize) -> Option<Vec<f64>> {
        self.records
            .iter()
            .map(|row| row.get(attribute).and_then(Value::as_f64))
            .collect()
    }

    pub fn column(&self, attribute: usize) -> Vec<&Value> {
        self.records.iter().map(|row| &row[attribute]).collect()
    }

    /// Fails with `InsufficientData` when fewer than `min` records are present.
    pub fn require_records(&self, min: usize, stage: &str) -> Result<(), McdaError> {
        if self.records.len() < min {
            return Err(McdaError::insufficient_data(format!(
                "{stage} requires at least {min} record(s); got {}",
                self.records.len()
            )));
        }
        Ok(())
    }

    /// Restricts the dataset to the named attributes, in the given order.
    pub fn project<S: AsRef<str>>(&self, names: &[S]) -> Result<Self, McdaError> {
        let cols = self.attribute_indices(names)?;
        let unique = cols.iter().collect::<BTreeSet<_>>();
        if unique.len() != cols.len() {
            return Err(McdaError::invalid_input(
                "projection attribute names must be distinct",
            ));
        }

        Ok(Self {
            attributes: cols.iter().map(|&c| self.attributes[c].clone()).collect(),
            records: self
                .records
                .iter()
                .map(|row| cols.iter().map(|&c| row[c].clone()).collect())
                .collect(),
            labels: self.labels.clone(),
        })
    }

    /// Keeps only the listed records (in the given order), preserving labels.
    pub fn subset(&self, indices: &[usize]) -> Result<Self, McdaError> {
        let mut records = Vec::with_capacity(indices.len());
        let mut labels = Vec::with_capacity(indices.len());
        for &idx in indices {
            let row = self.records.get(idx).ok_or_else(|| {
                McdaError::invalid_input(format!(
                    "record index {idx} out of bounds for {} record(s)",
                    self.records.len()
                ))
            })?;
            records.push(row.clone());
            labels.push(self.labels[idx].clone());
        }

        Ok(Self {
            attributes: self.attributes.clone(),
            records,
            labels,
        })
    }
}

fn validate_attribute_names(attributes: &[String]) -> Result<(), McdaError> {
    let mut seen = BTreeSet::new();
    for name in attributes {
        if name.is_empty() {
            return Err(McdaError::invalid_input("attribute names must be non-empty"));
        }
        if !seen.insert(name.as_str()) {
            return Err(McdaError::invalid_input(format!(
                "duplicate attribute '{name}'"
            )));
        }
    }
    Ok(())
}
