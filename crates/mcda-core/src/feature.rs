// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::{Dataset, McdaError};
use std::collections::BTreeSet;

/// Ordered list of distinct attribute names.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "Vec<String>", into = "Vec<String>"))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeatureSubset {
    names: Vec<String>,
}

impl FeatureSubset {
    pub fn new<S: Into<String>>(names: Vec<S>) -> Result<Self, McdaError> {
        let names = names.into_iter().map(Into::into).collect::<Vec<String>>();
        if names.is_empty() {
            return Err(McdaError::invalid_input("feature subset must not be empty"));
        }
        let unique = names.iter().collect::<BTreeSet<_>>();
        if unique.len() != names.len() {
            return Err(McdaError::invalid_input(format!(
                "feature subset names must be distinct; got {names:?}"
            )));
        }
        Ok(Self { names })
    }

    /// Every attribute of `dataset`, in dataset order.
    pub fn all(dataset: &Dataset) -> Result<Self, McdaError> {
        Self::new(dataset.attributes().to_vec())
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Column indices in `dataset`; unknown names are `InvalidInput`.
    pub fn indices_in(&self, dataset: &Dataset) -> Result<Vec<usize>, McdaError> {
        dataset.attribute_indices(&self.names)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }
}

impl TryFrom<Vec<String>> for FeatureSubset {
    type Error = McdaError;

    fn try_from(names: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(names)
    }
}

impl From<FeatureSubset> for Vec<String> {
    fn from(subset: FeatureSubset) -> Self {
        subset.names
    }
}

#[cfg(test)]
mod tests {
    use super::FeatureSubset;
    use crate::Dataset;

    #[test]
    fn rejects_empty_and_duplicate_names() {
        assert!(FeatureSubset::new(Vec::<String>::new()).is_err());
        assert!(FeatureSubset::new(vec!["a", "a"]).is_err());
        let subset = FeatureSubset::new(vec!["b", "a"]).expect("distinct names");
        assert_eq!(subset.names(), &["b".to_string(), "a".to_string()]);
        assert!(subset.contains("a"));
        assert_eq!(subset.len(), 2);
    }

    #[test]
    fn resolves_indices_against_dataset() {
        let dataset = Dataset::from_numeric_rows(vec!["x", "y", "z"], vec![vec![1.0, 2.0, 3.0]])
            .expect("dataset");
        let subset = FeatureSubset::new(vec!["z", "x"]).expect("subset");
        assert_eq!(subset.indices_in(&dataset).expect("indices"), vec![2, 0]);
        let unknown = FeatureSubset::new(vec!["w"]).expect("subset");
        assert!(unknown.indices_in(&dataset).is_err());
        assert_eq!(FeatureSubset::all(&dataset).expect("all").len(), 3);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serializes_as_plain_list() {
        let subset = FeatureSubset::new(vec!["a", "b"]).expect("subset");
        let encoded = serde_json::to_string(&subset).expect("serialize");
        assert_eq!(encoded, r#"["a","b"]"#);
        assert!(serde_json::from_str::<FeatureSubset>(r#"["a","a"]"#).is_err());
    }
}
