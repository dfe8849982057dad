// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use thiserror::Error;

/// Error type shared by every mcda stage.
///
/// All variants are recoverable at the orchestration level: core functions
/// fail fast and never retry.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum McdaError {
    /// One or more records have zero estimated complexity.
    #[error("degenerate input: zero estimated complexity for record(s) {records:?}")]
    DegenerateInput { records: Vec<usize> },

    /// Requested feature count is unsupported or exceeds the attribute count.
    #[error("invalid k={k}: expected one of 2, 4, 8{}", attribute_limit(.attribute_count))]
    InvalidK {
        k: usize,
        /// Attribute count of the dataset, when one was checked.
        attribute_count: Option<usize>,
    },

    /// Not enough records or attributes for the requested stage.
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    /// Records do not share the same attribute set.
    #[error("inconsistent schema at record {record}: {detail}")]
    InconsistentSchema { record: usize, detail: String },

    /// Malformed argument or artifact.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Non-finite intermediate value.
    #[error("numerical issue: {0}")]
    NumericalIssue(String),
}

fn attribute_limit(attribute_count: &Option<usize>) -> String {
    attribute_count
        .map(|count| format!(" and at most {count} attribute(s)"))
        .unwrap_or_default()
}

impl McdaError {
    pub fn degenerate_input(mut records: Vec<usize>) -> Self {
        records.sort_unstable();
        records.dedup();
        Self::DegenerateInput { records }
    }

    pub fn invalid_k(k: usize, attribute_count: usize) -> Self {
        Self::InvalidK {
            k,
            attribute_count: Some(attribute_count),
        }
    }

    /// `k` outside the supported set, checked before any dataset is known.
    pub fn unsupported_k(k: usize) -> Self {
        Self::InvalidK {
            k,
            attribute_count: None,
        }
    }

    pub fn insufficient_data(msg: impl Into<String>) -> Self {
        Self::InsufficientData(msg.into())
    }

    pub fn inconsistent_schema(record: usize, detail: impl Into<String>) -> Self {
        Self::InconsistentSchema {
            record,
            detail: detail.into(),
        }
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn numerical_issue(msg: impl Into<String>) -> Self {
        Self::NumericalIssue(msg.into())
    }

    /// Stable machine-readable code for structured error reporting.
    pub fn code(&self) -> &'static str {
        match self {
            Self::DegenerateInput { .. } => "degenerate_input",
            Self::InvalidK { .. } => "invalid_k",
            Self::InsufficientData(_) => "insufficient_data",
            Self::InconsistentSchema { .. } => "inconsistent_schema",
            Self::InvalidInput(_) => "invalid_input",
            Self::NumericalIssue(_) => "numerical_issue",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::McdaError;

    #[test]
    fn degenerate_input_sorts_and_dedups_records() {
        let err = McdaError::degenerate_input(vec![4, 1, 4, 2]);
        assert_eq!(
            err,
            McdaError::DegenerateInput {
                records: vec![1, 2, 4]
            }
        );
    }

    #[test]
    fn display_mentions_offending_values() {
        let err = McdaError::invalid_k(3, 5);
        let rendered = err.to_string();
        assert!(rendered.contains("k=3"));
        assert!(rendered.contains("5 attribute"));

        let rendered = McdaError::unsupported_k(3).to_string();
        assert_eq!(rendered, "invalid k=3: expected one of 2, 4, 8");

        let err = McdaError::inconsistent_schema(2, "missing attribute 'b'");
        assert_eq!(
            err.to_string(),
            "inconsistent schema at record 2: missing attribute 'b'"
        );
    }

    #[test]
    fn codes_are_stable() {
        assert_eq!(McdaError::degenerate_input(vec![0]).code(), "degenerate_input");
        assert_eq!(McdaError::invalid_k(1, 1).code(), "invalid_k");
        assert_eq!(McdaError::insufficient_data("x").code(), "insufficient_data");
        assert_eq!(
            McdaError::inconsistent_schema(0, "x").code(),
            "inconsistent_schema"
        );
        assert_eq!(McdaError::invalid_input("x").code(), "invalid_input");
        assert_eq!(McdaError::numerical_issue("x").code(), "numerical_issue");
    }
}
