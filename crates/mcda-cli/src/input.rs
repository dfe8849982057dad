// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::error::CliError;
use mcda_core::{Dataset, Value};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// How a delimited text table is read.
#[derive(Clone, Debug)]
pub struct CsvOptions {
    pub delimiter: u8,
    /// Column holding record labels; it is not treated as an attribute.
    pub label_column: Option<String>,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            label_column: None,
        }
    }
}

/// Reads a headered table: finite numeric cells become numeric values,
/// everything else is categorical.
pub fn read_csv_dataset<R: Read>(reader: R, options: &CsvOptions) -> Result<Dataset, CliError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let header = reader
        .headers()
        .map_err(|source| CliError::csv("failed to read CSV header", source))?
        .iter()
        .map(str::to_string)
        .collect::<Vec<_>>();

    let label_idx = match &options.label_column {
        Some(name) => Some(header.iter().position(|h| h == name).ok_or_else(|| {
            CliError::invalid_input(format!("label column '{name}' not found in CSV header"))
        })?),
        None => None,
    };

    let attributes = header
        .iter()
        .enumerate()
        .filter(|(idx, _)| Some(*idx) != label_idx)
        .map(|(_, name)| name.clone())
        .collect::<Vec<_>>();

    let mut records = Vec::new();
    let mut labels = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record
            .map_err(|source| CliError::csv(format!("failed to read CSV row {}", row + 1), source))?;
        let mut values = Vec::with_capacity(attributes.len());
        for (idx, cell) in record.iter().enumerate() {
            if Some(idx) == label_idx {
                labels.push(cell.to_string());
            } else {
                values.push(Value::parse(cell));
            }
        }
        records.push(values);
    }

    if records.is_empty() {
        return Err(CliError::invalid_input("CSV input contains no records"));
    }
    debug!(
        records = records.len(),
        attributes = attributes.len(),
        "loaded CSV dataset"
    );

    let dataset = Dataset::new(attributes, records)?;
    Ok(match label_idx {
        Some(_) => dataset.with_labels(labels)?,
        None => dataset,
    })
}

pub fn load_csv_dataset(path: &Path, options: &CsvOptions) -> Result<Dataset, CliError> {
    let file = File::open(path)
        .map_err(|source| CliError::io(format!("failed to read '{}'", path.display()), source))?;
    read_csv_dataset(file, options)
}

#[cfg(test)]
mod tests {
    use super::{CsvOptions, read_csv_dataset};
    use mcda_core::{AttributeKind, Value};

    #[test]
    fn infers_numeric_and_categorical_columns() {
        let raw = "a,b,kind\n1,2.5,x\n3, 4 ,y\n";
        let dataset = read_csv_dataset(raw.as_bytes(), &CsvOptions::default()).expect("csv");
        assert_eq!(dataset.n_records(), 2);
        assert_eq!(dataset.attributes(), &["a", "b", "kind"]);
        assert_eq!(dataset.attribute_kind(1), AttributeKind::Numeric);
        assert_eq!(dataset.attribute_kind(2), AttributeKind::Categorical);
        assert_eq!(dataset.value(1, 1), Some(&Value::Numeric(4.0)));
        assert_eq!(dataset.labels(), &["0", "1"]);
    }

    #[test]
    fn label_column_and_delimiter() {
        let raw = "id;x;y\nalpha;1;2\nbeta;3;4\n";
        let options = CsvOptions {
            delimiter: b';',
            label_column: Some("id".to_string()),
        };
        let dataset = read_csv_dataset(raw.as_bytes(), &options).expect("csv");
        assert_eq!(dataset.attributes(), &["x", "y"]);
        assert_eq!(dataset.labels(), &["alpha", "beta"]);
    }

    #[test]
    fn ragged_rows_and_missing_label_column_fail() {
        let ragged = "a,b\n1,2\n3\n";
        let err = read_csv_dataset(ragged.as_bytes(), &CsvOptions::default()).expect_err("ragged");
        assert_eq!(err.code(), "csv_error");

        let options = CsvOptions {
            label_column: Some("id".to_string()),
            ..CsvOptions::default()
        };
        let err = read_csv_dataset("a\n1\n".as_bytes(), &options).expect_err("no id column");
        assert_eq!(err.code(), "invalid_input");
    }

    #[test]
    fn header_only_input_is_rejected() {
        let err = read_csv_dataset("a,b\n".as_bytes(), &CsvOptions::default()).expect_err("empty");
        assert_eq!(err.code(), "invalid_input");
    }
}
