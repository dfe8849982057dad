// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use mcda_core::{Dataset, Value};
use std::fmt::Write;

/// Canonical byte form of a record: values in attribute order, comma-joined.
pub fn serialize_record(values: &[Value]) -> Vec<u8> {
    join_values(values.iter())
}

pub fn serialize_records(dataset: &Dataset) -> Vec<Vec<u8>> {
    dataset
        .records()
        .iter()
        .map(|row| serialize_record(row))
        .collect()
}

/// Numeric cells of one attribute column, comma-joined.
///
/// Returns `None` when the column holds fewer than two numeric cells.
pub fn serialize_numeric_column(dataset: &Dataset, attribute: usize) -> Option<Vec<u8>> {
    let numeric = dataset
        .records()
        .iter()
        .filter_map(|row| row.get(attribute))
        .filter(|value| value.is_numeric())
        .collect::<Vec<_>>();
    if numeric.len() < 2 {
        return None;
    }
    Some(join_values(numeric.into_iter()))
}

fn join_values<'a>(values: impl Iterator<Item = &'a Value>) -> Vec<u8> {
    let mut out = String::new();
    for (idx, value) in values.enumerate() {
        if idx > 0 {
            out.push(',');
        }
        // Writing into a String cannot fail.
        let _ = write!(out, "{value}");
    }
    out.into_bytes()
}
