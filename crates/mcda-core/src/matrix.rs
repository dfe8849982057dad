// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::McdaError;

/// Square, symmetric, zero-diagonal matrix of non-negative finite distances.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(try_from = "DistanceMatrixWire", into = "DistanceMatrixWire")
)]
#[derive(Clone, Debug, PartialEq)]
pub struct DistanceMatrix {
    n: usize,
    values: Vec<f64>,
}

/// Row-indexed wire form of [`DistanceMatrix`].
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct DistanceMatrixWire {
    pub rows: Vec<Vec<f64>>,
}

impl TryFrom<DistanceMatrixWire> for DistanceMatrix {
    type Error = McdaError;

    fn try_from(wire: DistanceMatrixWire) -> Result<Self, Self::Error> {
        DistanceMatrix::from_rows(wire.rows)
    }
}

impl From<DistanceMatrix> for DistanceMatrixWire {
    fn from(matrix: DistanceMatrix) -> Self {
        Self {
            rows: matrix.to_rows(),
        }
    }
}

fn check_entry(i: usize, j: usize, value: f64) -> Result<(), McdaError> {
    if !value.is_finite() {
        return Err(McdaError::numerical_issue(format!(
            "distance ({i}, {j}) is not finite: {value}"
        )));
    }
    if value < 0.0 {
        return Err(McdaError::invalid_input(format!(
            "distance ({i}, {j}) is negative: {value}"
        )));
    }
    Ok(())
}

impl DistanceMatrix {
    /// Builds a matrix from the strict upper triangle, one row per record.
    ///
    /// `upper[i]` holds `d(i, j)` for `j` in `i+1..n`; the lower half is mirrored.
    pub fn from_upper_rows(n: usize, upper: Vec<Vec<f64>>) -> Result<Self, McdaError> {
        if upper.len() != n {
            return Err(McdaError::invalid_input(format!(
                "upper-triangle row count mismatch: got {}, expected {n}",
                upper.len()
            )));
        }

        let len = n
            .checked_mul(n)
            .ok_or_else(|| McdaError::invalid_input("distance matrix size overflow"))?;
        let mut values = vec![0.0; len];
        for (i, row) in upper.into_iter().enumerate() {
            let expected = n - i - 1;
            if row.len() != expected {
                return Err(McdaError::invalid_input(format!(
                    "upper-triangle row {i} has {} value(s), expected {expected}",
                    row.len()
                )));
            }
            for (offset, value) in row.into_iter().enumerate() {
                let j = i + 1 + offset;
                check_entry(i, j, value)?;
                values[i * n + j] = value;
                values[j * n + i] = value;
            }
        }

        Ok(Self { n, values })
    }

    /// Builds a matrix from full square rows, validating symmetry and the zero diagonal.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self, McdaError> {
        let n = rows.len();
        let mut values = Vec::with_capacity(n * n);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != n {
                return Err(McdaError::invalid_input(format!(
                    "distance matrix must be square: row {i} has {} value(s), expected {n}",
                    row.len()
                )));
            }
            for (j, &value) in row.iter().enumerate() {
                check_entry(i, j, value)?;
                if i == j && value != 0.0 {
                    return Err(McdaError::invalid_input(format!(
                        "distance matrix diagonal must be 0; got {value} at ({i}, {i})"
                    )));
                }
                if j < i && rows[j][i].to_bits() != value.to_bits() {
                    return Err(McdaError::invalid_input(format!(
                        "distance matrix must be symmetric: ({i}, {j})={value}, ({j}, {i})={}",
                        rows[j][i]
                    )));
                }
                values.push(value);
            }
        }

        Ok(Self { n, values })
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.n + j]
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.values[i * self.n..(i + 1) * self.n]
    }

    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        (0..self.n).map(|i| self.row(i).to_vec()).collect()
    }

    /// Strict upper triangle in row-major order (`n*(n-1)/2` entries).
    pub fn condensed(&self) -> Vec<f64> {
        let mut out = Vec::with_capacity(self.n * self.n.saturating_sub(1) / 2);
        for i in 0..self.n {
            out.extend_from_slice(&self.row(i)[i + 1..]);
        }
        out
    }

    pub fn max_value(&self) -> f64 {
        self.values.iter().copied().fold(0.0, f64::max)
    }
}
