// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

//! Deterministic inputs shared by the benchmarks.

use mcda_core::{Dataset, DistanceMatrix, McdaError};

/// Advances a SplitMix64 state and returns the next output.
fn next(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

fn unit(state: &mut u64) -> f64 {
    (next(state) >> 11) as f64 / (1u64 << 53) as f64
}

/// `n` numeric records over `m` attributes, drawn around `clusters` centers.
pub fn clustered_dataset(
    n: usize,
    m: usize,
    clusters: usize,
    seed: u64,
) -> Result<Dataset, McdaError> {
    let mut state = seed;
    let clusters = clusters.max(1);
    let centers = (0..clusters)
        .map(|_| (0..m).map(|_| unit(&mut state) * 100.0).collect::<Vec<_>>())
        .collect::<Vec<_>>();
    let rows = (0..n)
        .map(|r| {
            centers[r % clusters]
                .iter()
                .map(|c| (c + unit(&mut state) * 5.0).round())
                .collect()
        })
        .collect();
    let names = (0..m).map(|a| format!("attr_{a}")).collect::<Vec<_>>();
    Dataset::from_numeric_rows(names, rows)
}

/// Random symmetric distance matrix with entries in `[0, 1)`.
pub fn random_matrix(n: usize, seed: u64) -> Result<DistanceMatrix, McdaError> {
    let mut state = seed;
    let upper = (0..n)
        .map(|i| (i + 1..n).map(|_| unit(&mut state)).collect())
        .collect();
    DistanceMatrix::from_upper_rows(n, upper)
}
