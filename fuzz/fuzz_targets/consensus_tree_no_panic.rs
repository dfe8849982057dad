// SPDX-License-Identifier: MIT OR Apache-2.0

#![no_main]

#[path = "common.rs"]
mod common;

use libfuzzer_sys::fuzz_target;
use mcda_cluster::{CutPolicy, Linkage, build_consensus_tree, render_ascii, render_newick};
use mcda_core::DistanceMatrix;

fuzz_target!(|data: &[u8]| {
    let mut cursor = common::ByteCursor::new(data);
    let n = common::bounded(cursor.next_u8(), 0, 32);
    let linkage = Linkage::ALL[usize::from(cursor.next_u8()) % Linkage::ALL.len()];

    let upper = (0..n)
        .map(|i| {
            (i + 1..n)
                .map(|_| match cursor.next_u8() % 3 {
                    0 => f64::from(cursor.next_u8()) / 255.0,
                    1 => f64::from(cursor.next_u8() % 3),
                    _ => cursor.next_f64(),
                })
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();
    let Ok(matrix) = DistanceMatrix::from_upper_rows(n, upper) else {
        return;
    };

    let policy = if cursor.next_u8() & 1 == 0 {
        CutPolicy::ClusterCount(usize::from(cursor.next_u8() % 34))
    } else {
        CutPolicy::DistanceThreshold(f64::from(cursor.next_i16()) / 64.0)
    };

    if let Ok((tree, assignment)) = build_consensus_tree(&matrix, linkage, policy) {
        assert_eq!(assignment.labels.len(), n);
        let labels = (0..n).map(|i| i.to_string()).collect::<Vec<_>>();
        let _ = render_ascii(&tree, &labels);
        let _ = render_newick(&tree, &labels);
    }
});
