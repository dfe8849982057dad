// SPDX-License-Identifier: MIT OR Apache-2.0

#![no_main]

#[path = "common.rs"]
mod common;

use libfuzzer_sys::fuzz_target;
use mcda_core::{Dataset, ExecutionContext, FeatureSubset};
use mcda_pareto::{Direction, ObjectiveDirections, ParetoAnalyzer, ParetoConfig};

const NAMES: [&str; 4] = ["a", "b", "c", "d"];

fuzz_target!(|data: &[u8]| {
    let mut cursor = common::ByteCursor::new(data);
    let dims = common::bounded(cursor.next_u8(), 1, NAMES.len());
    let n = common::bounded(cursor.next_u8(), 0, 48);

    let rows = (0..n)
        .map(|_| {
            (0..dims)
                .map(|_| match cursor.next_u8() % 4 {
                    0 => f64::from(cursor.next_i16()) / 8.0,
                    1 => f64::from(cursor.next_u8() % 4),
                    2 => cursor.next_f64(),
                    _ => 0.0,
                })
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();

    // Non-finite cells are rejected at construction.
    let Ok(dataset) = Dataset::from_numeric_rows(NAMES[..dims].to_vec(), rows) else {
        return;
    };

    let mut directions = ObjectiveDirections::maximize_all();
    for name in &NAMES[..dims] {
        if cursor.next_u8() & 1 == 1 {
            directions = directions.with_override(*name, Direction::Minimize);
        }
    }
    let objectives = FeatureSubset::new(NAMES[..dims].to_vec())
        .expect("fixed objective names are distinct");

    let offset = 0.01 + f64::from(cursor.next_u8()) / 64.0;
    let Ok(analyzer) = ParetoAnalyzer::new(ParetoConfig {
        reference_offset: offset,
        ..ParetoConfig::default()
    }) else {
        return;
    };

    let ctx = ExecutionContext::new();
    if let Ok(result) = analyzer.analyze(&dataset, &objectives, &directions, &ctx) {
        assert!(!result.front.is_empty());
        assert_eq!(result.front.ranks.len(), dataset.n_records());
        assert!(result.metrics.hypervolume >= 0.0);
    }
});
