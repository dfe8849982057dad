// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use mcda_bench::clustered_dataset;
use mcda_core::{ExecutionContext, ReproMode};
use mcda_ncd::{NcdConfig, NcdMatrixBuilder, ZlibEstimator};

fn bench_ncd(c: &mut Criterion, case_id: &str, n: usize, repro_mode: ReproMode) {
    let dataset = clustered_dataset(n, 8, 4, 42).expect("benchmark dataset should be valid");
    let builder = NcdMatrixBuilder::new(ZlibEstimator::default(), NcdConfig::default())
        .expect("builder config should be valid");
    let ctx = ExecutionContext::new().with_repro_mode(repro_mode);

    c.bench_function(case_id, |b| {
        b.iter(|| {
            builder
                .build(black_box(&dataset), black_box(&ctx))
                .expect("NCD benchmark build should succeed");
        })
    });
}

fn benchmark_ncd_n200(c: &mut Criterion) {
    bench_ncd(c, "ncd_zlib_n200_balanced", 200, ReproMode::Balanced);
    bench_ncd(c, "ncd_zlib_n200_strict", 200, ReproMode::Strict);
}

criterion_group!(benches, benchmark_ncd_n200);
criterion_main!(benches);
