// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use mcda_bench::clustered_dataset;
use mcda_core::ExecutionContext;
use mcda_select::{FsOpa, FsOpaConfig, SearchStrategy, VarianceRatio};

fn bench_fs_opa(c: &mut Criterion, case_id: &str, k: usize, strategy: SearchStrategy) {
    let dataset = clustered_dataset(200, 16, 4, 11).expect("benchmark dataset should be valid");
    let groups = (0..dataset.n_records()).map(|r| r % 4).collect::<Vec<_>>();
    let selector = FsOpa::new(
        VarianceRatio,
        FsOpaConfig {
            strategy,
            ..FsOpaConfig::default()
        },
    )
    .expect("selector config should be valid");
    let ctx = ExecutionContext::new();

    c.bench_function(case_id, |b| {
        b.iter(|| {
            selector
                .select(black_box(&dataset), k, Some(&groups), black_box(&ctx))
                .expect("FS-OPA benchmark select should succeed");
        })
    });
}

fn benchmark_fs_opa_m16(c: &mut Criterion) {
    bench_fs_opa(c, "fs_opa_m16_k4_exhaustive", 4, SearchStrategy::Exhaustive);
    bench_fs_opa(c, "fs_opa_m16_k8_greedy", 8, SearchStrategy::Greedy);
}

criterion_group!(benches, benchmark_fs_opa_m16);
criterion_main!(benches);
