// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use mcda_bench::random_matrix;
use mcda_cluster::{Agglomerative, AgglomerativeConfig, Linkage};

fn bench_linkage(c: &mut Criterion, case_id: &str, n: usize, linkage: Linkage) {
    let matrix = random_matrix(n, 7).expect("benchmark matrix should be valid");
    let clustering =
        Agglomerative::new(AgglomerativeConfig { linkage }).expect("config should be valid");

    c.bench_function(case_id, |b| {
        b.iter(|| {
            clustering
                .fit(black_box(&matrix))
                .expect("agglomerative benchmark fit should succeed");
        })
    });
}

fn benchmark_agglomerative_n500(c: &mut Criterion) {
    bench_linkage(c, "agglomerative_average_n500", 500, Linkage::Average);
    bench_linkage(c, "agglomerative_single_n500", 500, Linkage::Single);
}

criterion_group!(benches, benchmark_agglomerative_n500);
criterion_main!(benches);
