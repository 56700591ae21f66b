//! Vestige Search Benchmarks
//!
//! Benchmarks for core search operations using Criterion.
//! Run with: cargo bench -p vestige-core

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use vestige_core::embeddings::cosine_similarity;
use vestige_core::search::{linear_combination, reciprocal_rank_fusion};

fn bench_rrf_fusion(c: &mut Criterion) {
    let keyword_ranked: Vec<String> = (0..50).map(|i| format!("doc-{i}")).collect();
    let vector_ranked: Vec<String> = (0..50).map(|i| format!("doc-{}", 25 + i)).collect();

    c.bench_function("rrf_50x50", |b| {
        b.iter(|| {
            black_box(reciprocal_rank_fusion(&keyword_ranked, &vector_ranked, 60.0, 0.5, 0.5));
        })
    });
}

fn bench_linear_combination(c: &mut Criterion) {
    let keyword_results: Vec<(String, f32)> = (0..50).map(|i| (format!("doc-{i}"), 1.0 - i as f32 / 50.0)).collect();
    let semantic_results: Vec<(String, f32)> = (0..50).map(|i| (format!("doc-{}", 25 + i), 1.0 - i as f32 / 50.0)).collect();

    c.bench_function("linear_combo_50x50", |b| {
        b.iter(|| {
            black_box(linear_combination(&keyword_results, &semantic_results, 0.3, 0.7));
        })
    });
}

fn bench_cosine_similarity(c: &mut Criterion) {
    let a: Vec<f32> = (0..256).map(|i| (i as f32).sin()).collect();
    let b: Vec<f32> = (0..256).map(|i| (i as f32).cos()).collect();

    c.bench_function("cosine_similarity_256d", |b_bench| {
        b_bench.iter(|| {
            black_box(cosine_similarity(&a, &b));
        })
    });
}

criterion_group!(benches, bench_rrf_fusion, bench_linear_combination, bench_cosine_similarity);
criterion_main!(benches);
