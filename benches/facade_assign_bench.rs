//! End-to-end assignment benchmarks through the facade, sequential against Rayon

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sparse_bitmap::prelude::*;

fn random_bitmap(n: usize, density: f64, seed: u64) -> Matrix<f64> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let triplets: Vec<_> = (0..n)
        .flat_map(|col| (0..n).map(move |row| (row, col)))
        .filter(|_| rng.gen_bool(density))
        .map(|(row, col)| (row, col, (row ^ col) as f64))
        .collect();
    Matrix::from_triplets(n, n, &triplets, Format::Bitmap)
}

fn bench_engines(c: &mut Criterion) {
    let mut group = c.benchmark_group("engines");
    group.sample_size(20);

    for &n in &[1024usize, 4096] {
        let target = random_bitmap(n, 0.25, 1);
        let mask = random_bitmap(n, 0.5, 2);
        let req = AssignRequest::new(IndexList::all(n), IndexList::all(n), Input::Scalar(1.0))
            .with_mask(&mask)
            .with_accum(Plus)
            .replace();

        let seq = AssignContext::new(sequential()).with_config(AssignConfig::single_threaded());
        let par = AssignContext::new(parallel()).with_config(AssignConfig::default());

        group.bench_function(BenchmarkId::new("sequential", n), |b| {
            b.iter_batched_ref(
                || target.clone(),
                |cm| assign(cm, black_box(&req), &seq),
                criterion::BatchSize::LargeInput,
            );
        });
        group.bench_function(BenchmarkId::new("parallel", n), |b| {
            b.iter_batched_ref(
                || target.clone(),
                |cm| assign(cm, black_box(&req), &par),
                criterion::BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

fn bench_subref(c: &mut Criterion) {
    let mut group = c.benchmark_group("subref");
    let a = random_bitmap(2048, 0.3, 3);
    let rows = IndexList::strided(2047, -3, 0);
    let cols = IndexList::range(100, 1900);
    let ctx = AssignContext::new(parallel());

    group.bench_function("bitmap_2048", |b| {
        b.iter(|| subref(black_box(&a), &rows, &cols, &ctx));
    });
    group.finish();
}

criterion_group!(benches, bench_engines, bench_subref);
criterion_main!(benches);
