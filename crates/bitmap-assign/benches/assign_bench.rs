//! Benchmarks for the case routines on square bitmap targets

use bitmap_assign::{
    assign, AssignConfig, AssignContext, AssignRequest, Format, IndexList, Input, Matrix, Plus,
};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

fn random_matrix(n: usize, density: f64, format: Format, seed: u64) -> Matrix<f64> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut triplets = Vec::new();
    for col in 0..n {
        for row in 0..n {
            if rng.gen_bool(density) {
                triplets.push((row, col, rng.gen::<f64>()));
            }
        }
    }
    Matrix::from_triplets(n, n, &triplets, format)
}

fn contexts() -> Vec<(&'static str, AssignContext)> {
    vec![
        (
            "single",
            AssignContext::sequential().with_config(AssignConfig::single_threaded()),
        ),
        (
            "sliced",
            AssignContext::sequential().with_config(AssignConfig {
                chunk: 4096,
                ..AssignConfig::default()
            }),
        ),
    ]
}

fn bench_whole_masked(c: &mut Criterion) {
    let mut group = c.benchmark_group("whole_masked");

    for &n in &[256usize, 1024] {
        let target = random_matrix(n, 0.3, Format::Bitmap, 1);
        let sparse_mask = random_matrix(n, 0.05, Format::Sparse, 2);
        let dense_mask = random_matrix(n, 0.5, Format::Bitmap, 3);
        let a = random_matrix(n, 0.1, Format::Sparse, 4);

        for (label, ctx) in contexts() {
            for (mask_label, mask) in [("sparse", &sparse_mask), ("bitmap", &dense_mask)] {
                let req = AssignRequest::new(IndexList::all(n), IndexList::all(n), Input::Matrix(&a))
                    .with_mask(mask)
                    .replace();
                group.bench_function(BenchmarkId::new(format!("{mask_label}_{label}"), n), |b| {
                    b.iter_batched_ref(
                        || target.clone(),
                        |cm| assign(cm, black_box(&req), &ctx),
                        criterion::BatchSize::LargeInput,
                    );
                });
            }
        }
    }

    group.finish();
}

fn bench_subset_accum(c: &mut Criterion) {
    let mut group = c.benchmark_group("subset_accum");

    for &n in &[512usize, 2048] {
        let target = random_matrix(n, 0.2, Format::Bitmap, 5);
        let rows = IndexList::strided(0, 2, n - 1);
        let cols = IndexList::range(n / 4, 3 * n / 4);
        let a = Matrix::full_from_fn(rows.len(), cols.len(), true, |r, col| (r + col) as f64);
        let mask = random_matrix(n, 0.1, Format::Hypersparse, 6);

        for (label, ctx) in contexts() {
            let req = AssignRequest::new(rows.clone(), cols.clone(), Input::Matrix(&a))
                .with_mask(&mask)
                .complement()
                .with_accum(Plus);
            group.bench_function(BenchmarkId::new(format!("not_mask_{label}"), n), |b| {
                b.iter_batched_ref(
                    || target.clone(),
                    |cm| assign(cm, black_box(&req), &ctx),
                    criterion::BatchSize::LargeInput,
                );
            });
        }
    }

    group.finish();
}

criterion_group!(benches, bench_whole_masked, bench_subset_accum);
criterion_main!(benches);
