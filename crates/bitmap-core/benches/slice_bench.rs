//! Benchmarks for task slicing and engine dispatch

use bitmap_core::{
    execution::{sequential, ExecutionEngine},
    EkSlice, Format, IxjSlice, Matrix, Workspace,
};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

/// Sparse matrix with a few entries per column at fixed pseudo-random rows
fn generate_sparse(n: usize, per_col: usize) -> Matrix<f64> {
    let triplets: Vec<_> = (0..n)
        .flat_map(|j| (0..per_col).map(move |k| ((j * 7 + k * 13) % n, j, k as f64)))
        .collect();
    Matrix::from_triplets(n, n, &triplets, Format::Sparse)
}

fn bench_ek_slice(c: &mut Criterion) {
    let mut group = c.benchmark_group("ek_slice");
    let ws = Workspace::unlimited();

    for &n in &[1_000usize, 10_000, 100_000] {
        let m = generate_sparse(n, 4);
        let Some(parts) = m.sparse_parts() else {
            continue;
        };
        for &ntasks in &[1usize, 8, 64] {
            group.bench_with_input(
                BenchmarkId::new(format!("t{ntasks}"), n),
                &ntasks,
                |b, &ntasks| {
                    b.iter(|| black_box(EkSlice::new(parts, ntasks, &ws).map(|s| s.ntasks())));
                },
            );
        }
    }

    group.finish();
}

fn bench_ixj_traversal(c: &mut Criterion) {
    let mut group = c.benchmark_group("ixj_traversal");
    let engine = sequential();

    for &(ni, nj) in &[(1_000usize, 1_000usize), (100_000, 4)] {
        let slice = IxjSlice::new(ni, nj, 32);
        group.bench_function(BenchmarkId::new("count", format!("{ni}x{nj}")), |b| {
            b.iter(|| {
                black_box(engine.sum_batch(slice.ntasks(), |t| {
                    let task = slice.task(t);
                    (task.i.len() * task.j.len()) as i64
                }))
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_ek_slice, bench_ixj_traversal);
criterion_main!(benches);
