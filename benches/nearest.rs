use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use kdspace::KdTree;
use rand::Rng;

const N_QUERIES: usize = 1_000;

fn random_targets(k: usize) -> Vec<Vec<f64>> {
    let mut rng = rand::thread_rng();
    (0..N_QUERIES)
        .map(|_| (0..k).map(|_| rng.gen_range(0.0..100.0)).collect())
        .collect()
}

fn benchmark_nearest(c: &mut Criterion) {
    let mut group = c.benchmark_group(format!("nearest_{}q", N_QUERIES));

    for k in [2usize, 3, 5] {
        let mut tree = KdTree::new(k).unwrap();
        tree.random_points(100_000, 0.0, 100.0).unwrap();
        tree.rebalance();
        let targets = random_targets(k);

        group.bench_with_input(BenchmarkId::new("sequential", k), &targets, |b, targets| {
            b.iter(|| {
                for t in targets {
                    black_box(tree.nearest(t).unwrap());
                }
            })
        });

        group.bench_with_input(BenchmarkId::new("parallel", k), &targets, |b, targets| {
            b.iter(|| black_box(tree.nearest_many(targets).unwrap()))
        });
    }
    group.finish();
}

fn benchmark_nearest_unbalanced(c: &mut Criterion) {
    // Sorted insertion leaves a list-shaped tree; compare against the rebalanced one.
    let mut group = c.benchmark_group("nearest_sorted_input");
    group.sample_size(20);

    let mut tree = KdTree::new(2).unwrap();
    for i in 0..5_000 {
        tree.insert(&[i as f64 * 0.02, i as f64 * 0.02]).unwrap();
    }
    let targets = random_targets(2);

    group.bench_function("unbalanced", |b| {
        b.iter(|| {
            for t in &targets {
                black_box(tree.nearest(t).unwrap());
            }
        })
    });

    tree.rebalance();
    group.bench_function("rebalanced", |b| {
        b.iter(|| {
            for t in &targets {
                black_box(tree.nearest(t).unwrap());
            }
        })
    });
    group.finish();
}

criterion_group!(benches, benchmark_nearest, benchmark_nearest_unbalanced);
criterion_main!(benches);
