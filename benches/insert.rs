use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use kdspace::KdTree;
use rand::Rng;

fn benchmark_insert_random(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert_random");

    for &n in &[1_000usize, 10_000, 100_000] {
        let mut rng = rand::thread_rng();
        let points: Vec<[f64; 3]> = (0..n)
            .map(|_| [rng.gen_range(0.0..100.0), rng.gen_range(0.0..100.0), rng.gen_range(0.0..100.0)])
            .collect();

        group.bench_with_input(BenchmarkId::from_parameter(n), &points, |b, points| {
            b.iter(|| {
                let mut tree = KdTree::with_capacity(3, points.len()).unwrap();
                for p in points {
                    tree.insert(black_box(p)).unwrap();
                }
                tree
            })
        });
    }
    group.finish();
}

fn benchmark_from_points(c: &mut Criterion) {
    let mut rng = rand::thread_rng();
    let points: Vec<[f64; 3]> = (0..100_000)
        .map(|_| [rng.gen_range(0.0..100.0), rng.gen_range(0.0..100.0), rng.gen_range(0.0..100.0)])
        .collect();

    c.bench_function("from_points_100000", |b| {
        b.iter(|| KdTree::from_points(3, black_box(&points)).unwrap())
    });
}

criterion_group!(benches, benchmark_insert_random, benchmark_from_points);
criterion_main!(benches);
