use criterion::*;
use ndarray::Array2;
use rand::prelude::*;

use scgraph::{Centroids, DistanceMatrix, Metric};

fn centroids(c: &mut Criterion) {
    let mut group = c.benchmark_group("centroids");
    group.sample_size(20);

    let num_types = 20;
    let dimensionality = 30;
    for cardinality in [1_000, 10_000, 100_000] {
        let mut rng = StdRng::seed_from_u64(42);
        let data = Array2::from_shape_fn((cardinality, dimensionality), |_| rng.gen_range(-1.0..1.0_f32));
        let labels = (0..cardinality).map(|i| format!("type_{}", i % num_types)).collect::<Vec<_>>();

        for trim_rate in [0.0, 0.05] {
            let id = BenchmarkId::new(format!("trimmed-{trim_rate}"), cardinality);
            group.bench_with_input(id, &cardinality, |b, _| {
                b.iter_with_large_drop(|| black_box(Centroids::trimmed(data.view(), labels.as_slice(), trim_rate, None)));
            });
        }

        let id = BenchmarkId::new("graph", cardinality);
        group.bench_with_input(id, &cardinality, |b, _| {
            b.iter_with_large_drop(|| {
                Centroids::trimmed(data.view(), labels.as_slice(), 0.05, None)
                    .map(|c| black_box(DistanceMatrix::from_centroids(&c, Metric::Euclidean).normalized()))
            });
        });
    }
    group.finish();
}

criterion_group!(benches, centroids);
criterion_main!(benches);
