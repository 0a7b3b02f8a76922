//! Radix vs comparison depth sort at batch sizes seen in practice.

use std::hint::black_box;

use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};

use batched_scene::batch::{DepthEntry, DepthSortEngine, InstancePool, TransformFactory};
use batched_scene::resources::Geometry;
use batched_scene::settings::{MAX_INSTANCE_CAPACITY, SortAlgorithm};

fn draw_list(n: usize) -> Vec<DepthEntry> {
    let mut factory = TransformFactory::from_seed(17);
    let mut pool = InstancePool::with_factory(n, TransformFactory::from_seed(3), 20.0).unwrap();
    let geo = pool.add_geometry(Geometry::new_box(2.0, 2.0, 2.0));
    (0..n)
        .map(|_| {
            let handle = pool.allocate(geo).unwrap();
            let depth = factory.random_trs(20.0).position.z + 30.0;
            DepthEntry::new(handle, depth)
        })
        .collect()
}

fn bench_depth_sort(c: &mut Criterion) {
    let mut group = c.benchmark_group("depth_sort");

    for n in [256, 4096, MAX_INSTANCE_CAPACITY] {
        let list = draw_list(n);

        for (name, algorithm) in [
            ("radix", SortAlgorithm::Radix),
            ("comparison", SortAlgorithm::Comparison),
        ] {
            let mut engine = DepthSortEngine::new();
            engine.set_algorithm(algorithm);
            engine.set_reversed(true);

            group.bench_with_input(BenchmarkId::new(name, n), &list, |b, list| {
                b.iter_batched_ref(
                    || list.clone(),
                    |work| engine.sort(black_box(work)),
                    BatchSize::LargeInput,
                );
            });
        }
    }

    group.finish();
}

criterion_group!(benches, bench_depth_sort);
criterion_main!(benches);
