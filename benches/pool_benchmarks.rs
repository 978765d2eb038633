use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use geopool::{Pool, Task, TaskDescriptor};
use std::thread;

fn checksum_tasks(count: u64) -> Vec<Task<u64, u64>> {
    (0..count)
        .map(|i| {
            Task::new(TaskDescriptor::new("checksum"), i, |_, seed| {
                let mut acc = seed;
                for _ in 0..1_000 {
                    acc = acc.wrapping_mul(6364136223846793005).wrapping_add(1);
                }
                Ok(acc)
            })
        })
        .collect()
}

fn run_to_completion(workers: usize, tasks: Vec<Task<u64, u64>>) -> usize {
    let pool: Pool<u64, u64> = Pool::new(workers, tasks.len(), "bench").unwrap();
    let results = pool.results();
    thread::scope(|s| {
        s.spawn(|| pool.run().unwrap());
        s.spawn(|| pool.generate_from(tasks));
        results.iter().count()
    })
}

fn benchmark_worker_counts(c: &mut Criterion) {
    let mut group = c.benchmark_group("ordered_pool");

    for workers in [1usize, 2, 4, 8] {
        group.bench_with_input(
            BenchmarkId::new("workers", workers),
            &workers,
            |b, &workers| {
                b.iter(|| run_to_completion(black_box(workers), checksum_tasks(256)))
            },
        );
    }

    group.finish();
}

fn benchmark_fake_tasks(c: &mut Criterion) {
    let mut group = c.benchmark_group("ring_overhead");

    // Fake tasks do no work, so this measures token passing alone.
    group.bench_function("fake_1000_x4", |b| {
        b.iter(|| {
            let tasks: Vec<Task<u64, u64>> = (0..1_000).map(|_| Task::default()).collect();
            run_to_completion(4, tasks)
        })
    });

    group.finish();
}

criterion_group!(benches, benchmark_worker_counts, benchmark_fake_tasks);
criterion_main!(benches);
