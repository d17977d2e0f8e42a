use criterion::{black_box, criterion_group, criterion_main, Criterion};

use queuesim::prelude::*;

fn bench_admission(c: &mut Criterion) {
    let mut group = c.benchmark_group("bounded_queue");

    group.bench_function("admit_k10", |b| {
        let mut queue = BoundedQueue::new("q1", 10, 1.0, 1.1).unwrap();
        let mut variates = Variates::seeded(1);
        let mut id = 0u64;

        b.iter(|| {
            let mut packet = Packet::new(PacketId::new(id));
            id += 1;
            black_box(queue.admit(&mut packet, &mut variates));
        });
    });

    group.bench_function("admit_k1000_overloaded", |b| {
        let mut queue = BoundedQueue::new("q1", 1000, 2.0, 1.0).unwrap();
        let mut variates = Variates::seeded(2);
        let mut id = 0u64;

        b.iter(|| {
            let mut packet = Packet::new(PacketId::new(id));
            id += 1;
            black_box(queue.admit(&mut packet, &mut variates));
        });
    });
}

fn bench_replication(c: &mut Criterion) {
    let mut group = c.benchmark_group("experiment");

    for policy in ["random", "shortest-queue"] {
        let config = SweepConfig::default()
            .with_policy(policy)
            .with_runs(1, 10_000)
            .with_parallel(false);
        let experiment = Experiment::new(config).unwrap();

        group.bench_function(format!("replication_{}", policy), |b| {
            b.iter(|| black_box(experiment.run_replication(0, 1.1, 0).unwrap()));
        });
    }
}

criterion_group!(benches, bench_admission, bench_replication);
criterion_main!(benches);
