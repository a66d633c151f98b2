#[macro_use]
extern crate criterion;

use criterion::{BatchSize, Criterion};

use provbana_core::events::{Event, EventQueue};
use provbana_core::time::Time;

fn bench_event_queue_drain(c: &mut Criterion) {
    let mut group = c.benchmark_group("event_queue_throughput");

    for size in [128u64, 1024, 16384] {
        group.throughput(criterion::Throughput::Elements(size)); // Events per second
        group.bench_function(format!("size_{}", size), |b| {
            b.iter_batched(
                || {
                    // Interleaved times so the heap has real work to do.
                    (0..size)
                        .map(|i| Event::noop(Time::from_nanos((i * 7919) % size), "bench"))
                        .collect::<Vec<_>>()
                },
                |events| {
                    let mut queue = EventQueue::new();
                    queue.add_all(events);
                    while let Some(event) = queue.next() {
                        let _ = event.run();
                    }
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, bench_event_queue_drain);
criterion_main!(benches);
