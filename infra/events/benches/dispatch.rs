use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use herald_events::{Dispatcher, Envelope, Event, EventType, SubscriberHandle};
use std::hint::black_box;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

struct Tick(u64);

impl Event for Tick {
    const EVENT_TYPE: EventType = EventType::from_static("Tick");
}

fn bench_publish_fan_out(c: &mut Criterion) {
    let mut group = c.benchmark_group("publish_fan_out");

    for subscribers in [1_usize, 8, 64, 512] {
        let dispatcher = Dispatcher::new();
        let total = Arc::new(AtomicU64::new(0));
        let handles: Vec<_> = (0..subscribers)
            .map(|i| {
                let total = Arc::clone(&total);
                SubscriberHandle::from_fn(format!("sum-{i}"), move |envelope| {
                    total.fetch_add(envelope.event::<Tick>()?.0, Ordering::Relaxed);
                    Ok(())
                })
            })
            .collect();
        for handle in &handles {
            dispatcher.subscribe(Tick::EVENT_TYPE, handle);
        }

        group.throughput(Throughput::Elements(subscribers as u64));

        group.bench_with_input(BenchmarkId::new("serialized", subscribers), &dispatcher, |b, d| {
            let envelope = Envelope::new(Tick(1));
            b.iter(|| d.publish(black_box(&envelope)));
        });

        let unserialized = Dispatcher::builder().serialize_publish(false).build();
        for handle in &handles {
            unserialized.subscribe(Tick::EVENT_TYPE, handle);
        }
        group.bench_with_input(
            BenchmarkId::new("unserialized", subscribers),
            &unserialized,
            |b, d| {
                let envelope = Envelope::new(Tick(1));
                b.iter(|| d.publish(black_box(&envelope)));
            },
        );
    }

    group.finish();
}

fn bench_subscribe_unsubscribe(c: &mut Criterion) {
    let dispatcher = Dispatcher::new();
    let handle = SubscriberHandle::from_fn("churn", |_| Ok(()));

    c.bench_function("subscribe_unsubscribe", |b| {
        b.iter(|| {
            dispatcher.subscribe("Churn", &handle);
            dispatcher.unsubscribe("Churn", &handle);
        });
    });
}

fn bench_prune_dropped(c: &mut Criterion) {
    c.bench_function("count_after_drop_64", |b| {
        b.iter_batched(
            || {
                let dispatcher = Dispatcher::new();
                for i in 0..64 {
                    let handle = SubscriberHandle::from_fn(format!("gone-{i}"), |_| Ok(()));
                    dispatcher.subscribe("Gone", &handle);
                }
                dispatcher
            },
            |dispatcher| black_box(dispatcher.subscriber_count("Gone")),
            criterion::BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, bench_publish_fan_out, bench_subscribe_unsubscribe, bench_prune_dropped);
criterion_main!(benches);
