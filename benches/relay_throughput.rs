//! Relay throughput benchmark.
//!
//! Measures the engine-side cost of `on_engine_message` (payload build and
//! hand-off to the dispatcher) and the full engine → listener round trip.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;
use unity_message_relay::types::SubscriptionId;
use unity_message_relay::{Config, HostContext, Registry, EVENT_NAME};

fn bench_on_engine_message(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let _guard = rt.enter();
    let host = HostContext::with_registry(Config::default(), Arc::new(Registry::new())).unwrap();
    let relay = host.relay();
    let message_sizes: &[usize] = &[0, 64, 1024, 16384];

    let mut group = c.benchmark_group("on_engine_message");
    for &size in message_sizes {
        let message = "x".repeat(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &message, |b, m| {
            b.iter(|| relay.on_engine_message(black_box(m)).unwrap());
        });
    }
    group.finish();
}

fn bench_round_trip(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let (host, mut rx) = rt.block_on(async {
        let host =
            HostContext::with_registry(Config::default(), Arc::new(Registry::new())).unwrap();
        let (_sub, rx) = host
            .bus()
            .subscribe(SubscriptionId::new(), vec![EVENT_NAME.to_string()])
            .await
            .unwrap();
        (host, rx)
    });
    let relay = host.relay();
    let message = "ROOM_EVENTS_UPDATE|{\"roomID\":\"lobby\",\"events\":[]}";

    c.bench_function("round_trip", |b| {
        b.iter(|| {
            relay.on_engine_message(black_box(message)).unwrap();
            rt.block_on(rx.recv()).unwrap()
        });
    });
}

criterion_group!(benches, bench_on_engine_message, bench_round_trip);
criterion_main!(benches);
