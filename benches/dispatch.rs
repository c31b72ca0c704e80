//! Benchmark: Event Dispatch
//!
//! Measures a single fire through N subscribed listeners, plus the filtered
//! (wrong-kind) path. Run: cargo bench --bench dispatch

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use canopy::{
    Agent, EventEnvelope, EventKind, Listener, LogSink, PlanElement, SubscriptionRegistry,
};

/// Cheapest possible real listener
struct CountingListener {
    count: AtomicU64,
}

impl Listener for CountingListener {
    fn listens_for(&self, kind: EventKind) -> bool {
        kind == EventKind::Fire
    }
    fn on_event(&self, _envelope: &EventEnvelope) {
        self.count.fetch_add(1, Ordering::Relaxed);
    }
}

/// Element with `n` subscribed listeners; listeners returned to keep the
/// weak refs alive
fn instrumented_element(n: usize) -> (PlanElement, Vec<Arc<dyn Listener>>) {
    let registry = Arc::new(SubscriptionRegistry::new());
    let sink = Arc::new(LogSink::new(Box::new(std::io::sink())));
    let agent = Agent::new("bench", Arc::clone(&registry), sink);
    let element = agent.action("tick").unwrap();

    let listeners: Vec<Arc<dyn Listener>> = (0..n)
        .map(|_| {
            let listener: Arc<dyn Listener> = Arc::new(CountingListener {
                count: AtomicU64::new(0),
            });
            registry.subscribe(&listener, element.id()).unwrap();
            listener
        })
        .collect();

    (element, listeners)
}

fn bench_fire(c: &mut Criterion) {
    let mut group = c.benchmark_group("fire");
    for n in [1usize, 4, 16] {
        group.bench_with_input(BenchmarkId::new("listeners", n), &n, |b, &n| {
            let (element, _keep) = instrumented_element(n);
            b.iter(|| element.fire(black_box(true)).unwrap());
        });
    }
    group.finish();
}

fn bench_filtered_dispatch(c: &mut Criterion) {
    // Sense events against fire-only listeners: pure filter cost
    c.bench_function("fire/filtered_16", |b| {
        let (element, _keep) = instrumented_element(16);
        b.iter(|| element.sense(black_box(7)).unwrap());
    });
}

fn bench_unobserved_fire(c: &mut Criterion) {
    c.bench_function("fire/unobserved", |b| {
        let (element, _keep) = instrumented_element(0);
        b.iter(|| element.fire(black_box(true)).unwrap());
    });
}

criterion_group!(
    benches,
    bench_fire,
    bench_filtered_dispatch,
    bench_unobserved_fire
);
criterion_main!(benches);
