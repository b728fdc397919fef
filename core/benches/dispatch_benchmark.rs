/// Dispatch path benchmarks using Criterion
///
/// Run with: cargo bench --bench dispatch_benchmark
///
/// Benchmarks cover:
/// - Significance evaluation + sink emission per event
/// - Throttled dispatch
/// - Transport pump throughput into the shared client
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;
use std::time::Duration;
use tidewatch_core::event::{AlertLevel, AlertStatus, ChannelEvent, SatelliteData};
use tidewatch_core::notify::{
    BroadcastSink, Dispatcher, DispatcherConfig, RecordingSink, ThrottlePolicy,
};
use tidewatch_core::stream::{spawn_pump, EventStreamClient};
use tokio::sync::{mpsc, RwLock};

fn make_event(id: u64) -> ChannelEvent {
    if id % 2 == 0 {
        ChannelEvent::AlertStatus(AlertStatus {
            id: format!("alert_{}", id),
            status: if id % 4 == 0 {
                AlertLevel::Safe
            } else {
                AlertLevel::Warning
            },
            level: 0,
            confidence: (id % 100) as f64,
            message: "benchmark".to_string(),
            region: "Pacific".to_string(),
            last_updated: None,
            is_active: true,
            details: None,
        })
    } else {
        ChannelEvent::SatelliteData(SatelliteData {
            id: format!("sat_{}", id),
            image_url: None,
            timestamp: None,
            region: "Pacific".to_string(),
            anomaly_score: (id % 10) as f64 / 10.0,
            metadata: None,
        })
    }
}

/// Benchmark: dispatch into a broadcast sink with no listeners
fn bench_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch");
    let events: Vec<ChannelEvent> = (0..1_000).map(make_event).collect();

    group.throughput(Throughput::Elements(events.len() as u64));
    group.bench_function("broadcast_sink", |b| {
        let d = Dispatcher::new(DispatcherConfig::default(), Arc::new(BroadcastSink::new(64)));
        b.iter(|| {
            for ev in &events {
                black_box(d.dispatch(ev));
            }
        });
    });

    group.bench_function("throttled", |b| {
        let d = Dispatcher::new(
            DispatcherConfig {
                throttle: ThrottlePolicy::MinInterval(Duration::from_secs(60)),
                ..Default::default()
            },
            Arc::new(BroadcastSink::new(64)),
        );
        b.iter(|| {
            for ev in &events {
                black_box(d.dispatch(ev));
            }
        });
    });
    group.finish();
}

/// Benchmark: pump throughput from transport channel into the client
fn bench_pump(c: &mut Criterion) {
    let mut group = c.benchmark_group("pump");

    for event_count in [100, 1_000, 10_000].iter() {
        group.throughput(Throughput::Elements(*event_count as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(event_count),
            event_count,
            |b, &count| {
                let rt = tokio::runtime::Runtime::new().unwrap();
                b.iter(|| {
                    rt.block_on(async {
                        let (tx, rx) = mpsc::channel(1024);
                        let client = Arc::new(RwLock::new(EventStreamClient::new()));
                        let dispatcher = Arc::new(Dispatcher::new(
                            DispatcherConfig::default(),
                            Arc::new(RecordingSink::new()),
                        ));
                        let pump = spawn_pump(rx, Arc::clone(&client), dispatcher);

                        for i in 0..count {
                            tx.send(make_event(i as u64)).await.unwrap();
                        }
                        drop(tx);
                        pump.await.unwrap();
                        black_box(client);
                    })
                });
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_dispatch, bench_pump);
criterion_main!(benches);
