// Throughput benchmarks for sustained dispatch + emission.
// Run with: cargo bench --bench throughput

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use nebula_core::id::ExecutionId;
use nebula_eventbus::{BackgroundExecutionManager, ExecutionEventType};
use std::sync::Arc;
use tokio::runtime::Runtime;

fn benchmark_dispatch_throughput(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("manager/dispatch");
    group.throughput(Throughput::Elements(1));

    group.bench_function("dispatch_and_complete", |b| {
        b.to_async(&rt).iter(|| async {
            let manager = Arc::new(BackgroundExecutionManager::new());
            let execution_id = ExecutionId::v4();
            manager.dispatch(execution_id, || Box::pin(async { Ok(()) }));
            while manager.is_running(execution_id) {
                tokio::task::yield_now().await;
            }
        });
    });

    group.finish();
}

fn benchmark_event_buffer_fill(c: &mut Criterion) {
    let mut group = c.benchmark_group("manager/buffer_fill");
    group.throughput(Throughput::Elements(1000));

    group.bench_function("1000_events", |b| {
        b.iter(|| {
            let manager = BackgroundExecutionManager::new();
            let execution_id = ExecutionId::v4();
            for i in 0..1000 {
                manager.emit(
                    execution_id,
                    ExecutionEventType::NodeStarted,
                    serde_json::json!(i),
                );
            }
        });
    });

    group.finish();
}

criterion_group!(benches, benchmark_dispatch_throughput, benchmark_event_buffer_fill);
criterion_main!(benches);
