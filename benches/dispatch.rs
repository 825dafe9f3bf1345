//! Dispatch throughput benchmarks
//!
//! Measures the commit pipeline directly on a `Store` and through the
//! dispatcher task, with workspaces of increasing size.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;
use strata::models::{Monitor, MonitorHandle, Rect, Window, WindowHandle, WorkspaceId};
use strata::store::transforms::{
    ActivateWorkspaceTransform, AddWorkspaceTransform, MonitorsChangedTransform,
    MoveWindowToMonitorTransform, WindowAddedTransform,
};
use strata::store::{Store, StoreActor};
use strata::{Context, InternalContext};
use tokio::runtime::Runtime;

/// Two monitors, three workspaces, `windows` windows on the first workspace
fn populated_store(windows: u64) -> (Store, Vec<WorkspaceId>) {
    let mut store = Store::new(
        Arc::new(Context::default()),
        Arc::new(InternalContext::default()),
    );
    let workspaces: Vec<WorkspaceId> = ["one", "two", "three"]
        .into_iter()
        .map(|name| store.dispatch(&AddWorkspaceTransform::new(name)).unwrap())
        .collect();
    let monitors = (0..2u64)
        .map(|index| {
            Monitor::new(
                MonitorHandle::new(index + 1),
                format!("display {index}"),
                Rect::new(index as f64 * 1920.0, 0.0, 1920.0, 1080.0),
            )
        })
        .collect();
    store
        .dispatch(&MonitorsChangedTransform { monitors })
        .unwrap();
    for raw in 1..=windows {
        store
            .dispatch(&WindowAddedTransform::to_workspace(
                Window::new(WindowHandle::new(raw), format!("window {raw}"), "bench"),
                workspaces[0],
            ))
            .unwrap();
    }
    (store, workspaces)
}

/// Swapping a hidden workspace in and out relays out both sides every time
fn bench_activate_workspace(c: &mut Criterion) {
    for windows in [10u64, 50, 200] {
        c.bench_with_input(
            BenchmarkId::new("activate_workspace", windows),
            &windows,
            |b, &windows| {
                let (mut store, workspaces) = populated_store(windows);
                let mut flip = false;
                b.iter(|| {
                    flip = !flip;
                    let target = if flip { workspaces[2] } else { workspaces[0] };
                    black_box(store.dispatch(&ActivateWorkspaceTransform::new(target)))
                });
            },
        );
    }
}

/// The centralized no-op path: nothing changes, nothing is published
fn bench_no_op(c: &mut Criterion) {
    let (mut store, _) = populated_store(50);
    let transform = MoveWindowToMonitorTransform::new(MonitorHandle::new(1), Some(WindowHandle::new(1)));
    c.bench_function("move_to_same_monitor", |b| {
        b.iter(|| black_box(store.dispatch(&transform)))
    });
}

/// Round trip through the dispatcher task and back
fn bench_dispatcher_round_trip(c: &mut Criterion) {
    let rt = Runtime::new().expect("Failed to create Tokio runtime");
    let (store, workspaces) = populated_store(50);
    let handle = rt.block_on(async move { StoreActor::spawn(store) });

    let mut flip = false;
    c.bench_function("dispatcher_round_trip", |b| {
        b.iter(|| {
            flip = !flip;
            let target = if flip { workspaces[2] } else { workspaces[0] };
            rt.block_on(handle.dispatch(ActivateWorkspaceTransform::new(target)))
        })
    });

    rt.block_on(handle.shutdown());
}

criterion_group!(
    benches,
    bench_activate_workspace,
    bench_no_op,
    bench_dispatcher_round_trip
);
criterion_main!(benches);
