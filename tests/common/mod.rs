//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::sync::Arc;
use strata::models::{Monitor, MonitorHandle, Rect, Window, WindowHandle, WorkspaceId};
use strata::store::transforms::{
    AddWorkspaceTransform, MonitorsChangedTransform, WindowAddedTransform,
};
use strata::store::{Store, StoreEvent};
use strata::{Context, InternalContext};
use tokio::sync::broadcast;

/// Monitor `index` of a row of 1920x1080 displays
pub fn monitor(index: u64) -> Monitor {
    let monitor = Monitor::new(
        MonitorHandle::new(index + 1),
        format!("display {index}"),
        Rect::new(index as f64 * 1920.0, 0.0, 1920.0, 1080.0),
    );
    if index == 0 {
        monitor.primary()
    } else {
        monitor
    }
}

pub fn window(raw: u64) -> Window {
    Window::new(WindowHandle::new(raw), format!("window {raw}"), "test")
}

pub fn new_store() -> Store {
    Store::new(
        Arc::new(Context::default()),
        Arc::new(InternalContext::default()),
    )
}

/// Store with `monitors` side-by-side displays and `workspaces` workspaces
///
/// Workspace `i` is shown on monitor `i` while there are monitors left.
pub struct Fixture {
    pub store: Store,
    pub monitors: Vec<MonitorHandle>,
    pub workspaces: Vec<WorkspaceId>,
    events: broadcast::Receiver<StoreEvent>,
}

impl Fixture {
    pub fn new(monitors: u64, workspaces: usize) -> Self {
        let mut store = new_store();
        let ids = (0..workspaces)
            .map(|index| {
                store
                    .dispatch(&AddWorkspaceTransform::new(format!("W{}", index + 1)))
                    .expect("workspace")
            })
            .collect();
        let screens: Vec<Monitor> = (0..monitors).map(monitor).collect();
        let handles = screens.iter().map(|monitor| monitor.handle).collect();
        store
            .dispatch(&MonitorsChangedTransform { monitors: screens })
            .expect("monitors");

        let events = store.subscribe();
        Self {
            store,
            monitors: handles,
            workspaces: ids,
            events,
        }
    }

    pub fn add_window(&mut self, raw: u64, workspace: usize) -> WindowHandle {
        self.store
            .dispatch(&WindowAddedTransform::to_workspace(
                window(raw),
                self.workspaces[workspace],
            ))
            .expect("window");
        WindowHandle::new(raw)
    }

    /// Events delivered since the last call
    pub fn drain(&mut self) -> Vec<StoreEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }
}
