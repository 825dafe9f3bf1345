//! Concrete transforms, grouped by the sector they primarily change

pub mod map;
pub mod monitor;
pub mod window;
pub mod workspace;

pub use map::{
    ActivateWorkspaceTransform, MoveWindowToAdjacentMonitorTransform, MoveWindowToMonitorTransform,
    MoveWindowToWorkspaceTransform,
};
pub use monitor::MonitorsChangedTransform;
pub use window::{
    ReconcileReport, ReconcileWindowsTransform, WindowAddedTransform, WindowFocusedTransform,
    WindowMinimizeEndedTransform, WindowMinimizeStartedTransform, WindowRemovedTransform,
    WindowUpdatedTransform,
};
pub use workspace::{
    AddWorkspaceTransform, DoWorkspaceLayoutTransform, FocusWindowInDirectionTransform,
    RemoveWorkspaceTransform, RenameWorkspaceTransform, SetLayoutEngineTransform,
    SwapWindowInDirectionTransform,
};

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::context::{Context, InternalContext};
    use crate::models::{Monitor, MonitorHandle, Rect, Window, WindowHandle, WorkspaceId};
    use crate::store::{Store, StoreEvent};
    use std::sync::Arc;
    use tokio::sync::broadcast;

    /// A store with monitors side by side and the first workspaces shown on them
    pub(crate) struct Desktop {
        pub store: Store,
        pub monitors: Vec<MonitorHandle>,
        pub workspaces: Vec<WorkspaceId>,
        events: broadcast::Receiver<StoreEvent>,
    }

    impl Desktop {
        pub fn add_window(&mut self, raw: u64, workspace: usize) -> WindowHandle {
            let handle = WindowHandle::new(raw);
            self.store
                .dispatch(&WindowAddedTransform::to_workspace(
                    window(raw),
                    self.workspaces[workspace],
                ))
                .unwrap();
            handle
        }

        pub fn focus(&mut self, window: WindowHandle) {
            self.store
                .dispatch(&WindowFocusedTransform {
                    window: Some(window),
                })
                .unwrap();
        }

        /// Events delivered since the last drain
        pub fn drain(&mut self) -> Vec<StoreEvent> {
            let mut events = Vec::new();
            while let Ok(event) = self.events.try_recv() {
                events.push(event);
            }
            events
        }
    }

    pub(crate) fn window(raw: u64) -> Window {
        Window::new(WindowHandle::new(raw), format!("window {raw}"), "app")
    }

    pub(crate) fn monitor(index: u64) -> Monitor {
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

    pub(crate) fn desktop(monitors: u64, workspaces: usize) -> Desktop {
        let mut store = Store::new(
            Arc::new(Context::default()),
            Arc::new(InternalContext::default()),
        );
        let ids = (0..workspaces)
            .map(|index| {
                store
                    .dispatch(&AddWorkspaceTransform::new(format!("ws{index}")))
                    .unwrap()
            })
            .collect();
        let screens: Vec<Monitor> = (0..monitors).map(monitor).collect();
        let handles = screens.iter().map(|monitor| monitor.handle).collect();
        store
            .dispatch(&MonitorsChangedTransform { monitors: screens })
            .unwrap();

        let events = store.subscribe();
        Desktop {
            store,
            monitors: handles,
            workspaces: ids,
            events,
        }
    }
}
