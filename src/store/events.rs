//! Events raised by transforms and delivered after commit

use crate::models::{MonitorHandle, WindowHandle, WindowPlacement, WorkspaceId};
use serde::Serialize;

/// State partitions, listed in registration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SectorKind {
    Monitor,
    Window,
    Map,
    Workspace,
}

impl SectorKind {
    /// Order in which sector queues are flushed after a commit
    pub const ORDER: [SectorKind; 4] = [
        SectorKind::Monitor,
        SectorKind::Window,
        SectorKind::Map,
        SectorKind::Workspace,
    ];
}

/// Typed notification describing a committed change
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreEvent {
    MonitorsChanged {
        added: Vec<MonitorHandle>,
        removed: Vec<MonitorHandle>,
        unchanged: Vec<MonitorHandle>,
    },
    WindowAdded {
        window: WindowHandle,
        workspace: WorkspaceId,
    },
    WindowRemoved {
        window: WindowHandle,
        workspace: Option<WorkspaceId>,
    },
    WindowFocused {
        window: Option<WindowHandle>,
    },
    WindowMinimizeStarted {
        window: WindowHandle,
    },
    WindowMinimizeEnded {
        window: WindowHandle,
    },
    WindowUpdated {
        window: WindowHandle,
        title: String,
    },
    WindowMovedToWorkspace {
        window: WindowHandle,
        from: Option<WorkspaceId>,
        to: WorkspaceId,
    },
    WorkspaceShownOnMonitor {
        workspace: WorkspaceId,
        monitor: MonitorHandle,
        previous: Option<WorkspaceId>,
    },
    WorkspaceAdded {
        workspace: WorkspaceId,
        name: String,
    },
    WorkspaceRemoved {
        workspace: WorkspaceId,
        name: String,
    },
    WorkspaceRenamed {
        workspace: WorkspaceId,
        previous_name: String,
        name: String,
    },
    WorkspaceLayoutEngineChanged {
        workspace: WorkspaceId,
        previous: String,
        current: String,
    },
    WorkspaceLayoutCompleted {
        workspace: WorkspaceId,
        monitor: MonitorHandle,
        placements: Vec<WindowPlacement>,
    },
}

impl StoreEvent {
    /// Sector whose queue carries this event
    pub fn sector(&self) -> SectorKind {
        match self {
            StoreEvent::MonitorsChanged { .. } => SectorKind::Monitor,
            StoreEvent::WindowAdded { .. }
            | StoreEvent::WindowRemoved { .. }
            | StoreEvent::WindowFocused { .. }
            | StoreEvent::WindowMinimizeStarted { .. }
            | StoreEvent::WindowMinimizeEnded { .. }
            | StoreEvent::WindowUpdated { .. } => SectorKind::Window,
            StoreEvent::WindowMovedToWorkspace { .. }
            | StoreEvent::WorkspaceShownOnMonitor { .. } => SectorKind::Map,
            StoreEvent::WorkspaceAdded { .. }
            | StoreEvent::WorkspaceRemoved { .. }
            | StoreEvent::WorkspaceRenamed { .. }
            | StoreEvent::WorkspaceLayoutEngineChanged { .. }
            | StoreEvent::WorkspaceLayoutCompleted { .. } => SectorKind::Workspace,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            StoreEvent::MonitorsChanged { .. } => "monitors_changed",
            StoreEvent::WindowAdded { .. } => "window_added",
            StoreEvent::WindowRemoved { .. } => "window_removed",
            StoreEvent::WindowFocused { .. } => "window_focused",
            StoreEvent::WindowMinimizeStarted { .. } => "window_minimize_started",
            StoreEvent::WindowMinimizeEnded { .. } => "window_minimize_ended",
            StoreEvent::WindowUpdated { .. } => "window_updated",
            StoreEvent::WindowMovedToWorkspace { .. } => "window_moved_to_workspace",
            StoreEvent::WorkspaceShownOnMonitor { .. } => "workspace_shown_on_monitor",
            StoreEvent::WorkspaceAdded { .. } => "workspace_added",
            StoreEvent::WorkspaceRemoved { .. } => "workspace_removed",
            StoreEvent::WorkspaceRenamed { .. } => "workspace_renamed",
            StoreEvent::WorkspaceLayoutEngineChanged { .. } => "workspace_layout_engine_changed",
            StoreEvent::WorkspaceLayoutCompleted { .. } => "workspace_layout_completed",
        }
    }
}

/// Per-sector pending event buffers for one transform execution
#[derive(Debug, Default, Clone)]
pub struct EventQueues {
    monitor: Vec<StoreEvent>,
    window: Vec<StoreEvent>,
    map: Vec<StoreEvent>,
    workspace: Vec<StoreEvent>,
}

/// Queue lengths captured before a nested transform runs
#[derive(Debug, Clone, Copy)]
pub(crate) struct QueueMark([usize; 4]);

impl EventQueues {
    pub fn push(&mut self, event: StoreEvent) {
        self.queue_mut(event.sector()).push(event);
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn len(&self) -> usize {
        self.monitor.len() + self.window.len() + self.map.len() + self.workspace.len()
    }

    pub fn queued(&self, sector: SectorKind) -> &[StoreEvent] {
        match sector {
            SectorKind::Monitor => &self.monitor,
            SectorKind::Window => &self.window,
            SectorKind::Map => &self.map,
            SectorKind::Workspace => &self.workspace,
        }
    }

    /// Empty every queue, returning events in sector registration order
    pub fn drain_ordered(&mut self) -> Vec<StoreEvent> {
        let mut events = Vec::with_capacity(self.len());
        for sector in SectorKind::ORDER {
            events.append(self.queue_mut(sector));
        }
        events
    }

    pub(crate) fn mark(&self) -> QueueMark {
        QueueMark([
            self.monitor.len(),
            self.window.len(),
            self.map.len(),
            self.workspace.len(),
        ])
    }

    /// Drop everything queued after `mark`
    pub(crate) fn rollback(&mut self, mark: QueueMark) {
        for (sector, len) in SectorKind::ORDER.into_iter().zip(mark.0) {
            self.queue_mut(sector).truncate(len);
        }
    }

    fn queue_mut(&mut self, sector: SectorKind) -> &mut Vec<StoreEvent> {
        match sector {
            SectorKind::Monitor => &mut self.monitor,
            SectorKind::Window => &mut self.window,
            SectorKind::Map => &mut self.map,
            SectorKind::Workspace => &mut self.workspace,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_follows_sector_order_not_enqueue_order() {
        let window = WindowHandle::new(1);
        let workspace = WorkspaceId::generate();
        let mut queues = EventQueues::default();

        queues.push(StoreEvent::WorkspaceAdded {
            workspace,
            name: "dev".into(),
        });
        queues.push(StoreEvent::WindowMovedToWorkspace {
            window,
            from: None,
            to: workspace,
        });
        queues.push(StoreEvent::WindowFocused {
            window: Some(window),
        });
        queues.push(StoreEvent::WindowUpdated {
            window,
            title: "editor".into(),
        });

        let names: Vec<_> = queues.drain_ordered().iter().map(StoreEvent::name).collect();
        assert_eq!(
            names,
            vec![
                "window_focused",
                "window_updated",
                "window_moved_to_workspace",
                "workspace_added"
            ]
        );
        assert!(queues.is_empty());
    }

    #[test]
    fn rollback_discards_events_after_mark() {
        let mut queues = EventQueues::default();
        queues.push(StoreEvent::WindowFocused { window: None });
        let mark = queues.mark();
        queues.push(StoreEvent::WindowFocused {
            window: Some(WindowHandle::new(2)),
        });
        queues.push(StoreEvent::MonitorsChanged {
            added: vec![],
            removed: vec![],
            unchanged: vec![],
        });

        queues.rollback(mark);
        assert_eq!(queues.len(), 1);
        assert!(queues.queued(SectorKind::Monitor).is_empty());
    }
}
