//! Map sector: which workspace owns each window and which monitor shows each workspace
//!
//! Cross-sector queries are answered here so the other sectors never reach
//! into each other.

use crate::models::{Monitor, MonitorHandle, WindowHandle, Workspace, WorkspaceId};
use crate::store::RootState;
use crate::{StoreError, StoreResult};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapSector {
    window_workspaces: BTreeMap<WindowHandle, WorkspaceId>,
    monitor_workspaces: BTreeMap<MonitorHandle, WorkspaceId>,
}

impl MapSector {
    pub fn workspace_for_window(&self, window: WindowHandle) -> Option<WorkspaceId> {
        self.window_workspaces.get(&window).copied()
    }

    pub fn workspace_for_monitor(&self, monitor: MonitorHandle) -> Option<WorkspaceId> {
        self.monitor_workspaces.get(&monitor).copied()
    }

    pub fn monitor_for_workspace(&self, workspace: WorkspaceId) -> Option<MonitorHandle> {
        self.monitor_workspaces
            .iter()
            .find(|(_, shown)| **shown == workspace)
            .map(|(monitor, _)| *monitor)
    }

    pub fn is_visible(&self, workspace: WorkspaceId) -> bool {
        self.monitor_for_workspace(workspace).is_some()
    }

    pub fn window_assignments(&self) -> impl Iterator<Item = (WindowHandle, WorkspaceId)> + '_ {
        self.window_workspaces.iter().map(|(w, ws)| (*w, *ws))
    }

    pub fn monitor_assignments(&self) -> impl Iterator<Item = (MonitorHandle, WorkspaceId)> + '_ {
        self.monitor_workspaces.iter().map(|(m, ws)| (*m, *ws))
    }

    /// Assign a window, returning its previous workspace
    pub(crate) fn assign_window(
        &mut self,
        window: WindowHandle,
        workspace: WorkspaceId,
    ) -> Option<WorkspaceId> {
        self.window_workspaces.insert(window, workspace)
    }

    pub(crate) fn unassign_window(&mut self, window: WindowHandle) -> Option<WorkspaceId> {
        self.window_workspaces.remove(&window)
    }

    /// Show a workspace on a monitor, returning the workspace it replaced
    pub(crate) fn show_workspace(
        &mut self,
        monitor: MonitorHandle,
        workspace: WorkspaceId,
    ) -> Option<WorkspaceId> {
        self.monitor_workspaces.insert(monitor, workspace)
    }

    pub(crate) fn clear_monitor(&mut self, monitor: MonitorHandle) -> Option<WorkspaceId> {
        self.monitor_workspaces.remove(&monitor)
    }
}

/// Workspace that owns `window`
pub fn pick_workspace_by_window(window: WindowHandle) -> impl Fn(&RootState) -> StoreResult<Workspace> {
    move |root: &RootState| {
        let id = root
            .map()
            .workspace_for_window(window)
            .ok_or(StoreError::WindowNotFound(window))?;
        root.workspaces()
            .get(id)
            .cloned()
            .ok_or(StoreError::WorkspaceNotFound(id))
    }
}

/// Workspace currently shown on `monitor`
pub fn pick_workspace_by_monitor(monitor: MonitorHandle) -> impl Fn(&RootState) -> StoreResult<Workspace> {
    move |root: &RootState| {
        if !root.monitors().contains(monitor) {
            return Err(StoreError::MonitorNotFound(monitor));
        }
        let id = root
            .map()
            .workspace_for_monitor(monitor)
            .ok_or(StoreError::NoWorkspaceOnMonitor(monitor))?;
        root.workspaces()
            .get(id)
            .cloned()
            .ok_or(StoreError::WorkspaceNotFound(id))
    }
}

/// Monitor showing `workspace`, or `None` while it is hidden
pub fn pick_monitor_by_workspace(
    workspace: WorkspaceId,
) -> impl Fn(&RootState) -> StoreResult<Option<Monitor>> {
    move |root: &RootState| {
        if !root.workspaces().contains(workspace) {
            return Err(StoreError::WorkspaceNotFound(workspace));
        }
        Ok(root
            .map()
            .monitor_for_workspace(workspace)
            .and_then(|handle| root.monitors().get(handle))
            .cloned())
    }
}

/// Monitor showing the workspace that owns `window`, or `None` while that workspace is hidden
pub fn pick_monitor_by_window(window: WindowHandle) -> impl Fn(&RootState) -> StoreResult<Option<Monitor>> {
    move |root: &RootState| {
        let workspace = pick_workspace_by_window(window)(root)?;
        pick_monitor_by_workspace(workspace.id)(root)
    }
}

/// Workspace the user is looking at: the one on the active monitor
pub fn pick_active_workspace() -> impl Fn(&RootState) -> StoreResult<Workspace> {
    |root: &RootState| {
        let monitor = root
            .monitors()
            .active()
            .map(|monitor| monitor.handle)
            .ok_or_else(|| StoreError::InvalidArgument("no monitors are connected".into()))?;
        pick_workspace_by_monitor(monitor)(root)
    }
}

/// Hidden workspaces in creation order
pub fn pick_hidden_workspaces() -> impl Fn(&RootState) -> StoreResult<Vec<Workspace>> {
    |root: &RootState| {
        Ok(root
            .workspaces()
            .iter()
            .filter(|workspace| !root.map().is_visible(workspace.id))
            .cloned()
            .collect())
    }
}
