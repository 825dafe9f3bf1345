//! Moving windows between workspaces and workspaces between monitors

use super::window::WindowFocusedTransform;
use crate::models::{MonitorHandle, WindowHandle, WorkspaceId};
use crate::store::sectors::map::{
    pick_monitor_by_window, pick_workspace_by_monitor, pick_workspace_by_window,
};
use crate::store::sectors::monitor::{pick_adjacent_monitor, pick_monitor};
use crate::store::sectors::workspace::pick_workspace;
use crate::store::{StoreEvent, Transform, TransformContext};
use crate::{StoreError, StoreResult};
use tracing::debug;

fn active_monitor(cx: &TransformContext<'_>) -> StoreResult<MonitorHandle> {
    cx.root()
        .monitors()
        .active()
        .map(|monitor| monitor.handle)
        .ok_or_else(|| StoreError::InvalidArgument("no monitors are connected".to_string()))
}

/// Move a window (the last focused one when absent) into a workspace
#[derive(Debug, Clone)]
pub struct MoveWindowToWorkspaceTransform {
    pub workspace: WorkspaceId,
    pub window: Option<WindowHandle>,
    /// Leave both workspaces' placements untouched
    ///
    /// When false, the source is laid out again as well as the target, so a
    /// visible source that still holds windows closes the gap. An emptied
    /// or hidden source produces no layout.
    pub skip_layout: bool,
}

impl MoveWindowToWorkspaceTransform {
    pub fn new(workspace: WorkspaceId, window: Option<WindowHandle>) -> Self {
        Self {
            workspace,
            window,
            skip_layout: false,
        }
    }
}

impl Transform for MoveWindowToWorkspaceTransform {
    type Output = ();

    fn name(&self) -> &'static str {
        "move_window_to_workspace"
    }

    fn execute(&self, cx: &mut TransformContext<'_>) -> StoreResult<()> {
        let window = cx.resolve_window(self.window)?;
        let target = cx.pick(&pick_workspace(self.workspace))?;
        let source = cx.pick(&pick_workspace_by_window(window))?;

        if source.id == target.id {
            debug!(%window, workspace = %target.name, "Window is already in workspace");
            return Ok(());
        }
        debug!(%window, from = %source.name, to = %target.name, "Moving window to workspace");

        let focused = cx.root().windows().last_focused() == Some(window);
        cx.update_workspace(source.id, |ws| ws.remove_window(window))?;
        cx.update_workspace(target.id, |ws| {
            ws.add_window(window);
            if focused {
                ws.last_focused_window = Some(window);
            }
        })?;
        cx.map_mut().assign_window(window, target.id);
        cx.queue_event(StoreEvent::WindowMovedToWorkspace {
            window,
            from: Some(source.id),
            to: target.id,
        });

        if !self.skip_layout {
            cx.do_layout(source.id)?;
            cx.do_layout(target.id)?;
        }
        Ok(())
    }
}

/// Move a window (the last focused one when absent) to the workspace shown on a monitor
#[derive(Debug, Clone)]
pub struct MoveWindowToMonitorTransform {
    pub monitor: MonitorHandle,
    pub window: Option<WindowHandle>,
}

impl MoveWindowToMonitorTransform {
    pub fn new(monitor: MonitorHandle, window: Option<WindowHandle>) -> Self {
        Self { monitor, window }
    }
}

impl Transform for MoveWindowToMonitorTransform {
    type Output = ();

    fn name(&self) -> &'static str {
        "move_window_to_monitor"
    }

    fn execute(&self, cx: &mut TransformContext<'_>) -> StoreResult<()> {
        let window = cx.resolve_window(self.window)?;
        debug!(%window, monitor = %self.monitor, "Moving window to monitor");

        let workspace = cx.pick(&pick_workspace_by_monitor(self.monitor))?;
        let current = cx.pick(&pick_monitor_by_window(window))?;
        if current.is_some_and(|monitor| monitor.handle == self.monitor) {
            debug!(%window, monitor = %self.monitor, "Window is already on monitor");
            return Ok(());
        }

        cx.delegate(&MoveWindowToWorkspaceTransform::new(workspace.id, Some(window)))
    }
}

/// Move a window to the spatially next (or previous) monitor
#[derive(Debug, Clone)]
pub struct MoveWindowToAdjacentMonitorTransform {
    pub window: Option<WindowHandle>,
    pub reverse: bool,
}

impl Transform for MoveWindowToAdjacentMonitorTransform {
    type Output = ();

    fn name(&self) -> &'static str {
        "move_window_to_adjacent_monitor"
    }

    fn execute(&self, cx: &mut TransformContext<'_>) -> StoreResult<()> {
        let window = cx.resolve_window(self.window)?;
        let current = match cx.pick(&pick_monitor_by_window(window))? {
            Some(monitor) => monitor.handle,
            None => active_monitor(cx)?,
        };
        let target = cx.pick(&pick_adjacent_monitor(current, self.reverse))?;
        if target.handle == current {
            return Ok(());
        }

        cx.delegate(&MoveWindowToMonitorTransform::new(target.handle, Some(window)))
    }
}

/// Show a workspace on a monitor (the active one when absent)
///
/// A workspace already visible on another monitor trades places with the
/// workspace currently on the target monitor. The workspace's remembered
/// window receives focus.
#[derive(Debug, Clone)]
pub struct ActivateWorkspaceTransform {
    pub workspace: WorkspaceId,
    pub monitor: Option<MonitorHandle>,
}

impl ActivateWorkspaceTransform {
    pub fn new(workspace: WorkspaceId) -> Self {
        Self {
            workspace,
            monitor: None,
        }
    }
}

impl Transform for ActivateWorkspaceTransform {
    type Output = ();

    fn name(&self) -> &'static str {
        "activate_workspace"
    }

    fn execute(&self, cx: &mut TransformContext<'_>) -> StoreResult<()> {
        let workspace = cx.pick(&pick_workspace(self.workspace))?;
        let monitor = match self.monitor {
            Some(handle) => cx.pick(&pick_monitor(handle))?.handle,
            None => active_monitor(cx)?,
        };

        let displaced = cx.root().map().workspace_for_monitor(monitor);
        if displaced == Some(workspace.id) {
            return Ok(());
        }
        let previous_monitor = cx.root().map().monitor_for_workspace(workspace.id);
        debug!(workspace = %workspace.name, %monitor, "Activating workspace");

        cx.map_mut().show_workspace(monitor, workspace.id);
        cx.queue_event(StoreEvent::WorkspaceShownOnMonitor {
            workspace: workspace.id,
            monitor,
            previous: displaced,
        });

        let mut swapped = None;
        if let Some(previous_monitor) = previous_monitor {
            match displaced {
                Some(other) => {
                    cx.map_mut().show_workspace(previous_monitor, other);
                    cx.queue_event(StoreEvent::WorkspaceShownOnMonitor {
                        workspace: other,
                        monitor: previous_monitor,
                        previous: Some(workspace.id),
                    });
                    swapped = Some(other);
                }
                None => {
                    cx.map_mut().clear_monitor(previous_monitor);
                }
            }
        }

        if cx.root().monitors().active().map(|m| m.handle) != Some(monitor) {
            cx.monitors_mut().set_active(Some(monitor));
        }

        cx.do_layout(workspace.id)?;
        if let Some(other) = swapped {
            cx.do_layout(other)?;
        }

        if let Some(window) = workspace.last_focused_window {
            cx.delegate(&WindowFocusedTransform {
                window: Some(window),
            })?;
        }
        Ok(())
    }
}
