//! Immutable aggregate of every sector at one instant

use super::sectors::{MapSector, MonitorSector, WindowSector, WorkspaceSector};
use crate::{StoreError, StoreResult};
use std::collections::HashSet;
use std::sync::Arc;

/// One snapshot of all sector states
///
/// Cloning is cheap: each sector sits behind an `Arc` and is copied only
/// when a transform first writes to it.
#[derive(Debug, Clone, Default)]
pub struct RootState {
    monitors: Arc<MonitorSector>,
    windows: Arc<WindowSector>,
    map: Arc<MapSector>,
    workspaces: Arc<WorkspaceSector>,
}

impl RootState {
    pub fn monitors(&self) -> &MonitorSector {
        &self.monitors
    }

    pub fn windows(&self) -> &WindowSector {
        &self.windows
    }

    pub fn map(&self) -> &MapSector {
        &self.map
    }

    pub fn workspaces(&self) -> &WorkspaceSector {
        &self.workspaces
    }

    pub(crate) fn monitors_mut(&mut self) -> &mut MonitorSector {
        Arc::make_mut(&mut self.monitors)
    }

    pub(crate) fn windows_mut(&mut self) -> &mut WindowSector {
        Arc::make_mut(&mut self.windows)
    }

    pub(crate) fn map_mut(&mut self) -> &mut MapSector {
        Arc::make_mut(&mut self.map)
    }

    pub(crate) fn workspaces_mut(&mut self) -> &mut WorkspaceSector {
        Arc::make_mut(&mut self.workspaces)
    }

    /// True when every sector is the very same allocation as in `other`
    pub fn ptr_eq(&self, other: &RootState) -> bool {
        Arc::ptr_eq(&self.monitors, &other.monitors)
            && Arc::ptr_eq(&self.windows, &other.windows)
            && Arc::ptr_eq(&self.map, &other.map)
            && Arc::ptr_eq(&self.workspaces, &other.workspaces)
    }

    /// Verify the relational invariants between sectors
    pub fn check_integrity(&self) -> StoreResult<()> {
        for (window, workspace_id) in self.map.window_assignments() {
            if !self.windows.contains(window) {
                return Err(violation(format!("map references untracked window {window}")));
            }
            let workspace = self.workspaces.get(workspace_id).ok_or_else(|| {
                violation(format!(
                    "window {window} maps to unknown workspace {workspace_id}"
                ))
            })?;
            if !workspace.contains(window) {
                return Err(violation(format!(
                    "window {window} maps to '{}' but is not in its window list",
                    workspace.name
                )));
            }
        }

        for window in self.windows.handles() {
            if self.map.workspace_for_window(window).is_none() {
                return Err(violation(format!(
                    "window {window} is not assigned to a workspace"
                )));
            }
        }

        for workspace in self.workspaces.iter() {
            for window in &workspace.windows {
                if self.map.workspace_for_window(*window) != Some(workspace.id) {
                    return Err(violation(format!(
                        "workspace '{}' lists window {window} owned elsewhere",
                        workspace.name
                    )));
                }
            }
            if let Some(focused) = workspace.last_focused_window {
                if !workspace.contains(focused) {
                    return Err(violation(format!(
                        "workspace '{}' remembers focus on foreign window {focused}",
                        workspace.name
                    )));
                }
            }
        }

        let mut shown = HashSet::new();
        for (monitor, workspace) in self.map.monitor_assignments() {
            if !self.monitors.contains(monitor) {
                return Err(violation(format!("map references unknown {monitor}")));
            }
            if !self.workspaces.contains(workspace) {
                return Err(violation(format!(
                    "{monitor} shows unknown workspace {workspace}"
                )));
            }
            if !shown.insert(workspace) {
                return Err(violation(format!(
                    "workspace {workspace} is shown on more than one monitor"
                )));
            }
        }

        if let Some(focused) = self.windows.last_focused() {
            if !self.windows.contains(focused) {
                return Err(violation(format!("focus refers to untracked window {focused}")));
            }
        }

        Ok(())
    }
}

fn violation(message: String) -> StoreError {
    StoreError::InvariantViolation(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Monitor, MonitorHandle, Rect, Window, WindowHandle, Workspace, WorkspaceId};

    fn populated() -> (RootState, WorkspaceId, WindowHandle) {
        let mut root = RootState::default();
        let id = WorkspaceId::generate();
        let window = WindowHandle::new(1);
        let monitor = MonitorHandle::new(1);

        let mut workspace = Workspace::new(id, "main", "columns");
        workspace.add_window(window);
        root.workspaces_mut().insert(workspace);
        root.windows_mut().insert(Window::new(window, "shell", "zsh"));
        root.map_mut().assign_window(window, id);
        root.monitors_mut()
            .insert(Monitor::new(monitor, "main", Rect::new(0.0, 0.0, 800.0, 600.0)));
        root.map_mut().show_workspace(monitor, id);
        (root, id, window)
    }

    #[test]
    fn consistent_root_passes() {
        let (root, _, _) = populated();
        assert_eq!(root.check_integrity(), Ok(()));
    }

    #[test]
    fn dangling_window_in_map_is_rejected() {
        let (mut root, _, window) = populated();
        root.windows_mut().remove(window);
        assert!(matches!(
            root.check_integrity(),
            Err(StoreError::InvariantViolation(_))
        ));
    }

    #[test]
    fn workspace_on_two_monitors_is_rejected() {
        let (mut root, id, _) = populated();
        let second = MonitorHandle::new(2);
        root.monitors_mut()
            .insert(Monitor::new(second, "side", Rect::new(800.0, 0.0, 800.0, 600.0)));
        root.map_mut().show_workspace(second, id);
        assert!(root.check_integrity().is_err());
    }

    #[test]
    fn clones_share_sectors_until_written() {
        let (root, _, _) = populated();
        let mut staged = root.clone();
        assert!(staged.ptr_eq(&root));

        staged.windows_mut().set_last_focused(None);
        assert!(!staged.ptr_eq(&root));
        assert!(std::ptr::eq(staged.map(), root.map()));
    }
}
