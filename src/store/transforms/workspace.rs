//! Workspace lifecycle and in-workspace navigation

use super::window::WindowFocusedTransform;
use crate::models::{Direction, WindowHandle, Workspace, WorkspaceId};
use crate::store::sectors::map::pick_hidden_workspaces;
use crate::store::sectors::workspace::pick_workspace;
use crate::store::{StoreEvent, Transform, TransformContext};
use crate::{StoreError, StoreResult};
use tracing::debug;

fn validate_name(cx: &TransformContext<'_>, id: WorkspaceId, name: &str) -> StoreResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(StoreError::InvalidArgument(
            "workspace name cannot be empty".to_string(),
        ));
    }
    if let Some(existing) = cx.root().workspaces().find_by_name(name) {
        if existing.id != id {
            return Err(StoreError::InvalidArgument(format!(
                "a workspace named '{name}' already exists"
            )));
        }
    }
    Ok(name.to_string())
}

fn validate_engine(cx: &TransformContext<'_>, engine: &str) -> StoreResult<()> {
    if cx.context().layouts.contains(engine) {
        Ok(())
    } else {
        Err(StoreError::InvalidArgument(format!(
            "unknown layout engine '{engine}'"
        )))
    }
}

/// Create a workspace
///
/// The id is generated when the transform is built, so dispatching the same
/// value twice creates one workspace.
#[derive(Debug, Clone)]
pub struct AddWorkspaceTransform {
    pub id: WorkspaceId,
    pub name: String,
    /// Registry default when absent
    pub layout_engine: Option<String>,
}

impl AddWorkspaceTransform {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: WorkspaceId::generate(),
            name: name.into(),
            layout_engine: None,
        }
    }

    pub fn with_layout(mut self, layout_engine: impl Into<String>) -> Self {
        self.layout_engine = Some(layout_engine.into());
        self
    }
}

impl Transform for AddWorkspaceTransform {
    type Output = WorkspaceId;

    fn name(&self) -> &'static str {
        "add_workspace"
    }

    fn execute(&self, cx: &mut TransformContext<'_>) -> StoreResult<WorkspaceId> {
        if cx.root().workspaces().contains(self.id) {
            return Ok(self.id);
        }

        let name = validate_name(cx, self.id, &self.name)?;
        let engine = self
            .layout_engine
            .clone()
            .unwrap_or_else(|| cx.context().layouts.default_engine().to_string());
        validate_engine(cx, &engine)?;

        debug!(workspace = %name, layout = %engine, "Creating workspace");
        cx.workspaces_mut()
            .insert(Workspace::new(self.id, name.clone(), engine));
        cx.queue_event(StoreEvent::WorkspaceAdded {
            workspace: self.id,
            name,
        });

        // A monitor left without a workspace picks up the new one
        let empty_monitor = cx
            .root()
            .monitors()
            .spatial_order()
            .into_iter()
            .find(|monitor| cx.root().map().workspace_for_monitor(*monitor).is_none());
        if let Some(monitor) = empty_monitor {
            cx.map_mut().show_workspace(monitor, self.id);
            cx.queue_event(StoreEvent::WorkspaceShownOnMonitor {
                workspace: self.id,
                monitor,
                previous: None,
            });
        }
        Ok(self.id)
    }
}

/// Delete a workspace after moving its windows elsewhere
///
/// A visible workspace is replaced on its monitor by the first hidden one,
/// which also receives the windows. The last workspace cannot be removed.
#[derive(Debug, Clone)]
pub struct RemoveWorkspaceTransform {
    pub workspace: WorkspaceId,
}

impl Transform for RemoveWorkspaceTransform {
    type Output = ();

    fn name(&self) -> &'static str {
        "remove_workspace"
    }

    fn execute(&self, cx: &mut TransformContext<'_>) -> StoreResult<()> {
        let workspace = cx.pick(&pick_workspace(self.workspace))?;
        if cx.root().workspaces().len() <= 1 {
            return Err(StoreError::InvalidArgument(
                "cannot remove the last workspace".to_string(),
            ));
        }

        let monitor = cx.root().map().monitor_for_workspace(workspace.id);
        let replacement = cx
            .pick(&pick_hidden_workspaces())?
            .into_iter()
            .find(|candidate| candidate.id != workspace.id)
            .map(|candidate| candidate.id);

        let fallback = match (monitor, replacement) {
            (Some(_), None) => {
                return Err(StoreError::InvalidArgument(format!(
                    "no hidden workspace can replace '{}' on its monitor",
                    workspace.name
                )))
            }
            (_, Some(id)) => id,
            (None, None) => cx
                .root()
                .workspaces()
                .ids()
                .iter()
                .copied()
                .find(|id| *id != workspace.id)
                .ok_or(StoreError::WorkspaceNotFound(workspace.id))?,
        };

        if let Some(monitor) = monitor {
            cx.map_mut().show_workspace(monitor, fallback);
            cx.queue_event(StoreEvent::WorkspaceShownOnMonitor {
                workspace: fallback,
                monitor,
                previous: Some(workspace.id),
            });
        }

        for window in &workspace.windows {
            cx.map_mut().assign_window(*window, fallback);
            cx.update_workspace(fallback, |ws| ws.add_window(*window))?;
            cx.queue_event(StoreEvent::WindowMovedToWorkspace {
                window: *window,
                from: Some(workspace.id),
                to: fallback,
            });
        }

        cx.workspaces_mut().remove(workspace.id);
        cx.queue_event(StoreEvent::WorkspaceRemoved {
            workspace: workspace.id,
            name: workspace.name.clone(),
        });
        debug!(workspace = %workspace.name, windows = workspace.windows.len(), "Removed workspace");

        cx.do_layout(fallback)?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct RenameWorkspaceTransform {
    pub workspace: WorkspaceId,
    pub name: String,
}

impl Transform for RenameWorkspaceTransform {
    type Output = ();

    fn name(&self) -> &'static str {
        "rename_workspace"
    }

    fn execute(&self, cx: &mut TransformContext<'_>) -> StoreResult<()> {
        let workspace = cx.pick(&pick_workspace(self.workspace))?;
        let name = validate_name(cx, workspace.id, &self.name)?;
        if workspace.name == name {
            return Ok(());
        }

        cx.update_workspace(workspace.id, |ws| ws.name = name.clone())?;
        cx.queue_event(StoreEvent::WorkspaceRenamed {
            workspace: workspace.id,
            previous_name: workspace.name,
            name,
        });
        Ok(())
    }
}

/// Switch the layout engine of a workspace (the current one when absent)
#[derive(Debug, Clone)]
pub struct SetLayoutEngineTransform {
    pub workspace: Option<WorkspaceId>,
    pub layout_engine: String,
}

impl Transform for SetLayoutEngineTransform {
    type Output = ();

    fn name(&self) -> &'static str {
        "set_layout_engine"
    }

    fn execute(&self, cx: &mut TransformContext<'_>) -> StoreResult<()> {
        let id = cx.resolve_workspace(self.workspace)?;
        validate_engine(cx, &self.layout_engine)?;
        let workspace = cx.pick(&pick_workspace(id))?;
        if workspace.layout_engine == self.layout_engine {
            return Ok(());
        }

        cx.update_workspace(id, |ws| ws.layout_engine = self.layout_engine.clone())?;
        cx.queue_event(StoreEvent::WorkspaceLayoutEngineChanged {
            workspace: id,
            previous: workspace.layout_engine,
            current: self.layout_engine.clone(),
        });
        cx.do_layout(id)?;
        Ok(())
    }
}

/// Recompute placements for a workspace (the current one when absent)
///
/// Returns false when the workspace was skipped because it is hidden or has
/// nothing to place.
#[derive(Debug, Clone, Default)]
pub struct DoWorkspaceLayoutTransform {
    pub workspace: Option<WorkspaceId>,
}

impl Transform for DoWorkspaceLayoutTransform {
    type Output = bool;

    fn name(&self) -> &'static str {
        "do_workspace_layout"
    }

    fn execute(&self, cx: &mut TransformContext<'_>) -> StoreResult<bool> {
        let id = cx.resolve_workspace(self.workspace)?;
        cx.do_layout(id)
    }
}

/// Move focus to the next or previous window in workspace order
#[derive(Debug, Clone)]
pub struct FocusWindowInDirectionTransform {
    pub workspace: Option<WorkspaceId>,
    pub window: Option<WindowHandle>,
    pub direction: Direction,
}

impl FocusWindowInDirectionTransform {
    pub fn new(direction: Direction) -> Self {
        Self {
            workspace: None,
            window: None,
            direction,
        }
    }
}

impl Transform for FocusWindowInDirectionTransform {
    type Output = ();

    fn name(&self) -> &'static str {
        "focus_window_in_direction"
    }

    fn execute(&self, cx: &mut TransformContext<'_>) -> StoreResult<()> {
        let id = cx.resolve_workspace(self.workspace)?;
        let (workspace, window) = cx.resolve_workspace_window(id, self.window, true, true)?;
        let Some(start) = workspace.position_of(window) else {
            return Err(StoreError::WindowNotFound(window));
        };

        let len = workspace.windows.len();
        let mut index = start;
        let target = loop {
            index = self.direction.step(index, len);
            if index == start {
                return Ok(());
            }
            let candidate = workspace.windows[index];
            let minimized = cx
                .root()
                .windows()
                .get(candidate)
                .map(|w| w.is_minimized)
                .unwrap_or(true);
            if !minimized {
                break candidate;
            }
        };

        cx.delegate(&WindowFocusedTransform {
            window: Some(target),
        })
    }
}

/// Swap a window with its neighbour in workspace order
#[derive(Debug, Clone)]
pub struct SwapWindowInDirectionTransform {
    pub workspace: Option<WorkspaceId>,
    pub window: Option<WindowHandle>,
    pub direction: Direction,
}

impl SwapWindowInDirectionTransform {
    pub fn new(direction: Direction) -> Self {
        Self {
            workspace: None,
            window: None,
            direction,
        }
    }
}

impl Transform for SwapWindowInDirectionTransform {
    type Output = ();

    fn name(&self) -> &'static str {
        "swap_window_in_direction"
    }

    fn execute(&self, cx: &mut TransformContext<'_>) -> StoreResult<()> {
        let id = cx.resolve_workspace(self.workspace)?;
        let (workspace, window) = cx.resolve_workspace_window(id, self.window, true, true)?;
        let Some(index) = workspace.position_of(window) else {
            return Err(StoreError::WindowNotFound(window));
        };

        let other = self.direction.step(index, workspace.windows.len());
        if other == index {
            return Ok(());
        }

        cx.update_workspace(id, |ws| ws.windows.swap(index, other))?;
        cx.do_layout(id)?;
        Ok(())
    }
}
