//! Transforms driven by native window notifications

use crate::models::{Window, WindowHandle, WorkspaceId};
use crate::store::sectors::map::{pick_active_workspace, pick_workspace_by_window};
use crate::store::sectors::window::pick_window;
use crate::store::sectors::workspace::pick_workspace;
use crate::store::{StoreEvent, Transform, TransformContext};
use crate::{StoreError, StoreResult};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, trace};

/// Start tracking a window that appeared
///
/// The window goes to the given workspace, else to the workspace shown on the
/// monitor the native layer reported it on, else to the active workspace.
#[derive(Debug, Clone)]
pub struct WindowAddedTransform {
    pub window: Window,
    pub workspace: Option<WorkspaceId>,
}

impl WindowAddedTransform {
    pub fn new(window: Window) -> Self {
        Self {
            window,
            workspace: None,
        }
    }

    pub fn to_workspace(window: Window, workspace: WorkspaceId) -> Self {
        Self {
            window,
            workspace: Some(workspace),
        }
    }

    fn route(&self, cx: &TransformContext<'_>) -> StoreResult<WorkspaceId> {
        if let Some(id) = self.workspace {
            return cx.pick(&pick_workspace(id)).map(|workspace| workspace.id);
        }

        let reported = self
            .window
            .monitor
            .and_then(|monitor| cx.root().map().workspace_for_monitor(monitor));
        if let Some(id) = reported {
            return Ok(id);
        }

        match cx.pick(&pick_active_workspace()) {
            Ok(workspace) => Ok(workspace.id),
            Err(err) => cx
                .root()
                .workspaces()
                .ids()
                .first()
                .copied()
                .ok_or_else(|| {
                    StoreError::InvalidArgument(format!(
                        "no workspace can take window {}: {err}",
                        self.window.handle
                    ))
                }),
        }
    }
}

impl Transform for WindowAddedTransform {
    type Output = WorkspaceId;

    fn name(&self) -> &'static str {
        "window_added"
    }

    fn execute(&self, cx: &mut TransformContext<'_>) -> StoreResult<WorkspaceId> {
        let handle = self.window.handle;
        if let Some(existing) = cx.root().map().workspace_for_window(handle) {
            trace!(window = %handle, "Window already tracked");
            return Ok(existing);
        }

        let workspace = self.route(cx)?;
        debug!(window = %handle, %workspace, "Tracking new window");

        cx.windows_mut().insert(self.window.clone());
        cx.map_mut().assign_window(handle, workspace);
        cx.update_workspace(workspace, |ws| ws.add_window(handle))?;
        cx.queue_event(StoreEvent::WindowAdded {
            window: handle,
            workspace,
        });
        cx.do_layout(workspace)?;
        Ok(workspace)
    }
}

/// Stop tracking a destroyed window
#[derive(Debug, Clone)]
pub struct WindowRemovedTransform {
    pub window: WindowHandle,
}

impl Transform for WindowRemovedTransform {
    type Output = ();

    fn name(&self) -> &'static str {
        "window_removed"
    }

    fn execute(&self, cx: &mut TransformContext<'_>) -> StoreResult<()> {
        let handle = self.window;
        cx.pick(&pick_window(handle))?;

        cx.windows_mut().remove(handle);
        let workspace = cx.map_mut().unassign_window(handle);
        if let Some(id) = workspace {
            cx.update_workspace(id, |ws| ws.remove_window(handle))?;
        }
        cx.queue_event(StoreEvent::WindowRemoved {
            window: handle,
            workspace,
        });

        if let Some(id) = workspace {
            cx.do_layout(id)?;
        }
        Ok(())
    }
}

/// Record that a window received focus, or that focus left every tracked window
#[derive(Debug, Clone)]
pub struct WindowFocusedTransform {
    pub window: Option<WindowHandle>,
}

impl Transform for WindowFocusedTransform {
    type Output = ();

    fn name(&self) -> &'static str {
        "window_focused"
    }

    fn execute(&self, cx: &mut TransformContext<'_>) -> StoreResult<()> {
        if cx.root().windows().last_focused() == self.window {
            return Ok(());
        }

        let Some(handle) = self.window else {
            cx.windows_mut().set_last_focused(None);
            cx.queue_event(StoreEvent::WindowFocused { window: None });
            return Ok(());
        };

        let workspace = cx.pick(&pick_workspace_by_window(handle))?;
        cx.windows_mut().set_last_focused(Some(handle));
        cx.update_workspace(workspace.id, |ws| ws.last_focused_window = Some(handle))?;

        if let Some(monitor) = cx.root().map().monitor_for_workspace(workspace.id) {
            if cx.root().monitors().active().map(|m| m.handle) != Some(monitor) {
                cx.monitors_mut().set_active(Some(monitor));
            }
        }

        cx.queue_event(StoreEvent::WindowFocused {
            window: Some(handle),
        });
        Ok(())
    }
}

fn set_minimized(
    cx: &mut TransformContext<'_>,
    handle: WindowHandle,
    minimized: bool,
) -> StoreResult<Option<WorkspaceId>> {
    let window = cx.pick(&pick_window(handle))?;
    let workspace = cx.pick(&pick_workspace_by_window(handle))?;
    if window.is_minimized == minimized {
        return Ok(None);
    }
    if let Some(window) = cx.windows_mut().get_mut(handle) {
        window.is_minimized = minimized;
    }
    Ok(Some(workspace.id))
}

/// A window was minimized; the rest of its workspace closes the gap
#[derive(Debug, Clone)]
pub struct WindowMinimizeStartedTransform {
    pub window: WindowHandle,
}

impl Transform for WindowMinimizeStartedTransform {
    type Output = ();

    fn name(&self) -> &'static str {
        "window_minimize_started"
    }

    fn execute(&self, cx: &mut TransformContext<'_>) -> StoreResult<()> {
        let Some(workspace) = set_minimized(cx, self.window, true)? else {
            return Ok(());
        };
        cx.queue_event(StoreEvent::WindowMinimizeStarted {
            window: self.window,
        });
        cx.do_layout(workspace)?;
        Ok(())
    }
}

/// A minimized window was restored and rejoins the layout
#[derive(Debug, Clone)]
pub struct WindowMinimizeEndedTransform {
    pub window: WindowHandle,
}

impl Transform for WindowMinimizeEndedTransform {
    type Output = ();

    fn name(&self) -> &'static str {
        "window_minimize_ended"
    }

    fn execute(&self, cx: &mut TransformContext<'_>) -> StoreResult<()> {
        let Some(workspace) = set_minimized(cx, self.window, false)? else {
            return Ok(());
        };
        cx.queue_event(StoreEvent::WindowMinimizeEnded {
            window: self.window,
        });
        cx.do_layout(workspace)?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct WindowUpdatedTransform {
    pub window: WindowHandle,
    pub title: String,
}

impl Transform for WindowUpdatedTransform {
    type Output = ();

    fn name(&self) -> &'static str {
        "window_updated"
    }

    fn execute(&self, cx: &mut TransformContext<'_>) -> StoreResult<()> {
        let window = cx.pick(&pick_window(self.window))?;
        if window.title == self.title {
            return Ok(());
        }
        if let Some(window) = cx.windows_mut().get_mut(self.window) {
            window.title = self.title.clone();
        }
        cx.queue_event(StoreEvent::WindowUpdated {
            window: self.window,
            title: self.title.clone(),
        });
        Ok(())
    }
}

/// What a reconcile pass changed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub added: Vec<WindowHandle>,
    pub removed: Vec<WindowHandle>,
    pub updated: Vec<WindowHandle>,
}

impl ReconcileReport {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.updated.is_empty()
    }
}

/// Bring the window sector in line with the native window list
///
/// The native list is ground truth: tracked windows missing from it are
/// evicted, unknown ones are added, and title or minimized changes are applied.
#[derive(Debug, Clone)]
pub struct ReconcileWindowsTransform {
    pub windows: Vec<Window>,
}

impl Transform for ReconcileWindowsTransform {
    type Output = ReconcileReport;

    fn name(&self) -> &'static str {
        "reconcile_windows"
    }

    fn execute(&self, cx: &mut TransformContext<'_>) -> StoreResult<ReconcileReport> {
        let native: BTreeMap<WindowHandle, &Window> = self
            .windows
            .iter()
            .map(|window| (window.handle, window))
            .collect();
        let mut report = ReconcileReport::default();

        let vanished: Vec<WindowHandle> = cx
            .root()
            .windows()
            .handles()
            .filter(|handle| !native.contains_key(handle))
            .collect();
        for handle in vanished {
            cx.delegate(&WindowRemovedTransform { window: handle })?;
            report.removed.push(handle);
        }

        for (handle, window) in native {
            let Some(tracked) = cx.root().windows().get(handle).cloned() else {
                cx.delegate(&WindowAddedTransform::new(window.clone()))?;
                report.added.push(handle);
                continue;
            };

            let mut changed = false;
            if tracked.title != window.title {
                cx.delegate(&WindowUpdatedTransform {
                    window: handle,
                    title: window.title.clone(),
                })?;
                changed = true;
            }
            if tracked.is_minimized != window.is_minimized {
                if window.is_minimized {
                    cx.delegate(&WindowMinimizeStartedTransform { window: handle })?;
                } else {
                    cx.delegate(&WindowMinimizeEndedTransform { window: handle })?;
                }
                changed = true;
            }
            if changed {
                report.updated.push(handle);
            }
        }

        if !report.is_empty() {
            debug!(
                added = report.added.len(),
                removed = report.removed.len(),
                updated = report.updated.len(),
                "Reconciled windows"
            );
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::transforms::test_support::{desktop, window};
    use crate::store::StoreEvent;

    #[test]
    fn added_window_routes_to_its_monitor() {
        let mut desk = desktop(2, 2);
        let id = desk
            .store
            .dispatch(&WindowAddedTransform::new(window(10).on_monitor(desk.monitors[1])))
            .unwrap();
        assert_eq!(id, desk.workspaces[1]);

        let events = desk.drain();
        assert_eq!(
            events.iter().map(StoreEvent::name).collect::<Vec<_>>(),
            vec!["window_added", "workspace_layout_completed"]
        );
    }

    #[test]
    fn adding_a_tracked_window_is_a_no_op() {
        let mut desk = desktop(1, 1);
        desk.add_window(1, 0);
        let before = desk.store.snapshot();

        desk.store
            .dispatch(&WindowAddedTransform::new(window(1)))
            .unwrap();
        assert!(std::sync::Arc::ptr_eq(&before, &desk.store.snapshot()));
    }

    #[test]
    fn removal_evicts_every_reference() {
        let mut desk = desktop(1, 1);
        let handle = desk.add_window(1, 0);
        desk.store
            .dispatch(&WindowFocusedTransform {
                window: Some(handle),
            })
            .unwrap();

        desk.store
            .dispatch(&WindowRemovedTransform { window: handle })
            .unwrap();
        let root = desk.store.snapshot();
        assert!(root.map().workspace_for_window(handle).is_none());
        assert!(root.windows().last_focused().is_none());
        assert!(root.workspaces().get(desk.workspaces[0]).unwrap().windows.is_empty());

        assert_eq!(
            desk.store.dispatch(&WindowRemovedTransform { window: handle }),
            Err(StoreError::WindowNotFound(handle))
        );
    }

    #[test]
    fn minimize_relayouts_remaining_windows() {
        let mut desk = desktop(1, 1);
        let first = desk.add_window(1, 0);
        desk.add_window(2, 0);
        desk.drain();

        desk.store
            .dispatch(&WindowMinimizeStartedTransform { window: first })
            .unwrap();
        match desk.drain().as_slice() {
            [StoreEvent::WindowMinimizeStarted { .. }, StoreEvent::WorkspaceLayoutCompleted { placements, .. }] => {
                assert_eq!(placements.len(), 1)
            }
            other => panic!("unexpected events {other:?}"),
        }

        desk.store
            .dispatch(&WindowMinimizeStartedTransform { window: first })
            .unwrap();
        assert!(desk.drain().is_empty());
    }

    #[test]
    fn reconcile_applies_native_ground_truth() {
        let mut desk = desktop(1, 1);
        desk.add_window(1, 0);
        desk.add_window(2, 0);

        let mut renamed = window(2);
        renamed.title = "renamed".into();
        let report = desk
            .store
            .dispatch(&ReconcileWindowsTransform {
                windows: vec![renamed, window(3)],
            })
            .unwrap();

        assert_eq!(report.removed, vec![WindowHandle::new(1)]);
        assert_eq!(report.added, vec![WindowHandle::new(3)]);
        assert_eq!(report.updated, vec![WindowHandle::new(2)]);
        let root = desk.store.snapshot();
        assert_eq!(root.windows().get(WindowHandle::new(2)).unwrap().title, "renamed");
        assert_eq!(root.check_integrity(), Ok(()));
    }
}
