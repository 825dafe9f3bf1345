//! Reconciling the monitor sector with the connected displays

use crate::models::{Monitor, MonitorHandle, WorkspaceId};
use crate::store::{StoreEvent, Transform, TransformContext};
use crate::{StoreError, StoreResult};
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Replace the monitor set with what the native layer reports
///
/// Workspaces shown on disconnected monitors become hidden. Each newly
/// connected monitor shows the workspace it showed when state was last saved.
/// Monitors without a saved workspace then take the first hidden one.
#[derive(Debug, Clone)]
pub struct MonitorsChangedTransform {
    pub monitors: Vec<Monitor>,
}

impl MonitorsChangedTransform {
    fn saved_workspace(cx: &TransformContext<'_>, monitor: &Monitor) -> Option<WorkspaceId> {
        let root = cx.root();
        cx.internal()
            .saved_state
            .workspace_for_monitor(monitor.handle, &monitor.name)
            .and_then(|name| root.workspaces().find_by_name(name))
            .map(|workspace| workspace.id)
            .filter(|id| !root.map().is_visible(*id))
    }

    fn first_hidden_workspace(cx: &TransformContext<'_>) -> Option<WorkspaceId> {
        let root = cx.root();
        root.workspaces()
            .iter()
            .find(|workspace| !root.map().is_visible(workspace.id))
            .map(|workspace| workspace.id)
    }

    fn show_on_new_monitor(
        cx: &mut TransformContext<'_>,
        monitor: MonitorHandle,
        workspace: WorkspaceId,
    ) {
        cx.map_mut().show_workspace(monitor, workspace);
        cx.queue_event(StoreEvent::WorkspaceShownOnMonitor {
            workspace,
            monitor,
            previous: None,
        });
    }
}

impl Transform for MonitorsChangedTransform {
    type Output = ();

    fn name(&self) -> &'static str {
        "monitors_changed"
    }

    fn execute(&self, cx: &mut TransformContext<'_>) -> StoreResult<()> {
        let mut seen = BTreeSet::new();
        for monitor in &self.monitors {
            if !seen.insert(monitor.handle) {
                return Err(StoreError::InvalidArgument(format!(
                    "{} reported twice",
                    monitor.handle
                )));
            }
        }

        let tracked: BTreeSet<MonitorHandle> = cx.root().monitors().handles().collect();
        let added: Vec<MonitorHandle> = seen.difference(&tracked).copied().collect();
        let removed: Vec<MonitorHandle> = tracked.difference(&seen).copied().collect();
        let unchanged: Vec<MonitorHandle> = seen.intersection(&tracked).copied().collect();

        let geometry_changed = self
            .monitors
            .iter()
            .any(|monitor| cx.root().monitors().get(monitor.handle) != Some(monitor));
        if !geometry_changed && removed.is_empty() {
            return Ok(());
        }

        for handle in &removed {
            if let Some(workspace) = cx.map_mut().clear_monitor(*handle) {
                debug!(monitor = %handle, %workspace, "Hiding workspace of disconnected monitor");
            }
            cx.monitors_mut().remove(*handle);
        }
        for monitor in &self.monitors {
            cx.monitors_mut().insert(monitor.clone());
        }

        let new_monitors: Vec<Monitor> = cx
            .root()
            .monitors()
            .spatial_order()
            .into_iter()
            .filter(|handle| added.contains(handle))
            .filter_map(|handle| cx.root().monitors().get(handle).cloned())
            .collect();

        // Saved assignments are claimed before any fallback can take them.
        let mut unassigned = Vec::new();
        for monitor in &new_monitors {
            match Self::saved_workspace(cx, monitor) {
                Some(workspace) => Self::show_on_new_monitor(cx, monitor.handle, workspace),
                None => unassigned.push(monitor.handle),
            }
        }
        for handle in unassigned {
            match Self::first_hidden_workspace(cx) {
                Some(workspace) => Self::show_on_new_monitor(cx, handle, workspace),
                None => debug!(monitor = %handle, "No hidden workspace for new monitor"),
            }
        }

        info!(
            added = added.len(),
            removed = removed.len(),
            unchanged = unchanged.len(),
            "Monitors changed"
        );
        cx.queue_event(StoreEvent::MonitorsChanged {
            added,
            removed,
            unchanged,
        });

        let visible: Vec<WorkspaceId> = cx
            .root()
            .map()
            .monitor_assignments()
            .map(|(_, workspace)| workspace)
            .collect();
        for workspace in visible {
            cx.do_layout(workspace)?;
        }
        Ok(())
    }
}
