//! Transform execution protocol
//!
//! A transform is a value describing an intended change. The store runs it
//! against a staged copy of the current [`RootState`] through a
//! [`TransformContext`]; the staged copy and the events it queued are
//! committed together, or thrown away together when execution fails.

use super::events::{EventQueues, StoreEvent};
use super::picker::Picker;
use super::sectors::map::pick_active_workspace;
use super::sectors::window::{pick_layoutable_windows, pick_window};
use super::sectors::workspace::pick_workspace;
use super::sectors::{MapSector, MonitorSector, WindowSector, WorkspaceSector};
use super::{RootState, Store};
use crate::context::{Context, InternalContext};
use crate::models::{WindowHandle, Workspace, WorkspaceId};
use crate::{StoreError, StoreResult};
use std::fmt;
use tracing::trace;

/// A named, validated state mutation
pub trait Transform: fmt::Debug + Send + Sync + 'static {
    type Output: Send + 'static;

    fn name(&self) -> &'static str;

    /// Validate, compute the new sector states and queue events
    ///
    /// Returning an error discards every change made through `cx`.
    fn execute(&self, cx: &mut TransformContext<'_>) -> StoreResult<Self::Output>;
}

/// Type-erased transform, as produced by the command registry
pub trait DispatchableTransform: fmt::Debug + Send + Sync {
    fn transform_name(&self) -> &'static str;

    fn dispatch_into(&self, store: &mut Store) -> StoreResult<()>;
}

impl<T: Transform> DispatchableTransform for T {
    fn transform_name(&self) -> &'static str {
        self.name()
    }

    fn dispatch_into(&self, store: &mut Store) -> StoreResult<()> {
        store.dispatch(self).map(|_| ())
    }
}

/// Staged state and event queues for one dispatch
pub struct TransformContext<'a> {
    context: &'a Context,
    internal: &'a InternalContext,
    root: RootState,
    events: EventQueues,
    depth: usize,
}

impl<'a> TransformContext<'a> {
    pub fn new(context: &'a Context, internal: &'a InternalContext, root: RootState) -> Self {
        Self {
            context,
            internal,
            root,
            events: EventQueues::default(),
            depth: 0,
        }
    }

    pub fn context(&self) -> &Context {
        self.context
    }

    pub fn internal(&self) -> &InternalContext {
        self.internal
    }

    /// The staged root, including changes made so far
    pub fn root(&self) -> &RootState {
        &self.root
    }

    pub fn pick<P: Picker>(&self, picker: &P) -> StoreResult<P::Output> {
        picker.pick(&self.root)
    }

    pub fn monitors_mut(&mut self) -> &mut MonitorSector {
        self.root.monitors_mut()
    }

    pub fn windows_mut(&mut self) -> &mut WindowSector {
        self.root.windows_mut()
    }

    pub fn map_mut(&mut self) -> &mut MapSector {
        self.root.map_mut()
    }

    pub fn workspaces_mut(&mut self) -> &mut WorkspaceSector {
        self.root.workspaces_mut()
    }

    /// Mutate one workspace in place
    pub fn update_workspace<R>(
        &mut self,
        id: WorkspaceId,
        f: impl FnOnce(&mut Workspace) -> R,
    ) -> StoreResult<R> {
        if !self.root.workspaces().contains(id) {
            return Err(StoreError::WorkspaceNotFound(id));
        }
        self.root
            .workspaces_mut()
            .get_mut(id)
            .map(f)
            .ok_or(StoreError::WorkspaceNotFound(id))
    }

    /// Queue an event on the owning sector; delivered only if the dispatch commits
    pub fn queue_event(&mut self, event: StoreEvent) {
        trace!(event = event.name(), "Queued event");
        self.events.push(event);
    }

    pub fn queued_events(&self) -> &EventQueues {
        &self.events
    }

    /// Run another transform against the same staged state
    ///
    /// The inner transform goes through its own full validation. If it
    /// fails, whatever it staged is rolled back before the error is returned.
    pub fn delegate<T: Transform>(&mut self, inner: &T) -> StoreResult<T::Output> {
        let saved_root = self.root.clone();
        let mark = self.events.mark();

        self.depth += 1;
        trace!(transform = inner.name(), depth = self.depth, "Delegating");
        let result = inner.execute(self);
        self.depth -= 1;

        if result.is_err() {
            self.root = saved_root;
            self.events.rollback(mark);
        }
        result
    }

    pub fn into_parts(self) -> (RootState, EventQueues) {
        (self.root, self.events)
    }

    /// The given window, or the last focused one when absent
    pub fn resolve_window(&self, window: Option<WindowHandle>) -> StoreResult<WindowHandle> {
        match window {
            Some(handle) => self.pick(&pick_window(handle)).map(|window| window.handle),
            None => self.root.windows().last_focused().ok_or(StoreError::NoValidWindow),
        }
    }

    /// The given workspace, or the one the user is working in
    ///
    /// Without an explicit id this is the workspace of the last focused
    /// window, falling back to the workspace on the active monitor.
    pub fn resolve_workspace(&self, workspace: Option<WorkspaceId>) -> StoreResult<WorkspaceId> {
        if let Some(id) = workspace {
            return self.pick(&pick_workspace(id)).map(|workspace| workspace.id);
        }

        let focused = self
            .root
            .windows()
            .last_focused()
            .and_then(|window| self.root.map().workspace_for_window(window));
        if let Some(id) = focused {
            return Ok(id);
        }

        self.pick(&pick_active_workspace()).map(|workspace| workspace.id)
    }

    /// A workspace together with a valid window to operate on inside it
    ///
    /// With no window given, `default_to_last_focused` picks the workspace's
    /// remembered focus. `require_in_workspace` rejects windows owned by a
    /// different workspace.
    pub fn resolve_workspace_window(
        &self,
        workspace: WorkspaceId,
        window: Option<WindowHandle>,
        default_to_last_focused: bool,
        require_in_workspace: bool,
    ) -> StoreResult<(Workspace, WindowHandle)> {
        let workspace = self.pick(&pick_workspace(workspace))?;

        let handle = match window {
            Some(handle) => handle,
            None if default_to_last_focused => workspace
                .last_focused_window
                .ok_or(StoreError::NoValidWindow)?,
            None => return Err(StoreError::NoValidWindow),
        };

        if require_in_workspace && !workspace.contains(handle) {
            return Err(StoreError::WindowNotFound(handle));
        }
        self.pick(&pick_window(handle))?;
        Ok((workspace, handle))
    }

    /// Lay out a workspace and queue the resulting placements
    ///
    /// Hidden workspaces and workspaces with nothing to place are skipped.
    /// Returns whether a layout event was queued.
    pub fn do_layout(&mut self, id: WorkspaceId) -> StoreResult<bool> {
        let workspace = self.pick(&pick_workspace(id))?;

        let Some(monitor) = self.root.map().monitor_for_workspace(id) else {
            trace!(workspace = %workspace.name, "Skipping layout of hidden workspace");
            return Ok(false);
        };
        let monitor = self
            .root
            .monitors()
            .get(monitor)
            .ok_or(StoreError::MonitorNotFound(monitor))?;

        let windows = self.pick(&pick_layoutable_windows(workspace.windows.clone()))?;
        if windows.is_empty() {
            trace!(workspace = %workspace.name, "Skipping layout of empty workspace");
            return Ok(false);
        }

        let engine = self
            .context
            .layouts
            .get(&workspace.layout_engine)
            .ok_or_else(|| {
                StoreError::InvalidArgument(format!(
                    "unknown layout engine '{}'",
                    workspace.layout_engine
                ))
            })?;

        let placements = engine.layout(&windows, monitor.work_area);
        let monitor = monitor.handle;
        self.queue_event(StoreEvent::WorkspaceLayoutCompleted {
            workspace: id,
            monitor,
            placements,
        });
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Monitor, MonitorHandle, Rect, Window};

    #[derive(Debug)]
    struct Rename(WorkspaceId, &'static str);

    impl Transform for Rename {
        type Output = ();

        fn name(&self) -> &'static str {
            "test_rename"
        }

        fn execute(&self, cx: &mut TransformContext<'_>) -> StoreResult<()> {
            let name = self.1;
            if name.is_empty() {
                return Err(StoreError::InvalidArgument("empty".into()));
            }
            cx.update_workspace(self.0, |workspace| workspace.name = name.to_string())?;
            cx.queue_event(StoreEvent::WindowFocused { window: None });
            Ok(())
        }
    }

    fn root() -> (RootState, WorkspaceId) {
        let mut root = RootState::default();
        let id = WorkspaceId::generate();
        let mut workspace = Workspace::new(id, "main", "master_stack");
        for raw in 1..=2 {
            let handle = WindowHandle::new(raw);
            workspace.add_window(handle);
            root.windows_mut().insert(Window::new(handle, "term", "alacritty"));
            root.map_mut().assign_window(handle, id);
        }
        workspace.last_focused_window = Some(WindowHandle::new(2));
        root.workspaces_mut().insert(workspace);
        (root, id)
    }

    #[test]
    fn failed_delegate_rolls_back_its_changes() {
        let (root, id) = root();
        let context = Context::default();
        let internal = InternalContext::default();
        let mut cx = TransformContext::new(&context, &internal, root);

        cx.delegate(&Rename(id, "first")).unwrap();
        assert!(cx.delegate(&Rename(id, "")).is_err());

        let (root, mut events) = cx.into_parts();
        assert_eq!(root.workspaces().get(id).unwrap().name, "first");
        assert_eq!(events.drain_ordered().len(), 1);
    }

    #[test]
    fn workspace_window_resolution() {
        let (root, id) = root();
        let context = Context::default();
        let internal = InternalContext::default();
        let cx = TransformContext::new(&context, &internal, root);

        let (_, window) = cx.resolve_workspace_window(id, None, true, true).unwrap();
        assert_eq!(window, WindowHandle::new(2));
        assert_eq!(
            cx.resolve_workspace_window(id, None, false, true),
            Err(StoreError::NoValidWindow)
        );
        assert_eq!(
            cx.resolve_workspace_window(id, Some(WindowHandle::new(9)), false, true),
            Err(StoreError::WindowNotFound(WindowHandle::new(9)))
        );
        assert_eq!(cx.resolve_window(None), Err(StoreError::NoValidWindow));
    }

    #[test]
    fn layout_only_runs_for_visible_workspaces() {
        let (mut root, id) = root();
        let context = Context::default();
        let internal = InternalContext::default();

        let mut cx = TransformContext::new(&context, &internal, root.clone());
        assert_eq!(cx.do_layout(id), Ok(false));

        let monitor = MonitorHandle::new(1);
        root.monitors_mut()
            .insert(Monitor::new(monitor, "main", Rect::new(0.0, 0.0, 1000.0, 800.0)));
        root.map_mut().show_workspace(monitor, id);

        let mut cx = TransformContext::new(&context, &internal, root);
        assert_eq!(cx.do_layout(id), Ok(true));
        let (_, mut events) = cx.into_parts();
        match events.drain_ordered().as_slice() {
            [StoreEvent::WorkspaceLayoutCompleted { placements, .. }] => {
                assert_eq!(placements.len(), 2)
            }
            other => panic!("unexpected events {other:?}"),
        }
    }
}
