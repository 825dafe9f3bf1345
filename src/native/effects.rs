//! Applying committed layout and focus changes to native windows

use super::NativeManager;
use crate::models::WindowHandle;
use crate::store::{EventListener, RootState, StoreEvent};
use crate::StoreError;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{trace, warn};

/// Counters for native side effects
#[derive(Debug, Default)]
pub struct EffectMetrics {
    frames_applied: AtomicU64,
    focus_applied: AtomicU64,
    minimize_applied: AtomicU64,
    failures: AtomicU64,
}

impl EffectMetrics {
    pub fn frames_applied(&self) -> u64 {
        self.frames_applied.load(Ordering::Relaxed)
    }

    pub fn focus_applied(&self) -> u64 {
        self.focus_applied.load(Ordering::Relaxed)
    }

    pub fn minimize_applied(&self) -> u64 {
        self.minimize_applied.load(Ordering::Relaxed)
    }

    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }
}

/// Event listener that pushes placements, focus and minimize state to the
/// native layer
///
/// Runs after commit. A failing native call is logged and counted; the
/// store's logical state stays as committed.
#[derive(Clone)]
pub struct LayoutEffects {
    native: Arc<dyn NativeManager>,
    metrics: Arc<EffectMetrics>,
}

impl LayoutEffects {
    pub fn new(native: Arc<dyn NativeManager>) -> Self {
        Self {
            native,
            metrics: Arc::new(EffectMetrics::default()),
        }
    }

    pub fn metrics(&self) -> Arc<EffectMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn apply(&self, event: &StoreEvent, root: &RootState) {
        match event {
            StoreEvent::WorkspaceLayoutCompleted { placements, .. } => {
                for placement in placements {
                    // Skip windows evicted by a later commit
                    if !root.windows().contains(placement.window) {
                        continue;
                    }
                    match self.native.set_window_frame(placement.window, placement.frame) {
                        Ok(()) => {
                            self.metrics.frames_applied.fetch_add(1, Ordering::Relaxed);
                        }
                        Err(err) => self.report("set_window_frame", err.into()),
                    }
                }
            }
            StoreEvent::WindowFocused {
                window: Some(window),
            } => match self.native.focus_window(*window) {
                Ok(()) => {
                    self.metrics.focus_applied.fetch_add(1, Ordering::Relaxed);
                }
                Err(err) => self.report("focus_window", err.into()),
            },
            StoreEvent::WindowMinimizeStarted { window } => self.set_minimized(*window, true, root),
            StoreEvent::WindowMinimizeEnded { window } => self.set_minimized(*window, false, root),
            _ => trace!(event = event.name(), "No native effect"),
        }
    }

    pub fn into_listener(self) -> EventListener {
        Box::new(move |event: &StoreEvent, root: &RootState| self.apply(event, root))
    }

    fn set_minimized(&self, window: WindowHandle, minimized: bool, root: &RootState) {
        if !root.windows().contains(window) {
            return;
        }
        match self.native.set_window_minimized(window, minimized) {
            Ok(()) => {
                self.metrics.minimize_applied.fetch_add(1, Ordering::Relaxed);
            }
            Err(err) => self.report("set_window_minimized", err.into()),
        }
    }

    fn report(&self, call: &'static str, err: StoreError) {
        self.metrics.failures.fetch_add(1, Ordering::Relaxed);
        warn!(call, error = %err, "Native side effect failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MonitorHandle, Rect, Window, WindowPlacement, WorkspaceId};
    use crate::native::{MockNativeManager, NativeError};
    use crate::store::transforms::{AddWorkspaceTransform, WindowAddedTransform};
    use crate::store::Store;
    use crate::{Context, InternalContext};
    use mockall::predicate::eq;

    fn root_with_window(handle: WindowHandle) -> RootState {
        let mut store = Store::new(Arc::new(Context::default()), Arc::new(InternalContext::default()));
        let id = store.dispatch(&AddWorkspaceTransform::new("main")).unwrap();
        store
            .dispatch(&WindowAddedTransform::to_workspace(
                Window::new(handle, "editor", "code"),
                id,
            ))
            .unwrap();
        RootState::clone(&store.snapshot())
    }

    #[test]
    fn placements_are_applied_for_tracked_windows_only() {
        let tracked = WindowHandle::new(1);
        let frame = Rect::new(0.0, 0.0, 640.0, 480.0);

        let mut native = MockNativeManager::new();
        native
            .expect_set_window_frame()
            .with(eq(tracked), eq(frame))
            .times(1)
            .returning(|_, _| Ok(()));

        let effects = LayoutEffects::new(Arc::new(native));
        effects.apply(
            &StoreEvent::WorkspaceLayoutCompleted {
                workspace: WorkspaceId::generate(),
                monitor: MonitorHandle::new(1),
                placements: vec![
                    WindowPlacement { window: tracked, frame },
                    WindowPlacement {
                        window: WindowHandle::new(2),
                        frame,
                    },
                ],
            },
            &root_with_window(tracked),
        );
        assert_eq!(effects.metrics().frames_applied(), 1);
    }

    #[test]
    fn native_failures_are_counted_not_propagated() {
        let window = WindowHandle::new(5);
        let mut native = MockNativeManager::new();
        native
            .expect_focus_window()
            .returning(|handle| Err(NativeError::WindowGone(handle)));

        let effects = LayoutEffects::new(Arc::new(native));
        let listener = effects.clone().into_listener();
        listener(
            &StoreEvent::WindowFocused {
                window: Some(window),
            },
            &RootState::default(),
        );
        assert_eq!(effects.metrics().failures(), 1);
        assert_eq!(effects.metrics().focus_applied(), 0);
    }

    #[test]
    fn minimize_state_follows_committed_events() {
        let tracked = WindowHandle::new(3);
        let mut native = MockNativeManager::new();
        native
            .expect_set_window_minimized()
            .with(eq(tracked), eq(true))
            .times(1)
            .returning(|_, _| Ok(()));
        native
            .expect_set_window_minimized()
            .with(eq(tracked), eq(false))
            .times(1)
            .returning(|_, _| Ok(()));

        let effects = LayoutEffects::new(Arc::new(native));
        let root = root_with_window(tracked);
        effects.apply(&StoreEvent::WindowMinimizeStarted { window: tracked }, &root);
        effects.apply(&StoreEvent::WindowMinimizeEnded { window: tracked }, &root);
        effects.apply(
            &StoreEvent::WindowMinimizeStarted {
                window: WindowHandle::new(99),
            },
            &root,
        );
        assert_eq!(effects.metrics().minimize_applied(), 2);
        assert_eq!(effects.metrics().failures(), 0);
    }
}
