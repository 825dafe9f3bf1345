//! Native window and monitor layer
//!
//! The store never talks to the operating system while a transform runs.
//! Enumeration results are fed in as reconcile transforms, and frame or
//! focus changes are applied afterwards by [`effects::LayoutEffects`].

pub mod effects;

use crate::models::{Monitor, MonitorHandle, Rect, Window, WindowHandle};
use crate::StoreError;
use std::collections::BTreeMap;
use std::sync::RwLock;
use thiserror::Error;

pub use effects::{EffectMetrics, LayoutEffects};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum NativeError {
    #[error("Native window {0} no longer exists")]
    WindowGone(WindowHandle),

    #[error("Native call failed: {0}")]
    CallFailed(String),
}

impl From<NativeError> for StoreError {
    fn from(err: NativeError) -> Self {
        StoreError::ExternalOperationFailed(err.to_string())
    }
}

/// Abstraction over the platform window system
#[cfg_attr(test, mockall::automock)]
pub trait NativeManager: Send + Sync {
    /// Snapshot every open top-level window
    fn list_windows(&self) -> Result<Vec<Window>, NativeError>;

    /// Snapshot every connected monitor
    fn list_monitors(&self) -> Result<Vec<Monitor>, NativeError>;

    /// Move / resize a window
    fn set_window_frame(&self, window: WindowHandle, frame: Rect) -> Result<(), NativeError>;

    fn focus_window(&self, window: WindowHandle) -> Result<(), NativeError>;

    fn set_window_minimized(&self, window: WindowHandle, minimized: bool) -> Result<(), NativeError>;
}

#[derive(Debug, Clone)]
struct NativeWindowState {
    window: Window,
    frame: Option<Rect>,
}

/// Deterministic in-process window system used by tests and simulations
#[derive(Debug, Default)]
pub struct InMemoryNativeManager {
    windows: RwLock<BTreeMap<WindowHandle, NativeWindowState>>,
    monitors: RwLock<Vec<Monitor>>,
    focused: RwLock<Option<WindowHandle>>,
}

impl InMemoryNativeManager {
    pub fn new_with(monitors: Vec<Monitor>, windows: Vec<Window>) -> Self {
        let manager = Self::default();
        if let Ok(mut slot) = manager.monitors.write() {
            *slot = monitors;
        }
        for window in windows {
            manager.open_window(window);
        }
        manager
    }

    /// Simulate a window appearing
    pub fn open_window(&self, window: Window) {
        if let Ok(mut windows) = self.windows.write() {
            windows.insert(window.handle, NativeWindowState { window, frame: None });
        }
    }

    /// Simulate a window being destroyed outside the store
    pub fn close_window(&self, handle: WindowHandle) -> bool {
        match self.windows.write() {
            Ok(mut windows) => windows.remove(&handle).is_some(),
            Err(_) => false,
        }
    }

    /// Simulate a display configuration change
    pub fn set_monitors(&self, monitors: Vec<Monitor>) {
        if let Ok(mut slot) = self.monitors.write() {
            *slot = monitors;
        }
    }

    pub fn frame_of(&self, handle: WindowHandle) -> Option<Rect> {
        self.windows
            .read()
            .ok()
            .and_then(|windows| windows.get(&handle).and_then(|state| state.frame))
    }

    pub fn focused(&self) -> Option<WindowHandle> {
        self.focused.read().ok().and_then(|focused| *focused)
    }

    pub fn monitor_handles(&self) -> Vec<MonitorHandle> {
        self.monitors
            .read()
            .map(|monitors| monitors.iter().map(|monitor| monitor.handle).collect())
            .unwrap_or_default()
    }

    fn with_window<T>(
        &self,
        handle: WindowHandle,
        f: impl FnOnce(&mut NativeWindowState) -> T,
    ) -> Result<T, NativeError> {
        let mut windows = self.windows.write().map_err(poisoned)?;
        windows
            .get_mut(&handle)
            .map(f)
            .ok_or(NativeError::WindowGone(handle))
    }
}

fn poisoned<T>(_: T) -> NativeError {
    NativeError::CallFailed("native state lock poisoned".to_string())
}

impl NativeManager for InMemoryNativeManager {
    fn list_windows(&self) -> Result<Vec<Window>, NativeError> {
        let windows = self.windows.read().map_err(poisoned)?;
        Ok(windows.values().map(|state| state.window.clone()).collect())
    }

    fn list_monitors(&self) -> Result<Vec<Monitor>, NativeError> {
        Ok(self.monitors.read().map_err(poisoned)?.clone())
    }

    fn set_window_frame(&self, window: WindowHandle, frame: Rect) -> Result<(), NativeError> {
        self.with_window(window, |state| state.frame = Some(frame))
    }

    fn focus_window(&self, window: WindowHandle) -> Result<(), NativeError> {
        self.with_window(window, |_| ())?;
        *self.focused.write().map_err(poisoned)? = Some(window);
        Ok(())
    }

    fn set_window_minimized(&self, window: WindowHandle, minimized: bool) -> Result<(), NativeError> {
        self.with_window(window, |state| state.window.is_minimized = minimized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> InMemoryNativeManager {
        InMemoryNativeManager::new_with(
            vec![Monitor::new(MonitorHandle::new(1), "main", Rect::new(0.0, 0.0, 1280.0, 720.0))],
            vec![
                Window::new(WindowHandle::new(1), "one", "app"),
                Window::new(WindowHandle::new(2), "two", "app"),
            ],
        )
    }

    #[test]
    fn frames_and_focus_are_recorded() {
        let native = manager();
        let frame = Rect::new(0.0, 0.0, 640.0, 720.0);
        native.set_window_frame(WindowHandle::new(2), frame).unwrap();
        native.focus_window(WindowHandle::new(2)).unwrap();

        assert_eq!(native.frame_of(WindowHandle::new(2)), Some(frame));
        assert_eq!(native.focused(), Some(WindowHandle::new(2)));
    }

    #[test]
    fn closed_windows_report_gone() {
        let native = manager();
        assert!(native.close_window(WindowHandle::new(1)));
        assert_eq!(
            native.focus_window(WindowHandle::new(1)),
            Err(NativeError::WindowGone(WindowHandle::new(1)))
        );
        assert_eq!(native.list_windows().unwrap().len(), 1);

        let err: StoreError = NativeError::WindowGone(WindowHandle::new(1)).into();
        assert_eq!(err.kind(), crate::ErrorKind::ExternalOperationFailed);
    }
}
