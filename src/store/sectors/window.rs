//! Window sector: every window the store tracks plus focus memory

use crate::models::{Window, WindowHandle};
use crate::store::RootState;
use crate::{StoreError, StoreResult};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WindowSector {
    windows: BTreeMap<WindowHandle, Window>,
    last_focused: Option<WindowHandle>,
}

impl WindowSector {
    pub fn get(&self, handle: WindowHandle) -> Option<&Window> {
        self.windows.get(&handle)
    }

    pub fn contains(&self, handle: WindowHandle) -> bool {
        self.windows.contains_key(&handle)
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Window> {
        self.windows.values()
    }

    pub fn handles(&self) -> impl Iterator<Item = WindowHandle> + '_ {
        self.windows.keys().copied()
    }

    pub fn last_focused(&self) -> Option<WindowHandle> {
        self.last_focused
    }

    pub(crate) fn get_mut(&mut self, handle: WindowHandle) -> Option<&mut Window> {
        self.windows.get_mut(&handle)
    }

    pub(crate) fn insert(&mut self, window: Window) -> Option<Window> {
        self.windows.insert(window.handle, window)
    }

    pub(crate) fn remove(&mut self, handle: WindowHandle) -> Option<Window> {
        if self.last_focused == Some(handle) {
            self.last_focused = None;
        }
        self.windows.remove(&handle)
    }

    pub(crate) fn set_last_focused(&mut self, handle: Option<WindowHandle>) {
        self.last_focused = handle;
    }
}

/// Metadata for one tracked window
pub fn pick_window(handle: WindowHandle) -> impl Fn(&RootState) -> StoreResult<Window> {
    move |root: &RootState| {
        root.windows()
            .get(handle)
            .cloned()
            .ok_or(StoreError::WindowNotFound(handle))
    }
}

/// Every tracked window, ordered by handle
pub fn pick_all_windows() -> impl Fn(&RootState) -> StoreResult<Vec<Window>> {
    |root: &RootState| Ok(root.windows().iter().cloned().collect())
}

/// The window that most recently received focus
pub fn pick_last_focused_window() -> impl Fn(&RootState) -> StoreResult<Window> {
    |root: &RootState| {
        let handle = root.windows().last_focused().ok_or(StoreError::NoValidWindow)?;
        pick_window(handle)(root)
    }
}

/// Windows a layout engine would place, i.e. neither minimized nor floating
pub fn pick_layoutable_windows(
    handles: Vec<WindowHandle>,
) -> impl Fn(&RootState) -> StoreResult<Vec<WindowHandle>> {
    move |root: &RootState| {
        Ok(handles
            .iter()
            .copied()
            .filter(|handle| {
                root.windows()
                    .get(*handle)
                    .map(Window::is_layoutable)
                    .unwrap_or(false)
            })
            .collect())
    }
}
