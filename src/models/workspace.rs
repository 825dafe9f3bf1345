//! Workspace model
//!
//! A workspace is an ordered set of windows governed by one layout engine.
//! Which monitor shows it is recorded by the map sector, not here.

use super::geometry::Rect;
use super::handles::{WindowHandle, WorkspaceId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workspace {
    pub id: WorkspaceId,
    pub name: String,
    /// Window order drives layout order
    pub windows: Vec<WindowHandle>,
    /// Name of the layout engine in the layout registry
    pub layout_engine: String,
    pub last_focused_window: Option<WindowHandle>,
}

impl Workspace {
    pub fn new(id: WorkspaceId, name: impl Into<String>, layout_engine: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            windows: Vec::new(),
            layout_engine: layout_engine.into(),
            last_focused_window: None,
        }
    }

    pub fn contains(&self, window: WindowHandle) -> bool {
        self.windows.contains(&window)
    }

    pub fn position_of(&self, window: WindowHandle) -> Option<usize> {
        self.windows.iter().position(|w| *w == window)
    }

    /// Append a window, returning false when it is already present
    pub fn add_window(&mut self, window: WindowHandle) -> bool {
        if self.contains(window) {
            return false;
        }
        self.windows.push(window);
        true
    }

    /// Remove a window, clearing the focus memory if it pointed at it
    pub fn remove_window(&mut self, window: WindowHandle) -> bool {
        let Some(index) = self.position_of(window) else {
            return false;
        };
        self.windows.remove(index);
        if self.last_focused_window == Some(window) {
            self.last_focused_window = None;
        }
        true
    }
}

/// Frame assigned to a window by a layout pass
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowPlacement {
    pub window: WindowHandle,
    pub frame: Rect,
}

/// Direction for moving focus or windows within a workspace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Next,
    Previous,
}

impl Direction {
    /// Step from `index` in a ring of `len` entries
    pub fn step(self, index: usize, len: usize) -> usize {
        match self {
            Direction::Next => (index + 1) % len,
            Direction::Previous => (index + len - 1) % len,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_and_remove_keep_order_and_focus_memory() {
        let mut workspace = Workspace::new(WorkspaceId::generate(), "dev", "columns");
        let (a, b, c) = (WindowHandle::new(1), WindowHandle::new(2), WindowHandle::new(3));

        assert!(workspace.add_window(a));
        assert!(workspace.add_window(b));
        assert!(workspace.add_window(c));
        assert!(!workspace.add_window(b));
        workspace.last_focused_window = Some(b);

        assert!(workspace.remove_window(b));
        assert_eq!(workspace.windows, vec![a, c]);
        assert_eq!(workspace.last_focused_window, None);
        assert!(!workspace.remove_window(b));
    }

    #[test]
    fn direction_wraps_around() {
        assert_eq!(Direction::Next.step(2, 3), 0);
        assert_eq!(Direction::Previous.step(0, 3), 2);
    }
}
