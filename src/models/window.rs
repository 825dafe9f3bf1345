//! Tracked window metadata

use super::handles::{MonitorHandle, WindowHandle};
use serde::{Deserialize, Serialize};

/// Metadata about a window the store tracks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Window {
    pub handle: WindowHandle,
    pub title: String,
    pub process_name: String,
    pub process_id: u32,
    pub is_minimized: bool,
    /// Floating windows are tracked but never placed by a layout engine
    pub is_floating: bool,
    /// Monitor the native layer last reported the window on
    pub monitor: Option<MonitorHandle>,
}

impl Window {
    pub fn new(handle: WindowHandle, title: impl Into<String>, process_name: impl Into<String>) -> Self {
        Self {
            handle,
            title: title.into(),
            process_name: process_name.into(),
            process_id: 0,
            is_minimized: false,
            is_floating: false,
            monitor: None,
        }
    }

    pub fn on_monitor(mut self, monitor: MonitorHandle) -> Self {
        self.monitor = Some(monitor);
        self
    }

    pub fn floating(mut self, floating: bool) -> Self {
        self.is_floating = floating;
        self
    }

    /// Whether a layout engine should assign this window a frame
    pub fn is_layoutable(&self) -> bool {
        !self.is_minimized && !self.is_floating
    }
}
