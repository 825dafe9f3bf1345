//! Monitor geometry as reported by the native layer

use super::geometry::{Point, Rect};
use super::handles::MonitorHandle;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Monitor {
    pub handle: MonitorHandle,
    pub name: String,
    pub bounds: Rect,
    /// Bounds minus docks, bars and other reserved space
    pub work_area: Rect,
    pub scale_factor: f64,
    pub is_primary: bool,
}

impl Monitor {
    pub fn new(handle: MonitorHandle, name: impl Into<String>, bounds: Rect) -> Self {
        Self {
            handle,
            name: name.into(),
            bounds,
            work_area: bounds,
            scale_factor: 1.0,
            is_primary: false,
        }
    }

    pub fn primary(mut self) -> Self {
        self.is_primary = true;
        self
    }

    pub fn contains_point(&self, point: Point) -> bool {
        self.bounds.contains_point(point)
    }
}
