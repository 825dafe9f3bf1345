//! Built-in layout engines

use super::{LayoutEngine, LayoutParams};
use crate::models::{Rect, WindowHandle, WindowPlacement};

/// One main window on the left, the rest stacked on the right
#[derive(Debug, Clone, Default)]
pub struct MasterStackLayout {
    params: LayoutParams,
}

impl MasterStackLayout {
    pub const NAME: &'static str = "master_stack";

    pub fn new(params: LayoutParams) -> Self {
        Self { params }
    }
}

impl LayoutEngine for MasterStackLayout {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn layout(&self, windows: &[WindowHandle], area: Rect) -> Vec<WindowPlacement> {
        let area = area.inset(self.params.margin);
        let gap = self.params.gap;
        let frames = match windows.len() {
            0 => Vec::new(),
            1 => vec![area],
            count => {
                let main_width = (area.size.width * self.params.main_ratio).max(area.size.width * 0.4);
                let stack_width = area.size.width - main_width - gap;
                let stack_count = count - 1;
                let stack_height =
                    (area.size.height - gap * stack_count.saturating_sub(1) as f64) / stack_count as f64;

                let mut frames = Vec::with_capacity(count);
                frames.push(frame(area.origin.x, area.origin.y, main_width, area.size.height));
                for index in 0..stack_count {
                    frames.push(frame(
                        area.origin.x + main_width + gap,
                        area.origin.y + index as f64 * (stack_height + gap),
                        stack_width,
                        stack_height,
                    ));
                }
                frames
            }
        };
        place(windows, frames)
    }
}

/// Near-square grid filled row by row
#[derive(Debug, Clone, Default)]
pub struct GridLayout {
    params: LayoutParams,
}

impl GridLayout {
    pub const NAME: &'static str = "grid";

    pub fn new(params: LayoutParams) -> Self {
        Self { params }
    }
}

impl LayoutEngine for GridLayout {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn layout(&self, windows: &[WindowHandle], area: Rect) -> Vec<WindowPlacement> {
        let count = windows.len();
        if count == 0 {
            return Vec::new();
        }

        let area = area.inset(self.params.margin);
        let gap = self.params.gap;
        let cols = (count as f64).sqrt().ceil() as usize;
        let rows = count.div_ceil(cols);
        let cell_width = (area.size.width - gap * (cols - 1) as f64) / cols as f64;
        let cell_height = (area.size.height - gap * (rows - 1) as f64) / rows as f64;

        let frames = (0..count)
            .map(|index| {
                let (row, col) = (index / cols, index % cols);
                frame(
                    area.origin.x + col as f64 * (cell_width + gap),
                    area.origin.y + row as f64 * (cell_height + gap),
                    cell_width,
                    cell_height,
                )
            })
            .collect();
        place(windows, frames)
    }
}

/// Equal-width columns across the whole area
#[derive(Debug, Clone, Default)]
pub struct ColumnsLayout {
    params: LayoutParams,
}

impl ColumnsLayout {
    pub const NAME: &'static str = "columns";

    pub fn new(params: LayoutParams) -> Self {
        Self { params }
    }
}

impl LayoutEngine for ColumnsLayout {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn layout(&self, windows: &[WindowHandle], area: Rect) -> Vec<WindowPlacement> {
        let count = windows.len();
        if count == 0 {
            return Vec::new();
        }

        let area = area.inset(self.params.margin);
        let gap = self.params.gap;
        let width = (area.size.width - gap * (count - 1) as f64) / count as f64;
        let frames = (0..count)
            .map(|index| {
                frame(
                    area.origin.x + index as f64 * (width + gap),
                    area.origin.y,
                    width,
                    area.size.height,
                )
            })
            .collect();
        place(windows, frames)
    }
}

/// Every window fills the area; the first one is on top
#[derive(Debug, Clone, Default)]
pub struct MonocleLayout {
    params: LayoutParams,
}

impl MonocleLayout {
    pub const NAME: &'static str = "monocle";

    pub fn new(params: LayoutParams) -> Self {
        Self { params }
    }
}

impl LayoutEngine for MonocleLayout {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn layout(&self, windows: &[WindowHandle], area: Rect) -> Vec<WindowPlacement> {
        let area = area.inset(self.params.margin);
        place(windows, vec![area; windows.len()])
    }
}

fn frame(x: f64, y: f64, width: f64, height: f64) -> Rect {
    Rect::new(x, y, width.max(1.0), height.max(1.0))
}

fn place(windows: &[WindowHandle], frames: Vec<Rect>) -> Vec<WindowPlacement> {
    windows
        .iter()
        .copied()
        .zip(frames)
        .map(|(window, frame)| WindowPlacement { window, frame })
        .collect()
}
