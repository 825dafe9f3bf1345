//! Monitor sector: connected displays as last reported by the native layer

use crate::models::{Monitor, MonitorHandle, Point};
use crate::store::RootState;
use crate::{StoreError, StoreResult};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonitorSector {
    monitors: BTreeMap<MonitorHandle, Monitor>,
    /// Monitor that last received focus
    active: Option<MonitorHandle>,
}

impl MonitorSector {
    pub fn get(&self, handle: MonitorHandle) -> Option<&Monitor> {
        self.monitors.get(&handle)
    }

    pub fn contains(&self, handle: MonitorHandle) -> bool {
        self.monitors.contains_key(&handle)
    }

    pub fn len(&self) -> usize {
        self.monitors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.monitors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Monitor> {
        self.monitors.values()
    }

    pub fn handles(&self) -> impl Iterator<Item = MonitorHandle> + '_ {
        self.monitors.keys().copied()
    }

    /// The monitor flagged primary, falling back to the lowest handle
    pub fn primary(&self) -> Option<&Monitor> {
        self.iter()
            .find(|monitor| monitor.is_primary)
            .or_else(|| self.iter().next())
    }

    /// The active monitor, falling back to the primary one
    pub fn active(&self) -> Option<&Monitor> {
        self.active
            .and_then(|handle| self.get(handle))
            .or_else(|| self.primary())
    }

    pub fn at_point(&self, point: Point) -> Option<&Monitor> {
        self.iter().find(|monitor| monitor.contains_point(point))
    }

    /// Monitors ordered left to right, then top to bottom
    pub fn spatial_order(&self) -> Vec<MonitorHandle> {
        let mut monitors: Vec<&Monitor> = self.iter().collect();
        monitors.sort_by(|a, b| {
            a.bounds
                .origin
                .x
                .total_cmp(&b.bounds.origin.x)
                .then(a.bounds.origin.y.total_cmp(&b.bounds.origin.y))
        });
        monitors.into_iter().map(|monitor| monitor.handle).collect()
    }

    pub(crate) fn insert(&mut self, monitor: Monitor) -> Option<Monitor> {
        self.monitors.insert(monitor.handle, monitor)
    }

    pub(crate) fn remove(&mut self, handle: MonitorHandle) -> Option<Monitor> {
        if self.active == Some(handle) {
            self.active = None;
        }
        self.monitors.remove(&handle)
    }

    pub(crate) fn set_active(&mut self, handle: Option<MonitorHandle>) {
        self.active = handle;
    }
}

pub fn pick_monitor(handle: MonitorHandle) -> impl Fn(&RootState) -> StoreResult<Monitor> {
    move |root: &RootState| {
        root.monitors()
            .get(handle)
            .cloned()
            .ok_or(StoreError::MonitorNotFound(handle))
    }
}

pub fn pick_all_monitors() -> impl Fn(&RootState) -> StoreResult<Vec<Monitor>> {
    |root: &RootState| Ok(root.monitors().iter().cloned().collect())
}

pub fn pick_active_monitor() -> impl Fn(&RootState) -> StoreResult<Option<Monitor>> {
    |root: &RootState| Ok(root.monitors().active().cloned())
}

pub fn pick_primary_monitor() -> impl Fn(&RootState) -> StoreResult<Option<Monitor>> {
    |root: &RootState| Ok(root.monitors().primary().cloned())
}

/// The spatial neighbour of `handle`, wrapping around at either end
pub fn pick_adjacent_monitor(
    handle: MonitorHandle,
    reverse: bool,
) -> impl Fn(&RootState) -> StoreResult<Monitor> {
    move |root: &RootState| {
        let order = root.monitors().spatial_order();
        let index = order
            .iter()
            .position(|candidate| *candidate == handle)
            .ok_or(StoreError::MonitorNotFound(handle))?;
        let len = order.len();
        let next = if reverse {
            (index + len - 1) % len
        } else {
            (index + 1) % len
        };
        pick_monitor(order[next])(root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Rect;

    fn sector() -> MonitorSector {
        let mut sector = MonitorSector::default();
        sector.insert(Monitor::new(
            MonitorHandle::new(2),
            "left",
            Rect::new(-1920.0, 0.0, 1920.0, 1080.0),
        ));
        sector.insert(Monitor::new(MonitorHandle::new(1), "main", Rect::new(0.0, 0.0, 2560.0, 1440.0)).primary());
        sector
    }

    #[test]
    fn primary_and_active_fallbacks() {
        let mut sector = sector();
        assert_eq!(sector.primary().map(|m| m.handle), Some(MonitorHandle::new(1)));
        assert_eq!(sector.active().map(|m| m.handle), Some(MonitorHandle::new(1)));

        sector.set_active(Some(MonitorHandle::new(2)));
        assert_eq!(sector.active().map(|m| m.handle), Some(MonitorHandle::new(2)));

        sector.remove(MonitorHandle::new(2));
        assert_eq!(sector.active().map(|m| m.handle), Some(MonitorHandle::new(1)));
    }

    #[test]
    fn spatial_order_is_left_to_right() {
        let sector = sector();
        assert_eq!(
            sector.spatial_order(),
            vec![MonitorHandle::new(2), MonitorHandle::new(1)]
        );
        assert_eq!(
            sector.at_point(Point::new(-10.0, 10.0)).map(|m| m.handle),
            Some(MonitorHandle::new(2))
        );
    }
}
