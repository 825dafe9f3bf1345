//! Pluggable layout engines
//!
//! A layout engine is a pure function from an ordered window list and a
//! work area to window frames. Workspaces refer to engines by name, and the
//! [`LayoutRegistry`] resolves those names when a transform lays a workspace out.

pub mod engines;

use crate::models::{Rect, WindowHandle, WindowPlacement};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

pub use engines::{ColumnsLayout, GridLayout, MasterStackLayout, MonocleLayout};

/// Places windows inside a work area
pub trait LayoutEngine: Send + Sync {
    fn name(&self) -> &str;

    /// Compute frames for `windows` in order; must not fail or touch anything outside its inputs
    fn layout(&self, windows: &[WindowHandle], area: Rect) -> Vec<WindowPlacement>;
}

/// Spacing shared by the built-in engines
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutParams {
    /// Space between neighbouring windows
    pub gap: f64,
    /// Space between windows and the work area edge
    pub margin: f64,
    /// Share of the width given to the main window
    pub main_ratio: f64,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            gap: 8.0,
            margin: 8.0,
            main_ratio: 0.6,
        }
    }
}

/// Layout engines by name
#[derive(Clone)]
pub struct LayoutRegistry {
    engines: BTreeMap<String, Arc<dyn LayoutEngine>>,
    default_engine: String,
}

impl LayoutRegistry {
    /// Empty registry; `default_engine` must be registered before use
    pub fn new(default_engine: impl Into<String>) -> Self {
        Self {
            engines: BTreeMap::new(),
            default_engine: default_engine.into(),
        }
    }

    /// Registry holding the four built-in engines
    pub fn with_defaults(params: LayoutParams) -> Self {
        let mut registry = Self::new(MasterStackLayout::NAME);
        registry.register(Arc::new(MasterStackLayout::new(params)));
        registry.register(Arc::new(GridLayout::new(params)));
        registry.register(Arc::new(ColumnsLayout::new(params)));
        registry.register(Arc::new(MonocleLayout::new(params)));
        registry
    }

    /// Add or replace an engine under its own name
    pub fn register(&mut self, engine: Arc<dyn LayoutEngine>) {
        self.engines.insert(engine.name().to_string(), engine);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn LayoutEngine>> {
        self.engines.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.engines.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.engines.keys().map(String::as_str)
    }

    pub fn default_engine(&self) -> &str {
        &self.default_engine
    }

    pub fn set_default_engine(&mut self, name: impl Into<String>) {
        self.default_engine = name.into();
    }
}

impl Default for LayoutRegistry {
    fn default() -> Self {
        Self::with_defaults(LayoutParams::default())
    }
}

impl fmt::Debug for LayoutRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayoutRegistry")
            .field("engines", &self.engines.keys().collect::<Vec<_>>())
            .field("default_engine", &self.default_engine)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Stacked;

    impl LayoutEngine for Stacked {
        fn name(&self) -> &str {
            "stacked"
        }

        fn layout(&self, windows: &[WindowHandle], area: Rect) -> Vec<WindowPlacement> {
            windows
                .iter()
                .map(|window| WindowPlacement { window: *window, frame: area })
                .collect()
        }
    }

    #[test]
    fn defaults_are_registered() {
        let registry = LayoutRegistry::default();
        let names: Vec<_> = registry.names().collect();
        assert_eq!(names, vec!["columns", "grid", "master_stack", "monocle"]);
        assert_eq!(registry.default_engine(), "master_stack");
    }

    #[test]
    fn custom_engines_plug_in_by_name() {
        let mut registry = LayoutRegistry::default();
        registry.register(Arc::new(Stacked));
        let engine = registry.get("stacked").expect("registered");
        let placements = engine.layout(&[WindowHandle::new(1)], Rect::new(0.0, 0.0, 10.0, 10.0));
        assert_eq!(placements.len(), 1);
    }
}
