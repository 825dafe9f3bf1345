//! Explicit context handed to every transform
//!
//! Nothing in the store reaches for globals. Everything a transform may
//! consult besides the root snapshot travels through these two values.

use crate::config::{SavedState, StrataConfig, DEFAULT_CHANNEL_CAPACITY};
use crate::layout::{LayoutParams, LayoutRegistry};
use crate::native::{InMemoryNativeManager, NativeManager};
use std::fmt;
use std::sync::Arc;

/// Dispatcher behaviour switches
#[derive(Debug, Clone, PartialEq)]
pub struct StoreSettings {
    /// Run `RootState::check_integrity` on every staged root before commit
    pub check_integrity: bool,
    pub dispatch_capacity: usize,
    pub event_capacity: usize,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            check_integrity: true,
            dispatch_capacity: DEFAULT_CHANNEL_CAPACITY,
            event_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

/// Public collaborators: layout engines and store settings
#[derive(Debug, Clone, Default)]
pub struct Context {
    pub layouts: LayoutRegistry,
    pub settings: StoreSettings,
}

impl Context {
    pub fn new(layouts: LayoutRegistry, settings: StoreSettings) -> Self {
        Self { layouts, settings }
    }

    pub fn from_config(config: &StrataConfig) -> Self {
        let mut layouts = LayoutRegistry::with_defaults(config.layout.params);
        layouts.set_default_engine(config.layout.default_engine.clone());
        Self {
            layouts,
            settings: StoreSettings {
                check_integrity: config.store.check_integrity,
                dispatch_capacity: config.store.dispatch_capacity.max(1),
                event_capacity: config.store.event_capacity.max(1),
            },
        }
    }

    pub fn with_layout_params(params: LayoutParams) -> Self {
        Self {
            layouts: LayoutRegistry::with_defaults(params),
            settings: StoreSettings::default(),
        }
    }
}

/// Runtime-only collaborators that commands never see directly
#[derive(Clone)]
pub struct InternalContext {
    pub native: Arc<dyn NativeManager>,
    /// Snapshot loaded at startup, consulted when monitors appear
    pub saved_state: SavedState,
}

impl InternalContext {
    pub fn new(native: Arc<dyn NativeManager>, saved_state: SavedState) -> Self {
        Self {
            native,
            saved_state,
        }
    }
}

impl Default for InternalContext {
    fn default() -> Self {
        Self::new(Arc::new(InMemoryNativeManager::default()), SavedState::default())
    }
}

impl fmt::Debug for InternalContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InternalContext")
            .field("saved_state", &self.saved_state)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_follows_config() {
        let mut config = StrataConfig::default();
        config.layout.default_engine = "grid".into();
        config.store.check_integrity = false;
        config.store.event_capacity = 0;

        let context = Context::from_config(&config);
        assert_eq!(context.layouts.default_engine(), "grid");
        assert!(!context.settings.check_integrity);
        assert_eq!(context.settings.event_capacity, 1);
    }
}
