//! Configuration for the store runtime
//!
//! Configuration is a single TOML file. Every section has defaults, so an
//! empty or missing file yields a working two-workspace setup.

pub mod parser;
pub mod saved_state;
pub mod validator;

use crate::layout::LayoutParams;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub use parser::{ConfigParseError, ConfigParser};
pub use saved_state::{SavedState, SavedStateError, SavedStateManager};
pub use validator::{ConfigValidator, ValidationIssue, ValidationSeverity};

/// Default dispatch and event channel capacity
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Top-level configuration file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StrataConfig {
    pub store: StoreSection,
    pub layout: LayoutSection,
    pub workspaces: Vec<WorkspaceEntry>,
    pub keybinds: Vec<KeybindEntry>,
    pub saved_state: SavedStateSection,
}

/// Dispatcher tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSection {
    /// Pending transforms the dispatcher queue holds before `submit` reports back-pressure
    pub dispatch_capacity: usize,
    /// Events buffered per broadcast subscriber
    pub event_capacity: usize,
    /// Check relational invariants before every commit
    pub check_integrity: bool,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            dispatch_capacity: DEFAULT_CHANNEL_CAPACITY,
            event_capacity: DEFAULT_CHANNEL_CAPACITY,
            check_integrity: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutSection {
    pub default_engine: String,
    #[serde(flatten)]
    pub params: LayoutParams,
}

impl Default for LayoutSection {
    fn default() -> Self {
        Self {
            default_engine: "master_stack".to_string(),
            params: LayoutParams::default(),
        }
    }
}

/// A workspace created at startup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceEntry {
    pub name: String,
    /// Layout engine name; the layout section's default when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<String>,
}

impl WorkspaceEntry {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            layout: None,
        }
    }
}

/// A chord bound to a command id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeybindEntry {
    pub keys: String,
    pub command: String,
}

impl KeybindEntry {
    pub fn new(keys: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            keys: keys.into(),
            command: command.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SavedStateSection {
    /// Override for the saved state file location
    pub path: Option<PathBuf>,
}

impl StrataConfig {
    /// Workspaces to create, falling back to "1" and "2" when none are configured
    pub fn effective_workspaces(&self) -> Vec<WorkspaceEntry> {
        if self.workspaces.is_empty() {
            vec![WorkspaceEntry::named("1"), WorkspaceEntry::named("2")]
        } else {
            self.workspaces.clone()
        }
    }

    /// Keybinds to register, falling back to the built-in set when none are configured
    pub fn effective_keybinds(&self) -> Vec<KeybindEntry> {
        if !self.keybinds.is_empty() {
            return self.keybinds.clone();
        }

        let mut keybinds = vec![
            KeybindEntry::new("alt+j", "strata.focus_next"),
            KeybindEntry::new("alt+k", "strata.focus_previous"),
            KeybindEntry::new("alt+shift+j", "strata.swap_next"),
            KeybindEntry::new("alt+shift+k", "strata.swap_previous"),
            KeybindEntry::new("alt+shift+l", "strata.move_window_to_next_monitor"),
            KeybindEntry::new("alt+shift+h", "strata.move_window_to_previous_monitor"),
            KeybindEntry::new("alt+r", "strata.relayout"),
        ];
        let count = self.effective_workspaces().len().min(9);
        for index in 1..=count {
            keybinds.push(KeybindEntry::new(
                format!("alt+{index}"),
                format!("strata.activate_workspace.{index}"),
            ));
            keybinds.push(KeybindEntry::new(
                format!("alt+shift+{index}"),
                format!("strata.move_window_to_workspace.{index}"),
            ));
        }
        keybinds
    }

    /// Render the configuration as TOML, including effective defaults
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// A fully populated template suitable for writing to disk
    pub fn template() -> Self {
        let mut config = Self::default();
        config.workspaces = config.effective_workspaces();
        config.keybinds = config.effective_keybinds();
        config
    }
}

/// `$XDG_CONFIG_HOME/strata/config.toml` or the platform equivalent
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("strata")
        .join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_falls_back_to_two_workspaces() {
        let config = StrataConfig::default();
        let names: Vec<_> = config
            .effective_workspaces()
            .into_iter()
            .map(|w| w.name)
            .collect();
        assert_eq!(names, vec!["1", "2"]);
        assert!(config.store.check_integrity);
        assert_eq!(config.store.dispatch_capacity, DEFAULT_CHANNEL_CAPACITY);
    }

    #[test]
    fn default_keybinds_cover_each_workspace() {
        let keybinds = StrataConfig::default().effective_keybinds();
        assert!(keybinds
            .iter()
            .any(|k| k.keys == "alt+2" && k.command == "strata.activate_workspace.2"));
        assert!(!keybinds.iter().any(|k| k.keys == "alt+3"));
    }

    #[test]
    fn template_round_trips_through_toml() {
        let template = StrataConfig::template();
        let rendered = template.to_toml_string().unwrap();
        let parsed: StrataConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed, template);
    }
}
