//! Last-known-good snapshot persisted across restarts
//!
//! This is not a transaction log. It records just enough to bring the
//! desktop back the way it was: which workspaces existed and which one each
//! monitor was showing.

use crate::models::MonitorHandle;
use crate::store::RootState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum SavedStateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedWorkspace {
    pub name: String,
    pub layout_engine: String,
}

/// Workspace (by name) a monitor was showing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedMonitorWorkspace {
    pub monitor: MonitorHandle,
    /// Display name, used when the native layer hands out a new handle
    pub monitor_name: String,
    pub workspace: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SavedState {
    #[serde(default)]
    pub workspaces: Vec<SavedWorkspace>,
    #[serde(default)]
    pub monitor_workspaces: Vec<SavedMonitorWorkspace>,
    pub saved_at: DateTime<Utc>,
}

impl SavedState {
    /// Capture the persistable parts of a snapshot
    pub fn from_root(root: &RootState) -> Self {
        let workspaces = root
            .workspaces()
            .iter()
            .map(|workspace| SavedWorkspace {
                name: workspace.name.clone(),
                layout_engine: workspace.layout_engine.clone(),
            })
            .collect();

        let monitor_workspaces = root
            .map()
            .monitor_assignments()
            .filter_map(|(monitor, workspace)| {
                let name = &root.workspaces().get(workspace)?.name;
                let monitor_name = &root.monitors().get(monitor)?.name;
                Some(SavedMonitorWorkspace {
                    monitor,
                    monitor_name: monitor_name.clone(),
                    workspace: name.clone(),
                })
            })
            .collect();

        Self {
            workspaces,
            monitor_workspaces,
            saved_at: Utc::now(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.workspaces.is_empty() && self.monitor_workspaces.is_empty()
    }

    /// Name of the workspace last shown on a monitor, matched by handle then by display name
    pub fn workspace_for_monitor(&self, monitor: MonitorHandle, monitor_name: &str) -> Option<&str> {
        self.monitor_workspaces
            .iter()
            .find(|entry| entry.monitor == monitor)
            .or_else(|| {
                self.monitor_workspaces
                    .iter()
                    .find(|entry| entry.monitor_name == monitor_name)
            })
            .map(|entry| entry.workspace.as_str())
    }
}

/// Reads and writes the saved state file
#[derive(Debug, Clone)]
pub struct SavedStateManager {
    path: PathBuf,
}

impl SavedStateManager {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `$XDG_DATA_HOME/strata/saved_state.json` or the platform equivalent
    pub fn default_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("strata")
            .join("saved_state.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the snapshot; a missing or unreadable file yields an empty one
    pub fn load(&self) -> SavedState {
        match self.try_load() {
            Ok(Some(state)) => {
                info!(
                    path = %self.path.display(),
                    workspaces = state.workspaces.len(),
                    "Loaded saved state"
                );
                state
            }
            Ok(None) => {
                debug!(path = %self.path.display(), "No saved state found");
                SavedState::default()
            }
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "Ignoring unreadable saved state");
                SavedState::default()
            }
        }
    }

    pub fn try_load(&self) -> Result<Option<SavedState>, SavedStateError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    pub fn save(&self, state: &SavedState) -> Result<(), SavedStateError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(state)?;

        // Atomic write
        let temp_path = self.path.with_extension("tmp");
        fs::write(&temp_path, content)?;
        fs::rename(temp_path, &self.path)?;

        debug!(path = %self.path.display(), "Saved state written");
        Ok(())
    }
}

impl Default for SavedStateManager {
    fn default() -> Self {
        Self::new(Self::default_path())
    }
}
