//! Named commands and the keybinds that trigger them
//!
//! A command is a factory producing a transform from the current snapshot,
//! so positional commands such as `strata.activate_workspace.3` resolve
//! against whatever workspaces exist when the key is pressed.

use crate::config::KeybindEntry;
use crate::models::{Direction, Keybind, KeybindError, WorkspaceId};
use crate::store::transforms::{
    ActivateWorkspaceTransform, DoWorkspaceLayoutTransform, FocusWindowInDirectionTransform,
    MoveWindowToAdjacentMonitorTransform, MoveWindowToWorkspaceTransform,
    SwapWindowInDirectionTransform,
};
use crate::store::{DispatchableTransform, RootState, StoreHandle};
use crate::{StoreError, StoreResult};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Workspace slots that get positional commands
pub const WORKSPACE_SLOTS: usize = 9;

pub type TransformFactory =
    Arc<dyn Fn(&RootState) -> StoreResult<Box<dyn DispatchableTransform>> + Send + Sync>;

#[derive(thiserror::Error, Debug)]
pub enum CommandError {
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Command already registered: {0}")]
    DuplicateCommand(String),

    #[error("Invalid keybind '{keys}': {source}")]
    InvalidKeybind {
        keys: String,
        #[source]
        source: KeybindError,
    },

    #[error("Command {id} cannot run: {source}")]
    Unavailable {
        id: String,
        #[source]
        source: StoreError,
    },
}

/// A named, user-invocable action
#[derive(Clone)]
pub struct Command {
    pub id: String,
    pub title: String,
    factory: TransformFactory,
}

impl Command {
    pub fn new<F>(id: impl Into<String>, title: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&RootState) -> StoreResult<Box<dyn DispatchableTransform>> + Send + Sync + 'static,
    {
        Self {
            id: id.into(),
            title: title.into(),
            factory: Arc::new(factory),
        }
    }

    pub fn build(&self, root: &RootState) -> StoreResult<Box<dyn DispatchableTransform>> {
        (self.factory)(root)
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("id", &self.id)
            .field("title", &self.title)
            .finish_non_exhaustive()
    }
}

fn workspace_at(root: &RootState, slot: usize) -> StoreResult<WorkspaceId> {
    root.workspaces()
        .ids()
        .get(slot.wrapping_sub(1))
        .copied()
        .ok_or_else(|| StoreError::InvalidArgument(format!("there is no workspace {slot}")))
}

/// Commands by id, plus the chords bound to them
#[derive(Debug, Default)]
pub struct CommandRegistry {
    commands: BTreeMap<String, Command>,
    bindings: HashMap<Keybind, Vec<String>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in `strata.*` commands
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        let directional: [(&str, &str, Direction); 2] = [
            ("next", "Next", Direction::Next),
            ("previous", "Previous", Direction::Previous),
        ];

        for (suffix, label, direction) in directional {
            registry.insert(Command::new(
                format!("strata.focus_{suffix}"),
                format!("Focus {} window", label.to_lowercase()),
                move |_: &RootState| {
                    Ok(Box::new(FocusWindowInDirectionTransform::new(direction))
                        as Box<dyn DispatchableTransform>)
                },
            ));
            registry.insert(Command::new(
                format!("strata.swap_{suffix}"),
                format!("Swap with {} window", label.to_lowercase()),
                move |_: &RootState| {
                    Ok(Box::new(SwapWindowInDirectionTransform::new(direction))
                        as Box<dyn DispatchableTransform>)
                },
            ));
            let reverse = direction == Direction::Previous;
            registry.insert(Command::new(
                format!("strata.move_window_to_{suffix}_monitor"),
                format!("Move window to {} monitor", label.to_lowercase()),
                move |_: &RootState| {
                    Ok(Box::new(MoveWindowToAdjacentMonitorTransform {
                        window: None,
                        reverse,
                    }) as Box<dyn DispatchableTransform>)
                },
            ));
        }

        registry.insert(Command::new(
            "strata.relayout",
            "Lay out the active workspace",
            |_: &RootState| {
                Ok(Box::new(DoWorkspaceLayoutTransform::default()) as Box<dyn DispatchableTransform>)
            },
        ));

        for slot in 1..=WORKSPACE_SLOTS {
            registry.insert(Command::new(
                format!("strata.activate_workspace.{slot}"),
                format!("Activate workspace {slot}"),
                move |root: &RootState| {
                    let workspace = workspace_at(root, slot)?;
                    Ok(Box::new(ActivateWorkspaceTransform::new(workspace))
                        as Box<dyn DispatchableTransform>)
                },
            ));
            registry.insert(Command::new(
                format!("strata.move_window_to_workspace.{slot}"),
                format!("Move window to workspace {slot}"),
                move |root: &RootState| {
                    let workspace = workspace_at(root, slot)?;
                    Ok(Box::new(MoveWindowToWorkspaceTransform::new(workspace, None))
                        as Box<dyn DispatchableTransform>)
                },
            ));
        }
        registry
    }

    fn insert(&mut self, command: Command) {
        self.commands.insert(command.id.clone(), command);
    }

    pub fn register(&mut self, command: Command) -> Result<(), CommandError> {
        if self.commands.contains_key(&command.id) {
            return Err(CommandError::DuplicateCommand(command.id));
        }
        self.insert(command);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Command> {
        self.commands.get(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.commands.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Bind a chord to a command; one chord may trigger several commands
    pub fn bind(&mut self, chord: Keybind, id: &str) -> Result<(), CommandError> {
        if !self.commands.contains_key(id) {
            return Err(CommandError::UnknownCommand(id.to_string()));
        }
        let bound = self.bindings.entry(chord).or_default();
        if !bound.iter().any(|existing| existing == id) {
            bound.push(id.to_string());
        }
        Ok(())
    }

    pub fn bind_entries(&mut self, entries: &[KeybindEntry]) -> Result<(), CommandError> {
        for entry in entries {
            let chord: Keybind =
                entry
                    .keys
                    .parse()
                    .map_err(|source| CommandError::InvalidKeybind {
                        keys: entry.keys.clone(),
                        source,
                    })?;
            self.bind(chord, &entry.command)?;
        }
        Ok(())
    }

    /// Commands bound to a chord, in binding order
    pub fn commands_for(&self, chord: &Keybind) -> &[String] {
        self.bindings.get(chord).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn build(
        &self,
        id: &str,
        root: &RootState,
    ) -> Result<Box<dyn DispatchableTransform>, CommandError> {
        let command = self
            .get(id)
            .ok_or_else(|| CommandError::UnknownCommand(id.to_string()))?;
        command.build(root).map_err(|source| CommandError::Unavailable {
            id: id.to_string(),
            source,
        })
    }

    /// Build a command against the latest snapshot and queue it without waiting
    pub fn submit(&self, id: &str, handle: &StoreHandle) -> Result<(), CommandError> {
        let transform = self.build(id, &handle.snapshot())?;
        debug!(command = id, transform = transform.transform_name(), "Submitting command");
        handle
            .submit_boxed(transform)
            .map_err(|source| CommandError::Unavailable {
                id: id.to_string(),
                source,
            })
    }

    /// Build a command and wait for the dispatcher to run it
    pub async fn execute(&self, id: &str, handle: &StoreHandle) -> Result<(), CommandError> {
        let transform = self.build(id, &handle.snapshot())?;
        handle
            .dispatch_boxed(transform)
            .await
            .map_err(|source| CommandError::Unavailable {
                id: id.to_string(),
                source,
            })
    }
}
