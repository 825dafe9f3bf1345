//! Runtime startup and shutdown
//!
//! [`Runtime::initialize`] wires configuration, saved state, the dispatcher,
//! native effects and the keybind hook together in a fixed order, and
//! [`Runtime::exit`] takes them down again, persisting state on the way out.

use crate::commands::{CommandError, CommandRegistry};
use crate::config::{
    default_config_path, ConfigParser, ConfigValidator, SavedState, SavedStateManager,
    StrataConfig,
};
use crate::context::{Context, InternalContext};
use crate::hooks::{HookOutcome, KeybindHook};
use crate::layout::LayoutRegistry;
use crate::models::KeyEvent;
use crate::native::effects::{EffectMetrics, LayoutEffects};
use crate::native::{InMemoryNativeManager, NativeManager};
use crate::store::transforms::{
    AddWorkspaceTransform, MonitorsChangedTransform, ReconcileReport, ReconcileWindowsTransform,
};
use crate::store::{Store, StoreActor, StoreHandle};
use anyhow::Context as _;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::broadcast;
use tracing::{debug, info, instrument, warn};

/// Notifications about the runtime itself, sent outside any transform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    Exiting,
    Exited,
}

/// Inputs for [`Runtime::initialize`]
#[derive(Clone)]
pub struct RuntimeOptions {
    /// Configuration file; the platform default when absent
    pub config_path: Option<PathBuf>,
    /// Already parsed configuration, bypassing `config_path`
    pub config: Option<StrataConfig>,
    /// Overrides both the configured and the default saved state location
    pub saved_state_path: Option<PathBuf>,
    pub native: Arc<dyn NativeManager>,
    /// Write saved state on `exit()`
    pub persist_on_exit: bool,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            config_path: None,
            config: None,
            saved_state_path: None,
            native: Arc::new(InMemoryNativeManager::default()),
            persist_on_exit: true,
        }
    }
}

/// Validator that knows the built-in layout engines and commands
pub fn config_validator() -> crate::Result<ConfigValidator> {
    let layouts = LayoutRegistry::default();
    let commands = CommandRegistry::with_defaults();
    let validator = ConfigValidator::new(layouts.names())
        .context("chord pattern failed to compile")?
        .with_commands(commands.ids());
    Ok(validator)
}

/// A running store with its collaborators attached
pub struct Runtime {
    config: StrataConfig,
    store: StoreHandle,
    native: Arc<dyn NativeManager>,
    commands: Arc<CommandRegistry>,
    hook: Option<Arc<KeybindHook>>,
    effects: Arc<EffectMetrics>,
    saved_state: SavedStateManager,
    persist_on_exit: bool,
    lifecycle: broadcast::Sender<LifecycleEvent>,
    exited: bool,
}

impl Runtime {
    #[instrument(skip_all)]
    pub async fn initialize(options: RuntimeOptions) -> crate::Result<Self> {
        let started = Instant::now();

        let mut parser = ConfigParser::new(config_validator()?);
        let config = match options.config {
            Some(config) => {
                parser.check(&config).context("invalid configuration")?;
                config
            }
            None => {
                let path = options.config_path.unwrap_or_else(default_config_path);
                parser
                    .load_or_default(&path)
                    .with_context(|| format!("cannot load configuration {}", path.display()))?
            }
        };

        let saved_path = options
            .saved_state_path
            .or_else(|| config.saved_state.path.clone())
            .unwrap_or_else(SavedStateManager::default_path);
        let saved_state = SavedStateManager::new(saved_path);
        let saved = saved_state.load();

        let context = Arc::new(Context::from_config(&config));
        let internal = Arc::new(InternalContext::new(Arc::clone(&options.native), saved.clone()));
        let store = StoreActor::spawn(Store::new(Arc::clone(&context), internal));

        let effects = LayoutEffects::new(Arc::clone(&options.native));
        let effect_metrics = effects.metrics();
        store
            .add_listener(effects.into_listener())
            .await
            .context("dispatcher stopped during startup")?;

        let (lifecycle, _) = broadcast::channel(8);
        let mut runtime = Self {
            config,
            store,
            native: options.native,
            commands: Arc::new(CommandRegistry::new()),
            hook: None,
            effects: effect_metrics,
            saved_state,
            persist_on_exit: options.persist_on_exit,
            lifecycle,
            exited: false,
        };

        runtime.create_workspaces(&context, &saved).await?;
        runtime.reconcile_monitors().await?;
        let report = runtime.reconcile_windows().await?;

        let mut commands = CommandRegistry::with_defaults();
        commands
            .bind_entries(&runtime.config.effective_keybinds())
            .context("invalid keybind configuration")?;
        let commands = Arc::new(commands);
        runtime.hook = Some(Arc::new(KeybindHook::new(
            Arc::clone(&commands),
            runtime.store.clone(),
        )));
        runtime.commands = commands;

        let snapshot = runtime.store.snapshot();
        info!(
            workspaces = snapshot.workspaces().len(),
            monitors = snapshot.monitors().len(),
            windows = report.added.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Runtime initialized"
        );
        Ok(runtime)
    }

    async fn create_workspaces(&self, context: &Context, saved: &SavedState) -> crate::Result<()> {
        let configured = self.config.effective_workspaces();
        let mut wanted: Vec<(String, Option<String>)> = configured
            .iter()
            .map(|entry| {
                let remembered = saved
                    .workspaces
                    .iter()
                    .find(|workspace| workspace.name == entry.name)
                    .map(|workspace| workspace.layout_engine.clone());
                (entry.name.clone(), entry.layout.clone().or(remembered))
            })
            .collect();
        for workspace in &saved.workspaces {
            if !configured.iter().any(|entry| entry.name == workspace.name) {
                wanted.push((workspace.name.clone(), Some(workspace.layout_engine.clone())));
            }
        }

        for (name, layout) in wanted {
            let mut transform = AddWorkspaceTransform::new(name.as_str());
            match layout {
                Some(engine) if context.layouts.contains(&engine) => {
                    transform = transform.with_layout(engine);
                }
                Some(engine) => {
                    warn!(workspace = %name, %engine, "Unknown layout engine, using default");
                }
                None => {}
            }
            self.store
                .dispatch(transform)
                .await
                .with_context(|| format!("cannot create workspace {name}"))?;
        }
        Ok(())
    }

    /// Bring the monitor sector in line with the native layer
    pub async fn reconcile_monitors(&self) -> crate::Result<()> {
        let monitors = self
            .native
            .list_monitors()
            .context("cannot enumerate monitors")?;
        self.store
            .dispatch(MonitorsChangedTransform { monitors })
            .await
            .context("monitor reconciliation failed")?;
        Ok(())
    }

    /// Bring the window sector in line with the native layer
    pub async fn reconcile_windows(&self) -> crate::Result<ReconcileReport> {
        let windows = self
            .native
            .list_windows()
            .context("cannot enumerate windows")?;
        let report = self
            .store
            .dispatch(ReconcileWindowsTransform { windows })
            .await
            .context("window reconciliation failed")?;
        debug!(?report, "Windows reconciled");
        Ok(report)
    }

    pub fn store(&self) -> &StoreHandle {
        &self.store
    }

    pub fn config(&self) -> &StrataConfig {
        &self.config
    }

    pub fn commands(&self) -> &CommandRegistry {
        &self.commands
    }

    pub fn effect_metrics(&self) -> &EffectMetrics {
        &self.effects
    }

    pub fn saved_state_path(&self) -> &std::path::Path {
        self.saved_state.path()
    }

    pub fn subscribe_lifecycle(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.lifecycle.subscribe()
    }

    /// Entry point for the native keyboard hook
    pub fn handle_key(&self, event: &KeyEvent) -> HookOutcome {
        match &self.hook {
            Some(hook) => hook.on_key(event),
            None => HookOutcome::PassThrough,
        }
    }

    /// Run a command by id and wait for it to finish
    pub async fn execute(&self, command: &str) -> Result<(), CommandError> {
        self.commands.execute(command, &self.store).await
    }

    /// Persist the current snapshot without stopping
    pub fn checkpoint(&self) -> crate::Result<SavedState> {
        let state = SavedState::from_root(&self.store.snapshot());
        self.saved_state
            .save(&state)
            .with_context(|| format!("cannot save state to {}", self.saved_state.path().display()))?;
        debug!(path = %self.saved_state.path().display(), "State checkpointed");
        Ok(state)
    }

    /// Release hooks, persist, drain the dispatcher and stop
    ///
    /// Calling it again after a successful exit does nothing.
    #[instrument(skip_all)]
    pub async fn exit(&mut self) -> crate::Result<()> {
        if self.exited {
            return Ok(());
        }
        info!("Runtime exiting");
        self.notify(LifecycleEvent::Exiting);

        if let Some(hook) = self.hook.take() {
            hook.release();
        }

        let saved = if self.persist_on_exit {
            self.checkpoint().map(|_| ())
        } else {
            Ok(())
        };
        if let Err(err) = &saved {
            warn!(error = %err, "State was not saved");
        }

        self.store.shutdown().await;
        self.exited = true;
        self.notify(LifecycleEvent::Exited);
        info!("Runtime exited");
        saved
    }

    fn notify(&self, event: LifecycleEvent) {
        if self.lifecycle.send(event).is_err() {
            debug!(?event, "No lifecycle subscribers");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{KeybindEntry, WorkspaceEntry};
    use crate::models::{Monitor, MonitorHandle, Rect, Window, WindowHandle};
    use crate::StoreError;
    use tempfile::TempDir;

    fn native() -> Arc<InMemoryNativeManager> {
        Arc::new(InMemoryNativeManager::new_with(
            vec![Monitor::new(MonitorHandle::new(1), "main", Rect::new(0.0, 0.0, 1600.0, 900.0)).primary()],
            vec![
                Window::new(WindowHandle::new(10), "shell", "term"),
                Window::new(WindowHandle::new(11), "editor", "code"),
            ],
        ))
    }

    fn options(dir: &TempDir, native: Arc<InMemoryNativeManager>) -> RuntimeOptions {
        let mut config = StrataConfig::default();
        config.workspaces = vec![WorkspaceEntry::named("web"), WorkspaceEntry::named("code")];
        RuntimeOptions {
            config: Some(config),
            saved_state_path: Some(dir.path().join("state.json")),
            native,
            ..RuntimeOptions::default()
        }
    }

    #[test]
    fn validator_accepts_default_template() {
        let validator = config_validator().unwrap();
        let issues = validator.validate(&StrataConfig::template());
        assert_eq!(ConfigValidator::errors(&issues).count(), 0);
    }

    #[tokio::test]
    async fn initialize_builds_state_from_native() {
        let dir = TempDir::new().unwrap();
        let native = native();
        let mut runtime = Runtime::initialize(options(&dir, Arc::clone(&native))).await.unwrap();

        let root = runtime.store().snapshot();
        assert_eq!(root.workspaces().len(), 2);
        assert_eq!(root.monitors().len(), 1);
        assert_eq!(root.windows().len(), 2);
        assert_eq!(root.check_integrity(), Ok(()));

        runtime.exit().await.unwrap();
        assert!(native.frame_of(WindowHandle::new(10)).is_some());
        assert!(runtime.effect_metrics().frames_applied() >= 2);
    }

    #[tokio::test]
    async fn exit_saves_state_and_notifies() {
        let dir = TempDir::new().unwrap();
        let mut runtime = Runtime::initialize(options(&dir, native())).await.unwrap();
        let mut events = runtime.subscribe_lifecycle();

        runtime.exit().await.unwrap();
        assert_eq!(events.recv().await.unwrap(), LifecycleEvent::Exiting);
        assert_eq!(events.recv().await.unwrap(), LifecycleEvent::Exited);
        assert!(dir.path().join("state.json").exists());

        assert_eq!(
            runtime.store().dispatch(AddWorkspaceTransform::new("late")).await,
            Err(StoreError::StoreClosed)
        );
        runtime.exit().await.unwrap();
    }

    #[tokio::test]
    async fn unknown_keybind_command_fails_startup() {
        let dir = TempDir::new().unwrap();
        let mut options = options(&dir, native());
        if let Some(config) = options.config.as_mut() {
            config.keybinds = vec![KeybindEntry::new("alt+x", "strata.missing")];
        }
        assert!(Runtime::initialize(options).await.is_err());
    }

    #[tokio::test]
    async fn supplied_config_is_validated() {
        let dir = TempDir::new().unwrap();
        let native = native();
        let mut options = options(&dir, Arc::clone(&native));
        if let Some(config) = options.config.as_mut() {
            config.layout.params.main_ratio = 1.5;
        }

        let err = Runtime::initialize(options).await.err().unwrap();
        assert!(format!("{err:#}").contains("layout.main_ratio"));
        assert_eq!(native.frame_of(WindowHandle::new(10)), None);
    }
}
