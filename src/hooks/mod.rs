//! Native hook callbacks
//!
//! Hooks run on threads owned by the OS and must never unwind into native
//! code. Every callback is wrapped by [`guard_hook`], which turns errors and
//! panics into a logged pass-through.

use crate::commands::CommandRegistry;
use crate::models::KeyEvent;
use crate::store::engine::panic_message;
use crate::store::StoreHandle;
use crate::StoreError;
use anyhow::anyhow;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error, trace, warn};

/// What the native layer should do with the event after the hook ran
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookOutcome {
    /// Swallow the event
    Handled,
    /// Let the event continue to other applications
    PassThrough,
}

/// Run a hook body, converting failures into [`HookOutcome::PassThrough`]
pub fn guard_hook<F>(hook: &'static str, body: F) -> HookOutcome
where
    F: FnOnce() -> crate::Result<HookOutcome>,
{
    match catch_unwind(AssertUnwindSafe(body)) {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(err)) => {
            warn!(hook, error = %err, "Hook failed");
            HookOutcome::PassThrough
        }
        Err(payload) => {
            error!(hook, panic = %panic_message(payload.as_ref()), "Hook panicked");
            HookOutcome::PassThrough
        }
    }
}

#[derive(Debug, Default)]
pub struct HookMetrics {
    handled: AtomicU64,
    passed_through: AtomicU64,
}

impl HookMetrics {
    pub fn handled(&self) -> u64 {
        self.handled.load(Ordering::Relaxed)
    }

    pub fn passed_through(&self) -> u64 {
        self.passed_through.load(Ordering::Relaxed)
    }
}

/// Low-level keyboard hook translating bound chords into queued commands
///
/// Commands are submitted without waiting so the OS callback returns
/// immediately; the dispatcher runs them in order.
pub struct KeybindHook {
    registry: Arc<CommandRegistry>,
    store: StoreHandle,
    enabled: AtomicBool,
    metrics: HookMetrics,
}

impl KeybindHook {
    pub fn new(registry: Arc<CommandRegistry>, store: StoreHandle) -> Self {
        Self {
            registry,
            store,
            enabled: AtomicBool::new(true),
            metrics: HookMetrics::default(),
        }
    }

    pub fn on_key(&self, event: &KeyEvent) -> HookOutcome {
        let outcome = guard_hook("keybind", || self.handle_key(event));
        let counter = match outcome {
            HookOutcome::Handled => &self.metrics.handled,
            HookOutcome::PassThrough => &self.metrics.passed_through,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        outcome
    }

    /// Stop reacting to keys; later events pass through untouched
    pub fn release(&self) {
        if self.enabled.swap(false, Ordering::SeqCst) {
            debug!("Keybind hook released");
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn metrics(&self) -> &HookMetrics {
        &self.metrics
    }

    fn handle_key(&self, event: &KeyEvent) -> crate::Result<HookOutcome> {
        if !self.is_enabled() || !event.is_press() || event.is_modifier_only() {
            return Ok(HookOutcome::PassThrough);
        }

        let chord = event.chord();
        let commands = self.registry.commands_for(&chord);
        if commands.is_empty() {
            return Ok(HookOutcome::PassThrough);
        }
        trace!(%chord, commands = commands.len(), "Chord matched");

        let snapshot = self.store.snapshot();
        for id in commands {
            let transform = match self.registry.build(id, &snapshot) {
                Ok(transform) => transform,
                Err(err) => {
                    debug!(command = %id, error = %err, "Command skipped");
                    continue;
                }
            };
            match self.store.submit_boxed(transform) {
                Ok(()) => {}
                Err(StoreError::StoreClosed) => {
                    return Err(anyhow!("store dispatcher is closed"));
                }
                Err(err) => warn!(command = %id, error = %err, "Command dropped"),
            }
        }
        Ok(HookOutcome::Handled)
    }
}
