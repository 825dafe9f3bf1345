//! The store: current snapshot plus the commit pipeline

use super::events::StoreEvent;
use super::picker::Picker;
use super::transform::{Transform, TransformContext};
use super::RootState;
use crate::context::{Context, InternalContext};
use crate::{StoreError, StoreResult};
use serde::Serialize;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tracing::{debug, error, info_span, trace, warn};

/// Synchronous observer called after each commit, before broadcast subscribers
pub type EventListener = Box<dyn Fn(&StoreEvent, &RootState) + Send + Sync>;

/// Dispatch counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreMetrics {
    pub dispatched: u64,
    pub committed: u64,
    /// Successful dispatches that changed nothing
    pub no_ops: u64,
    pub failed: u64,
    pub events_delivered: u64,
}

/// Owner of the published [`RootState`]
///
/// `dispatch` takes `&mut self`, so transforms are serialized by whoever owns
/// the store; in a running system that is the [`StoreActor`](super::StoreActor)
/// task. Readers never need the store itself: [`Store::watch`] hands out
/// receivers that always see the latest committed snapshot.
pub struct Store {
    context: Arc<Context>,
    internal: Arc<InternalContext>,
    state: watch::Sender<Arc<RootState>>,
    events: broadcast::Sender<StoreEvent>,
    listeners: Vec<EventListener>,
    metrics: StoreMetrics,
}

impl Store {
    pub fn new(context: Arc<Context>, internal: Arc<InternalContext>) -> Self {
        Self::with_root(context, internal, RootState::default())
    }

    /// Start from an existing snapshot instead of an empty one
    pub fn with_root(context: Arc<Context>, internal: Arc<InternalContext>, root: RootState) -> Self {
        let (state, _) = watch::channel(Arc::new(root));
        let (events, _) = broadcast::channel(context.settings.event_capacity.max(1));
        Self {
            context,
            internal,
            state,
            events,
            listeners: Vec::new(),
            metrics: StoreMetrics::default(),
        }
    }

    pub fn context(&self) -> &Arc<Context> {
        &self.context
    }

    pub fn internal(&self) -> &Arc<InternalContext> {
        &self.internal
    }

    /// Execute a transform and commit its result
    ///
    /// On error nothing is published and no event is delivered. A successful
    /// transform that queued no events and replaced no sector publishes
    /// nothing either.
    pub fn dispatch<T: Transform>(&mut self, transform: &T) -> StoreResult<T::Output> {
        let span = info_span!("dispatch", transform = transform.name());
        let _guard = span.enter();
        self.metrics.dispatched += 1;

        let current = self.snapshot();
        let context = &self.context;
        let internal = &self.internal;
        let executed = catch_unwind(AssertUnwindSafe(|| {
            let mut cx = TransformContext::new(context, internal, RootState::clone(&current));
            let output = transform.execute(&mut cx)?;
            Ok::<_, StoreError>((output, cx.into_parts()))
        }))
        .unwrap_or_else(|payload| {
            let message = panic_message(payload.as_ref());
            error!(panic = %message, "Transform panicked; state left unchanged");
            Err(StoreError::Fatal(format!("{} panicked: {message}", transform.name())))
        });

        let (output, (root, mut queues)) = match executed {
            Ok(executed) => executed,
            Err(err) => {
                self.metrics.failed += 1;
                debug!(error = %err, "Transform failed");
                return Err(err);
            }
        };

        if queues.is_empty() && root.ptr_eq(&current) {
            self.metrics.no_ops += 1;
            trace!("Transform made no changes");
            return Ok(output);
        }

        if self.context.settings.check_integrity {
            if let Err(err) = root.check_integrity() {
                self.metrics.failed += 1;
                warn!(error = %err, "Rejected transform that would break integrity");
                return Err(err);
            }
        }

        let root = Arc::new(root);
        self.state.send_replace(Arc::clone(&root));
        self.metrics.committed += 1;

        let events = queues.drain_ordered();
        debug!(events = events.len(), "Committed");
        for event in events {
            self.deliver(event, &root);
        }

        Ok(output)
    }

    /// Run a picker against the latest committed snapshot
    pub fn pick<P: Picker>(&self, picker: &P) -> StoreResult<P::Output> {
        picker.pick(&self.snapshot())
    }

    pub fn snapshot(&self) -> Arc<RootState> {
        self.state.borrow().clone()
    }

    /// Receiver that always holds the latest committed snapshot
    pub fn watch(&self) -> watch::Receiver<Arc<RootState>> {
        self.state.subscribe()
    }

    /// Receive committed events; slow receivers observe `Lagged`
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    pub(crate) fn event_sender(&self) -> broadcast::Sender<StoreEvent> {
        self.events.clone()
    }

    pub fn add_listener(&mut self, listener: EventListener) {
        self.listeners.push(listener);
    }

    pub fn metrics(&self) -> StoreMetrics {
        self.metrics
    }

    fn deliver(&mut self, event: StoreEvent, root: &RootState) {
        trace!(event = event.name(), "Delivering event");
        for listener in &self.listeners {
            let delivered = catch_unwind(AssertUnwindSafe(|| listener(&event, root)));
            if let Err(payload) = delivered {
                error!(
                    event = event.name(),
                    panic = %panic_message(payload.as_ref()),
                    "Event listener panicked"
                );
            }
        }
        // No subscribers is not an error
        let _ = self.events.send(event);
        self.metrics.events_delivered += 1;
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{WindowHandle, Workspace, WorkspaceId};
    use std::sync::Mutex;

    #[derive(Debug)]
    struct AddEmptyWorkspace(WorkspaceId);

    impl Transform for AddEmptyWorkspace {
        type Output = WorkspaceId;

        fn name(&self) -> &'static str {
            "add_empty_workspace"
        }

        fn execute(&self, cx: &mut TransformContext<'_>) -> StoreResult<WorkspaceId> {
            if cx.root().workspaces().contains(self.0) {
                return Ok(self.0);
            }
            cx.workspaces_mut()
                .insert(Workspace::new(self.0, "scratch", "master_stack"));
            cx.queue_event(StoreEvent::WorkspaceAdded {
                workspace: self.0,
                name: "scratch".into(),
            });
            Ok(self.0)
        }
    }

    #[derive(Debug)]
    struct Dangle;

    impl Transform for Dangle {
        type Output = ();

        fn name(&self) -> &'static str {
            "dangle"
        }

        fn execute(&self, cx: &mut TransformContext<'_>) -> StoreResult<()> {
            cx.map_mut()
                .assign_window(WindowHandle::new(1), WorkspaceId::generate());
            Ok(())
        }
    }

    #[derive(Debug)]
    struct Explode;

    impl Transform for Explode {
        type Output = ();

        fn name(&self) -> &'static str {
            "explode"
        }

        fn execute(&self, _cx: &mut TransformContext<'_>) -> StoreResult<()> {
            panic!("boom")
        }
    }

    fn store() -> Store {
        Store::new(Arc::new(Context::default()), Arc::new(InternalContext::default()))
    }

    #[test]
    fn commit_publishes_then_notifies() {
        let mut store = store();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        store.add_listener(Box::new(move |event: &StoreEvent, root: &RootState| {
            sink.lock()
                .unwrap()
                .push((event.name(), root.workspaces().len()));
        }));
        let mut events = store.subscribe();

        let id = WorkspaceId::generate();
        assert_eq!(store.dispatch(&AddEmptyWorkspace(id)), Ok(id));

        assert_eq!(*seen.lock().unwrap(), vec![("workspace_added", 1)]);
        assert!(matches!(
            events.try_recv(),
            Ok(StoreEvent::WorkspaceAdded { .. })
        ));
        assert_eq!(store.metrics().committed, 1);
    }

    #[test]
    fn unchanged_result_is_not_published() {
        let mut store = store();
        let id = WorkspaceId::generate();
        store.dispatch(&AddEmptyWorkspace(id)).unwrap();
        let before = store.snapshot();

        store.dispatch(&AddEmptyWorkspace(id)).unwrap();
        assert!(Arc::ptr_eq(&before, &store.snapshot()));
        assert_eq!(store.metrics().no_ops, 1);
    }

    #[test]
    fn integrity_violations_are_rejected() {
        let mut store = store();
        let before = store.snapshot();
        assert!(matches!(
            store.dispatch(&Dangle),
            Err(StoreError::InvariantViolation(_))
        ));
        assert!(Arc::ptr_eq(&before, &store.snapshot()));
    }

    #[test]
    fn panics_become_fatal_errors() {
        let mut store = store();
        assert!(matches!(store.dispatch(&Explode), Err(StoreError::Fatal(_))));

        let id = WorkspaceId::generate();
        assert_eq!(store.dispatch(&AddEmptyWorkspace(id)), Ok(id));
        assert_eq!(store.metrics().failed, 1);
    }

    #[test]
    fn panicking_listener_does_not_block_others() {
        let mut store = store();
        let calls = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&calls);
        store.add_listener(Box::new(|_: &StoreEvent, _: &RootState| panic!("listener bug")));
        store.add_listener(Box::new(move |_: &StoreEvent, _: &RootState| {
            *counter.lock().unwrap() += 1
        }));

        store
            .dispatch(&AddEmptyWorkspace(WorkspaceId::generate()))
            .unwrap();
        assert_eq!(*calls.lock().unwrap(), 1);
    }
}
