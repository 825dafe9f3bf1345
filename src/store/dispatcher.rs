//! Single-consumer dispatch loop
//!
//! The [`StoreActor`] owns the [`Store`] inside one tokio task and applies
//! queued messages strictly in arrival order. Everything else, whether a hook
//! callback, a native notification or a CLI command, talks to it through a
//! cloneable [`StoreHandle`]. Reads bypass the queue entirely by looking at
//! the published snapshot.

use super::engine::{EventListener, Store, StoreMetrics};
use super::events::StoreEvent;
use super::picker::Picker;
use super::transform::{DispatchableTransform, Transform};
use super::RootState;
use crate::{StoreError, StoreResult};
use std::sync::Arc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{broadcast, mpsc, oneshot, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

type StoreJob = Box<dyn FnOnce(&mut Store) + Send>;

/// Work queued for the dispatch loop
pub enum StoreMessage {
    Dispatch { name: &'static str, job: StoreJob },
    AddListener(EventListener),
    /// Stop accepting work, finish what is queued, then exit
    Shutdown,
}

impl StoreMessage {
    pub fn name(&self) -> &'static str {
        match self {
            StoreMessage::Dispatch { name, .. } => *name,
            StoreMessage::AddListener(_) => "add_listener",
            StoreMessage::Shutdown => "shutdown",
        }
    }
}

pub struct StoreActor {
    store: Store,
    receiver: mpsc::Receiver<StoreMessage>,
}

impl StoreActor {
    /// Move the store into its own task and return a handle to it
    pub fn spawn(store: Store) -> StoreHandle {
        let capacity = store.context().settings.dispatch_capacity.max(1);
        let (sender, receiver) = mpsc::channel(capacity);
        let state = store.watch();
        let events = store.event_sender();

        let actor = Self { store, receiver };
        let task = tokio::spawn(actor.run());
        debug!(capacity, "Store dispatcher started");

        StoreHandle {
            sender,
            state,
            events,
            task: Arc::new(Mutex::new(Some(task))),
        }
    }

    async fn run(mut self) {
        while let Some(message) = self.receiver.recv().await {
            if matches!(message, StoreMessage::Shutdown) {
                debug!("Store dispatcher draining");
                self.receiver.close();
                while let Some(pending) = self.receiver.recv().await {
                    self.handle(pending);
                }
                break;
            }
            self.handle(message);
        }
        debug!(metrics = ?self.store.metrics(), "Store dispatcher stopped");
    }

    fn handle(&mut self, message: StoreMessage) {
        trace!(message = message.name(), "Handling store message");
        match message {
            StoreMessage::Dispatch { job, .. } => job(&mut self.store),
            StoreMessage::AddListener(listener) => self.store.add_listener(listener),
            StoreMessage::Shutdown => {}
        }
    }
}

/// Cloneable access to a running dispatcher
#[derive(Clone)]
pub struct StoreHandle {
    sender: mpsc::Sender<StoreMessage>,
    state: watch::Receiver<Arc<RootState>>,
    events: broadcast::Sender<StoreEvent>,
    task: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl StoreHandle {
    /// Queue a transform and wait for its result
    pub async fn dispatch<T: Transform>(&self, transform: T) -> StoreResult<T::Output> {
        let (reply, response) = oneshot::channel();
        let name = transform.name();
        let job: StoreJob = Box::new(move |store: &mut Store| {
            let _ = reply.send(store.dispatch(&transform));
        });
        self.send(StoreMessage::Dispatch { name, job }).await?;
        response.await.map_err(|_| StoreError::StoreClosed)?
    }

    /// Queue a type-erased transform and wait for it to finish
    pub async fn dispatch_boxed(&self, transform: Box<dyn DispatchableTransform>) -> StoreResult<()> {
        let (reply, response) = oneshot::channel();
        let name = transform.transform_name();
        let job: StoreJob = Box::new(move |store: &mut Store| {
            let _ = reply.send(transform.dispatch_into(store));
        });
        self.send(StoreMessage::Dispatch { name, job }).await?;
        response.await.map_err(|_| StoreError::StoreClosed)?
    }

    /// Queue a transform without waiting, for callers that must not block
    ///
    /// Failures of the transform itself are logged by the dispatcher. A full
    /// queue is reported immediately instead of waiting for room.
    pub fn submit<T: Transform>(&self, transform: T) -> StoreResult<()> {
        self.submit_boxed(Box::new(transform))
    }

    pub fn submit_boxed(&self, transform: Box<dyn DispatchableTransform>) -> StoreResult<()> {
        let name = transform.transform_name();
        let job: StoreJob = Box::new(move |store: &mut Store| match transform.dispatch_into(store) {
            Ok(()) => {}
            Err(err) if err.is_not_found() => {
                debug!(transform = name, error = %err, "Submitted transform had nothing to act on")
            }
            Err(err) => warn!(transform = name, error = %err, "Submitted transform failed"),
        });

        self.sender
            .try_send(StoreMessage::Dispatch { name, job })
            .map_err(|err| match err {
                TrySendError::Full(_) => {
                    StoreError::ExternalOperationFailed(format!("dispatch queue is full; dropped {name}"))
                }
                TrySendError::Closed(_) => StoreError::StoreClosed,
            })
    }

    /// Run a picker against the latest committed snapshot without queueing
    pub fn pick<P: Picker>(&self, picker: &P) -> StoreResult<P::Output> {
        picker.pick(&self.snapshot())
    }

    pub fn snapshot(&self) -> Arc<RootState> {
        self.state.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<Arc<RootState>> {
        self.state.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    pub async fn add_listener(&self, listener: EventListener) -> StoreResult<()> {
        self.send(StoreMessage::AddListener(listener)).await
    }

    pub async fn metrics(&self) -> StoreResult<StoreMetrics> {
        let (reply, response) = oneshot::channel();
        let job: StoreJob = Box::new(move |store: &mut Store| {
            let _ = reply.send(store.metrics());
        });
        self.send(StoreMessage::Dispatch { name: "metrics", job }).await?;
        response.await.map_err(|_| StoreError::StoreClosed)
    }

    /// Stop accepting work and wait until everything already queued has run
    pub async fn shutdown(&self) {
        if self.sender.send(StoreMessage::Shutdown).await.is_err() {
            trace!("Store dispatcher already stopped");
        }
        if let Some(task) = self.task.lock().await.take() {
            if let Err(err) = task.await {
                warn!(error = %err, "Store dispatcher task ended abnormally");
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    async fn send(&self, message: StoreMessage) -> StoreResult<()> {
        self.sender
            .send(message)
            .await
            .map_err(|_| StoreError::StoreClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{Context, InternalContext};
    use crate::models::{Workspace, WorkspaceId};
    use crate::store::TransformContext;

    #[derive(Debug)]
    struct CreateWorkspace(WorkspaceId, &'static str);

    impl Transform for CreateWorkspace {
        type Output = usize;

        fn name(&self) -> &'static str {
            "create_workspace"
        }

        fn execute(&self, cx: &mut TransformContext<'_>) -> StoreResult<usize> {
            if cx.root().workspaces().find_by_name(self.1).is_some() {
                return Err(StoreError::InvalidArgument(format!("{} exists", self.1)));
            }
            cx.workspaces_mut()
                .insert(Workspace::new(self.0, self.1, "columns"));
            cx.queue_event(StoreEvent::WorkspaceAdded {
                workspace: self.0,
                name: self.1.to_string(),
            });
            Ok(cx.root().workspaces().len())
        }
    }

    fn spawn() -> StoreHandle {
        StoreActor::spawn(Store::new(
            Arc::new(Context::default()),
            Arc::new(InternalContext::default()),
        ))
    }

    #[tokio::test]
    async fn dispatches_apply_in_order() {
        let handle = spawn();
        let mut events = handle.subscribe();

        assert_eq!(handle.dispatch(CreateWorkspace(WorkspaceId::generate(), "a")).await, Ok(1));
        assert_eq!(handle.dispatch(CreateWorkspace(WorkspaceId::generate(), "b")).await, Ok(2));
        assert!(handle
            .dispatch(CreateWorkspace(WorkspaceId::generate(), "a"))
            .await
            .is_err());

        assert_eq!(handle.snapshot().workspaces().len(), 2);
        assert!(matches!(events.recv().await, Ok(StoreEvent::WorkspaceAdded { name, .. }) if name == "a"));
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn shutdown_drains_submitted_work() {
        let handle = spawn();
        for name in ["one", "two", "three"] {
            handle
                .submit(CreateWorkspace(WorkspaceId::generate(), name))
                .unwrap();
        }
        handle.shutdown().await;

        assert_eq!(handle.snapshot().workspaces().len(), 3);
        assert!(handle.is_closed());
        assert_eq!(
            handle.submit(CreateWorkspace(WorkspaceId::generate(), "late")),
            Err(StoreError::StoreClosed)
        );
        assert_eq!(
            handle
                .dispatch(CreateWorkspace(WorkspaceId::generate(), "late"))
                .await,
            Err(StoreError::StoreClosed)
        );
    }

    #[tokio::test]
    async fn metrics_count_outcomes() {
        let handle = spawn();
        let id = WorkspaceId::generate();
        handle.dispatch(CreateWorkspace(id, "x")).await.unwrap();
        let _ = handle.dispatch(CreateWorkspace(id, "x")).await;

        let metrics = handle.metrics().await.unwrap();
        assert_eq!(metrics.dispatched, 2);
        assert_eq!(metrics.committed, 1);
        assert_eq!(metrics.failed, 1);
        handle.shutdown().await;
    }
}
