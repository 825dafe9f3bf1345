//! Strata - transactional state store for a tiling desktop environment
//!
//! Strata keeps the live picture of which windows exist, which workspace
//! owns them and which monitor shows each workspace. All changes flow through
//! validated transforms executed by a single dispatcher, reads go through pure
//! pickers over immutable snapshots, and observers are notified only after a
//! transform has committed.

pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod hooks;
pub mod layout;
pub mod lifecycle;
pub mod logging;
pub mod models;
pub mod native;
pub mod store;

pub use context::{Context, InternalContext};
pub use models::*;
pub use store::{
    Picker, RootState, Store, StoreActor, StoreEvent, StoreHandle, Transform, TransformContext,
};

/// Result type alias for application-level operations
pub type Result<T> = anyhow::Result<T>;

/// Result type returned by every sector, picker and transform operation
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Failure categories shared by all store errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum ErrorKind {
    /// A window, workspace or monitor is not tracked (expected, recoverable)
    NotFound,
    /// Malformed transform parameters
    InvalidArgument,
    /// The change would leave the relational state inconsistent
    InvariantViolation,
    /// A native call failed after the logical state committed
    ExternalOperationFailed,
    /// Internal contradiction surfaced to the top-level handler
    Fatal,
    /// The dispatcher is no longer accepting work
    Closed,
}

/// Error types produced by the store
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("No valid window to operate on")]
    NoValidWindow,

    #[error("Window not found: {0}")]
    WindowNotFound(WindowHandle),

    #[error("Workspace not found: {0}")]
    WorkspaceNotFound(WorkspaceId),

    #[error("Monitor not found: {0}")]
    MonitorNotFound(MonitorHandle),

    #[error("No workspace is shown on {0}")]
    NoWorkspaceOnMonitor(MonitorHandle),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("External operation failed: {0}")]
    ExternalOperationFailed(String),

    #[error("Fatal store error: {0}")]
    Fatal(String),

    #[error("Store dispatcher is closed")]
    StoreClosed,
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::NoValidWindow
            | StoreError::WindowNotFound(_)
            | StoreError::WorkspaceNotFound(_)
            | StoreError::MonitorNotFound(_)
            | StoreError::NoWorkspaceOnMonitor(_) => ErrorKind::NotFound,
            StoreError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            StoreError::InvariantViolation(_) => ErrorKind::InvariantViolation,
            StoreError::ExternalOperationFailed(_) => ErrorKind::ExternalOperationFailed,
            StoreError::Fatal(_) => ErrorKind::Fatal,
            StoreError::StoreClosed => ErrorKind::Closed,
        }
    }

    /// True for the "entity absent" family, which callers usually ignore
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

/// Lookup helpers turning absent entities into typed errors
pub trait OptionExt<T> {
    /// Turn a missing value into the given not-found error, keeping any earlier error
    fn or_not_found(self, err: impl FnOnce() -> StoreError) -> StoreResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn or_not_found(self, err: impl FnOnce() -> StoreError) -> StoreResult<T> {
        self.ok_or_else(err)
    }
}

impl<T> OptionExt<T> for StoreResult<Option<T>> {
    fn or_not_found(self, err: impl FnOnce() -> StoreError) -> StoreResult<T> {
        self?.ok_or_else(err)
    }
}

/// Chaining helpers for store results
pub trait ResultExt<T> {
    /// Prefix a message-carrying error with the operation that produced it
    fn with_context(self, context: &str) -> StoreResult<T>;
}

impl<T> ResultExt<T> for StoreResult<T> {
    fn with_context(self, context: &str) -> StoreResult<T> {
        self.map_err(|err| add_context(err, context))
    }
}

fn add_context(err: StoreError, context: &str) -> StoreError {
    match err {
        StoreError::InvalidArgument(msg) => StoreError::InvalidArgument(format!("{context}: {msg}")),
        StoreError::InvariantViolation(msg) => {
            StoreError::InvariantViolation(format!("{context}: {msg}"))
        }
        StoreError::ExternalOperationFailed(msg) => {
            StoreError::ExternalOperationFailed(format!("{context}: {msg}"))
        }
        StoreError::Fatal(msg) => StoreError::Fatal(format!("{context}: {msg}")),
        other => other,
    }
}
