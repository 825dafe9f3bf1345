//! Central state store
//!
//! State is split into four sectors (monitors, windows, the window/workspace/
//! monitor map, and workspaces) held together by an immutable [`RootState`].
//! Transforms are the only way to change it, pickers the only way to read it.

pub mod dispatcher;
pub mod engine;
pub mod events;
pub mod picker;
pub mod root;
pub mod sectors;
pub mod transform;
pub mod transforms;

pub use dispatcher::{StoreActor, StoreHandle, StoreMessage};
pub use engine::{EventListener, Store, StoreMetrics};
pub use events::{EventQueues, SectorKind, StoreEvent};
pub use picker::Picker;
pub use root::RootState;
pub use transform::{DispatchableTransform, Transform, TransformContext};
