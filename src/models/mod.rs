//! Data models shared by the store, layout engines and native layer

pub mod geometry;
pub mod handles;
pub mod keybind;
pub mod monitor;
pub mod window;
pub mod workspace;

pub use geometry::*;
pub use handles::*;
pub use keybind::*;
pub use monitor::*;
pub use window::*;
pub use workspace::*;
