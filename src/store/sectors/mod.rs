//! State sectors and their pickers

pub mod map;
pub mod monitor;
pub mod window;
pub mod workspace;

pub use map::MapSector;
pub use monitor::MonitorSector;
pub use window::WindowSector;
pub use workspace::WorkspaceSector;
